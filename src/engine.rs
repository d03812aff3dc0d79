use error_stack::Report;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ComputeError, ProtocolError};
use crate::indicator::{ValueSeries, momentum, pattern, sar, trend, volatility, volume};
use crate::model::SeriesInput;
use crate::validate;

// ── Parameter structs ─────────────────────────────────────────────────────────
//
// One struct per parameter shape, deserialized from the request's `params`
// map. `deny_unknown_fields` enforces the "recognized keys only" contract;
// defaults match the reference server's.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MaParams {
    pub period: usize,
}

impl Default for MaParams {
    fn default() -> Self {
        Self { period: 30 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OscillatorParams {
    pub period: usize,
}

impl Default for OscillatorParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RocParams {
    pub period: usize,
}

impl Default for RocParams {
    fn default() -> Self {
        Self { period: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MacdParams {
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PpoParams {
    pub fast_period: usize,
    pub slow_period: usize,
}

impl Default for PpoParams {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StochParams {
    pub fastk_period: usize,
    pub slowk_period: usize,
    pub slowd_period: usize,
}

impl Default for StochParams {
    fn default() -> Self {
        Self {
            fastk_period: 5,
            slowk_period: 3,
            slowd_period: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StochRsiParams {
    pub period: usize,
    pub fastk_period: usize,
    pub fastd_period: usize,
}

impl Default for StochRsiParams {
    fn default() -> Self {
        Self {
            period: 14,
            fastk_period: 5,
            fastd_period: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BbandsParams {
    pub period: usize,
    pub upper_deviation: f64,
    pub lower_deviation: f64,
}

impl Default for BbandsParams {
    fn default() -> Self {
        Self {
            period: 5,
            upper_deviation: 2.0,
            lower_deviation: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StddevParams {
    pub period: usize,
    pub deviations: f64,
}

impl Default for StddevParams {
    fn default() -> Self {
        Self {
            period: 5,
            deviations: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdoscParams {
    pub fast_period: usize,
    pub slow_period: usize,
}

impl Default for AdoscParams {
    fn default() -> Self {
        Self {
            fast_period: 3,
            slow_period: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StarParams {
    pub penetration: f64,
}

impl Default for StarParams {
    fn default() -> Self {
        Self { penetration: 0.3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SarParams {
    pub acceleration: f64,
    pub maximum: f64,
}

impl Default for SarParams {
    fn default() -> Self {
        Self {
            acceleration: 0.02,
            maximum: 0.2,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NoParams {}

// ── Registry ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct IndicatorInfo {
    pub name: &'static str,
    pub family: &'static str,
    pub inputs: &'static [&'static str],
    pub outputs: &'static [&'static str],
    pub params: &'static [&'static str],
}

/// Every indicator the engine knows, in one immutable table. `parse` and
/// `compute` are exhaustive over the same set; the table exists for
/// discovery (`list_indicators`) and for the unknown-name error message.
pub static REGISTRY: &[IndicatorInfo] = &[
    IndicatorInfo { name: "sma", family: "trend", inputs: &["close"], outputs: &["sma"], params: &["period"] },
    IndicatorInfo { name: "ema", family: "trend", inputs: &["close"], outputs: &["ema"], params: &["period"] },
    IndicatorInfo { name: "dema", family: "trend", inputs: &["close"], outputs: &["dema"], params: &["period"] },
    IndicatorInfo { name: "tema", family: "trend", inputs: &["close"], outputs: &["tema"], params: &["period"] },
    IndicatorInfo { name: "kama", family: "trend", inputs: &["close"], outputs: &["kama"], params: &["period"] },
    IndicatorInfo { name: "adx", family: "trend", inputs: &["high", "low", "close"], outputs: &["plus_di", "minus_di", "adx"], params: &["period"] },
    IndicatorInfo { name: "rsi", family: "momentum", inputs: &["close"], outputs: &["rsi"], params: &["period"] },
    IndicatorInfo { name: "macd", family: "momentum", inputs: &["close"], outputs: &["macd", "signal", "histogram"], params: &["fast_period", "slow_period", "signal_period"] },
    IndicatorInfo { name: "stoch", family: "momentum", inputs: &["high", "low", "close"], outputs: &["slow_k", "slow_d"], params: &["fastk_period", "slowk_period", "slowd_period"] },
    IndicatorInfo { name: "stoch_rsi", family: "momentum", inputs: &["close"], outputs: &["fast_k", "fast_d"], params: &["period", "fastk_period", "fastd_period"] },
    IndicatorInfo { name: "willr", family: "momentum", inputs: &["high", "low", "close"], outputs: &["willr"], params: &["period"] },
    IndicatorInfo { name: "cci", family: "momentum", inputs: &["high", "low", "close"], outputs: &["cci"], params: &["period"] },
    IndicatorInfo { name: "mom", family: "momentum", inputs: &["close"], outputs: &["mom"], params: &["period"] },
    IndicatorInfo { name: "roc", family: "momentum", inputs: &["close"], outputs: &["roc"], params: &["period"] },
    IndicatorInfo { name: "ppo", family: "momentum", inputs: &["close"], outputs: &["ppo"], params: &["fast_period", "slow_period"] },
    IndicatorInfo { name: "trix", family: "momentum", inputs: &["close"], outputs: &["trix"], params: &["period"] },
    IndicatorInfo { name: "atr", family: "volatility", inputs: &["high", "low", "close"], outputs: &["atr"], params: &["period"] },
    IndicatorInfo { name: "natr", family: "volatility", inputs: &["high", "low", "close"], outputs: &["natr"], params: &["period"] },
    IndicatorInfo { name: "stddev", family: "volatility", inputs: &["close"], outputs: &["stddev"], params: &["period", "deviations"] },
    IndicatorInfo { name: "bbands", family: "volatility", inputs: &["close"], outputs: &["upper", "middle", "lower"], params: &["period", "upper_deviation", "lower_deviation"] },
    IndicatorInfo { name: "obv", family: "volume", inputs: &["close", "volume"], outputs: &["obv"], params: &[] },
    IndicatorInfo { name: "ad", family: "volume", inputs: &["high", "low", "close", "volume"], outputs: &["ad"], params: &[] },
    IndicatorInfo { name: "adosc", family: "volume", inputs: &["high", "low", "close", "volume"], outputs: &["adosc"], params: &["fast_period", "slow_period"] },
    IndicatorInfo { name: "mfi", family: "volume", inputs: &["high", "low", "close", "volume"], outputs: &["mfi"], params: &["period"] },
    IndicatorInfo { name: "doji", family: "pattern", inputs: &["open", "high", "low", "close"], outputs: &["doji"], params: &[] },
    IndicatorInfo { name: "engulfing", family: "pattern", inputs: &["open", "high", "low", "close"], outputs: &["engulfing"], params: &[] },
    IndicatorInfo { name: "hammer", family: "pattern", inputs: &["open", "high", "low", "close"], outputs: &["hammer"], params: &[] },
    IndicatorInfo { name: "shooting_star", family: "pattern", inputs: &["open", "high", "low", "close"], outputs: &["shooting_star"], params: &[] },
    IndicatorInfo { name: "morning_star", family: "pattern", inputs: &["open", "high", "low", "close"], outputs: &["morning_star"], params: &["penetration"] },
    IndicatorInfo { name: "evening_star", family: "pattern", inputs: &["open", "high", "low", "close"], outputs: &["evening_star"], params: &["penetration"] },
    IndicatorInfo { name: "harami", family: "pattern", inputs: &["open", "high", "low", "close"], outputs: &["harami"], params: &[] },
    IndicatorInfo { name: "sar", family: "stateful", inputs: &["high", "low"], outputs: &["sar"], params: &["acceleration", "maximum"] },
];

// ── Indicator enum and dispatch ──────────────────────────────────────────────

/// Closed set of indicator invocations, each carrying its parsed
/// parameters. Dispatch is a single exhaustive match, so a new indicator
/// kind cannot be added without a handler.
#[derive(Debug, Clone)]
pub enum Indicator {
    Sma(MaParams),
    Ema(MaParams),
    Dema(MaParams),
    Tema(MaParams),
    Kama(MaParams),
    Adx(OscillatorParams),
    Rsi(OscillatorParams),
    Macd(MacdParams),
    Stoch(StochParams),
    StochRsi(StochRsiParams),
    Willr(OscillatorParams),
    Cci(OscillatorParams),
    Mom(RocParams),
    Roc(RocParams),
    Ppo(PpoParams),
    Trix(MaParams),
    Atr(OscillatorParams),
    Natr(OscillatorParams),
    Stddev(StddevParams),
    Bbands(BbandsParams),
    Obv,
    Ad,
    Adosc(AdoscParams),
    Mfi(OscillatorParams),
    Doji,
    Engulfing,
    Hammer,
    ShootingStar,
    MorningStar(StarParams),
    EveningStar(StarParams),
    Harami,
    Sar(SarParams),
}

fn parse_params<T>(indicator: &str, params: Value) -> Result<T, Report<ProtocolError>>
where
    T: serde::de::DeserializeOwned + Default,
{
    if params.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(params).map_err(|e| {
        Report::new(ProtocolError::MalformedParams {
            indicator: indicator.into(),
            reason: e.to_string(),
        })
    })
}

impl Indicator {
    /// Resolve a request's indicator name and raw parameter map into a
    /// typed invocation. An absent or `null` params map selects the
    /// defaults.
    pub fn parse(name: &str, params: Value) -> Result<Self, Report<ProtocolError>> {
        match name {
            "sma" => Ok(Self::Sma(parse_params(name, params)?)),
            "ema" => Ok(Self::Ema(parse_params(name, params)?)),
            "dema" => Ok(Self::Dema(parse_params(name, params)?)),
            "tema" => Ok(Self::Tema(parse_params(name, params)?)),
            "kama" => Ok(Self::Kama(parse_params(name, params)?)),
            "adx" => Ok(Self::Adx(parse_params(name, params)?)),
            "rsi" => Ok(Self::Rsi(parse_params(name, params)?)),
            "macd" => Ok(Self::Macd(parse_params(name, params)?)),
            "stoch" => Ok(Self::Stoch(parse_params(name, params)?)),
            "stoch_rsi" => Ok(Self::StochRsi(parse_params(name, params)?)),
            "willr" => Ok(Self::Willr(parse_params(name, params)?)),
            "cci" => Ok(Self::Cci(parse_params(name, params)?)),
            "mom" => Ok(Self::Mom(parse_params(name, params)?)),
            "roc" => Ok(Self::Roc(parse_params(name, params)?)),
            "ppo" => Ok(Self::Ppo(parse_params(name, params)?)),
            "trix" => Ok(Self::Trix(parse_params(name, params)?)),
            "atr" => Ok(Self::Atr(parse_params(name, params)?)),
            "natr" => Ok(Self::Natr(parse_params(name, params)?)),
            "stddev" => Ok(Self::Stddev(parse_params(name, params)?)),
            "bbands" => Ok(Self::Bbands(parse_params(name, params)?)),
            "obv" => parse_params::<NoParams>(name, params).map(|_| Self::Obv),
            "ad" => parse_params::<NoParams>(name, params).map(|_| Self::Ad),
            "adosc" => Ok(Self::Adosc(parse_params(name, params)?)),
            "mfi" => Ok(Self::Mfi(parse_params(name, params)?)),
            "doji" => parse_params::<NoParams>(name, params).map(|_| Self::Doji),
            "engulfing" => parse_params::<NoParams>(name, params).map(|_| Self::Engulfing),
            "hammer" => parse_params::<NoParams>(name, params).map(|_| Self::Hammer),
            "shooting_star" => {
                parse_params::<NoParams>(name, params).map(|_| Self::ShootingStar)
            }
            "morning_star" => Ok(Self::MorningStar(parse_params(name, params)?)),
            "evening_star" => Ok(Self::EveningStar(parse_params(name, params)?)),
            "harami" => parse_params::<NoParams>(name, params).map(|_| Self::Harami),
            "sar" => Ok(Self::Sar(parse_params(name, params)?)),
            other => Err(Report::new(ProtocolError::UnknownIndicator {
                name: other.into(),
            })),
        }
    }

    /// Validate inputs and parameters, run the computation, and package the
    /// result. Pure: identical inputs yield bit-identical outputs.
    pub fn compute(&self, series: &SeriesInput) -> Result<IndicatorResponse, Report<ComputeError>> {
        match self {
            Self::Sma(p) => {
                let close = validated_close(series, p.period.saturating_add(1))?;
                validate::require_positive_period("period", p.period)?;
                Ok(package("sma", p, vec![("sma", trend::sma(close, p.period))]))
            }
            Self::Ema(p) => {
                let close = validated_close(series, p.period.saturating_add(1))?;
                validate::require_positive_period("period", p.period)?;
                Ok(package("ema", p, vec![("ema", trend::ema(close, p.period))]))
            }
            Self::Dema(p) => {
                let required = p
                    .period
                    .max(1)
                    .saturating_mul(2)
                    .saturating_sub(1)
                    .max(p.period.saturating_add(1));
                let close = validated_close(series, required)?;
                validate::require_positive_period("period", p.period)?;
                Ok(package("dema", p, vec![("dema", trend::dema(close, p.period))]))
            }
            Self::Tema(p) => {
                let required = p
                    .period
                    .max(1)
                    .saturating_mul(3)
                    .saturating_sub(2)
                    .max(p.period.saturating_add(1));
                let close = validated_close(series, required)?;
                validate::require_positive_period("period", p.period)?;
                Ok(package("tema", p, vec![("tema", trend::tema(close, p.period))]))
            }
            Self::Kama(p) => {
                let close = validated_close(series, p.period.saturating_add(1))?;
                validate::require_positive_period("period", p.period)?;
                Ok(package("kama", p, vec![("kama", trend::kama(close, p.period))]))
            }
            Self::Adx(p) => {
                let required = p
                    .period
                    .saturating_mul(2)
                    .max(p.period.saturating_add(1));
                let (high, low, close) = validated_hlc(series, required)?;
                validate::require_positive_period("period", p.period)?;
                validate::require_consistent_ohlc(&[], high, low, close)?;
                let out = trend::adx(high, low, close, p.period);
                Ok(package(
                    "adx",
                    p,
                    vec![
                        ("plus_di", out.plus_di),
                        ("minus_di", out.minus_di),
                        ("adx", out.adx),
                    ],
                ))
            }
            Self::Rsi(p) => {
                let close = validated_close(series, p.period.saturating_add(1))?;
                validate::require_positive_period("period", p.period)?;
                Ok(package("rsi", p, vec![("rsi", momentum::rsi(close, p.period))]))
            }
            Self::Macd(p) => {
                let required = (p.slow_period.saturating_add(p.signal_period).saturating_sub(1))
                    .max(p.slow_period.saturating_add(1));
                let close = validated_close(series, required)?;
                validate::require_positive_period("fast_period", p.fast_period)?;
                validate::require_positive_period("slow_period", p.slow_period)?;
                validate::require_positive_period("signal_period", p.signal_period)?;
                validate::require_fast_below_slow(
                    "fast_period",
                    p.fast_period,
                    "slow_period",
                    p.slow_period,
                )?;
                let out = momentum::macd(close, p.fast_period, p.slow_period, p.signal_period);
                Ok(package(
                    "macd",
                    p,
                    vec![
                        ("macd", out.macd),
                        ("signal", out.signal),
                        ("histogram", out.histogram),
                    ],
                ))
            }
            Self::Stoch(p) => {
                let required = p
                    .fastk_period
                    .saturating_add(p.slowk_period)
                    .saturating_add(p.slowd_period)
                    .saturating_sub(2)
                    .max(p.fastk_period.saturating_add(1))
                    .max(p.slowk_period.saturating_add(1))
                    .max(p.slowd_period.saturating_add(1));
                let (high, low, close) = validated_hlc(series, required)?;
                validate::require_positive_period("fastk_period", p.fastk_period)?;
                validate::require_positive_period("slowk_period", p.slowk_period)?;
                validate::require_positive_period("slowd_period", p.slowd_period)?;
                validate::require_consistent_ohlc(&[], high, low, close)?;
                let out = momentum::stoch(
                    high,
                    low,
                    close,
                    p.fastk_period,
                    p.slowk_period,
                    p.slowd_period,
                );
                Ok(package(
                    "stoch",
                    p,
                    vec![("slow_k", out.slow_k), ("slow_d", out.slow_d)],
                ))
            }
            Self::StochRsi(p) => {
                let required = p
                    .period
                    .saturating_add(p.fastk_period)
                    .saturating_add(p.fastd_period)
                    .saturating_sub(1)
                    .max(p.period.saturating_add(1));
                let close = validated_close(series, required)?;
                validate::require_positive_period("period", p.period)?;
                validate::require_positive_period("fastk_period", p.fastk_period)?;
                validate::require_positive_period("fastd_period", p.fastd_period)?;
                let out = momentum::stoch_rsi(close, p.period, p.fastk_period, p.fastd_period);
                Ok(package(
                    "stoch_rsi",
                    p,
                    vec![("fast_k", out.fast_k), ("fast_d", out.fast_d)],
                ))
            }
            Self::Willr(p) => {
                let (high, low, close) = validated_hlc(series, p.period.saturating_add(1))?;
                validate::require_positive_period("period", p.period)?;
                validate::require_consistent_ohlc(&[], high, low, close)?;
                Ok(package(
                    "willr",
                    p,
                    vec![("willr", momentum::willr(high, low, close, p.period))],
                ))
            }
            Self::Cci(p) => {
                let (high, low, close) = validated_hlc(series, p.period.saturating_add(1))?;
                validate::require_positive_period("period", p.period)?;
                validate::require_consistent_ohlc(&[], high, low, close)?;
                Ok(package(
                    "cci",
                    p,
                    vec![("cci", momentum::cci(high, low, close, p.period))],
                ))
            }
            Self::Mom(p) => {
                let close = validated_close(series, p.period.saturating_add(1))?;
                validate::require_positive_period("period", p.period)?;
                Ok(package("mom", p, vec![("mom", momentum::mom(close, p.period))]))
            }
            Self::Roc(p) => {
                let close = validated_close(series, p.period.saturating_add(1))?;
                validate::require_positive_period("period", p.period)?;
                Ok(package("roc", p, vec![("roc", momentum::roc(close, p.period))]))
            }
            Self::Ppo(p) => {
                let close = validated_close(series, p.slow_period.saturating_add(1))?;
                validate::require_positive_period("fast_period", p.fast_period)?;
                validate::require_positive_period("slow_period", p.slow_period)?;
                validate::require_fast_below_slow(
                    "fast_period",
                    p.fast_period,
                    "slow_period",
                    p.slow_period,
                )?;
                Ok(package(
                    "ppo",
                    p,
                    vec![("ppo", momentum::ppo(close, p.fast_period, p.slow_period))],
                ))
            }
            Self::Trix(p) => {
                let required = p
                    .period
                    .max(1)
                    .saturating_mul(3)
                    .saturating_sub(1)
                    .max(p.period.saturating_add(1));
                let close = validated_close(series, required)?;
                validate::require_positive_period("period", p.period)?;
                Ok(package("trix", p, vec![("trix", momentum::trix(close, p.period))]))
            }
            Self::Atr(p) => {
                let (high, low, close) = validated_hlc(series, p.period.saturating_add(1))?;
                validate::require_positive_period("period", p.period)?;
                validate::require_consistent_ohlc(&[], high, low, close)?;
                Ok(package(
                    "atr",
                    p,
                    vec![("atr", volatility::atr(high, low, close, p.period))],
                ))
            }
            Self::Natr(p) => {
                let (high, low, close) = validated_hlc(series, p.period.saturating_add(1))?;
                validate::require_positive_period("period", p.period)?;
                validate::require_consistent_ohlc(&[], high, low, close)?;
                Ok(package(
                    "natr",
                    p,
                    vec![("natr", volatility::natr(high, low, close, p.period))],
                ))
            }
            Self::Stddev(p) => {
                let close = validated_close(series, p.period.saturating_add(1))?;
                validate::require_positive_period("period", p.period)?;
                validate::require_positive("deviations", p.deviations)?;
                Ok(package(
                    "stddev",
                    p,
                    vec![("stddev", volatility::stddev(close, p.period, p.deviations))],
                ))
            }
            Self::Bbands(p) => {
                let close = validated_close(series, p.period.saturating_add(1))?;
                validate::require_positive_period("period", p.period)?;
                validate::require_positive("upper_deviation", p.upper_deviation)?;
                validate::require_positive("lower_deviation", p.lower_deviation)?;
                let out =
                    volatility::bollinger(close, p.period, p.upper_deviation, p.lower_deviation);
                Ok(package(
                    "bbands",
                    p,
                    vec![
                        ("upper", out.upper),
                        ("middle", out.middle),
                        ("lower", out.lower),
                    ],
                ))
            }
            Self::Obv => {
                let arrays = [
                    ("close", series.close.as_slice()),
                    ("volume", series.volume.as_slice()),
                ];
                validate::require_non_empty(&arrays)?;
                validate::require_equal_len(&arrays)?;
                validate::require_finite(&arrays)?;
                require_non_negative_volume(&series.volume)?;
                Ok(package(
                    "obv",
                    &NoParams {},
                    vec![("obv", volume::obv(&series.close, &series.volume))],
                ))
            }
            Self::Ad => {
                let (high, low, close, vol) = validated_hlcv(series, 1)?;
                validate::require_consistent_ohlc(&[], high, low, close)?;
                require_non_negative_volume(vol)?;
                Ok(package(
                    "ad",
                    &NoParams {},
                    vec![("ad", volume::ad(high, low, close, vol))],
                ))
            }
            Self::Adosc(p) => {
                let (high, low, close, vol) =
                    validated_hlcv(series, p.slow_period.saturating_add(1))?;
                validate::require_positive_period("fast_period", p.fast_period)?;
                validate::require_positive_period("slow_period", p.slow_period)?;
                validate::require_fast_below_slow(
                    "fast_period",
                    p.fast_period,
                    "slow_period",
                    p.slow_period,
                )?;
                validate::require_consistent_ohlc(&[], high, low, close)?;
                require_non_negative_volume(vol)?;
                Ok(package(
                    "adosc",
                    p,
                    vec![(
                        "adosc",
                        volume::adosc(high, low, close, vol, p.fast_period, p.slow_period),
                    )],
                ))
            }
            Self::Mfi(p) => {
                let (high, low, close, vol) =
                    validated_hlcv(series, p.period.saturating_add(1))?;
                validate::require_positive_period("period", p.period)?;
                validate::require_consistent_ohlc(&[], high, low, close)?;
                require_non_negative_volume(vol)?;
                Ok(package(
                    "mfi",
                    p,
                    vec![("mfi", volume::mfi(high, low, close, vol, p.period))],
                ))
            }
            Self::Doji => {
                let (open, high, low, close) = validated_ohlc(series, 1)?;
                validate::require_consistent_ohlc(open, high, low, close)?;
                Ok(package(
                    "doji",
                    &NoParams {},
                    vec![("doji", pattern::doji(open, high, low, close))],
                ))
            }
            Self::Engulfing => {
                let (open, high, low, close) = validated_ohlc(series, 2)?;
                validate::require_consistent_ohlc(open, high, low, close)?;
                Ok(package(
                    "engulfing",
                    &NoParams {},
                    vec![("engulfing", pattern::engulfing(open, high, low, close))],
                ))
            }
            Self::Hammer => {
                let (open, high, low, close) = validated_ohlc(series, 2)?;
                validate::require_consistent_ohlc(open, high, low, close)?;
                Ok(package(
                    "hammer",
                    &NoParams {},
                    vec![("hammer", pattern::hammer(open, high, low, close))],
                ))
            }
            Self::ShootingStar => {
                let (open, high, low, close) = validated_ohlc(series, 2)?;
                validate::require_consistent_ohlc(open, high, low, close)?;
                Ok(package(
                    "shooting_star",
                    &NoParams {},
                    vec![(
                        "shooting_star",
                        pattern::shooting_star(open, high, low, close),
                    )],
                ))
            }
            Self::MorningStar(p) => {
                let (open, high, low, close) = validated_ohlc(series, 3)?;
                validate::require_positive("penetration", p.penetration)?;
                validate::require_consistent_ohlc(open, high, low, close)?;
                Ok(package(
                    "morning_star",
                    p,
                    vec![(
                        "morning_star",
                        pattern::morning_star(open, high, low, close, p.penetration),
                    )],
                ))
            }
            Self::EveningStar(p) => {
                let (open, high, low, close) = validated_ohlc(series, 3)?;
                validate::require_positive("penetration", p.penetration)?;
                validate::require_consistent_ohlc(open, high, low, close)?;
                Ok(package(
                    "evening_star",
                    p,
                    vec![(
                        "evening_star",
                        pattern::evening_star(open, high, low, close, p.penetration),
                    )],
                ))
            }
            Self::Harami => {
                let (open, high, low, close) = validated_ohlc(series, 2)?;
                validate::require_consistent_ohlc(open, high, low, close)?;
                Ok(package(
                    "harami",
                    &NoParams {},
                    vec![("harami", pattern::harami(open, high, low, close))],
                ))
            }
            Self::Sar(p) => {
                let arrays = [
                    ("high", series.high.as_slice()),
                    ("low", series.low.as_slice()),
                ];
                validate::require_non_empty(&arrays)?;
                validate::require_equal_len(&arrays)?;
                validate::require_min_len(series.high.len(), 2)?;
                validate::require_finite(&arrays)?;
                validate::require_positive("acceleration", p.acceleration)?;
                validate::require_positive("maximum", p.maximum)?;
                if p.maximum < p.acceleration {
                    return Err(Report::new(ComputeError::InvalidParameter {
                        name: "maximum must be >= acceleration".into(),
                    }));
                }
                validate::require_consistent_ohlc(&[], &series.high, &series.low, &[])?;
                Ok(package(
                    "sar",
                    p,
                    vec![(
                        "sar",
                        sar::sar(&series.high, &series.low, p.acceleration, p.maximum),
                    )],
                ))
            }
        }
    }
}

// ── Validation helpers (shared precondition order) ───────────────────────────

fn validated_close<'a>(
    series: &'a SeriesInput,
    required: usize,
) -> Result<&'a [f64], Report<ComputeError>> {
    let arrays = [("close", series.close.as_slice())];
    validate::require_non_empty(&arrays)?;
    validate::require_min_len(series.close.len(), required)?;
    validate::require_finite(&arrays)?;
    Ok(&series.close)
}

fn validated_hlc<'a>(
    series: &'a SeriesInput,
    required: usize,
) -> Result<(&'a [f64], &'a [f64], &'a [f64]), Report<ComputeError>> {
    let arrays = [
        ("high", series.high.as_slice()),
        ("low", series.low.as_slice()),
        ("close", series.close.as_slice()),
    ];
    validate::require_non_empty(&arrays)?;
    validate::require_equal_len(&arrays)?;
    validate::require_min_len(series.high.len(), required)?;
    validate::require_finite(&arrays)?;
    Ok((&series.high, &series.low, &series.close))
}

fn validated_ohlc<'a>(
    series: &'a SeriesInput,
    required: usize,
) -> Result<(&'a [f64], &'a [f64], &'a [f64], &'a [f64]), Report<ComputeError>> {
    let arrays = [
        ("open", series.open.as_slice()),
        ("high", series.high.as_slice()),
        ("low", series.low.as_slice()),
        ("close", series.close.as_slice()),
    ];
    validate::require_non_empty(&arrays)?;
    validate::require_equal_len(&arrays)?;
    validate::require_min_len(series.open.len(), required)?;
    validate::require_finite(&arrays)?;
    Ok((&series.open, &series.high, &series.low, &series.close))
}

fn validated_hlcv<'a>(
    series: &'a SeriesInput,
    required: usize,
) -> Result<(&'a [f64], &'a [f64], &'a [f64], &'a [f64]), Report<ComputeError>> {
    let arrays = [
        ("high", series.high.as_slice()),
        ("low", series.low.as_slice()),
        ("close", series.close.as_slice()),
        ("volume", series.volume.as_slice()),
    ];
    validate::require_non_empty(&arrays)?;
    validate::require_equal_len(&arrays)?;
    validate::require_min_len(series.high.len(), required)?;
    validate::require_finite(&arrays)?;
    Ok((&series.high, &series.low, &series.close, &series.volume))
}

fn require_non_negative_volume(volume: &[f64]) -> Result<(), Report<ComputeError>> {
    if let Some(index) = volume.iter().position(|&v| v < 0.0) {
        return Err(Report::new(ComputeError::InconsistentOhlc {
            index,
            reason: format!("volume {} < 0", volume[index]),
        }));
    }
    Ok(())
}

// ── Result Packager ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct OutputSeries {
    pub name: &'static str,
    pub values: ValueSeries,
}

/// The uniform response contract: named same-length series with `null`
/// warm-up sentinels, plus the metadata a caller needs to interpret them.
#[derive(Debug, Serialize)]
pub struct IndicatorResponse {
    pub indicator: &'static str,
    pub length: usize,
    pub warmup: usize,
    pub params: Value,
    pub outputs: Vec<OutputSeries>,
}

fn package<P: Serialize>(
    indicator: &'static str,
    params: &P,
    outputs: Vec<(&'static str, ValueSeries)>,
) -> IndicatorResponse {
    let outputs: Vec<OutputSeries> = outputs
        .into_iter()
        .map(|(name, values)| OutputSeries { name, values })
        .collect();
    let length = outputs.first().map_or(0, |o| o.values.len());
    // The warm-up of the response is that of its slowest output; per-series
    // sentinels still mark the shorter warm-ups individually.
    let warmup = outputs
        .iter()
        .map(|o| o.values.iter().take_while(|v| v.is_none()).count())
        .max()
        .unwrap_or(0);
    IndicatorResponse {
        indicator,
        length,
        warmup,
        params: serde_json::to_value(params).unwrap_or(Value::Null),
        outputs,
    }
}

/// Look up a registry row by indicator name.
#[allow(dead_code)]
pub fn info(name: &str) -> Option<&'static IndicatorInfo> {
    REGISTRY.iter().find(|i| i.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn close_series(close: &[f64]) -> SeriesInput {
        SeriesInput {
            close: close.to_vec(),
            ..Default::default()
        }
    }

    fn hlcv_series(n: usize) -> SeriesInput {
        let close: Vec<f64> = (0..n).map(|i| 100.0 + (i as f64 * 0.6).sin() * 5.0).collect();
        SeriesInput {
            open: close.iter().map(|c| c - 0.2).collect(),
            high: close.iter().map(|c| c + 1.0).collect(),
            low: close.iter().map(|c| c - 1.0).collect(),
            close,
            volume: (0..n).map(|i| 1000.0 + i as f64).collect(),
        }
    }

    fn kind_of(report: &Report<ComputeError>) -> &'static str {
        report.current_context().kind()
    }

    #[test]
    fn sma_scenario_from_contract() {
        // close [10,11,12,11,10,9,10,11,12,13], period 3: warm-up 2 and
        // first valid value (10+11+12)/3 = 11.0 at index 2.
        let series = close_series(&[10.0, 11.0, 12.0, 11.0, 10.0, 9.0, 10.0, 11.0, 12.0, 13.0]);
        let call = Indicator::parse("sma", json!({"period": 3})).unwrap();
        let response = call.compute(&series).unwrap();
        assert_eq!(response.length, 10);
        assert_eq!(response.warmup, 2);
        let values = &response.outputs[0].values;
        assert_eq!(values.len(), 10);
        assert_eq!(values[0], None);
        assert_eq!(values[1], None);
        assert!((values[2].unwrap() - 11.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_short_series_is_insufficient_data() {
        // RSI(14) needs 15 samples; 14 must fail, not return a partial array.
        let series = close_series(&[100.0; 14]);
        let call = Indicator::parse("rsi", Value::Null).unwrap();
        let err = call.compute(&series).unwrap_err();
        assert_eq!(kind_of(&err), "insufficient_data");
    }

    #[test]
    fn period_at_or_above_length_rejected() {
        let series = close_series(&[1.0, 2.0, 3.0]);
        let call = Indicator::parse("sma", json!({"period": 3})).unwrap();
        assert_eq!(kind_of(&call.compute(&series).unwrap_err()), "insufficient_data");
    }

    #[test]
    fn zero_period_is_invalid_parameter() {
        let series = close_series(&[1.0, 2.0, 3.0, 4.0]);
        let call = Indicator::parse("sma", json!({"period": 0})).unwrap();
        assert_eq!(kind_of(&call.compute(&series).unwrap_err()), "invalid_parameter");
    }

    #[test]
    fn empty_input_beats_other_errors() {
        let call = Indicator::parse("sma", json!({"period": 0})).unwrap();
        let err = call.compute(&SeriesInput::default()).unwrap_err();
        assert_eq!(kind_of(&err), "empty_input");
    }

    #[test]
    fn length_mismatch_detected() {
        let series = SeriesInput {
            high: vec![2.0; 30],
            low: vec![1.0; 29],
            close: vec![1.5; 30],
            ..Default::default()
        };
        let call = Indicator::parse("atr", Value::Null).unwrap();
        assert_eq!(kind_of(&call.compute(&series).unwrap_err()), "length_mismatch");
    }

    #[test]
    fn non_finite_input_rejected() {
        let mut close = vec![10.0; 20];
        close[7] = f64::NAN;
        let call = Indicator::parse("sma", json!({"period": 3})).unwrap();
        let err = call.compute(&close_series(&close)).unwrap_err();
        assert_eq!(kind_of(&err), "non_finite_input");
    }

    #[test]
    fn inconsistent_ohlc_rejected() {
        let mut series = hlcv_series(30);
        series.low[5] = series.high[5] + 1.0; // high < low
        let call = Indicator::parse("atr", Value::Null).unwrap();
        assert_eq!(kind_of(&call.compute(&series).unwrap_err()), "inconsistent_ohlc");
    }

    #[test]
    fn negative_volume_rejected() {
        let mut series = hlcv_series(30);
        series.volume[3] = -1.0;
        let call = Indicator::parse("obv", Value::Null).unwrap();
        assert_eq!(kind_of(&call.compute(&series).unwrap_err()), "inconsistent_ohlc");
    }

    #[test]
    fn negative_deviation_rejected() {
        let series = close_series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let call = Indicator::parse("bbands", json!({"period": 3, "upper_deviation": -2.0}))
            .unwrap();
        assert_eq!(kind_of(&call.compute(&series).unwrap_err()), "invalid_parameter");
    }

    #[test]
    fn unknown_indicator_rejected_with_protocol_error() {
        let err = Indicator::parse("vwap", Value::Null).unwrap_err();
        assert_eq!(err.current_context().kind(), "unknown_indicator");
    }

    #[test]
    fn unrecognized_param_key_rejected() {
        let err = Indicator::parse("rsi", json!({"period": 14, "smoothing": 2})).unwrap_err();
        assert_eq!(err.current_context().kind(), "malformed_params");
    }

    #[test]
    fn null_params_select_documented_defaults() {
        let call = Indicator::parse("macd", Value::Null).unwrap();
        let Indicator::Macd(p) = call else {
            panic!("wrong variant");
        };
        assert_eq!(p.fast_period, 12);
        assert_eq!(p.slow_period, 26);
        assert_eq!(p.signal_period, 9);
    }

    #[test]
    fn every_registry_entry_parses_with_defaults() {
        for info in REGISTRY {
            assert!(
                Indicator::parse(info.name, Value::Null).is_ok(),
                "registry entry {} failed to parse",
                info.name
            );
        }
    }

    #[test]
    fn registry_lookup_by_name() {
        let bbands = info("bbands").unwrap();
        assert_eq!(bbands.outputs, &["upper", "middle", "lower"]);
        assert!(info("nope").is_none());
    }

    #[test]
    fn compute_is_idempotent() {
        let series = hlcv_series(60);
        let call = Indicator::parse("adx", json!({"period": 7})).unwrap();
        let a = call.compute(&series).unwrap();
        let b = call.compute(&series).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn every_output_matches_input_length() {
        // Long enough for the slowest default warm-up (TRIX(30) needs 89).
        let series = hlcv_series(120);
        for entry in REGISTRY {
            let call = Indicator::parse(entry.name, Value::Null).unwrap();
            let response = call
                .compute(&series)
                .unwrap_or_else(|e| panic!("{} failed: {e:?}", entry.name));
            assert_eq!(response.length, 120, "{}", entry.name);
            assert_eq!(response.outputs.len(), entry.outputs.len(), "{}", entry.name);
            for output in &response.outputs {
                assert_eq!(output.values.len(), 120, "{}:{}", entry.name, output.name);
            }
        }
    }

    #[test]
    fn multi_output_warmup_reports_slowest_series() {
        let series = close_series(&(0..60).map(|i| i as f64).collect::<Vec<_>>());
        let call = Indicator::parse("macd", Value::Null).unwrap();
        let response = call.compute(&series).unwrap();
        // signal warm-up (slow + signal - 2) dominates the macd line's.
        assert_eq!(response.warmup, 33);
    }

    #[test]
    fn obv_has_no_warmup_gap() {
        let series = hlcv_series(20);
        let call = Indicator::parse("obv", Value::Null).unwrap();
        let response = call.compute(&series).unwrap();
        assert_eq!(response.warmup, 0);
        assert!(response.outputs[0].values.iter().all(|v| v.is_some()));
    }

    #[test]
    fn params_echoed_in_response() {
        let series = close_series(&(0..40).map(|i| i as f64).collect::<Vec<_>>());
        let call = Indicator::parse("stddev", json!({"period": 7})).unwrap();
        let response = call.compute(&series).unwrap();
        assert_eq!(response.params["period"], json!(7));
        assert_eq!(response.params["deviations"], json!(1.0));
    }

    #[test]
    fn sar_requires_two_bars_and_ordered_factors() {
        let series = SeriesInput {
            high: vec![10.0],
            low: vec![9.0],
            ..Default::default()
        };
        let call = Indicator::parse("sar", Value::Null).unwrap();
        assert_eq!(kind_of(&call.compute(&series).unwrap_err()), "insufficient_data");

        let series = SeriesInput {
            high: vec![10.0, 11.0, 12.0],
            low: vec![9.0, 10.0, 11.0],
            ..Default::default()
        };
        let call =
            Indicator::parse("sar", json!({"acceleration": 0.3, "maximum": 0.1})).unwrap();
        assert_eq!(kind_of(&call.compute(&series).unwrap_err()), "invalid_parameter");
    }
}
