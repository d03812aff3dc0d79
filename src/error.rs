use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

/// Validation failure of one indicator computation.
///
/// Every engine call returns either a complete result or exactly one of
/// these; once validation passes, computation cannot fail.
#[derive(Debug, Display, Error)]
pub enum ComputeError {
    #[display("empty input series: {series}")]
    EmptyInput { series: String },
    #[display("length mismatch: {left} has {left_len} samples, {right} has {right_len}")]
    LengthMismatch {
        left: String,
        left_len: usize,
        right: String,
        right_len: usize,
    },
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
    #[display("insufficient data: need {required} samples, got {available}")]
    InsufficientData { required: usize, available: usize },
    #[display("non-finite value in {series} at index {index}")]
    NonFiniteInput { series: String, index: usize },
    #[display("inconsistent OHLC sample at index {index}: {reason}")]
    InconsistentOhlc { index: usize, reason: String },
}

impl ComputeError {
    /// Wire tag for the structured error body.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyInput { .. } => "empty_input",
            Self::LengthMismatch { .. } => "length_mismatch",
            Self::InvalidParameter { .. } => "invalid_parameter",
            Self::InsufficientData { .. } => "insufficient_data",
            Self::NonFiniteInput { .. } => "non_finite_input",
            Self::InconsistentOhlc { .. } => "inconsistent_ohlc",
        }
    }
}

/// Envelope-level failures of the transport adapter. Kept separate from
/// `ComputeError` so the computation error vocabulary stays exactly the
/// set of validation preconditions.
#[derive(Debug, Display, Error)]
pub enum ProtocolError {
    #[display("malformed request line")]
    MalformedRequest,
    #[display("unknown method: {name}")]
    UnknownMethod { name: String },
    #[display("unknown indicator: {name}")]
    UnknownIndicator { name: String },
    #[display("malformed params for {indicator}: {reason}")]
    MalformedParams { indicator: String, reason: String },
}

impl ProtocolError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedRequest => "malformed_request",
            Self::UnknownMethod { .. } => "unknown_method",
            Self::UnknownIndicator { .. } => "unknown_indicator",
            Self::MalformedParams { .. } => "malformed_params",
        }
    }
}

#[derive(Debug, Display, Error)]
pub enum TransportError {
    #[display("failed to read from request stream")]
    Read,
    #[display("failed to write to response stream")]
    Write,
}

#[derive(Debug, Display, Error)]
pub enum ProviderError {
    #[display("request to data provider failed")]
    Request,
    #[display("failed to parse provider response")]
    ResponseParse,
    #[display("no data for symbol {symbol}")]
    NoData { symbol: String },
    #[display("rate limit exceeded")]
    #[allow(dead_code)]
    RateLimit,
}

impl ProviderError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Request => "provider_request",
            Self::ResponseParse => "provider_response_parse",
            Self::NoData { .. } => "provider_no_data",
            Self::RateLimit => "provider_rate_limit",
        }
    }
}
