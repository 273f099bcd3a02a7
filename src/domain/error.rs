//! Domain error types.

/// Fusion was asked to combine too few layers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FusionError {
    #[error("insufficient signals: {present} layer(s) present, at least 2 required")]
    InsufficientSignals { present: usize },
}

/// Reasons a sizing request is refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SizingError {
    #[error("risk per trade {requested}% exceeds limit of {max}%")]
    RiskLimitExceeded { requested: f64, max: f64 },

    #[error("unsupported symbol: {symbol}")]
    UnsupportedSymbol { symbol: String },

    #[error("stop distance must be positive, got {pips} pips")]
    InvalidStopDistance { pips: f64 },

    #[error("equity must be at least 100, got {equity}")]
    InvalidEquity { equity: f64 },

    #[error("risk per trade must be between 0.1% and 5%, got {pct}%")]
    InvalidRiskPercent { pct: f64 },

    #[error("invalid {field} for {symbol}: {value}")]
    InvalidSymbolTable {
        symbol: String,
        field: &'static str,
        value: f64,
    },
}

/// Why the risk gate refused a new trade. Variants are listed in evaluation order.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DenyReason {
    #[error("daily loss {loss:.2} reached limit of {limit:.2}")]
    DailyLossExceeded { loss: f64, limit: f64 },

    #[error("daily trade cap reached: {count} of {cap}")]
    DailyTradeCapReached { count: u32, cap: u32 },

    #[error("drawdown {drawdown_pct:.2}% reached limit of {limit_pct:.2}%")]
    DrawdownExceeded { drawdown_pct: f64, limit_pct: f64 },

    #[error("concurrent position cap reached: {open} of {cap}")]
    ConcurrentPositionCapReached { open: u32, cap: u32 },
}

/// Top-level error type for sentinel.
#[derive(Debug, thiserror::Error)]
pub enum SentinelError {
    #[error(transparent)]
    Fusion(#[from] FusionError),

    #[error(transparent)]
    Sizing(#[from] SizingError),

    #[error("trade denied: {0}")]
    TradeDenied(#[from] DenyReason),

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("capital protection cannot be disabled")]
    CapitalProtectionRequired,

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need more than {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SentinelError> for std::process::ExitCode {
    fn from(err: &SentinelError) -> Self {
        let code: u8 = match err {
            SentinelError::Io(_) => 1,
            SentinelError::ConfigParse { .. }
            | SentinelError::ConfigMissing { .. }
            | SentinelError::ConfigInvalid { .. }
            | SentinelError::CapitalProtectionRequired => 2,
            SentinelError::Data { .. } => 3,
            SentinelError::Fusion(_) => 4,
            SentinelError::InsufficientData { .. } => 5,
            SentinelError::Sizing(_) | SentinelError::TradeDenied(_) => 6,
        };
        std::process::ExitCode::from(code)
    }
}
