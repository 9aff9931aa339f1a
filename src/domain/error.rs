//! Domain error types.

/// Top-level error type for tradelab.
#[derive(Debug, thiserror::Error)]
pub enum TradelabError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("data query error: {reason}")]
    DataQuery { reason: String },

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

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("symbol {symbol} has no entry in the bar set")]
    UnknownSymbol { symbol: String },

    #[error("bars for {symbol} are not strictly ascending at index {index} ({timestamp})")]
    UnsortedBars {
        symbol: String,
        index: usize,
        timestamp: chrono::NaiveDateTime,
    },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TradelabError {
    /// Process exit status for this error category.
    pub fn exit_status(&self) -> u8 {
        match self {
            TradelabError::Io(_) => 1,
            TradelabError::ConfigParse { .. }
            | TradelabError::ConfigMissing { .. }
            | TradelabError::ConfigInvalid { .. } => 2,
            TradelabError::Data { .. } | TradelabError::DataQuery { .. } => 3,
            TradelabError::UnknownStrategy { .. } => 4,
            TradelabError::NoData { .. }
            | TradelabError::UnknownSymbol { .. }
            | TradelabError::UnsortedBars { .. } => 5,
        }
    }
}

impl From<&TradelabError> for std::process::ExitCode {
    fn from(err: &TradelabError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
