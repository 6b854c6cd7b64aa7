//! Domain error types.

/// Top-level error type for flagtrader.
#[derive(Debug, thiserror::Error)]
pub enum FlagtraderError {
    #[error("data source error: {reason}")]
    DataSource { reason: String },

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

    #[error("no data for {code}")]
    NoData { code: String },

    #[error("insufficient data for {code}: have {bars} bars, need {minimum}")]
    InsufficientData {
        code: String,
        bars: usize,
        minimum: usize,
    },

    #[error("malformed price series for {code}: {reason}")]
    MalformedInput { code: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&FlagtraderError> for std::process::ExitCode {
    fn from(err: &FlagtraderError) -> Self {
        let code: u8 = match err {
            FlagtraderError::Io(_) => 1,
            FlagtraderError::ConfigParse { .. }
            | FlagtraderError::ConfigMissing { .. }
            | FlagtraderError::ConfigInvalid { .. } => 2,
            FlagtraderError::DataSource { .. } => 3,
            FlagtraderError::NoData { .. }
            | FlagtraderError::InsufficientData { .. }
            | FlagtraderError::MalformedInput { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_message() {
        let err = FlagtraderError::InsufficientData {
            code: "BHP".into(),
            bars: 40,
            minimum: 100,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data for BHP: have 40 bars, need 100"
        );
    }

    #[test]
    fn malformed_input_message() {
        let err = FlagtraderError::MalformedInput {
            code: "CBA".into(),
            reason: "duplicate date 2024-01-02".into(),
        };
        assert_eq!(
            err.to_string(),
            "malformed price series for CBA: duplicate date 2024-01-02"
        );
    }

    #[test]
    fn io_error_is_transparent() {
        let err: FlagtraderError = std::io::Error::other("disk gone").into();
        assert_eq!(err.to_string(), "disk gone");
    }
}
