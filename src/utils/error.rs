use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid cart snapshot: {message}")]
    InvalidCartError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Data,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RiskError::IoError(_) => ErrorCategory::Io,
            RiskError::SerializationError(_) | RiskError::InvalidCartError { .. } => {
                ErrorCategory::Data
            }
            RiskError::ConfigValidationError { .. } | RiskError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Io => ErrorSeverity::Critical,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            RiskError::IoError(e) => format!("Could not read or write a file: {}", e),
            RiskError::SerializationError(e) => format!("Cart file is not valid JSON: {}", e),
            RiskError::ConfigValidationError { field, message } => {
                format!("Configuration problem in '{}': {}", field, message)
            }
            RiskError::InvalidConfigValueError {
                field,
                value,
                reason,
            } => format!("Setting '{}' has an invalid value '{}': {}", field, value, reason),
            RiskError::InvalidCartError { message } => format!("Cart snapshot rejected: {}", message),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            RiskError::IoError(_) => "Check that the file exists and is readable",
            RiskError::SerializationError(_) => {
                "The cart file must be a JSON array of lines with id, name, price, quantity, category, rating and addedAt"
            }
            RiskError::ConfigValidationError { .. } => "Check the TOML syntax of the configuration file",
            RiskError::InvalidConfigValueError { .. } => {
                "Fix the named setting or remove it to fall back to the default"
            }
            RiskError::InvalidCartError { .. } => {
                "Make line ids unique, prices non-negative and quantities at least 1"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, RiskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_and_severity() {
        let err = RiskError::InvalidCartError {
            message: "duplicate id".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Data);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("duplicate id"));

        let io = RiskError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(io.category(), ErrorCategory::Io);
        assert_eq!(io.severity(), ErrorSeverity::Critical);
    }
}
