use thiserror::Error;

#[derive(Error, Debug)]
pub enum FareError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Authentication failed: {message}")]
    AuthError { message: String },

    #[error("Notification failed: {message}")]
    NotificationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Authentication,
    Notification,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FareError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FareError::ApiError(_) => ErrorCategory::Network,
            FareError::IoError(_) => ErrorCategory::System,
            FareError::ConfigError { .. }
            | FareError::MissingConfigError { .. }
            | FareError::InvalidConfigValueError { .. }
            | FareError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            FareError::AuthError { .. } => ErrorCategory::Authentication,
            FareError::NotificationError { .. } => ErrorCategory::Notification,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 通知失敗不影響搜尋結果
            ErrorCategory::Notification => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Authentication => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the TOML config file and the environment variables it references"
            }
            ErrorCategory::Network => "Check network connectivity and the provider host, then retry",
            ErrorCategory::Authentication => {
                "Verify AMADEUS_API_KEY / AMADEUS_API_SECRET and the provider host"
            }
            ErrorCategory::Notification => {
                "Verify TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID; the search itself completed"
            }
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            FareError::MissingConfigError { field } => {
                format!("Required setting '{}' is missing", field)
            }
            FareError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            FareError::AuthError { .. } => "Could not authenticate with the flight search API".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_high_severity() {
        let err = FareError::MissingConfigError {
            field: "search.origins".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("search.origins"));
    }

    #[test]
    fn test_notification_errors_are_low_severity() {
        let err = FareError::NotificationError {
            message: "chat not found".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.to_string(), "Notification failed: chat not found");
    }

    #[test]
    fn test_io_errors_are_critical() {
        let err = FareError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "fare-scout.toml"));
        assert_eq!(err.category(), ErrorCategory::System);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }
}
