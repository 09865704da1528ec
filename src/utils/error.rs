use thiserror::Error;

/// Outcome of classifying a failed network operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureClassification {
    Timeout,
    NetworkUnreachable,
    HttpError { status: u16, message: Option<String> },
    DemoModeShortCircuit,
    Unknown(String),
}

impl FailureClassification {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::HttpError { status: 401 | 403, .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::NetworkUnreachable => "network_unreachable",
            Self::HttpError { .. } => "http_error",
            Self::DemoModeShortCircuit => "demo_short_circuit",
            Self::Unknown(_) => "unknown",
        }
    }
}

#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Request timed out")]
    Timeout,

    #[error("Network unreachable")]
    NetworkUnreachable,

    #[error("HTTP error {status}: {}", message.as_deref().unwrap_or("no message"))]
    Http { status: u16, message: Option<String> },

    #[error("Validation failed for '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("Credenciales inválidas")]
    Authentication,

    #[error("{0}")]
    NotFound(String),

    #[error("Network disabled in demo mode")]
    DemoModeShortCircuit,

    #[error("Session expired")]
    SessionExpired,

    #[error("Unexpected failure: {0}")]
    Unknown(String),

    #[error("Invalid configuration value for '{field}' = '{value}': {reason}")]
    Config {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Secure storage error: {message}")]
    Storage { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Server,
    Client,
    Session,
    Configuration,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AccessError {
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Timeout | Self::NetworkUnreachable | Self::DemoModeShortCircuit => {
                ErrorCategory::Network
            }
            Self::Http { status, .. } if *status >= 500 => ErrorCategory::Server,
            Self::Http { .. } | Self::Validation { .. } | Self::NotFound(_) => ErrorCategory::Client,
            Self::Authentication | Self::SessionExpired => ErrorCategory::Session,
            Self::Config { .. } | Self::Toml(_) => {
                ErrorCategory::Configuration
            }
            Self::Unknown(_)
            | Self::Storage { .. }
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::Client(_) => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Client | ErrorCategory::Session => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Server => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Internal => ErrorSeverity::Critical,
        }
    }

    /// Text shown to the end user in a failed envelope.
    pub fn user_message(&self) -> String {
        match self {
            Self::Timeout => "La conexión está lenta, intenta de nuevo más tarde".to_string(),
            Self::NetworkUnreachable => "Sin conexión a internet".to_string(),
            Self::Http {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            Self::Http { status, .. } => format!("Error del servidor ({})", status),
            Self::Validation { reason, .. } => reason.clone(),
            Self::Authentication => "Credenciales inválidas".to_string(),
            Self::NotFound(message) => message.clone(),
            Self::DemoModeShortCircuit => "Operación no disponible en modo demo".to_string(),
            Self::SessionExpired => "Tu sesión ha expirado, inicia sesión nuevamente".to_string(),
            Self::Unknown(_) => "Ocurrió un error inesperado".to_string(),
            Self::Config { .. } | Self::Toml(_) => {
                format!("Configuración inválida: {}", self)
            }
            Self::Storage { .. } | Self::Io(_) => {
                "No se pudo acceder al almacenamiento seguro".to_string()
            }
            Self::Serialization(_) | Self::Client(_) => "Ocurrió un error inesperado".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check connectivity or run with --demo",
            ErrorCategory::Server => "The backend is failing; try again later",
            ErrorCategory::Client => "Check the request arguments",
            ErrorCategory::Session => "Log in again",
            ErrorCategory::Configuration => "Fix the configuration file or CLI flags",
            ErrorCategory::Internal => "Re-run with --verbose and inspect the logs",
        }
    }
}

impl From<FailureClassification> for AccessError {
    fn from(failure: FailureClassification) -> Self {
        match failure {
            FailureClassification::Timeout => Self::Timeout,
            FailureClassification::NetworkUnreachable => Self::NetworkUnreachable,
            FailureClassification::HttpError { status, message } => Self::Http { status, message },
            FailureClassification::DemoModeShortCircuit => Self::DemoModeShortCircuit,
            FailureClassification::Unknown(cause) => Self::Unknown(cause),
        }
    }
}

pub type Result<T> = std::result::Result<T, AccessError>;
