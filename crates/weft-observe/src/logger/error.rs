use thiserror::Error;

/// Failures while building or installing the global subscriber.
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("unknown log format {0:?} (expected text, json or journald)")]
    InvalidFormat(String),
    #[error("journald output needs linux and the `journald` feature")]
    JournaldNotSupported,
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
    #[error("logger init failed: {0}")]
    InitializationFailed(String),
    #[error("invalid log level directive {0:?}")]
    InvalidLogLevel(String),
}
