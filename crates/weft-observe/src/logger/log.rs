use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, fmt, fmt::time::OffsetTime, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError};

pub(crate) struct Logger;

impl Logger {
    pub(crate) fn text(cfg: &LoggerConfig) -> Result<(), LoggerError> {
        let layer = fmt::layer()
            .with_ansi(cfg.use_color)
            .with_target(cfg.with_targets)
            .with_thread_names(true)
            .with_timer(local_timer());

        install(tracing_subscriber::registry().with(cfg.level.filter()?).with(layer))
    }

    pub(crate) fn json(cfg: &LoggerConfig) -> Result<(), LoggerError> {
        let layer = fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(cfg.with_targets)
            .with_current_span(true)
            .with_timer(local_timer());

        install(tracing_subscriber::registry().with(cfg.level.filter()?).with(layer))
    }

    pub(crate) fn journald(cfg: &LoggerConfig) -> Result<(), LoggerError> {
        journald(cfg.level.filter()?)
    }
}

/// RFC3339 timestamps in the host's offset, UTC when the offset cannot be determined
/// (e.g. once other threads are running).
fn local_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

fn install<S>(subscriber: S) -> Result<(), LoggerError>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber.try_init().map_err(|e| init_error(e.to_string()))
}

fn init_error(msg: String) -> LoggerError {
    if msg.contains("SetGlobalDefaultError") || msg.contains("global default") {
        LoggerError::AlreadyInitialized
    } else {
        LoggerError::InitializationFailed(msg)
    }
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn journald(filter: EnvFilter) -> Result<(), LoggerError> {
    let layer = tracing_journald::layer()
        .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))?;
    install(tracing_subscriber::registry().with(filter).with(layer))
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn journald(_filter: EnvFilter) -> Result<(), LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taken_global_default_means_already_initialized() {
        let err = init_error("a global default trace dispatcher has already been set".into());
        assert!(matches!(err, LoggerError::AlreadyInitialized));
    }

    #[test]
    fn other_failures_keep_their_message() {
        let err = init_error("journald socket unavailable".into());
        assert!(matches!(err, LoggerError::InitializationFailed(m) if m.contains("socket")));
    }
}
