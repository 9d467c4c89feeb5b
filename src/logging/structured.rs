//! Structured logging utilities.
//!
//! Provides context-aware logging with request_id and record_id included
//! in every log message.

use std::fmt;

/// Logging context for one request resolving feedback records.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub request_id: String,
    pub record_id: Option<u64>,
}

impl LogContext {
    pub fn new(request_id: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            record_id: None,
        }
    }

    pub fn with_record(&self, record_id: u64) -> Self {
        Self {
            request_id: self.request_id.clone(),
            record_id: Some(record_id),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.record_id {
            Some(rid) => write!(f, "[request={}] [record={}]", self.request_id, rid),
            None => write!(f, "[request={}]", self.request_id),
        }
    }
}

/// Log an info message with context.
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::info!(
            concat!("{} {}", $(" ", stringify!($key), "={:?}"),*),
            $ctx,
            $event,
            $($value),*
        );
    };
}

/// Log a warning message with context.
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::warn!(
            concat!("{} {}", $(" ", stringify!($key), "={:?}"),*),
            $ctx,
            $event,
            $($value),*
        );
    };
}

/// Log an error message with context.
#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::error!(
            concat!("{} {}", $(" ", stringify!($key), "={:?}"),*),
            $ctx,
            $event,
            $($value),*
        );
    };
}

/// Log a debug message with context.
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::debug!(
            concat!("{} {}", $(" ", stringify!($key), "={:?}"),*),
            $ctx,
            $event,
            $($value),*
        );
    };
}
