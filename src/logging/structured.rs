//! Structured logging utilities.
//!
//! Provides context-aware logging with the OS user id and the requesting
//! app's bundle id included in every log message.

use std::fmt;

use crate::flow::FlowDescriptor;

/// Logging context for one evaluation.
#[derive(Debug, Clone, Default)]
pub struct LogContext {
    pub user_id: Option<u32>,
    pub bundle_id: Option<String>,
}

impl LogContext {
    pub fn for_user(user_id: Option<u32>) -> Self {
        Self {
            user_id,
            bundle_id: None,
        }
    }

    pub fn for_flow(flow: &FlowDescriptor) -> Self {
        Self {
            user_id: flow.user_id,
            bundle_id: flow.bundle_id.clone(),
        }
    }

    pub fn with_app(&self, bundle_id: &str) -> Self {
        Self {
            user_id: self.user_id,
            bundle_id: Some(bundle_id.to_string()),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.user_id {
            Some(uid) => write!(f, "[user={}]", uid)?,
            None => write!(f, "[user=?]")?,
        }
        if let Some(app) = &self.bundle_id {
            write!(f, " [app={}]", app)?;
        }
        Ok(())
    }
}

/// Log an info message with context.
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::info!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}

/// Log a warning message with context.
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::warn!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}

/// Log a debug message with context.
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::debug!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}
