use chrono::Utc;
use serde_json::json;
use worker::*;

/// Structured logger scoped to one request.
///
/// Emits single-line JSON so the Workers log tail stays machine-readable;
/// every line carries the request id for correlation.
pub struct Logger {
    request_id: String,
}

#[derive(Clone, Copy)]
enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

impl Logger {
    /// Create a logger for the request identified by `request_id`.
    pub fn new(request_id: String) -> Self {
        Self { request_id }
    }

    pub fn info(&self, message: &str, data: Option<serde_json::Value>) {
        self.log(Level::Info, message, data);
    }

    pub fn warn(&self, message: &str, data: Option<serde_json::Value>) {
        self.log(Level::Warn, message, data);
    }

    pub fn error(&self, message: &str, data: Option<serde_json::Value>) {
        self.log(Level::Error, message, data);
    }

    fn log(&self, level: Level, message: &str, data: Option<serde_json::Value>) {
        let line = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level.as_str(),
            "request_id": self.request_id,
            "message": message,
            "data": data
        });

        match level {
            Level::Info => console_log!("{}", line),
            Level::Warn => console_warn!("{}", line),
            Level::Error => console_error!("{}", line),
        }
    }
}

/// Macro to create a JSON object for additional log data
///
/// Usage: log_data!("key1" => "value1", "key2" => 42)
#[macro_export]
macro_rules! log_data {
    ($($key:expr => $value:expr),* $(,)?) => {
        Some(serde_json::json!({ $($key: $value),* }))
    };
}
