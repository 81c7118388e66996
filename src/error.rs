// ============================================================================
// ERRORS - Failure taxonomy shared by every client call
// ============================================================================

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// 401: wrong credentials or an expired session
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// 403: the session lacks the required role
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// 404: e.g. an expired checkout id
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// The client-side bound for a request was exceeded
    #[error("Request timed out")]
    Timeout,

    /// 503, optionally flagged retryable by the backend
    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String, retryable: bool },

    /// Form-level validation; never sent to the network
    #[error("{0}")]
    Validation(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// A 2xx body matching none of the known response shapes
    #[error("Unexpected response: {0}")]
    UnexpectedShape(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Classifies a non-2xx response
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = extract_message(body);
        match status {
            401 => ApiError::Unauthorized { message },
            403 => ApiError::Forbidden { message },
            404 => ApiError::NotFound { message },
            503 => ApiError::ServiceUnavailable {
                message,
                retryable: retryable_flag(body),
            },
            _ => ApiError::Http { status, message },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Forbidden { .. } => Some(403),
            ApiError::NotFound { .. } => Some(404),
            ApiError::ServiceUnavailable { .. } => Some(503),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Timeout | ApiError::ServiceUnavailable { retryable: true, .. }
        )
    }

    /// Backend-provided text, when there is any
    pub fn server_message(&self) -> Option<&str> {
        let message = match self {
            ApiError::Unauthorized { message }
            | ApiError::Forbidden { message }
            | ApiError::NotFound { message }
            | ApiError::ServiceUnavailable { message, .. }
            | ApiError::Http { message, .. } => message.as_str(),
            ApiError::Validation(message) => message.as_str(),
            _ => return None,
        };
        if message.is_empty() {
            None
        } else {
            Some(message)
        }
    }
}

/// Pulls a human readable message out of an error body.
///
/// Bodies are either plain text or JSON carrying `message` or `error`.
pub fn extract_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(map)) => ["message", "error"]
            .iter()
            .find_map(|key| map.get(*key).and_then(|v| v.as_str()))
            .map(str::to_string)
            .unwrap_or_default(),
        Ok(serde_json::Value::String(text)) => text,
        _ => trimmed.to_string(),
    }
}

fn retryable_flag(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("retryable").and_then(|flag| flag.as_bool()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_status() {
        assert!(matches!(
            ApiError::from_response(401, "Wrong password."),
            ApiError::Unauthorized { ref message } if message == "Wrong password."
        ));
        assert!(matches!(ApiError::from_response(403, ""), ApiError::Forbidden { .. }));
        assert!(matches!(
            ApiError::from_response(404, r#"{"error":"Order not found"}"#),
            ApiError::NotFound { ref message } if message == "Order not found"
        ));
        assert!(matches!(
            ApiError::from_response(500, "boom"),
            ApiError::Http { status: 500, .. }
        ));
    }

    #[test]
    fn service_unavailable_reads_retryable_flag() {
        let err = ApiError::from_response(503, r#"{"retryable":true,"error":"Bank offline"}"#);
        assert_eq!(
            err,
            ApiError::ServiceUnavailable {
                message: "Bank offline".to_string(),
                retryable: true
            }
        );
        assert!(err.is_retryable());

        let plain = ApiError::from_response(503, "down");
        assert!(!plain.is_retryable());
    }

    #[test]
    fn message_prefers_message_over_error_field() {
        assert_eq!(extract_message(r#"{"message":"a","error":"b"}"#), "a");
        assert_eq!(extract_message(r#""quoted""#), "quoted");
        assert_eq!(extract_message("  plain text "), "plain text");
        assert_eq!(extract_message(r#"{"status":"x"}"#), "");
    }

    #[test]
    fn timeout_is_retryable_and_has_no_server_message() {
        assert!(ApiError::Timeout.is_retryable());
        assert_eq!(ApiError::Timeout.server_message(), None);
        assert_eq!(ApiError::Timeout.status(), None);
    }
}
