use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the Neuri backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Authentication,

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build from an error response. The message comes from the body's
    /// `detail`, then `message`, then the status text.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            return Self::Authentication;
        }

        let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let field = |key: &str| {
            parsed
                .as_ref()
                .and_then(|v| v.get(key))
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let message = field("detail")
            .or_else(|| field("message"))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("An error occurred")
                    .to_string()
            });

        Self::Status {
            status: status.as_u16(),
            message,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication => Some(401),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Network failures and 5xx are worth retrying; auth and other 4xx are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Authentication | Self::Decode(_) => false,
            Self::Status { status, .. } => !(400..500).contains(status),
            Self::Network(_) => true,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_is_authentication() {
        let err = ApiError::from_response(StatusCode::UNAUTHORIZED, "{}");
        assert!(matches!(err, ApiError::Authentication));
        assert!(!err.is_retryable());
    }

    #[test]
    fn message_prefers_detail() {
        let err = ApiError::from_response(
            StatusCode::NOT_FOUND,
            r#"{"detail": "Mission not found", "message": "nope"}"#,
        );
        assert_eq!(err.to_string(), "HTTP 404: Mission not found");
        assert!(!err.is_retryable());

        let err = ApiError::from_response(StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(err.to_string(), "HTTP 502: Bad Gateway");
        assert!(err.is_retryable());
    }
}
