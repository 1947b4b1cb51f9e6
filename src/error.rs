use axum::response::{IntoResponse, Response};
use http::StatusCode;

/// Errors surfaced by the relay.
///
/// Malformed upstream event payloads are deliberately *not* represented here:
/// they are swallowed by the translator, not propagated. Only request-setup
/// and transport failures become `RelayError`s.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("message list must not be empty")]
    EmptyMessages,

    #[error("unsupported model: {0}")]
    UnknownModel(String),

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    UpstreamStatus { status: StatusCode, body: String },

    #[error("upstream stream read failed: {0}")]
    Stream(String),
}

impl RelayError {
    /// HTTP status used when the error terminates a non-streaming exchange.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::InvalidBody(_)
            | RelayError::EmptyMessages
            | RelayError::UnknownModel(_) => StatusCode::BAD_REQUEST,
            RelayError::Transport(_)
            | RelayError::UpstreamStatus { .. }
            | RelayError::Stream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        crate::util::error_response(self.status_code(), &self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_400() {
        assert_eq!(
            RelayError::EmptyMessages.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::UnknownModel("gpt-x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::InvalidBody("expected an array".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn upstream_errors_map_to_500() {
        let err = RelayError::UpstreamStatus {
            status: StatusCode::BAD_GATEWAY,
            body: "nope".into(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            RelayError::Stream("reset".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
