use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use insight_relay::RelayError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Relay(#[from] RelayError),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Relay(err) => match err {
                RelayError::AuthenticationRequired => (StatusCode::UNAUTHORIZED, err.to_string()),
                RelayError::QuotaExceeded { .. } => (StatusCode::TOO_MANY_REQUESTS, err.to_string()),
                RelayError::InvalidDataset(_) | RelayError::InvalidRequest(_) => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                // Already logged with its detail by the relay
                RelayError::InferenceFailure(_) => (
                    StatusCode::BAD_GATEWAY,
                    "Failed to process your query. Please try again.".to_string(),
                ),
                RelayError::Storage(e) => {
                    tracing::error!(error = %e, "Storage error");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use insight_persist::PersistError;
    use insight_types::UnknownDataset;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    #[derive(Clone, Default)]
    struct ErrorCounter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for ErrorCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::ERROR {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn errors_logged_by(err: RelayError) -> usize {
        let counter = ErrorCounter::default();
        let subscriber = tracing_subscriber::registry().with(counter.clone());
        tracing::subscriber::with_default(subscriber, || {
            ApiError::from(err).status_and_message();
        });
        counter.0.load(Ordering::SeqCst)
    }

    fn status_of(err: RelayError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_relay_error_status_mapping() {
        assert_eq!(status_of(RelayError::AuthenticationRequired), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(RelayError::QuotaExceeded { limit: 5 }),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_of(RelayError::InvalidDataset(UnknownDataset("x".into()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RelayError::InferenceFailure("boom".into())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_inference_detail_is_hidden() {
        let (_, message) =
            ApiError::from(RelayError::InferenceFailure("sk-secret leaked".into())).status_and_message();
        assert!(!message.contains("sk-secret"));
    }

    #[test]
    fn test_inference_failure_not_logged_again() {
        assert_eq!(errors_logged_by(RelayError::InferenceFailure("boom".into())), 0);
        assert_eq!(
            errors_logged_by(RelayError::Storage(PersistError::Connection("down".into()))),
            1
        );
    }
}
