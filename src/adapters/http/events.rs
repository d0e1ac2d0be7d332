//! Internal event ingress.
//!
//! The messenger API posts its message events here once a message has been
//! stored or edited. Each envelope is published onto the in-process event
//! bus, where the channel notifiers turn it into pushes.
//!
//! - `POST /internal/events` - one `EventEnvelope` as JSON, answered with 202
//!
//! The route is for the API tier only and is not exposed through the
//! public gateway.

use std::sync::Arc;

use axum::extract::{FromRef, Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use serde::Serialize;

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::domain::messaging::NotificationKind;
use crate::ports::EventPublisher;

/// State for the ingress route: where accepted events are published.
#[derive(Clone)]
pub struct EventIngress {
    pub publisher: Arc<dyn EventPublisher>,
}

impl EventIngress {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }
}

/// Error body returned by the ingress route.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_code: String,
    pub message: String,
}

/// Rejection of a posted event.
#[derive(Debug)]
pub enum EventIngressError {
    /// No notification is derived from this event type.
    UnsupportedEvent(String),
    /// A handler rejected or failed on the event.
    Domain(DomainError),
}

impl From<DomainError> for EventIngressError {
    fn from(err: DomainError) -> Self {
        EventIngressError::Domain(err)
    }
}

impl IntoResponse for EventIngressError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code, message) = match self {
            EventIngressError::UnsupportedEvent(event_type) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNSUPPORTED_EVENT",
                format!("No notification for event type '{}'", event_type),
            ),
            EventIngressError::Domain(err) => match err.code {
                ErrorCode::ValidationFailed | ErrorCode::InvalidFormat => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_EVENT", err.message)
                }
                _ => {
                    tracing::error!(error = %err, "Event ingress failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", err.message)
                }
            },
        };

        let body = ErrorResponse {
            error_code: error_code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

/// POST /internal/events - publish one message event.
pub async fn publish_event(
    State(ingress): State<EventIngress>,
    Json(envelope): Json<EventEnvelope>,
) -> Result<impl IntoResponse, EventIngressError> {
    if NotificationKind::from_event_type(&envelope.event_type).is_none() {
        return Err(EventIngressError::UnsupportedEvent(envelope.event_type));
    }

    tracing::debug!(
        event_type = %envelope.event_type,
        event_id = %envelope.event_id,
        aggregate_id = %envelope.aggregate_id,
        "Event received"
    );

    ingress.publisher.publish(envelope).await?;
    Ok(StatusCode::ACCEPTED)
}

/// Create the internal event router.
pub fn event_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    EventIngress: FromRef<S>,
{
    Router::new().route("/internal/events", post(publish_event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::InMemoryEventBus;
    use crate::ports::{EventHandler, EventSubscriber};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl EventHandler for Counting {
        async fn handle(&self, _: EventEnvelope) -> Result<(), DomainError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn name(&self) -> &'static str {
            "Counting"
        }
    }

    struct Rejecting;

    #[async_trait]
    impl EventHandler for Rejecting {
        async fn handle(&self, _: EventEnvelope) -> Result<(), DomainError> {
            Err(DomainError::new(ErrorCode::ValidationFailed, "missing channel_id"))
        }
        fn name(&self) -> &'static str {
            "Rejecting"
        }
    }

    fn envelope(event_type: &str) -> EventEnvelope {
        EventEnvelope::new(event_type, "channel-1", "Channel", json!({}))
    }

    #[tokio::test]
    async fn accepted_event_reaches_bus_handlers() {
        let bus = Arc::new(InMemoryEventBus::new());
        let counter = Arc::new(AtomicUsize::new(0));
        bus.subscribe("message.created.v1", Arc::new(Counting(counter.clone())));

        let response = publish_event(State(EventIngress::new(bus)), Json(envelope("message.created.v1")))
            .await
            .unwrap()
            .into_response();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_event_type_is_unprocessable() {
        let bus = Arc::new(InMemoryEventBus::new());

        let err = publish_event(State(EventIngress::new(bus)), Json(envelope("channel.created.v1")))
            .await
            .err()
            .unwrap();

        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn handler_validation_failure_is_unprocessable() {
        let bus = Arc::new(InMemoryEventBus::new());
        bus.subscribe("message.updated.v1", Arc::new(Rejecting));

        let err = publish_event(State(EventIngress::new(bus)), Json(envelope("message.updated.v1")))
            .await
            .err()
            .unwrap();

        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn infrastructure_failure_is_internal_error() {
        let err = EventIngressError::from(DomainError::new(ErrorCode::DatabaseError, "down"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
