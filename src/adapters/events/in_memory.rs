//! In-process event bus.
//!
//! Delivers every published envelope to the handlers subscribed to its
//! event type, in registration order, before `publish` returns. Message
//! events arriving on the internal ingress route (`POST /internal/events`)
//! are published here and the channel notifiers pick them up.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::{EventHandler, EventPublisher, EventSubscriber};

/// Event bus backed by a handler map.
///
/// # Example
///
/// ```ignore
/// let bus = Arc::new(InMemoryEventBus::new());
/// ChannelEventNotifier::register_all(members, notifier, bus.as_ref());
/// bus.publish(EventEnvelope::from_event(&NewMessageCreated::new(view))?).await?;
/// ```
#[derive(Default)]
pub struct InMemoryEventBus {
    handlers: RwLock<HashMap<String, Vec<Arc<dyn EventHandler>>>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handlers listening for `event_type`.
    pub fn handler_count(&self, event_type: &str) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        // Clone handlers to release lock before await points
        let type_handlers: Vec<Arc<dyn EventHandler>> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event.event_type)
            .cloned()
            .unwrap_or_default();

        let mut errors = Vec::new();
        let mut code = None;
        for handler in type_handlers {
            if let Err(e) = handler.handle(event.clone()).await {
                tracing::error!(
                    handler = handler.name(),
                    event_type = %event.event_type,
                    event_id = %event.event_id,
                    error = %e,
                    "Event handler failed"
                );
                code.get_or_insert(e.code);
                errors.push(format!("{}: {}", handler.name(), e));
            }
        }

        if let Some(code) = code {
            return Err(DomainError::new(code, format!("Handler errors: {}", errors.join(", "))));
        }

        Ok(())
    }

    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>) {
        tracing::debug!(event_type, handler = handler.name(), "Subscribing event handler");
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event_type.to_string())
            .or_default()
            .push(handler);
    }

    fn subscribe_all(&self, event_types: &[&str], handler: Arc<dyn EventHandler>) {
        for event_type in event_types {
            self.subscribe(event_type, Arc::clone(&handler));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler(Arc<AtomicUsize>);

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle(&self, _: EventEnvelope) -> Result<(), DomainError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn name(&self) -> &'static str {
            "CountingHandler"
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl EventHandler for FailingHandler {
        async fn handle(&self, _: EventEnvelope) -> Result<(), DomainError> {
            Err(DomainError::new(ErrorCode::InternalError, "Handler failed"))
        }
        fn name(&self) -> &'static str {
            "FailingHandler"
        }
    }

    fn envelope(event_type: &str) -> EventEnvelope {
        EventEnvelope::new(event_type, "channel-1", "Channel", json!({}))
    }

    #[tokio::test]
    async fn only_matching_handlers_run() {
        let bus = InMemoryEventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));

        bus.subscribe("message.created.v1", Arc::new(CountingHandler(counter.clone())));
        bus.publish(envelope("message.created.v1")).await.unwrap();
        bus.publish(envelope("message.deleted.v1")).await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn subscribe_all_registers_each_type() {
        let bus = InMemoryEventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));

        bus.subscribe_all(
            &["message.created.v1", "message.updated.v1"],
            Arc::new(CountingHandler(counter.clone())),
        );
        bus.publish_all(vec![envelope("message.created.v1"), envelope("message.updated.v1")])
            .await
            .unwrap();

        assert_eq!(bus.handler_count("message.created.v1"), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failing_handler_does_not_skip_others() {
        let bus = InMemoryEventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));

        bus.subscribe("message.created.v1", Arc::new(FailingHandler));
        bus.subscribe("message.created.v1", Arc::new(CountingHandler(counter.clone())));
        let result = bus.publish(envelope("message.created.v1")).await;

        let err = result.unwrap_err();
        assert_eq!(err.code, ErrorCode::InternalError);
        assert!(err.message.contains("FailingHandler"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn first_handler_error_code_is_reported() {
        struct RejectingHandler;

        #[async_trait]
        impl EventHandler for RejectingHandler {
            async fn handle(&self, _: EventEnvelope) -> Result<(), DomainError> {
                Err(DomainError::new(ErrorCode::ValidationFailed, "bad payload"))
            }
            fn name(&self) -> &'static str {
                "RejectingHandler"
            }
        }

        let bus = InMemoryEventBus::new();
        bus.subscribe("message.created.v1", Arc::new(RejectingHandler));

        let err = bus.publish(envelope("message.created.v1")).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
