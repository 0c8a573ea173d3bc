//! Notification pipeline
//!
//! The glue that forwards one inbound event: build the payload, then post
//! it to every subscriber URL. A payload-building failure drops the
//! notification for that event only; per-URL delivery failures are logged
//! and never affect other URLs or other events.

use crate::outbound::WebhookDispatcher;
use crate::payload::PayloadBuilder;
use crate::Result;
use courier_core::event::MessageEvent;
use std::sync::Arc;
use tracing::{debug, error, info};

pub struct NotificationPipeline {
    builder: PayloadBuilder,
    dispatcher: Arc<WebhookDispatcher>,
}

impl NotificationPipeline {
    pub fn new(builder: PayloadBuilder, dispatcher: Arc<WebhookDispatcher>) -> Self {
        Self {
            builder,
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &Arc<WebhookDispatcher> {
        &self.dispatcher
    }

    /// Notify every subscriber about one inbound event.
    ///
    /// Returns an error only when the payload could not be built; delivery
    /// failures are per-URL and already logged by the dispatcher.
    pub async fn notify(&self, event: &MessageEvent) -> Result<()> {
        if !self.dispatcher.has_subscribers() {
            debug!("No webhook subscribers configured, skipping notification");
            return Ok(());
        }

        info!(message_id = %event.info.id, "Forwarding event to webhook subscribers");
        let payload = self.builder.build(event).await.map_err(|e| {
            error!(message_id = %event.info.id, error = %e, "Dropping notification");
            e
        })?;

        let outcomes = self.dispatcher.dispatch_all(&payload).await;
        let delivered = outcomes.iter().filter(|(_, r)| r.is_ok()).count();
        info!(
            message_id = %event.info.id,
            delivered,
            total = outcomes.len(),
            "Event forwarded to webhook subscribers"
        );
        Ok(())
    }
}
