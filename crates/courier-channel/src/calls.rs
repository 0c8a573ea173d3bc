//! Call-ended handling
//!
//! Upstream delivers call-termination events at-least-once, so this handler
//! sits behind the dedup guard: per logical call, at most one reject action
//! and at most one webhook submission. The webhook runs as a detached task;
//! the caller gets its answer as soon as the call is rejected.

use crate::{ChannelError, Result};
use chrono::Utc;
use courier_core::jid::Jid;
use courier_core::traits::ChatTransport;
use courier_webhook::dedup::DedupCache;
use courier_webhook::outbound::WebhookDispatcher;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Result of handling a call-ended event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// The call was rejected and subscribers are being notified
    Rejected,
    /// A duplicate within the dedup window; nothing was done
    AlreadyProcessed,
}

/// Payload posted to subscribers when a call is rejected
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallPayload {
    #[serde(rename = "SenderNumber")]
    pub sender_number: String,
    #[serde(rename = "Call_Id")]
    pub call_id: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Status_Call")]
    pub status: String,
    #[serde(rename = "timestamp")]
    pub timestamp: String,
    #[serde(rename = "IsGroup")]
    pub is_group: bool,
}

impl CallPayload {
    fn rejected(call_id: &str, phone: &str) -> Self {
        Self {
            sender_number: phone.to_string(),
            call_id: call_id.to_string(),
            kind: "call_received".to_string(),
            status: "rejected".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            is_group: false,
        }
    }
}

pub struct CallService {
    transport: Arc<dyn ChatTransport>,
    dispatcher: Arc<WebhookDispatcher>,
    dedup: Arc<DedupCache>,
}

impl CallService {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        dispatcher: Arc<WebhookDispatcher>,
        dedup: Arc<DedupCache>,
    ) -> Self {
        Self {
            transport,
            dispatcher,
            dedup,
        }
    }

    /// Handle one call-ended event.
    ///
    /// Duplicates inside the dedup window come back as
    /// [`CallOutcome::AlreadyProcessed`] without touching the transport. If
    /// the reject fails, the guard key is released so a genuine redelivery
    /// retries the whole action.
    pub async fn handle_call_ended(&self, call_id: &str, phone: &str) -> Result<CallOutcome> {
        if call_id.is_empty() {
            return Err(ChannelError::InvalidRequest("call_id is required".to_string()));
        }
        if phone.is_empty() {
            return Err(ChannelError::InvalidRequest("phone is required".to_string()));
        }
        let caller = Jid::parse(phone)?;

        let key = format!("{call_id}:{phone}");
        if !self.dedup.guard(&key) {
            info!(call_id, phone, "Call already processed, ignoring duplicate");
            return Ok(CallOutcome::AlreadyProcessed);
        }

        if let Err(e) = self.transport.reject_call(&caller, call_id).await {
            // Roll back the guard so an upstream retry is not suppressed.
            self.dedup.release(&key);
            return Err(e.into());
        }
        info!(call_id, phone, "Call rejected");

        if self.dispatcher.has_subscribers() {
            let dispatcher = Arc::clone(&self.dispatcher);
            let payload = CallPayload::rejected(call_id, phone);
            let call_id = call_id.to_string();
            tokio::spawn(async move {
                for (url, outcome) in dispatcher.dispatch_all(&payload).await {
                    if let Err(e) = outcome {
                        error!(call_id, url, error = %e, "Failed to send call rejected webhook");
                    }
                }
            });
        }

        Ok(CallOutcome::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use courier_core::traits::{PresenceKind, ReplySpec, TransportError};
    use courier_webhook::outbound::RetryConfig;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct FakeTransport {
        reject_calls: AtomicU32,
        fail_reject: AtomicBool,
        rejected: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ChatTransport for FakeTransport {
        fn is_connected(&self) -> bool {
            true
        }

        fn is_logged_in(&self) -> bool {
            true
        }

        fn own_jid(&self) -> Option<Jid> {
            None
        }

        async fn send_text(
            &self,
            _chat: &Jid,
            _text: &str,
            _reply: Option<&ReplySpec>,
        ) -> Result<String, TransportError> {
            Ok("SENT".to_string())
        }

        async fn send_presence(
            &self,
            _chat: &Jid,
            _kind: PresenceKind,
        ) -> Result<(), TransportError> {
            Ok(())
        }

        async fn reject_call(&self, caller: &Jid, call_id: &str) -> Result<(), TransportError> {
            self.reject_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_reject.load(Ordering::SeqCst) {
                return Err(TransportError("reject failed".to_string()));
            }
            self.rejected
                .lock()
                .push((caller.to_string(), call_id.to_string()));
            Ok(())
        }

        async fn revoke_message(
            &self,
            _chat: &Jid,
            _message_id: &str,
        ) -> Result<(), TransportError> {
            Ok(())
        }

        async fn mark_read(
            &self,
            _chat: &Jid,
            _sender: Option<&Jid>,
            _message_id: &str,
            _played: bool,
        ) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn service(transport: Arc<FakeTransport>) -> CallService {
        let dispatcher = Arc::new(
            WebhookDispatcher::new(Vec::new(), "secret", RetryConfig::default()).unwrap(),
        );
        let dedup = Arc::new(DedupCache::new(Duration::from_secs(300)));
        CallService::new(transport, dispatcher, dedup)
    }

    #[tokio::test]
    async fn test_duplicate_call_rejected_once() {
        let transport = Arc::new(FakeTransport::default());
        let svc = service(Arc::clone(&transport));

        let first = svc.handle_call_ended("ABC", "+1555").await.unwrap();
        assert_eq!(first, CallOutcome::Rejected);

        let second = svc.handle_call_ended("ABC", "+1555").await.unwrap();
        assert_eq!(second, CallOutcome::AlreadyProcessed);

        assert_eq!(transport.reject_calls.load(Ordering::SeqCst), 1);
        let rejected = transport.rejected.lock();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0], ("1555@s.whatsapp.net".to_string(), "ABC".to_string()));
    }

    #[tokio::test]
    async fn test_distinct_calls_both_rejected() {
        let transport = Arc::new(FakeTransport::default());
        let svc = service(Arc::clone(&transport));

        svc.handle_call_ended("ABC", "+1555").await.unwrap();
        svc.handle_call_ended("DEF", "+1555").await.unwrap();
        assert_eq!(transport.reject_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_reject_failure_releases_guard() {
        let transport = Arc::new(FakeTransport::default());
        transport.fail_reject.store(true, Ordering::SeqCst);
        let svc = service(Arc::clone(&transport));

        let err = svc.handle_call_ended("ABC", "+1555").await.unwrap_err();
        assert!(matches!(err, ChannelError::Transport(_)));

        // The guard was rolled back, so the retry goes through.
        transport.fail_reject.store(false, Ordering::SeqCst);
        let outcome = svc.handle_call_ended("ABC", "+1555").await.unwrap();
        assert_eq!(outcome, CallOutcome::Rejected);
        assert_eq!(transport.reject_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_duplicate_call_notifies_subscriber_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport = Arc::new(FakeTransport::default());
        let dispatcher = Arc::new(
            WebhookDispatcher::new(vec![server.uri()], "secret", RetryConfig::default()).unwrap(),
        );
        let dedup = Arc::new(DedupCache::new(Duration::from_secs(300)));
        let svc = CallService::new(transport.clone(), dispatcher, dedup);

        let first = svc.handle_call_ended("ABC", "+1555").await.unwrap();
        assert_eq!(first, CallOutcome::Rejected);
        let second = svc.handle_call_ended("ABC", "+1555").await.unwrap();
        assert_eq!(second, CallOutcome::AlreadyProcessed);

        // The notification runs on a detached task; wait for it to land.
        let mut requests = Vec::new();
        for _ in 0..100 {
            requests = server.received_requests().await.unwrap();
            if !requests.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(requests.len(), 1);

        let json: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(json["Type"], "call_received");
        assert_eq!(json["Call_Id"], "ABC");
        assert_eq!(json["Status_Call"], "rejected");
        assert_eq!(json["SenderNumber"], "+1555");
    }

    #[tokio::test]
    async fn test_missing_fields_rejected() {
        let transport = Arc::new(FakeTransport::default());
        let svc = service(transport);

        assert!(matches!(
            svc.handle_call_ended("", "+1555").await.unwrap_err(),
            ChannelError::InvalidRequest(_)
        ));
        assert!(matches!(
            svc.handle_call_ended("ABC", "").await.unwrap_err(),
            ChannelError::InvalidRequest(_)
        ));
    }

    #[test]
    fn test_call_payload_wire_keys() {
        let payload = CallPayload::rejected("ABC", "+1555");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["SenderNumber"], "+1555");
        assert_eq!(json["Call_Id"], "ABC");
        assert_eq!(json["Type"], "call_received");
        assert_eq!(json["Status_Call"], "rejected");
        assert_eq!(json["IsGroup"], false);
        assert!(json["timestamp"].is_string());
    }
}
