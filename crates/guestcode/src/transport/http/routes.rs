//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::claim::ClaimOutcome;
use crate::ingest::IngestError;
use crate::replenish::{ReplenishError, ReplenishOutcome};
use crate::service::CodeService;

/// `GET /code`: claim the newest unused code.
///
/// The body is the contract: the code value on success, `"wait please"` when
/// the inventory is empty, and nothing when the store could not complete the
/// claim. An unavailable store is never reported as an empty inventory.
async fn claim_code(State(service): State<Arc<CodeService>>) -> impl IntoResponse {
    match service.claim().await {
        Ok(ClaimOutcome::Granted(value)) => (StatusCode::OK, value),
        Ok(ClaimOutcome::Empty) => (StatusCode::OK, "wait please".to_string()),
        Err(e) => {
            tracing::error!(error = %e, "claim failed");
            (StatusCode::SERVICE_UNAVAILABLE, String::new())
        }
    }
}

/// `GET /check`: run the inventory check; `"sent"` when a replenishment
/// request went out, empty body when the inventory is healthy.
async fn check_inventory(State(service): State<Arc<CodeService>>) -> impl IntoResponse {
    match service.check_and_replenish().await {
        Ok(ReplenishOutcome::Requested) => (StatusCode::OK, "sent"),
        Ok(ReplenishOutcome::Healthy) => (StatusCode::OK, ""),
        Err(ReplenishError::Store(e)) => {
            tracing::error!(error = %e, "inventory check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "")
        }
        Err(ReplenishError::Notifier(e)) => {
            tracing::error!(error = %e, "replenishment dispatch failed");
            (StatusCode::BAD_GATEWAY, "")
        }
    }
}

/// Inbound-mail webhook. Codeless and duplicate replies are recovered
/// internally, so the webhook caller sees success for every decodable
/// outcome; only store or dispatch failures surface.
async fn receive_mail(State(service): State<Arc<CodeService>>, body: Bytes) -> impl IntoResponse {
    match service.ingest(&body).await {
        Ok(outcome) => {
            tracing::debug!(?outcome, "inbound mail processed");
            StatusCode::OK
        }
        Err(IngestError::Store(e)) => {
            tracing::error!(error = %e, "mail ingestion failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
        Err(IngestError::Notifier(e)) => {
            tracing::error!(error = %e, "replenishment dispatch failed");
            StatusCode::BAD_GATEWAY
        }
    }
}

pub fn routes(service: Arc<CodeService>) -> Router {
    Router::new()
        .route("/code", get(claim_code))
        .route("/check", get(check_inventory))
        .route("/mail/incoming", post(receive_mail))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{TimeZone, Utc};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::code::CodeRecord;
    use crate::notifier::{MailTransport, Notifier, NotifierError, OutboundMessage, SenderStrategy};
    use crate::store::{CodeStore, MemoryCodeStore, StoreError};

    const PROVIDER_REPLY: &str = "From: cs-info@wi2.example.jp\r
To: agent@guestcode.example.org\r
Subject: Wi2 300 ゲストコードのお知らせ\r
\r
ゲストコード　：　DCS7270BRQ\r
";

    struct RecordingTransport {
        sent: Mutex<Vec<OutboundMessage>>,
    }

    impl RecordingTransport {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn send(&self, message: &OutboundMessage) -> Result<(), NotifierError> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl MailTransport for FailingTransport {
        async fn send(&self, _message: &OutboundMessage) -> Result<(), NotifierError> {
            Err(NotifierError::RelayStatus(500))
        }
    }

    /// Store whose every operation fails.
    struct UnavailableStore;

    #[async_trait]
    impl CodeStore for UnavailableStore {
        async fn claim_newest_unused(&self) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("store is down".to_string()))
        }

        async fn newest(&self) -> Result<Option<CodeRecord>, StoreError> {
            Err(StoreError::Unavailable("store is down".to_string()))
        }

        async fn contains(&self, _value: &str) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("store is down".to_string()))
        }

        async fn insert(&self, _record: CodeRecord) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("store is down".to_string()))
        }
    }

    fn app(store: Arc<dyn CodeStore>, transport: Arc<dyn MailTransport>) -> Router {
        let notifier = Arc::new(Notifier::new(
            transport,
            "provider@example.com".to_string(),
            SenderStrategy::Fixed("agent@example.org".to_string()),
        ));
        routes(Arc::new(CodeService::new(store, notifier)))
    }

    async fn response_text(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn record(value: &str, used: bool, y: i32, m: u32, d: u32) -> CodeRecord {
        CodeRecord {
            value: value.to_string(),
            used,
            created: Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn code_returns_newest_unused_value() {
        let store = Arc::new(MemoryCodeStore::new());
        store.insert(record("DCS5678DEF", false, 1996, 7, 30)).await.unwrap();
        store.insert(record("DCS1234ABC", false, 1999, 11, 7)).await.unwrap();
        let app = app(store, Arc::new(RecordingTransport::new()));

        let response = app
            .oneshot(Request::get("/code").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_text(response).await, "DCS1234ABC");
    }

    #[tokio::test]
    async fn code_says_wait_when_inventory_is_empty() {
        let app = app(Arc::new(MemoryCodeStore::new()), Arc::new(RecordingTransport::new()));

        let response = app
            .oneshot(Request::get("/code").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_text(response).await, "wait please");
    }

    #[tokio::test]
    async fn code_store_failure_is_silent_and_distinct_from_empty() {
        let app = app(Arc::new(UnavailableStore), Arc::new(RecordingTransport::new()));

        let response = app
            .oneshot(Request::get("/code").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response_text(response).await, "");
    }

    #[tokio::test]
    async fn check_dispatches_when_inventory_is_empty() {
        let transport = Arc::new(RecordingTransport::new());
        let app = app(Arc::new(MemoryCodeStore::new()), Arc::clone(&transport) as _);

        let response = app
            .oneshot(Request::get("/check").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_text(response).await, "sent");
        assert_eq!(transport.sent_count(), 1);
    }

    #[tokio::test]
    async fn check_is_quiet_when_newest_record_is_unused() {
        let store = Arc::new(MemoryCodeStore::new());
        store.insert(record("DCS1234ABC", false, 1999, 11, 7)).await.unwrap();
        let transport = Arc::new(RecordingTransport::new());
        let app = app(store, Arc::clone(&transport) as _);

        let response = app
            .oneshot(Request::get("/check").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_text(response).await, "");
        assert_eq!(transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn check_surfaces_dispatch_failure() {
        let app = app(Arc::new(MemoryCodeStore::new()), Arc::new(FailingTransport));

        let response = app
            .oneshot(Request::get("/check").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn mail_webhook_stores_the_code() {
        let store = Arc::new(MemoryCodeStore::new());
        let transport = Arc::new(RecordingTransport::new());
        let app = app(Arc::clone(&store) as _, transport);

        let response = app
            .oneshot(
                Request::post("/mail/incoming")
                    .body(Body::from(PROVIDER_REPLY))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(store.contains("DCS7270BRQ").await.unwrap());
    }

    #[tokio::test]
    async fn mail_webhook_succeeds_for_duplicate_replies() {
        let store = Arc::new(MemoryCodeStore::new());
        store.insert(record("DCS7270BRQ", true, 1996, 7, 30)).await.unwrap();
        let transport = Arc::new(RecordingTransport::new());
        let app = app(Arc::clone(&store) as _, Arc::clone(&transport) as _);

        let response = app
            .oneshot(
                Request::post("/mail/incoming")
                    .body(Body::from(PROVIDER_REPLY))
                    .unwrap(),
            )
            .await
            .unwrap();

        // Recovered internally: the caller sees success, a new request went out.
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(transport.sent_count(), 1);
        assert_eq!(store.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn mail_webhook_succeeds_for_codeless_replies() {
        let transport = Arc::new(RecordingTransport::new());
        let app = app(Arc::new(MemoryCodeStore::new()), Arc::clone(&transport) as _);

        let response = app
            .oneshot(
                Request::post("/mail/incoming")
                    .body(Body::from("Subject: hello\r\n\r\nno token here\r\n"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(transport.sent_count(), 1);
    }
}
