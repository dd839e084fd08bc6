//! Mock notification webhook
//!
//! A wiremock server standing in for the SMS/email fan-out service.

use std::time::Duration;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, Request, ResponseTemplate,
};
use PantryDesk::config::NotificationConfig;
use PantryDesk::services::{NotificationService, PromotionNotice};

pub const WEBHOOK_PATH: &str = "/hooks/promotion";

pub struct WebhookMockServer {
    pub server: MockServer,
}

impl WebhookMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.server.uri(), WEBHOOK_PATH)
    }

    pub fn config(&self) -> NotificationConfig {
        NotificationConfig {
            webhook_url: Some(self.url()),
            timeout_seconds: 2,
        }
    }

    pub fn notification_service(&self) -> NotificationService {
        NotificationService::new(&self.config()).expect("Failed to build notification service")
    }

    /// Accept notices with the given status, expecting `times` calls
    pub async fn mock_promotion(&self, status: u16, times: u64) {
        Mock::given(method("POST"))
            .and(path(WEBHOOK_PATH))
            .respond_with(ResponseTemplate::new(status))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Notices received so far
    pub async fn received_notices(&self) -> Vec<PromotionNotice> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|request: &Request| request.body_json::<PromotionNotice>().ok())
            .collect()
    }

    /// Poll until `count` notices arrived or the timeout passes
    pub async fn wait_for_notices(&self, count: usize, timeout: Duration) -> Vec<PromotionNotice> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notices = self.received_notices().await;
            if notices.len() >= count || tokio::time::Instant::now() >= deadline {
                return notices;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}
