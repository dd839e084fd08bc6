//! Notification service implementation
//!
//! Posts waitlist promotion notices to a configured webhook, which fans them
//! out to SMS and email. Delivery is fire-and-forget: failures are logged and
//! never reach the registration flow.

use std::time::Duration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::config::NotificationConfig;
use crate::models::Registration;
use crate::utils::errors::Result;
use crate::utils::logging::log_api_error;

/// Payload sent when a waitlisted registration is confirmed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromotionNotice {
    pub kind: String,
    pub registration_id: i64,
    pub event_id: i64,
    pub household_id: i64,
    pub promoted_at: DateTime<Utc>,
}

impl PromotionNotice {
    pub fn for_registration(registration: &Registration) -> Self {
        Self {
            kind: "waitlist_promoted".to_string(),
            registration_id: registration.id,
            event_id: registration.event_id,
            household_id: registration.household_id,
            promoted_at: registration.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct NotificationService {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl NotificationService {
    /// Create a new NotificationService instance
    pub fn new(config: &NotificationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            webhook_url: config.webhook_url.clone(),
        })
    }

    /// Service that never sends anything
    pub fn disabled() -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Deliver a promotion notice and wait for the webhook to accept it
    pub async fn send_promotion(&self, registration: &Registration) -> Result<()> {
        let Some(ref url) = self.webhook_url else {
            return Ok(());
        };

        let notice = PromotionNotice::for_registration(registration);
        self.client
            .post(url)
            .json(&notice)
            .send()
            .await?
            .error_for_status()?;

        debug!(registration_id = registration.id, "Promotion notice delivered");
        Ok(())
    }

    /// Send the notice in the background
    pub fn dispatch_promotion(&self, registration: &Registration) {
        if !self.is_enabled() {
            return;
        }

        let service = self.clone();
        let registration = registration.clone();
        tokio::spawn(async move {
            if let Err(e) = service.send_promotion(&registration).await {
                let context = format!("registration_id={}", registration.id);
                log_api_error("promotion_webhook", &e.to_string(), Some(context.as_str()));
            }
        });
    }
}
