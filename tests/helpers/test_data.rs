//! Test data and service wiring
//!
//! Settings, tokens and callers shared by the integration tests, plus a
//! `TestServices` bundle wiring the real services onto a `MemoryStore`.

use jsonwebtoken::{encode, EncodingKey, Header};
use PantryDesk::config::Settings;
use PantryDesk::services::{Caller, Claims, NotificationService, ServiceFactory};
use PantryDesk::state::AppState;

use super::memory_store::MemoryStore;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789";

/// Default settings with a usable JWT secret and rate limiting off
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.auth.jwt_secret = TEST_JWT_SECRET.to_string();
    settings.rate_limit.enabled = false;
    settings
}

/// Signed access token for a user
pub fn user_token(user_id: i64, role: Option<&str>, name: Option<&str>) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.map(str::to_string),
        name: name.map(str::to_string),
        email: Some(format!("user{}@example.org", user_id)),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}

pub fn user(user_id: i64) -> Caller {
    Caller::User {
        user_id,
        role: Some("client".to_string()),
        name: Some(format!("Client {}", user_id)),
        email: None,
    }
}

/// Signed-in caller without name or email claims
pub fn anonymous_user(user_id: i64) -> Caller {
    Caller::User {
        user_id,
        role: None,
        name: None,
        email: None,
    }
}

pub fn guest(token: &str) -> Caller {
    Caller::Guest { token: token.to_string() }
}

/// Real services on top of an in-memory store
pub struct TestServices {
    pub store: MemoryStore,
    pub services: ServiceFactory,
    pub settings: Settings,
}

impl TestServices {
    pub fn new() -> Self {
        Self::with_settings(test_settings())
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self::with_notifications(settings, NotificationService::disabled())
    }

    pub fn with_notifications(settings: Settings, notifications: NotificationService) -> Self {
        let store = MemoryStore::new();
        let services = ServiceFactory::with_notifications(&settings, store.stores(), notifications);
        Self {
            store,
            services,
            settings,
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(&self.settings, self.services.clone(), None).expect("Failed to build app state")
    }
}
