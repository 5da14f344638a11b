use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::json;
use uuid::Uuid;

use shared_config::{AppConfig, StoreBackend};
use shared_models::auth::{Actor, User};

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub booking_horizon_days: i64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            booking_horizon_days: 15,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_service_role_key: String::new(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            store_backend: StoreBackend::Memory,
            booking_horizon_days: self.booking_horizon_days,
            max_slot_window_days: 62,
            port: 0,
        }
    }

    /// Config pointed at a mock PostgREST server.
    pub fn supabase_at(url: &str) -> AppConfig {
        let mut config = Self::default().to_app_config();
        config.supabase_url = url.to_string();
        config.store_backend = StoreBackend::Supabase;
        config
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: String,
}

impl TestUser {
    pub fn new(full_name: &str, role: &str) -> Self {
        let slug = full_name.to_lowercase().replace(' ', ".");
        Self {
            id: Uuid::new_v4(),
            full_name: full_name.to_string(),
            email: format!("{}@clinic.test", slug),
            role: role.to_string(),
        }
    }

    pub fn patient(full_name: &str) -> Self {
        Self::new(full_name, "patient")
    }

    pub fn specialist(full_name: &str) -> Self {
        Self::new(full_name, "specialist")
    }

    pub fn admin(full_name: &str) -> Self {
        Self::new(full_name, "administrator")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.to_string(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: Some(json!({ "full_name": self.full_name })),
            created_at: Some(Utc::now()),
        }
    }

    pub fn to_actor(&self) -> Actor {
        match self.role.as_str() {
            "patient" => Actor::Patient { id: self.id, display_name: self.full_name.clone() },
            "specialist" => Actor::Specialist { id: self.id, display_name: self.full_name.clone() },
            _ => Actor::Administrator { id: self.id },
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "user_metadata": { "full_name": user.full_name },
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }

    pub fn bearer(user: &TestUser, config: &AppConfig) -> String {
        format!("Bearer {}", Self::create_test_token(user, &config.supabase_jwt_secret, Some(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.store_backend, StoreBackend::Memory);
        assert!(!app_config.supabase_jwt_secret.is_empty());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::specialist("Elena Ruiz");
        assert_eq!(user.email, "elena.ruiz@clinic.test");
        assert_eq!(user.role, "specialist");

        let user_model = user.to_user();
        assert_eq!(user_model.id, user.id.to_string());
        assert_eq!(user_model.display_name(), "Elena Ruiz");
        assert_eq!(Actor::try_from(&user_model).unwrap(), user.to_actor());
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::patient("Pablo Diaz");
        let token = JwtTestUtils::create_test_token(&user, "test-secret", Some(1));

        assert_eq!(token.split('.').count(), 3);
    }
}
