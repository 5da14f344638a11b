use std::env;
use std::str::FromStr;
use tracing::warn;

/// Where the scheduling core keeps its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Supabase,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "supabase" | "postgrest" => Ok(StoreBackend::Supabase),
            "memory" | "in-memory" | "in_memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub supabase_jwt_secret: String,
    pub store_backend: StoreBackend,
    pub booking_horizon_days: i64,
    pub max_slot_window_days: i64,
    pub port: u16,
}

pub const DEFAULT_BOOKING_HORIZON_DAYS: i64 = 15;
pub const DEFAULT_MAX_SLOT_WINDOW_DAYS: i64 = 62;
pub const DEFAULT_PORT: u16 = 3000;

impl AppConfig {
    pub fn from_env() -> Self {
        let mut config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_default(),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            store_backend: StoreBackend::Memory,
            booking_horizon_days: parse_or_default("BOOKING_HORIZON_DAYS", DEFAULT_BOOKING_HORIZON_DAYS),
            max_slot_window_days: parse_or_default("MAX_SLOT_WINDOW_DAYS", DEFAULT_MAX_SLOT_WINDOW_DAYS),
            port: parse_or_default("PORT", DEFAULT_PORT),
        };

        config.store_backend = match env::var("STORE_BACKEND") {
            Ok(raw) => raw.parse().unwrap_or_else(|e: String| {
                warn!("{}, falling back to in-memory store", e);
                StoreBackend::Memory
            }),
            Err(_) if config.is_supabase_configured() => StoreBackend::Supabase,
            Err(_) => {
                warn!("Supabase not configured, using in-memory store");
                StoreBackend::Memory
            }
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_jwt_secret.is_empty()
            && (self.store_backend == StoreBackend::Memory || self.is_supabase_configured())
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    /// Key presented to PostgREST by the store adapters.
    pub fn store_api_key(&self) -> &str {
        if self.supabase_service_role_key.is_empty() {
            &self.supabase_anon_key
        } else {
            &self.supabase_service_role_key
        }
    }
}

fn parse_or_default<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_store_backend_names() {
        assert_eq!("supabase".parse::<StoreBackend>(), Ok(StoreBackend::Supabase));
        assert_eq!(" Memory ".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("redis".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn service_role_key_wins_over_anon_key() {
        let mut config = AppConfig {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "anon".to_string(),
            supabase_service_role_key: String::new(),
            supabase_jwt_secret: "secret".to_string(),
            store_backend: StoreBackend::Supabase,
            booking_horizon_days: DEFAULT_BOOKING_HORIZON_DAYS,
            max_slot_window_days: DEFAULT_MAX_SLOT_WINDOW_DAYS,
            port: DEFAULT_PORT,
        };
        assert_eq!(config.store_api_key(), "anon");

        config.supabase_service_role_key = "service".to_string();
        assert_eq!(config.store_api_key(), "service");
        assert!(config.is_configured());
    }
}
