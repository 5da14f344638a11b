use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Name shown on appointments and clinical records.
    pub fn display_name(&self) -> String {
        let meta = self.metadata.as_ref();
        let field = |key: &str| {
            meta.and_then(|m| m.get(key))
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };

        if let Some(full) = field("full_name") {
            return full.to_string();
        }

        let joined = [field("first_name"), field("last_name")]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if !joined.is_empty() {
            return joined;
        }

        self.email.clone().unwrap_or_default()
    }

    fn role_claim(&self) -> Option<Role> {
        self.role
            .as_deref()
            .and_then(Role::parse)
            .or_else(|| {
                self.metadata
                    .as_ref()
                    .and_then(|m| m.get("role"))
                    .and_then(|v| v.as_str())
                    .and_then(Role::parse)
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Patient,
    Specialist,
    Administrator,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "patient" => Some(Role::Patient),
            "specialist" | "doctor" => Some(Role::Specialist),
            "administrator" | "admin" => Some(Role::Administrator),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Patient => write!(f, "patient"),
            Role::Specialist => write!(f, "specialist"),
            Role::Administrator => write!(f, "administrator"),
        }
    }
}

/// The authenticated caller, as the scheduling core sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Actor {
    Patient { id: Uuid, display_name: String },
    Specialist { id: Uuid, display_name: String },
    Administrator { id: Uuid },
}

impl Actor {
    pub fn id(&self) -> Uuid {
        match self {
            Actor::Patient { id, .. } | Actor::Specialist { id, .. } | Actor::Administrator { id } => *id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Actor::Patient { .. } => Role::Patient,
            Actor::Specialist { .. } => Role::Specialist,
            Actor::Administrator { .. } => Role::Administrator,
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        match self {
            Actor::Patient { display_name, .. } | Actor::Specialist { display_name, .. } => Some(display_name.as_str()),
            Actor::Administrator { .. } => None,
        }
    }
}

impl TryFrom<&User> for Actor {
    type Error = AppError;

    fn try_from(user: &User) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&user.id)
            .map_err(|_| AppError::Auth(format!("Subject is not a valid id: {}", user.id)))?;

        let role = user
            .role_claim()
            .ok_or_else(|| AppError::Auth("Token carries no recognised role".to_string()))?;

        Ok(match role {
            Role::Patient => Actor::Patient { id, display_name: user.display_name() },
            Role::Specialist => Actor::Specialist { id, display_name: user.display_name() },
            Role::Administrator => Actor::Administrator { id },
        })
    }
}
