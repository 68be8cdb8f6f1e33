//! Inter-user request model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request entity: a message from one account to another, addressed by
/// email, carrying a free-form payload and a mutable status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: Uuid,
    /// Sender account
    pub user_id: Uuid,
    pub recipient_email: String,
    pub category: String,
    pub status: String,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New request creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewRequest {
    pub recipient_email: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "serde_json::Value::default")]
    pub data: serde_json::Value,
}

/// Request update payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRequest {
    pub category: Option<String>,
    pub data: Option<serde_json::Value>,
}
