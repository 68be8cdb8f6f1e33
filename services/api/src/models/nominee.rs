//! Nominee model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::invitation::InvitationStatus;

/// Nominee entity: a person the owner has designated to view a subset of
/// their records. May or may not hold an account yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nominee {
    pub id: Uuid,
    /// Owning account
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub relationship: String,
    pub phone: Option<String>,
    /// Categories this nominee is permitted to view
    pub access_categories: Vec<String>,
    #[serde(skip_serializing)]
    pub invitation_token: Option<String>,
    pub invitation_status: InvitationStatus,
    pub invitation_sent_at: Option<DateTime<Utc>>,
    pub invitation_responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New nominee creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewNominee {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub relationship: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub access_categories: Vec<String>,
}

/// Nominee update payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateNominee {
    pub name: Option<String>,
    pub email: Option<String>,
    pub relationship: Option<String>,
    pub phone: Option<String>,
    pub access_categories: Option<Vec<String>>,
}
