//! Trustee model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::invitation::{ApprovalType, InvitationStatus};

/// Trustee entity: a person trusted to act over the owner's estate,
/// optionally subject to a secondary owner approval after accepting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trustee {
    pub id: Uuid,
    /// Owning account
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub relationship: String,
    pub phone: Option<String>,
    pub approval_type: ApprovalType,
    #[serde(skip_serializing)]
    pub invitation_token: Option<String>,
    pub invitation_status: InvitationStatus,
    pub invitation_sent_at: Option<DateTime<Utc>>,
    pub invitation_responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New trustee creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewTrustee {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub relationship: String,
    pub phone: Option<String>,
    pub approval_type: ApprovalType,
}

/// Trustee update payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTrustee {
    pub name: Option<String>,
    pub email: Option<String>,
    pub relationship: Option<String>,
    pub phone: Option<String>,
    pub approval_type: Option<ApprovalType>,
}
