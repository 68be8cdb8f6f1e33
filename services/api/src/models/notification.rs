//! Notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Typed event addressed to an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// Confirmation to the owner that an invitation went out
    InvitationSent,
    /// Invitation landed in the invitee's inbox
    InvitationReceived,
    /// Trustee accepted and the owner must approve or reject the standing
    NomineeRequest,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::InvitationSent => "invitation_sent",
            NotificationType::InvitationReceived => "invitation_received",
            NotificationType::NomineeRequest => "nominee_request",
        }
    }
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invitation_sent" => Ok(NotificationType::InvitationSent),
            "invitation_received" => Ok(NotificationType::InvitationReceived),
            "nominee_request" => Ok(NotificationType::NomineeRequest),
            other => Err(format!("unknown notification type: {}", other)),
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    /// Recipient account
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    /// Free-form payload, e.g. the subject record id and verification link
    pub payload: serde_json::Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_type_round_trips_through_text() {
        for ty in [
            NotificationType::InvitationSent,
            NotificationType::InvitationReceived,
            NotificationType::NomineeRequest,
        ] {
            assert_eq!(ty.as_str().parse::<NotificationType>(), Ok(ty));
        }
        assert!("unknown".parse::<NotificationType>().is_err());
    }
}
