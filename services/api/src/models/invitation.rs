//! Invitation state shared by nominee and trustee records
//!
//! Both record kinds carry the same invitation lifecycle: a single-use
//! token is issued when the record is created or re-sent, and the invitee
//! resolves it by accepting or rejecting. Statuses are stored as TEXT and
//! mapped here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of an invitation attached to a nominee or trustee record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    /// No invitation has been issued yet
    None,
    /// Invitation sent, awaiting a response
    Pending,
    Accepted,
    Rejected,
}

impl InvitationStatus {
    /// Only a pending invitation can be accepted or rejected. Stale tokens
    /// of re-sent invitations never reach this check since the token no
    /// longer matches.
    pub fn can_respond(self) -> bool {
        self == InvitationStatus::Pending
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InvitationStatus::None => "none",
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for InvitationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(InvitationStatus::None),
            "pending" => Ok(InvitationStatus::Pending),
            "accepted" => Ok(InvitationStatus::Accepted),
            "rejected" => Ok(InvitationStatus::Rejected),
            other => Err(format!("unknown invitation status: {}", other)),
        }
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response carried by a verification call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyAction {
    Accept,
    Reject,
}

impl VerifyAction {
    /// Status the record moves to when this action resolves a pending
    /// invitation
    pub fn resulting_status(self) -> InvitationStatus {
        match self {
            VerifyAction::Accept => InvitationStatus::Accepted,
            VerifyAction::Reject => InvitationStatus::Rejected,
        }
    }
}

/// Trustee acceptance policy: whether the owner must approve the trustee
/// again after the trustee accepts the invitation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalType {
    Group,
    Individual,
    None,
}

impl ApprovalType {
    /// Group and individual approval both defer the role assignment until
    /// the owner resolves a nominee-request notification.
    pub fn requires_owner_approval(self) -> bool {
        !matches!(self, ApprovalType::None)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApprovalType::Group => "group",
            ApprovalType::Individual => "individual",
            ApprovalType::None => "none",
        }
    }
}

impl FromStr for ApprovalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "group" => Ok(ApprovalType::Group),
            "individual" => Ok(ApprovalType::Individual),
            "none" => Ok(ApprovalType::None),
            other => Err(format!("unknown approval type: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_can_respond() {
        assert!(InvitationStatus::Pending.can_respond());
        assert!(!InvitationStatus::None.can_respond());
        assert!(!InvitationStatus::Accepted.can_respond());
        assert!(!InvitationStatus::Rejected.can_respond());
    }

    #[test]
    fn test_verify_action_resulting_status() {
        assert_eq!(
            VerifyAction::Accept.resulting_status(),
            InvitationStatus::Accepted
        );
        assert_eq!(
            VerifyAction::Reject.resulting_status(),
            InvitationStatus::Rejected
        );
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [
            InvitationStatus::None,
            InvitationStatus::Pending,
            InvitationStatus::Accepted,
            InvitationStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<InvitationStatus>(), Ok(status));
        }
        assert!("bogus".parse::<InvitationStatus>().is_err());
    }

    #[test]
    fn test_approval_type_requires_owner_approval() {
        assert!(ApprovalType::Group.requires_owner_approval());
        assert!(ApprovalType::Individual.requires_owner_approval());
        assert!(!ApprovalType::None.requires_owner_approval());
    }
}
