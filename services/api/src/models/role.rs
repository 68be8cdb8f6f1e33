//! Role model and the acting-role selection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Role name. `Owner` is implicit and never stored; `Nominee` and
/// `Trustee` are materialized as `user_roles` rows referencing the owner
/// being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleName {
    Owner,
    Nominee,
    Trustee,
}

impl RoleName {
    /// Centralized capability check: a nominee session is read-only, every
    /// other role retains full CRUD on records it owns.
    pub fn can_write(self) -> bool {
        !matches!(self, RoleName::Nominee)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoleName::Owner => "owner",
            RoleName::Nominee => "nominee",
            RoleName::Trustee => "trustee",
        }
    }
}

impl FromStr for RoleName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(RoleName::Owner),
            "nominee" => Ok(RoleName::Nominee),
            "trustee" => Ok(RoleName::Trustee),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored grant of nominee/trustee standing over another account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub id: Uuid,
    /// Account holding the standing
    pub user_id: Uuid,
    pub role: RoleName,
    /// The owner being served
    pub related_user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// The role an account is currently acting as. Persisted server-side in
/// Redis keyed by the account id; the session cookie carries only the
/// identity token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSelection {
    pub role: RoleName,
    /// Owner whose data is being viewed; absent when acting as owner
    pub related_user_id: Option<Uuid>,
    /// Cached nominee access scope; always empty for owner/trustee
    #[serde(default)]
    pub access_categories: Vec<String>,
}

impl RoleSelection {
    /// The default selection: every account starts out acting as itself.
    pub fn owner() -> Self {
        RoleSelection {
            role: RoleName::Owner,
            related_user_id: None,
            access_categories: Vec::new(),
        }
    }

    pub fn can_write(&self) -> bool {
        self.role.can_write()
    }
}

impl Default for RoleSelection {
    fn default() -> Self {
        RoleSelection::owner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nominee_role_is_read_only() {
        assert!(RoleName::Owner.can_write());
        assert!(RoleName::Trustee.can_write());
        assert!(!RoleName::Nominee.can_write());
    }

    #[test]
    fn test_default_selection_is_owner() {
        let selection = RoleSelection::default();
        assert_eq!(selection.role, RoleName::Owner);
        assert!(selection.related_user_id.is_none());
        assert!(selection.access_categories.is_empty());
        assert!(selection.can_write());
    }

    #[test]
    fn test_role_name_round_trips_through_text() {
        for role in [RoleName::Owner, RoleName::Nominee, RoleName::Trustee] {
            assert_eq!(role.as_str().parse::<RoleName>(), Ok(role));
        }
        assert!("admin".parse::<RoleName>().is_err());
    }
}
