//! Role context
//!
//! Lets an account view the system as itself or as a nominee/trustee of
//! another account. The selection lives server-side in the session store
//! and is re-derived from the database on every switch; write gating is
//! centralized in [`crate::models::RoleSelection::can_write`] and the
//! middleware's `require_write`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{Nominee, RoleName, RoleSelection, User};
use crate::repositories::{NomineeRepository, RoleRepository, UserRepository};
use crate::session::SessionManager;

/// One entry in the role switcher
#[derive(Debug, Serialize)]
pub struct AvailableRole {
    pub role: RoleName,
    /// Owner being served; absent for the implicit owner role
    pub related_user_id: Option<Uuid>,
    pub related_user_name: Option<String>,
}

/// Requested switch target
#[derive(Debug, Deserialize)]
pub struct SwitchRoleRequest {
    pub role: RoleName,
    pub related_user_id: Option<Uuid>,
}

/// Role context service
#[derive(Clone)]
pub struct RoleContext {
    roles: RoleRepository,
    nominees: NomineeRepository,
    users: UserRepository,
    sessions: SessionManager,
}

impl RoleContext {
    pub fn new(
        roles: RoleRepository,
        nominees: NomineeRepository,
        users: UserRepository,
        sessions: SessionManager,
    ) -> Self {
        Self {
            roles,
            nominees,
            users,
            sessions,
        }
    }

    /// Every account can act as owner; each stored standing adds one entry.
    pub async fn available_roles(&self, account: &User) -> ApiResult<Vec<AvailableRole>> {
        let mut available = vec![AvailableRole {
            role: RoleName::Owner,
            related_user_id: None,
            related_user_name: None,
        }];

        for assignment in self.roles.list_for_user(account.id).await? {
            let related_user_name = self
                .users
                .find_by_id(assignment.related_user_id)
                .await?
                .map(|owner| owner.name);

            available.push(AvailableRole {
                role: assignment.role,
                related_user_id: Some(assignment.related_user_id),
                related_user_name,
            });
        }

        Ok(available)
    }

    /// Switch the acting role, re-resolving the nominee access scope from
    /// the database and persisting the selection server-side
    pub async fn switch_to(
        &self,
        account: &User,
        target: SwitchRoleRequest,
    ) -> ApiResult<RoleSelection> {
        let selection = match target.role {
            RoleName::Owner => RoleSelection::owner(),
            role => {
                let related_user_id = target.related_user_id.ok_or_else(|| {
                    ApiError::Validation("related_user_id is required for this role".to_string())
                })?;

                // Re-validate the standing on the server instead of trusting
                // anything client-cached.
                if !self
                    .roles
                    .has_assignment(account.id, role, related_user_id)
                    .await?
                {
                    return Err(ApiError::NotFound);
                }

                let access_categories = if role == RoleName::Nominee {
                    let lookup = self
                        .nominees
                        .find_by_email_and_owner(&account.email, related_user_id)
                        .await;
                    nominee_scope(lookup)
                } else {
                    Vec::new()
                };

                RoleSelection {
                    role,
                    related_user_id: Some(related_user_id),
                    access_categories,
                }
            }
        };

        self.sessions
            .set_role_selection(account.id, &selection)
            .await?;

        Ok(selection)
    }
}

/// Resolve the nominee access scope from a record lookup. Failure to
/// resolve degrades to an empty scope rather than blocking the switch.
fn nominee_scope(lookup: Result<Option<Nominee>>) -> Vec<String> {
    match lookup {
        Ok(Some(nominee)) => nominee.access_categories,
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!("Nominee scope lookup failed, degrading to empty scope: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvitationStatus;
    use chrono::Utc;

    fn nominee_with_scope(categories: Vec<String>) -> Nominee {
        Nominee {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Nominee".to_string(),
            email: "nominee@example.com".to_string(),
            relationship: "sibling".to_string(),
            phone: None,
            access_categories: categories,
            invitation_token: None,
            invitation_status: InvitationStatus::Accepted,
            invitation_sent_at: None,
            invitation_responded_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_scope_resolves_from_record() {
        let scope = nominee_scope(Ok(Some(nominee_with_scope(vec![
            "deposits".to_string(),
            "reminders".to_string(),
        ]))));
        assert_eq!(scope, vec!["deposits".to_string(), "reminders".to_string()]);
    }

    #[test]
    fn test_missing_record_degrades_to_empty_scope() {
        assert!(nominee_scope(Ok(None)).is_empty());
    }

    #[test]
    fn test_failed_lookup_degrades_to_empty_scope() {
        assert!(nominee_scope(Err(anyhow::anyhow!("connection reset"))).is_empty());
    }
}
