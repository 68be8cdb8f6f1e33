//! Invitation workflow
//!
//! Creates and resolves nominee/trustee invitations. Each record carries a
//! single-use token; statuses move only along
//! `none -> pending -> {accepted, rejected}`, with resend and email edits
//! re-entering `pending` under a fresh token. Message dispatch is
//! best-effort and never rolls back a status change.

use anyhow::Result;
use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::email::{InviteKind, Mailer};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    InvitationStatus, NewNominee, NewTrustee, Nominee, NotificationType, RoleName, Trustee,
    UpdateNominee, UpdateTrustee, User, VerifyAction,
};
use crate::repositories::{
    NomineeRepository, NotificationRepository, RoleRepository, TrusteeRepository, UserRepository,
};
use crate::validation::{validate_email, validate_name, validate_not_self_invitation};

/// Length of invitation tokens
const TOKEN_LEN: usize = 32;

/// Generate a fresh single-use invitation token
pub fn new_invitation_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Result of resolving a verification token
#[derive(Debug, Serialize)]
pub struct VerifyOutcome {
    pub kind: &'static str,
    pub status: InvitationStatus,
    /// True when a trustee acceptance still needs the owner's approval
    /// before the standing is granted
    pub awaiting_owner_approval: bool,
}

/// Invitation workflow service
#[derive(Clone)]
pub struct InvitationService {
    nominees: NomineeRepository,
    trustees: TrusteeRepository,
    notifications: NotificationRepository,
    roles: RoleRepository,
    users: UserRepository,
    mailer: Mailer,
}

impl InvitationService {
    pub fn new(
        nominees: NomineeRepository,
        trustees: TrusteeRepository,
        notifications: NotificationRepository,
        roles: RoleRepository,
        users: UserRepository,
        mailer: Mailer,
    ) -> Self {
        Self {
            nominees,
            trustees,
            notifications,
            roles,
            users,
            mailer,
        }
    }

    /// Dispatch the invitation message, record an `invitation_sent` entry
    /// in the owner's inbox, and drop a copy into the invitee's inbox when
    /// they already hold an account. Failures are logged and swallowed; the
    /// record stays `pending` and resend remains available.
    async fn dispatch_invitation(
        &self,
        kind: InviteKind,
        owner: &User,
        record_id: Uuid,
        invitee_email: &str,
        token: &str,
    ) {
        let link = match self.mailer.send_invitation(kind, invitee_email, token) {
            Ok(link) => link,
            Err(e) => {
                warn!("Failed to dispatch invitation to {}: {}", invitee_email, e);
                self.mailer.verification_url(kind, token)
            }
        };

        let id_key = match kind {
            InviteKind::Nominee => "nominee_id",
            InviteKind::Trustee => "trustee_id",
        };

        let sent_payload = json!({
            id_key: record_id.to_string(),
            "invitee_email": invitee_email,
        });
        if let Err(e) = self
            .notifications
            .create(owner.id, NotificationType::InvitationSent, sent_payload)
            .await
        {
            warn!("Failed to record sent invitation for {}: {}", owner.id, e);
        }

        let invitee = match self.users.find_by_email(invitee_email).await {
            Ok(invitee) => invitee,
            Err(e) => {
                warn!("Invitee account lookup failed for {}: {}", invitee_email, e);
                None
            }
        };

        if let Some(invitee) = invitee {
            let payload = json!({
                id_key: record_id.to_string(),
                "owner_id": owner.id.to_string(),
                "owner_name": owner.name,
                "link": link,
            });

            if let Err(e) = self
                .notifications
                .create(invitee.id, NotificationType::InvitationReceived, payload)
                .await
            {
                warn!("Failed to create invitation notification: {}", e);
            }
        }
    }

    /// Issue a nominee invitation
    pub async fn issue_nominee(&self, owner: &User, payload: NewNominee) -> ApiResult<Nominee> {
        validate_name(&payload.name)?;
        validate_email(&payload.email)?;
        validate_not_self_invitation(&owner.email, &payload.email)?;

        let token = new_invitation_token();
        let nominee = self.nominees.create(owner.id, &payload, &token).await?;

        self.dispatch_invitation(InviteKind::Nominee, owner, nominee.id, &nominee.email, &token)
            .await;

        Ok(nominee)
    }

    /// Issue a trustee invitation
    pub async fn issue_trustee(&self, owner: &User, payload: NewTrustee) -> ApiResult<Trustee> {
        validate_name(&payload.name)?;
        validate_email(&payload.email)?;
        validate_not_self_invitation(&owner.email, &payload.email)?;

        let token = new_invitation_token();
        let trustee = self.trustees.create(owner.id, &payload, &token).await?;

        self.dispatch_invitation(InviteKind::Trustee, owner, trustee.id, &trustee.email, &token)
            .await;

        Ok(trustee)
    }

    /// Re-send a nominee invitation: fresh token, status back to pending,
    /// `sent_at` re-stamped
    pub async fn resend_nominee(&self, owner: &User, id: Uuid) -> ApiResult<Nominee> {
        let mut nominee = self
            .nominees
            .find_owned(id, owner.id)
            .await?
            .ok_or(ApiError::NotFound)?;

        let token = new_invitation_token();
        nominee.invitation_token = Some(token.clone());
        nominee.invitation_status = InvitationStatus::Pending;
        nominee.invitation_sent_at = Some(Utc::now());
        nominee.invitation_responded_at = None;

        let nominee = self
            .nominees
            .update(&nominee)
            .await?
            .ok_or(ApiError::NotFound)?;

        self.dispatch_invitation(InviteKind::Nominee, owner, nominee.id, &nominee.email, &token)
            .await;

        Ok(nominee)
    }

    /// Re-send a trustee invitation
    pub async fn resend_trustee(&self, owner: &User, id: Uuid) -> ApiResult<Trustee> {
        let mut trustee = self
            .trustees
            .find_owned(id, owner.id)
            .await?
            .ok_or(ApiError::NotFound)?;

        let token = new_invitation_token();
        trustee.invitation_token = Some(token.clone());
        trustee.invitation_status = InvitationStatus::Pending;
        trustee.invitation_sent_at = Some(Utc::now());
        trustee.invitation_responded_at = None;

        let trustee = self
            .trustees
            .update(&trustee)
            .await?
            .ok_or(ApiError::NotFound)?;

        self.dispatch_invitation(InviteKind::Trustee, owner, trustee.id, &trustee.email, &token)
            .await;

        Ok(trustee)
    }

    /// Update a nominee. Changing the email re-invites under a fresh token
    /// and immediately revokes the standing granted for the previous email,
    /// even if the original invitation was already accepted.
    pub async fn update_nominee(
        &self,
        owner: &User,
        id: Uuid,
        update: UpdateNominee,
    ) -> ApiResult<Nominee> {
        let mut nominee = self
            .nominees
            .find_owned(id, owner.id)
            .await?
            .ok_or(ApiError::NotFound)?;

        let previous_email = nominee.email.clone();

        if let Some(name) = update.name {
            validate_name(&name)?;
            nominee.name = name;
        }
        if let Some(relationship) = update.relationship {
            nominee.relationship = relationship;
        }
        if update.phone.is_some() {
            nominee.phone = update.phone;
        }
        if let Some(categories) = update.access_categories {
            nominee.access_categories = categories;
        }

        let mut reinvite_token = None;
        if let Some(email) = update.email {
            validate_email(&email)?;
            validate_not_self_invitation(&owner.email, &email)?;

            if !email.eq_ignore_ascii_case(&previous_email) {
                self.roles
                    .delete_for_member_email(RoleName::Nominee, owner.id, &previous_email)
                    .await?;

                let token = new_invitation_token();
                nominee.email = email;
                nominee.invitation_token = Some(token.clone());
                nominee.invitation_status = InvitationStatus::Pending;
                nominee.invitation_sent_at = Some(Utc::now());
                nominee.invitation_responded_at = None;
                reinvite_token = Some(token);
            }
        }

        let nominee = self
            .nominees
            .update(&nominee)
            .await?
            .ok_or(ApiError::NotFound)?;

        if let Some(token) = reinvite_token {
            self.dispatch_invitation(InviteKind::Nominee, owner, nominee.id, &nominee.email, &token)
                .await;
        }

        Ok(nominee)
    }

    /// Update a trustee, with the same re-invitation-on-email-edit behavior
    /// as nominees
    pub async fn update_trustee(
        &self,
        owner: &User,
        id: Uuid,
        update: UpdateTrustee,
    ) -> ApiResult<Trustee> {
        let mut trustee = self
            .trustees
            .find_owned(id, owner.id)
            .await?
            .ok_or(ApiError::NotFound)?;

        let previous_email = trustee.email.clone();

        if let Some(name) = update.name {
            validate_name(&name)?;
            trustee.name = name;
        }
        if let Some(relationship) = update.relationship {
            trustee.relationship = relationship;
        }
        if update.phone.is_some() {
            trustee.phone = update.phone;
        }
        if let Some(approval_type) = update.approval_type {
            trustee.approval_type = approval_type;
        }

        let mut reinvite_token = None;
        if let Some(email) = update.email {
            validate_email(&email)?;
            validate_not_self_invitation(&owner.email, &email)?;

            if !email.eq_ignore_ascii_case(&previous_email) {
                self.roles
                    .delete_for_member_email(RoleName::Trustee, owner.id, &previous_email)
                    .await?;

                let token = new_invitation_token();
                trustee.email = email;
                trustee.invitation_token = Some(token.clone());
                trustee.invitation_status = InvitationStatus::Pending;
                trustee.invitation_sent_at = Some(Utc::now());
                trustee.invitation_responded_at = None;
                reinvite_token = Some(token);
            }
        }

        let trustee = self
            .trustees
            .update(&trustee)
            .await?
            .ok_or(ApiError::NotFound)?;

        if let Some(token) = reinvite_token {
            self.dispatch_invitation(InviteKind::Trustee, owner, trustee.id, &trustee.email, &token)
                .await;
        }

        Ok(trustee)
    }

    /// Delete a nominee and cascade to its notifications and role
    /// assignment atomically
    pub async fn delete_nominee(&self, owner: &User, id: Uuid) -> ApiResult<()> {
        self.nominees
            .delete_cascade(id, owner.id)
            .await?
            .ok_or(ApiError::NotFound)?;
        Ok(())
    }

    /// Delete a trustee and cascade to its notifications and role
    /// assignment atomically
    pub async fn delete_trustee(&self, owner: &User, id: Uuid) -> ApiResult<()> {
        self.trustees
            .delete_cascade(id, owner.id)
            .await?
            .ok_or(ApiError::NotFound)?;
        Ok(())
    }

    /// Resolve a verification token on behalf of the authenticated caller.
    /// Unknown or stale tokens yield `InvalidToken` with no state change.
    pub async fn verify(
        &self,
        caller: &User,
        token: &str,
        action: VerifyAction,
    ) -> ApiResult<VerifyOutcome> {
        if let Some(nominee) = self.nominees.find_by_token(token).await? {
            return self.verify_nominee(caller, nominee, action).await;
        }

        if let Some(trustee) = self.trustees.find_by_token(token).await? {
            return self.verify_trustee(caller, trustee, action).await;
        }

        Err(ApiError::InvalidToken)
    }

    async fn verify_nominee(
        &self,
        caller: &User,
        nominee: Nominee,
        action: VerifyAction,
    ) -> ApiResult<VerifyOutcome> {
        if !responder_matches(caller, &nominee.email) {
            return Err(ApiError::InvalidToken);
        }
        if !nominee.invitation_status.can_respond() {
            return Err(ApiError::InvalidToken);
        }

        let status = action.resulting_status();
        self.nominees
            .record_response(nominee.id, status, Utc::now())
            .await?;

        if action == VerifyAction::Accept {
            // Nominee acceptance grants the standing immediately.
            self.roles
                .create_assignment(caller.id, RoleName::Nominee, nominee.user_id)
                .await?;
        }

        info!("Nominee invitation {} resolved: {}", nominee.id, status);
        Ok(VerifyOutcome {
            kind: "nominee",
            status,
            awaiting_owner_approval: false,
        })
    }

    async fn verify_trustee(
        &self,
        caller: &User,
        trustee: Trustee,
        action: VerifyAction,
    ) -> ApiResult<VerifyOutcome> {
        if !responder_matches(caller, &trustee.email) {
            return Err(ApiError::InvalidToken);
        }
        if !trustee.invitation_status.can_respond() {
            return Err(ApiError::InvalidToken);
        }

        let status = action.resulting_status();
        self.trustees
            .record_response(trustee.id, status, Utc::now())
            .await?;

        let mut awaiting_owner_approval = false;
        if action == VerifyAction::Accept {
            if trustee.approval_type.requires_owner_approval() {
                // The standing is deferred until the owner resolves the
                // approval request from their inbox.
                let payload = json!({
                    "trustee_id": trustee.id.to_string(),
                    "responder_id": caller.id.to_string(),
                    "trustee_name": trustee.name,
                    "approval_type": trustee.approval_type.as_str(),
                });
                self.notifications
                    .create(trustee.user_id, NotificationType::NomineeRequest, payload)
                    .await?;
                awaiting_owner_approval = true;
            } else {
                self.roles
                    .create_assignment(caller.id, RoleName::Trustee, trustee.user_id)
                    .await?;
            }
        }

        info!("Trustee invitation {} resolved: {}", trustee.id, status);
        Ok(VerifyOutcome {
            kind: "trustee",
            status,
            awaiting_owner_approval,
        })
    }

    /// Resolve a deferred trustee approval from a `nominee_request`
    /// notification. Accept materializes the role assignment; reject leaves
    /// the trustee record as-is with no standing granted.
    pub async fn resolve_approval(
        &self,
        owner: &User,
        payload: &serde_json::Value,
        action: VerifyAction,
    ) -> ApiResult<()> {
        let trustee_id = parse_payload_id(payload, "trustee_id")?;
        let responder_id = parse_payload_id(payload, "responder_id")?;

        let trustee = self
            .trustees
            .find_by_id(trustee_id)
            .await?
            .filter(|t| t.user_id == owner.id)
            .ok_or(ApiError::NotFound)?;

        if action == VerifyAction::Accept {
            self.roles
                .create_assignment(responder_id, RoleName::Trustee, owner.id)
                .await?;
        }

        info!(
            "Trustee approval for {} resolved by owner {}: {:?}",
            trustee.id, owner.id, action
        );
        Ok(())
    }
}

/// An invitation can only be resolved by the account whose email it is
/// addressed to. Revocation later matches `user_roles` rows through that
/// same email, so an assignment granted to any other account could never
/// be cleaned up.
fn responder_matches(caller: &User, invitee_email: &str) -> bool {
    caller.email.eq_ignore_ascii_case(invitee_email)
}

/// Extract a UUID stored as a string field in a notification payload
fn parse_payload_id(payload: &serde_json::Value, key: &str) -> Result<Uuid, ApiError> {
    payload
        .get(key)
        .and_then(|v| v.as_str())
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| ApiError::Validation(format!("Notification payload missing {}", key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_fresh_and_sized() {
        let a = new_invitation_token();
        let b = new_invitation_token();
        assert_eq!(a.len(), TOKEN_LEN);
        assert_eq!(b.len(), TOKEN_LEN);
        assert_ne!(a, b, "resend must always produce a different token");
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_parse_payload_id() {
        let id = Uuid::new_v4();
        let payload = json!({ "trustee_id": id.to_string() });
        assert_eq!(parse_payload_id(&payload, "trustee_id").unwrap(), id);

        let missing = parse_payload_id(&payload, "responder_id");
        assert!(matches!(missing, Err(ApiError::Validation(_))));

        let malformed = parse_payload_id(&json!({ "trustee_id": "nope" }), "trustee_id");
        assert!(matches!(malformed, Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_only_the_invited_account_matches() {
        let caller = User {
            id: Uuid::new_v4(),
            name: "Invitee".to_string(),
            email: "Invitee@Example.com".to_string(),
            password_hash: String::new(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        assert!(responder_matches(&caller, "invitee@example.com"));
        assert!(!responder_matches(&caller, "someone-else@example.com"));
    }

    mod live {
        //! End-to-end workflow tests against a live database. Need
        //! DATABASE_URL pointing at a migratable Postgres, so they are
        //! ignored by default.

        use super::*;
        use crate::models::{ApprovalType, NewUser};

        struct Fixture {
            service: InvitationService,
            users: UserRepository,
            nominees: NomineeRepository,
            notifications: NotificationRepository,
            roles: RoleRepository,
            owner: User,
            invitee: User,
        }

        async fn fixture() -> Result<Fixture> {
            let config = common::database::DatabaseConfig::from_env()?;
            let pool = common::database::init_pool(&config).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;

            let users = UserRepository::new(pool.clone());
            let nominees = NomineeRepository::new(pool.clone());
            let trustees = TrusteeRepository::new(pool.clone());
            let notifications = NotificationRepository::new(pool.clone());
            let roles = RoleRepository::new(pool.clone());

            let owner = users
                .create(&NewUser {
                    name: "Owner".to_string(),
                    email: format!("owner-{}@example.com", Uuid::new_v4()),
                    password: "owner-password".to_string(),
                })
                .await?;
            let invitee = users
                .create(&NewUser {
                    name: "Invitee".to_string(),
                    email: format!("invitee-{}@example.com", Uuid::new_v4()),
                    password: "invitee-password".to_string(),
                })
                .await?;

            let service = InvitationService::new(
                nominees.clone(),
                trustees,
                notifications.clone(),
                roles.clone(),
                users.clone(),
                Mailer::new("http://localhost:3000".to_string()),
            );

            Ok(Fixture {
                service,
                users,
                nominees,
                notifications,
                roles,
                owner,
                invitee,
            })
        }

        fn new_nominee(email: &str) -> NewNominee {
            NewNominee {
                name: "Nominee".to_string(),
                email: email.to_string(),
                relationship: "sibling".to_string(),
                phone: None,
                access_categories: vec!["reminders".to_string()],
            }
        }

        #[tokio::test]
        #[ignore]
        async fn test_nominee_accept_grants_standing() -> Result<()> {
            let fx = fixture().await?;

            let nominee = fx
                .service
                .issue_nominee(&fx.owner, new_nominee(&fx.invitee.email))
                .await?;
            assert_eq!(nominee.invitation_status, InvitationStatus::Pending);

            let token = nominee.invitation_token.clone().unwrap();
            let outcome = fx
                .service
                .verify(&fx.invitee, &token, VerifyAction::Accept)
                .await?;
            assert_eq!(outcome.status, InvitationStatus::Accepted);
            assert!(!outcome.awaiting_owner_approval);

            assert!(
                fx.roles
                    .has_assignment(fx.invitee.id, RoleName::Nominee, fx.owner.id)
                    .await?
            );

            // The same token cannot respond twice.
            let replay = fx
                .service
                .verify(&fx.invitee, &token, VerifyAction::Accept)
                .await;
            assert!(matches!(replay, Err(ApiError::InvalidToken)));

            // Issuing also dropped a sent-invitation entry into the
            // owner's inbox.
            let sent = fx
                .notifications
                .list_for_user(fx.owner.id)
                .await?
                .into_iter()
                .any(|n| n.notification_type == NotificationType::InvitationSent);
            assert!(sent);

            Ok(())
        }

        #[tokio::test]
        #[ignore]
        async fn test_verify_rejects_account_other_than_invitee() -> Result<()> {
            let fx = fixture().await?;

            let bystander = fx
                .users
                .create(&NewUser {
                    name: "Bystander".to_string(),
                    email: format!("bystander-{}@example.com", Uuid::new_v4()),
                    password: "bystander-password".to_string(),
                })
                .await?;

            let nominee = fx
                .service
                .issue_nominee(&fx.owner, new_nominee(&fx.invitee.email))
                .await?;
            let token = nominee.invitation_token.clone().unwrap();

            let attempt = fx
                .service
                .verify(&bystander, &token, VerifyAction::Accept)
                .await;
            assert!(matches!(attempt, Err(ApiError::InvalidToken)));
            assert!(
                !fx.roles
                    .has_assignment(bystander.id, RoleName::Nominee, fx.owner.id)
                    .await?
            );

            // The invitation stays pending for the addressed account.
            let outcome = fx
                .service
                .verify(&fx.invitee, &token, VerifyAction::Accept)
                .await?;
            assert_eq!(outcome.status, InvitationStatus::Accepted);

            Ok(())
        }

        #[tokio::test]
        #[ignore]
        async fn test_trustee_acceptance_defers_to_owner_approval() -> Result<()> {
            let fx = fixture().await?;

            let trustee = fx
                .service
                .issue_trustee(
                    &fx.owner,
                    NewTrustee {
                        name: "Trustee".to_string(),
                        email: fx.invitee.email.clone(),
                        relationship: "friend".to_string(),
                        phone: None,
                        approval_type: ApprovalType::Individual,
                    },
                )
                .await?;

            let token = trustee.invitation_token.clone().unwrap();
            let outcome = fx
                .service
                .verify(&fx.invitee, &token, VerifyAction::Accept)
                .await?;
            assert!(outcome.awaiting_owner_approval);
            assert!(
                !fx.roles
                    .has_assignment(fx.invitee.id, RoleName::Trustee, fx.owner.id)
                    .await?
            );

            let request = fx
                .notifications
                .list_for_user(fx.owner.id)
                .await?
                .into_iter()
                .find(|n| n.notification_type == NotificationType::NomineeRequest)
                .unwrap();

            fx.service
                .resolve_approval(&fx.owner, &request.payload, VerifyAction::Accept)
                .await?;
            assert!(
                fx.roles
                    .has_assignment(fx.invitee.id, RoleName::Trustee, fx.owner.id)
                    .await?
            );

            Ok(())
        }

        #[tokio::test]
        #[ignore]
        async fn test_nominee_delete_cascades() -> Result<()> {
            let fx = fixture().await?;

            let nominee = fx
                .service
                .issue_nominee(&fx.owner, new_nominee(&fx.invitee.email))
                .await?;
            let token = nominee.invitation_token.clone().unwrap();
            fx.service
                .verify(&fx.invitee, &token, VerifyAction::Accept)
                .await?;

            fx.service.delete_nominee(&fx.owner, nominee.id).await?;

            assert!(fx.nominees.find_owned(nominee.id, fx.owner.id).await?.is_none());
            assert!(
                !fx.roles
                    .has_assignment(fx.invitee.id, RoleName::Nominee, fx.owner.id)
                    .await?
            );
            let id_text = nominee.id.to_string();
            let leftover = fx
                .notifications
                .list_for_user(fx.invitee.id)
                .await?
                .into_iter()
                .any(|n| n.payload.get("nominee_id").and_then(|v| v.as_str()) == Some(id_text.as_str()));
            assert!(!leftover);

            Ok(())
        }
    }
}
