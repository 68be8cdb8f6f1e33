//! API service models

pub mod invitation;
pub mod nominee;
pub mod notification;
pub mod record;
pub mod request;
pub mod role;
pub mod trustee;
pub mod user;

// Re-export for convenience
pub use invitation::{ApprovalType, InvitationStatus, VerifyAction};
pub use nominee::{NewNominee, Nominee, UpdateNominee};
pub use notification::{Notification, NotificationType};
pub use record::{NewRecord, OwnedRecord, RecordKind, RecordQuery, UpdateRecord};
pub use request::{NewRequest, Request, UpdateRequest};
pub use role::{RoleAssignment, RoleName, RoleSelection};
pub use trustee::{NewTrustee, Trustee, UpdateTrustee};
pub use user::{LoginCredentials, NewUser, User};
