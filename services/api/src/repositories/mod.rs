//! Repositories for database operations

pub mod nominee;
pub mod notification;
pub mod record;
pub mod request;
pub mod role;
pub mod trustee;
pub mod user;

pub use nominee::NomineeRepository;
pub use notification::NotificationRepository;
pub use record::RecordRepository;
pub use request::RequestRepository;
pub use role::RoleRepository;
pub use trustee::TrusteeRepository;
pub use user::UserRepository;
