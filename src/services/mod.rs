//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the repositories:
//! - Enforcing business rules (public visibility, bulk limits, honeypots)
//! - Authentication and session lifecycle
//! - Side effects such as notification mail and QR rendering

pub mod contact;
pub mod email;
pub mod model;
pub mod password;
pub mod qr;
pub mod user;

pub use contact::{ContactService, ContactServiceError, Submission};
pub use email::EmailService;
pub use model::{normalize_ids, BulkOutcome, ModelService, ModelServiceError, MAX_BULK_IDS};
pub use password::{hash_password, verify_password};
pub use qr::{GeneratedQr, QrService, QrServiceError};
pub use user::{LoginInput, UserService, UserServiceError, DEFAULT_SESSION_HOURS, INVALID_CREDENTIALS};
