//! Data models
//!
//! Entities stored by the repositories and the inputs accepted by the API:
//! - Database entities (User, Session, Model, ModelPhoto, Contact)
//! - Request inputs with their validation rules
//! - List query parameters and pagination metadata

mod contact;
mod de;
mod model;
mod pagination;
pub(crate) mod sanitize;
mod session;
mod user;

pub use contact::{
    Contact, ContactForm, ContactListQuery, ContactSource, CreateContactInput, RaffleForm,
};
pub use de::parse_flag;
pub use model::{BulkAction, BulkActionRequest, Model, ModelInput, ModelListQuery, ModelPhoto};
pub use pagination::{PageRequest, PagedResult, Pagination, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use sanitize::Sanitize;
pub use session::Session;
pub use user::{CreateUserInput, User};
