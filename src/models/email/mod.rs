//! Email records: database row, API shape and write-side inputs.

pub mod api_email;
pub mod db_email;
pub mod new_email;

pub use api_email::Email;
pub use db_email::DbEmail;
pub use new_email::{EmailFilter, EmailPatch, NewEmail};
