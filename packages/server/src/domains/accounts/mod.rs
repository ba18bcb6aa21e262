//! Accounts domain - sender mailboxes used for change notifications

pub mod actions;
pub mod models;

pub use models::{Account, AccountInput, AccountStatus, PASSWORD_MASK};
