//! Domain logic that does not touch storage.
//!
//! - [`tally`]: the bin accounting state machine and submission payloads
//! - [`codes`]: short alphabetic access codes
//! - [`auth`]: password hashing and admin bearer sessions
//! - [`drafts`]: in-progress tallies between worker requests
//! - [`mailer`]: outbound email

pub mod auth;
pub mod codes;
pub mod drafts;
pub mod mailer;
pub mod tally;

pub use auth::{hash_password, verify_password, AuthSession, SessionStore};
pub use codes::{generate_alpha_code, normalize_code, CodeError};
pub use drafts::{Draft, DraftId, DraftStore};
pub use mailer::{
    invitation_email, DeliveryReceipt, EmailMessage, LogMailer, MailError, Mailer, ResendMailer,
};
