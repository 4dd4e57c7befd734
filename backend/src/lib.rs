//! # Bin Tally Backend
//!
//! REST backend for recording waste-bin tallies at client sites.
//!
//! Site workers open a form with a short code, identify themselves, and
//! account for every bin on the site: inspected (fullness and
//! contamination), reported missing, or left uninspected. Administrators
//! manage companies, users, bin and contamination catalogues, forms and
//! invitations, and review the stored submissions.
//!
//! ## Architecture
//!
//! - [`config`]: server configuration from environment variables
//! - [`models`]: domain records shared by every layer
//! - [`services`]: storage-free logic (tally state machine, codes, sessions, drafts, mail)
//! - [`db`]: repository traits, in-memory and Postgres backends, and the service layer
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod config;
pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
