//! Lead Capture API Library
//!
//! This library provides the core functionality for the lead capture API:
//! intake of B2B and B2C form submissions, lead persistence, notification
//! dispatch, and the paginated query service behind the admin dashboard.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and shared state.
//! - `intake_handler`: The intake pipeline for form submissions.
//! - `lead_query`: Paginated, filtered read access over both lead kinds.
//! - `lead_store`: Persistence contract and Postgres store.
//! - `mailer`: Notification rendering and mail vendor transports.
//! - `models`: Core data models.
//! - `validation`: Email classification rules.

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod intake_handler;
pub mod lead_query;
pub mod lead_store;
pub mod mailer;
pub mod models;
pub mod validation;
