//! MailChimp Member Sync Library
//!
//! Keeps a local Postgres mirror of MailChimp list members and forwards every
//! create, update and delete to the MailChimp Marketing API.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core business logic.
//! - `data`: Data access layer.
//! - `integrations`: External service integrations.
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `db_storage`: Repository traits and their Postgres implementations.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and router.
//! - `mailchimp_client`: MailChimp API client.
//! - `memory_storage`: In-process repositories.
//! - `models`: Member and list models, wire field table.
//! - `remote_key`: Subscriber hash used to address members remotely.
//! - `services`: Member create/update/show/remove workflow.
//! - `validation`: Member payload rule table.

pub mod api;
pub mod core;
pub mod data;
pub mod integrations;

pub mod config;
pub mod db;
pub mod db_storage;
pub mod errors;
pub mod handlers;
pub mod mailchimp_client;
pub mod memory_storage;
pub mod models;
pub mod remote_key;
pub mod services;
pub mod validation;
