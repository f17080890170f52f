//! Core library for packdesk, the back-office tool for shipping course
//! delivery packs and filing support tickets.
//!
//! - `api`: the `PortalApi` contract and its HTTP client
//! - `models`: wire types exchanged with the portal backend
//! - `cache`: keyed, coalescing query cache with stale-while-revalidate reads
//! - `prefs`: file-backed per-profile preferences
//! - `workflow`: order creation, ticket submission and the batch roster
//! - `auth`, `config`: operator session, keychain token, settings
//!
//! `Portal` is the entry point: build one per session from an API
//! implementation, a `QueryCache` and a `PreferenceStore`.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;
pub mod portal;
pub mod prefs;
pub mod utils;
pub mod workflow;

pub use portal::Portal;
pub use workflow::WorkflowError;
