//! Durable local preferences.
//!
//! This module provides the `PreferenceStore`, a small file-backed key/value
//! store for records that must survive restarts, currently only the
//! delivery-order defaults remembered by the order form.
//!
//! Records are JSON files under a per-profile directory. A missing or
//! corrupt record reads as absent; it never fails the caller.

pub mod store;

pub use store::{PreferenceStore, DEFAULT_PROFILE, DELIVERY_ORDER_DEFAULTS};
