//! REST API client module for the portal backend.
//!
//! This module provides the `PortalApi` trait, the contract every consumer
//! of backend data goes through, and `ApiClient`, its HTTP implementation.
//!
//! The backend uses bearer token authentication; the token is obtained out
//! of band and kept in the OS keychain (see `auth`).

pub mod client;
pub mod error;
#[cfg(test)]
pub(crate) mod fake;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Course, DeliveryOrder, DeliverySetting, NewDeliveryOrder, NewTicket, StudentInBatch, Ticket};

pub use client::ApiClient;
pub use error::ApiError;

/// Typed backend operations.
///
/// Every method is a single request/response round trip. Failures carry a
/// human-readable message suitable for showing to the operator.
#[async_trait]
pub trait PortalApi: Send + Sync {
    async fn fetch_courses(&self) -> Result<Vec<Course>>;

    async fn fetch_students(&self, course_code: &str) -> Result<Vec<StudentInBatch>>;

    async fn fetch_delivery_settings(&self, course_code: &str) -> Result<Vec<DeliverySetting>>;

    async fn fetch_delivery_orders(&self, student_number: &str) -> Result<Vec<DeliveryOrder>>;

    async fn create_delivery_order(&self, order: &NewDeliveryOrder) -> Result<DeliveryOrder>;

    async fn fetch_tickets(&self, student_number: &str) -> Result<Vec<Ticket>>;

    async fn fetch_all_tickets(&self) -> Result<Vec<Ticket>>;

    async fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket>;
}
