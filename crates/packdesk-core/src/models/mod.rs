//! Data models for portal entities.
//!
//! This module contains the data structures exchanged with the portal
//! backend:
//!
//! - `Course`, `StudentInBatch`: course batches and their enrolled students
//! - `DeliverySetting`, `DeliveryOrder`, `NewDeliveryOrder`: delivery packs
//!   and the orders created from them
//! - `Ticket`, `NewTicket`: support tickets
//! - `DeliveryOrderDefaults`: the locally remembered order-form defaults
//!
//! The closed enums (`OrderStatus`, `TicketCategory`, `TicketPriority`,
//! `TicketStatus`) parse from their wire strings through `FromStr`, so an
//! unknown value is rejected where it enters the program.

pub mod course;
pub mod delivery;
pub mod ticket;

use thiserror::Error;

pub use course::{Course, StudentInBatch};
pub use delivery::{DeliveryOrder, DeliveryOrderDefaults, DeliverySetting, NewDeliveryOrder, OrderStatus};
pub use ticket::{NewTicket, Ticket, TicketCategory, TicketPriority, TicketStatus};

/// Error returned when a string does not name a variant of a closed enum.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value:?} (expected one of: {expected})")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected,
        }
    }
}
