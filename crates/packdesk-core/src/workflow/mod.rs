//! Operator workflows built on `Portal`.
//!
//! - `order`: check a student's order for a batch, open the create-order
//!   form with remembered defaults, submit it
//! - `ticket`: validate and submit a support ticket
//! - `roster`: search and paginate the students of a batch

pub mod order;
pub mod roster;
pub mod ticket;

use thiserror::Error;

use crate::cache::CacheError;

pub use order::{OrderCell, OrderForm, SELECT_PACK_MESSAGE};
pub use roster::{filter_students, paginate, Page, RosterRow, ITEMS_PER_PAGE};
pub use ticket::{FieldError, TicketDraft, TicketField, TicketValidationError, ValidTicket};

#[derive(Error, Debug)]
pub enum WorkflowError {
    /// Input rejected before any request was sent.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    InvalidTicket(#[from] TicketValidationError),

    #[error("You must be logged in to create a ticket.")]
    NotSignedIn,

    #[error("{student} already has delivery order {order_id} for {course_code}")]
    OrderExists {
        student: String,
        course_code: String,
        order_id: String,
    },

    #[error("An order for {student} in {course_code} is already being submitted")]
    SubmissionInProgress { student: String, course_code: String },

    /// The backend rejected or failed the request.
    #[error("{0:#}")]
    Remote(anyhow::Error),

    #[error(transparent)]
    Cache(#[from] CacheError),
}
