//! Support-ticket drafting and submission.

use std::fmt;

use thiserror::Error;
use tracing::info;

use crate::auth::SessionData;
use crate::cache::QueryKey;
use crate::models::{NewTicket, Ticket, TicketCategory, TicketPriority, TicketStatus};
use crate::portal::Portal;

use super::WorkflowError;

const SUBJECT_MIN: usize = 5;
const SUBJECT_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketField {
    Subject,
    Category,
    Priority,
    Description,
}

impl fmt::Display for TicketField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TicketField::Subject => "subject",
            TicketField::Category => "category",
            TicketField::Priority => "priority",
            TicketField::Description => "description",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: TicketField,
    pub message: String,
}

/// Every field that failed validation, in form order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct TicketValidationError {
    pub errors: Vec<FieldError>,
}

impl TicketValidationError {
    pub fn message_for(&self, field: TicketField) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

impl fmt::Display for TicketValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join(" "))
    }
}

/// Ticket form contents as typed by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketDraft {
    pub subject: String,
    pub category: Option<TicketCategory>,
    pub priority: Option<TicketPriority>,
    pub description: String,
}

impl Default for TicketDraft {
    fn default() -> Self {
        Self {
            subject: String::new(),
            category: None,
            priority: Some(TicketPriority::default()),
            description: String::new(),
        }
    }
}

/// A draft that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidTicket {
    pub subject: String,
    pub category: TicketCategory,
    pub priority: TicketPriority,
    pub description: String,
}

impl TicketDraft {
    pub fn validate(&self) -> Result<ValidTicket, TicketValidationError> {
        let mut errors = Vec::new();
        let mut fail = |field, message: &str| {
            errors.push(FieldError {
                field,
                message: message.to_string(),
            })
        };

        let subject_len = self.subject.chars().count();
        if subject_len < SUBJECT_MIN {
            fail(TicketField::Subject, "Subject must be at least 5 characters.");
        } else if subject_len > SUBJECT_MAX {
            fail(TicketField::Subject, "Subject must be at most 100 characters.");
        }

        if self.category.is_none() {
            fail(TicketField::Category, "You need to select a ticket category.");
        }
        if self.priority.is_none() {
            fail(TicketField::Priority, "You need to select a ticket priority.");
        }

        let description_len = self.description.chars().count();
        if description_len == 0 {
            fail(TicketField::Description, "Description cannot be empty.");
        } else if description_len > DESCRIPTION_MAX {
            fail(TicketField::Description, "Description must be at most 1000 characters.");
        }

        match (self.category, self.priority) {
            (Some(category), Some(priority)) if errors.is_empty() => Ok(ValidTicket {
                subject: self.subject.clone(),
                category,
                priority,
                description: self.description.clone(),
            }),
            _ => Err(TicketValidationError { errors }),
        }
    }
}

impl Portal {
    /// Validate `draft` and create the ticket on behalf of `user`.
    pub async fn submit_ticket(&self, user: Option<&SessionData>, draft: &TicketDraft) -> Result<Ticket, WorkflowError> {
        let valid = draft.validate()?;
        let user = user.ok_or(WorkflowError::NotSignedIn)?;

        let request = NewTicket {
            subject: valid.subject,
            category: valid.category,
            priority: valid.priority,
            description: valid.description,
            student_number: user.username.clone(),
            student_name: user.username.clone(),
            student_avatar: user.avatar.clone(),
            status: TicketStatus::Open,
        };

        let created = self.api.create_ticket(&request).await.map_err(WorkflowError::Remote)?;
        info!(ticket_id = %created.id, user = %user.username, "Created support ticket");

        self.cache.invalidate(&QueryKey::tickets(&user.username));
        self.cache.invalidate(&QueryKey::admin_tickets());
        Ok(created)
    }
}
