use anyhow::{Context as _, Result};

use packdesk_core::models::{TicketCategory, TicketPriority};
use packdesk_core::utils::truncate_string;
use packdesk_core::workflow::TicketDraft;

use super::Context;

const SUBJECT_WIDTH: usize = 40;

pub async fn create(
    ctx: &Context,
    subject: String,
    category: Option<TicketCategory>,
    priority: TicketPriority,
    description: String,
) -> Result<()> {
    let draft = TicketDraft {
        subject,
        category,
        priority: Some(priority),
        description,
    };

    let ticket = ctx.portal.submit_ticket(ctx.session.user(), &draft).await?;
    println!("Created ticket {}: {}", ticket.id, ticket.subject);
    Ok(())
}

pub async fn list(ctx: &Context, all: bool) -> Result<()> {
    let tickets = if all {
        ctx.portal.admin_tickets().await
    } else {
        let username = ctx
            .session
            .username()
            .context("You must be logged in to list your tickets.")?;
        ctx.portal.tickets(username).await
    }
    .context("Failed to load tickets")?;

    if tickets.is_empty() {
        println!("No tickets");
    }
    for ticket in tickets {
        println!(
            "{:<10} {:<12} {:<8} {:<14} {:<width$} {}",
            ticket.id,
            ticket.status.to_string(),
            ticket.priority.to_string(),
            ticket.category.to_string(),
            truncate_string(&ticket.subject, SUBJECT_WIDTH),
            ticket.student_number,
            width = SUBJECT_WIDTH
        );
    }
    Ok(())
}
