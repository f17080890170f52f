use anyhow::{Context as _, Result};

use packdesk_core::models::{DeliveryOrder, OrderStatus};
use packdesk_core::utils::{format_optional, truncate_string};
use packdesk_core::workflow::{OrderCell, RosterRow};

use super::Context;

/// Name column width in the roster table.
const NAME_WIDTH: usize = 28;

/// Order-form fields given on the command line. `None` keeps the form's
/// pre-filled value.
#[derive(Debug, Default)]
pub struct OrderInput {
    pub pack: Option<String>,
    pub tracking: Option<String>,
    pub status: Option<OrderStatus>,
    pub notes: Option<String>,
    pub remember: Option<bool>,
}

pub async fn courses(ctx: &Context) -> Result<()> {
    let courses = ctx.portal.courses().await.context("Failed to load courses")?;
    if courses.is_empty() {
        println!("No course batches");
        return Ok(());
    }
    for course in courses {
        println!("{:<16} {}", course.course_code, course.name);
    }
    Ok(())
}

pub async fn packs(ctx: &Context, course: &str) -> Result<()> {
    let course = ctx.course(course).await?;
    let settings = ctx
        .portal
        .delivery_settings(&course.course_code)
        .await
        .context("Failed to load delivery packs")?;
    if settings.is_empty() {
        println!("No delivery packs for {}", course.display_name());
    }
    for setting in settings {
        println!("{:<12} {}", setting.id, setting.display_name());
    }
    Ok(())
}

pub async fn students(ctx: &Context, course: &str, search: &str, page: usize) -> Result<()> {
    let course = ctx.course(course).await?;
    let roster = ctx.portal.roster(&course, search, page).await?;

    println!("{} - {} students", course.display_name(), roster.total_items);
    for row in &roster.items {
        print_row(row);
    }
    println!("Page {} of {}", roster.page, roster.total_pages);
    Ok(())
}

fn print_row(row: &RosterRow) {
    let order = match &row.order {
        Ok(OrderCell::Existing(order)) => describe_order(order),
        Ok(OrderCell::Creatable) => "no order".to_string(),
        Err(e) => format!("error: {}", e),
    };
    println!(
        "{:<12} {:<width$} {:<16} {}",
        row.student.username,
        truncate_string(&row.student.full_name, NAME_WIDTH),
        format_optional(&row.student.city, "N/A"),
        order,
        width = NAME_WIDTH
    );
}

fn describe_order(order: &DeliveryOrder) -> String {
    match order.current_status {
        Some(status) => format!("{} ({})", order.tracking_number, status),
        None => order.tracking_number.clone(),
    }
}

pub async fn create_order(ctx: &Context, course: &str, student: &str, input: OrderInput) -> Result<()> {
    let course = ctx.course(course).await?;
    let students = ctx
        .portal
        .students(&course.course_code)
        .await
        .context("Failed to load students")?;
    let student = students
        .into_iter()
        .find(|s| s.username == student)
        .with_context(|| format!("{} is not enrolled in {}", student, course.course_code))?;

    if let OrderCell::Existing(order) = ctx.portal.order_status(&student, &course).await? {
        println!("{} already has order {}: {}", student.username, order.id, describe_order(&order));
        return Ok(());
    }

    let mut form = ctx.portal.open_order_form(&course).await?;
    if let Some(pack) = input.pack {
        form.delivery_setting_id = Some(pack);
    }
    if let Some(tracking) = input.tracking {
        form.tracking_number = tracking;
    }
    if let Some(status) = input.status {
        form.status = status;
    }
    if let Some(notes) = input.notes {
        form.notes = notes;
    }
    if let Some(remember) = input.remember {
        form.remember = remember;
    }

    let created = ctx.portal.submit_order(&student, &course, &mut form).await?;
    println!(
        "Created order {} for {} ({})",
        created.id,
        student.username,
        describe_order(&created)
    );
    Ok(())
}
