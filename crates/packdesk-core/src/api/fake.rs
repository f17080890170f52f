//! In-memory backend used by the workflow and cache tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{
    Course, DeliveryOrder, DeliverySetting, NewDeliveryOrder, NewTicket, StudentInBatch, Ticket,
};

use super::{ApiError, PortalApi};

/// Records every call and serves canned data.
#[derive(Default)]
pub struct FakeApi {
    pub courses: Mutex<Vec<Course>>,
    pub students: Mutex<HashMap<String, Vec<StudentInBatch>>>,
    pub settings: Mutex<HashMap<String, Vec<DeliverySetting>>>,
    pub orders: Mutex<HashMap<String, Vec<DeliveryOrder>>>,
    pub tickets: Mutex<Vec<Ticket>>,
    pub calls: Mutex<Vec<String>>,
    pub created_orders: Mutex<Vec<NewDeliveryOrder>>,
    pub created_tickets: Mutex<Vec<NewTicket>>,
    /// When set, create calls fail with this server message.
    pub fail_creates: Mutex<Option<String>>,
    /// Artificial latency applied to every call.
    pub latency: Option<Duration>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    pub fn set_settings(&self, course_code: &str, settings: Vec<DeliverySetting>) {
        self.settings.lock().unwrap().insert(course_code.to_string(), settings);
    }

    pub fn set_orders(&self, student: &str, orders: Vec<DeliveryOrder>) {
        self.orders.lock().unwrap().insert(student.to_string(), orders);
    }

    pub fn set_students(&self, course_code: &str, students: Vec<StudentInBatch>) {
        self.students.lock().unwrap().insert(course_code.to_string(), students);
    }

    pub fn fail_creates_with(&self, message: &str) {
        *self.fail_creates.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.starts_with(prefix)).count()
    }

    async fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl PortalApi for FakeApi {
    async fn fetch_courses(&self) -> Result<Vec<Course>> {
        self.record("courses".to_string()).await;
        Ok(self.courses.lock().unwrap().clone())
    }

    async fn fetch_students(&self, course_code: &str) -> Result<Vec<StudentInBatch>> {
        self.record(format!("students:{}", course_code)).await;
        Ok(self.students.lock().unwrap().get(course_code).cloned().unwrap_or_default())
    }

    async fn fetch_delivery_settings(&self, course_code: &str) -> Result<Vec<DeliverySetting>> {
        self.record(format!("settings:{}", course_code)).await;
        Ok(self.settings.lock().unwrap().get(course_code).cloned().unwrap_or_default())
    }

    async fn fetch_delivery_orders(&self, student_number: &str) -> Result<Vec<DeliveryOrder>> {
        self.record(format!("orders:{}", student_number)).await;
        Ok(self.orders.lock().unwrap().get(student_number).cloned().unwrap_or_default())
    }

    async fn create_delivery_order(&self, order: &NewDeliveryOrder) -> Result<DeliveryOrder> {
        self.record(format!("create_order:{}:{}", order.student_number, order.course_code)).await;
        if let Some(message) = self.fail_creates.lock().unwrap().clone() {
            return Err(ApiError::ServerError(message).into());
        }
        self.created_orders.lock().unwrap().push(order.clone());

        let mut orders = self.orders.lock().unwrap();
        let existing = orders.entry(order.student_number.clone()).or_default();
        let created = DeliveryOrder {
            id: format!("DO-{}", existing.len() + 1),
            course_code: order.course_code.clone(),
            tracking_number: order.tracking_number.clone(),
            student_number: Some(order.student_number.clone()),
            current_status: Some(order.current_status),
        };
        existing.push(created.clone());
        Ok(created)
    }

    async fn fetch_tickets(&self, student_number: &str) -> Result<Vec<Ticket>> {
        self.record(format!("tickets:{}", student_number)).await;
        Ok(self
            .tickets
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.student_number == student_number)
            .cloned()
            .collect())
    }

    async fn fetch_all_tickets(&self) -> Result<Vec<Ticket>> {
        self.record("admin_tickets".to_string()).await;
        Ok(self.tickets.lock().unwrap().clone())
    }

    async fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket> {
        self.record(format!("create_ticket:{}", ticket.student_number)).await;
        if let Some(message) = self.fail_creates.lock().unwrap().clone() {
            return Err(ApiError::ServerError(message).into());
        }
        self.created_tickets.lock().unwrap().push(ticket.clone());

        let mut tickets = self.tickets.lock().unwrap();
        let created = Ticket {
            id: format!("T-{}", tickets.len() + 1),
            subject: ticket.subject.clone(),
            category: ticket.category,
            priority: ticket.priority,
            description: ticket.description.clone(),
            student_number: ticket.student_number.clone(),
            student_name: ticket.student_name.clone(),
            student_avatar: ticket.student_avatar.clone(),
            status: ticket.status,
            created_at: None,
        };
        tickets.push(created.clone());
        Ok(created)
    }
}
