//! Delivery-order creation for one student in one course batch.
//!
//! The flow mirrors the operator's dialog:
//!
//! 1. `order_status` tells whether the student already has an order for
//!    the batch.
//! 2. `open_order_form` builds a form, pre-filled from the remembered
//!    defaults when the operator asked for them to be remembered, otherwise
//!    defaulting the pack to the first delivery setting of the batch.
//! 3. `submit_order` validates the form, sends the create call and applies
//!    the follow-up effects: invalidate the student's cached orders, save or
//!    clear the remembered defaults, reset the form for the next entry.

use tracing::{info, warn};

use crate::cache::QueryKey;
use crate::models::delivery::PENDING_TRACKING;
use crate::models::{
    Course, DeliveryOrder, DeliveryOrderDefaults, DeliverySetting, NewDeliveryOrder, OrderStatus, StudentInBatch,
};
use crate::portal::Portal;

use super::WorkflowError;

pub const SELECT_PACK_MESSAGE: &str = "Please select a delivery pack.";

/// What the order column shows for a student.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderCell {
    /// The student already has an order for the batch.
    Existing(DeliveryOrder),
    /// No order yet: creation is offered.
    Creatable,
}

/// Editable state of the create-order form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderForm {
    pub delivery_setting_id: Option<String>,
    pub tracking_number: String,
    pub notes: String,
    pub status: OrderStatus,
    pub remember: bool,
}

impl OrderForm {
    /// Pre-fill from a remembered defaults record. Records without
    /// `remember` set are ignored.
    fn apply_defaults(&mut self, defaults: DeliveryOrderDefaults) {
        if !defaults.remember {
            return;
        }
        self.delivery_setting_id = Some(defaults.delivery_setting_id).filter(|id| !id.is_empty());
        self.status = defaults.status;
        self.tracking_number = defaults.tracking;
        self.remember = true;
    }

    /// Select the first setting when no pack is chosen yet.
    fn default_pack(&mut self, settings: &[DeliverySetting]) {
        if self.delivery_setting_id.is_none() {
            self.delivery_setting_id = settings.first().map(|s| s.id.clone());
        }
    }

    /// Tracking number as sent: blank becomes `PENDING`.
    pub fn effective_tracking_number(&self) -> String {
        if self.tracking_number.trim().is_empty() {
            PENDING_TRACKING.to_string()
        } else {
            self.tracking_number.clone()
        }
    }

    /// Reset after a successful submission. Notes are always cleared; the
    /// other fields are kept when the operator asked to remember them.
    fn reset_after_submit(&mut self, settings: &[DeliverySetting]) {
        self.notes.clear();
        if !self.remember {
            self.delivery_setting_id = settings.first().map(|s| s.id.clone());
            self.status = OrderStatus::default();
            self.tracking_number.clear();
        }
    }

    fn to_defaults(&self) -> DeliveryOrderDefaults {
        DeliveryOrderDefaults {
            delivery_setting_id: self.delivery_setting_id.clone().unwrap_or_default(),
            status: self.status,
            tracking: self.tracking_number.clone(),
            remember: true,
        }
    }
}

/// Releases a (student, course) submission slot when dropped.
struct SubmissionGuard<'a> {
    portal: &'a Portal,
    pair: (String, String),
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        let mut submitting = self.portal.submitting.lock().unwrap_or_else(|p| p.into_inner());
        submitting.remove(&self.pair);
    }
}

impl Portal {
    /// Whether `student` already has an order for `course`.
    pub async fn order_status(&self, student: &StudentInBatch, course: &Course) -> Result<OrderCell, WorkflowError> {
        let orders = self.delivery_orders(&student.username).await?;
        Ok(find_order(orders, &course.course_code))
    }

    /// Build the create-order form for `course`.
    pub async fn open_order_form(&self, course: &Course) -> Result<OrderForm, WorkflowError> {
        let mut form = OrderForm::default();
        if let Some(defaults) = self.prefs.delivery_order_defaults() {
            form.apply_defaults(defaults);
        }

        let settings = self.delivery_settings(&course.course_code).await?;
        form.default_pack(&settings);
        Ok(form)
    }

    /// Submit `form` for `student` in `course`.
    ///
    /// On failure the form, the cache and the remembered defaults are left
    /// untouched so the operator can correct and resubmit.
    pub async fn submit_order(
        &self,
        student: &StudentInBatch,
        course: &Course,
        form: &mut OrderForm,
    ) -> Result<DeliveryOrder, WorkflowError> {
        let settings: Vec<DeliverySetting> = self
            .cache
            .peek(&QueryKey::delivery_settings(&course.course_code))
            .unwrap_or_default();
        let setting = form
            .delivery_setting_id
            .as_deref()
            .and_then(|id| settings.iter().find(|s| s.id == id))
            .cloned()
            .ok_or_else(|| WorkflowError::Validation(SELECT_PACK_MESSAGE.to_string()))?;

        let _guard = self.claim_submission(student, course)?;

        // The cached order list may predate another operator's submission
        let orders = self.delivery_orders_fresh(&student.username).await?;
        if let OrderCell::Existing(order) = find_order(orders, &course.course_code) {
            return Err(WorkflowError::OrderExists {
                student: student.username.clone(),
                course_code: course.course_code.clone(),
                order_id: order.id,
            });
        }

        let request = NewDeliveryOrder {
            student_number: student.username.clone(),
            course_code: course.course_code.clone(),
            delivery_setting: setting,
            notes: form.notes.clone(),
            address: student.delivery_address(),
            full_name: student.full_name.clone(),
            phone: student.telephone_1.clone(),
            current_status: form.status,
            tracking_number: form.effective_tracking_number(),
        };

        let created = self
            .api
            .create_delivery_order(&request)
            .await
            .map_err(WorkflowError::Remote)?;
        info!(
            order_id = %created.id,
            student = %student.username,
            course = %course.course_code,
            "Created delivery order"
        );

        self.cache.invalidate(&QueryKey::student_delivery_orders(&student.username));

        let saved = if form.remember {
            self.prefs.save_delivery_order_defaults(&form.to_defaults())
        } else {
            self.prefs.clear_delivery_order_defaults()
        };
        if let Err(e) = saved {
            warn!(error = %e, "Failed to update remembered order defaults");
        }

        form.reset_after_submit(&settings);
        Ok(created)
    }

    fn claim_submission(&self, student: &StudentInBatch, course: &Course) -> Result<SubmissionGuard<'_>, WorkflowError> {
        let pair = (student.username.clone(), course.course_code.clone());
        let mut submitting = self.submitting.lock().unwrap_or_else(|p| p.into_inner());
        if !submitting.insert(pair.clone()) {
            return Err(WorkflowError::SubmissionInProgress {
                student: pair.0,
                course_code: pair.1,
            });
        }
        Ok(SubmissionGuard { portal: self, pair })
    }
}

fn find_order(orders: Vec<DeliveryOrder>, course_code: &str) -> OrderCell {
    orders
        .into_iter()
        .find(|order| order.course_code == course_code)
        .map(OrderCell::Existing)
        .unwrap_or(OrderCell::Creatable)
}
