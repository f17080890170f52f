//! Delivery packs, delivery orders and the remembered order-form defaults.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ParseEnumError;

/// Tracking number sent when the operator leaves the field blank.
pub const PENDING_TRACKING: &str = "PENDING";

/// Lifecycle status of a delivery order. Serialized as `"1"`..`"4"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "1")]
    Processing,
    #[serde(rename = "2")]
    Packed,
    #[serde(rename = "3")]
    Delivered,
    #[serde(rename = "4")]
    Removed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Processing,
        OrderStatus::Packed,
        OrderStatus::Delivered,
        OrderStatus::Removed,
    ];

    /// Wire code (`"1"`..`"4"`).
    pub fn code(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "1",
            OrderStatus::Packed => "2",
            OrderStatus::Delivered => "3",
            OrderStatus::Removed => "4",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "Processing",
            OrderStatus::Packed => "Packed",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Removed => "Removed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Accepts either the wire code or the label, case-insensitively.
impl FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        OrderStatus::ALL
            .into_iter()
            .find(|status| {
                status.code() == trimmed || status.label().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| {
                ParseEnumError::new(
                    "order status",
                    s,
                    "1/Processing, 2/Packed, 3/Delivered, 4/Removed",
                )
            })
    }
}

/// A priced delivery pack offered for a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct DeliverySetting {
    pub id: String,
    pub delivery_title: String,
    #[serde(default)]
    pub value: f64,
}

impl DeliverySetting {
    /// Label used in pack pickers, e.g. `Starter (LKR 500)`.
    pub fn display_name(&self) -> String {
        format!("{} (LKR {})", self.delivery_title, self.value)
    }
}

/// A delivery order as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct DeliveryOrder {
    pub id: String,
    pub course_code: String,
    #[serde(default)]
    pub tracking_number: String,
    #[serde(default)]
    pub student_number: Option<String>,
    #[serde(default)]
    pub current_status: Option<OrderStatus>,
}

/// Body of a create-delivery-order request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewDeliveryOrder {
    pub student_number: String,
    pub course_code: String,
    pub delivery_setting: DeliverySetting,
    pub notes: String,
    pub address: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub current_status: OrderStatus,
    pub tracking_number: String,
}

/// Order-form defaults remembered between order creations.
///
/// Every field is optional on disk so that a partially written record still
/// loads; missing values fall back to an empty pack, `Processing`, an empty
/// tracking number and `remember = false`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOrderDefaults {
    #[serde(default)]
    pub delivery_setting_id: String,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub tracking: String,
    #[serde(default)]
    pub remember: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_wire_format() {
        assert_eq!(serde_json::to_string(&OrderStatus::Packed).unwrap(), r#""2""#);
        let parsed: OrderStatus = serde_json::from_str(r#""4""#).unwrap();
        assert_eq!(parsed, OrderStatus::Removed);
        assert!(serde_json::from_str::<OrderStatus>(r#""5""#).is_err());
    }

    #[test]
    fn test_order_status_from_str() {
        assert_eq!("1".parse::<OrderStatus>(), Ok(OrderStatus::Processing));
        assert_eq!("delivered".parse::<OrderStatus>(), Ok(OrderStatus::Delivered));
        assert_eq!(" Packed ".parse::<OrderStatus>(), Ok(OrderStatus::Packed));
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_defaults_record_format() {
        let defaults = DeliveryOrderDefaults {
            delivery_setting_id: "s1".to_string(),
            status: OrderStatus::Processing,
            tracking: String::new(),
            remember: true,
        };
        let json = serde_json::to_value(&defaults).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "deliverySettingId": "s1",
                "status": "1",
                "tracking": "",
                "remember": true
            })
        );
    }

    #[test]
    fn test_defaults_record_missing_fields() {
        let parsed: DeliveryOrderDefaults = serde_json::from_str(r#"{"remember":true}"#).unwrap();
        assert!(parsed.remember);
        assert_eq!(parsed.delivery_setting_id, "");
        assert_eq!(parsed.status, OrderStatus::Processing);
    }

    #[test]
    fn test_new_order_wire_names() {
        let order = NewDeliveryOrder {
            student_number: "stu001".to_string(),
            course_code: "BATCH-101".to_string(),
            delivery_setting: DeliverySetting {
                id: "s1".to_string(),
                delivery_title: "Starter".to_string(),
                value: 500.0,
            },
            notes: String::new(),
            address: "12 Lake Road, Kandy".to_string(),
            full_name: "Nimal Perera".to_string(),
            phone: None,
            current_status: OrderStatus::Processing,
            tracking_number: PENDING_TRACKING.to_string(),
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["studentNumber"], "stu001");
        assert_eq!(json["deliverySetting"]["delivery_title"], "Starter");
        assert_eq!(json["currentStatus"], "1");
        assert_eq!(json["trackingNumber"], "PENDING");
    }

    #[test]
    fn test_setting_display_name() {
        let setting = DeliverySetting {
            id: "s1".to_string(),
            delivery_title: "Starter".to_string(),
            value: 500.0,
        };
        assert_eq!(setting.display_name(), "Starter (LKR 500)");
    }
}
