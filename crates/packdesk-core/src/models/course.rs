//! Course batches and the students enrolled in them.

use serde::{Deserialize, Serialize};

/// A course batch. Reference data: fetched once and never considered stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Course {
    pub id: String,
    #[serde(rename = "courseCode")]
    pub course_code: String,
    pub name: String,
}

impl Course {
    /// Label used in batch pickers, e.g. `Chemistry 2025 (BATCH-101)`.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.course_code)
    }
}

/// A student's enrolment in a course batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct StudentInBatch {
    pub username: String,
    pub full_name: String,
    #[serde(default)]
    pub address_line_1: Option<String>,
    #[serde(default)]
    pub address_line_2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub telephone_1: Option<String>,
    pub student_course_id: String,
}

impl StudentInBatch {
    /// Address sent with a delivery order: first line and city, missing
    /// parts left empty.
    pub fn delivery_address(&self) -> String {
        format!(
            "{}, {}",
            self.address_line_1.as_deref().unwrap_or(""),
            self.city.as_deref().unwrap_or("")
        )
    }

    /// Full address for display, with `N/A` when the first line is missing.
    pub fn display_address(&self) -> String {
        format!(
            "{}, {}, {}",
            self.address_line_1.as_deref().unwrap_or("N/A"),
            self.address_line_2.as_deref().unwrap_or(""),
            self.city.as_deref().unwrap_or("")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student() -> StudentInBatch {
        StudentInBatch {
            username: "stu001".to_string(),
            full_name: "Nimal Perera".to_string(),
            address_line_1: Some("12 Lake Road".to_string()),
            address_line_2: None,
            city: Some("Kandy".to_string()),
            telephone_1: Some("0771234567".to_string()),
            student_course_id: "sc-1".to_string(),
        }
    }

    #[test]
    fn test_delivery_address() {
        assert_eq!(student().delivery_address(), "12 Lake Road, Kandy");

        let mut s = student();
        s.address_line_1 = None;
        s.city = None;
        assert_eq!(s.delivery_address(), ", ");
    }

    #[test]
    fn test_display_address_missing_first_line() {
        let mut s = student();
        s.address_line_1 = None;
        assert_eq!(s.display_address(), "N/A, , Kandy");
    }

    #[test]
    fn test_parse_course() {
        let json = r#"{"id":"c1","courseCode":"BATCH-101","name":"Chemistry 2025"}"#;
        let course: Course = serde_json::from_str(json).expect("Failed to parse course JSON");
        assert_eq!(course.course_code, "BATCH-101");
        assert_eq!(course.display_name(), "Chemistry 2025 (BATCH-101)");
    }

    #[test]
    fn test_parse_student_without_address() {
        let json = r#"{"username":"stu002","full_name":"Kamal Silva","student_course_id":"sc-2"}"#;
        let s: StudentInBatch = serde_json::from_str(json).expect("Failed to parse student JSON");
        assert!(s.address_line_1.is_none());
        assert!(s.telephone_1.is_none());
    }
}
