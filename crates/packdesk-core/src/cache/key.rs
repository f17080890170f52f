use std::fmt;

/// Descriptor of a cached query: an operation name followed by its
/// parameters, e.g. `["studentDeliveryOrders", "stu001"]`.
///
/// A key is a prefix of another when its parts are a leading run of the
/// other's parts, so `["tickets"]` covers `["tickets", "stu001"]` but not
/// `["admin-tickets"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new(operation: impl Into<String>) -> Self {
        Self(vec![operation.into()])
    }

    pub fn with(mut self, param: impl Into<String>) -> Self {
        self.0.push(param.into());
        self
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    // ===== Well-known descriptors =====

    pub fn all_courses() -> Self {
        Self::new("allCourses")
    }

    pub fn students_by_course(course_code: &str) -> Self {
        Self::new("studentsByCourse").with(course_code)
    }

    pub fn delivery_settings(course_code: &str) -> Self {
        Self::new("deliverySettings").with(course_code)
    }

    pub fn student_delivery_orders(student_number: &str) -> Self {
        Self::new("studentDeliveryOrders").with(student_number)
    }

    pub fn tickets(username: &str) -> Self {
        Self::new("tickets").with(username)
    }

    pub fn admin_tickets() -> Self {
        Self::new("admin-tickets")
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_matching() {
        let orders = QueryKey::student_delivery_orders("stu001");
        assert!(orders.starts_with(&QueryKey::new("studentDeliveryOrders")));
        assert!(orders.starts_with(&orders));
        assert!(!orders.starts_with(&QueryKey::student_delivery_orders("stu002")));
        assert!(!QueryKey::admin_tickets().starts_with(&QueryKey::new("tickets")));
    }

    #[test]
    fn test_prefix_is_by_part_not_by_text() {
        let key = QueryKey::new("tickets").with("stu0011");
        assert!(!key.starts_with(&QueryKey::tickets("stu001")));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            QueryKey::delivery_settings("BATCH-101").to_string(),
            "[deliverySettings, BATCH-101]"
        );
    }
}
