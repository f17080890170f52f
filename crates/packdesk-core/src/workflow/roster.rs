//! Students of a batch: search, pagination and the per-row order column.

use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::models::{Course, StudentInBatch};
use crate::portal::Portal;
use crate::utils::contains_ignore_case;

use super::{OrderCell, WorkflowError};

pub const ITEMS_PER_PAGE: usize = 25;

/// Maximum order lookups in flight while filling a page.
const MAX_CONCURRENT_REQUESTS: usize = 10;

/// Students whose username or full name contains `term`, ignoring case.
pub fn filter_students<'a>(students: &'a [StudentInBatch], term: &str) -> Vec<&'a StudentInBatch> {
    students
        .iter()
        .filter(|s| contains_ignore_case(&s.username, term) || contains_ignore_case(&s.full_name, term))
        .collect()
}

/// One page of a list.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based, clamped to `1..=total_pages`.
    pub page: usize,
    /// At least 1, even for an empty list.
    pub total_pages: usize,
    pub total_items: usize,
}

/// Slice `items` to the requested 1-based page.
pub fn paginate<T: Clone>(items: &[T], page: usize) -> Page<T> {
    let total_items = items.len();
    let total_pages = total_items.div_ceil(ITEMS_PER_PAGE).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * ITEMS_PER_PAGE;
    let end = (start + ITEMS_PER_PAGE).min(total_items);

    Page {
        items: items[start..end].to_vec(),
        page,
        total_pages,
        total_items,
    }
}

/// A roster row with its resolved order column.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterRow {
    pub student: StudentInBatch,
    pub order: Result<OrderCell, String>,
}

impl Portal {
    /// Search the batch roster and resolve the order column for one page.
    pub async fn roster(&self, course: &Course, term: &str, page: usize) -> Result<Page<RosterRow>, WorkflowError> {
        let students = self.students(&course.course_code).await?;
        let matches: Vec<StudentInBatch> = filter_students(&students, term).into_iter().cloned().collect();
        let page = paginate(&matches, page);

        debug!(
            course = %course.course_code,
            page = page.page,
            rows = page.items.len(),
            "Resolving order status for roster page"
        );
        let rows = self.roster_statuses(course, page.items).await;

        Ok(Page {
            items: rows,
            page: page.page,
            total_pages: page.total_pages,
            total_items: page.total_items,
        })
    }

    /// Resolve the order column for each student, keeping input order. A
    /// failed lookup is reported on its row only.
    pub async fn roster_statuses(&self, course: &Course, students: Vec<StudentInBatch>) -> Vec<RosterRow> {
        stream::iter(students)
            .map(|student| async move {
                let order = self
                    .order_status(&student, course)
                    .await
                    .map_err(|e| e.to_string());
                RosterRow { student, order }
            })
            .buffered(MAX_CONCURRENT_REQUESTS)
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tempfile::TempDir;

    use crate::api::fake::FakeApi;
    use crate::cache::QueryCache;
    use crate::models::DeliveryOrder;
    use crate::prefs::PreferenceStore;

    fn student(username: &str, full_name: &str) -> StudentInBatch {
        StudentInBatch {
            username: username.to_string(),
            full_name: full_name.to_string(),
            address_line_1: None,
            address_line_2: None,
            city: None,
            telephone_1: None,
            student_course_id: format!("sc-{}", username),
        }
    }

    fn many(n: usize) -> Vec<StudentInBatch> {
        (1..=n)
            .map(|i| student(&format!("stu{:03}", i), &format!("Student {}", i)))
            .collect()
    }

    fn course() -> Course {
        Course {
            id: "c1".to_string(),
            course_code: "BATCH-101".to_string(),
            name: "Chemistry 2025".to_string(),
        }
    }

    #[test]
    fn test_filter_by_username_or_name() {
        let students = vec![
            student("stu001", "Nimal Perera"),
            student("stu002", "Kamala Silva"),
            student("admin7", "Ruwan Perera"),
        ];

        let hits = filter_students(&students, "perera");
        assert_eq!(hits.len(), 2);
        assert_eq!(filter_students(&students, "STU").len(), 2);
        assert_eq!(filter_students(&students, "").len(), 3);
        // The term is matched as typed, surrounding spaces included
        assert!(filter_students(&students, " stu001").is_empty());
        assert_eq!(filter_students(&students, "mal Per").len(), 1);
        assert!(filter_students(&students, "fernando").is_empty());
    }

    #[test]
    fn test_paginate_counts_pages() {
        let students = many(51);
        let page = paginate(&students, 1);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 25);
        assert_eq!(page.total_items, 51);

        let last = paginate(&students, 3);
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].username, "stu051");
    }

    #[test]
    fn test_paginate_clamps_page() {
        let students = many(30);
        assert_eq!(paginate(&students, 0).page, 1);
        let beyond = paginate(&students, 9);
        assert_eq!(beyond.page, 2);
        assert_eq!(beyond.items.len(), 5);
    }

    #[test]
    fn test_paginate_empty() {
        let page = paginate::<StudentInBatch>(&[], 4);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_roster_resolves_order_column() {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(FakeApi::new());
        api.set_students("BATCH-101", many(30));
        api.set_orders(
            "stu002",
            vec![DeliveryOrder {
                id: "DO-9".to_string(),
                course_code: "BATCH-101".to_string(),
                tracking_number: "TRK-9".to_string(),
                student_number: None,
                current_status: None,
            }],
        );
        let prefs = PreferenceStore::new(dir.path().to_path_buf());
        let portal = Portal::new(Arc::clone(&api) as Arc<dyn crate::api::PortalApi>, QueryCache::new(), prefs);

        let page = portal.roster(&course(), "", 1).await.unwrap();
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 25);
        assert_eq!(page.items[0].student.username, "stu001");
        assert_eq!(page.items[0].order, Ok(OrderCell::Creatable));
        assert!(matches!(page.items[1].order, Ok(OrderCell::Existing(ref o)) if o.id == "DO-9"));

        // Only the students on the page are looked up
        assert_eq!(api.call_count("orders:"), 25);

        let searched = portal.roster(&course(), "student 3", 1).await.unwrap();
        let names: Vec<&str> = searched.items.iter().map(|r| r.student.username.as_str()).collect();
        assert_eq!(names, vec!["stu003", "stu030"]);
    }
}
