//! Session-scoped handle tying the backend, the query cache and the
//! preference store together.
//!
//! Every read of backend data goes through `Portal`, which picks the cache
//! descriptor and staleness for it. The workflows in `crate::workflow` are
//! implemented as further methods on this type.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::api::PortalApi;
use crate::cache::{CacheError, QueryCache, QueryKey, Staleness};
use crate::models::{Course, DeliveryOrder, DeliverySetting, StudentInBatch, Ticket};
use crate::prefs::PreferenceStore;

/// Per-student order lookups are served from cache for this long.
pub const ORDERS_STALE_MINUTES: u64 = 5;

#[derive(Clone)]
pub struct Portal {
    pub(crate) api: Arc<dyn PortalApi>,
    pub(crate) cache: QueryCache,
    pub(crate) prefs: Arc<PreferenceStore>,
    /// (student, course code) pairs with a create-order call in progress.
    pub(crate) submitting: Arc<Mutex<HashSet<(String, String)>>>,
}

impl Portal {
    pub fn new(api: Arc<dyn PortalApi>, cache: QueryCache, prefs: PreferenceStore) -> Self {
        Self {
            api,
            cache,
            prefs: Arc::new(prefs),
            submitting: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn prefs(&self) -> &PreferenceStore {
        &self.prefs
    }

    // ===== Cached reads =====

    /// All course batches. Reference data: never refreshed unless invalidated.
    pub async fn courses(&self) -> Result<Vec<Course>, CacheError> {
        let api = Arc::clone(&self.api);
        self.cache
            .fetch(&QueryKey::all_courses(), Staleness::Never, move || async move {
                api.fetch_courses().await
            })
            .await
    }

    /// Find a course by id or course code (case-insensitive).
    pub async fn find_course(&self, id_or_code: &str) -> Result<Option<Course>, CacheError> {
        let courses = self.courses().await?;
        Ok(courses
            .into_iter()
            .find(|c| c.id == id_or_code || c.course_code.eq_ignore_ascii_case(id_or_code)))
    }

    pub async fn students(&self, course_code: &str) -> Result<Vec<StudentInBatch>, CacheError> {
        let api = Arc::clone(&self.api);
        let code = course_code.to_string();
        self.cache
            .fetch(&QueryKey::students_by_course(course_code), Staleness::Immediately, move || async move {
                api.fetch_students(&code).await
            })
            .await
    }

    pub async fn delivery_settings(&self, course_code: &str) -> Result<Vec<DeliverySetting>, CacheError> {
        let api = Arc::clone(&self.api);
        let code = course_code.to_string();
        self.cache
            .fetch(&QueryKey::delivery_settings(course_code), Staleness::Immediately, move || async move {
                api.fetch_delivery_settings(&code).await
            })
            .await
    }

    pub async fn delivery_orders(&self, student_number: &str) -> Result<Vec<DeliveryOrder>, CacheError> {
        let api = Arc::clone(&self.api);
        let student = student_number.to_string();
        self.cache
            .fetch(
                &QueryKey::student_delivery_orders(student_number),
                Staleness::minutes(ORDERS_STALE_MINUTES),
                move || async move { api.fetch_delivery_orders(&student).await },
            )
            .await
    }

    /// Like `delivery_orders`, but never answers from a stale or
    /// invalidated entry.
    pub async fn delivery_orders_fresh(&self, student_number: &str) -> Result<Vec<DeliveryOrder>, CacheError> {
        let api = Arc::clone(&self.api);
        let student = student_number.to_string();
        self.cache
            .fetch_fresh(
                &QueryKey::student_delivery_orders(student_number),
                Staleness::minutes(ORDERS_STALE_MINUTES),
                move || async move { api.fetch_delivery_orders(&student).await },
            )
            .await
    }

    pub async fn tickets(&self, username: &str) -> Result<Vec<Ticket>, CacheError> {
        let api = Arc::clone(&self.api);
        let user = username.to_string();
        self.cache
            .fetch(&QueryKey::tickets(username), Staleness::Immediately, move || async move {
                api.fetch_tickets(&user).await
            })
            .await
    }

    pub async fn admin_tickets(&self) -> Result<Vec<Ticket>, CacheError> {
        let api = Arc::clone(&self.api);
        self.cache
            .fetch(&QueryKey::admin_tickets(), Staleness::Immediately, move || async move {
                api.fetch_all_tickets().await
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;
    use tempfile::TempDir;

    fn portal(api: Arc<FakeApi>) -> (TempDir, Portal) {
        let dir = TempDir::new().unwrap();
        let prefs = PreferenceStore::new(dir.path().to_path_buf());
        (dir, Portal::new(api, QueryCache::new(), prefs))
    }

    #[tokio::test]
    async fn test_courses_fetched_once() {
        let api = Arc::new(FakeApi::new());
        api.courses.lock().unwrap().push(Course {
            id: "c1".to_string(),
            course_code: "BATCH-101".to_string(),
            name: "Chemistry 2025".to_string(),
        });
        let (_dir, portal) = portal(Arc::clone(&api));

        assert_eq!(portal.courses().await.unwrap().len(), 1);
        assert!(portal.find_course("batch-101").await.unwrap().is_some());
        assert!(portal.find_course("c1").await.unwrap().is_some());
        assert!(portal.find_course("BATCH-999").await.unwrap().is_none());
        assert_eq!(api.call_count("courses"), 1);
    }

    #[tokio::test]
    async fn test_orders_served_from_cache_within_window() {
        let api = Arc::new(FakeApi::new());
        let (_dir, portal) = portal(Arc::clone(&api));

        portal.delivery_orders("stu001").await.unwrap();
        portal.delivery_orders("stu001").await.unwrap();
        portal.delivery_orders_fresh("stu001").await.unwrap();
        assert_eq!(api.call_count("orders:stu001"), 1);
    }
}
