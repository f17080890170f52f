//! API client for communicating with the portal REST API.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! requests to fetch courses, students, delivery data and tickets.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::models::{Course, DeliveryOrder, DeliverySetting, NewDeliveryOrder, NewTicket, StudentInBatch, Ticket};

use super::{ApiError, PortalApi};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API client for the portal backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).with_context(|| format!("Invalid API base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API base URL cannot carry a path: {}", base_url);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Build an endpoint URL from path segments. Segments are percent-encoded,
    /// so usernames and course codes may contain any character.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: reqwest::Response) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Send a request built by `build`, retrying on 429 with exponential backoff.
    async fn send_with_retry<T, F>(&self, method: &str, url: &Url, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn() -> Result<reqwest::RequestBuilder>,
    {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = build()?
                .send()
                .await
                .with_context(|| format!("Failed to send {} request to {}", method, url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .json()
                        .await
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(url = %url, "GET");
        self.send_with_retry("GET", &url, || {
            Ok(self.client.get(url.clone()).headers(self.auth_headers()?))
        })
        .await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(&self, url: Url, body: &B) -> Result<T> {
        debug!(url = %url, "POST");
        self.send_with_retry("POST", &url, || {
            Ok(self.client.post(url.clone()).headers(self.auth_headers()?).json(body))
        })
        .await
    }
}

#[async_trait]
impl PortalApi for ApiClient {
    async fn fetch_courses(&self) -> Result<Vec<Course>> {
        self.get(self.endpoint(&["courses"]))
            .await
            .context("Failed to fetch courses")
    }

    async fn fetch_students(&self, course_code: &str) -> Result<Vec<StudentInBatch>> {
        self.get(self.endpoint(&["courses", course_code, "students"]))
            .await
            .with_context(|| format!("Failed to fetch students for {}", course_code))
    }

    async fn fetch_delivery_settings(&self, course_code: &str) -> Result<Vec<DeliverySetting>> {
        self.get(self.endpoint(&["courses", course_code, "delivery-settings"]))
            .await
            .with_context(|| format!("Failed to fetch delivery settings for {}", course_code))
    }

    async fn fetch_delivery_orders(&self, student_number: &str) -> Result<Vec<DeliveryOrder>> {
        self.get(self.endpoint(&["students", student_number, "delivery-orders"]))
            .await
            .with_context(|| format!("Failed to fetch delivery orders for {}", student_number))
    }

    async fn create_delivery_order(&self, order: &NewDeliveryOrder) -> Result<DeliveryOrder> {
        let created: DeliveryOrder = self
            .post(self.endpoint(&["delivery-orders"]), order)
            .await
            .context("Failed to create delivery order")?;
        info!(order_id = %created.id, student = %order.student_number, "Delivery order created");
        Ok(created)
    }

    async fn fetch_tickets(&self, student_number: &str) -> Result<Vec<Ticket>> {
        self.get(self.endpoint(&["students", student_number, "tickets"]))
            .await
            .with_context(|| format!("Failed to fetch tickets for {}", student_number))
    }

    async fn fetch_all_tickets(&self) -> Result<Vec<Ticket>> {
        self.get(self.endpoint(&["tickets"]))
            .await
            .context("Failed to fetch tickets")
    }

    async fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket> {
        let created: Ticket = self
            .post(self.endpoint(&["tickets"]), ticket)
            .await
            .context("Failed to create ticket")?;
        info!(ticket_id = %created.id, student = %ticket.student_number, "Ticket created");
        Ok(created)
    }
}
