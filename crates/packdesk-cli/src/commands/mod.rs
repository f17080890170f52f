//! Subcommand handlers.

pub mod auth;
pub mod orders;
pub mod prefs;
pub mod tickets;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use tracing::{debug, warn};

use packdesk_core::api::ApiClient;
use packdesk_core::auth::{CredentialStore, Session};
use packdesk_core::cache::QueryCache;
use packdesk_core::config::Config;
use packdesk_core::models::Course;
use packdesk_core::prefs::PreferenceStore;
use packdesk_core::Portal;

/// Everything a command needs: settings, the signed-in session and the
/// portal handle.
pub struct Context {
    pub config: Config,
    pub session: Session,
    pub portal: Portal,
}

impl Context {
    pub fn open(config: Config) -> Result<Self> {
        let data_dir = config.data_dir()?;
        let mut session = Session::new(data_dir.clone());
        session.load()?;

        let mut client = ApiClient::new(&config.api_base_url)?;
        if let Some(username) = session.username() {
            match CredentialStore::get_token(username) {
                Ok(token) => client.set_token(token),
                Err(e) => warn!(user = username, error = %e, "No stored token, requests will be anonymous"),
            }
        }

        let prefs = PreferenceStore::for_profile(&data_dir, config.profile());
        debug!(dir = %prefs.dir().display(), "Using preference store");
        let portal = Portal::new(Arc::new(client), QueryCache::new(), prefs);

        Ok(Self {
            config,
            session,
            portal,
        })
    }

    /// Resolve a course by code or id.
    pub async fn course(&self, id_or_code: &str) -> Result<Course> {
        self.portal
            .find_course(id_or_code)
            .await
            .context("Failed to load courses")?
            .with_context(|| format!("No course batch {}", id_or_code))
    }
}
