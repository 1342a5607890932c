//! The current user's profile.

use crate::error::{AppError, Result};
use crate::models::UserProfile;
use crate::persistence::{keys, load_json, remove_key, save_json, LocalStore};
use std::sync::Arc;
use validator::Validate;

/// Holds the single current profile of this process.
pub struct ProfileService {
    local: Arc<dyn LocalStore>,
    current: Option<UserProfile>,
}

impl ProfileService {
    /// Restore the saved profile, if any.
    pub fn load(local: Arc<dyn LocalStore>) -> Self {
        let current: Option<UserProfile> = load_json(local.as_ref(), keys::CURRENT_USER);
        if let Some(profile) = &current {
            tracing::info!(profile_id = %profile.id, "Restored current profile");
        }
        Self { local, current }
    }

    pub fn current(&self) -> Option<&UserProfile> {
        self.current.as_ref()
    }

    /// Complete registration: the profile becomes current and is saved.
    ///
    /// An empty id is replaced by a fresh one.
    pub fn register(&mut self, mut profile: UserProfile) -> Result<&UserProfile> {
        profile.validate()?;
        if profile.id.is_empty() {
            profile.id = UserProfile::generate_id();
        }

        tracing::info!(profile_id = %profile.id, "Profile registered");
        self.store(profile)
    }

    /// Replace the current profile wholesale, keeping its id.
    pub fn replace(&mut self, mut profile: UserProfile) -> Result<&UserProfile> {
        let current_id = self
            .current
            .as_ref()
            .map(|p| p.id.clone())
            .ok_or_else(|| AppError::NotFound("No current profile".to_string()))?;

        profile.validate()?;
        profile.id = current_id;

        tracing::info!(profile_id = %profile.id, "Profile replaced");
        self.store(profile)
    }

    /// Forget the current profile.
    pub fn sign_out(&mut self) {
        if let Some(profile) = self.current.take() {
            tracing::info!(profile_id = %profile.id, "Signed out");
        }
        remove_key(self.local.as_ref(), keys::CURRENT_USER);
    }

    fn store(&mut self, profile: UserProfile) -> Result<&UserProfile> {
        save_json(self.local.as_ref(), keys::CURRENT_USER, &profile);
        Ok(self.current.insert(profile))
    }
}
