//! State behind the per-user detail view.

use tracing::{debug, warn};

use crate::error::FetchError;
use crate::model::{User, UserPatch};
use crate::source::UserSource;

#[derive(Debug, Clone, Default)]
pub struct UserDetail {
    current: Option<User>,
    pub loading: bool,
    pub error: Option<String>,
}

impl UserDetail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&User> {
        self.current.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        !self.loading && self.error.is_none() && self.current.is_some()
    }

    pub fn display_name(&self) -> &str {
        self.current.as_ref().map(|u| u.name.as_str()).unwrap_or("")
    }

    /// Up to two upper-cased initials taken from the words of the name.
    pub fn initials(&self) -> String {
        let Some(user) = &self.current else {
            return String::new();
        };
        user.name
            .split(' ')
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect()
    }

    /// Load user `id` unless it is already shown without an error.
    ///
    /// A failed request clears the record so the view never shows a user
    /// that does not match the request.
    pub async fn fetch_user<S>(&mut self, source: &S, id: u64) -> Result<(), FetchError>
    where
        S: UserSource + ?Sized,
    {
        if self.error.is_none() && self.current.as_ref().is_some_and(|u| u.id == id) {
            debug!(id, "user already loaded");
            return Ok(());
        }
        self.load(source, id).await
    }

    /// Re-fetch the current record, bypassing the already-loaded check.
    pub async fn refresh_user<S>(&mut self, source: &S) -> Result<(), FetchError>
    where
        S: UserSource + ?Sized,
    {
        match self.current.as_ref().map(|u| u.id) {
            Some(id) => self.load(source, id).await,
            None => Ok(()),
        }
    }

    async fn load<S>(&mut self, source: &S, id: u64) -> Result<(), FetchError>
    where
        S: UserSource + ?Sized,
    {
        self.loading = true;
        self.error = None;

        let outcome = match source.fetch_user(id).await {
            Ok(user) => {
                self.current = Some(user);
                Ok(())
            }
            Err(e) => {
                warn!(id, error = %e, "fetching user failed");
                self.error = Some(e.to_string());
                self.current = None;
                Err(e)
            }
        };

        self.loading = false;
        outcome
    }

    pub fn set_user(&mut self, user: User) {
        self.current = Some(user);
        self.error = None;
    }

    pub fn clear_user(&mut self) {
        self.current = None;
        self.error = None;
        self.loading = false;
    }

    /// Merge a partial update into the shown record, if any.
    pub fn update_user(&mut self, patch: UserPatch) {
        if let Some(user) = self.current.as_mut() {
            user.apply(patch);
        }
    }

    fn target<'a>(&'a self, user: Option<&'a User>) -> Option<&'a User> {
        user.or(self.current.as_ref())
    }

    pub fn email_link(&self, user: Option<&User>) -> Option<String> {
        self.target(user).map(|u| format!("mailto:{}", u.email))
    }

    pub fn phone_link(&self, user: Option<&User>) -> Option<String> {
        self.target(user).map(|u| format!("tel:{}", u.phone))
    }

    pub fn website_link(&self, user: Option<&User>) -> Option<String> {
        self.target(user).map(|u| format!("http://{}", u.website))
    }
}
