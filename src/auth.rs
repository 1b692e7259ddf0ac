//! Mock authentication.
//!
//! Two hard-coded accounts and a registration that accepts anything. There
//! is no credential verification beyond string comparison and no token
//! refresh; the session is just a token and a user blob kept in a
//! [`KeyValueStore`]. Every call waits a fixed latency to mimic a backend.

use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::error::{AuthError, StoreError};
use crate::model::{AuthUser, LoginCredentials, ProfileUpdate, RegisterData, Role};
use crate::store::KeyValueStore;

pub const TOKEN_KEY: &str = "auth_token";
pub const USER_KEY: &str = "auth_user";

const LOGIN_LATENCY: Duration = Duration::from_millis(1000);
const REGISTER_LATENCY: Duration = Duration::from_millis(1500);
const PROFILE_LATENCY: Duration = Duration::from_millis(800);
const PASSWORD_LATENCY: Duration = Duration::from_millis(1000);

const MIN_PASSWORD_LEN: usize = 6;

struct MockAccount {
    id: u64,
    name: &'static str,
    email: &'static str,
    password: &'static str,
    username: &'static str,
    role: Role,
    token: &'static str,
    avatar_background: &'static str,
}

static ACCOUNTS: [MockAccount; 2] = [
    MockAccount {
        id: 1,
        name: "Admin User",
        email: "admin@example.com",
        password: "admin123",
        username: "admin",
        role: Role::Admin,
        token: "mock_admin_token_123",
        avatar_background: "3b82f6",
    },
    MockAccount {
        id: 2,
        name: "Regular User",
        email: "user@example.com",
        password: "user123",
        username: "user",
        role: Role::User,
        token: "mock_user_token_456",
        avatar_background: "10b981",
    },
];

fn avatar_url(name: &str, background: &str) -> Option<String> {
    reqwest::Url::parse_with_params(
        "https://ui-avatars.com/api/",
        &[("name", name), ("background", background), ("color", "fff")],
    )
    .ok()
    .map(String::from)
}

pub struct AuthSession<S> {
    store: S,
    current_user: Option<AuthUser>,
    token: Option<String>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl<S: KeyValueStore> AuthSession<S> {
    /// Picks up a stored token right away; the user blob is only read by
    /// [`check_auth_status`](Self::check_auth_status).
    pub fn new(store: S) -> Self {
        let token = store.get(TOKEN_KEY);
        Self { store, current_user: None, token, is_loading: false, error: None }
    }

    pub fn current_user(&self) -> Option<&AuthUser> {
        self.current_user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user.is_some() && self.token.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.current_user.as_ref().is_some_and(|u| u.role == Role::Admin)
    }

    pub fn user_name(&self) -> &str {
        self.current_user.as_ref().map(|u| u.name.as_str()).unwrap_or("")
    }

    pub fn user_email(&self) -> &str {
        self.current_user.as_ref().map(|u| u.email.as_str()).unwrap_or("")
    }

    fn begin(&mut self) {
        self.is_loading = true;
        self.error = None;
    }

    fn finish<T>(&mut self, result: Result<T, AuthError>) -> Result<T, AuthError> {
        if let Err(e) = &result {
            self.error = Some(e.to_string());
        }
        self.is_loading = false;
        result
    }

    fn persist_user(&mut self) -> Result<(), StoreError> {
        if let Some(user) = &self.current_user {
            let blob = serde_json::to_string(user)?;
            self.store.set(USER_KEY, &blob)?;
        }
        Ok(())
    }

    fn start_session(&mut self, user: AuthUser, token: String) -> Result<AuthUser, AuthError> {
        self.store.set(TOKEN_KEY, &token)?;
        self.token = Some(token);
        self.current_user = Some(user.clone());
        self.persist_user()?;
        Ok(user)
    }

    pub async fn login(&mut self, credentials: &LoginCredentials) -> Result<AuthUser, AuthError> {
        self.begin();
        tokio::time::sleep(LOGIN_LATENCY).await;

        let result = match ACCOUNTS
            .iter()
            .find(|a| a.email == credentials.email && a.password == credentials.password)
        {
            Some(account) => {
                let user = AuthUser {
                    id: account.id,
                    name: account.name.to_string(),
                    email: credentials.email.clone(),
                    username: account.username.to_string(),
                    avatar: avatar_url(account.name, account.avatar_background),
                    role: account.role,
                    last_login: Some(Utc::now()),
                };
                info!(email = %credentials.email, "signed in");
                self.start_session(user, account.token.to_string())
            }
            None => {
                warn!(email = %credentials.email, "rejected sign-in");
                Err(AuthError::InvalidCredentials)
            }
        };
        self.finish(result)
    }

    /// Create an account from whatever was entered and sign it in.
    pub async fn register(&mut self, data: &RegisterData) -> Result<AuthUser, AuthError> {
        self.begin();
        tokio::time::sleep(REGISTER_LATENCY).await;

        let now = Utc::now();
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
        let user = AuthUser {
            id: millis,
            name: data.name.clone(),
            email: data.email.clone(),
            username: data.username.clone(),
            avatar: avatar_url(&data.name, "6366f1"),
            role: Role::User,
            last_login: Some(now),
        };
        info!(username = %data.username, "registered");
        let result = self.start_session(user, format!("mock_token_{millis}"));
        self.finish(result)
    }

    pub fn logout(&mut self) {
        self.current_user = None;
        self.token = None;
        self.error = None;
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!(key, error = %e, "could not clear stored session");
            }
        }
        info!("signed out");
    }

    pub async fn update_profile(&mut self, update: ProfileUpdate) -> Result<AuthUser, AuthError> {
        if self.current_user.is_none() {
            return Err(AuthError::NotSignedIn);
        }
        self.begin();
        tokio::time::sleep(PROFILE_LATENCY).await;

        let result = match self.current_user.as_mut() {
            Some(user) => {
                user.apply(update);
                let updated = user.clone();
                self.persist_user().map(|()| updated).map_err(AuthError::from)
            }
            None => Err(AuthError::NotSignedIn),
        };
        self.finish(result)
    }

    /// Only checks the length of both passwords; nothing is stored.
    pub async fn change_password(&mut self, current: &str, new: &str) -> Result<(), AuthError> {
        self.begin();
        tokio::time::sleep(PASSWORD_LATENCY).await;

        let result = if current.chars().count() < MIN_PASSWORD_LEN || new.chars().count() < MIN_PASSWORD_LEN {
            Err(AuthError::WeakPassword)
        } else {
            Ok(())
        };
        self.finish(result)
    }

    /// Restore a session from the store when both the token and the user
    /// blob are present. A blob that does not parse ends the session.
    pub fn check_auth_status(&mut self) {
        let (Some(token), Some(blob)) = (self.store.get(TOKEN_KEY), self.store.get(USER_KEY)) else {
            return;
        };
        match serde_json::from_str::<AuthUser>(&blob) {
            Ok(user) => {
                info!(email = %user.email, "session restored");
                self.token = Some(token);
                self.current_user = Some(user);
            }
            Err(e) => {
                error!(error = %e, "failed to restore auth state");
                self.logout();
            }
        }
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn initialize(&mut self) {
        self.check_auth_status();
    }
}
