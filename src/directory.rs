//! User directory state engine.
//!
//! Owns the full user collection together with the search, facet, sort and
//! pagination parameters. Derived views are never cached: [`DirectoryState::view`]
//! recomputes them from the current parameters, and every mutation refreshes
//! `has_more` before it returns.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::model::User;
use crate::search::{self, DirectoryView, Filters, Pagination, SortField, SortOrder, Sorting};
use crate::source::UserSource;

/// Stand-in latency for "load more". The listing is sliced client-side from
/// the already-fetched collection; a paged backend request would replace it.
pub const DEFAULT_LOAD_MORE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct DirectoryState {
    users: Vec<User>,
    filters: Filters,
    sorting: Sorting,
    pagination: Pagination,
    load_more_delay: Duration,
    pub loading: bool,
    pub loading_more: bool,
    pub error: Option<String>,
    has_more: bool,
}

impl DirectoryState {
    pub fn new(page_size: usize) -> Self {
        Self {
            users: Vec::new(),
            filters: Filters::default(),
            sorting: Sorting::default(),
            pagination: Pagination::new(page_size),
            load_more_delay: DEFAULT_LOAD_MORE_DELAY,
            loading: false,
            loading_more: false,
            error: None,
            has_more: false,
        }
    }

    pub fn with_load_more_delay(mut self, delay: Duration) -> Self {
        self.load_more_delay = delay;
        self
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn sorting(&self) -> Sorting {
        self.sorting
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn find(&self, id: u64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// The displayed slice for the current parameters.
    pub fn view(&self) -> DirectoryView<'_> {
        search::derive_view(&self.users, &self.filters, self.sorting, self.pagination)
    }

    pub fn unique_cities(&self) -> Vec<String> {
        search::unique_cities(&self.users)
    }

    pub fn unique_companies(&self) -> Vec<String> {
        search::unique_companies(&self.users)
    }

    fn refresh_has_more(&mut self) {
        self.has_more = self.view().has_more;
    }

    /// Back to the first page of the current result.
    pub fn reset_pagination(&mut self) {
        self.pagination.current_page = 0;
        self.refresh_has_more();
    }

    /// Replace the collection with a fresh copy from `source`.
    ///
    /// On failure the previous collection is kept and the message is stored
    /// in `error`. `loading` is cleared on both paths.
    pub async fn fetch_all<S>(&mut self, source: &S) -> Result<(), FetchError>
    where
        S: UserSource + ?Sized,
    {
        self.loading = true;
        self.error = None;
        self.pagination.current_page = 0;

        let result = source.fetch_users().await;
        let outcome = match result {
            Ok(users) => {
                info!(count = users.len(), "users loaded");
                let dupes = duplicate_ids(&users);
                if !dupes.is_empty() {
                    // kept as served; add_user is the only place ids are enforced
                    warn!(ids = ?dupes, "source returned duplicate user ids");
                }
                self.users = users;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "fetching users failed");
                self.error = Some(e.to_string());
                Err(e)
            }
        };

        self.refresh_has_more();
        self.loading = false;
        outcome
    }

    /// Reveal the next page increment after the simulated latency.
    ///
    /// Returns `false` without waiting when a page extension is already in
    /// flight or everything is shown.
    pub async fn load_more(&mut self) -> bool {
        if self.loading_more || !self.has_more {
            return false;
        }
        self.loading_more = true;

        tokio::time::sleep(self.load_more_delay).await;
        self.pagination.current_page += 1;
        self.refresh_has_more();
        debug!(page = self.pagination.current_page, has_more = self.has_more, "page revealed");

        self.loading_more = false;
        true
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.filters.search_query = query.into();
        self.reset_pagination();
    }

    /// Select a city facet; `None` or an empty string clears it.
    pub fn set_city(&mut self, city: Option<String>) {
        self.filters.selected_city = city.filter(|c| !c.is_empty());
        self.reset_pagination();
    }

    /// Select a company facet; `None` or an empty string clears it.
    pub fn set_company(&mut self, company: Option<String>) {
        self.filters.selected_company = company.filter(|c| !c.is_empty());
        self.reset_pagination();
    }

    pub fn set_sort_field(&mut self, field: SortField) {
        self.sorting.field = field;
        self.reset_pagination();
    }

    pub fn set_sort_order(&mut self, order: SortOrder) {
        self.sorting.order = order;
        self.reset_pagination();
    }

    pub fn toggle_sort_order(&mut self) {
        self.sorting.order = self.sorting.order.flipped();
        self.reset_pagination();
    }

    pub fn clear_filters(&mut self) {
        self.filters = Filters::default();
        self.sorting = Sorting::default();
        self.reset_pagination();
    }

    /// Append a user. A colliding id is rejected and the collection is left
    /// as it was; returns whether the user was added.
    pub fn add_user(&mut self, user: User) -> bool {
        if self.users.iter().any(|u| u.id == user.id) {
            warn!(id = user.id, "refusing to add user with duplicate id");
            return false;
        }
        self.users.push(user);
        self.refresh_has_more();
        true
    }

    /// Replace the entry with the same id in place. No-op for unknown ids.
    pub fn update_user(&mut self, user: User) -> bool {
        let Some(slot) = self.users.iter_mut().find(|u| u.id == user.id) else {
            return false;
        };
        *slot = user;
        self.refresh_has_more();
        true
    }

    /// Remove the entry with `id`. No-op for unknown ids.
    pub fn delete_user(&mut self, id: u64) -> bool {
        let before = self.users.len();
        self.users.retain(|u| u.id != id);
        self.refresh_has_more();
        self.users.len() != before
    }
}

/// Ids that occur more than once, in first-repeat order.
fn duplicate_ids(users: &[User]) -> Vec<u64> {
    let mut seen = HashSet::new();
    let mut dupes = Vec::new();
    for u in users {
        if !seen.insert(u.id) && !dupes.contains(&u.id) {
            dupes.push(u.id);
        }
    }
    dupes
}

impl Default for DirectoryState {
    fn default() -> Self {
        Self::new(Pagination::DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Address, Company};
    use async_trait::async_trait;

    fn mk_user(id: u64, name: &str, company: &str, city: &str) -> User {
        User {
            id,
            name: name.to_string(),
            username: format!("user{id}"),
            email: format!("user{id}@example.org"),
            address: Address { city: city.to_string(), ..Default::default() },
            phone: String::new(),
            website: String::new(),
            company: Company { name: company.to_string(), ..Default::default() },
        }
    }

    fn ten_users() -> Vec<User> {
        (1..=10)
            .map(|i| mk_user(i, &format!("Person {i:02}"), "Acme", if i % 2 == 0 { "Even" } else { "Odd" }))
            .collect()
    }

    struct FixedSource(Result<Vec<User>, FetchError>);

    #[async_trait]
    impl UserSource for FixedSource {
        async fn fetch_users(&self) -> Result<Vec<User>, FetchError> {
            self.0.clone()
        }

        async fn fetch_user(&self, id: u64) -> Result<User, FetchError> {
            match &self.0 {
                Ok(users) => users.iter().find(|u| u.id == id).cloned().ok_or(FetchError::NotFound),
                Err(e) => Err(e.clone()),
            }
        }
    }

    fn loaded() -> DirectoryState {
        let mut state = DirectoryState::new(6).with_load_more_delay(Duration::ZERO);
        for u in ten_users() {
            assert!(state.add_user(u));
        }
        state
    }

    #[tokio::test]
    async fn fetch_then_load_more_reveals_everything() {
        let mut state = DirectoryState::new(6);
        state.fetch_all(&FixedSource(Ok(ten_users()))).await.unwrap();
        assert!(!state.loading);
        assert_eq!(state.view().users.len(), 6);
        assert!(state.has_more());

        state.load_more_delay = Duration::ZERO;
        assert!(state.load_more().await);
        assert_eq!(state.view().users.len(), 10);
        assert!(!state.has_more());
        assert!(!state.loading_more);
        assert!(!state.load_more().await);
        assert_eq!(state.pagination().current_page, 1);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_users() {
        let mut state = loaded();
        let err = state.fetch_all(&FixedSource(Err(FetchError::NotFound))).await.unwrap_err();
        assert_eq!(err, FetchError::NotFound);
        assert_eq!(state.users().len(), 10);
        assert_eq!(state.error.as_deref(), Some("User not found"));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn load_more_is_guarded_while_in_flight() {
        let mut state = loaded();
        state.loading_more = true;
        assert!(!state.load_more().await);
        assert_eq!(state.pagination().current_page, 0);
    }

    #[test]
    fn filter_changes_reset_pagination() {
        let mut state = loaded();
        state.pagination.current_page = 1;
        state.set_city(Some("Even".into()));
        assert_eq!(state.pagination().current_page, 0);
        assert_eq!(state.view().users.len(), 5);
        assert!(!state.has_more());

        state.set_city(Some(String::new()));
        assert_eq!(state.filters().selected_city, None);
        assert!(state.has_more());
    }

    #[test]
    fn clear_filters_and_toggle_reset_to_first_page() {
        let mut state = loaded();
        state.set_search_query("person 0");
        state.set_sort_field(SortField::City);
        state.pagination.current_page = 3;
        state.clear_filters();
        assert_eq!(state.pagination().current_page, 0);
        assert!(state.filters().is_empty());
        assert_eq!(state.sorting(), Sorting::default());

        state.pagination.current_page = 1;
        state.toggle_sort_order();
        assert_eq!(state.pagination().current_page, 0);
        assert_eq!(state.sorting().order, SortOrder::Desc);
        assert_eq!(state.view().users[0].id, 10);
    }

    #[test]
    fn search_without_match_yields_empty_view() {
        let mut state = loaded();
        state.set_search_query("admin");
        let view = state.view();
        assert!(view.users.is_empty());
        assert!(!view.has_more);
        assert!(!state.has_more());
    }

    #[tokio::test]
    async fn fetch_reports_duplicate_ids_but_keeps_payload() {
        let mut users = ten_users();
        users.push(mk_user(3, "Person 03 again", "Acme", "Odd"));
        assert_eq!(duplicate_ids(&users), vec![3]);
        assert!(duplicate_ids(&ten_users()).is_empty());

        let mut dir = DirectoryState::new(6);
        dir.fetch_all(&FixedSource(Ok(users))).await.unwrap();
        assert_eq!(dir.users().len(), 11);
        assert!(dir.error.is_none());
    }

    #[test]
    fn add_rejects_duplicate_ids() {
        let mut state = loaded();
        assert!(!state.add_user(mk_user(3, "Impostor", "Acme", "Odd")));
        assert_eq!(state.users().len(), 10);
        assert_eq!(state.find(3).unwrap().name, "Person 03");
    }

    #[test]
    fn update_and_delete_keep_positions_and_ignore_unknown_ids() {
        let mut state = loaded();
        assert!(state.update_user(mk_user(4, "Renamed", "Acme", "Even")));
        assert_eq!(state.users()[3].name, "Renamed");

        assert!(!state.update_user(mk_user(99, "Ghost", "Acme", "Odd")));
        assert!(!state.delete_user(99));
        assert_eq!(state.users().len(), 10);

        assert!(state.delete_user(1));
        assert_eq!(state.users().len(), 9);
        assert_eq!(state.users()[0].id, 2);
    }

    #[test]
    fn mutations_refresh_has_more() {
        let mut state = DirectoryState::new(6);
        for u in ten_users().into_iter().take(6) {
            state.add_user(u);
        }
        assert!(!state.has_more());
        state.add_user(mk_user(7, "Seventh", "Acme", "Odd"));
        assert!(state.has_more());
        state.delete_user(7);
        assert!(!state.has_more());
    }
}
