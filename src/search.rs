//! Derived views over the user collection.
//!
//! Everything here is a pure function of its inputs: the directory engine
//! calls [`derive_view`] whenever it needs the displayed slice or the
//! `has_more` flag, so a read is always consistent with the last mutation.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use icu_collator::{Collator, CollatorOptions};
use tracing::warn;

use crate::model::User;

/// Field the listing is ordered by.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    Name,
    Email,
    Company,
    City,
}

impl SortField {
    pub const ALL: [SortField; 4] = [SortField::Name, SortField::Email, SortField::Company, SortField::City];

    pub fn label(self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Email => "email",
            SortField::Company => "company",
            SortField::City => "city",
        }
    }

    fn key(self, user: &User) -> &str {
        match self {
            SortField::Name => &user.name,
            SortField::Email => &user.email,
            SortField::Company => &user.company.name,
            SortField::City => &user.address.city,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// Search text plus the two facet filters. `None` means "no filter".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filters {
    pub search_query: String,
    pub selected_city: Option<String>,
    pub selected_company: Option<String>,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        self.search_query.is_empty() && self.selected_city.is_none() && self.selected_company.is_none()
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Sorting {
    pub field: SortField,
    pub order: SortOrder,
}

/// How much of the filtered result is revealed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page_size: usize,
    pub current_page: usize,
}

impl Pagination {
    pub const DEFAULT_PAGE_SIZE: usize = 6;

    pub fn new(page_size: usize) -> Self {
        Self { page_size: page_size.max(1), current_page: 0 }
    }

    /// Number of entries revealed so far: `(current_page + 1) * page_size`.
    pub fn limit(&self) -> usize {
        self.current_page.saturating_add(1).saturating_mul(self.page_size)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PAGE_SIZE)
    }
}

/// The displayed slice of the directory and what lies beyond it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryView<'a> {
    pub users: Vec<&'a User>,
    /// Size of the filtered and sorted result before truncation.
    pub total_matches: usize,
    pub has_more: bool,
}

thread_local! {
    // Root locale, tertiary strength, punctuation not ignorable.
    static COLLATOR: Option<Collator> = Collator::try_new(&Default::default(), CollatorOptions::new())
        .map_err(|e| warn!(error = ?e, "collator unavailable, sorting by folded code points"))
        .ok();
}

/// Locale-aware string order (Unicode collation, root locale).
///
/// Punctuation sorts before digits and digits before letters; accented
/// letters sit next to their base letter; strings equal apart from case put
/// lower case first. Strings the collator deems equal fall back to byte order.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    COLLATOR
        .with(|c| match c {
            Some(collator) => collator.compare(a, b),
            None => folded_compare(a, b),
        })
        .then_with(|| a.cmp(b))
}

fn folded_compare(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| {
            a.chars()
                .zip(b.chars())
                .map(|(x, y)| x.is_uppercase().cmp(&y.is_uppercase()))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        })
}

fn matches_query(user: &User, query: &str) -> bool {
    user.name.to_lowercase().contains(query)
        || user.email.to_lowercase().contains(query)
        || user.company.name.to_lowercase().contains(query)
        || user.address.city.to_lowercase().contains(query)
}

/// Apply search, city, company (in that order), then a stable sort.
pub fn filter_and_sort<'a>(users: &'a [User], filters: &Filters, sorting: Sorting) -> Vec<&'a User> {
    let mut filtered: Vec<&User> = users.iter().collect();

    if !filters.search_query.is_empty() {
        let q = filters.search_query.to_lowercase();
        filtered.retain(|u| matches_query(u, &q));
    }
    if let Some(city) = filters.selected_city.as_deref() {
        filtered.retain(|u| u.address.city == city);
    }
    if let Some(company) = filters.selected_company.as_deref() {
        filtered.retain(|u| u.company.name == company);
    }

    // sort_by is stable, and reversing the comparator keeps ties in input order
    filtered.sort_by(|a, b| {
        let ord = locale_compare(sorting.field.key(a), sorting.field.key(b));
        match sorting.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
    filtered
}

pub fn derive_view<'a>(
    users: &'a [User],
    filters: &Filters,
    sorting: Sorting,
    pagination: Pagination,
) -> DirectoryView<'a> {
    let mut matches = filter_and_sort(users, filters, sorting);
    let total_matches = matches.len();
    matches.truncate(pagination.limit());
    DirectoryView { has_more: matches.len() < total_matches, users: matches, total_matches }
}

/// Distinct cities across the whole collection, sorted.
pub fn unique_cities(users: &[User]) -> Vec<String> {
    users
        .iter()
        .map(|u| u.address.city.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct company names across the whole collection, sorted.
pub fn unique_companies(users: &[User]) -> Vec<String> {
    users
        .iter()
        .map(|u| u.company.name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Address, Company};

    fn mk_user(id: u64, name: &str, email: &str, company: &str, city: &str) -> User {
        User {
            id,
            name: name.to_string(),
            username: name.to_lowercase().replace(' ', "."),
            email: email.to_string(),
            address: Address { city: city.to_string(), ..Default::default() },
            phone: String::new(),
            website: String::new(),
            company: Company { name: company.to_string(), ..Default::default() },
        }
    }

    fn sample() -> Vec<User> {
        vec![
            mk_user(1, "Leanne Graham", "Sincere@april.biz", "Romaguera-Crona", "Gwenborough"),
            mk_user(2, "Ervin Howell", "Shanna@melissa.tv", "Deckow-Crist", "Wisokyburgh"),
            mk_user(3, "Clementine Bauch", "Nathan@yesenia.net", "Romaguera-Jacobson", "McKenziehaven"),
            mk_user(4, "Patricia Lebsack", "Julianne.OConner@kory.org", "Robel-Corkery", "South Elvis"),
        ]
    }

    #[test]
    fn search_matches_any_field_case_insensitively() {
        let users = sample();
        let filters = Filters { search_query: "ROMAGUERA".into(), ..Default::default() };
        let got = filter_and_sort(&users, &filters, Sorting::default());
        let ids: Vec<u64> = got.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![3, 1]);

        let filters = Filters { search_query: "elvis".into(), ..Default::default() };
        assert_eq!(filter_and_sort(&users, &filters, Sorting::default())[0].id, 4);

        let filters = Filters { search_query: "melissa.tv".into(), ..Default::default() };
        assert_eq!(filter_and_sort(&users, &filters, Sorting::default())[0].id, 2);
    }

    #[test]
    fn facets_filter_by_exact_match_after_search() {
        let users = sample();
        let filters = Filters {
            search_query: "romaguera".into(),
            selected_city: Some("Gwenborough".into()),
            selected_company: None,
        };
        let got = filter_and_sort(&users, &filters, Sorting::default());
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].id, 1);

        let filters = Filters { selected_city: Some("gwenborough".into()), ..Default::default() };
        assert!(filter_and_sort(&users, &filters, Sorting::default()).is_empty());

        let filters = Filters { selected_company: Some("Deckow-Crist".into()), ..Default::default() };
        assert_eq!(filter_and_sort(&users, &filters, Sorting::default())[0].id, 2);
    }

    #[test]
    fn sort_by_each_field_and_direction() {
        let users = sample();
        let by = |field, order| {
            filter_and_sort(&users, &Filters::default(), Sorting { field, order })
                .iter()
                .map(|u| u.id)
                .collect::<Vec<_>>()
        };
        assert_eq!(by(SortField::Name, SortOrder::Asc), vec![3, 2, 1, 4]);
        assert_eq!(by(SortField::Name, SortOrder::Desc), vec![4, 1, 2, 3]);
        assert_eq!(by(SortField::Email, SortOrder::Asc), vec![4, 3, 2, 1]);
        assert_eq!(by(SortField::Company, SortOrder::Asc), vec![2, 4, 1, 3]);
        assert_eq!(by(SortField::City, SortOrder::Asc), vec![1, 3, 4, 2]);
    }

    #[test]
    fn sort_is_stable_in_both_directions() {
        let users = vec![
            mk_user(1, "Same", "a@x", "Zeta", "X"),
            mk_user(2, "Other", "b@x", "Alpha", "X"),
            mk_user(3, "Same", "c@x", "Beta", "X"),
            mk_user(4, "Same", "d@x", "Gamma", "X"),
        ];
        let asc = filter_and_sort(&users, &Filters::default(), Sorting::default());
        assert_eq!(asc.iter().map(|u| u.id).collect::<Vec<_>>(), vec![2, 1, 3, 4]);
        let desc = filter_and_sort(
            &users,
            &Filters::default(),
            Sorting { field: SortField::Name, order: SortOrder::Desc },
        );
        assert_eq!(desc.iter().map(|u| u.id).collect::<Vec<_>>(), vec![1, 3, 4, 2]);
    }

    #[test]
    fn locale_compare_ignores_case_before_breaking_ties() {
        assert_eq!(locale_compare("apple", "Banana"), Ordering::Less);
        assert_eq!(locale_compare("Zed", "alpha"), Ordering::Greater);
        assert_eq!(locale_compare("abc", "Abc"), Ordering::Less);
        assert_eq!(locale_compare("same", "same"), Ordering::Equal);
    }

    #[test]
    fn locale_compare_orders_punctuation_digits_then_letters() {
        assert_eq!(locale_compare("user1@example.org", "user10@example.org"), Ordering::Less);
        assert_eq!(locale_compare("a_b", "a1b"), Ordering::Less);
        assert_eq!(locale_compare("a1b", "ab"), Ordering::Less);
        assert_eq!(locale_compare("Émile", "Frank"), Ordering::Less);
        assert_eq!(locale_compare("emile", "Émile"), Ordering::Less);
    }

    #[test]
    fn email_sort_puts_shorter_local_part_first() {
        let users = vec![
            mk_user(10, "Ten", "user10@example.org", "Co", "X"),
            mk_user(1, "One", "user1@example.org", "Co", "X"),
        ];
        let got = filter_and_sort(&users, &Filters::default(), Sorting { field: SortField::Email, order: SortOrder::Asc });
        assert_eq!(got.iter().map(|u| u.id).collect::<Vec<_>>(), vec![1, 10]);
    }

    #[test]
    fn view_truncates_and_reports_has_more() {
        let users: Vec<User> = (1..=10)
            .map(|i| mk_user(i, &format!("User {i:02}"), "u@x", "Co", "City"))
            .collect();
        let mut pagination = Pagination::new(6);
        let view = derive_view(&users, &Filters::default(), Sorting::default(), pagination);
        assert_eq!(view.users.len(), 6);
        assert_eq!(view.total_matches, 10);
        assert!(view.has_more);

        pagination.current_page = 1;
        let view = derive_view(&users, &Filters::default(), Sorting::default(), pagination);
        assert_eq!(view.users.len(), 10);
        assert!(!view.has_more);
    }

    #[test]
    fn facets_are_distinct_and_sorted() {
        let mut users = sample();
        users.push(mk_user(5, "Chelsey Dietrich", "Lucio_Hettinger@annie.ca", "Deckow-Crist", "Gwenborough"));
        assert_eq!(
            unique_cities(&users),
            vec!["Gwenborough", "McKenziehaven", "South Elvis", "Wisokyburgh"]
        );
        assert_eq!(
            unique_companies(&users),
            vec!["Deckow-Crist", "Robel-Corkery", "Romaguera-Crona", "Romaguera-Jacobson"]
        );
    }
}
