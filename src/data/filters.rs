//! List query parameters
//!
//! Raw query-string input is turned into a [`FilterSpec`] (paging and a
//! safelisted sort) plus entity-specific [`Predicate`]s. Parsing never stops
//! at the first bad field: every field is checked, each failure is recorded,
//! and the documented default is substituted.

use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite};

use crate::error::ValidationErrors;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE: i64 = 10_000_000;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const DEFAULT_SORT: &str = "id";

/// Raw list parameters as they arrive in a query string.
///
/// Everything is kept as text so that malformed numbers can be reported as
/// field errors instead of failing the whole decode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
    pub title: Option<String>,
    pub author_id: Option<String>,
    pub author_name: Option<String>,
    pub post_id: Option<String>,
    pub user_id: Option<String>,
    pub direct_id: Option<String>,
}

impl ListQuery {
    /// Parse a URL query string (`page=2&sort=-id&title=rust`).
    ///
    /// Unknown keys are ignored; a repeated key keeps its last value.
    pub fn from_query_string(query: &str) -> Self {
        let mut parsed = Self::default();
        let query = query.strip_prefix('?').unwrap_or(query);

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "page" => &mut parsed.page,
                "page_size" => &mut parsed.page_size,
                "sort" => &mut parsed.sort,
                "title" => &mut parsed.title,
                "author_id" => &mut parsed.author_id,
                "author_name" => &mut parsed.author_name,
                "post_id" => &mut parsed.post_id,
                "user_id" => &mut parsed.user_id,
                "direct_id" => &mut parsed.direct_id,
                _ => continue,
            };
            *slot = Some(value.into_owned());
        }

        parsed
    }
}

/// Read an integer field; empty means "not supplied".
pub(crate) fn read_int(
    raw: Option<&str>,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<i64> {
    let raw = raw.map(str::trim).filter(|value| !value.is_empty())?;
    match raw.parse::<i64>() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.add(field, "must be an integer value");
            None
        }
    }
}

/// Read a text field; empty means "not supplied".
pub(crate) fn read_string(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// Normalized paging and sort parameters.
///
/// Construct through [`FilterSpec::parse`] or [`FilterSpec::new`]; both
/// guarantee `page >= 1`, `1 <= page_size <= 100` and a safelisted sort
/// field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    page: i64,
    page_size: i64,
    sort_field: &'static str,
    sort_direction: SortDirection,
    sort_safelist: &'static [&'static str],
}

impl FilterSpec {
    /// The default spec for an entity: first page, 20 rows, sorted by id.
    pub fn defaults(sort_safelist: &'static [&'static str]) -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            sort_field: DEFAULT_SORT,
            sort_direction: SortDirection::Ascending,
            sort_safelist,
        }
    }

    /// Build a spec from already-typed values, rejecting anything invalid.
    pub fn new(
        page: i64,
        page_size: i64,
        sort: &str,
        sort_safelist: &'static [&'static str],
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut spec = Self::defaults(sort_safelist);
        spec.apply_page(Some(page), &mut errors);
        spec.apply_page_size(Some(page_size), &mut errors);
        spec.apply_sort(Some(sort), &mut errors);

        if errors.is_empty() {
            Ok(spec)
        } else {
            Err(errors)
        }
    }

    /// Validate raw paging/sort input against `sort_safelist`.
    ///
    /// Always returns a usable spec; invalid fields fall back to their
    /// defaults and are reported in the returned errors.
    pub fn parse(
        query: &ListQuery,
        sort_safelist: &'static [&'static str],
    ) -> (Self, ValidationErrors) {
        let mut errors = ValidationErrors::new();
        let mut spec = Self::defaults(sort_safelist);

        let page = read_int(query.page.as_deref(), "page", &mut errors);
        spec.apply_page(page, &mut errors);

        let page_size = read_int(query.page_size.as_deref(), "page_size", &mut errors);
        spec.apply_page_size(page_size, &mut errors);

        spec.apply_sort(query.sort.as_deref(), &mut errors);

        (spec, errors)
    }

    fn apply_page(&mut self, page: Option<i64>, errors: &mut ValidationErrors) {
        let Some(page) = page else { return };
        if page < 1 {
            errors.add("page", "must be greater than zero");
        } else if page > MAX_PAGE {
            errors.add("page", "must be a maximum of 10 million");
        } else {
            self.page = page;
        }
    }

    fn apply_page_size(&mut self, page_size: Option<i64>, errors: &mut ValidationErrors) {
        let Some(page_size) = page_size else { return };
        if page_size < 1 {
            errors.add("page_size", "must be greater than zero");
        } else if page_size > MAX_PAGE_SIZE {
            errors.add("page_size", "must be a maximum of 100");
        } else {
            self.page_size = page_size;
        }
    }

    fn apply_sort(&mut self, sort: Option<&str>, errors: &mut ValidationErrors) {
        let Some(sort) = sort.map(str::trim).filter(|sort| !sort.is_empty()) else {
            return;
        };

        let (field, direction) = match sort.strip_prefix('-') {
            Some(field) => (field, SortDirection::Descending),
            None => (sort, SortDirection::Ascending),
        };

        match self.sort_safelist.iter().find(|allowed| **allowed == field) {
            Some(allowed) => {
                self.sort_field = *allowed;
                self.sort_direction = direction;
            }
            None => errors.add("sort", "invalid sort value"),
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn sort_field(&self) -> &'static str {
        self.sort_field
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

/// A row filter appended to a list query.
///
/// Column names are compile-time constants; only values are bound.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column = value`
    Eq(&'static str, i64),
    /// `left = value OR right = value`
    EitherEq(&'static str, &'static str, i64),
    /// `column = value` on a boolean column
    Flag(&'static str, bool),
    /// Case-insensitive substring match
    Contains(&'static str, String),
    /// Author whose user name contains the given text
    AuthorName(&'static str, String),
}

impl Predicate {
    pub(crate) fn push(&self, query: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            Predicate::Eq(column, value) => {
                query.push(" AND ").push(*column).push(" = ").push_bind(*value);
            }
            Predicate::EitherEq(left, right, value) => {
                query
                    .push(" AND (")
                    .push(*left)
                    .push(" = ")
                    .push_bind(*value)
                    .push(" OR ")
                    .push(*right)
                    .push(" = ")
                    .push_bind(*value)
                    .push(")");
            }
            Predicate::Flag(column, value) => {
                query.push(" AND ").push(*column).push(" = ").push_bind(*value);
            }
            Predicate::Contains(column, needle) => {
                query
                    .push(" AND instr(lower(")
                    .push(*column)
                    .push("), lower(")
                    .push_bind(needle.clone())
                    .push(")) > 0");
            }
            Predicate::AuthorName(column, needle) => {
                query
                    .push(" AND ")
                    .push(*column)
                    .push(" IN (SELECT id FROM users WHERE instr(lower(name), lower(")
                    .push_bind(needle.clone())
                    .push(")) > 0)");
            }
        }
    }
}
