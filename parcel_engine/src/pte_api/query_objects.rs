use std::fmt::Display;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 100;

//--------------------------------------      Pagination       ---------------------------------------------------------
/// A 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, limit: DEFAULT_PAGE_SIZE }
    }
}

impl Pagination {
    pub fn new(page: u32, limit: u32) -> Self {
        let page = if page == 0 { 1 } else { page };
        let limit = if limit == 0 { DEFAULT_PAGE_SIZE } else { limit };
        Self { page, limit }
    }

    /// Builds a page request from raw query string values. Anything that is missing, not a number or less than 1
    /// falls back to the default.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let parse = |v: Option<&str>| v.and_then(|s| s.trim().parse::<u32>().ok()).filter(|v| *v > 0);
        let page = parse(page).unwrap_or(1);
        let limit = parse(limit).unwrap_or(DEFAULT_PAGE_SIZE);
        Self { page, limit }
    }

    /// Rows to skip. Saturates at `i64::MAX` for pages far beyond any real result set.
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)).saturating_mul(i64::from(self.limit))
    }

    pub fn total_pages(&self, total_count: i64) -> i64 {
        let limit = i64::from(self.limit.max(1));
        let total_count = total_count.max(0);
        total_count / limit + i64::from(total_count % limit > 0)
    }
}

/// One page of results, together with the size of the full result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub total_count: i64,
    pub current_page: u32,
    pub total_pages: i64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: i64, pagination: Pagination) -> Self {
        Self { total_count, current_page: pagination.page, total_pages: pagination.total_pages(total_count), items }
    }
}

//--------------------------------------       DateSort        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateSort {
    #[default]
    Latest,
    Oldest,
}

impl DateSort {
    /// `oldest` selects ascending order. Anything else, including nothing at all, means newest first.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(|s| s.trim().to_ascii_lowercase()) {
            Some(s) if s == "oldest" => DateSort::Oldest,
            _ => DateSort::Latest,
        }
    }

    pub fn sql_direction(&self) -> &'static str {
        match self {
            DateSort::Latest => "DESC",
            DateSort::Oldest => "ASC",
        }
    }
}

//--------------------------------------       Presence        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Presence {
    Exists,
    NotExists,
}

impl Presence {
    /// Recognises `exists` and `notExists`. Any other value means "no filter".
    pub fn from_query(value: Option<&str>) -> Option<Self> {
        match value.map(str::trim) {
            Some("exists") => Some(Presence::Exists),
            Some("notExists") => Some(Presence::NotExists),
            _ => None,
        }
    }
}

//--------------------------------------   TrackQueryFilter    ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackQueryFilter {
    /// Case-insensitive substring over the track id and its owner.
    pub search: Option<String>,
    pub status: Option<String>,
    pub owner: Option<Presence>,
    pub sort: DateSort,
}

impl TrackQueryFilter {
    pub fn with_search<S: Into<String>>(mut self, search: S) -> Self {
        self.search = non_empty(search.into());
        self
    }

    pub fn with_status<S: Into<String>>(mut self, status: S) -> Self {
        self.status = non_empty(status.into());
        self
    }

    pub fn with_owner(mut self, owner: Presence) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn sorted(mut self, sort: DateSort) -> Self {
        self.sort = sort;
        self
    }

    /// True if no filters are set. Sorting is not a filter.
    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.status.is_none() && self.owner.is_none()
    }
}

impl Display for TrackQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters. ")?;
        }
        if let Some(search) = &self.search {
            write!(f, "search: {search}. ")?;
        }
        if let Some(status) = &self.status {
            write!(f, "status: {status}. ")?;
        }
        if let Some(owner) = &self.owner {
            write!(f, "owner: {owner:?}. ")?;
        }
        write!(f, "sort: {:?}", self.sort)
    }
}

//--------------------------------------   UserQueryFilter     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserSearch {
    /// Exact match on the phone number.
    Phone(String),
    /// Case-insensitive substring over name or surname.
    Name(String),
}

impl UserSearch {
    /// A search term that is an integer is taken to be a phone number; anything else searches names.
    pub fn parse(term: &str) -> Option<Self> {
        let term = term.trim();
        if term.is_empty() {
            return None;
        }
        match term.parse::<i64>() {
            Ok(_) => Some(UserSearch::Phone(term.to_string())),
            Err(_) => Some(UserSearch::Name(term.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQueryFilter {
    pub search: Option<UserSearch>,
    pub role: Option<String>,
    pub filial: Option<String>,
    pub sort_by_date: DateSort,
    /// Orders by bookmark + archive count, highest first. Date order breaks ties.
    pub sort_by_activity: bool,
}

impl UserQueryFilter {
    pub fn with_search(mut self, term: &str) -> Self {
        self.search = UserSearch::parse(term);
        self
    }

    pub fn with_role<S: Into<String>>(mut self, role: S) -> Self {
        self.role = non_empty(role.into());
        self
    }

    pub fn with_filial<S: Into<String>>(mut self, filial: S) -> Self {
        self.filial = non_empty(filial.into());
        self
    }

    pub fn sorted(mut self, sort: DateSort) -> Self {
        self.sort_by_date = sort;
        self
    }

    pub fn by_activity(mut self, by_activity: bool) -> Self {
        self.sort_by_activity = by_activity;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.role.is_none() && self.filial.is_none()
    }
}

fn non_empty(s: String) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Escapes the `LIKE` wildcards in `term` and wraps it in `%`, for use with `ESCAPE '\'`.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}
