//! Request types for the shared crate
//!
//! Query strings accepted by list endpoints

use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use crate::calendar::{DateWindow, resolve_window};
use crate::pagination::{MAX_PAGE, PageSlice};
use crate::util::search_pattern;

/// `?page=&year=&month=&search=`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// 1-based page; `0` returns everything
    #[serde(default)]
    #[validate(range(max = MAX_PAGE))]
    pub page: i64,
    #[serde(default)]
    #[validate(range(min = 0, max = 9999))]
    pub year: i32,
    #[serde(default)]
    #[validate(range(min = 0, max = 12))]
    pub month: u32,
    #[validate(length(max = 100))]
    pub search: Option<String>,
}

impl ListQuery {
    pub fn slice(&self) -> PageSlice {
        PageSlice::for_page(self.page)
    }

    /// Billing window selected by `year`/`month`, relative to `today`
    pub fn window(&self, today: NaiveDate) -> DateWindow {
        resolve_window(self.year, self.month, today)
    }

    /// Bound `ILIKE` pattern for `search`, if any
    pub fn pattern(&self) -> Option<String> {
        search_pattern(self.search.as_deref())
    }
}

/// `?page=&roleId=&departmentId=&search=` for the user directory
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(default)]
    #[validate(range(max = MAX_PAGE))]
    pub page: i64,
    pub role_id: Option<i32>,
    pub department_id: Option<i64>,
    #[validate(length(max = 100))]
    pub search: Option<String>,
}

impl UserQuery {
    pub fn slice(&self) -> PageSlice {
        PageSlice::for_page(self.page)
    }

    pub fn pattern(&self) -> Option<String> {
        search_pattern(self.search.as_deref())
    }
}
