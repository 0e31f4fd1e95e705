use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::UserSummary;
use crate::lists::repo_types::UserList;

#[derive(Debug, Deserialize)]
pub struct ListNameRequest {
    pub list_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_per_page")]
    pub per_page: i64,
    #[serde(default = "default_page")]
    pub page: i64,
}
fn default_per_page() -> i64 {
    10
}
fn default_page() -> i64 {
    1
}

/// One page of results plus paging metadata.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub per_page: i64,
    pub current_page: i64,
    pub last_page: i64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: i64, per_page: i64, current_page: i64) -> Self {
        let last_page = if total == 0 {
            1
        } else {
            (total + per_page - 1) / per_page
        };
        Self {
            data,
            total,
            per_page,
            current_page,
            last_page,
        }
    }
}

/// A list together with its member users.
#[derive(Debug, Serialize)]
pub struct ListWithMembers {
    #[serde(flatten)]
    pub list: UserList,
    pub users: Vec<UserSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_math() {
        let page = Page::new(vec![1, 2, 3], 23, 10, 1);
        assert_eq!(page.last_page, 3);

        let page = Page::new(Vec::<i32>::new(), 0, 10, 1);
        assert_eq!(page.last_page, 1);

        let page = Page::new(vec![1], 20, 10, 2);
        assert_eq!(page.last_page, 2);
    }

    #[test]
    fn pagination_defaults() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.per_page, 10);
        assert_eq!(p.page, 1);
    }
}
