//
//  schematics-cli
//  api/common/pagination.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Paging Types for Schematics List Endpoints
//!
//! Every Schematics list endpoint pages with `offset` and `limit` query
//! parameters and reports the collection size in the response body
//! (`count` for v1 workspaces, `total_count` for v2 resources).
//!
//! | Type | Role |
//! |------|------|
//! | [`ListOptions`] | Query parameters shared by list operations |
//! | [`Profile`] | Response detail level (`ids`, `summary`, `detailed`) |
//! | [`ListPage`] | Implemented by every list response |
//! | [`collect_all`] | Follows pages until the collection is exhausted |
//!
//! # Example
//!
//! ```rust
//! use schematics_cli::api::common::ListOptions;
//!
//! let options = ListOptions::new().limit(50).offset(100).sort("-updated_at");
//! assert_eq!(options.limit, Some(50));
//! ```

use std::future::Future;

use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::api::client::ApiRequest;

/// Default page size used by the CLI when none is requested.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Response detail level accepted by the v2 list and get operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Only resource identifiers
    Ids,
    /// Summary view (the service default)
    Summary,
    /// Full detail, including nested state blocks
    Detailed,
}

impl Profile {
    /// The query parameter value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ids => "ids",
            Self::Summary => "summary",
            Self::Detailed => "detailed",
        }
    }
}

/// Query parameters shared by list operations.
///
/// All fields are optional; unset fields are not sent and the service
/// defaults apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    /// Number of records to skip.
    pub offset: Option<u32>,

    /// Maximum number of records to return.
    pub limit: Option<u32>,

    /// Sort field, prefixed with `-` for descending order.
    pub sort: Option<String>,

    /// Response detail level (v2 only).
    pub profile: Option<Profile>,
}

impl ListOptions {
    /// Creates empty list options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the offset.
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sets the page size.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the sort field.
    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Sets the response profile.
    pub fn profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Checks the page size against the endpoint's maximum.
    pub fn validate(&self, max_limit: u32) -> Result<(), ApiError> {
        match self.limit {
            Some(0) => Err(ApiError::InvalidArgument(
                "limit must be at least 1".to_string(),
            )),
            Some(limit) if limit > max_limit => Err(ApiError::InvalidArgument(format!(
                "limit must not exceed {}",
                max_limit
            ))),
            _ => Ok(()),
        }
    }

    /// Adds the set parameters to a request.
    pub(crate) fn apply(&self, request: ApiRequest) -> ApiRequest {
        request
            .query_opt("offset", self.offset)
            .query_opt("limit", self.limit)
            .query_opt("sort", self.sort.as_deref())
            .query_opt("profile", self.profile.map(|p| p.as_str()))
    }
}

/// A single page returned by a list operation.
pub trait ListPage {
    /// The resource type held by the page.
    type Item;

    /// Items in this page.
    fn items(&self) -> &[Self::Item];

    /// Consumes the page and returns its items.
    fn into_items(self) -> Vec<Self::Item>;

    /// Total size of the collection, when the service reports it.
    fn total(&self) -> Option<u64>;

    /// Offset this page starts at.
    fn page_offset(&self) -> u64;

    /// Page size the service applied.
    fn page_limit(&self) -> u64;

    /// Offset of the next page, or `None` when this page is the last one.
    ///
    /// A page is the last one when it is empty, when `offset + len` reaches
    /// the reported total, or (without a total) when it is shorter than the
    /// applied limit.
    fn next_offset(&self) -> Option<u32> {
        let len = self.items().len() as u64;
        if len == 0 {
            return None;
        }

        let fetched = self.page_offset() + len;
        let more = match self.total() {
            Some(total) => fetched < total,
            None => self.page_limit() == 0 || len >= self.page_limit(),
        };

        if more {
            u32::try_from(fetched).ok()
        } else {
            None
        }
    }
}

/// Fetches every page of a list operation.
///
/// `fetch` is called with the options for each page, starting from
/// `options`; the offset is advanced with [`ListPage::next_offset`].
///
/// # Example
///
/// ```rust,no_run
/// use schematics_cli::api::common::{collect_all, ListOptions};
/// use schematics_cli::api::SchematicsClient;
///
/// # async fn example(client: SchematicsClient) -> anyhow::Result<()> {
/// let actions = collect_all(ListOptions::new().limit(200), |opts| {
///     let client = &client;
///     async move { client.list_actions(&opts).await }
/// })
/// .await?;
/// println!("{} actions", actions.len());
/// # Ok(())
/// # }
/// ```
pub async fn collect_all<P, F, Fut>(
    mut options: ListOptions,
    mut fetch: F,
) -> Result<Vec<P::Item>, ApiError>
where
    P: ListPage,
    F: FnMut(ListOptions) -> Fut,
    Fut: Future<Output = Result<P, ApiError>>,
{
    let mut all = Vec::new();

    loop {
        let page = fetch(options.clone()).await?;
        let next = page.next_offset();
        all.extend(page.into_items());

        match next {
            Some(offset) => options.offset = Some(offset),
            None => break,
        }
    }

    Ok(all)
}

/// Implements [`ListPage`] for a list response with `offset`, `limit`, a
/// count field and an items field.
macro_rules! impl_list_page {
    ($page:ty, $item:ty, $items:ident, $total:ident) => {
        impl $crate::api::common::ListPage for $page {
            type Item = $item;

            fn items(&self) -> &[Self::Item] {
                &self.$items
            }

            fn into_items(self) -> Vec<Self::Item> {
                self.$items
            }

            fn total(&self) -> Option<u64> {
                self.$total
            }

            fn page_offset(&self) -> u64 {
                self.offset
            }

            fn page_limit(&self) -> u64 {
                self.limit
            }
        }
    };
}

pub(crate) use impl_list_page;

#[cfg(test)]
mod tests {
    use super::*;

    struct Page {
        items: Vec<u32>,
        total: Option<u64>,
        offset: u64,
        limit: u64,
    }

    impl_list_page!(Page, u32, items, total);

    fn page(items: Vec<u32>, total: Option<u64>, offset: u64, limit: u64) -> Page {
        Page {
            items,
            total,
            offset,
            limit,
        }
    }

    #[test]
    fn test_next_offset_with_total() {
        assert_eq!(page(vec![1, 2], Some(5), 0, 2).next_offset(), Some(2));
        assert_eq!(page(vec![5], Some(5), 4, 2).next_offset(), None);
    }

    #[test]
    fn test_next_offset_without_total() {
        assert_eq!(page(vec![1, 2], None, 0, 2).next_offset(), Some(2));
        assert_eq!(page(vec![1], None, 2, 2).next_offset(), None);
        assert_eq!(page(vec![], None, 0, 2).next_offset(), None);
    }

    #[test]
    fn test_validate_limit() {
        assert!(ListOptions::new().limit(200).validate(200).is_ok());
        assert!(ListOptions::new().limit(201).validate(200).is_err());
        assert!(ListOptions::new().limit(0).validate(200).is_err());
        assert!(ListOptions::new().validate(200).is_ok());
    }

    #[tokio::test]
    async fn test_collect_all_follows_offsets() {
        let data: Vec<u32> = (0..5).collect();
        let mut calls = 0;

        let all = collect_all(ListOptions::new().limit(2), |opts| {
            calls += 1;
            let offset = opts.offset.unwrap_or(0) as usize;
            let limit = opts.limit.unwrap_or(2) as usize;
            let items = data.iter().skip(offset).take(limit).copied().collect();
            async move { Ok::<_, ApiError>(page(items, Some(5), offset as u64, limit as u64)) }
        })
        .await
        .unwrap();

        assert_eq!(all, vec![0, 1, 2, 3, 4]);
        assert_eq!(calls, 3);
    }
}
