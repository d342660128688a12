// file: src/discovery/pagination.rs
// description: page-number pagination shared by every provider
// reference: provider list endpoints with a next-page sentinel

use crate::error::Result;
use std::future::Future;
use tracing::{debug, warn};

pub const PAGE_SIZE: u32 = 100;
pub const FIRST_PAGE: u32 = 1;

/// One page of a provider listing. `next` is `None` once the provider
/// reports there is nothing left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<u32>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next: Option<u32>) -> Self {
        Self { items, next }
    }

    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next: self.next,
        }
    }
}

/// Requests pages starting at [`FIRST_PAGE`] until the sentinel is seen and
/// returns the union of every page in order. The first failing page aborts
/// the listing.
pub async fn collect_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut page = Some(FIRST_PAGE);

    while let Some(number) = page {
        let mut fetched = fetch(number).await?;
        debug!(page = number, count = fetched.items.len(), "fetched page");
        items.append(&mut fetched.items);

        page = match fetched.next {
            Some(next) if next <= number => {
                warn!(page = number, next, "provider returned a non-advancing page, stopping");
                None
            }
            next => next,
        };
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConnectError;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn numbered_pages(k: u32, per_page: u32) -> impl FnMut(u32) -> std::future::Ready<Result<Page<u32>>> {
        move |number| {
            let start = (number - 1) * per_page;
            let items = (start..start + per_page).collect();
            let next = if number < k { Some(number + 1) } else { None };
            std::future::ready(Ok(Page::new(items, next)))
        }
    }

    #[tokio::test]
    async fn test_collects_union_of_all_pages() {
        for k in [1, 2, 7] {
            let items = collect_pages(numbered_pages(k, PAGE_SIZE)).await.unwrap();
            assert_eq!(items.len() as u32, k * PAGE_SIZE);
            assert_eq!(items, (0..k * PAGE_SIZE).collect::<Vec<_>>());
        }
    }

    #[tokio::test]
    async fn test_stops_after_sentinel() {
        let requested = Mutex::new(Vec::new());
        let items = collect_pages(|number| {
            requested.lock().unwrap().push(number);
            let next = if number < 3 { Some(number + 1) } else { None };
            std::future::ready(Ok(Page::new(vec![number], next)))
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(*requested.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let items: Vec<String> = collect_pages(|_| std::future::ready(Ok(Page::last(vec![]))))
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_non_advancing_page_terminates() {
        let items = collect_pages(|number| std::future::ready(Ok(Page::new(vec![number], Some(1)))))
            .await
            .unwrap();
        assert_eq!(items, vec![1]);
    }

    #[tokio::test]
    async fn test_error_aborts_listing() {
        let result = collect_pages(|number| {
            std::future::ready(if number == 2 {
                Err(ConnectError::provider("fake", "page 2 exploded"))
            } else {
                Ok(Page::new(vec![number], Some(number + 1)))
            })
        })
        .await;

        assert!(matches!(result, Err(ConnectError::Provider { .. })));
    }
}
