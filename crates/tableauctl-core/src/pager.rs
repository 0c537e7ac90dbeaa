//! Lazy iteration over paginated listings

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde_json::Value;

use crate::error::{HookError, Result};
use crate::resource::Resource;
use crate::server::{DEFAULT_PAGE_SIZE, Page, TableauServer};

/// Walks every item of a listing, one page request at a time
///
/// Nothing is fetched until the stream is polled. Each call to
/// [`stream`](Self::stream) starts over from the first page.
///
/// ```rust,ignore
/// use futures::TryStreamExt;
///
/// let pager = hook.get_all("workbooks")?;
/// let mut items = pager.stream();
/// while let Some(workbook) = items.try_next().await? {
///     println!("{}", workbook["name"]);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Pager {
    server: TableauServer,
    resource: Resource,
    page_size: u32,
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    page_number: u32,
    fetched: u64,
}

impl Pager {
    pub(crate) fn new(server: TableauServer, resource: Resource) -> Self {
        Self {
            server,
            resource,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Items requested per page
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    /// Stream of items, fetching pages as they are consumed
    pub fn stream(&self) -> BoxStream<'static, Result<Value>> {
        let server = self.server.clone();
        let resource = self.resource;
        let page_size = self.page_size;
        let start = Some(Cursor {
            page_number: 1,
            fetched: 0,
        });

        stream::try_unfold(start, move |cursor| {
            let server = server.clone();
            async move {
                let Some(cursor) = cursor else {
                    return Ok(None);
                };
                let page = server
                    .list_page(resource, cursor.page_number, page_size)
                    .await?;
                let next = next_cursor(cursor, &page, page_size);
                Ok::<_, HookError>(Some((page.items, next)))
            }
        })
        .map_ok(|items| stream::iter(items.into_iter().map(Ok::<Value, HookError>)))
        .try_flatten()
        .boxed()
    }

    /// Drain the whole listing into memory
    pub async fn collect_all(&self) -> Result<Vec<Value>> {
        self.stream().try_collect().await
    }
}

/// Decide whether another page is needed after `page`
fn next_cursor(cursor: Cursor, page: &Page, page_size: u32) -> Option<Cursor> {
    let fetched = cursor.fetched + page.items.len() as u64;
    // A server that ignores pageNumber would repeat the same page forever
    let exhausted = match page.total_available {
        _ if page.items.is_empty() => true,
        _ if page.page_number != cursor.page_number => true,
        Some(total) => fetched >= total,
        None => page.items.len() < page_size as usize,
    };

    (!exhausted).then(|| Cursor {
        page_number: cursor.page_number + 1,
        fetched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(number: u32, n: usize, total: Option<u64>) -> Page {
        Page {
            items: (0..n).map(|i| json!({ "id": i })).collect(),
            page_number: number,
            page_size: 2,
            total_available: total,
        }
    }

    #[test]
    fn test_stops_when_total_reached() {
        let start = Cursor {
            page_number: 1,
            fetched: 0,
        };
        let next = next_cursor(start, &page(1, 2, Some(3)), 2).unwrap();
        assert_eq!(next.page_number, 2);
        assert_eq!(next.fetched, 2);

        assert!(next_cursor(next, &page(2, 1, Some(3)), 2).is_none());
    }

    #[test]
    fn test_stops_on_empty_page() {
        let start = Cursor {
            page_number: 4,
            fetched: 6,
        };
        assert!(next_cursor(start, &page(4, 0, Some(100)), 2).is_none());
        assert!(next_cursor(start, &page(4, 0, None), 2).is_none());
    }

    #[test]
    fn test_without_total_uses_short_page() {
        let start = Cursor {
            page_number: 1,
            fetched: 0,
        };
        assert!(next_cursor(start, &page(1, 2, None), 2).is_some());
        assert!(next_cursor(start, &page(1, 1, None), 2).is_none());
    }

    #[test]
    fn test_stops_when_server_repeats_a_page() {
        let second = Cursor {
            page_number: 2,
            fetched: 2,
        };
        assert!(next_cursor(second, &page(1, 2, None), 2).is_none());
        assert!(next_cursor(second, &page(2, 2, None), 2).is_some());
    }
}
