//!
//! src/paginate.rs
//!
//! Pull-based iterator over a cursor-paged collection. Yields the
//! current page in order and fetches the next page only once the
//! current one is exhausted.
//!

use crate::errors::ExportError;
use crate::types::Page;

pub struct PageIter<T, F> {
    items: std::vec::IntoIter<T>,
    next: Option<String>,
    fetch_next: F,
    failed: bool,
}

impl<T, F> PageIter<T, F>
where
    F: FnMut(&str) -> Result<Page<T>, ExportError>,
{
    pub fn new(first: Page<T>, fetch_next: F) -> Self {
        Self {
            items: first.items.into_iter(),
            next: first.next,
            fetch_next,
            failed: false,
        }
    }
}

impl<T, F> Iterator for PageIter<T, F>
where
    F: FnMut(&str) -> Result<Page<T>, ExportError>,
{
    type Item = Result<T, ExportError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(item) = self.items.next() {
                return Some(Ok(item));
            }
            // page exhausted; follow the cursor or terminate
            let cursor = self.next.take()?;
            match (self.fetch_next)(&cursor) {
                Ok(page) => {
                    self.items = page.items.into_iter();
                    self.next = page.next;
                }
                Err(e) => {
                    // a page-fetch failure is fatal to the caller
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
