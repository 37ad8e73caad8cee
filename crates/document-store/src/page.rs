use serde::{Deserialize, Serialize};

use crate::{DocumentStoreError, Result};

/// Zero-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pageable {
    page: u32,
    size: u32,
}

impl Pageable {
    /// Creates a page request. The page size must be positive.
    pub fn new(page: u32, size: u32) -> Result<Self> {
        if size == 0 {
            return Err(DocumentStoreError::InvalidPageable(
                "page size must be greater than zero".to_string(),
            ));
        }
        Ok(Self { page, size })
    }

    /// Zero-indexed page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Maximum number of documents per page.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of documents preceding this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Documents on this page.
    pub content: Vec<T>,

    /// Number of documents matching the query across all pages.
    pub total_elements: u64,

    /// Zero-indexed page number.
    pub page: u32,

    /// Requested page size; for unpaged results, the number of documents.
    pub size: u32,
}

impl<T> Page<T> {
    /// Builds a page for a paged request.
    pub fn new(content: Vec<T>, total_elements: u64, pageable: Pageable) -> Self {
        Self {
            content,
            total_elements,
            page: pageable.page(),
            size: pageable.size(),
        }
    }

    /// Builds a single page holding every result.
    pub fn unpaged(content: Vec<T>) -> Self {
        let total = content.len();
        Self {
            content,
            total_elements: total as u64,
            page: 0,
            size: u32::try_from(total).unwrap_or(u32::MAX),
        }
    }

    /// Number of pages needed to hold every matching document.
    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total_elements.div_ceil(u64::from(self.size))
    }

    /// Converts the page's content, keeping the paging information.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            page: self.page,
            size: self.size,
        }
    }

    /// Fallible variant of [`Page::map`].
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> std::result::Result<U, E>) -> std::result::Result<Page<U>, E> {
        Ok(Page {
            content: self.content.into_iter().map(f).collect::<std::result::Result<_, _>>()?,
            total_elements: self.total_elements,
            page: self.page,
            size: self.size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pageable_offset() {
        let pageable = Pageable::new(2, 10).unwrap();
        assert_eq!(pageable.offset(), 20);
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(matches!(
            Pageable::new(0, 0),
            Err(DocumentStoreError::InvalidPageable(_))
        ));
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = Page::new(vec![1, 2, 3], 21, Pageable::new(0, 10).unwrap());
        assert_eq!(page.total_pages(), 3);
    }

    #[test]
    fn unpaged_holds_everything() {
        let page = Page::unpaged(vec!["a", "b"]);
        assert_eq!(page.total_elements, 2);
        assert_eq!(page.size, 2);
        assert_eq!(page.total_pages(), 1);

        let empty: Page<u8> = Page::unpaged(Vec::new());
        assert_eq!(empty.total_pages(), 0);
    }

    #[test]
    fn try_map_keeps_paging() {
        let page = Page::new(vec!["1", "2"], 12, Pageable::new(1, 2).unwrap());
        let mapped: Page<u32> = page.try_map(|s| s.parse::<u32>()).unwrap();
        assert_eq!(mapped.content, vec![1, 2]);
        assert_eq!(mapped.total_elements, 12);
        assert_eq!(mapped.page, 1);
    }
}
