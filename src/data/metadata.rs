//! Page metadata

use serde::Serialize;

/// Paging summary returned alongside every list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub current_page: i64,
    pub page_size: i64,
    pub first_page: i64,
    pub last_page: i64,
    pub total_records: i64,
}

impl Metadata {
    /// Compute metadata for `total_records` rows split into pages of
    /// `page_size`.
    ///
    /// `page_size` must be at least 1, which [`FilterSpec`] guarantees.
    /// `last_page` is 0 when there are no records at all.
    ///
    /// [`FilterSpec`]: super::FilterSpec
    pub fn compute(total_records: i64, page: i64, page_size: i64) -> Self {
        debug_assert!(page_size >= 1, "page_size must be at least 1");

        let last_page = if total_records <= 0 {
            0
        } else {
            (total_records + page_size - 1) / page_size
        };

        Self {
            current_page: page,
            page_size,
            first_page: 1,
            last_page,
            total_records: total_records.max(0),
        }
    }
}

/// One page of entities plus its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub metadata: Metadata,
}

impl<T> PaginatedResult<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_records_means_no_last_page() {
        for page in [1, 2, 500] {
            let metadata = Metadata::compute(0, page, 20);
            assert_eq!(metadata.last_page, 0);
            assert_eq!(metadata.first_page, 1);
            assert_eq!(metadata.current_page, page);
        }
    }

    #[test]
    fn last_page_rounds_up() {
        assert_eq!(Metadata::compute(1, 1, 20).last_page, 1);
        assert_eq!(Metadata::compute(20, 1, 20).last_page, 1);
        assert_eq!(Metadata::compute(21, 1, 20).last_page, 2);
        assert_eq!(Metadata::compute(100, 1, 1).last_page, 100);
    }

    #[test]
    fn last_page_brackets_total_records() {
        for page_size in 1..=100 {
            for total in 1..=250 {
                let metadata = Metadata::compute(total, 1, page_size);
                assert!(metadata.last_page * page_size >= total);
                assert!((metadata.last_page - 1) * page_size < total);
            }
        }
    }

    #[test]
    fn metadata_serializes_with_snake_case_keys() {
        let json = serde_json::to_value(Metadata::compute(45, 2, 20)).unwrap();
        assert_eq!(json["last_page"], 3);
        assert_eq!(json["total_records"], 45);
        assert_eq!(json["current_page"], 2);
    }
}
