use std::ops::Range;

pub(super) const ROWS_OPTIONS: [usize; 4] = [10, 25, 50, 100];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct Pagination {
    pub(super) page: usize,
    pub(super) rows_per_page: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 0,
            rows_per_page: ROWS_OPTIONS[0],
        }
    }
}

impl Pagination {
    pub(super) fn reset(&mut self) {
        self.page = 0;
    }

    pub(super) fn set_rows_per_page(&mut self, rows: usize) {
        if rows != self.rows_per_page {
            self.rows_per_page = rows.max(1);
            self.page = 0;
        }
    }

    pub(super) fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.rows_per_page.max(1)).max(1)
    }

    /// Row range of the current page, with the page clamped into bounds.
    pub(super) fn page_range(&mut self, total: usize) -> Range<usize> {
        self.page = self.page.min(self.page_count(total) - 1);
        let start = (self.page * self.rows_per_page).min(total);
        start..(start + self.rows_per_page).min(total)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn pages_cover_all_rows() {
        let mut pagination = Pagination::default();
        assert_eq!(pagination.page_count(0), 1);
        assert_eq!(pagination.page_count(25), 3);
        assert_eq!(pagination.page_range(25), 0..10);

        pagination.page = 2;
        assert_eq!(pagination.page_range(25), 20..25);
    }

    #[test]
    fn out_of_range_page_is_clamped() {
        let mut pagination = Pagination {
            page: 9,
            rows_per_page: 25,
        };
        assert_eq!(pagination.page_range(30), 25..30);
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.page_range(0), 0..0);
        assert_eq!(pagination.page, 0);
    }

    #[test]
    fn changing_page_size_returns_to_first_page() {
        let mut pagination = Pagination {
            page: 3,
            rows_per_page: 10,
        };
        pagination.set_rows_per_page(10);
        assert_eq!(pagination.page, 3);
        pagination.set_rows_per_page(50);
        assert_eq!(pagination, Pagination { page: 0, rows_per_page: 50 });
    }
}
