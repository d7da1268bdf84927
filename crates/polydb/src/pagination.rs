//! Page windows for chunked reads.

use crate::dialect::Dialect;

/// Helper column added by the Oracle row-number wrap; stripped from results.
pub(crate) const ORACLE_ROWNUM_COLUMN: &str = "chunk_rn";

/// Which slice of a result set to read.
///
/// `page_number` starts at 1. `start` shifts the window by a number of rows,
/// which is how "load more" style paging skips rows already shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page_number: i64,
    pub records_per_page: i64,
    pub start: i64,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            page_number: 1,
            records_per_page: 50,
            start: 0,
        }
    }
}

/// A resolved zero-based window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub offset: u64,
    pub length: u64,
}

impl PageWindow {
    pub fn new(page_number: i64, records_per_page: i64) -> Self {
        Self {
            page_number,
            records_per_page,
            start: 0,
        }
    }

    pub fn start(mut self, start: i64) -> Self {
        self.start = start;
        self
    }

    /// Build a window from request parameters.
    ///
    /// Page and size must be made of ASCII digits only, otherwise they are
    /// recorded as `0` and the window resolves to nothing. A `start` that is
    /// not all digits counts as `0`.
    pub fn parse(page_number: &str, records_per_page: &str, start: &str) -> Self {
        fn digits(s: &str) -> Option<i64> {
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            s.parse().ok()
        }

        Self {
            page_number: digits(page_number).unwrap_or(0),
            records_per_page: digits(records_per_page).unwrap_or(0),
            start: digits(start).unwrap_or(0),
        }
    }

    /// Offset and length of the window, or `None` when page or size is not
    /// positive or the window's end does not fit in a `u64`. A negative
    /// `start` counts as `0`.
    pub fn bounds(&self) -> Option<Bounds> {
        if self.page_number < 1 || self.records_per_page < 1 {
            return None;
        }
        let start = self.start.max(0) as u64;
        let page = self.page_number as u64;
        let length = self.records_per_page as u64;
        let offset = (page - 1).checked_mul(length)?.checked_add(start)?;
        offset.checked_add(length)?;
        Some(Bounds { offset, length })
    }
}

/// Restrict `sql` to `bounds`.
///
/// MySQL appends `LIMIT/OFFSET`. Oracle wraps the query twice, since a
/// `ROWNUM` filter cannot express a lower bound on the same level it is
/// assigned.
pub fn paginate(dialect: Dialect, sql: &str, bounds: Bounds) -> String {
    let Bounds { offset, length } = bounds;
    match dialect {
        Dialect::MySql => format!("{sql} LIMIT {length} OFFSET {offset}"),
        Dialect::Oracle => format!(
            "SELECT * FROM ( SELECT chunk_t.*, ROWNUM {rn} FROM ( {sql} ) chunk_t \
             WHERE ROWNUM <= {upper} ) WHERE {rn} >= {lower}",
            rn = ORACLE_ROWNUM_COLUMN,
            upper = offset.saturating_add(length),
            lower = offset.saturating_add(1),
        ),
    }
}
