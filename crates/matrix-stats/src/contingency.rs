//! 2×2 contingency tables.
//!
//! ```text
//!              col 1   col 2
//!   row 1        a       b      n1 = a + b
//!   row 2        c       d      n2 = c + d
//!              m1      m2       n
//! ```
//!
//! Rows are the two groups being compared (e.g. treatment and control),
//! columns are the two outcomes (e.g. success and failure).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A validated 2×2 table of non-negative counts with a non-zero grand total.
///
/// The grand total fits in an `i64`, so every margin does too.
///
/// # Examples
///
/// ```
/// use matrix_stats::contingency::Table2x2;
///
/// let table = Table2x2::new(&[[12, 8], [6, 14]]).unwrap();
/// assert_eq!(table.row_totals(), (20, 20));
/// assert_eq!(table.col_totals(), (18, 22));
/// assert_eq!(table.total(), 40);
///
/// assert!(Table2x2::new(&[[1, -1], [0, 0]]).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<i64>>", into = "[[i64; 2]; 2]")]
pub struct Table2x2 {
    a: i64,
    b: i64,
    c: i64,
    d: i64,
}

impl Table2x2 {
    /// Builds a table from `[[a, b], [c, d]]`.
    ///
    /// Fails with a domain error naming the cell when a count is negative,
    /// when every count is zero, or when the grand total overflows `i64`.
    pub fn new(cells: &[[i64; 2]; 2]) -> Result<Self> {
        for (i, row) in cells.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                if value < 0 {
                    return Err(Error::domain(format!(
                        "cell [{i}][{j}] must be non-negative, got {value}"
                    )));
                }
            }
        }
        let [[a, b], [c, d]] = *cells;
        let total = a
            .checked_add(b)
            .and_then(|t| t.checked_add(c))
            .and_then(|t| t.checked_add(d))
            .ok_or_else(|| {
                Error::domain(format!(
                    "table grand total overflows i64: [[{a}, {b}], [{c}, {d}]]"
                ))
            })?;
        if total == 0 {
            return Err(Error::domain("table grand total must be positive, got 0"));
        }
        Ok(Self { a, b, c, d })
    }

    /// Builds a table from rows of arbitrary length, checking the shape first.
    ///
    /// This is the entry point for untyped input (JSON, table columns).
    ///
    /// # Examples
    ///
    /// ```
    /// use matrix_stats::contingency::Table2x2;
    ///
    /// let rows = vec![vec![1, 2], vec![3, 4]];
    /// assert!(Table2x2::from_rows(&rows).is_ok());
    ///
    /// let err = Table2x2::from_rows(&[vec![1, 2, 3], vec![3, 4, 5]]).unwrap_err();
    /// assert!(err.is_shape());
    /// ```
    pub fn from_rows<R>(rows: &[R]) -> Result<Self>
    where
        R: AsRef<[i64]>,
    {
        if rows.len() != 2 {
            return Err(Error::shape(format!(
                "contingency table must have exactly 2 rows, got {}",
                rows.len()
            )));
        }
        let mut cells = [[0; 2]; 2];
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != 2 {
                return Err(Error::shape(format!(
                    "row {i} of contingency table must have exactly 2 columns, got {}",
                    row.len()
                )));
            }
            cells[i] = [row[0], row[1]];
        }
        Self::new(&cells)
    }

    /// Builds a table from two rows of counts, without further validation
    /// than the grand total.
    ///
    /// Used internally when enumerating candidate tables whose counts are
    /// non-negative by construction.
    pub(crate) fn from_groups(x1: i64, n1: i64, x2: i64, n2: i64) -> Self {
        debug_assert!((0..=n1).contains(&x1) && (0..=n2).contains(&x2));
        Self {
            a: x1,
            b: n1 - x1,
            c: x2,
            d: n2 - x2,
        }
    }

    #[must_use]
    pub fn a(&self) -> i64 {
        self.a
    }

    #[must_use]
    pub fn b(&self) -> i64 {
        self.b
    }

    #[must_use]
    pub fn c(&self) -> i64 {
        self.c
    }

    #[must_use]
    pub fn d(&self) -> i64 {
        self.d
    }

    /// Returns `(n1, n2)`, the totals of the first and second row.
    #[must_use]
    pub fn row_totals(&self) -> (i64, i64) {
        (self.a + self.b, self.c + self.d)
    }

    /// Returns `(m1, m2)`, the totals of the first and second column.
    #[must_use]
    pub fn col_totals(&self) -> (i64, i64) {
        (self.a + self.c, self.b + self.d)
    }

    #[must_use]
    pub fn total(&self) -> i64 {
        self.a + self.b + self.c + self.d
    }

    #[must_use]
    pub fn cells(&self) -> [[i64; 2]; 2] {
        [[self.a, self.b], [self.c, self.d]]
    }
}

impl TryFrom<Vec<Vec<i64>>> for Table2x2 {
    type Error = Error;

    fn try_from(rows: Vec<Vec<i64>>) -> Result<Self> {
        Self::from_rows(&rows)
    }
}

impl From<Table2x2> for [[i64; 2]; 2] {
    fn from(table: Table2x2) -> Self {
        table.cells()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_cell_is_named() {
        let err = Table2x2::new(&[[1, 2], [-4, 3]]).unwrap_err();
        assert!(err.is_domain());
        assert!(err.message().contains("[1][0]"), "{err}");
        assert!(err.message().contains("-4"), "{err}");
    }

    #[test]
    fn test_zero_total_is_rejected() {
        let err = Table2x2::new(&[[0, 0], [0, 0]]).unwrap_err();
        assert!(err.is_domain());
    }

    #[test]
    fn test_overflowing_total_is_rejected() {
        let err = Table2x2::new(&[[i64::MAX, 1], [0, 0]]).unwrap_err();
        assert!(err.is_domain());
        assert!(err.message().contains("overflows"), "{err}");

        let table = Table2x2::new(&[[i64::MAX - 3, 1], [1, 1]]).unwrap();
        assert_eq!(table.total(), i64::MAX);
        assert_eq!(table.col_totals(), (i64::MAX - 2, 2));
    }

    #[test]
    fn test_wrong_row_count_is_shape_error() {
        let err = Table2x2::from_rows(&[vec![1, 2]]).unwrap_err();
        assert!(err.is_shape());
        let err = Table2x2::from_rows(&[vec![1, 2], vec![3, 4], vec![5, 6]]).unwrap_err();
        assert!(err.is_shape());
    }

    #[test]
    fn test_wrong_column_count_names_row() {
        let err = Table2x2::from_rows(&[vec![1, 2], vec![3]]).unwrap_err();
        assert!(err.is_shape());
        assert!(err.message().contains("row 1"), "{err}");
    }

    #[test]
    fn test_totals() {
        let table = Table2x2::new(&[[1, 9], [11, 3]]).unwrap();
        assert_eq!(table.row_totals(), (10, 14));
        assert_eq!(table.col_totals(), (12, 12));
        assert_eq!(table.total(), 24);
    }

    #[test]
    fn test_json_roundtrip_validates() {
        let table: Table2x2 = serde_json::from_str("[[3, 1], [1, 3]]").unwrap();
        assert_eq!(table.cells(), [[3, 1], [1, 3]]);
        assert_eq!(serde_json::to_string(&table).unwrap(), "[[3,1],[1,3]]");

        assert!(serde_json::from_str::<Table2x2>("[[3, -1], [1, 3]]").is_err());
        assert!(serde_json::from_str::<Table2x2>("[[3, 1, 2], [1, 3, 4]]").is_err());
    }
}
