//! Named numeric columns, the input shape of the column-oriented engines.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Read access to a table of `f64` columns of equal length.
///
/// Missing cells are represented as NaN.
pub trait NumericTable {
    fn row_count(&self) -> usize;

    /// Column names in table order.
    fn column_names(&self) -> Vec<&str>;

    fn column(&self, name: &str) -> Option<&[f64]>;

    fn column_count(&self) -> usize {
        self.column_names().len()
    }

    /// Like [`Self::column`], but a missing column is a shape error.
    fn require_column(&self, name: &str) -> Result<&[f64]> {
        self.column(name).ok_or_else(|| {
            Error::shape(format!(
                "no column named {name:?}; available: {}",
                self.column_names().join(", ")
            ))
        })
    }

    /// Builds one point per row from the named columns, in the given order.
    ///
    /// # Examples
    ///
    /// ```
    /// use matrix_stats::table::{ColumnTable, NumericTable};
    ///
    /// let table = ColumnTable::new(vec![
    ///     ("x".to_owned(), vec![1.0, 2.0]),
    ///     ("y".to_owned(), vec![3.0, 4.0]),
    /// ])
    /// .unwrap();
    /// assert_eq!(table.points(&["y", "x"]).unwrap(), vec![vec![3.0, 1.0], vec![4.0, 2.0]]);
    /// ```
    fn points(&self, names: &[&str]) -> Result<Vec<Vec<f64>>> {
        if names.is_empty() {
            return Err(Error::shape("at least one column must be selected"));
        }
        let columns = names
            .iter()
            .map(|name| self.require_column(name))
            .collect::<Result<Vec<_>>>()?;
        Ok((0..self.row_count())
            .map(|row| columns.iter().map(|column| column[row]).collect())
            .collect())
    }
}

/// A named column as it appears in JSON. `null` cells become NaN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// An ordered list of named columns of equal length.
///
/// Deserializes from `[{"name": "x", "values": [1.0, null, 3.0]}, ...]`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(try_from = "Vec<Column>")]
pub struct ColumnTable {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl ColumnTable {
    /// Builds a table, rejecting duplicate names and unequal lengths.
    pub fn new(columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let mut table = Self::default();
        for (name, values) in columns {
            table.push_column(name, values)?;
        }
        Ok(table)
    }

    /// Appends a column.
    pub fn push_column(&mut self, name: String, values: Vec<f64>) -> Result<()> {
        if self.names.contains(&name) {
            return Err(Error::shape(format!("duplicate column name {name:?}")));
        }
        if let Some(first) = self.columns.first()
            && first.len() != values.len()
        {
            return Err(Error::shape(format!(
                "column {name:?} has {} rows, expected {}",
                values.len(),
                first.len()
            )));
        }
        self.names.push(name);
        self.columns.push(values);
        Ok(())
    }
}

impl NumericTable for ColumnTable {
    fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    fn column_names(&self) -> Vec<&str> {
        self.names.iter().map(String::as_str).collect()
    }

    fn column(&self, name: &str) -> Option<&[f64]> {
        let index = self.names.iter().position(|n| n == name)?;
        Some(&self.columns[index])
    }
}

impl TryFrom<Vec<Column>> for ColumnTable {
    type Error = Error;

    fn try_from(columns: Vec<Column>) -> Result<Self> {
        Self::new(
            columns
                .into_iter()
                .map(|c| {
                    let values = c.values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
                    (c.name, values)
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ColumnTable {
        ColumnTable::new(vec![
            ("height".to_owned(), vec![1.6, 1.8, 1.7]),
            ("weight".to_owned(), vec![55.0, 80.0, 70.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_accessors() {
        let table = sample();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.column_names(), vec!["height", "weight"]);
        assert_eq!(table.column("weight"), Some(&[55.0, 80.0, 70.0][..]));
        assert_eq!(table.column("age"), None);
    }

    #[test]
    fn test_missing_column_is_shape_error() {
        let err = sample().points(&["height", "age"]).unwrap_err();
        assert!(err.is_shape());
        assert!(err.message().contains("\"age\""), "{err}");
        assert!(sample().points(&[]).unwrap_err().is_shape());
    }

    #[test]
    fn test_rejects_bad_columns() {
        let mut table = sample();
        assert!(table.push_column("height".to_owned(), vec![0.0; 3]).unwrap_err().is_shape());
        assert!(table.push_column("age".to_owned(), vec![0.0; 2]).unwrap_err().is_shape());
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn test_deserialize_with_nulls() {
        let json = r#"[
            {"name": "x", "values": [1.0, null, 3.0]},
            {"name": "y", "values": [4, 5, 6]}
        ]"#;
        let table: ColumnTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.row_count(), 3);
        assert!(table.column("x").unwrap()[1].is_nan());
        assert_eq!(table.column("y").unwrap(), &[4.0, 5.0, 6.0]);

        let ragged = r#"[{"name": "x", "values": [1.0]}, {"name": "y", "values": []}]"#;
        assert!(serde_json::from_str::<ColumnTable>(ragged).is_err());
    }
}
