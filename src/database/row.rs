//! Mapping result-set rows to typed values.

use serde_json::Value;
use thiserror::Error;

use crate::driver::ResultSet;
use crate::error::DbError;

/// Failure while turning a row into a typed value.
#[derive(Debug, Error)]
pub enum RowMapError {
    /// A column held something the mapper could not use.
    #[error("column {index}: {message}")]
    Column { index: usize, message: String },

    /// The driver failed while the rows were being read.
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Maps the current row of a result set to a `T`.
pub trait RowMapper<T>: Send + Sync {
    fn map(&self, row: &dyn ResultSet) -> Result<T, RowMapError>;
}

/// Any matching closure is a row mapper.
impl<T, F> RowMapper<T> for F
where
    F: Fn(&dyn ResultSet) -> Result<T, RowMapError> + Send + Sync,
{
    fn map(&self, row: &dyn ResultSet) -> Result<T, RowMapError> {
        self(row)
    }
}

/// Drive the cursor to exhaustion, mapping every row.
pub async fn map_rows<T>(
    rows: &mut dyn ResultSet,
    mapper: &dyn RowMapper<T>,
) -> Result<Vec<T>, RowMapError> {
    let mut mapped = Vec::new();
    while rows.next().await? {
        mapped.push(mapper.map(&*rows)?);
    }
    Ok(mapped)
}

/// Text column as a trimmed string; NULL becomes the empty string.
pub fn string_cell(row: &dyn ResultSet, index: usize) -> Result<String, RowMapError> {
    match row.get(index)? {
        Value::Null => Ok(String::new()),
        Value::String(text) => Ok(text.trim().to_string()),
        other => Err(RowMapError::Column {
            index,
            message: format!("expected text, got {other}"),
        }),
    }
}

/// Integer column as an `i64`.
pub fn i64_cell(row: &dyn ResultSet, index: usize) -> Result<i64, RowMapError> {
    let value = row.get(index)?;
    value.as_i64().ok_or_else(|| RowMapError::Column {
        index,
        message: format!("expected an integer, got {value}"),
    })
}

/// Boolean column.
pub fn bool_cell(row: &dyn ResultSet, index: usize) -> Result<bool, RowMapError> {
    let value = row.get(index)?;
    value.as_bool().ok_or_else(|| RowMapError::Column {
        index,
        message: format!("expected a boolean, got {value}"),
    })
}

/// Array column as `Vec<i64>`; NULL becomes an empty vector.
pub fn i64_list(value: &Value, index: usize) -> Result<Vec<i64>, RowMapError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_i64().ok_or_else(|| RowMapError::Column {
                    index,
                    message: format!("expected an integer element, got {item}"),
                })
            })
            .collect(),
        other => Err(RowMapError::Column {
            index,
            message: format!("expected an array, got {other}"),
        }),
    }
}

/// Array column as `Vec<String>`; NULL becomes an empty vector.
pub fn string_list(value: &Value, index: usize) -> Result<Vec<String>, RowMapError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => Ok(text.clone()),
                other => Err(RowMapError::Column {
                    index,
                    message: format!("expected a text element, got {other}"),
                }),
            })
            .collect(),
        other => Err(RowMapError::Column {
            index,
            message: format!("expected an array, got {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::ConnectionSource;
    use crate::driver::{Connection, Statement};
    use crate::testing::{MockProvider, options};
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    struct Account {
        id: i64,
        name: String,
    }

    struct AccountMapper;

    impl RowMapper<Account> for AccountMapper {
        fn map(&self, row: &dyn ResultSet) -> Result<Account, RowMapError> {
            Ok(Account {
                id: i64_cell(row, 0)?,
                name: string_cell(row, 1)?,
            })
        }
    }

    async fn result_set_with(rows: Vec<Vec<Value>>) -> Box<dyn ResultSet> {
        let provider = MockProvider::new();
        let script = provider.script();
        script.set_rows(rows);

        let source = ConnectionSource::connect(Box::new(provider), options())
            .await
            .unwrap();
        let mut conn = source.acquire().await.unwrap();
        let mut statement = conn.create_statement().await.unwrap();
        statement.execute_query("SELECT id, name FROM accounts").await.unwrap()
    }

    #[tokio::test]
    async fn maps_typed_rows() {
        let mut rows = result_set_with(vec![
            vec![json!(1), json!("  alice ")],
            vec![json!(2), json!("bob")],
        ])
        .await;

        let accounts = map_rows(&mut *rows, &AccountMapper).await.unwrap();
        assert_eq!(
            accounts,
            vec![
                Account { id: 1, name: "alice".into() },
                Account { id: 2, name: "bob".into() },
            ]
        );
    }

    #[tokio::test]
    async fn null_text_becomes_empty_string() {
        let mut rows = result_set_with(vec![vec![json!(3), Value::Null]]).await;

        let accounts = map_rows(&mut *rows, &AccountMapper).await.unwrap();
        assert_eq!(accounts, vec![Account { id: 3, name: String::new() }]);
    }

    #[tokio::test]
    async fn column_mismatch_carries_position() {
        let mut rows = result_set_with(vec![vec![json!("not-a-number"), json!("carol")]]).await;

        let err = map_rows(&mut *rows, &AccountMapper).await.unwrap_err();
        assert!(matches!(err, RowMapError::Column { index: 0, .. }));
    }

    #[tokio::test]
    async fn closures_are_mappers() {
        let mut rows = result_set_with(vec![vec![json!(9), json!("dave")]]).await;

        let names = map_rows(&mut *rows, &|row: &dyn ResultSet| string_cell(row, 1))
            .await
            .unwrap();
        assert_eq!(names, vec!["dave".to_string()]);
    }

    #[test]
    fn list_helpers_accept_null_and_arrays() {
        assert_eq!(i64_list(&Value::Null, 0).unwrap(), Vec::<i64>::new());
        assert_eq!(i64_list(&json!([1, 2, 3]), 0).unwrap(), vec![1, 2, 3]);
        assert_eq!(
            string_list(&json!(["a", "b"]), 0).unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(string_list(&json!(7), 0).is_err());
    }
}
