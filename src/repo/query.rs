//! Filter-to-SQL translation shared by every repository.
//!
//! Repositories describe their table once with [`Table`] and turn their
//! filter structs into [`Conditions`]; the builders here produce
//! parameterized statements and run them on the caller's connection.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::ListOpts;

/// A bindable parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Uuid(Uuid),
    Text(String),
    Int(i64),
    Bool(bool),
    Bytes(Vec<u8>),
    Time(DateTime<Utc>),
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Time(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

fn push_value(qb: &mut QueryBuilder<'static, Sqlite>, value: &Value) {
    match value.clone() {
        Value::Null => {
            qb.push_bind(Option::<String>::None);
        }
        Value::Uuid(v) => {
            qb.push_bind(v);
        }
        Value::Text(v) => {
            qb.push_bind(v);
        }
        Value::Int(v) => {
            qb.push_bind(v);
        }
        Value::Bool(v) => {
            qb.push_bind(v);
        }
        Value::Bytes(v) => {
            qb.push_bind(v);
        }
        Value::Time(v) => {
            qb.push_bind(v);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    In(&'static str, Vec<Value>),
    Eq(&'static str, Value),
    Like(&'static str, String),
    IsNull(&'static str),
}

/// Conjunction of predicate fragments keyed by column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    preds: Vec<Predicate>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// `column IN (...)`. An empty set adds no predicate at all.
    pub fn any_of<V, I>(mut self, column: &'static str, values: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if !values.is_empty() {
            self.preds.push(Predicate::In(column, values));
        }
        self
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.preds.push(Predicate::Eq(column, value.into()));
        self
    }

    pub fn eq_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.eq(column, v),
            None => self,
        }
    }

    /// `column LIKE pattern`, with `\` as the escape character. Absent or
    /// empty patterns add nothing.
    pub fn like(mut self, column: &'static str, pattern: Option<&str>) -> Self {
        if let Some(p) = pattern.filter(|p| !p.is_empty()) {
            self.preds.push(Predicate::Like(column, p.to_string()));
        }
        self
    }

    pub fn is_null(mut self, column: &'static str) -> Self {
        self.preds.push(Predicate::IsNull(column));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.preds.is_empty()
    }

    fn push_where(&self, qb: &mut QueryBuilder<'static, Sqlite>) {
        for (i, pred) in self.preds.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            match pred {
                Predicate::In(column, values) => {
                    qb.push(*column).push(" IN (");
                    for (j, value) in values.iter().enumerate() {
                        if j > 0 {
                            qb.push(", ");
                        }
                        push_value(qb, value);
                    }
                    qb.push(")");
                }
                Predicate::Eq(column, value) => {
                    qb.push(*column).push(" = ");
                    push_value(qb, value);
                }
                Predicate::Like(column, pattern) => {
                    qb.push(*column).push(" LIKE ");
                    qb.push_bind(pattern.clone());
                    qb.push(" ESCAPE '\\'");
                }
                Predicate::IsNull(column) => {
                    qb.push(*column).push(" IS NULL");
                }
            }
        }
    }
}

/// Escapes LIKE wildcards so `text` matches literally inside a pattern.
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn select(
    columns: &str,
    from: &str,
    conds: &Conditions,
    order_by: &str,
    page: ListOpts,
) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(format!("SELECT {} FROM {}", columns, from));
    conds.push_where(&mut qb);
    if !order_by.is_empty() {
        qb.push(" ORDER BY ").push(order_by);
    }
    if let Some((limit, offset)) = page.limit_offset() {
        qb.push(" LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);
    }
    qb
}

pub fn count(from: &str, conds: &Conditions) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", from));
    conds.push_where(&mut qb);
    qb
}

pub fn insert(table: &str, values: &[(&str, Value)]) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(format!("INSERT INTO {} (", table));
    let columns: Vec<&str> = values.iter().map(|(column, _)| *column).collect();
    qb.push(columns.join(", ")).push(") VALUES (");
    for (i, (_, value)) in values.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        push_value(&mut qb, value);
    }
    qb.push(")");
    qb
}

pub fn update(
    table: &str,
    values: &[(&str, Value)],
    conds: &Conditions,
) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(format!("UPDATE {} SET ", table));
    for (i, (column, value)) in values.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(*column).push(" = ");
        push_value(&mut qb, value);
    }
    conds.push_where(&mut qb);
    qb
}

pub fn delete(table: &str, conds: &Conditions) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new(format!("DELETE FROM {}", table));
    conds.push_where(&mut qb);
    qb
}

/// Static description of an entity table.
#[derive(Debug, Clone, Copy)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub order_by: &'static str,
}

impl Table {
    /// Table-qualified column list, e.g. `tags.id, tags.name`.
    pub fn column_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!("{}.{}", self.name, c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub async fn list<T>(
        &self,
        conn: &mut SqliteConnection,
        conds: &Conditions,
        page: ListOpts,
    ) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let mut qb = select(&self.column_list(), self.name, conds, self.order_by, page);
        let rows = qb.build_query_as::<T>().fetch_all(&mut *conn).await?;
        Ok(rows)
    }

    pub async fn count(&self, conn: &mut SqliteConnection, conds: &Conditions) -> Result<i64> {
        let mut qb = count(self.name, conds);
        let n = qb.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;
        Ok(n)
    }

    pub async fn find<T>(&self, conn: &mut SqliteConnection, id: Uuid) -> Result<Option<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let conds = Conditions::new().eq("id", id);
        let mut qb = select(&self.column_list(), self.name, &conds, "", ListOpts::default());
        let row = qb.build_query_as::<T>().fetch_optional(&mut *conn).await?;
        Ok(row)
    }

    pub async fn insert(&self, conn: &mut SqliteConnection, values: &[(&str, Value)]) -> Result<u64> {
        let mut qb = insert(self.name, values);
        let result = qb.build().execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }

    /// Full-row update by id. Returns the affected-row count.
    pub async fn update(
        &self,
        conn: &mut SqliteConnection,
        id: Uuid,
        values: &[(&str, Value)],
    ) -> Result<u64> {
        self.update_where(conn, values, &Conditions::new().eq("id", id))
            .await
    }

    pub async fn update_where(
        &self,
        conn: &mut SqliteConnection,
        values: &[(&str, Value)],
        conds: &Conditions,
    ) -> Result<u64> {
        if conds.is_empty() {
            return Err(AppError::Internal(format!(
                "refusing unconditioned update on {}",
                self.name
            )));
        }
        let mut qb = update(self.name, values, conds);
        let result = qb.build().execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(&self, conn: &mut SqliteConnection, conds: &Conditions) -> Result<u64> {
        if conds.is_empty() {
            return Err(AppError::Internal(format!(
                "refusing unconditioned delete on {}",
                self.name
            )));
        }
        let mut qb = delete(self.name, conds);
        let result = qb.build().execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THINGS: Table = Table {
        name: "things",
        columns: &["id", "name"],
        order_by: "things.name",
    };

    #[test]
    fn test_empty_set_adds_no_predicate() {
        let conds = Conditions::new().any_of("id", Vec::<Uuid>::new());
        assert!(conds.is_empty());

        let qb = select(&THINGS.column_list(), THINGS.name, &conds, "", ListOpts::default());
        assert_eq!(qb.sql(), "SELECT things.id, things.name FROM things");
    }

    #[test]
    fn test_predicates_joined_with_and() {
        let conds = Conditions::new()
            .any_of("id", vec![Uuid::new_v4(), Uuid::new_v4()])
            .like("name", Some("wo%"))
            .is_null("parent_id");
        let qb = select("*", "things", &conds, "name", ListOpts::default());
        let sql = qb.sql();

        assert!(sql.contains(" WHERE id IN ("));
        assert!(sql.contains(" AND name LIKE "));
        assert!(sql.contains(" AND parent_id IS NULL"));
        assert!(sql.ends_with(" ORDER BY name"));
    }

    #[test]
    fn test_like_declares_escape() {
        let conds = Conditions::new().like("name", Some("a%"));
        let qb = select("*", "things", &conds, "", ListOpts::default());
        assert!(qb.sql().contains(" WHERE name LIKE "));
        assert!(qb.sql().ends_with(" ESCAPE '\\'"));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn test_empty_pattern_is_ignored() {
        let conds = Conditions::new().like("name", Some("")).like("name", None);
        assert!(conds.is_empty());
    }

    #[test]
    fn test_eq_opt() {
        assert!(Conditions::new().eq_opt::<i64>("level", None).is_empty());
        assert!(!Conditions::new().eq_opt("level", Some(0i64)).is_empty());
    }

    #[test]
    fn test_pagination_after_order() {
        let qb = select("*", "things", &Conditions::new(), "name", ListOpts::new(2, 5));
        let sql = qb.sql();
        let order = sql.find("ORDER BY").unwrap();
        let limit = sql.find("LIMIT").unwrap();
        assert!(order < limit);
        assert!(sql.contains("OFFSET"));
    }

    #[test]
    fn test_count_has_no_order() {
        let conds = Conditions::new().eq("name", "a");
        let qb = count("things", &conds);
        assert!(qb.sql().starts_with("SELECT COUNT(*) FROM things WHERE name = "));
        assert!(!qb.sql().contains("ORDER BY"));
    }

    #[test]
    fn test_insert_and_update_shape() {
        let values = vec![("id", Value::from(Uuid::new_v4())), ("name", Value::from("x"))];
        let qb = insert("things", &values);
        assert!(qb.sql().starts_with("INSERT INTO things (id, name) VALUES ("));

        let qb = update("things", &values, &Conditions::new().eq("id", Uuid::new_v4()));
        assert!(qb.sql().starts_with("UPDATE things SET id = "));
        assert!(qb.sql().contains(", name = "));
        assert!(qb.sql().contains(" WHERE id = "));
    }

    #[test]
    fn test_option_value() {
        assert_eq!(Value::from(None::<Uuid>), Value::Null);
        let id = Uuid::new_v4();
        assert_eq!(Value::from(Some(id)), Value::Uuid(id));
    }
}
