//! SQLite-backed ordered store.
//!
//! Each table is one SQLite table of JSON bodies keyed by the serialized table
//! primary key. Scans read key attributes with `json_extract` and resume with
//! row-value comparisons, so integer keys sort before text keys exactly as
//! [`KeyValue`] orders them.

use crate::error::{StoreError, StoreResult};
use crate::query::{CountPage, PageQuery, RawPage, SortOrder};
use crate::schema::TableSchema;
use crate::{DEFAULT_MAX_PAGE_ITEMS, PartitionStore};
use async_trait::async_trait;
use rangepage_types::{Item, KeyValue};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params, params_from_iter};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Store for one table inside a SQLite database.
pub struct SqliteStore {
    schema: TableSchema,
    max_page_items: usize,
    conn: Arc<Mutex<Connection>>,
}

/// A statement and its positional parameters.
#[derive(Debug)]
struct Statement {
    sql: String,
    params: Vec<SqlValue>,
}

impl SqliteStore {
    /// Opens (or creates) the table inside the database at `path`.
    pub fn open(path: &Path, schema: TableSchema) -> StoreResult<Self> {
        schema.validate()?;
        let conn = Connection::open(path)?;
        Self::with_connection(conn, schema)
    }

    /// Opens the table in a private in-memory database (for testing).
    pub fn open_in_memory(schema: TableSchema) -> StoreResult<Self> {
        schema.validate()?;
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, schema)
    }

    fn with_connection(conn: Connection, schema: TableSchema) -> StoreResult<Self> {
        let store = Self {
            schema,
            max_page_items: DEFAULT_MAX_PAGE_ITEMS,
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Caps the rows a single fetch may examine.
    #[must_use]
    pub fn with_max_page_items(mut self, max: usize) -> Self {
        self.max_page_items = max.max(1);
        self
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = lock(&self.conn)?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (
                pk TEXT NOT NULL,
                sk TEXT NOT NULL,
                body TEXT NOT NULL,
                PRIMARY KEY (pk, sk)
            );",
            self.schema.name
        ))?;
        Ok(())
    }

    /// Inserts or replaces an item by its table primary key.
    pub fn put(&self, item: Item) -> StoreResult<()> {
        self.put_all([item]).map(|_| ())
    }

    /// Inserts every item in one transaction.
    pub fn put_all(&self, items: impl IntoIterator<Item = Item>) -> StoreResult<usize> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR REPLACE INTO \"{}\" (pk, sk, body) VALUES (?1, ?2, ?3)",
                self.schema.name
            ))?;
            for item in items {
                let (pk, sk) = self.schema.primary_key_of(&item)?;
                stmt.execute(params![
                    serde_json::to_string(&pk)?,
                    serde_json::to_string(&sk)?,
                    serde_json::to_string(&item)?,
                ])?;
                written += 1;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    /// Builds the shared `FROM ... WHERE ...` part of a scan.
    fn scan_clause(&self, query: &PageQuery) -> StoreResult<Statement> {
        let index = query.index.as_deref();
        let keys = self.schema.key_attributes(index)?;
        let order = self.schema.scan_order(index)?;

        let mut sql = format!(
            "FROM \"{}\" WHERE {} = ?",
            self.schema.name,
            extract(keys.partition)
        );
        let mut params = vec![to_sql(&query.partition)];

        for attribute in &order {
            sql.push_str(&format!(
                " AND json_type(body, '{}') IN ('integer', 'text')",
                json_path(attribute)
            ));
        }

        if let Some(point) = &query.start_after {
            let position = self.schema.scan_key_of_point(point, index)?;
            let columns: Vec<String> = order.iter().map(|a| extract(a)).collect();
            let marks = vec!["?"; position.len()].join(", ");
            let op = match query.order {
                SortOrder::Ascending => ">",
                SortOrder::Descending => "<",
            };
            sql.push_str(&format!(" AND ({}) {op} ({marks})", columns.join(", ")));
            params.extend(position.iter().map(to_sql));
        }

        Ok(Statement { sql, params })
    }

    fn page_statement(&self, query: &PageQuery, limit: usize) -> StoreResult<Statement> {
        let order = self.schema.scan_order(query.index.as_deref())?;
        let direction = match query.order {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };
        let order_by: Vec<String> = order
            .iter()
            .map(|a| format!("{} {direction}", extract(a)))
            .collect();

        let clause = self.scan_clause(query)?;
        let mut params = clause.params;
        // One extra row tells whether anything remains after the page.
        params.push(SqlValue::Integer(limit as i64 + 1));
        Ok(Statement {
            sql: format!(
                "SELECT body {} ORDER BY {} LIMIT ?",
                clause.sql,
                order_by.join(", ")
            ),
            params,
        })
    }

    fn limit_for(&self, query: &PageQuery) -> usize {
        query
            .limit
            .unwrap_or(self.max_page_items)
            .clamp(1, self.max_page_items)
    }
}

#[async_trait]
impl PartitionStore for SqliteStore {
    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    async fn query(&self, query: &PageQuery) -> StoreResult<RawPage> {
        let limit = self.limit_for(query);
        let statement = self.page_statement(query, limit)?;
        let conn = self.conn.clone();

        let bodies = tokio::task::spawn_blocking(move || -> StoreResult<Vec<String>> {
            let conn = lock(&conn)?;
            let mut stmt = conn.prepare(&statement.sql)?;
            let rows = stmt.query_map(params_from_iter(statement.params.iter()), |row| {
                row.get::<_, String>(0)
            })?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))??;

        let has_more = bodies.len() > limit;
        let mut rows = bodies
            .iter()
            .take(limit)
            .map(|body| serde_json::from_str::<Item>(body))
            .collect::<Result<Vec<_>, _>>()?;

        let next = match rows.last() {
            Some(last) if has_more => Some(self.schema.position_of(last, query.index.as_deref())?),
            _ => None,
        };
        let scanned = rows.len();
        if let Some(filter) = &query.filter {
            rows.retain(|item| filter.matches(item));
        }

        debug!(
            "sqlite query on {} partition {}: {} of {} rows kept, more={}",
            self.schema.name,
            query.partition,
            rows.len(),
            scanned,
            next.is_some()
        );
        Ok(RawPage {
            items: rows,
            scanned,
            next,
        })
    }

    /// Counts the whole remaining partition in one statement; the returned
    /// page never has a `next` position.
    async fn count(&self, query: &PageQuery) -> StoreResult<CountPage> {
        let clause = self.scan_clause(query)?;
        let mut params = clause.params;
        let mut filtered = String::from("COUNT(*)");
        if let Some(filter) = &query.filter {
            if filter.attribute.contains(['"', '\'', '\\']) {
                return Err(StoreError::InvalidData(format!(
                    "invalid filter attribute name: {:?}",
                    filter.attribute
                )));
            }
            filtered = format!(
                "COALESCE(SUM(CASE WHEN {} = ? THEN 1 ELSE 0 END), 0)",
                extract(&filter.attribute)
            );
            params.insert(0, SqlValue::Text(filter.value.clone()));
        }
        let sql = format!("SELECT {filtered}, COUNT(*) {}", clause.sql);
        let conn = self.conn.clone();

        let (count, scanned) = tokio::task::spawn_blocking(move || -> StoreResult<(i64, i64)> {
            let conn = lock(&conn)?;
            let counts = conn.query_row(&sql, params_from_iter(params.iter()), |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })?;
            Ok(counts)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))??;

        Ok(CountPage {
            count: count.max(0) as u64,
            scanned: scanned.max(0) as u64,
            next: None,
        })
    }
}

fn lock(conn: &Mutex<Connection>) -> StoreResult<std::sync::MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| StoreError::Unavailable("sqlite connection lock poisoned".into()))
}

/// JSON path for a top-level attribute, quoted for `json_extract`.
fn json_path(attribute: &str) -> String {
    format!("$.\"{attribute}\"")
}

fn extract(attribute: &str) -> String {
    format!("json_extract(body, '{}')", json_path(attribute))
}

fn to_sql(value: &KeyValue) -> SqlValue {
    match value {
        KeyValue::Int(n) => SqlValue::Integer(*n),
        KeyValue::Text(s) => SqlValue::Text(s.clone()),
    }
}
