//! Entry repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide upsert/get/delete/list APIs over the `entries` table.
//! - Fold optional filter criteria into a single SQL conjunction.
//! - Notify live list subscribers after every effective write.
//!
//! # Invariants
//! - Lists are ordered by `date DESC, id ASC`.
//! - Upsert of an unknown non-zero id inserts a row under that id.
//! - Deleting a missing id is a no-op and does not notify subscribers.
//! - All statements run under one connection lock, so writes on the same id
//!   are serialized.

use crate::db::migrations::{latest_version, schema_version};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::entry::{Entry, EntryCriteria, EntryId, UNSAVED_ENTRY_ID};
use crate::repo::entry_watch::{ChangeFeed, EntryListWatch};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    date,
    client_name,
    quantity,
    price
FROM entries";

const ENTRY_ORDER_SQL: &str = " ORDER BY date DESC, id ASC";

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-layer failure for entry persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    /// SQLite transport or constraint failure.
    Db(DbError),
    /// Entry ids must be zero (unsaved) or positive.
    InvalidId(EntryId),
    /// Connection was handed over before migrations reached this binary's
    /// schema version.
    SchemaNotReady { found: u32, expected: u32 },
    /// A previous holder of the connection lock panicked.
    ConnectionPoisoned,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidId(id) => write!(f, "invalid entry id: {id}"),
            Self::SchemaNotReady { found, expected } => write!(
                f,
                "entry schema not ready: found version {found}, expected {expected}"
            ),
            Self::ConnectionPoisoned => write!(f, "entry store connection lock poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for entry persistence.
pub trait EntryRepository {
    /// Inserts (`id == 0`) or replaces the entry and returns its id.
    fn upsert(&self, entry: &Entry) -> RepoResult<EntryId>;
    /// Returns `None` when no row has this id.
    fn get_by_id(&self, id: EntryId) -> RepoResult<Option<Entry>>;
    /// Removes the row with `entry.id`, if any.
    fn delete(&self, entry: &Entry) -> RepoResult<()>;
    fn list_all(&self) -> RepoResult<Vec<Entry>>;
    fn list_filtered(&self, criteria: &EntryCriteria) -> RepoResult<Vec<Entry>>;
    /// Receiver that observes every effective write to the table.
    fn subscribe_changes(&self) -> watch::Receiver<u64>;

    /// Live subscription over the full list.
    fn watch_all(&self) -> EntryListWatch<Self>
    where
        Self: Clone + Sized,
    {
        EntryListWatch::new(self.clone(), EntryCriteria::default())
    }

    /// Live subscription over a filtered list.
    fn watch_filtered(&self, criteria: EntryCriteria) -> EntryListWatch<Self>
    where
        Self: Clone + Sized,
    {
        EntryListWatch::new(self.clone(), criteria)
    }
}

/// SQLite-backed entry repository.
///
/// Cloning yields another handle on the same connection and change feed.
#[derive(Clone)]
pub struct SqliteEntryRepository {
    conn: Arc<Mutex<Connection>>,
    changes: ChangeFeed,
}

impl SqliteEntryRepository {
    /// Wraps a connection after checking its schema is fully migrated.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        let found = schema_version(&conn)?;
        let expected = latest_version();
        if found != expected {
            return Err(RepoError::SchemaNotReady { found, expected });
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            changes: ChangeFeed::new(),
        })
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens (and migrates) a private in-memory database.
    pub fn open_in_memory() -> RepoResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    /// Current value of the change feed.
    pub fn version(&self) -> u64 {
        self.changes.version()
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> RepoResult<T>) -> RepoResult<T> {
        let conn = self.conn.lock().map_err(|_| RepoError::ConnectionPoisoned)?;
        f(&*conn)
    }

    fn query_entries(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Entry>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let mut rows = stmt.query(params_from_iter(bind_values))?;
            let mut entries = Vec::new();
            while let Some(row) = rows.next()? {
                entries.push(parse_entry_row(row)?);
            }
            Ok(entries)
        })
    }
}

impl EntryRepository for SqliteEntryRepository {
    fn upsert(&self, entry: &Entry) -> RepoResult<EntryId> {
        if entry.id < UNSAVED_ENTRY_ID {
            return Err(RepoError::InvalidId(entry.id));
        }

        let id = self.with_conn(|conn| {
            if entry.is_persisted() {
                conn.execute(
                    "INSERT INTO entries (id, date, client_name, quantity, price)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(id) DO UPDATE SET
                        date = excluded.date,
                        client_name = excluded.client_name,
                        quantity = excluded.quantity,
                        price = excluded.price;",
                    params![
                        entry.id,
                        entry.date,
                        entry.client_name.as_str(),
                        entry.quantity,
                        entry.price,
                    ],
                )?;
                Ok(entry.id)
            } else {
                conn.execute(
                    "INSERT INTO entries (date, client_name, quantity, price)
                     VALUES (?1, ?2, ?3, ?4);",
                    params![
                        entry.date,
                        entry.client_name.as_str(),
                        entry.quantity,
                        entry.price,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            }
        })?;

        self.changes.publish();
        debug!(
            "event=entry_upsert module=repo status=ok entry_id={} mode={}",
            id,
            if entry.is_persisted() { "update" } else { "insert" }
        );
        Ok(id)
    }

    fn get_by_id(&self, id: EntryId) -> RepoResult<Option<Entry>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{ENTRY_SELECT_SQL} WHERE id = ?1;"))?;
            let mut rows = stmt.query([id])?;
            match rows.next()? {
                Some(row) => Ok(Some(parse_entry_row(row)?)),
                None => Ok(None),
            }
        })
    }

    fn delete(&self, entry: &Entry) -> RepoResult<()> {
        let changed = self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM entries WHERE id = ?1;", [entry.id])?)
        })?;

        if changed > 0 {
            self.changes.publish();
        }
        debug!(
            "event=entry_delete module=repo status=ok entry_id={} removed={}",
            entry.id, changed
        );
        Ok(())
    }

    fn list_all(&self) -> RepoResult<Vec<Entry>> {
        self.query_entries(&format!("{ENTRY_SELECT_SQL}{ENTRY_ORDER_SQL}"), Vec::new())
    }

    fn list_filtered(&self, criteria: &EntryCriteria) -> RepoResult<Vec<Entry>> {
        let (sql, bind_values) = build_filtered_query(criteria);
        self.query_entries(&sql, bind_values)
    }

    fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

/// Builds the list statement, binding only the predicates that are present.
fn build_filtered_query(criteria: &EntryCriteria) -> (String, Vec<Value>) {
    let mut sql = format!("{ENTRY_SELECT_SQL} WHERE 1 = 1");
    let mut bind_values: Vec<Value> = Vec::new();

    if let Some(needle) = criteria.client_name_needle() {
        sql.push_str(" AND client_name LIKE ? ESCAPE '\\'");
        bind_values.push(Value::Text(format!("%{}%", escape_like(needle))));
    }

    let bounds = [
        ("date >= ?", criteria.date_from.map(Value::Integer)),
        ("date <= ?", criteria.date_to.map(Value::Integer)),
        ("quantity >= ?", criteria.quantity_min.map(Value::Integer)),
        ("quantity <= ?", criteria.quantity_max.map(Value::Integer)),
        ("price >= ?", criteria.price_min.map(Value::Real)),
        ("price <= ?", criteria.price_max.map(Value::Real)),
    ];
    for (clause, value) in bounds {
        if let Some(value) = value {
            sql.push_str(" AND ");
            sql.push_str(clause);
            bind_values.push(value);
        }
    }

    sql.push_str(ENTRY_ORDER_SQL);
    (sql, bind_values)
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<Entry> {
    Ok(Entry {
        id: row.get("id")?,
        date: row.get("date")?,
        client_name: row.get("client_name")?,
        quantity: row.get("quantity")?,
        price: row.get("price")?,
    })
}

#[cfg(test)]
mod tests {
    use super::{build_filtered_query, escape_like};
    use crate::model::entry::EntryCriteria;
    use rusqlite::types::Value;

    #[test]
    fn unrestricted_criteria_binds_nothing() {
        let (sql, binds) = build_filtered_query(&EntryCriteria::default());
        assert!(binds.is_empty());
        assert!(sql.ends_with("WHERE 1 = 1 ORDER BY date DESC, id ASC"));
    }

    #[test]
    fn only_present_predicates_are_folded() {
        let criteria = EntryCriteria {
            client_name: Some(" an ".to_string()),
            quantity_max: Some(20),
            price_min: Some(1.5),
            ..EntryCriteria::default()
        };
        let (sql, binds) = build_filtered_query(&criteria);

        assert!(sql.contains("client_name LIKE ? ESCAPE"));
        assert!(sql.contains("quantity <= ?"));
        assert!(sql.contains("price >= ?"));
        assert!(!sql.contains("date >= ?"));
        assert_eq!(
            binds,
            vec![
                Value::Text("%an%".to_string()),
                Value::Integer(20),
                Value::Real(1.5),
            ]
        );
    }

    #[test]
    fn escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
