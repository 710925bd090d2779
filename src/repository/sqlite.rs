use super::{Entity, PersistenceError, PersistenceResult, Repository, assign_id};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::marker::PhantomData;
use std::path::Path;

/// Stores each record as a JSON body in a table named after `T::KIND`.
pub struct SqliteRepository<T> {
    connection: Mutex<Connection>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> SqliteRepository<T> {
    pub fn open<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> PersistenceResult<Self> {
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
            _entity: PhantomData,
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                body_json TEXT NOT NULL
            );
            "#,
            table = T::KIND
        );
        connection.execute_batch(&ddl)?;
        Ok(())
    }
}

impl<T: Entity> Repository<T> for SqliteRepository<T> {
    fn get(&self, id: &str) -> PersistenceResult<Option<T>> {
        let conn = self.connection.lock();
        let sql = format!("SELECT body_json FROM {} WHERE id = ?1", T::KIND);
        let json: Option<String> = conn
            .query_row(&sql, params![id], |row| row.get(0))
            .optional()?;
        json.map(|j| serde_json::from_str(&j).map_err(PersistenceError::from))
            .transpose()
    }

    fn list(&self) -> PersistenceResult<Vec<T>> {
        let conn = self.connection.lock();
        let mut stmt =
            conn.prepare(&format!("SELECT body_json FROM {} ORDER BY seq ASC", T::KIND))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut items = Vec::new();
        for json in rows {
            let json = json?;
            items.push(serde_json::from_str(&json)?);
        }
        Ok(items)
    }

    fn create(&self, mut item: T) -> PersistenceResult<T> {
        let id = assign_id(&mut item);
        let json = serde_json::to_string(&item)?;
        let conn = self.connection.lock();
        let sql = format!("INSERT INTO {} (id, body_json) VALUES (?1, ?2)", T::KIND);
        match conn.execute(&sql, params![id, json]) {
            Ok(_) => Ok(item),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(PersistenceError::Duplicate { kind: T::KIND, id: id.clone() })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn update(&self, id: &str, mut item: T) -> PersistenceResult<T> {
        item.set_id(id.to_string());
        let json = serde_json::to_string(&item)?;
        let conn = self.connection.lock();
        let sql = format!("UPDATE {} SET body_json = ?2 WHERE id = ?1", T::KIND);
        let changed = conn.execute(&sql, params![id, json])?;
        if changed == 0 {
            return Err(PersistenceError::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            });
        }
        Ok(item)
    }

    fn delete(&self, id: &str) -> PersistenceResult<bool> {
        let conn = self.connection.lock();
        let sql = format!("DELETE FROM {} WHERE id = ?1", T::KIND);
        let removed = conn.execute(&sql, params![id])?;
        Ok(removed > 0)
    }
}
