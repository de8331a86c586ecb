use super::{PersistenceResult, SettingsStore};
use crate::WorkSettings;
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::Mutex;

pub struct SqliteSettingsStore {
    connection: Mutex<Connection>,
}

impl SqliteSettingsStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::from_connection(connection)
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> PersistenceResult<Self> {
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS work_settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                settings_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }
}

impl SettingsStore for SqliteSettingsStore {
    fn save_settings(&self, settings: &WorkSettings) -> PersistenceResult<()> {
        super::validate_settings(settings)?;
        let json = serde_json::to_string(settings)?;
        let mut conn = self.connection.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM work_settings", [])?;
        tx.execute(
            "INSERT INTO work_settings (id, settings_json) VALUES (1, ?1)",
            params![json],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn load_settings(&self) -> PersistenceResult<Option<WorkSettings>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn.prepare("SELECT settings_json FROM work_settings WHERE id = 1")?;
        let json_opt: Option<String> = stmt.query_row([], |row| row.get(0)).optional()?;

        let Some(json) = json_opt else {
            return Ok(None);
        };

        let settings: WorkSettings = serde_json::from_str(&json)?;
        super::validate_settings(&settings)?;
        Ok(Some(settings))
    }
}
