use crate::cache::GameInfoCache;
use crate::{GameId, GameInfo};
use chrono::Local;
use failure::Error;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;

pub const DB_FILE_NAME: &str = "games.db";

/// Game info cache store.
pub struct DbConn {
    conn: Connection,
}

impl DbConn {
    /// Opens the db, creating file and table when missing.
    pub fn open(path: &Path) -> Result<DbConn, Error> {
        let conn = Connection::open(path)?;
        DbConn::initialize(conn)
    }

    pub fn in_memory() -> Result<DbConn, Error> {
        let conn = Connection::open_in_memory()?;
        DbConn::initialize(conn)
    }

    fn initialize(conn: Connection) -> Result<DbConn, Error> {
        conn.execute(
            "create table if not exists games (
                id integer primary key,
                name text not null,
                expansion integer,
                updated datetime
             )",
            [],
        )?;
        Ok(DbConn { conn })
    }

    pub fn load_cache(&self) -> Result<GameInfoCache, Error> {
        let mut stmt = self.conn.prepare("select id, name, expansion from games")?;
        let iter = stmt.query_map([], |r| {
            let id: GameId = r.get(0)?;
            Ok((id, GameInfo { name: r.get(1)?, is_expansion: r.get(2)? }))
        })?;
        let mut entries = HashMap::new();
        for entry in iter {
            let (id, info) = entry?;
            entries.insert(id, info);
        }
        Ok(GameInfoCache::from_entries(entries))
    }

    /// Writes every cached entry, replacing rows with the same id.
    pub fn save_cache(&mut self, cache: &GameInfoCache) -> Result<(), Error> {
        let tx = self.conn.transaction()?;
        let now = Local::now().to_string();
        for (id, info) in cache.entries() {
            tx.execute("insert or replace into games (id, name, expansion, updated)
                values (?1, ?2, ?3, ?4)",
                params![id, info.name, info.is_expansion, now])?;
        }
        tx.commit()?;
        Ok(())
    }
}
