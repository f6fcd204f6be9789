use rusqlite::{Connection, OptionalExtension};

use stagequest_core::records::ProgressSnapshot;
use stagequest_core::{Stage, StageSet, UserId};

use crate::error::StorageError;
use crate::traits::ProgressStore;

pub struct SqliteProgressStore {
    conn: Connection,
}

impl SqliteProgressStore {
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        crate::schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

fn encode_set(set: &StageSet, label: &str) -> Result<Vec<u8>, StorageError> {
    set.to_msgpack()
        .map_err(|e| StorageError::Serialization(format!("{label}: {e}")))
}

fn decode_set(bytes: &[u8], label: &str) -> Result<StageSet, StorageError> {
    StageSet::from_msgpack(bytes)
        .map_err(|e| StorageError::Serialization(format!("{label}: {e}")))
}

impl ProgressStore for SqliteProgressStore {
    fn load(&self, user_id: UserId) -> Result<Option<ProgressSnapshot>, StorageError> {
        let row = self
            .conn
            .query_row(
                "SELECT solved, first_step_solved, current_stage FROM progress WHERE user_id = ?1",
                [user_id.as_bytes().as_slice()],
                |row| {
                    let solved: Vec<u8> = row.get(0)?;
                    let first_step: Vec<u8> = row.get(1)?;
                    let current: Option<u8> = row.get(2)?;
                    Ok((solved, first_step, current))
                },
            )
            .optional()?;

        let Some((solved_bytes, first_step_bytes, current)) = row else {
            return Ok(None);
        };

        let current_stage = match current {
            Some(n) => Some(Stage::new(n)?),
            None => None,
        };

        Ok(Some(ProgressSnapshot {
            solved: decode_set(&solved_bytes, "solved")?,
            first_step_solved: decode_set(&first_step_bytes, "first_step_solved")?,
            current_stage,
        }))
    }

    fn save(&mut self, user_id: UserId, snapshot: &ProgressSnapshot) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO progress (user_id, solved, first_step_solved, current_stage, updated_at)
             VALUES (?1, ?2, ?3, ?4, CAST(unixepoch('now','subsec') * 1000 AS INTEGER))
             ON CONFLICT (user_id) DO UPDATE SET
                 solved = excluded.solved,
                 first_step_solved = excluded.first_step_solved,
                 current_stage = excluded.current_stage,
                 updated_at = excluded.updated_at",
            rusqlite::params![
                user_id.as_bytes().as_slice(),
                encode_set(&snapshot.solved, "solved")?,
                encode_set(&snapshot.first_step_solved, "first_step_solved")?,
                snapshot.current_stage.map(|s| s.number()),
            ],
        )?;
        Ok(())
    }

    fn clear(&mut self, user_id: UserId) -> Result<(), StorageError> {
        self.conn.execute(
            "DELETE FROM progress WHERE user_id = ?1",
            [user_id.as_bytes().as_slice()],
        )?;
        Ok(())
    }
}
