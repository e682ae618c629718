//! Optional message and room archive
//!
//! The archive is a fire-and-forget sqlite store: inserts run in spawned
//! tasks so a broadcast is never delayed by disk I/O, and insert failures
//! are logged and dropped. The server is fully functional with no archive
//! configured; nothing reads the archive back at runtime.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use uuid::Uuid;

use parlor_common::protocol::{ChatMessage, RoomInfo};

/// Create the messages table
const SQL_CREATE_MESSAGES: &str = "CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    room_id TEXT,
    sender TEXT NOT NULL,
    kind TEXT NOT NULL,
    body TEXT NOT NULL,
    sent_at INTEGER NOT NULL
)";

/// Create the rooms table
const SQL_CREATE_ROOMS: &str = "CREATE TABLE IF NOT EXISTS rooms (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    created_by TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    deleted_at INTEGER
)";

/// Insert one routed message
///
/// **Parameters:** id, room_id, sender, kind, body, sent_at
const SQL_INSERT_MESSAGE: &str =
    "INSERT INTO messages (id, room_id, sender, kind, body, sent_at) VALUES (?, ?, ?, ?, ?, ?)";

/// Record a room creation
///
/// **Parameters:** id, name, description, created_by, created_at
const SQL_INSERT_ROOM: &str = "INSERT OR REPLACE INTO rooms \
    (id, name, description, created_by, created_at, deleted_at) VALUES (?, ?, ?, ?, ?, NULL)";

/// Mark a room deleted
///
/// **Parameters:** deleted_at, id
const SQL_MARK_ROOM_DELETED: &str = "UPDATE rooms SET deleted_at = ? WHERE id = ?";

/// Fire-and-forget sqlite archive for messages and room lifecycle
#[derive(Debug, Clone)]
pub struct Archive {
    pool: SqlitePool,
}

impl Archive {
    /// Open (creating if missing) an archive database at the given path
    pub async fn open(path: &Path) -> sqlx::Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let archive = Self { pool };
        archive.migrate().await?;
        Ok(archive)
    }

    /// Open an in-memory archive (tests)
    #[cfg(test)]
    pub async fn open_in_memory() -> sqlx::Result<Self> {
        let options = SqliteConnectOptions::new().in_memory(true);
        // A single connection keeps the in-memory database alive and shared
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let archive = Self { pool };
        archive.migrate().await?;
        Ok(archive)
    }

    async fn migrate(&self) -> sqlx::Result<()> {
        sqlx::query(SQL_CREATE_MESSAGES).execute(&self.pool).await?;
        sqlx::query(SQL_CREATE_ROOMS).execute(&self.pool).await?;
        Ok(())
    }

    /// Record a routed message without blocking the caller
    pub fn record_message(&self, message: &ChatMessage) {
        let archive = self.clone();
        let message = message.clone();
        tokio::spawn(async move {
            if let Err(e) = archive.insert_message(&message).await {
                eprintln!("Archive message write failed: {}", e);
            }
        });
    }

    /// Record a room creation without blocking the caller
    pub fn record_room_created(&self, room: &RoomInfo) {
        let archive = self.clone();
        let room = room.clone();
        tokio::spawn(async move {
            if let Err(e) = archive.insert_room(&room).await {
                eprintln!("Archive room write failed: {}", e);
            }
        });
    }

    /// Record a room deletion without blocking the caller
    pub fn record_room_deleted(&self, room_id: &str) {
        let archive = self.clone();
        let room_id = room_id.to_string();
        let deleted_at = chrono::Utc::now().timestamp_millis();
        tokio::spawn(async move {
            if let Err(e) = archive.mark_room_deleted(&room_id, deleted_at).await {
                eprintln!("Archive room delete failed: {}", e);
            }
        });
    }

    async fn insert_message(&self, message: &ChatMessage) -> sqlx::Result<()> {
        sqlx::query(SQL_INSERT_MESSAGE)
            .bind(Uuid::new_v4().to_string())
            .bind(message.room_id.as_deref())
            .bind(&message.sender)
            .bind(message.kind.to_string())
            .bind(&message.body)
            .bind(message.sent_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_room(&self, room: &RoomInfo) -> sqlx::Result<()> {
        sqlx::query(SQL_INSERT_ROOM)
            .bind(&room.id)
            .bind(&room.name)
            .bind(room.description.as_deref())
            .bind(&room.created_by)
            .bind(room.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_room_deleted(&self, room_id: &str, deleted_at: i64) -> sqlx::Result<()> {
        sqlx::query(SQL_MARK_ROOM_DELETED)
            .bind(deleted_at)
            .bind(room_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
