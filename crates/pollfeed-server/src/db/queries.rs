//! SQL for the messages table.
//!
//! `created_at` is stored as UTC milliseconds since the Unix epoch.

/// Record layout. AUTOINCREMENT keeps ids from ever being reused.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    author     TEXT    NOT NULL CHECK (length(author) <= 150),
    body       TEXT    NOT NULL CHECK (length(body) BETWEEN 1 AND 4000),
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_created_at ON messages (created_at);
"#;

/// Parameters: ?1 = author, ?2 = body, ?3 = created_at
pub const INSERT_MESSAGE: &str = r#"
INSERT INTO messages (author, body, created_at) VALUES (?1, ?2, ?3)
"#;

pub const LAST_CREATED_AT: &str = r#"
SELECT created_at FROM messages ORDER BY id DESC LIMIT 1
"#;

/// Parameters: ?1 = cursor (exclusive), ?2 = limit
pub const MESSAGES_SINCE: &str = r#"
SELECT id, author, body, created_at
FROM messages
WHERE id > ?1
ORDER BY id ASC
LIMIT ?2
"#;

/// Newest first; callers reverse. Parameters: ?1 = count
pub const MESSAGES_RECENT: &str = r#"
SELECT id, author, body, created_at
FROM messages
ORDER BY id DESC
LIMIT ?1
"#;

pub const STATS: &str = r#"
SELECT COUNT(*), COALESCE(MAX(id), 0) FROM messages
"#;
