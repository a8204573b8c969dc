//! Versioned schema migrations.
//!
//! Unlike a single-tenant schema, every namespace gets its own set of
//! tables (a table-name prefix standing in for the source system's
//! Postgres schema-per-agent layout). Each migration is a SQL template
//! with a `{ns}` placeholder substituted with the sanitised namespace
//! before execution. Progress is tracked per-namespace in the shared
//! `schema_version` table so re-opening an existing namespace is a no-op.

pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub up: &'static str,
}

/// Namespaced tables: memories, embeddings, FTS, sessions, edges, KV,
/// goals, lessons, Q-history.
pub const NAMESPACE_MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "memories table with FSRS-free scalar state",
        up: r#"
            CREATE TABLE IF NOT EXISTS {ns}_memories (
                id TEXT PRIMARY KEY,
                memory_type TEXT NOT NULL CHECK(memory_type IN ('core','active','archive')),
                content TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                emotional_weight REAL NOT NULL DEFAULT 0.5,
                importance REAL NOT NULL DEFAULT 0.5,
                freshness REAL NOT NULL DEFAULT 1.0,
                q_value REAL NOT NULL DEFAULT 0.5,
                recall_count INTEGER NOT NULL DEFAULT 0,
                sessions_since_recall INTEGER NOT NULL DEFAULT 0,
                last_recalled TEXT,
                created TEXT NOT NULL,
                entities TEXT NOT NULL DEFAULT '[]'
            );
            CREATE INDEX IF NOT EXISTS idx_{ns}_memories_type ON {ns}_memories(memory_type);
            CREATE INDEX IF NOT EXISTS idx_{ns}_memories_created ON {ns}_memories(created);
        "#,
    },
    Migration {
        version: 2,
        description: "embeddings table",
        up: r#"
            CREATE TABLE IF NOT EXISTS {ns}_embeddings (
                memory_id TEXT PRIMARY KEY REFERENCES {ns}_memories(id),
                vector BLOB NOT NULL,
                dimensions INTEGER NOT NULL,
                preview TEXT,
                created_at TEXT NOT NULL
            );
        "#,
    },
    Migration {
        version: 3,
        description: "FTS5 full-text index over memory content, kept in sync via triggers",
        up: r#"
            CREATE VIRTUAL TABLE IF NOT EXISTS {ns}_memories_fts USING fts5(
                id UNINDEXED,
                content,
                content='{ns}_memories',
                content_rowid='rowid'
            );
            CREATE TRIGGER IF NOT EXISTS {ns}_memories_ai AFTER INSERT ON {ns}_memories BEGIN
                INSERT INTO {ns}_memories_fts(rowid, id, content) VALUES (new.rowid, new.id, new.content);
            END;
            CREATE TRIGGER IF NOT EXISTS {ns}_memories_ad AFTER DELETE ON {ns}_memories BEGIN
                INSERT INTO {ns}_memories_fts({ns}_memories_fts, rowid, id, content) VALUES('delete', old.rowid, old.id, old.content);
            END;
            CREATE TRIGGER IF NOT EXISTS {ns}_memories_au AFTER UPDATE ON {ns}_memories BEGIN
                INSERT INTO {ns}_memories_fts({ns}_memories_fts, rowid, id, content) VALUES('delete', old.rowid, old.id, old.content);
                INSERT INTO {ns}_memories_fts(rowid, id, content) VALUES (new.rowid, new.id, new.content);
            END;
        "#,
    },
    Migration {
        version: 4,
        description: "co-occurrence edges, typed edges, sessions",
        up: r#"
            CREATE TABLE IF NOT EXISTS {ns}_cooccurrence (
                memory_id TEXT NOT NULL,
                other_id TEXT NOT NULL,
                count INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (memory_id, other_id)
            );
            CREATE TABLE IF NOT EXISTS {ns}_typed_edges (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                subject_memory_id TEXT NOT NULL,
                predicate TEXT NOT NULL,
                object_memory_id TEXT NOT NULL,
                confidence REAL NOT NULL
            );
            CREATE TABLE IF NOT EXISTS {ns}_sessions (
                id TEXT PRIMARY KEY,
                started_at TEXT NOT NULL,
                ended_at TEXT
            );
        "#,
    },
    Migration {
        version: 5,
        description: "kv slots, goals, lessons, q history",
        up: r#"
            CREATE TABLE IF NOT EXISTS {ns}_kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS {ns}_goals (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                status TEXT NOT NULL CHECK(status IN ('active','completed','abandoned')),
                created TEXT NOT NULL,
                evaluated_at TEXT
            );
            CREATE TABLE IF NOT EXISTS {ns}_lessons (
                id TEXT PRIMARY KEY,
                category TEXT NOT NULL,
                text TEXT NOT NULL,
                evidence TEXT,
                source TEXT NOT NULL,
                confidence REAL NOT NULL,
                created TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS {ns}_q_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                memory_id TEXT NOT NULL,
                session_id TEXT NOT NULL,
                old_q REAL NOT NULL,
                new_q REAL NOT NULL,
                reward REAL NOT NULL,
                reward_source TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
        "#,
    },
];

/// Unprefixed tables shared across every namespace.
pub const SHARED_MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "SHARED memories and agent registry",
    up: r#"
        CREATE TABLE IF NOT EXISTS shared_memories (
            id TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            created_by TEXT NOT NULL,
            tags TEXT NOT NULL DEFAULT '[]',
            emotional_weight REAL NOT NULL DEFAULT 0.5,
            importance REAL NOT NULL DEFAULT 0.5,
            created TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS shared_agents (
            namespace TEXT PRIMARY KEY,
            last_active TEXT NOT NULL
        );
    "#,
}];

pub const BOOKKEEPING_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS schema_version (
        namespace TEXT NOT NULL,
        version INTEGER NOT NULL,
        PRIMARY KEY (namespace, version)
    );
"#;

/// Sanitise a namespace into a safe SQL identifier fragment. Only
/// alphanumerics and underscore survive; this both prevents injection via
/// the namespace selector and keeps table names valid identifiers.
pub fn sanitize_namespace(namespace: &str) -> String {
    let cleaned: String = namespace
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "default".to_string()
    } else {
        cleaned
    }
}

pub fn render(template: &str, ns: &str) -> String {
    template.replace("{ns}", ns)
}
