//! Storage adapter (C1).
//!
//! Backed by `rusqlite` with bundled SQLite, WAL journaling and FTS5.
//! `Storage` holds a writer/reader connection pair behind `Mutex`es so
//! every method takes `&self`: the type is `Send + Sync` and is meant to
//! live behind `Arc<Storage>`. Vector search is a brute-force cosine scan
//! over an in-memory cache loaded at open and kept current on insert —
//! this workload's per-namespace corpus size does not justify an
//! approximate index.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::config::Config;
use crate::error::{MemoryError, Result};
use crate::model::*;

use super::migrations::{render, sanitize_namespace, BOOKKEEPING_SQL, NAMESPACE_MIGRATIONS, SHARED_MIGRATIONS};

#[derive(Debug, Clone, Default)]
pub struct StorageStats {
    pub total: i64,
    pub core_count: i64,
    pub active_count: i64,
    pub archive_count: i64,
    pub session_count: i64,
    pub last_session_ended_at: Option<DateTime<Utc>>,
}

pub struct Storage {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    namespace: String,
    vector_index: Mutex<Vec<(String, Vec<f32>)>>,
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA cache_size = -64000;
        PRAGMA temp_store = MEMORY;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        ",
    )?;
    Ok(())
}

fn default_db_path(config: &Config) -> PathBuf {
    let dir = directories::ProjectDirs::from("com", "driftmind", "driftmind")
        .map(|p| p.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&dir);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(meta) = std::fs::metadata(&dir) {
            let mut perms = meta.permissions();
            perms.set_mode(0o700);
            let _ = std::fs::set_permissions(&dir, perms);
        }
    }
    dir.join(format!("{}.sqlite3", config.db_file_stem()))
}

impl Storage {
    /// Open (creating if absent) the database backing `config`'s namespace.
    /// Runs shared + namespace migrations and loads the vector index cache.
    pub fn open(config: &Config) -> Result<Self> {
        Self::open_at(config, &default_db_path(config))
    }

    pub fn open_at(config: &Config, path: &Path) -> Result<Self> {
        let writer = Connection::open(path)?;
        configure_connection(&writer)?;
        let reader = Connection::open(path)?;
        configure_connection(&reader)?;

        let namespace = sanitize_namespace(&config.namespace);

        writer.execute_batch(BOOKKEEPING_SQL)?;
        for m in SHARED_MIGRATIONS {
            run_migration_if_needed(&writer, "shared", m.version, &render(m.up, ""))?;
        }
        for m in NAMESPACE_MIGRATIONS {
            run_migration_if_needed(&writer, &namespace, m.version, &render(m.up, &namespace))?;
        }

        let storage = Self {
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
            namespace,
            vector_index: Mutex::new(Vec::new()),
        };
        storage.reload_vector_index()?;
        Ok(storage)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn reload_vector_index(&self) -> Result<()> {
        let conn = self.reader.lock().expect("reader mutex poisoned");
        let sql = format!("SELECT memory_id, vector FROM {}_embeddings", self.namespace);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let blob: Vec<u8> = row.get(1)?;
            Ok((id, decode_vector(&blob)))
        })?;
        let mut index = self.vector_index.lock().expect("vector index mutex poisoned");
        index.clear();
        for r in rows {
            index.push(r?);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Memories
    // ------------------------------------------------------------------

    pub fn insert_memory(&self, m: &Memory) -> Result<()> {
        let conn = self.writer.lock().expect("writer mutex poisoned");
        let sql = format!(
            "INSERT INTO {}_memories
                (id, memory_type, content, tags, emotional_weight, importance, freshness,
                 q_value, recall_count, sessions_since_recall, last_recalled, created, entities)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            self.namespace
        );
        conn.execute(
            &sql,
            params![
                m.id,
                m.memory_type.as_str(),
                m.content,
                serde_json::to_string(&m.tags)?,
                m.emotional_weight,
                m.importance,
                m.freshness,
                m.q_value,
                m.recall_count,
                m.sessions_since_recall,
                m.last_recalled,
                m.created,
                serde_json::to_string(&m.entities)?,
            ],
        )?;
        Ok(())
    }

    pub fn get_memory(&self, id: &str) -> Result<Option<Memory>> {
        let conn = self.reader.lock().expect("reader mutex poisoned");
        let sql = format!("SELECT {} FROM {}_memories WHERE id = ?1", MEMORY_COLUMNS, self.namespace);
        conn.query_row(&sql, params![id], row_to_memory)
            .optional()
            .map_err(MemoryError::from)
    }

    pub fn list_memories(&self, memory_type: MemoryType, limit: usize) -> Result<Vec<Memory>> {
        let conn = self.reader.lock().expect("reader mutex poisoned");
        let sql = format!(
            "SELECT {} FROM {}_memories WHERE memory_type = ?1 ORDER BY created DESC LIMIT ?2",
            MEMORY_COLUMNS, self.namespace
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![memory_type.as_str(), limit as i64], row_to_memory)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(MemoryError::from)
    }

    /// Active/core/lesson memories ordered by `emotional_weight` descending,
    /// used to surface the high-emotion slice of the wake preamble.
    pub fn list_memories_by_tag_ordered_by_emotion(&self, tag: &str, limit: usize) -> Result<Vec<Memory>> {
        let conn = self.reader.lock().expect("reader mutex poisoned");
        let sql = format!(
            "SELECT {} FROM {}_memories WHERE tags LIKE ?1 ORDER BY emotional_weight DESC LIMIT ?2",
            MEMORY_COLUMNS, self.namespace
        );
        let pattern = format!("%\"{}\"%", tag);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![pattern, limit as i64], row_to_memory)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(MemoryError::from)
    }

    pub fn list_memories_by_ids(&self, ids: &[String]) -> Result<Vec<Memory>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.reader.lock().expect("reader mutex poisoned");
        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!(
            "SELECT {} FROM {}_memories WHERE id IN ({})",
            MEMORY_COLUMNS, self.namespace, placeholders
        );
        let mut stmt = conn.prepare(&sql)?;
        let params: Vec<&dyn rusqlite::ToSql> = ids.iter().map(|s| s as &dyn rusqlite::ToSql).collect();
        let rows = stmt.query_map(params.as_slice(), row_to_memory)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(MemoryError::from)
    }

    pub fn all_active_and_core(&self) -> Result<Vec<Memory>> {
        let conn = self.reader.lock().expect("reader mutex poisoned");
        let sql = format!(
            "SELECT {} FROM {}_memories WHERE memory_type IN ('active','core')",
            MEMORY_COLUMNS, self.namespace
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_memory)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(MemoryError::from)
    }

    /// Atomically records that `ids` were surfaced at wake: `recall_count
    /// += 1`, `sessions_since_recall = 0`, `last_recalled = now`.
    pub fn record_recall(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut conn = self.writer.lock().expect("writer mutex poisoned");
        let tx = conn.transaction()?;
        {
            let sql = format!(
                "UPDATE {}_memories SET recall_count = recall_count + 1, sessions_since_recall = 0, last_recalled = ?1 WHERE id = ?2",
                self.namespace
            );
            let mut stmt = tx.prepare(&sql)?;
            let now = Utc::now();
            for id in ids {
                stmt.execute(params![now, id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// `type = 'core'` is one-way promotion from `active`; never demoted.
    pub fn promote_to_core(&self, id: &str) -> Result<()> {
        let conn = self.writer.lock().expect("writer mutex poisoned");
        let sql = format!(
            "UPDATE {}_memories SET memory_type = 'core' WHERE id = ?1 AND memory_type = 'active'",
            self.namespace
        );
        conn.execute(&sql, params![id])?;
        Ok(())
    }

    /// `type = 'archive'` is only reachable from `active`, never `core`.
    pub fn archive_memory(&self, id: &str) -> Result<()> {
        let conn = self.writer.lock().expect("writer mutex poisoned");
        let sql = format!(
            "UPDATE {}_memories SET memory_type = 'archive' WHERE id = ?1 AND memory_type = 'active'",
            self.namespace
        );
        conn.execute(&sql, params![id])?;
        Ok(())
    }

    /// Bumps `sessions_since_recall` for every memory of any tier not
    /// recalled this session, applies freshness decay to the active tier,
    /// and returns the active-tier ids with their post-decay freshness and
    /// recall_count (candidates for the caller to archive/promote).
    pub fn decay_active_memories(&self, gamma: f64, recalled_this_session: &[String]) -> Result<Vec<(String, f64, i64)>> {
        let conn = self.writer.lock().expect("writer mutex poisoned");
        let recalled: std::collections::HashSet<&str> = recalled_this_session.iter().map(|s| s.as_str()).collect();

        let all_sql = format!("SELECT id, memory_type, sessions_since_recall FROM {}_memories", self.namespace);
        let mut all_stmt = conn.prepare(&all_sql)?;
        let all_rows: Vec<(String, String, i64)> = all_stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?
            .collect::<std::result::Result<_, _>>()?;
        drop(all_stmt);

        let bump_sql = format!("UPDATE {}_memories SET sessions_since_recall = ?1 WHERE id = ?2", self.namespace);
        for (id, _memory_type, sessions_since_recall) in &all_rows {
            if !recalled.contains(id.as_str()) {
                conn.execute(&bump_sql, params![sessions_since_recall + 1, id])?;
            }
        }

        let active_sql = format!(
            "SELECT id, freshness, recall_count FROM {}_memories WHERE memory_type = 'active'",
            self.namespace
        );
        let mut active_stmt = conn.prepare(&active_sql)?;
        let active_rows: Vec<(String, f64, i64)> = active_stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?
            .collect::<std::result::Result<_, _>>()?;
        drop(active_stmt);

        let freshness_sql = format!("UPDATE {}_memories SET freshness = ?1 WHERE id = ?2", self.namespace);
        let mut out = Vec::new();
        for (id, freshness, recall_count) in active_rows {
            let new_freshness = freshness * gamma;
            conn.execute(&freshness_sql, params![new_freshness, id])?;
            out.push((id, new_freshness, recall_count));
        }
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Embeddings + vector search
    // ------------------------------------------------------------------

    pub fn upsert_embedding(&self, memory_id: &str, vector: &[f32], preview: Option<&str>) -> Result<()> {
        {
            let conn = self.writer.lock().expect("writer mutex poisoned");
            let sql = format!(
                "INSERT INTO {0}_embeddings (memory_id, vector, dimensions, preview, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(memory_id) DO UPDATE SET vector = excluded.vector, dimensions = excluded.dimensions, preview = excluded.preview",
                self.namespace
            );
            conn.execute(
                &sql,
                params![memory_id, encode_vector(vector), vector.len() as i64, preview, Utc::now()],
            )?;
        }
        let mut index = self.vector_index.lock().expect("vector index mutex poisoned");
        if let Some(entry) = index.iter_mut().find(|(id, _)| id == memory_id) {
            entry.1 = vector.to_vec();
        } else {
            index.push((memory_id.to_string(), vector.to_vec()));
        }
        Ok(())
    }

    /// Brute-force cosine-similarity search over the in-memory index.
    pub fn search_similar(&self, vector: &[f32], limit: usize) -> Result<Vec<(String, f64)>> {
        let index = self.vector_index.lock().expect("vector index mutex poisoned");
        let mut scored: Vec<(String, f64)> = index
            .iter()
            .map(|(id, v)| (id.clone(), cosine_similarity(vector, v)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }

    pub fn search_fulltext(&self, query: &str, limit: usize) -> Result<Vec<(String, f64)>> {
        let conn = self.reader.lock().expect("reader mutex poisoned");
        let sql = format!(
            "SELECT id, bm25({0}_memories_fts) AS rank FROM {0}_memories_fts WHERE {0}_memories_fts MATCH ?1 ORDER BY rank LIMIT ?2",
            self.namespace
        );
        let sanitized = sanitize_fts_query(query);
        if sanitized.is_empty() {
            return Ok(Vec::new());
        }
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![sanitized, limit as i64], |r| {
            let id: String = r.get(0)?;
            let rank: f64 = r.get(1)?;
            // bm25() is negative-is-better; invert to a positive relevance score.
            Ok((id, -rank))
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(MemoryError::from)
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    pub fn start_session(&self) -> Result<String> {
        let conn = self.writer.lock().expect("writer mutex poisoned");
        let id = crate::ids::new_id();
        let sql = format!("INSERT INTO {}_sessions (id, started_at, ended_at) VALUES (?1, ?2, NULL)", self.namespace);
        conn.execute(&sql, params![id, Utc::now()])?;
        Ok(id)
    }

    pub fn end_session(&self, id: &str) -> Result<()> {
        let conn = self.writer.lock().expect("writer mutex poisoned");
        let sql = format!("UPDATE {}_sessions SET ended_at = ?1 WHERE id = ?2", self.namespace);
        conn.execute(&sql, params![Utc::now(), id])?;
        Ok(())
    }

    pub fn count_sessions(&self) -> Result<i64> {
        let conn = self.reader.lock().expect("reader mutex poisoned");
        let sql = format!("SELECT COUNT(*) FROM {}_sessions", self.namespace);
        Ok(conn.query_row(&sql, [], |r| r.get(0))?)
    }

    pub fn last_ended_session_at(&self) -> Result<Option<DateTime<Utc>>> {
        let conn = self.reader.lock().expect("reader mutex poisoned");
        let sql = format!(
            "SELECT ended_at FROM {}_sessions WHERE ended_at IS NOT NULL ORDER BY ended_at DESC LIMIT 1",
            self.namespace
        );
        conn.query_row(&sql, [], |r| r.get(0)).optional().map_err(MemoryError::from)
    }

    // ------------------------------------------------------------------
    // KV
    // ------------------------------------------------------------------

    pub fn kv_get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.reader.lock().expect("reader mutex poisoned");
        let sql = format!("SELECT value FROM {}_kv WHERE key = ?1", self.namespace);
        let raw: Option<String> = conn.query_row(&sql, params![key], |r| r.get(0)).optional()?;
        match raw {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    pub fn kv_set(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.writer.lock().expect("writer mutex poisoned");
        let sql = format!(
            "INSERT INTO {0}_kv (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            self.namespace
        );
        conn.execute(&sql, params![key, serde_json::to_string(value)?])?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<()> {
        let conn = self.writer.lock().expect("writer mutex poisoned");
        let sql = format!("DELETE FROM {}_kv WHERE key = ?1", self.namespace);
        conn.execute(&sql, params![key])?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Co-occurrence / typed edges
    // ------------------------------------------------------------------

    /// Increments `(a,b)` and `(b,a)` by one. `a` and `b` must differ.
    pub fn bump_cooccurrence(&self, a: &str, b: &str) -> Result<()> {
        if a == b {
            return Ok(());
        }
        let conn = self.writer.lock().expect("writer mutex poisoned");
        let sql = format!(
            "INSERT INTO {0}_cooccurrence (memory_id, other_id, count) VALUES (?1, ?2, 1)
             ON CONFLICT(memory_id, other_id) DO UPDATE SET count = count + 1",
            self.namespace
        );
        conn.execute(&sql, params![a, b])?;
        conn.execute(&sql, params![b, a])?;
        Ok(())
    }

    pub fn count_cooccurrence_rows(&self) -> Result<i64> {
        let conn = self.reader.lock().expect("reader mutex poisoned");
        let sql = format!("SELECT COUNT(*) FROM {}_cooccurrence", self.namespace);
        Ok(conn.query_row(&sql, [], |r| r.get(0))?)
    }

    pub fn insert_typed_edge(&self, edge: &TypedEdge) -> Result<()> {
        let conn = self.writer.lock().expect("writer mutex poisoned");
        let sql = format!(
            "INSERT INTO {}_typed_edges (subject_memory_id, predicate, object_memory_id, confidence) VALUES (?1, ?2, ?3, ?4)",
            self.namespace
        );
        conn.execute(&sql, params![edge.subject_memory_id, edge.predicate, edge.object_memory_id, edge.confidence])?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Q-value
    // ------------------------------------------------------------------

    pub fn update_q_value(&self, memory_id: &str, new_q: f64) -> Result<()> {
        let conn = self.writer.lock().expect("writer mutex poisoned");
        let sql = format!("UPDATE {}_memories SET q_value = ?1 WHERE id = ?2", self.namespace);
        conn.execute(&sql, params![new_q, memory_id])?;
        Ok(())
    }

    pub fn insert_q_history(&self, row: &QHistoryRow) -> Result<()> {
        let conn = self.writer.lock().expect("writer mutex poisoned");
        let sql = format!(
            "INSERT INTO {}_q_history (memory_id, session_id, old_q, new_q, reward, reward_source, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            self.namespace
        );
        conn.execute(
            &sql,
            params![row.memory_id, row.session_id, row.old_q, row.new_q, row.reward, row.reward_source, Utc::now()],
        )?;
        Ok(())
    }

    pub fn q_history_count_by_source(&self, reward_source: &str) -> Result<i64> {
        let conn = self.reader.lock().expect("reader mutex poisoned");
        let sql = format!("SELECT COUNT(*) FROM {}_q_history WHERE reward_source = ?1", self.namespace);
        Ok(conn.query_row(&sql, params![reward_source], |r| r.get(0))?)
    }

    // ------------------------------------------------------------------
    // Lessons
    // ------------------------------------------------------------------

    pub fn insert_lesson(&self, lesson: &Lesson) -> Result<()> {
        let conn = self.writer.lock().expect("writer mutex poisoned");
        let sql = format!(
            "INSERT INTO {}_lessons (id, category, text, evidence, source, confidence, created) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            self.namespace
        );
        conn.execute(
            &sql,
            params![lesson.id, lesson.category, lesson.text, lesson.evidence, lesson.source, lesson.confidence, lesson.created],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Goals
    // ------------------------------------------------------------------

    pub fn insert_goal(&self, goal: &Goal) -> Result<()> {
        let conn = self.writer.lock().expect("writer mutex poisoned");
        let sql = format!(
            "INSERT INTO {}_goals (id, text, status, created, evaluated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            self.namespace
        );
        conn.execute(&sql, params![goal.id, goal.text, goal.status.as_str(), goal.created, goal.evaluated_at])?;
        Ok(())
    }

    pub fn update_goal_status(&self, id: &str, status: GoalStatus) -> Result<()> {
        let conn = self.writer.lock().expect("writer mutex poisoned");
        let sql = format!("UPDATE {}_goals SET status = ?1, evaluated_at = ?2 WHERE id = ?3", self.namespace);
        conn.execute(&sql, params![status.as_str(), Utc::now(), id])?;
        Ok(())
    }

    pub fn list_goals(&self, status: GoalStatus) -> Result<Vec<Goal>> {
        let conn = self.reader.lock().expect("reader mutex poisoned");
        let sql = format!(
            "SELECT id, text, status, created, evaluated_at FROM {}_goals WHERE status = ?1 ORDER BY created DESC",
            self.namespace
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![status.as_str()], |r| {
            Ok(Goal {
                id: r.get(0)?,
                text: r.get(1)?,
                status: GoalStatus::parse_name(&r.get::<_, String>(2)?).unwrap_or(GoalStatus::Active),
                created: r.get(3)?,
                evaluated_at: r.get(4)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(MemoryError::from)
    }

    // ------------------------------------------------------------------
    // Mood
    // ------------------------------------------------------------------

    pub fn get_mood(&self) -> Result<Mood> {
        match self.kv_get(KV_MOOD)? {
            Some(v) => Ok(serde_json::from_value(v).unwrap_or_default()),
            None => Ok(Mood::default()),
        }
    }

    pub fn set_mood(&self, mood: Mood) -> Result<()> {
        self.kv_set(KV_MOOD, &serde_json::to_value(mood)?)
    }

    // ------------------------------------------------------------------
    // SHARED
    // ------------------------------------------------------------------

    pub fn insert_shared_memory(&self, row: &SharedMemory) -> Result<()> {
        let conn = self.writer.lock().expect("writer mutex poisoned");
        conn.execute(
            "INSERT OR IGNORE INTO shared_memories (id, content, created_by, tags, emotional_weight, importance, created)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![row.id, row.content, row.created_by, serde_json::to_string(&row.tags)?, row.emotional_weight, row.importance, row.created],
        )?;
        Ok(())
    }

    pub fn list_shared_memories_excluding(&self, namespace: &str, limit: usize) -> Result<Vec<SharedMemory>> {
        let conn = self.reader.lock().expect("reader mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, content, created_by, tags, emotional_weight, importance, created
             FROM shared_memories WHERE created_by != ?1 ORDER BY created DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![namespace, limit as i64], |r| {
            let tags_raw: String = r.get(3)?;
            Ok(SharedMemory {
                id: r.get(0)?,
                content: r.get(1)?,
                created_by: r.get(2)?,
                tags: serde_json::from_str(&tags_raw).unwrap_or_default(),
                emotional_weight: r.get(4)?,
                importance: r.get(5)?,
                created: r.get(6)?,
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(MemoryError::from)
    }

    pub fn upsert_shared_agent(&self, namespace: &str) -> Result<()> {
        let conn = self.writer.lock().expect("writer mutex poisoned");
        conn.execute(
            "INSERT INTO shared_agents (namespace, last_active) VALUES (?1, ?2)
             ON CONFLICT(namespace) DO UPDATE SET last_active = excluded.last_active",
            params![namespace, Utc::now()],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Stats
    // ------------------------------------------------------------------

    pub fn get_stats(&self) -> Result<StorageStats> {
        let conn = self.reader.lock().expect("reader mutex poisoned");
        let sql = format!(
            "SELECT
                COUNT(*) as total,
                SUM(CASE WHEN memory_type = 'core' THEN 1 ELSE 0 END) as core_count,
                SUM(CASE WHEN memory_type = 'active' THEN 1 ELSE 0 END) as active_count,
                SUM(CASE WHEN memory_type = 'archive' THEN 1 ELSE 0 END) as archive_count
             FROM {}_memories",
            self.namespace
        );
        let (total, core_count, active_count, archive_count): (i64, Option<i64>, Option<i64>, Option<i64>) =
            conn.query_row(&sql, [], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))?;
        drop(conn);

        Ok(StorageStats {
            total,
            core_count: core_count.unwrap_or(0),
            active_count: active_count.unwrap_or(0),
            archive_count: archive_count.unwrap_or(0),
            session_count: self.count_sessions()?,
            last_session_ended_at: self.last_ended_session_at()?,
        })
    }
}

const MEMORY_COLUMNS: &str = "id, memory_type, content, tags, emotional_weight, importance, freshness, q_value, recall_count, sessions_since_recall, last_recalled, created, entities";

fn row_to_memory(row: &rusqlite::Row<'_>) -> rusqlite::Result<Memory> {
    let tags_raw: String = row.get(3)?;
    let entities_raw: String = row.get(12)?;
    Ok(Memory {
        id: row.get(0)?,
        memory_type: MemoryType::parse_name(&row.get::<_, String>(1)?).unwrap_or(MemoryType::Active),
        content: row.get(2)?,
        tags: serde_json::from_str(&tags_raw).unwrap_or_default(),
        emotional_weight: row.get(4)?,
        importance: row.get(5)?,
        freshness: row.get(6)?,
        q_value: row.get(7)?,
        recall_count: row.get(8)?,
        sessions_since_recall: row.get(9)?,
        last_recalled: row.get(10)?,
        created: row.get(11)?,
        entities: serde_json::from_str(&entities_raw).unwrap_or_default(),
    })
}

fn run_migration_if_needed(conn: &Connection, ns_key: &str, version: i64, sql: &str) -> Result<()> {
    let already: Option<i64> = conn
        .query_row(
            "SELECT version FROM schema_version WHERE namespace = ?1 AND version = ?2",
            params![ns_key, version],
            |r| r.get(0),
        )
        .optional()?;
    if already.is_some() {
        return Ok(());
    }
    conn.execute_batch(sql)?;
    conn.execute(
        "INSERT INTO schema_version (namespace, version) VALUES (?1, ?2)",
        params![ns_key, version],
    )?;
    Ok(())
}

fn encode_vector(v: &[f32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(v.len() * 4);
    for f in v {
        buf.extend_from_slice(&f.to_le_bytes());
    }
    buf
}

fn decode_vector(buf: &[u8]) -> Vec<f32> {
    buf.chunks_exact(4).map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)) as f64
}

/// FTS5 MATCH is picky about bare punctuation; keep only alphanumeric
/// tokens quoted individually and OR'd together.
fn sanitize_fts_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|tok| tok.chars().filter(|c| c.is_alphanumeric()).collect::<String>())
        .filter(|tok| !tok.is_empty())
        .map(|tok| format!("\"{tok}\""))
        .collect::<Vec<_>>()
        .join(" OR ")
}
