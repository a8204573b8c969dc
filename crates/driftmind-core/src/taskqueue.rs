//! Minimal file-backed task queue interface (§6).
//!
//! Two operations only: append a task description to `queue.jsonl`, and
//! drain the current queue into `done.jsonl`. No scheduling or routing —
//! that belongs to whatever process reads these files.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedTask {
    pub id: String,
    pub description: String,
    pub created: chrono::DateTime<chrono::Utc>,
}

/// Appends `task` as one JSON line to `queue_path`, creating the file if
/// absent.
pub fn enqueue(queue_path: &Path, task: &QueuedTask) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(queue_path)?;
    writeln!(file, "{}", serde_json::to_string(task)?)?;
    Ok(())
}

/// Moves every task currently in `queue_path` to `done_path` (appending),
/// then truncates `queue_path`. Returns the tasks drained.
pub fn drain_to_done(queue_path: &Path, done_path: &Path) -> Result<Vec<QueuedTask>> {
    if !queue_path.exists() {
        return Ok(Vec::new());
    }

    let file = OpenOptions::new().read(true).open(queue_path)?;
    let reader = BufReader::new(file);
    let mut tasks = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        tasks.push(serde_json::from_str::<QueuedTask>(&line)?);
    }

    if !tasks.is_empty() {
        let mut done_file = OpenOptions::new().create(true).append(true).open(done_path)?;
        for task in &tasks {
            writeln!(done_file, "{}", serde_json::to_string(task)?)?;
        }
    }

    OpenOptions::new().write(true).truncate(true).open(queue_path)?;
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn enqueue_then_drain_moves_tasks_to_done() {
        let dir = tempdir().unwrap();
        let queue_path = dir.path().join("queue.jsonl");
        let done_path = dir.path().join("done.jsonl");

        enqueue(
            &queue_path,
            &QueuedTask { id: "t1".into(), description: "check disk usage".into(), created: chrono::Utc::now() },
        )
        .unwrap();
        enqueue(
            &queue_path,
            &QueuedTask { id: "t2".into(), description: "rotate logs".into(), created: chrono::Utc::now() },
        )
        .unwrap();

        let drained = drain_to_done(&queue_path, &done_path).unwrap();
        assert_eq!(drained.len(), 2);

        let remaining = drain_to_done(&queue_path, &done_path).unwrap();
        assert!(remaining.is_empty());

        let done_contents = std::fs::read_to_string(&done_path).unwrap();
        assert_eq!(done_contents.lines().count(), 2);
    }
}
