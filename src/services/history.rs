use crate::domain::models::{HistoryEntry, RunReport};
use std::path::{Path, PathBuf};

pub fn history_path() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".local/share/clm-smoke/runs.jsonl"))
}

pub fn entry_for(report: &RunReport) -> HistoryEntry {
    HistoryEntry {
        ts: chrono::Utc::now().to_rfc3339(),
        base_url: report.base_url.clone(),
        passed: report.passed,
        failed: report.failed,
        total: report.total,
    }
}

/// Appends one line per completed run. Write failures are ignored.
pub fn record_run(report: &RunReport) {
    if let Some(path) = history_path() {
        append(&path, &entry_for(report));
    }
}

pub fn append(path: &Path, entry: &HistoryEntry) {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let Ok(line) = serde_json::to_string(entry) else {
        return;
    };
    let line = format!("{}\n", line);
    let _ = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut f| std::io::Write::write_all(&mut f, line.as_bytes()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(path: &Path) -> Vec<HistoryEntry> {
        std::fs::read_to_string(path)
            .map(|raw| {
                raw.lines()
                    .filter_map(|l| serde_json::from_str(l).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn entry(passed: usize) -> HistoryEntry {
        HistoryEntry {
            ts: "2026-01-01T00:00:00+00:00".to_string(),
            base_url: "http://127.0.0.1:8000".to_string(),
            passed,
            failed: 18 - passed,
            total: 18,
        }
    }

    #[test]
    fn appends_one_line_per_run() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested/runs.jsonl");
        append(&path, &entry(18));
        append(&path, &entry(17));
        std::fs::write(
            &path,
            format!("{}not json\n", std::fs::read_to_string(&path).unwrap()),
        )
        .unwrap();

        let all = read_all(&path);
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].failed, 1);
    }
}
