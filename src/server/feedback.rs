use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::Mutex;

use crate::types::FeedbackRecord;

/// Append-only CSV log of user feedback.
///
/// Appends are serialized behind a mutex so concurrent requests cannot
/// interleave partial rows. The header row is written once, when the file is
/// first created.
pub struct FeedbackLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

const HEADER: [&str; 4] = ["timestamp", "query_id", "rating", "feedback"];

impl FeedbackLog {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn append(&self, record: &FeedbackRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let needs_header = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(HEADER)?;
        }
        writer.write_record([
            record.timestamp.to_rfc3339(),
            record.query_id.clone(),
            record.rating.to_string(),
            record.feedback.clone(),
        ])?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(query_id: &str, rating: i32) -> FeedbackRecord {
        FeedbackRecord {
            timestamp: Utc::now(),
            query_id: query_id.to_string(),
            rating,
            feedback: "useful answer".to_string(),
        }
    }

    #[tokio::test]
    async fn writes_one_header_and_rows_in_call_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feedback.csv");
        let log = FeedbackLog::new(path.clone());

        log.append(&record("q-1", 5)).await.unwrap();
        log.append(&record("q-2", 2)).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp,query_id,rating,feedback");
        assert!(lines[1].contains("q-1"));
        assert!(lines[2].contains("q-2"));
    }

    #[tokio::test]
    async fn quotes_fields_containing_commas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feedback.csv");
        let log = FeedbackLog::new(path.clone());

        let mut tricky = record("q-1", 1);
        tricky.feedback = "wrong, and slow".to_string();
        log.append(&tricky).await.unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[3], "wrong, and slow");
    }
}
