use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::db::init_db;
use crate::error::DetectError;
use crate::types::{Label, PredictionSummary};

/// Where prediction summaries end up after a successful detection.
pub trait PredictionStore: Send + Sync {
    fn save(&self, summary: &PredictionSummary) -> Result<(), DetectError>;
}

/// SQLite-backed prediction history. Labels are stored as a JSON array.
pub struct SqlitePredictionStore {
    db: Mutex<Connection>,
}

impl SqlitePredictionStore {
    pub fn new(conn: Connection) -> Result<Self, DetectError> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DetectError> {
        self.db.lock().map_err(|_| DetectError::Poisoned)
    }

    pub fn get(&self, prediction_id: &str) -> Result<Option<PredictionSummary>, DetectError> {
        let db = self.conn()?;
        let row = db
            .query_row(
                "SELECT prediction_id, original_img_path, predicted_img_path, labels, time
                 FROM predictions WHERE prediction_id = ?1",
                params![prediction_id],
                raw_row,
            )
            .optional()?;
        row.map(RawRow::into_summary).transpose()
    }

    /// Most recent predictions first, by backend timestamp.
    pub fn recent(&self, limit: usize) -> Result<Vec<PredictionSummary>, DetectError> {
        let db = self.conn()?;
        let mut stmt = db.prepare(
            "SELECT prediction_id, original_img_path, predicted_img_path, labels, time
             FROM predictions ORDER BY time DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], raw_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RawRow::into_summary).collect()
    }
}

impl PredictionStore for SqlitePredictionStore {
    fn save(&self, summary: &PredictionSummary) -> Result<(), DetectError> {
        let labels = serde_json::to_string(&summary.labels)?;
        let now = chrono::Utc::now().to_rfc3339();
        let db = self.conn()?;
        db.execute(
            "INSERT OR REPLACE INTO predictions
                (prediction_id, original_img_path, predicted_img_path, labels, time, stored_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                summary.prediction_id,
                summary.original_img_path,
                summary.predicted_img_path,
                labels,
                summary.time,
                now
            ],
        )?;
        debug!(
            prediction_id = %summary.prediction_id,
            labels = summary.labels.len(),
            "stored prediction"
        );
        Ok(())
    }
}

struct RawRow {
    prediction_id: String,
    original_img_path: String,
    predicted_img_path: String,
    labels: String,
    time: f64,
}

impl RawRow {
    fn into_summary(self) -> Result<PredictionSummary, DetectError> {
        let labels: Vec<Label> = serde_json::from_str(&self.labels)?;
        Ok(PredictionSummary {
            prediction_id: self.prediction_id,
            original_img_path: self.original_img_path,
            predicted_img_path: self.predicted_img_path,
            labels,
            time: self.time,
        })
    }
}

fn raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        prediction_id: row.get(0)?,
        original_img_path: row.get(1)?,
        predicted_img_path: row.get(2)?,
        labels: row.get(3)?,
        time: row.get(4)?,
    })
}
