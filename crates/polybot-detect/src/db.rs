use rusqlite::{Connection, Result};

/// Create the prediction tables. Safe to call on every startup.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS predictions (
            prediction_id      TEXT PRIMARY KEY,
            original_img_path  TEXT NOT NULL,
            predicted_img_path TEXT NOT NULL,
            labels             TEXT NOT NULL,
            time               REAL NOT NULL,
            stored_at          TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_predictions_time
            ON predictions(time DESC);",
    )
}
