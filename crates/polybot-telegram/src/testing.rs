//! In-process fakes for handler tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use tokio::sync::Notify;

use polybot_core::PhotoRef;

use crate::error::TransportError;
use crate::transport::{DownloadedPhoto, Transport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text { chat_id: i64, text: String },
    Quote { chat_id: i64, text: String, quoted_msg_id: i32 },
    Photo { chat_id: i64, path: PathBuf },
}

/// Records outbound calls and serves generated PNGs as downloads.
pub struct FakeTransport {
    dir: tempfile::TempDir,
    sent: Mutex<Vec<Sent>>,
    downloads: AtomicUsize,
    gate: Option<Notify>,
}

impl FakeTransport {
    /// Width and height of every served photo.
    pub const SIZE: (u32, u32) = (8, 6);

    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            sent: Mutex::new(Vec::new()),
            downloads: AtomicUsize::new(0),
            gate: None,
        }
    }

    /// Downloads block until [`FakeTransport::release`] is called.
    pub fn gated() -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Self::new()
        }
    }

    pub fn release(&self) {
        if let Some(ref gate) = self.gate {
            gate.notify_one();
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn photo_count(&self) -> usize {
        self.sent()
            .iter()
            .filter(|s| matches!(s, Sent::Photo { .. }))
            .count()
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    fn record(&self, sent: Sent) {
        self.sent.lock().unwrap().push(sent);
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        self.record(Sent::Text {
            chat_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_text_with_quote(
        &self,
        chat_id: i64,
        text: &str,
        quoted_msg_id: i32,
    ) -> Result<(), TransportError> {
        self.record(Sent::Quote {
            chat_id,
            text: text.to_string(),
            quoted_msg_id,
        });
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, path: &Path) -> Result<(), TransportError> {
        self.record(Sent::Photo {
            chat_id,
            path: path.to_path_buf(),
        });
        Ok(())
    }

    async fn download_photo(&self, photo: &PhotoRef) -> Result<DownloadedPhoto, TransportError> {
        if let Some(ref gate) = self.gate {
            gate.notified().await;
        }
        self.downloads.fetch_add(1, Ordering::SeqCst);

        let remote_path = format!("photos/{}.png", photo.file_id);
        let path = self.dir.path().join(&remote_path);
        std::fs::create_dir_all(path.parent().unwrap())?;
        let (w, h) = Self::SIZE;
        RgbImage::from_fn(w, h, |x, y| Rgb([(x * 30) as u8, (y * 40) as u8, 90]))
            .save(&path)
            .map_err(|e| TransportError::Rejected(e.to_string()))?;
        Ok(DownloadedPhoto { path, remote_path })
    }
}
