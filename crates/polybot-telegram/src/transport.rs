//! Outbound messages and photo downloads.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId, ReplyParameters};
use tracing::{debug, warn};

use polybot_core::config::TelegramConfig;
use polybot_core::PhotoRef;

use crate::error::TransportError;
use crate::send::split_chunks;

/// A photo written to local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedPhoto {
    /// Where the file now lives.
    pub path: PathBuf,
    /// The platform's path for the file, e.g. `photos/file_12.jpg`.
    pub remote_path: String,
}

/// What handlers need from the chat platform.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError>;

    /// Send `text` as a reply quoting message `quoted_msg_id`.
    async fn send_text_with_quote(
        &self,
        chat_id: i64,
        text: &str,
        quoted_msg_id: i32,
    ) -> Result<(), TransportError>;

    async fn send_photo(&self, chat_id: i64, path: &Path) -> Result<(), TransportError>;

    async fn download_photo(&self, photo: &PhotoRef) -> Result<DownloadedPhoto, TransportError>;
}

/// [`Transport`] over the Telegram Bot API.
pub struct TelegramTransport {
    bot: Bot,
    photos_dir: PathBuf,
    max_photo_bytes: u64,
}

impl TelegramTransport {
    pub fn new(bot: Bot, config: &TelegramConfig) -> Self {
        Self {
            bot,
            photos_dir: PathBuf::from(&config.photos_dir),
            max_photo_bytes: config.max_photo_bytes,
        }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        let chunks = split_chunks(text);
        for (i, chunk) in chunks.iter().enumerate() {
            self.bot.send_message(ChatId(chat_id), chunk).await?;
            if i + 1 < chunks.len() {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
        Ok(())
    }

    async fn send_text_with_quote(
        &self,
        chat_id: i64,
        text: &str,
        quoted_msg_id: i32,
    ) -> Result<(), TransportError> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .reply_parameters(ReplyParameters::new(MessageId(quoted_msg_id)))
            .await?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, path: &Path) -> Result<(), TransportError> {
        self.bot
            .send_photo(ChatId(chat_id), InputFile::file(path))
            .await?;
        debug!(chat_id, path = %path.display(), "sent photo");
        Ok(())
    }

    async fn download_photo(&self, photo: &PhotoRef) -> Result<DownloadedPhoto, TransportError> {
        let file = self.bot.get_file(photo.file_id.as_str()).await?;

        if u64::from(file.size) > self.max_photo_bytes {
            warn!(
                file_id = %photo.file_id,
                size = file.size,
                limit = self.max_photo_bytes,
                "Telegram: photo exceeds size limit"
            );
            return Err(TransportError::TooLarge {
                size: u64::from(file.size),
                max: self.max_photo_bytes,
            });
        }

        let relative = Path::new(&file.path);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(TransportError::Rejected(format!(
                "unexpected file path from Telegram: {}",
                file.path
            )));
        }

        let local = self.photos_dir.join(relative);
        if let Some(parent) = local.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut dst = tokio::fs::File::create(&local).await?;
        self.bot.download_file(&file.path, &mut dst).await?;

        debug!(file_id = %photo.file_id, path = %local.display(), "downloaded photo");
        Ok(DownloadedPhoto {
            path: local,
            remote_path: file.path,
        })
    }
}
