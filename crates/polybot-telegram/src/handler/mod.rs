//! Bot strategies.
//!
//! One [`MessageHandler`] is built per process from `bot.mode`; it owns every
//! inbound message from conversion to the final reply.

mod detection;
mod echo;
mod image;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, warn};

use polybot_core::config::{BotConfig, BotMode};
use polybot_core::IncomingMessage;
use polybot_imgproc::ImageConfig;

use crate::error::{ErrorKind, HandlerError, TelegramError};
use crate::guard::{SessionGuard, SessionPermit};
use crate::transport::{DownloadedPhoto, Transport};

pub use detection::{DetectionServices, ObjectDetectionBot};
pub use echo::{EchoBot, QuoteBot};
pub use image::ImageProcessingBot;

/// What became of one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Handled,
    /// Another message was in flight; nothing was sent.
    Dropped,
    /// The error was reported to the chat.
    Failed(ErrorKind),
}

#[async_trait]
pub trait MessageHandler: Send + Sync {
    fn name(&self) -> &'static str;

    /// Handle one message. Errors are reported to the chat here and never
    /// escape.
    async fn handle(&self, msg: &IncomingMessage) -> Outcome;

    /// Whether a message is currently in flight.
    fn is_busy(&self) -> bool {
        false
    }
}

/// Build the strategy selected by `bot.mode`.
pub fn build_handler(
    bot: &BotConfig,
    image: &ImageConfig,
    transport: Arc<dyn Transport>,
    detection: Option<DetectionServices>,
) -> Result<Arc<dyn MessageHandler>, TelegramError> {
    let timeout = Duration::from_secs(bot.processing_timeout_secs);
    let handler: Arc<dyn MessageHandler> = match bot.mode {
        BotMode::Echo => Arc::new(EchoBot::new(transport)),
        BotMode::Quote => Arc::new(QuoteBot::new(transport)),
        BotMode::ImageProcessing => {
            Arc::new(ImageProcessingBot::new(transport, image.clone(), timeout))
        }
        BotMode::ObjectDetection => {
            let services = detection.ok_or_else(|| {
                TelegramError::Config("object-detection mode needs detection services".into())
            })?;
            Arc::new(ObjectDetectionBot::new(transport, services, timeout))
        }
    };
    info!(mode = %bot.mode, handler = handler.name(), "message handler ready");
    Ok(handler)
}

/// Download attachment `index` of `msg`.
pub(crate) async fn download_user_photo(
    transport: &dyn Transport,
    msg: &IncomingMessage,
    index: usize,
) -> Result<DownloadedPhoto, HandlerError> {
    if !msg.is_photo() {
        return Err(HandlerError::NotAPhoto);
    }
    let photo = msg
        .photos
        .get(index)
        .ok_or(HandlerError::InsufficientPhotos {
            needed: index + 1,
            found: msg.photos.len(),
        })?;
    Ok(transport.download_photo(photo).await?)
}

/// Reply with `Your original message: <text>`. Messages without text are ignored.
pub(crate) async fn echo(
    transport: &dyn Transport,
    msg: &IncomingMessage,
) -> Result<(), HandlerError> {
    if let Some(ref text) = msg.text {
        transport
            .send_text(msg.chat_id, &format!("Your original message: {text}"))
            .await?;
    }
    Ok(())
}

/// Log `err` by kind and tell the chat about it.
pub(crate) async fn report_error(transport: &dyn Transport, chat_id: i64, err: &HandlerError) {
    match err.kind() {
        ErrorKind::Input => warn!(chat_id, error = %err, "rejected message"),
        ErrorKind::Transient => error!(chat_id, error = %err, "collaborator failed"),
        ErrorKind::Unexpected => error!(chat_id, error = ?err, "unexpected failure"),
    }
    if let Err(e) = transport.send_text(chat_id, &err.user_message()).await {
        error!(chat_id, error = %e, "failed to report error to chat");
    }
}

/// Run `work` under the session guard and a deadline.
///
/// A message arriving while the guard is held is dropped without a reply.
/// `work` receives a clone of the permit; anything it moves onto a blocking
/// thread must carry that clone, so the guard stays busy until the thread is
/// done even when the deadline has already fired.
pub(crate) async fn run_guarded<W, F>(
    guard: &SessionGuard,
    timeout: Duration,
    transport: &dyn Transport,
    msg: &IncomingMessage,
    work: W,
) -> Outcome
where
    W: FnOnce(SessionPermit) -> F,
    F: Future<Output = Result<(), HandlerError>>,
{
    let Some(permit) = guard.try_acquire() else {
        info!(
            chat_id = msg.chat_id,
            message_id = msg.message_id,
            "still processing the previous message, dropping"
        );
        return Outcome::Dropped;
    };

    let result = match tokio::time::timeout(timeout, work(permit.clone())).await {
        Ok(result) => result,
        Err(_) => Err(HandlerError::Timeout {
            secs: timeout.as_secs(),
        }),
    };

    drop(permit);

    match result {
        Ok(()) => Outcome::Handled,
        Err(e) => {
            report_error(transport, msg.chat_id, &e).await;
            Outcome::Failed(e.kind())
        }
    }
}

/// Shorthand for handlers without a guard.
pub(crate) async fn finish(
    transport: &dyn Transport,
    msg: &IncomingMessage,
    result: Result<(), HandlerError>,
) -> Outcome {
    match result {
        Ok(()) => Outcome::Handled,
        Err(e) => {
            report_error(transport, msg.chat_id, &e).await;
            Outcome::Failed(e.kind())
        }
    }
}
