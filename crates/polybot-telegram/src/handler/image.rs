use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use polybot_core::IncomingMessage;
use polybot_imgproc::{io, ImageConfig, ImgProcError, Transform};

use super::{download_user_photo, echo, run_guarded, MessageHandler, Outcome};
use crate::error::HandlerError;
use crate::guard::{SessionGuard, SessionPermit};
use crate::router::{route_caption, usage_hint};
use crate::transport::Transport;

/// Applies the transforms named in a photo's caption and sends back the results.
pub struct ImageProcessingBot {
    transport: Arc<dyn Transport>,
    config: ImageConfig,
    guard: SessionGuard,
    timeout: Duration,
}

impl ImageProcessingBot {
    pub fn new(transport: Arc<dyn Transport>, config: ImageConfig, timeout: Duration) -> Self {
        Self {
            transport,
            config,
            guard: SessionGuard::new(),
            timeout,
        }
    }

    /// Handle one message without the session guard or deadline.
    pub async fn process(&self, msg: &IncomingMessage) -> Result<(), HandlerError> {
        self.process_holding(msg, None).await
    }

    /// `hold` rides along into every blocking job.
    async fn process_holding(
        &self,
        msg: &IncomingMessage,
        hold: Option<SessionPermit>,
    ) -> Result<(), HandlerError> {
        if !msg.is_photo() {
            return echo(self.transport.as_ref(), msg).await;
        }

        let transforms = msg
            .caption
            .as_deref()
            .map(|caption| route_caption(caption, &self.config))
            .unwrap_or_default();

        if transforms.is_empty() {
            self.transport.send_text(msg.chat_id, &usage_hint()).await?;
            return Ok(());
        }

        for transform in transforms {
            self.run_transform(msg, transform, hold.clone()).await?;
        }
        Ok(())
    }

    /// One keyword, one run: fresh downloads, transform, save, send.
    async fn run_transform(
        &self,
        msg: &IncomingMessage,
        transform: Transform,
        hold: Option<SessionPermit>,
    ) -> Result<(), HandlerError> {
        if msg.photos.len() < transform.inputs() {
            return Err(HandlerError::InsufficientPhotos {
                needed: transform.inputs(),
                found: msg.photos.len(),
            });
        }

        let mut sources = Vec::with_capacity(transform.inputs());
        for index in 0..transform.inputs() {
            let photo = download_user_photo(self.transport.as_ref(), msg, index).await?;
            sources.push(photo.path);
        }

        info!(
            chat_id = msg.chat_id,
            transform = transform.name(),
            "applying transform"
        );

        let output = tokio::task::spawn_blocking(move || {
            let _hold = hold;
            apply_to_files(transform, &sources)
        })
        .await
        .map_err(|e| HandlerError::Worker(e.to_string()))??;

        if !output.exists() {
            return Err(HandlerError::MissingOutput(output));
        }
        self.transport.send_photo(msg.chat_id, &output).await?;
        Ok(())
    }
}

/// Load every source, apply, and save next to the first source.
fn apply_to_files(transform: Transform, sources: &[PathBuf]) -> Result<PathBuf, ImgProcError> {
    let grids = sources
        .iter()
        .map(|p| io::load_grayscale(p))
        .collect::<Result<Vec<_>, _>>()?;
    let result = transform.apply(&grids)?;
    let first = sources.first().ok_or(ImgProcError::Inputs {
        op: transform.name(),
        expected: transform.inputs(),
        found: 0,
    })?;
    io::save_filtered(&result, first)
}

#[async_trait]
impl MessageHandler for ImageProcessingBot {
    fn name(&self) -> &'static str {
        "image-processing"
    }

    async fn handle(&self, msg: &IncomingMessage) -> Outcome {
        run_guarded(
            &self.guard,
            self.timeout,
            self.transport.as_ref(),
            msg,
            |permit| self.process_holding(msg, Some(permit)),
        )
        .await
    }

    fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }
}
