use std::path::PathBuf;

use polybot_detect::DetectError;
use polybot_imgproc::ImgProcError;

/// Errors produced while wiring up the Telegram side.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("teloxide error: {0}")]
    Teloxide(#[from] teloxide::RequestError),

    #[error("no bot token configured")]
    NoToken,

    #[error("{0}")]
    Config(String),
}

/// Failures talking to the chat platform.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] teloxide::RequestError),

    #[error("download failed: {0}")]
    Download(#[from] teloxide::DownloadError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file is {size} bytes, limit is {max}")]
    TooLarge { size: u64, max: u64 },

    #[error("{0}")]
    Rejected(String),
}

/// How a handler failure is reported back to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The message itself was wrong.
    Input,
    /// A collaborator failed; retrying may help.
    Transient,
    Unexpected,
}

/// Everything that can go wrong while handling one message.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Message content of type 'photo' expected")]
    NotAPhoto,

    #[error("needs {needed} photo attachments, message has {found}")]
    InsufficientPhotos { needed: usize, found: usize },

    #[error(transparent)]
    Image(#[from] ImgProcError),

    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    #[error("upload failed: {0}")]
    Storage(#[source] DetectError),

    #[error("detection failed: {0}")]
    Detection(#[source] DetectError),

    #[error("processing exceeded {secs}s")]
    Timeout { secs: u64 },

    #[error("worker failed: {0}")]
    Worker(String),

    #[error("Image path doesn't exist")]
    MissingOutput(PathBuf),
}

impl HandlerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAPhoto | Self::InsufficientPhotos { .. } => ErrorKind::Input,
            Self::Image(e) if e.is_input() => ErrorKind::Input,
            Self::Transport(_) | Self::Storage(_) | Self::Detection(_) | Self::Timeout { .. } => {
                ErrorKind::Transient
            }
            Self::Image(_) | Self::Worker(_) | Self::MissingOutput(_) => ErrorKind::Unexpected,
        }
    }

    /// Text sent back to the chat.
    pub fn user_message(&self) -> String {
        match self {
            Self::InsufficientPhotos { .. } => {
                "Concat needs two photos: reply to a photo with another photo captioned \"concat\"."
                    .to_string()
            }
            Self::Image(ImgProcError::SizeMismatch { .. }) => {
                "Both photos must have the same size to be concatenated.".to_string()
            }
            Self::Image(e) if e.is_input() => format!("Can't process this photo: {e}"),
            Self::Timeout { .. } => "Processing took too long, please try again.".to_string(),
            Self::NotAPhoto => self.to_string(),
            _ => match self.kind() {
                ErrorKind::Transient => "An error occurred while processing your request.".to_string(),
                _ => "An unexpected error occurred, Please try again.".to_string(),
            },
        }
    }
}
