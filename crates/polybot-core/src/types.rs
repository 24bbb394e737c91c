use serde::{Deserialize, Serialize};

/// Reference to one photo attachment, as handed out by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRef {
    /// Transport-native file identifier.
    pub file_id: String,
}

impl PhotoRef {
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
        }
    }
}

/// Transport-neutral view of an inbound chat message.
///
/// `photos` lists distinct attachments in the order the handler should use
/// them: the message's own photo first, then any photo it replies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i32,
    pub chat_id: i64,
    pub text: Option<String>,
    pub caption: Option<String>,
    #[serde(default)]
    pub photos: Vec<PhotoRef>,
}

impl IncomingMessage {
    /// Plain text message.
    pub fn text(chat_id: i64, message_id: i32, text: impl Into<String>) -> Self {
        Self {
            message_id,
            chat_id,
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Photo message with an optional caption.
    pub fn photo(
        chat_id: i64,
        message_id: i32,
        caption: Option<&str>,
        photos: Vec<PhotoRef>,
    ) -> Self {
        Self {
            message_id,
            chat_id,
            caption: caption.map(str::to_string),
            photos,
            ..Self::default()
        }
    }

    pub fn is_photo(&self) -> bool {
        !self.photos.is_empty()
    }
}
