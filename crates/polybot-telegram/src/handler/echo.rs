use std::sync::Arc;

use async_trait::async_trait;

use polybot_core::IncomingMessage;

use super::{echo, finish, MessageHandler, Outcome};
use crate::error::HandlerError;
use crate::transport::Transport;

/// Text the quote bot never quotes back.
pub const DO_NOT_QUOTE: &str = "Please don't quote me";

/// Replies `Your original message: <text>`.
pub struct EchoBot {
    transport: Arc<dyn Transport>,
}

impl EchoBot {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl MessageHandler for EchoBot {
    fn name(&self) -> &'static str {
        "echo"
    }

    async fn handle(&self, msg: &IncomingMessage) -> Outcome {
        let result = echo(self.transport.as_ref(), msg).await;
        finish(self.transport.as_ref(), msg, result).await
    }
}

/// Sends the text back as a reply quoting the original message.
pub struct QuoteBot {
    transport: Arc<dyn Transport>,
}

impl QuoteBot {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl MessageHandler for QuoteBot {
    fn name(&self) -> &'static str {
        "quote"
    }

    async fn handle(&self, msg: &IncomingMessage) -> Outcome {
        let result: Result<(), HandlerError> = match msg.text.as_deref() {
            Some(text) if text != DO_NOT_QUOTE => self
                .transport
                .send_text_with_quote(msg.chat_id, text, msg.message_id)
                .await
                .map_err(Into::into),
            _ => Ok(()),
        };
        finish(self.transport.as_ref(), msg, result).await
    }
}
