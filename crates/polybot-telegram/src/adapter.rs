//! Long-polling entry point.
//!
//! Wraps a teloxide `Bot` + `Dispatcher` and hands every inbound message to the
//! configured [`MessageHandler`] on its own task.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{debug, info};

use crate::convert::incoming_from;
use crate::handler::MessageHandler;

pub struct TelegramAdapter {
    bot: Bot,
    handler: Arc<dyn MessageHandler>,
}

impl TelegramAdapter {
    pub fn new(bot: Bot, handler: Arc<dyn MessageHandler>) -> Self {
        Self { bot, handler }
    }

    /// Drive the long-polling loop. Runs for the lifetime of the process.
    pub async fn run(self) {
        info!(handler = self.handler.name(), "Telegram: starting long-polling dispatcher");

        let tree = Update::filter_message().endpoint(on_message);

        Dispatcher::builder(self.bot, tree)
            .dependencies(dptree::deps![self.handler])
            .default_handler(|_upd| async {})
            .build()
            .dispatch()
            .await;
    }
}

async fn on_message(msg: Message, handler: Arc<dyn MessageHandler>) -> ResponseResult<()> {
    dispatch(&msg, handler);
    Ok(())
}

/// Convert `msg` and spawn the handler on it. Bot-authored messages are skipped.
///
/// Spawning keeps the dispatcher free, so an overlapping message reaches the
/// session guard instead of queueing behind the one in flight.
pub fn dispatch(msg: &Message, handler: Arc<dyn MessageHandler>) {
    let Some(incoming) = incoming_from(msg) else {
        debug!(message_id = msg.id.0, "ignoring message from a bot");
        return;
    };
    tokio::spawn(async move {
        let outcome = handler.handle(&incoming).await;
        debug!(chat_id = incoming.chat_id, ?outcome, "message handled");
    });
}
