use teloxide::types::Message;

use polybot_core::{IncomingMessage, PhotoRef};

/// Convert a Telegram message into the transport-neutral shape.
///
/// Returns `None` for messages authored by bots. Attachment 0 is the largest
/// size of the message's own photo; attachment 1 is the largest size of the
/// photo it replies to, if any.
pub fn incoming_from(msg: &Message) -> Option<IncomingMessage> {
    if msg.from.as_ref().map(|u| u.is_bot).unwrap_or(false) {
        return None;
    }

    let mut photos = Vec::new();
    if let Some(own) = largest_photo(msg) {
        photos.push(own);
        if let Some(replied) = msg.reply_to_message().and_then(largest_photo) {
            photos.push(replied);
        }
    }

    Some(IncomingMessage {
        message_id: msg.id.0,
        chat_id: msg.chat.id.0,
        text: msg.text().map(str::to_string),
        caption: msg.caption().map(str::to_string),
        photos,
    })
}

fn largest_photo(msg: &Message) -> Option<PhotoRef> {
    msg.photo()
        .and_then(|sizes| sizes.last())
        .map(|p| PhotoRef::new(p.file.id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo_json(id: &str, reply: Option<serde_json::Value>) -> serde_json::Value {
        let mut v = serde_json::json!({
            "message_id": 10,
            "date": 1700000000,
            "chat": {"id": 42, "type": "private", "first_name": "Ada"},
            "from": {"id": 42, "is_bot": false, "first_name": "Ada"},
            "photo": [
                {"file_id": format!("{id}-small"), "file_unique_id": "s", "width": 90, "height": 90, "file_size": 100},
                {"file_id": format!("{id}-large"), "file_unique_id": "l", "width": 800, "height": 800, "file_size": 9000}
            ],
            "caption": "concat"
        });
        if let Some(reply) = reply {
            v["reply_to_message"] = reply;
        }
        v
    }

    #[test]
    fn takes_largest_sizes_of_own_and_replied_photo() {
        let replied = photo_json("first", None);
        let msg: Message = serde_json::from_value(photo_json("second", Some(replied))).unwrap();
        let incoming = incoming_from(&msg).unwrap();
        assert_eq!(incoming.chat_id, 42);
        assert_eq!(incoming.message_id, 10);
        assert_eq!(incoming.caption.as_deref(), Some("concat"));
        assert_eq!(
            incoming.photos,
            vec![PhotoRef::new("second-large"), PhotoRef::new("first-large")]
        );
    }

    #[test]
    fn text_message_has_no_photos() {
        let msg: Message = serde_json::from_value(serde_json::json!({
            "message_id": 3,
            "date": 1700000000,
            "chat": {"id": 42, "type": "private", "first_name": "Ada"},
            "from": {"id": 42, "is_bot": false, "first_name": "Ada"},
            "text": "hello"
        }))
        .unwrap();
        let incoming = incoming_from(&msg).unwrap();
        assert_eq!(incoming.text.as_deref(), Some("hello"));
        assert!(incoming.photos.is_empty());
    }

    #[test]
    fn bot_authors_are_ignored() {
        let mut v = photo_json("x", None);
        v["from"]["is_bot"] = serde_json::Value::Bool(true);
        let msg: Message = serde_json::from_value(v).unwrap();
        assert!(incoming_from(&msg).is_none());
    }
}
