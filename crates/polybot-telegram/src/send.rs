//! Outbound text splitting.
//!
//! Telegram rejects messages over 4096 characters; we cut at 4090.

/// Maximum characters per Telegram message.
pub const CHUNK_MAX: usize = 4090;

/// Split `text` into chunks of at most [`CHUNK_MAX`] characters.
///
/// Prefers to break at the last newline, then the last space, inside the
/// window. Never splits a UTF-8 sequence.
pub fn split_chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut remaining = text;

    while remaining.chars().count() > CHUNK_MAX {
        // Byte offset of the first char past the window.
        let window_end = remaining
            .char_indices()
            .nth(CHUNK_MAX)
            .map(|(i, _)| i)
            .unwrap_or(remaining.len());
        let window = &remaining[..window_end];
        let split_at = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .filter(|&i| i > 0)
            .unwrap_or(window_end);

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start_matches(['\n', ' ']);
    }

    if !remaining.is_empty() || chunks.is_empty() {
        chunks.push(remaining.to_string());
    }
    chunks
}
