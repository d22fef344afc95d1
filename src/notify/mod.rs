//! Change announcement layer.
//!
//! Formats change events into chat messages and delivers them through a
//! [`ChatSender`]. Events are batched into as few messages as the channel's
//! size limit allows; an empty event list produces no messages at all.

pub mod webhook;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ChangeEvent, NotifyConfig};

// Re-export for convenience
pub use webhook::WebhookSender;

/// Minimal chat delivery capability.
///
/// The watcher core does not manage connection lifecycle, command parsing,
/// or permissions; it only needs this single send operation.
#[async_trait]
pub trait ChatSender: Send + Sync {
    /// Deliver one message to the given channel.
    async fn send(&self, channel_id: &str, text: &str) -> Result<()>;
}

/// Formats and delivers change announcements.
pub struct Notifier {
    sender: Arc<dyn ChatSender>,
    channel_id: String,
    char_limit: usize,
}

impl Notifier {
    /// Create a notifier for the configured channel.
    pub fn new(sender: Arc<dyn ChatSender>, config: &NotifyConfig) -> Self {
        Self {
            sender,
            channel_id: config.channel_id.clone(),
            char_limit: config.message_char_limit,
        }
    }

    /// Announce the given events, in order.
    ///
    /// Returns the number of messages sent. A delivery failure propagates to
    /// the caller; it is a tick failure, never silently swallowed.
    pub async fn announce(&self, events: &[ChangeEvent]) -> Result<usize> {
        if events.is_empty() {
            return Ok(0);
        }

        let lines: Vec<String> = events.iter().map(ChangeEvent::headline).collect();
        let messages = batch_lines(&lines, self.char_limit);

        for message in &messages {
            self.sender.send(&self.channel_id, message).await?;
        }

        log::info!(
            "Announced {} events in {} messages",
            events.len(),
            messages.len()
        );
        Ok(messages.len())
    }
}

/// Pack lines into messages no longer than `char_limit`.
///
/// Lines are packed greedily in order; a single line longer than the limit
/// is hard-split so it can still be delivered.
pub fn batch_lines(lines: &[String], char_limit: usize) -> Vec<String> {
    let mut messages = Vec::new();
    let mut current = String::new();

    for line in lines {
        let mut pieces: Vec<&str> = Vec::new();
        if line.len() <= char_limit {
            pieces.push(line);
        } else {
            let mut rest = line.as_str();
            while !rest.is_empty() {
                let mut end = rest.len().min(char_limit);
                while !rest.is_char_boundary(end) {
                    end -= 1;
                }
                if end == 0 {
                    // Limit smaller than one character; take it whole anyway.
                    end = rest.chars().next().map_or(rest.len(), char::len_utf8);
                }
                pieces.push(&rest[..end]);
                rest = &rest[end..];
            }
        }

        for piece in pieces {
            let needed = if current.is_empty() {
                piece.len()
            } else {
                current.len() + 1 + piece.len()
            };
            if needed > char_limit && !current.is_empty() {
                messages.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(piece);
        }
    }

    if !current.is_empty() {
        messages.push(current);
    }
    messages
}
