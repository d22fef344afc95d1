// src/notify/webhook.rs

//! Discord-compatible webhook sender.
//!
//! Thin delivery collaborator: one JSON POST per message. Connection
//! lifecycle, authentication, and command handling live outside the watcher.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::NotifyConfig;
use crate::notify::ChatSender;

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Sends messages via a Discord-compatible webhook endpoint.
pub struct WebhookSender {
    client: Client,
    webhook_url: String,
}

impl WebhookSender {
    /// Create a sender for the configured webhook.
    pub fn new(config: &NotifyConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.send_timeout_seconds))
            .build()
            .map_err(|e| AppError::config(format!("webhook client: {e}")))?;

        Ok(Self {
            client,
            webhook_url: config.webhook_url.clone(),
        })
    }
}

#[async_trait]
impl ChatSender for WebhookSender {
    async fn send(&self, channel_id: &str, text: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&WebhookPayload { content: text })
            .send()
            .await
            .map_err(|e| AppError::delivery(format!("channel {channel_id}: {e}")))?;

        response
            .error_for_status()
            .map_err(|e| AppError::delivery(format!("channel {channel_id}: {e}")))?;

        log::debug!("Delivered {} chars to channel {}", text.len(), channel_id);
        Ok(())
    }
}
