//! Bulk registration of slash commands with the Discord HTTP API.
//!
//! `PUT /applications/{app_id}/commands` replaces the whole global command
//! set; the guild variant replaces one guild's set and takes effect
//! immediately, which is what you want while developing.

use discord_interactions_types::CommandDefinition;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::config::RegisterConfig;

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Discord API error ({status}): {body}")]
    Api { status: u16, body: String },
}

/// A command as echoed back by Discord after registration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisteredCommand {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

pub struct CommandRegistrar {
    client: Client,
    config: RegisterConfig,
}

impl CommandRegistrar {
    pub fn new(config: RegisterConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: RegisterConfig, client: Client) -> Self {
        Self { client, config }
    }

    pub fn commands_url(&self) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        match &self.config.guild_id {
            Some(guild) => format!(
                "{base}/applications/{}/guilds/{guild}/commands",
                self.config.app_id
            ),
            None => format!("{base}/applications/{}/commands", self.config.app_id),
        }
    }

    /// Replace the registered command set with `definitions`.
    pub async fn overwrite(
        &self,
        definitions: &[CommandDefinition],
    ) -> Result<Vec<RegisteredCommand>, RegisterError> {
        let url = self.commands_url();
        let resp = self
            .client
            .put(&url)
            .header("Authorization", format!("Bot {}", self.config.bot_token))
            .json(definitions)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RegisterError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let registered: Vec<RegisteredCommand> = resp.json().await?;
        info!(
            count = registered.len(),
            guild = self.config.guild_id.as_deref().unwrap_or("global"),
            "Registered commands"
        );
        Ok(registered)
    }
}
