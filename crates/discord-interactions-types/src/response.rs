//! Outbound interaction responses.
//!
//! [`InteractionResponse`] has private fields: every envelope is built by one
//! of the formatter constructors below, which keeps the wire shape identical
//! across all command handlers.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `flags` bit that hides a message from everyone but the invoking user.
pub const EPHEMERAL: u64 = 1 << 6;
/// Discord blurple, used for media embeds.
pub const BLURPLE: u32 = 0x5865F2;
/// Prefix of every error message.
pub const ERROR_PREFIX: &str = "❌ Error: ";

/// Response `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ResponseKind {
    Pong,
    ChannelMessageWithSource,
}

#[derive(Debug, Error)]
#[error("unsupported response type {0}")]
pub struct UnknownResponseKind(pub u8);

impl From<ResponseKind> for u8 {
    fn from(value: ResponseKind) -> Self {
        match value {
            ResponseKind::Pong => 1,
            ResponseKind::ChannelMessageWithSource => 4,
        }
    }
}

impl TryFrom<u8> for ResponseKind {
    type Error = UnknownResponseKind;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ResponseKind::Pong),
            4 => Ok(ResponseKind::ChannelMessageWithSource),
            other => Err(UnknownResponseKind(other)),
        }
    }
}

/// Embed image (just a URL)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedMedia {
    pub url: String,
}

/// Rich embed describing one media asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub color: u32,
    /// RFC 3339 timestamp
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Response `data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    Message { content: String, flags: u64 },
    Embeds { embeds: Vec<Embed> },
}

/// The body returned to Discord for an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    kind: ResponseKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<ResponseData>,
}

impl InteractionResponse {
    /// Acknowledge a verification ping.
    pub fn pong() -> Self {
        Self {
            kind: ResponseKind::Pong,
            data: None,
        }
    }

    /// Plain text reply, optionally visible only to the invoking user.
    pub fn text(message: impl Into<String>, ephemeral: bool) -> Self {
        Self {
            kind: ResponseKind::ChannelMessageWithSource,
            data: Some(ResponseData::Message {
                content: message.into(),
                flags: if ephemeral { EPHEMERAL } else { 0 },
            }),
        }
    }

    /// Ephemeral error reply.
    pub fn error(message: impl AsRef<str>) -> Self {
        Self::text(format!("{ERROR_PREFIX}{}", message.as_ref()), true)
    }

    /// Single-embed reply for a media asset.
    ///
    /// The image block is present only with an `image_url`; the description
    /// (a listen link) only with an `audio_url`. Neither is required.
    pub fn media_embed(
        title: impl Into<String>,
        name: &str,
        audio_url: Option<&str>,
        image_url: Option<&str>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let embed = Embed {
            title: title.into(),
            color: BLURPLE,
            timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            image: image_url.map(|url| EmbedMedia {
                url: url.to_string(),
            }),
            description: audio_url.map(|url| format!("[🔊 Listen to {name}]({url})")),
        };

        Self {
            kind: ResponseKind::ChannelMessageWithSource,
            data: Some(ResponseData::Embeds {
                embeds: vec![embed],
            }),
        }
    }

    pub fn kind(&self) -> ResponseKind {
        self.kind
    }

    pub fn data(&self) -> Option<&ResponseData> {
        self.data.as_ref()
    }

    /// Text content, for message replies.
    pub fn content(&self) -> Option<&str> {
        match &self.data {
            Some(ResponseData::Message { content, .. }) => Some(content),
            _ => None,
        }
    }

    pub fn is_ephemeral(&self) -> bool {
        matches!(&self.data, Some(ResponseData::Message { flags, .. }) if flags & EPHEMERAL != 0)
    }

    /// Whether this is an error reply built by [`InteractionResponse::error`].
    pub fn is_error(&self) -> bool {
        self.is_ephemeral() && self.content().is_some_and(|c| c.starts_with(ERROR_PREFIX))
    }

    pub fn embeds(&self) -> &[Embed] {
        match &self.data {
            Some(ResponseData::Embeds { embeds }) => embeds,
            _ => &[],
        }
    }
}
