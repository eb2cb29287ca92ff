//! Inbound interaction payloads posted by Discord to the webhook.

use serde::Deserialize;
use thiserror::Error;

/// `type` value of a verification ping.
pub const PING: i64 = 1;
/// `type` value of a slash command invocation.
pub const APPLICATION_COMMAND: i64 = 2;

/// A validated inbound interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    /// Endpoint verification ping; must be answered with `PONG`.
    Ping,
    /// A user invoked a slash command.
    ApplicationCommand(CommandData),
    /// Any other interaction type (components, autocomplete, modals …).
    Unsupported(i64),
}

/// `data` of an application command interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandData {
    pub name: String,
    pub options: Vec<CommandOption>,
}

impl CommandData {
    /// First option with the given name, if any.
    pub fn option(&self, name: &str) -> Option<&CommandOption> {
        self.options.iter().find(|opt| opt.name == name)
    }
}

/// A single `{name, type, value}` entry of `data.options`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<u8>,
    #[serde(default)]
    pub value: Option<OptionValue>,
}

impl CommandOption {
    /// The value as a string slice, when the option carries a string.
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            Some(OptionValue::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Scalar option value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
}

/// Why a request body could not be turned into an [`Interaction`].
#[derive(Debug, Error)]
pub enum InteractionParseError {
    /// The body is not a JSON interaction object at all.
    #[error("invalid interaction payload: {0}")]
    NotAnInteraction(#[from] serde_json::Error),

    /// The body is an application command whose `data` is missing or unusable.
    #[error("malformed application command: {0}")]
    MalformedCommand(String),
}

#[derive(Deserialize)]
struct RawInteraction {
    #[serde(rename = "type")]
    kind: i64,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct RawCommandData {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    options: Option<Vec<CommandOption>>,
}

impl Interaction {
    /// Parse and validate a raw webhook body.
    pub fn from_slice(body: &[u8]) -> Result<Self, InteractionParseError> {
        let raw: RawInteraction = serde_json::from_slice(body)?;

        match raw.kind {
            PING => Ok(Interaction::Ping),
            APPLICATION_COMMAND => {
                let data = raw.data.ok_or_else(|| {
                    InteractionParseError::MalformedCommand("missing data".to_string())
                })?;
                let data: RawCommandData = serde_json::from_value(data)
                    .map_err(|e| InteractionParseError::MalformedCommand(e.to_string()))?;
                let name = data
                    .name
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| {
                        InteractionParseError::MalformedCommand("missing command name".to_string())
                    })?;

                Ok(Interaction::ApplicationCommand(CommandData {
                    name,
                    options: data.options.unwrap_or_default(),
                }))
            }
            other => Ok(Interaction::Unsupported(other)),
        }
    }

    /// Short label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Interaction::Ping => "ping",
            Interaction::ApplicationCommand(_) => "application_command",
            Interaction::Unsupported(_) => "unsupported",
        }
    }
}
