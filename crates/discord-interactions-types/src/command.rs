//! Application command schemas.
//!
//! Serialized exactly as Discord's bulk-overwrite endpoint expects them, so
//! the same definitions drive both registration and runtime validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `type` of a slash command (`CHAT_INPUT`).
pub const CHAT_INPUT: u8 = 1;

/// Option value type, serialized as Discord's integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum OptionType {
    String,
    Integer,
    Boolean,
    Number,
}

#[derive(Debug, Error)]
#[error("unknown option type {0}")]
pub struct UnknownOptionType(pub u8);

impl From<OptionType> for u8 {
    fn from(value: OptionType) -> Self {
        match value {
            OptionType::String => 3,
            OptionType::Integer => 4,
            OptionType::Boolean => 5,
            OptionType::Number => 10,
        }
    }
}

impl TryFrom<u8> for OptionType {
    type Error = UnknownOptionType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(OptionType::String),
            4 => Ok(OptionType::Integer),
            5 => Ok(OptionType::Boolean),
            10 => Ok(OptionType::Number),
            other => Err(UnknownOptionType(other)),
        }
    }
}

/// One declared option of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: OptionType,
    #[serde(default)]
    pub required: bool,
}

impl OptionDefinition {
    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: OptionType::String,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A slash command as declared to Discord.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDefinition {
    pub name: String,
    #[serde(rename = "type", default = "chat_input")]
    pub kind: u8,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionDefinition>,
}

fn chat_input() -> u8 {
    CHAT_INPUT
}

impl CommandDefinition {
    pub fn chat_input(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: CHAT_INPUT,
            description: description.into(),
            options: Vec::new(),
        }
    }

    pub fn with_option(mut self, option: OptionDefinition) -> Self {
        self.options.push(option);
        self
    }

    pub fn option(&self, name: &str) -> Option<&OptionDefinition> {
        self.options.iter().find(|opt| opt.name == name)
    }
}
