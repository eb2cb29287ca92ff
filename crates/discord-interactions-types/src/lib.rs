//! Shared types for Discord HTTP interactions.
//!
//! - [`interaction`]: inbound webhook payloads, validated into the
//!   [`Interaction`] sum type at the boundary.
//! - [`command`]: application command schemas, used both for bulk
//!   registration and for runtime option validation.
//! - [`response`]: the outbound [`InteractionResponse`] envelope. Its fields
//!   are private; the formatter constructors are the only way to build one.

pub mod command;
pub mod interaction;
pub mod response;

pub use command::{CommandDefinition, OptionDefinition, OptionType};
pub use interaction::{CommandData, CommandOption, Interaction, InteractionParseError, OptionValue};
pub use response::{Embed, EmbedMedia, InteractionResponse, ResponseData, ResponseKind};
