//! Routes a verified interaction to its command handler.
//!
//! Every path ends in an [`InteractionResponse`]: user mistakes become
//! ephemeral error replies, handler failures and panics are logged and
//! replaced by a generic message. The subject option is validated against
//! the command's catalog before the handler runs, so invalid input never
//! reaches the blob store.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use discord_interactions_types::{
    CommandData, Interaction, InteractionParseError, InteractionResponse,
};
use futures_util::FutureExt;
use tracing::{error, info, warn};

use crate::catalog::Catalog;
use crate::media::ResolveMedia;
use crate::registry::{CommandContext, CommandRegistry, Subject};

const UNSUPPORTED: &str = "Unsupported interaction type";
const MALFORMED: &str = "Malformed interaction payload";
const PANICKED: &str = "Something went wrong";

pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
    media: Arc<dyn ResolveMedia>,
}

/// Why a subject value was refused.
enum InvalidSubject {
    Missing,
    Unknown(String),
}

impl InvalidSubject {
    fn message(&self, subject: &Subject) -> String {
        match self {
            Self::Missing => format!("Please provide a {} name", subject.noun),
            Self::Unknown(value) => {
                let mut message = format!(
                    "{} \"{value}\" not found. Try checking the spelling!",
                    subject.noun
                );
                if subject.catalog.is_small() {
                    message.push_str(" Available: ");
                    message.push_str(&subject.catalog.names().join(", "));
                }
                message
            }
        }
    }
}

impl Dispatcher {
    pub fn new(registry: Arc<CommandRegistry>, media: Arc<dyn ResolveMedia>) -> Self {
        Self { registry, media }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Parse a raw body and dispatch it.
    ///
    /// A body that is not an interaction at all is returned as `Err` so the
    /// transport can reject it; a malformed command is answered in-band.
    pub async fn dispatch_payload(
        &self,
        body: &[u8],
    ) -> Result<InteractionResponse, InteractionParseError> {
        match Interaction::from_slice(body) {
            Ok(interaction) => Ok(self.dispatch(interaction).await),
            Err(InteractionParseError::MalformedCommand(reason)) => {
                warn!(reason = %reason, "Malformed application command");
                Ok(InteractionResponse::error(MALFORMED))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn dispatch(&self, interaction: Interaction) -> InteractionResponse {
        tracing::Span::current().record("interaction", interaction.label());

        match interaction {
            Interaction::Ping => {
                info!("Responding to ping");
                InteractionResponse::pong()
            }
            Interaction::ApplicationCommand(data) => self.run_command(data).await,
            Interaction::Unsupported(kind) => {
                warn!(kind, "Unsupported interaction type");
                InteractionResponse::error(UNSUPPORTED)
            }
        }
    }

    async fn run_command(&self, data: CommandData) -> InteractionResponse {
        tracing::Span::current().record("command", data.name.as_str());

        let Some(handler) = self.registry.get(&data.name) else {
            warn!(command = %data.name, "Unknown command");
            return InteractionResponse::error(format!("Unknown command: {}", data.name));
        };

        let subject = handler.subject();
        let name = match subject_value(subject, &data) {
            Ok(name) => name,
            Err(invalid) => {
                info!(command = %data.name, "Rejected command input");
                return InteractionResponse::error(invalid.message(subject));
            }
        };

        let ctx = CommandContext {
            name: &name,
            media: self.media.as_ref(),
        };

        match AssertUnwindSafe(handler.run(ctx)).catch_unwind().await {
            Ok(Ok(response)) => {
                info!(command = %data.name, name = %name, "Command handled");
                response
            }
            Ok(Err(e)) => {
                error!(command = %data.name, name = %name, error = %e, "Command failed");
                InteractionResponse::error(format!("Failed to fetch {} media", subject.noun))
            }
            Err(panic) => {
                error!(
                    command = %data.name,
                    panic = %panic_message(panic.as_ref()),
                    "Command handler panicked"
                );
                InteractionResponse::error(PANICKED)
            }
        }
    }
}

/// The normalized subject value, if present and known.
fn subject_value(subject: &Subject, data: &CommandData) -> Result<String, InvalidSubject> {
    let raw = data
        .option(&subject.option)
        .and_then(|opt| opt.as_str())
        .ok_or(InvalidSubject::Missing)?;

    let name = Catalog::normalize(raw);
    if name.is_empty() {
        return Err(InvalidSubject::Missing);
    }
    if !subject.catalog.contains(&name) {
        return Err(InvalidSubject::Unknown(name));
    }
    Ok(name)
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
