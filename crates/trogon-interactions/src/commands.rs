//! Built-in media lookup commands.

use std::sync::Arc;

use chrono::Utc;
use discord_interactions_types::{CommandDefinition, InteractionResponse, OptionDefinition};
use futures_util::future::BoxFuture;

use crate::catalog::Catalog;
use crate::media::MediaLayout;
use crate::registry::{
    CommandContext, CommandError, CommandHandler, CommandRegistry, RegistryError, Subject,
};

const SUBJECT_OPTION: &str = "name";

/// Looks up one named asset and replies with an embed of its image and audio.
pub struct MediaCommand {
    definition: CommandDefinition,
    subject: Subject,
    layout: MediaLayout,
    title_prefix: String,
}

impl MediaCommand {
    pub fn new(
        definition: CommandDefinition,
        subject: Subject,
        layout: MediaLayout,
        title_prefix: impl Into<String>,
    ) -> Self {
        Self {
            definition,
            subject,
            layout,
            title_prefix: title_prefix.into(),
        }
    }

    /// `/pkmn name:<string>`
    pub fn pokemon(catalog: Arc<Catalog>) -> Self {
        Self::new(
            CommandDefinition::chat_input("pkmn", "Get a Pokemon's sprite and cry").with_option(
                OptionDefinition::string(SUBJECT_OPTION, "Name of the Pokemon").required(),
            ),
            Subject::new(SUBJECT_OPTION, "Pokemon", catalog),
            MediaLayout::new()
                .with_image("sprites/{name}.png")
                .with_audio("cries/{name}.mp3"),
            "Pokemon",
        )
    }

    /// `/sample name:<string>`
    pub fn sample(catalog: Arc<Catalog>) -> Self {
        Self::new(
            CommandDefinition::chat_input("sample", "Play an audio sample").with_option(
                OptionDefinition::string(SUBJECT_OPTION, "Name of the sample").required(),
            ),
            Subject::new(SUBJECT_OPTION, "sample", catalog),
            MediaLayout::new()
                .with_image("samples/images/{name}.png")
                .with_audio("samples/audio/{name}.mp3"),
            "Sample",
        )
    }
}

impl CommandHandler for MediaCommand {
    fn definition(&self) -> &CommandDefinition {
        &self.definition
    }

    fn subject(&self) -> &Subject {
        &self.subject
    }

    fn run<'a>(
        &'a self,
        ctx: CommandContext<'a>,
    ) -> BoxFuture<'a, Result<InteractionResponse, CommandError>> {
        Box::pin(async move {
            let media = ctx.media.resolve(ctx.name, &self.layout).await?;
            Ok(InteractionResponse::media_embed(
                format!("{}: {}", self.title_prefix, ctx.name),
                ctx.name,
                media.audio_url.as_deref(),
                media.image_url.as_deref(),
                Utc::now(),
            ))
        })
    }
}

/// Registry with `/pkmn` and `/sample`.
pub fn default_registry(
    pokemon: Arc<Catalog>,
    samples: Arc<Catalog>,
) -> Result<CommandRegistry, RegistryError> {
    Ok(CommandRegistry::builder()
        .register(MediaCommand::pokemon(pokemon))?
        .register(MediaCommand::sample(samples))?
        .build())
}
