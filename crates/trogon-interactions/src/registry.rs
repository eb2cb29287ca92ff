//! Name → handler table for slash commands.
//!
//! Built once at startup with [`CommandRegistryBuilder`] and shared
//! read-only afterwards. The same table provides the definitions sent to
//! Discord on registration and the lookup used for dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use discord_interactions_types::{CommandDefinition, InteractionResponse, OptionType};
use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::media::{ResolveError, ResolveMedia};

const MAX_NAME_LEN: usize = 32;

/// The option that names the asset a command acts on.
#[derive(Debug, Clone)]
pub struct Subject {
    /// Option name, e.g. `"name"`.
    pub option: String,
    /// Human noun used in replies, e.g. `"Pokemon"`.
    pub noun: String,
    /// Values the option may take.
    pub catalog: Arc<Catalog>,
}

impl Subject {
    pub fn new(option: impl Into<String>, noun: impl Into<String>, catalog: Arc<Catalog>) -> Self {
        Self {
            option: option.into(),
            noun: noun.into(),
            catalog,
        }
    }
}

/// Input handed to a handler once the subject value has been validated.
pub struct CommandContext<'a> {
    /// Normalized subject value, guaranteed to be in the catalog.
    pub name: &'a str,
    pub media: &'a dyn ResolveMedia,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("{0}")]
    Failed(String),
}

pub trait CommandHandler: Send + Sync {
    fn definition(&self) -> &CommandDefinition;

    fn subject(&self) -> &Subject;

    fn run<'a>(
        &'a self,
        ctx: CommandContext<'a>,
    ) -> BoxFuture<'a, Result<InteractionResponse, CommandError>>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command {0:?} is registered more than once")]
    DuplicateCommand(String),

    #[error(
        "invalid command name {0:?}: expected 1-32 lowercase letters, digits, '-' or '_'"
    )]
    InvalidName(String),

    #[error("command {command:?} has no string option {option:?} for its subject")]
    MissingSubjectOption { command: String, option: String },
}

/// Immutable table of registered commands.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    handlers: Vec<Arc<dyn CommandHandler>>,
    by_name: HashMap<String, usize>,
}

impl CommandRegistry {
    pub fn builder() -> CommandRegistryBuilder {
        CommandRegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn CommandHandler>> {
        self.by_name.get(name).map(|&i| &self.handlers[i])
    }

    /// Definitions in registration order.
    pub fn definitions(&self) -> Vec<CommandDefinition> {
        self.handlers
            .iter()
            .map(|handler| handler.definition().clone())
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers
            .iter()
            .map(|handler| handler.definition().name.as_str())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[derive(Default)]
pub struct CommandRegistryBuilder {
    registry: CommandRegistry,
}

impl CommandRegistryBuilder {
    pub fn register<H>(mut self, handler: H) -> Result<Self, RegistryError>
    where
        H: CommandHandler + 'static,
    {
        let definition = handler.definition();
        let name = definition.name.clone();

        if !is_valid_name(&name) {
            return Err(RegistryError::InvalidName(name));
        }
        if self.registry.by_name.contains_key(&name) {
            return Err(RegistryError::DuplicateCommand(name));
        }

        let option = &handler.subject().option;
        let declared = definition
            .option(option)
            .is_some_and(|opt| opt.kind == OptionType::String);
        if !declared {
            return Err(RegistryError::MissingSubjectOption {
                command: name,
                option: option.clone(),
            });
        }

        let index = self.registry.handlers.len();
        self.registry.handlers.push(Arc::new(handler));
        self.registry.by_name.insert(name, index);
        Ok(self)
    }

    pub fn build(self) -> CommandRegistry {
        self.registry
    }
}

fn is_valid_name(name: &str) -> bool {
    let len = name.chars().count();
    (1..=MAX_NAME_LEN).contains(&len)
        && name
            .chars()
            .all(|c| c == '-' || c == '_' || (c.is_alphanumeric() && !c.is_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use discord_interactions_types::OptionDefinition;

    struct Echo {
        definition: CommandDefinition,
        subject: Subject,
    }

    impl Echo {
        fn new(name: &str) -> Self {
            Self {
                definition: CommandDefinition::chat_input(name, "Echo a name")
                    .with_option(OptionDefinition::string("name", "Name").required()),
                subject: Subject::new("name", "thing", Arc::new(Catalog::from_names(["a"]))),
            }
        }
    }

    impl CommandHandler for Echo {
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
            Box::pin(async move { Ok(InteractionResponse::text(ctx.name, false)) })
        }
    }

    #[test]
    fn lookup_and_registration_order() {
        let registry = CommandRegistry::builder()
            .register(Echo::new("zeta"))
            .unwrap()
            .register(Echo::new("alpha"))
            .unwrap()
            .build();

        assert_eq!(registry.len(), 2);
        assert!(registry.get("alpha").is_some());
        assert!(registry.get("beta").is_none());
        assert_eq!(registry.names().collect::<Vec<_>>(), ["zeta", "alpha"]);

        let names: Vec<_> = registry
            .definitions()
            .into_iter()
            .map(|definition| definition.name)
            .collect();
        assert_eq!(names, ["zeta", "alpha"]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = CommandRegistry::builder()
            .register(Echo::new("pkmn"))
            .unwrap()
            .register(Echo::new("pkmn"))
            .err()
            .unwrap();
        assert_eq!(err, RegistryError::DuplicateCommand("pkmn".into()));
    }

    #[test]
    fn invalid_names_are_rejected() {
        for name in ["", "Pkmn", "has space", "way-too-long-for-a-discord-command-name"] {
            let err = CommandRegistry::builder()
                .register(Echo::new(name))
                .err()
                .unwrap();
            assert_eq!(err, RegistryError::InvalidName(name.into()), "{name}");
        }
        assert!(CommandRegistry::builder().register(Echo::new("dex_2-b")).is_ok());
    }

    #[test]
    fn subject_option_must_be_a_declared_string() {
        let mut handler = Echo::new("pkmn");
        handler.subject.option = "pokemon".into();
        let err = CommandRegistry::builder().register(handler).err().unwrap();
        assert_eq!(
            err,
            RegistryError::MissingSubjectOption {
                command: "pkmn".into(),
                option: "pokemon".into(),
            }
        );

        let mut handler = Echo::new("pkmn");
        handler.definition.options[0].kind = OptionType::Integer;
        assert!(CommandRegistry::builder().register(handler).is_err());
    }

    #[test]
    fn empty_registry() {
        let registry = CommandRegistry::builder().build();
        assert!(registry.is_empty());
        assert!(registry.definitions().is_empty());
    }
}
