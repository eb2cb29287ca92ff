//! # trogon-interactions
//!
//! Discord HTTP interactions endpoint serving media lookup slash commands.
//!
//! ## How it works
//!
//! 1. Discord sends `POST /interactions` with `X-Signature-Ed25519` and
//!    `X-Signature-Timestamp` headers plus a JSON payload.
//! 2. The server verifies the Ed25519 signature of `timestamp ‖ body` against
//!    `DISCORD_PUBLIC_KEY`; anything unsigned is answered `401`.
//! 3. `PING` is answered with `PONG`. Application commands are routed through
//!    the [`CommandRegistry`]; the asset name is checked against the command's
//!    catalog before anything else happens.
//! 4. The [`MediaResolver`] checks the blob store for the asset's image and
//!    audio concurrently and signs a time-limited URL for each one found.
//! 5. The reply is a single embed; every user-facing error is ephemeral.
//!
//! ## Commands
//!
//! | Command | Image | Audio |
//! |---|---|---|
//! | `/pkmn name:<pokemon>` | `sprites/{name}.png` | `cries/{name}.mp3` |
//! | `/sample name:<sample>` | `samples/images/{name}.png` | `samples/audio/{name}.mp3` |
//!
//! ## Configuration (env vars)
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `DISCORD_PUBLIC_KEY` | required | Hex Ed25519 public key of the application |
//! | `INTERACTIONS_PORT` | `8080` | HTTP listening port |
//! | `MEDIA_URL_TTL_SECS` | `3600` | Validity of issued media URLs, at most 604800 |
//! | `MEDIA_CALL_TIMEOUT_SECS` | `1` | Bound on each blob store call |
//! | `BLOB_BACKEND` | `gcs` | `gcs` or `memory` |
//! | `GCS_BUCKET` | required | Bucket holding the media (gcs) |
//! | `GCS_HMAC_ACCESS_ID` / `GCS_HMAC_SECRET` | required | HMAC key used for V4 signing (gcs) |
//! | `GCS_ENDPOINT` | `https://storage.googleapis.com` | Storage endpoint |
//! | `PKMN_CATALOG_PATH` / `SAMPLE_CATALOG_PATH` | bundled | Replace a command's catalog |
//!
//! `register-commands` additionally reads `DISCORD_APP_ID`, `DISCORD_BOT_TOKEN`,
//! `DISCORD_GUILD_ID` and `DISCORD_API_BASE`. `DISCORD_TOKEN` is still accepted
//! when `DISCORD_BOT_TOKEN` is unset.

pub mod blob;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod env;
pub mod media;
pub mod register;
pub mod registry;
pub mod server;
pub mod signature;

pub use blob::{BlobError, BlobStore, GcsBlobStore, MemoryBlobStore};
pub use catalog::Catalog;
pub use config::{BlobBackend, InteractionsConfig, RegisterConfig};
pub use dispatcher::Dispatcher;
pub use media::{MediaLayout, MediaResolver, ResolveMedia};
pub use registry::{CommandHandler, CommandRegistry};
pub use server::serve;
pub use signature::InteractionVerifier;
