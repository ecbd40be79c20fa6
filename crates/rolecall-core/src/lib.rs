//! Core state model for the rolecall reaction-role bot.
//!
//! Everything in this crate is platform-independent: the role binding
//! table, the canonical emoji identity, the per-guild JSON state store,
//! and the `RoleManager` state machine that drives them. The Discord
//! side is reached only through the `RoleHost`/`ChannelHost` capability
//! traits, which the `rolecall-bot` binary implements with serenity.

pub mod emoji;
pub mod error;
pub mod host;
pub mod manager;
pub mod state;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod mocks;

pub use emoji::EmojiRef;
pub use error::RoleError;
pub use host::{CategoryInfo, ChannelHost, RoleHost};
pub use manager::{BindOutcome, ReactionEvent, ReactionKind, ReactionOutcome, RoleManager};
pub use state::{GuildRoleState, RoleBinding};
pub use store::StateStore;
