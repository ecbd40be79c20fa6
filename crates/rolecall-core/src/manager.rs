//! The reaction-role state machine.
//!
//! `RoleManager` owns the canonical in-memory copy of every guild's
//! binding table. All mutating operations on one guild are serialized
//! behind that guild's async mutex and persisted before success is
//! reported; platform calls that do not feed a table mutation happen
//! after the lock is released.

#[path = "manager_tests.rs"]
mod manager_tests;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;
use tracing::warn;

use crate::emoji::EmojiRef;
use crate::error::RoleError;
use crate::host::RoleHost;
use crate::state::GuildRoleState;
use crate::store::StateStore;

/// Result of a `bind` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    /// No role with this name existed; one was created and bound.
    Created { role_id: u64 },
    /// A platform role with this name already existed; a binding was
    /// recorded against it without creating anything.
    BoundWithoutRole,
    /// The name is already in the table; nothing changed.
    AlreadyBound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Add,
    Remove,
}

/// One inbound reaction event, already stripped of platform types.
#[derive(Debug, Clone)]
pub struct ReactionEvent {
    pub kind: ReactionKind,
    pub guild_id: u64,
    pub message_id: u64,
    pub user_id: u64,
    pub emoji: EmojiRef,
}

/// Terminal state of the reaction handler. The `Ignored*` variants are
/// deliberate no-ops, never errors, so the event dispatcher is never
/// interrupted by them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionOutcome {
    /// The bot's own reaction-seeding.
    OwnReaction,
    /// Reaction on something other than the current anchor message.
    ForeignMessage,
    /// Reacting user is not a resolvable guild member.
    UnknownMember,
    /// No binding for this emoji.
    UnboundEmoji,
    /// Binding exists but its role id is absent or no longer live.
    StaleRole,
    Granted { role_name: String },
    Revoked { role_name: String },
}

pub struct RoleManager {
    store: StateStore,
    guilds: StdMutex<HashMap<u64, Arc<Mutex<GuildRoleState>>>>,
    bot_user_id: AtomicU64,
}

impl RoleManager {
    pub fn new(store: StateStore) -> Self {
        Self {
            store,
            guilds: StdMutex::new(HashMap::new()),
            bot_user_id: AtomicU64::new(0),
        }
    }

    /// Store the bot's own user id (called from the ready handler).
    pub fn set_bot_user_id(&self, id: u64) {
        self.bot_user_id.store(id, Ordering::Relaxed);
    }

    pub fn bot_user_id(&self) -> u64 {
        self.bot_user_id.load(Ordering::Relaxed)
    }

    /// The lockable state for one guild, loaded from disk on first touch.
    fn guild(&self, guild_id: u64) -> Arc<Mutex<GuildRoleState>> {
        let mut map = match self.guilds.lock() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.entry(guild_id)
            .or_insert_with(|| Arc::new(Mutex::new(self.store.load(guild_id))))
            .clone()
    }

    /// Bind `name` to the emoji the administrator typed, creating the
    /// platform role only when no role with that name exists yet.
    pub async fn bind<H: RoleHost>(
        &self,
        host: &H,
        guild_id: u64,
        emoji_text: &str,
        name: &str,
    ) -> Result<BindOutcome, RoleError> {
        let emoji_key = EmojiRef::parse(emoji_text).canonical_key();
        let entry = self.guild(guild_id);
        let mut state = entry.lock().await;

        if host.find_role(guild_id, name).await.is_some() {
            if state.contains_name(name) {
                return Ok(BindOutcome::AlreadyBound);
            }
            // The role predates the bot; its id is not captured, so the
            // binding stays pending until the list is republished against
            // a recreated role.
            state.push_binding(name, emoji_key, None);
            self.store.persist(guild_id, &state)?;
            return Ok(BindOutcome::BoundWithoutRole);
        }

        let role_id = host.create_role(guild_id, name).await?;
        state.push_binding(name, emoji_key, Some(role_id));
        self.store.persist(guild_id, &state)?;
        Ok(BindOutcome::Created { role_id })
    }

    /// Publish the role list to a channel and make the resulting message
    /// the new anchor. Reactions are attached in table order after the
    /// anchor is persisted; a failed attach surfaces the error without
    /// rolling back reactions that already went through.
    pub async fn publish_list<H: RoleHost>(
        &self,
        host: &H,
        guild_id: u64,
        channel_id: u64,
    ) -> Result<u64, RoleError> {
        let entry = self.guild(guild_id);
        let snapshot;
        let message_id;
        {
            let mut state = entry.lock().await;
            if state.roles.is_empty() {
                return Err(RoleError::EmptyBindingSet);
            }
            snapshot = state.snapshot();
            let body = render_role_list(&snapshot);
            message_id = host.send_message(channel_id, &body).await?;
            state.list_message_id = message_id;
            self.store.persist(guild_id, &state)?;
        }

        for (_, emoji) in &snapshot {
            host.add_reaction(channel_id, message_id, &EmojiRef::parse(emoji))
                .await?;
        }
        Ok(message_id)
    }

    /// Remove a binding by role name, then best-effort delete the
    /// underlying platform role.
    pub async fn remove_role<H: RoleHost>(
        &self,
        host: &H,
        guild_id: u64,
        name: &str,
    ) -> Result<(), RoleError> {
        let entry = self.guild(guild_id);
        let removed = {
            let mut state = entry.lock().await;
            let removed = state.remove_by_name(name);
            // Removal attempts always persist, found or not.
            self.store.persist(guild_id, &state)?;
            removed
        };

        let Some(binding) = removed else {
            return Err(RoleError::NotFound(format!("role '{name}'")));
        };

        let role_id = match binding.id {
            Some(id) => Some(id),
            None => host.find_role(guild_id, name).await,
        };
        if let Some(role_id) = role_id {
            host.delete_role(guild_id, role_id).await?;
        }
        Ok(())
    }

    pub async fn set_log_channel(&self, guild_id: u64, channel_id: u64) -> Result<(), RoleError> {
        let entry = self.guild(guild_id);
        let mut state = entry.lock().await;
        state.log_channel_id = channel_id;
        self.store.persist(guild_id, &state)
    }

    /// Run one reaction event through the state machine.
    ///
    /// Returns an `Ignored*` outcome for every terminal no-op; only a
    /// failed grant/revoke propagates as an error, and callers log it
    /// rather than letting it reach the dispatcher.
    pub async fn handle_reaction<H: RoleHost>(
        &self,
        host: &H,
        event: &ReactionEvent,
    ) -> Result<ReactionOutcome, RoleError> {
        if event.user_id == self.bot_user_id() {
            return Ok(ReactionOutcome::OwnReaction);
        }

        let emoji_key = event.emoji.canonical_key();
        let (anchor, log_channel, binding) = {
            let entry = self.guild(event.guild_id);
            let state = entry.lock().await;
            (
                state.list_message(),
                state.log_channel(),
                state.lookup_by_emoji(&emoji_key).cloned(),
            )
        };

        if anchor != Some(event.message_id) {
            return Ok(ReactionOutcome::ForeignMessage);
        }
        if !host.member_exists(event.guild_id, event.user_id).await {
            return Ok(ReactionOutcome::UnknownMember);
        }
        let Some(binding) = binding else {
            return Ok(ReactionOutcome::UnboundEmoji);
        };
        let Some(role_id) = binding.id else {
            return Ok(ReactionOutcome::StaleRole);
        };
        let Some(role_name) = host.role_name(event.guild_id, role_id).await else {
            return Ok(ReactionOutcome::StaleRole);
        };

        match event.kind {
            ReactionKind::Add => host.grant_role(event.guild_id, event.user_id, role_id).await?,
            ReactionKind::Remove => {
                host.revoke_role(event.guild_id, event.user_id, role_id).await?
            }
        }

        if let Some(log_channel) = log_channel {
            let line = audit_line(event.kind, event.user_id, &emoji_key, &role_name);
            if let Err(e) = host.send_message(log_channel, &line).await {
                warn!(
                    "Failed to send audit line to channel {} in guild {}: {}",
                    log_channel, event.guild_id, e
                );
            }
        }

        Ok(match event.kind {
            ReactionKind::Add => ReactionOutcome::Granted { role_name },
            ReactionKind::Remove => ReactionOutcome::Revoked { role_name },
        })
    }

    /// Drop the binding for a role the platform reports as deleted.
    /// Persists whether or not a binding matched.
    pub async fn prune_deleted_role(
        &self,
        guild_id: u64,
        role_id: u64,
        role_name: Option<&str>,
    ) -> Result<bool, RoleError> {
        let entry = self.guild(guild_id);
        let mut state = entry.lock().await;
        let removed = role_name
            .and_then(|name| state.remove_by_name(name))
            .or_else(|| state.remove_by_role_id(role_id));
        self.store.persist(guild_id, &state)?;
        Ok(removed.is_some())
    }

    /// Current (name, emoji) pairs in table order.
    pub async fn snapshot(&self, guild_id: u64) -> Vec<(String, String)> {
        let entry = self.guild(guild_id);
        let state = entry.lock().await;
        state.snapshot()
    }
}

/// Body of the role list message: one `- {emoji} {name}` line per
/// binding, in table order.
pub fn render_role_list(snapshot: &[(String, String)]) -> String {
    let lines: Vec<String> = snapshot
        .iter()
        .map(|(name, emoji)| format!("- {emoji} {name}"))
        .collect();
    format!("**Server Roles:**\n{}", lines.join("\n"))
}

fn audit_line(kind: ReactionKind, user_id: u64, emoji_key: &str, role_name: &str) -> String {
    match kind {
        ReactionKind::Add => {
            format!("<@{user_id}> reacted with {emoji_key} and received the {role_name} role!")
        }
        ReactionKind::Remove => {
            format!("<@{user_id}> removed their {emoji_key} reaction - {role_name} role removed.")
        }
    }
}
