//! Serenity event handler implementation

use std::sync::Arc;

use serenity::async_trait;
use serenity::model::channel::{Message, Reaction};
use serenity::model::gateway::Ready;
use serenity::model::guild::Role;
use serenity::model::id::{GuildId, RoleId, UserId};
use serenity::prelude::*;
use tracing::{error, info};

use rolecall_core::{ReactionEvent, ReactionKind, RoleManager};

use crate::commands;
use crate::errors::log_error;
use crate::health::AppState;
use crate::host::{emoji_ref, DiscordHost};

/// Everything the event handlers need, shared through the client's TypeMap.
pub struct BotState {
    pub manager: Arc<RoleManager>,
    pub host: DiscordHost,
    pub prefix: String,
}

impl TypeMapKey for BotState {
    type Value = Arc<BotState>;
}

pub struct Handler;

impl Handler {
    async fn state(ctx: &Context) -> Option<Arc<BotState>> {
        let data = ctx.data.read().await;
        match data.get::<BotState>() {
            Some(s) => Some(s.clone()),
            None => {
                error!("BotState not found in context data");
                None
            }
        }
    }

    async fn dispatch_reaction(ctx: Context, reaction: Reaction, kind: ReactionKind) {
        // Reaction role assignment only exists inside guilds.
        let Some(guild_id) = reaction.guild_id else {
            return;
        };
        let Some(user_id) = reaction.user_id else {
            return;
        };
        let Some(state) = Self::state(&ctx).await else {
            return;
        };

        let event = ReactionEvent {
            kind,
            guild_id: guild_id.get(),
            message_id: reaction.message_id.get(),
            user_id: user_id.get(),
            emoji: emoji_ref(&reaction.emoji),
        };

        if let Err(e) = state.manager.handle_reaction(&state.host, &event).await {
            log_error("Reaction handling failed", &e);
        }
    }
}

/// Whether the author may run administration commands: the guild owner,
/// or any member whose computed permissions include ADMINISTRATOR.
async fn author_is_admin(ctx: &Context, guild_id: GuildId, user_id: UserId) -> bool {
    let member = match guild_id.member(ctx, user_id).await {
        Ok(m) => m,
        Err(_) => return false,
    };
    let Some(guild) = ctx.cache.guild(guild_id) else {
        return false;
    };
    guild.owner_id == user_id || guild.member_permissions(&member).administrator()
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            "Discord bot connected as {} ({} guilds)",
            ready.user.name,
            ready.guilds.len()
        );

        let data = ctx.data.read().await;
        if let Some(state) = data.get::<BotState>() {
            state.manager.set_bot_user_id(ready.user.id.get());
        }
        if let Some(health) = data.get::<AppState>() {
            health
                .set_connected(ready.user.name.clone(), ready.guilds.len())
                .await;
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Skip bot messages
        if msg.author.bot {
            return;
        }
        // Commands only work in guild channels, not DMs.
        let Some(guild_id) = msg.guild_id else {
            return;
        };
        let Some(state) = Self::state(&ctx).await else {
            return;
        };

        let Some(parsed) = commands::parse(&state.prefix, &msg.content) else {
            return;
        };

        // Permission gate comes before argument validation.
        let reply = if !author_is_admin(&ctx, guild_id, msg.author.id).await {
            "🚫 You don't have permission to use this command.".to_string()
        } else {
            match parsed {
                Err(usage) => usage,
                Ok(cmd) => {
                    commands::execute(cmd, &state.host, &state.manager, guild_id.get(), &state.prefix)
                        .await
                }
            }
        };

        if let Err(e) = msg.channel_id.say(&ctx.http, reply).await {
            error!("Failed to reply in channel {}: {}", msg.channel_id, e);
        }
    }

    async fn reaction_add(&self, ctx: Context, add_reaction: Reaction) {
        Self::dispatch_reaction(ctx, add_reaction, ReactionKind::Add).await;
    }

    async fn reaction_remove(&self, ctx: Context, removed_reaction: Reaction) {
        Self::dispatch_reaction(ctx, removed_reaction, ReactionKind::Remove).await;
    }

    async fn guild_role_delete(
        &self,
        ctx: Context,
        guild_id: GuildId,
        removed_role_id: RoleId,
        removed_role_data_if_cached: Option<Role>,
    ) {
        let Some(state) = Self::state(&ctx).await else {
            return;
        };

        let role_name = removed_role_data_if_cached.as_ref().map(|r| r.name.as_str());
        match state
            .manager
            .prune_deleted_role(guild_id.get(), removed_role_id.get(), role_name)
            .await
        {
            Ok(true) => info!(
                "Pruned binding for deleted role {} in guild {}",
                removed_role_id, guild_id
            ),
            Ok(false) => {}
            Err(e) => log_error("Failed to prune deleted role", &e),
        }
    }
}
