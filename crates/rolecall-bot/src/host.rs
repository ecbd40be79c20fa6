//! Serenity-backed implementation of the core capability traits.
//!
//! Lookups try the gateway cache first and fall back to the HTTP API;
//! cache references are never held across an await.

use std::sync::Arc;

use serenity::builder::{CreateChannel, CreateMessage, EditChannel, EditRole};
use serenity::cache::Cache;
use serenity::http::Http;
use serenity::model::channel::{Channel, ChannelType, ReactionType};
use serenity::model::id::{ChannelId, EmojiId, GuildId, MessageId, RoleId, UserId};
use tracing::warn;

use rolecall_core::{CategoryInfo, ChannelHost, EmojiRef, RoleError, RoleHost};

use crate::errors::map_discord_error;

/// `RoleHost` and `ChannelHost` over a live Discord connection.
#[derive(Clone)]
pub struct DiscordHost {
    http: Arc<Http>,
    cache: Arc<Cache>,
}

impl DiscordHost {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>) -> Self {
        Self { http, cache }
    }

    async fn guild_channels(
        &self,
        guild_id: GuildId,
    ) -> Result<Vec<serenity::model::channel::GuildChannel>, RoleError> {
        self.http
            .get_channels(guild_id)
            .await
            .map_err(map_discord_error)
    }
}

/// The serenity reaction payload for one of our emoji keys.
pub fn reaction_type(emoji: &EmojiRef) -> ReactionType {
    match emoji.id {
        Some(id) if emoji.custom => ReactionType::Custom {
            animated: emoji.animated,
            id: EmojiId::new(id),
            name: Some(emoji.name.clone()),
        },
        _ => ReactionType::Unicode(emoji.name.clone()),
    }
}

/// Canonical emoji identity for an inbound reaction payload.
pub fn emoji_ref(reaction: &ReactionType) -> EmojiRef {
    match reaction {
        ReactionType::Custom { animated, id, name } => EmojiRef::custom(
            name.clone().unwrap_or_default(),
            id.get(),
            *animated,
        ),
        ReactionType::Unicode(glyph) => EmojiRef::unicode(glyph.clone()),
        other => EmojiRef::unicode(other.to_string()),
    }
}

impl RoleHost for DiscordHost {
    async fn find_role(&self, guild_id: u64, name: &str) -> Option<u64> {
        let gid = GuildId::new(guild_id);
        let cached = self.cache.guild(gid).and_then(|g| {
            g.roles
                .values()
                .find(|r| r.name == name)
                .map(|r| r.id.get())
        });
        if cached.is_some() {
            return cached;
        }
        match self.http.get_guild_roles(gid).await {
            Ok(roles) => roles.iter().find(|r| r.name == name).map(|r| r.id.get()),
            Err(e) => {
                warn!("Failed to fetch roles for guild {}: {}", guild_id, e);
                None
            }
        }
    }

    async fn role_name(&self, guild_id: u64, role_id: u64) -> Option<String> {
        let gid = GuildId::new(guild_id);
        let rid = RoleId::new(role_id);
        let cached = self
            .cache
            .guild(gid)
            .and_then(|g| g.roles.get(&rid).map(|r| r.name.clone()));
        if cached.is_some() {
            return cached;
        }
        match self.http.get_guild_roles(gid).await {
            Ok(roles) => roles.into_iter().find(|r| r.id == rid).map(|r| r.name),
            Err(e) => {
                warn!("Failed to fetch roles for guild {}: {}", guild_id, e);
                None
            }
        }
    }

    async fn create_role(&self, guild_id: u64, name: &str) -> Result<u64, RoleError> {
        let role = GuildId::new(guild_id)
            .create_role(&self.http, EditRole::new().name(name))
            .await
            .map_err(map_discord_error)?;
        Ok(role.id.get())
    }

    async fn delete_role(&self, guild_id: u64, role_id: u64) -> Result<(), RoleError> {
        self.http
            .delete_role(GuildId::new(guild_id), RoleId::new(role_id), None)
            .await
            .map_err(map_discord_error)
    }

    async fn grant_role(&self, guild_id: u64, user_id: u64, role_id: u64) -> Result<(), RoleError> {
        self.http
            .add_member_role(
                GuildId::new(guild_id),
                UserId::new(user_id),
                RoleId::new(role_id),
                None,
            )
            .await
            .map_err(map_discord_error)
    }

    async fn revoke_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
    ) -> Result<(), RoleError> {
        self.http
            .remove_member_role(
                GuildId::new(guild_id),
                UserId::new(user_id),
                RoleId::new(role_id),
                None,
            )
            .await
            .map_err(map_discord_error)
    }

    async fn member_exists(&self, guild_id: u64, user_id: u64) -> bool {
        let gid = GuildId::new(guild_id);
        let uid = UserId::new(user_id);
        let cached = self
            .cache
            .guild(gid)
            .map(|g| g.members.contains_key(&uid))
            .unwrap_or(false);
        if cached {
            return true;
        }
        self.http.get_member(gid, uid).await.is_ok()
    }

    async fn send_message(&self, channel_id: u64, content: &str) -> Result<u64, RoleError> {
        let message = ChannelId::new(channel_id)
            .send_message(&self.http, CreateMessage::new().content(content))
            .await
            .map_err(map_discord_error)?;
        Ok(message.id.get())
    }

    async fn add_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &EmojiRef,
    ) -> Result<(), RoleError> {
        self.http
            .create_reaction(
                ChannelId::new(channel_id),
                MessageId::new(message_id),
                &reaction_type(emoji),
            )
            .await
            .map_err(map_discord_error)
    }
}

impl ChannelHost for DiscordHost {
    async fn create_category(&self, guild_id: u64, name: &str) -> Result<u64, RoleError> {
        let channel = GuildId::new(guild_id)
            .create_channel(
                &self.http,
                CreateChannel::new(name).kind(ChannelType::Category),
            )
            .await
            .map_err(map_discord_error)?;
        Ok(channel.id.get())
    }

    async fn create_text_channel(
        &self,
        guild_id: u64,
        category_id: u64,
        name: &str,
    ) -> Result<u64, RoleError> {
        let channel = GuildId::new(guild_id)
            .create_channel(
                &self.http,
                CreateChannel::new(name)
                    .kind(ChannelType::Text)
                    .category(ChannelId::new(category_id)),
            )
            .await
            .map_err(map_discord_error)?;
        Ok(channel.id.get())
    }

    async fn create_voice_channel(
        &self,
        guild_id: u64,
        category_id: u64,
        name: &str,
    ) -> Result<u64, RoleError> {
        let channel = GuildId::new(guild_id)
            .create_channel(
                &self.http,
                CreateChannel::new(name)
                    .kind(ChannelType::Voice)
                    .category(ChannelId::new(category_id)),
            )
            .await
            .map_err(map_discord_error)?;
        Ok(channel.id.get())
    }

    async fn move_channel(&self, channel_id: u64, category_id: u64) -> Result<(), RoleError> {
        ChannelId::new(channel_id)
            .edit(
                &self.http,
                EditChannel::new().category(Some(ChannelId::new(category_id))),
            )
            .await
            .map_err(map_discord_error)?;
        Ok(())
    }

    async fn delete_category(&self, guild_id: u64, category_id: u64) -> Result<(), RoleError> {
        let category = ChannelId::new(category_id);
        // Children first, then the category itself.
        let channels = self.guild_channels(GuildId::new(guild_id)).await?;
        for channel in channels {
            if channel.parent_id == Some(category) {
                channel.id.delete(&self.http).await.map_err(map_discord_error)?;
            }
        }
        category.delete(&self.http).await.map_err(map_discord_error)?;
        Ok(())
    }

    async fn list_categories(&self, guild_id: u64) -> Result<Vec<CategoryInfo>, RoleError> {
        let channels = self.guild_channels(GuildId::new(guild_id)).await?;
        let mut infos: Vec<CategoryInfo> = channels
            .iter()
            .filter(|c| c.kind == ChannelType::Category)
            .map(|c| CategoryInfo {
                id: c.id.get(),
                name: c.name.clone(),
                text_channels: channels
                    .iter()
                    .filter(|ch| ch.parent_id == Some(c.id) && ch.kind == ChannelType::Text)
                    .count(),
                voice_channels: channels
                    .iter()
                    .filter(|ch| ch.parent_id == Some(c.id) && ch.kind == ChannelType::Voice)
                    .count(),
            })
            .collect();
        infos.sort_by_key(|c| c.id);
        Ok(infos)
    }

    async fn set_channel_topic(&self, channel_id: u64, topic: &str) -> Result<(), RoleError> {
        ChannelId::new(channel_id)
            .edit(&self.http, EditChannel::new().topic(topic))
            .await
            .map_err(map_discord_error)?;
        Ok(())
    }

    async fn clone_channel(
        &self,
        guild_id: u64,
        channel_id: u64,
        new_name: Option<&str>,
    ) -> Result<u64, RoleError> {
        let source = match self
            .http
            .get_channel(ChannelId::new(channel_id))
            .await
            .map_err(map_discord_error)?
        {
            Channel::Guild(c) => c,
            _ => return Err(RoleError::NotFound(format!("channel {channel_id}"))),
        };

        let name = new_name.unwrap_or(&source.name);
        let mut builder = CreateChannel::new(name).kind(source.kind);
        if let Some(parent) = source.parent_id {
            builder = builder.category(parent);
        }
        if let Some(topic) = &source.topic {
            builder = builder.topic(topic);
        }

        let channel = GuildId::new(guild_id)
            .create_channel(&self.http, builder)
            .await
            .map_err(map_discord_error)?;
        Ok(channel.id.get())
    }

    async fn channel_name(&self, guild_id: u64, channel_id: u64) -> Option<String> {
        let gid = GuildId::new(guild_id);
        let cid = ChannelId::new(channel_id);
        let cached = self
            .cache
            .guild(gid)
            .and_then(|g| g.channels.get(&cid).map(|c| c.name.clone()));
        if cached.is_some() {
            return cached;
        }
        match self.http.get_channel(cid).await {
            Ok(Channel::Guild(c)) => Some(c.name),
            _ => None,
        }
    }
}
