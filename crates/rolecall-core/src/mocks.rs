//! Mock host implementations for unit testing without a live gateway.
//!
//! Enabled with the `test-support` feature:
//!
//! ```toml
//! [dev-dependencies]
//! rolecall-core = { path = "...", features = ["test-support"] }
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::emoji::EmojiRef;
use crate::error::RoleError;
use crate::host::{CategoryInfo, ChannelHost, RoleHost};

/// A message the mock "sent".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel_id: u64,
    pub content: String,
}

#[derive(Default)]
struct Inner {
    // Seeded / accumulated platform state
    roles: HashMap<(u64, u64), String>,
    members: HashSet<(u64, u64)>,
    categories: HashMap<u64, (u64, String)>,
    next_id: u64,

    // Recordings
    sent: Vec<SentMessage>,
    reactions: Vec<(u64, u64, String)>,
    grants: Vec<(u64, u64, u64)>,
    revokes: Vec<(u64, u64, u64)>,
    created_roles: Vec<(u64, String)>,
    deleted_roles: Vec<(u64, u64)>,
    channel_calls: Vec<String>,

    // Failure knobs
    deny_grants: bool,
    deny_sends: bool,
    fail_reactions_after: Option<usize>,
}

/// Records every host call and lets tests seed platform state or force
/// permission failures.
#[derive(Clone, Default)]
pub struct MockHost {
    inner: Arc<Mutex<Inner>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    fn fresh_id(inner: &mut Inner) -> u64 {
        inner.next_id += 1;
        5000 + inner.next_id
    }

    // ── Seeding ───────────────────────────────────────────────────────────

    /// Register a pre-existing platform role and return its id.
    pub fn seed_role(&self, guild_id: u64, name: &str) -> u64 {
        let mut inner = self.lock();
        let id = Self::fresh_id(&mut inner);
        inner.roles.insert((guild_id, id), name.to_string());
        id
    }

    pub fn seed_member(&self, guild_id: u64, user_id: u64) {
        self.lock().members.insert((guild_id, user_id));
    }

    pub fn seed_category(&self, guild_id: u64, name: &str) -> u64 {
        let mut inner = self.lock();
        let id = Self::fresh_id(&mut inner);
        inner.categories.insert(id, (guild_id, name.to_string()));
        id
    }

    /// Remove a role from the mock platform, as if deleted out of band.
    pub fn drop_role(&self, guild_id: u64, role_id: u64) {
        self.lock().roles.remove(&(guild_id, role_id));
    }

    // ── Failure knobs ─────────────────────────────────────────────────────

    /// All grant/revoke calls fail with `PermissionDenied`.
    pub fn deny_grants(&self) {
        self.lock().deny_grants = true;
    }

    /// All sends fail with `PermissionDenied`.
    pub fn deny_sends(&self) {
        self.lock().deny_sends = true;
    }

    /// Let `n` reactions attach, then fail the rest.
    pub fn fail_reactions_after(&self, n: usize) {
        self.lock().fail_reactions_after = Some(n);
    }

    // ── Recordings ────────────────────────────────────────────────────────

    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.lock().sent.clone()
    }

    /// `(channel_id, message_id, emoji_key)` per attached reaction.
    pub fn reactions(&self) -> Vec<(u64, u64, String)> {
        self.lock().reactions.clone()
    }

    pub fn grants(&self) -> Vec<(u64, u64, u64)> {
        self.lock().grants.clone()
    }

    pub fn revokes(&self) -> Vec<(u64, u64, u64)> {
        self.lock().revokes.clone()
    }

    pub fn created_roles(&self) -> Vec<(u64, String)> {
        self.lock().created_roles.clone()
    }

    pub fn deleted_roles(&self) -> Vec<(u64, u64)> {
        self.lock().deleted_roles.clone()
    }

    pub fn channel_calls(&self) -> Vec<String> {
        self.lock().channel_calls.clone()
    }
}

impl RoleHost for MockHost {
    async fn find_role(&self, guild_id: u64, name: &str) -> Option<u64> {
        let inner = self.lock();
        inner
            .roles
            .iter()
            .find(|((g, _), n)| *g == guild_id && n.as_str() == name)
            .map(|((_, id), _)| *id)
    }

    async fn role_name(&self, guild_id: u64, role_id: u64) -> Option<String> {
        self.lock().roles.get(&(guild_id, role_id)).cloned()
    }

    async fn create_role(&self, guild_id: u64, name: &str) -> Result<u64, RoleError> {
        let mut inner = self.lock();
        let id = Self::fresh_id(&mut inner);
        inner.roles.insert((guild_id, id), name.to_string());
        inner.created_roles.push((guild_id, name.to_string()));
        Ok(id)
    }

    async fn delete_role(&self, guild_id: u64, role_id: u64) -> Result<(), RoleError> {
        let mut inner = self.lock();
        inner.roles.remove(&(guild_id, role_id));
        inner.deleted_roles.push((guild_id, role_id));
        Ok(())
    }

    async fn grant_role(&self, guild_id: u64, user_id: u64, role_id: u64) -> Result<(), RoleError> {
        let mut inner = self.lock();
        if inner.deny_grants {
            return Err(RoleError::PermissionDenied);
        }
        inner.grants.push((guild_id, user_id, role_id));
        Ok(())
    }

    async fn revoke_role(&self, guild_id: u64, user_id: u64, role_id: u64) -> Result<(), RoleError> {
        let mut inner = self.lock();
        if inner.deny_grants {
            return Err(RoleError::PermissionDenied);
        }
        inner.revokes.push((guild_id, user_id, role_id));
        Ok(())
    }

    async fn member_exists(&self, guild_id: u64, user_id: u64) -> bool {
        self.lock().members.contains(&(guild_id, user_id))
    }

    async fn send_message(&self, channel_id: u64, content: &str) -> Result<u64, RoleError> {
        let mut inner = self.lock();
        if inner.deny_sends {
            return Err(RoleError::PermissionDenied);
        }
        inner.sent.push(SentMessage {
            channel_id,
            content: content.to_string(),
        });
        Ok(9000 + inner.sent.len() as u64)
    }

    async fn add_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &EmojiRef,
    ) -> Result<(), RoleError> {
        let mut inner = self.lock();
        if let Some(limit) = inner.fail_reactions_after {
            if inner.reactions.len() >= limit {
                return Err(RoleError::PermissionDenied);
            }
        }
        inner
            .reactions
            .push((channel_id, message_id, emoji.canonical_key()));
        Ok(())
    }
}

impl ChannelHost for MockHost {
    async fn create_category(&self, guild_id: u64, name: &str) -> Result<u64, RoleError> {
        let mut inner = self.lock();
        let id = Self::fresh_id(&mut inner);
        inner.categories.insert(id, (guild_id, name.to_string()));
        inner.channel_calls.push(format!("create_category:{name}"));
        Ok(id)
    }

    async fn create_text_channel(
        &self,
        _guild_id: u64,
        category_id: u64,
        name: &str,
    ) -> Result<u64, RoleError> {
        let mut inner = self.lock();
        if !inner.categories.contains_key(&category_id) {
            return Err(RoleError::NotFound(format!("category {category_id}")));
        }
        let id = Self::fresh_id(&mut inner);
        inner
            .channel_calls
            .push(format!("create_text_channel:{category_id}:{name}"));
        Ok(id)
    }

    async fn create_voice_channel(
        &self,
        _guild_id: u64,
        category_id: u64,
        name: &str,
    ) -> Result<u64, RoleError> {
        let mut inner = self.lock();
        if !inner.categories.contains_key(&category_id) {
            return Err(RoleError::NotFound(format!("category {category_id}")));
        }
        let id = Self::fresh_id(&mut inner);
        inner
            .channel_calls
            .push(format!("create_voice_channel:{category_id}:{name}"));
        Ok(id)
    }

    async fn move_channel(&self, channel_id: u64, category_id: u64) -> Result<(), RoleError> {
        self.lock()
            .channel_calls
            .push(format!("move_channel:{channel_id}:{category_id}"));
        Ok(())
    }

    async fn delete_category(&self, _guild_id: u64, category_id: u64) -> Result<(), RoleError> {
        let mut inner = self.lock();
        if inner.categories.remove(&category_id).is_none() {
            return Err(RoleError::NotFound(format!("category {category_id}")));
        }
        inner
            .channel_calls
            .push(format!("delete_category:{category_id}"));
        Ok(())
    }

    async fn list_categories(&self, guild_id: u64) -> Result<Vec<CategoryInfo>, RoleError> {
        let inner = self.lock();
        let mut infos: Vec<CategoryInfo> = inner
            .categories
            .iter()
            .filter(|(_, (g, _))| *g == guild_id)
            .map(|(id, (_, name))| CategoryInfo {
                id: *id,
                name: name.clone(),
                text_channels: 0,
                voice_channels: 0,
            })
            .collect();
        infos.sort_by_key(|c| c.id);
        Ok(infos)
    }

    async fn set_channel_topic(&self, channel_id: u64, topic: &str) -> Result<(), RoleError> {
        self.lock()
            .channel_calls
            .push(format!("set_channel_topic:{channel_id}:{topic}"));
        Ok(())
    }

    async fn clone_channel(
        &self,
        _guild_id: u64,
        channel_id: u64,
        new_name: Option<&str>,
    ) -> Result<u64, RoleError> {
        let mut inner = self.lock();
        let id = Self::fresh_id(&mut inner);
        inner.channel_calls.push(format!(
            "clone_channel:{channel_id}:{}",
            new_name.unwrap_or("<default>")
        ));
        Ok(id)
    }

    async fn channel_name(&self, _guild_id: u64, channel_id: u64) -> Option<String> {
        self.lock()
            .categories
            .get(&channel_id)
            .map(|(_, name)| name.clone())
    }
}
