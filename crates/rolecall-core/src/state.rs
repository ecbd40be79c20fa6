//! The per-guild role binding table.

use serde::{Deserialize, Serialize};

/// One (role name, emoji key, role id) triple.
///
/// `id` is absent for a "pending bind": a binding recorded against a
/// role that already existed on the platform at bind time, whose id was
/// never captured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleBinding {
    pub name: String,
    pub emoji: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

/// All persisted state for one guild.
///
/// `log_channel_id` and `list_message_id` use 0 for "unset" on the wire,
/// matching the legacy state file layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuildRoleState {
    #[serde(default)]
    pub log_channel_id: u64,
    #[serde(default)]
    pub list_message_id: u64,
    #[serde(default)]
    pub roles: Vec<RoleBinding>,
}

impl GuildRoleState {
    pub fn contains_name(&self, name: &str) -> bool {
        self.roles.iter().any(|b| b.name == name)
    }

    pub fn push_binding(&mut self, name: impl Into<String>, emoji: impl Into<String>, id: Option<u64>) {
        self.roles.push(RoleBinding {
            name: name.into(),
            emoji: emoji.into(),
            id,
        });
    }

    /// First binding whose emoji key matches, in insertion order.
    ///
    /// Two names may share an emoji; the earlier-inserted binding wins.
    pub fn lookup_by_emoji(&self, emoji_key: &str) -> Option<&RoleBinding> {
        self.roles.iter().find(|b| b.emoji == emoji_key)
    }

    /// Drop the first binding with this name, returning it if found.
    pub fn remove_by_name(&mut self, name: &str) -> Option<RoleBinding> {
        let idx = self.roles.iter().position(|b| b.name == name)?;
        Some(self.roles.remove(idx))
    }

    /// Drop the first binding whose role id matches.
    pub fn remove_by_role_id(&mut self, role_id: u64) -> Option<RoleBinding> {
        let idx = self.roles.iter().position(|b| b.id == Some(role_id))?;
        Some(self.roles.remove(idx))
    }

    /// (name, emoji) pairs in display order.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        self.roles
            .iter()
            .map(|b| (b.name.clone(), b.emoji.clone()))
            .collect()
    }

    pub fn log_channel(&self) -> Option<u64> {
        (self.log_channel_id != 0).then_some(self.log_channel_id)
    }

    pub fn list_message(&self) -> Option<u64> {
        (self.list_message_id != 0).then_some(self.list_message_id)
    }
}
