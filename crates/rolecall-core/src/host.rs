//! Capability traits the bot requires from its platform host.
//!
//! The reaction-role core talks to Discord only through [`RoleHost`];
//! the channel administration commands use [`ChannelHost`]. Both are
//! implemented with serenity in `rolecall-bot` and with in-memory mocks
//! in [`crate::mocks`].

use std::future::Future;

use crate::emoji::EmojiRef;
use crate::error::RoleError;

/// Role, member, message, and reaction operations the core needs.
///
/// Errors must map platform permission refusals to
/// [`RoleError::PermissionDenied`] so callers can distinguish them.
pub trait RoleHost: Send + Sync {
    /// Id of an existing role with this exact name, if any.
    fn find_role(
        &self,
        guild_id: u64,
        name: &str,
    ) -> impl Future<Output = Option<u64>> + Send;

    /// Name of a live role, or `None` when the role no longer exists.
    fn role_name(
        &self,
        guild_id: u64,
        role_id: u64,
    ) -> impl Future<Output = Option<String>> + Send;

    /// Create a role and return its new id.
    fn create_role(
        &self,
        guild_id: u64,
        name: &str,
    ) -> impl Future<Output = Result<u64, RoleError>> + Send;

    fn delete_role(
        &self,
        guild_id: u64,
        role_id: u64,
    ) -> impl Future<Output = Result<(), RoleError>> + Send;

    /// Grant a role to a member. Granting an already-held role is a
    /// platform no-op, not an error.
    fn grant_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
    ) -> impl Future<Output = Result<(), RoleError>> + Send;

    /// Revoke a role from a member. Revoking an absent role is a
    /// platform no-op, not an error.
    fn revoke_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
    ) -> impl Future<Output = Result<(), RoleError>> + Send;

    fn member_exists(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> impl Future<Output = bool> + Send;

    /// Send a text message and return its message id.
    fn send_message(
        &self,
        channel_id: u64,
        content: &str,
    ) -> impl Future<Output = Result<u64, RoleError>> + Send;

    /// Attach one of the bot's own reactions to a message.
    fn add_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &EmojiRef,
    ) -> impl Future<Output = Result<(), RoleError>> + Send;
}

/// Summary of one category for `list_categories`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInfo {
    pub id: u64,
    pub name: String,
    pub text_channels: usize,
    pub voice_channels: usize,
}

/// One-shot channel and category administration, no persisted state.
pub trait ChannelHost: Send + Sync {
    fn create_category(
        &self,
        guild_id: u64,
        name: &str,
    ) -> impl Future<Output = Result<u64, RoleError>> + Send;

    fn create_text_channel(
        &self,
        guild_id: u64,
        category_id: u64,
        name: &str,
    ) -> impl Future<Output = Result<u64, RoleError>> + Send;

    fn create_voice_channel(
        &self,
        guild_id: u64,
        category_id: u64,
        name: &str,
    ) -> impl Future<Output = Result<u64, RoleError>> + Send;

    fn move_channel(
        &self,
        channel_id: u64,
        category_id: u64,
    ) -> impl Future<Output = Result<(), RoleError>> + Send;

    /// Delete a category and every channel inside it.
    fn delete_category(
        &self,
        guild_id: u64,
        category_id: u64,
    ) -> impl Future<Output = Result<(), RoleError>> + Send;

    fn list_categories(
        &self,
        guild_id: u64,
    ) -> impl Future<Output = Result<Vec<CategoryInfo>, RoleError>> + Send;

    fn set_channel_topic(
        &self,
        channel_id: u64,
        topic: &str,
    ) -> impl Future<Output = Result<(), RoleError>> + Send;

    /// Clone a channel's settings under a new name, returning the new id.
    fn clone_channel(
        &self,
        guild_id: u64,
        channel_id: u64,
        new_name: Option<&str>,
    ) -> impl Future<Output = Result<u64, RoleError>> + Send;

    /// Display name for replies; `None` when the channel is unknown.
    fn channel_name(
        &self,
        guild_id: u64,
        channel_id: u64,
    ) -> impl Future<Output = Option<String>> + Send;
}
