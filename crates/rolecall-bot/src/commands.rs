//! Text command parsing and dispatch.
//!
//! Commands are plain prefixed messages (`!create_role 🎮 Gamer`).
//! Parsing is pure and synchronous; `execute` runs the operation through
//! the core manager or the channel host and returns the reply text, so
//! the whole layer is testable without a gateway connection.

#[path = "commands_tests.rs"]
mod commands_tests;

use rolecall_core::{BindOutcome, ChannelHost, RoleError, RoleHost, RoleManager};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateRole { emoji: String, name: String },
    ListRoles { channel_id: u64 },
    RemoveRole { name: String },
    SetLogChannel { channel_id: u64 },
    CreateCategory { name: String },
    CreateTextChannel { category_id: u64, name: String },
    CreateVoiceChannel { category_id: u64, name: String },
    MoveChannel { channel_id: u64, category_id: u64 },
    DeleteCategory { category_id: u64, confirmed: bool },
    ListCategories,
    CloneChannel { channel_id: u64, new_name: Option<String> },
    SetChannelTopic { channel_id: u64, topic: String },
}

/// Parse one message into a command.
///
/// `None` means the message is not a command at all (wrong prefix or an
/// unknown keyword) and must be ignored silently. `Some(Err(reply))`
/// means the keyword matched but the arguments did not; the reply is a
/// usage line for the channel.
pub fn parse(prefix: &str, content: &str) -> Option<Result<Command, String>> {
    let body = content.strip_prefix(prefix)?;
    let mut parts = body.split_whitespace();
    let keyword = parts.next()?;
    let args: Vec<&str> = parts.collect();

    let usage = |syntax: &str| Err(format!("⚠️ Usage: `{prefix}{syntax}`"));

    let result = match keyword {
        "create_role" => match args.split_first() {
            Some((emoji, name)) if !name.is_empty() => Ok(Command::CreateRole {
                emoji: emoji.to_string(),
                name: name.join(" "),
            }),
            _ => usage("create_role <emoji> <role name>"),
        },
        "list_roles" => match args.first().and_then(|t| channel_ref(t)) {
            Some(channel_id) => Ok(Command::ListRoles { channel_id }),
            None => usage("list_roles <#channel>"),
        },
        "remove_role" => {
            if args.is_empty() {
                usage("remove_role <role name>")
            } else {
                Ok(Command::RemoveRole {
                    name: args.join(" "),
                })
            }
        }
        "set_log_channel" => match args.first().and_then(|t| channel_ref(t)) {
            Some(channel_id) => Ok(Command::SetLogChannel { channel_id }),
            None => usage("set_log_channel <#channel>"),
        },
        "create_category" => {
            if args.is_empty() {
                usage("create_category <name>")
            } else {
                Ok(Command::CreateCategory {
                    name: args.join(" "),
                })
            }
        }
        "create_text_channel" => match args.split_first() {
            Some((cat, name)) if !name.is_empty() => match channel_ref(cat) {
                Some(category_id) => Ok(Command::CreateTextChannel {
                    category_id,
                    name: name.join(" "),
                }),
                None => usage("create_text_channel <category id> <name>"),
            },
            _ => usage("create_text_channel <category id> <name>"),
        },
        "create_voice_channel" => match args.split_first() {
            Some((cat, name)) if !name.is_empty() => match channel_ref(cat) {
                Some(category_id) => Ok(Command::CreateVoiceChannel {
                    category_id,
                    name: name.join(" "),
                }),
                None => usage("create_voice_channel <category id> <name>"),
            },
            _ => usage("create_voice_channel <category id> <name>"),
        },
        "move_channel" => match (
            args.first().and_then(|t| channel_ref(t)),
            args.get(1).and_then(|t| channel_ref(t)),
        ) {
            (Some(channel_id), Some(category_id)) => Ok(Command::MoveChannel {
                channel_id,
                category_id,
            }),
            _ => usage("move_channel <#channel> <category id>"),
        },
        "delete_category" => match args.first().and_then(|t| channel_ref(t)) {
            Some(category_id) => Ok(Command::DeleteCategory {
                category_id,
                confirmed: args.get(1) == Some(&"confirm"),
            }),
            None => usage("delete_category <category id> [confirm]"),
        },
        "list_categories" => Ok(Command::ListCategories),
        "clone_channel" => match args.split_first() {
            Some((chan, rest)) => match channel_ref(chan) {
                Some(channel_id) => Ok(Command::CloneChannel {
                    channel_id,
                    new_name: (!rest.is_empty()).then(|| rest.join(" ")),
                }),
                None => usage("clone_channel <#channel> [new name]"),
            },
            None => usage("clone_channel <#channel> [new name]"),
        },
        "set_channel_topic" => match args.split_first() {
            Some((chan, topic)) if !topic.is_empty() => match channel_ref(chan) {
                Some(channel_id) => Ok(Command::SetChannelTopic {
                    channel_id,
                    topic: topic.join(" "),
                }),
                None => usage("set_channel_topic <#channel> <topic>"),
            },
            _ => usage("set_channel_topic <#channel> <topic>"),
        },
        _ => return None,
    };
    Some(result)
}

/// A `<#123>` channel mention or a raw numeric id.
fn channel_ref(token: &str) -> Option<u64> {
    token
        .strip_prefix("<#")
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(token)
        .parse()
        .ok()
}

/// Run one command and produce the reply text for the invoking channel.
pub async fn execute<H>(
    cmd: Command,
    host: &H,
    manager: &RoleManager,
    guild_id: u64,
    prefix: &str,
) -> String
where
    H: RoleHost + ChannelHost,
{
    match cmd {
        Command::CreateRole { emoji, name } => {
            match manager.bind(host, guild_id, &emoji, &name).await {
                Ok(BindOutcome::Created { .. }) => {
                    format!("✅ Role '{name}' created successfully.")
                }
                Ok(BindOutcome::BoundWithoutRole) => {
                    format!("✅ Role '{name}' has been binded to {emoji}")
                }
                Ok(BindOutcome::AlreadyBound) => {
                    format!("❗ A role named '{name}' already exists.")
                }
                Err(RoleError::PermissionDenied) => {
                    "🚫 I don't have permission to create roles.".to_string()
                }
                Err(e) => format!("⚠️ Something went wrong: `{e}`"),
            }
        }

        Command::ListRoles { channel_id } => {
            match manager.publish_list(host, guild_id, channel_id).await {
                Ok(_) => format!("✅ Sent role list to <#{channel_id}>"),
                Err(RoleError::EmptyBindingSet) => {
                    "There are no roles in this server.".to_string()
                }
                Err(RoleError::PermissionDenied) => {
                    "🚫 I don't have permission to send messages in that channel.".to_string()
                }
                Err(e) => format!("⚠️ An error occurred: `{e}`"),
            }
        }

        Command::RemoveRole { name } => match manager.remove_role(host, guild_id, &name).await {
            Ok(()) => format!("✅ Role '{name}' deleted successfully."),
            Err(RoleError::NotFound(_)) => format!("❗ Role '{name}' not found."),
            Err(RoleError::PermissionDenied) => {
                "🚫 I don't have permission to delete roles.".to_string()
            }
            Err(e) => format!("⚠️ Something went wrong: `{e}`"),
        },

        Command::SetLogChannel { channel_id } => {
            match manager.set_log_channel(guild_id, channel_id).await {
                Ok(()) => {
                    if let Err(e) = host
                        .send_message(channel_id, "I will log to this channel from now on")
                        .await
                    {
                        warn!(
                            "Failed to announce in new log channel {}: {}",
                            channel_id, e
                        );
                    }
                    format!("✅ Log channel set to <#{channel_id}>")
                }
                Err(e) => format!("⚠️ Something went wrong: `{e}`"),
            }
        }

        Command::CreateCategory { name } => match host.create_category(guild_id, &name).await {
            Ok(_) => format!("✅ Category '{name}' created successfully."),
            Err(RoleError::PermissionDenied) => {
                "🚫 I don't have permission to create categories.".to_string()
            }
            Err(e) => format!("⚠️ Something went wrong: `{e}`"),
        },

        Command::CreateTextChannel { category_id, name } => {
            let category = display_name(host, guild_id, category_id).await;
            match host.create_text_channel(guild_id, category_id, &name).await {
                Ok(_) => format!("✅ Text channel '{name}' created in '{category}'."),
                Err(RoleError::PermissionDenied) => {
                    "🚫 I don't have permission to create channels.".to_string()
                }
                Err(e) => format!("⚠️ Something went wrong: `{e}`"),
            }
        }

        Command::CreateVoiceChannel { category_id, name } => {
            let category = display_name(host, guild_id, category_id).await;
            match host
                .create_voice_channel(guild_id, category_id, &name)
                .await
            {
                Ok(_) => format!("✅ Voice channel '{name}' created in '{category}'."),
                Err(RoleError::PermissionDenied) => {
                    "🚫 I don't have permission to create channels.".to_string()
                }
                Err(e) => format!("⚠️ Something went wrong: `{e}`"),
            }
        }

        Command::MoveChannel {
            channel_id,
            category_id,
        } => {
            let channel = display_name(host, guild_id, channel_id).await;
            let category = display_name(host, guild_id, category_id).await;
            match host.move_channel(channel_id, category_id).await {
                Ok(()) => format!("✅ Channel '{channel}' moved to '{category}'."),
                Err(RoleError::PermissionDenied) => {
                    "🚫 I don't have permission to edit channels.".to_string()
                }
                Err(e) => format!("⚠️ Something went wrong: `{e}`"),
            }
        }

        Command::DeleteCategory {
            category_id,
            confirmed,
        } => {
            let category = display_name(host, guild_id, category_id).await;
            if !confirmed {
                return format!(
                    "⚠️ This will delete the category '{category}' and all its channels. \
                     Use `{prefix}delete_category {category_id} confirm` to proceed."
                );
            }
            match host.delete_category(guild_id, category_id).await {
                Ok(()) => format!(
                    "✅ Category '{category}' and all its channels have been deleted."
                ),
                Err(RoleError::PermissionDenied) => {
                    "🚫 I don't have permission to delete categories or channels.".to_string()
                }
                Err(e) => format!("⚠️ Something went wrong: `{e}`"),
            }
        }

        Command::ListCategories => match host.list_categories(guild_id).await {
            Ok(categories) if categories.is_empty() => {
                "No categories found in this server.".to_string()
            }
            Ok(categories) => {
                let lines: Vec<String> = categories
                    .iter()
                    .map(|c| {
                        format!(
                            "📁 {} (ID: {}) - 📝 {} text, 🔊 {} voice",
                            c.name, c.id, c.text_channels, c.voice_channels
                        )
                    })
                    .collect();
                format!("**Server Categories:**\n{}", lines.join("\n"))
            }
            Err(e) => format!("⚠️ Something went wrong: `{e}`"),
        },

        Command::CloneChannel {
            channel_id,
            new_name,
        } => {
            let source = display_name(host, guild_id, channel_id).await;
            let clone_name = new_name.unwrap_or_else(|| format!("{source}-clone"));
            match host
                .clone_channel(guild_id, channel_id, Some(&clone_name))
                .await
            {
                Ok(_) => format!("✅ Channel '{source}' cloned as '{clone_name}'."),
                Err(RoleError::PermissionDenied) => {
                    "🚫 I don't have permission to clone channels.".to_string()
                }
                Err(e) => format!("⚠️ Something went wrong: `{e}`"),
            }
        }

        Command::SetChannelTopic { channel_id, topic } => {
            let channel = display_name(host, guild_id, channel_id).await;
            match host.set_channel_topic(channel_id, &topic).await {
                Ok(()) => format!("✅ Topic set for '{channel}': {topic}"),
                Err(RoleError::PermissionDenied) => {
                    "🚫 I don't have permission to edit channels.".to_string()
                }
                Err(e) => format!("⚠️ Something went wrong: `{e}`"),
            }
        }
    }
}

async fn display_name<H: ChannelHost>(host: &H, guild_id: u64, channel_id: u64) -> String {
    host.channel_name(guild_id, channel_id)
        .await
        .unwrap_or_else(|| channel_id.to_string())
}
