#[cfg(test)]
mod tests {
    use crate::emoji::EmojiRef;
    use crate::error::RoleError;
    use crate::host::RoleHost;
    use crate::manager::{
        render_role_list, BindOutcome, ReactionEvent, ReactionKind, ReactionOutcome, RoleManager,
    };
    use crate::mocks::MockHost;
    use crate::store::StateStore;

    const GUILD: u64 = 200;
    const CHANNEL: u64 = 300;
    const LOG_CHANNEL: u64 = 301;
    const USER: u64 = 42;
    const BOT: u64 = 1;

    fn manager(dir: &tempfile::TempDir) -> RoleManager {
        let m = RoleManager::new(StateStore::new(dir.path()));
        m.set_bot_user_id(BOT);
        m
    }

    fn add_event(message_id: u64, user_id: u64, emoji: EmojiRef) -> ReactionEvent {
        ReactionEvent {
            kind: ReactionKind::Add,
            guild_id: GUILD,
            message_id,
            user_id,
            emoji,
        }
    }

    /// Bind Gamer/Artist, publish, return the anchor message id.
    async fn published_fixture(m: &RoleManager, host: &MockHost) -> u64 {
        m.bind(host, GUILD, "🎮", "Gamer").await.unwrap();
        m.bind(host, GUILD, "🎨", "Artist").await.unwrap();
        m.publish_list(host, GUILD, CHANNEL).await.unwrap()
    }

    // ── bind ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_bind_creates_missing_role() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let host = MockHost::new();

        let outcome = m.bind(&host, GUILD, "🎮", "Gamer").await.unwrap();
        let BindOutcome::Created { role_id } = outcome else {
            panic!("expected Created, got {outcome:?}");
        };
        assert_eq!(host.created_roles(), vec![(GUILD, "Gamer".to_string())]);

        // persisted immediately
        let reloaded = StateStore::new(dir.path()).load(GUILD);
        assert_eq!(reloaded.roles.len(), 1);
        assert_eq!(reloaded.roles[0].id, Some(role_id));
    }

    #[tokio::test]
    async fn test_bind_existing_platform_role_records_pending_binding() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let host = MockHost::new();
        host.seed_role(GUILD, "Veteran");

        let outcome = m.bind(&host, GUILD, "🎖️", "Veteran").await.unwrap();
        assert_eq!(outcome, BindOutcome::BoundWithoutRole);
        assert!(host.created_roles().is_empty());

        let reloaded = StateStore::new(dir.path()).load(GUILD);
        assert_eq!(reloaded.roles[0].id, None);
    }

    #[tokio::test]
    async fn test_rebinding_same_name_is_rejected_without_change() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let host = MockHost::new();

        m.bind(&host, GUILD, "🎮", "Gamer").await.unwrap();
        let before = StateStore::new(dir.path()).load(GUILD);

        let outcome = m.bind(&host, GUILD, "🎲", "Gamer").await.unwrap();
        assert_eq!(outcome, BindOutcome::AlreadyBound);
        assert_eq!(StateStore::new(dir.path()).load(GUILD), before);
        assert_eq!(host.created_roles().len(), 1);
    }

    #[tokio::test]
    async fn test_bind_normalizes_typed_custom_emoji() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let host = MockHost::new();

        m.bind(&host, GUILD, "  <a:party:77>  ", "Partier").await.unwrap();
        let snapshot = m.snapshot(GUILD).await;
        assert_eq!(snapshot[0].1, "<a:party:77>");
    }

    #[tokio::test]
    async fn test_bind_survives_persist_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let host = MockHost::new();
        {
            let m = manager(&dir);
            m.bind(&host, GUILD, "🎮", "Gamer").await.unwrap();
            m.bind(&host, GUILD, "🎨", "Artist").await.unwrap();
            m.bind(&host, GUILD, "🎵", "Musician").await.unwrap();
        }
        // A fresh manager over the same directory sees the same table.
        let m = manager(&dir);
        let names: Vec<String> = m.snapshot(GUILD).await.into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Gamer", "Artist", "Musician"]);
    }

    // ── publish ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_publish_empty_table_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let host = MockHost::new();

        let err = m.publish_list(&host, GUILD, CHANNEL).await.unwrap_err();
        assert!(matches!(err, RoleError::EmptyBindingSet));
        assert!(host.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn test_publish_body_and_reactions_follow_table_order() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let host = MockHost::new();

        let message_id = published_fixture(&m, &host).await;

        let sent = host.sent_messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].channel_id, CHANNEL);
        let gamer_at = sent[0].content.find("- 🎮 Gamer").unwrap();
        let artist_at = sent[0].content.find("- 🎨 Artist").unwrap();
        assert!(gamer_at < artist_at);

        assert_eq!(
            host.reactions(),
            vec![
                (CHANNEL, message_id, "🎮".to_string()),
                (CHANNEL, message_id, "🎨".to_string()),
            ]
        );

        let reloaded = StateStore::new(dir.path()).load(GUILD);
        assert_eq!(reloaded.list_message_id, message_id);
    }

    #[tokio::test]
    async fn test_publish_partial_reaction_failure_keeps_anchor() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let host = MockHost::new();
        m.bind(&host, GUILD, "🎮", "Gamer").await.unwrap();
        m.bind(&host, GUILD, "🎨", "Artist").await.unwrap();
        host.fail_reactions_after(1);

        let err = m.publish_list(&host, GUILD, CHANNEL).await.unwrap_err();
        assert!(matches!(err, RoleError::PermissionDenied));

        // One reaction went through and is not rolled back; the anchor
        // message id was persisted before any attach was attempted.
        assert_eq!(host.reactions().len(), 1);
        let reloaded = StateStore::new(dir.path()).load(GUILD);
        assert_ne!(reloaded.list_message_id, 0);
    }

    #[tokio::test]
    async fn test_republish_moves_the_anchor() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let host = MockHost::new();
        host.seed_member(GUILD, USER);

        let old_anchor = published_fixture(&m, &host).await;
        let new_anchor = m.publish_list(&host, GUILD, CHANNEL).await.unwrap();
        assert_ne!(old_anchor, new_anchor);

        // The replaced anchor is inert.
        let outcome = m
            .handle_reaction(&host, &add_event(old_anchor, USER, EmojiRef::unicode("🎮")))
            .await
            .unwrap();
        assert_eq!(outcome, ReactionOutcome::ForeignMessage);
        assert!(host.grants().is_empty());
    }

    // ── reaction handling ─────────────────────────────────────────────────

    #[tokio::test]
    async fn test_reaction_grants_role_and_audits() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let host = MockHost::new();
        host.seed_member(GUILD, USER);
        m.set_log_channel(GUILD, LOG_CHANNEL).await.unwrap();

        let anchor = published_fixture(&m, &host).await;
        let outcome = m
            .handle_reaction(&host, &add_event(anchor, USER, EmojiRef::unicode("🎮")))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ReactionOutcome::Granted {
                role_name: "Gamer".to_string()
            }
        );
        assert_eq!(host.grants().len(), 1);
        let (g, u, _) = host.grants()[0];
        assert_eq!((g, u), (GUILD, USER));

        let audit = host
            .sent_messages()
            .into_iter()
            .find(|msg| msg.channel_id == LOG_CHANNEL)
            .expect("one audit line");
        assert!(audit.content.contains(&format!("<@{USER}>")));
        assert!(audit.content.contains("🎮"));
        assert!(audit.content.contains("Gamer"));
    }

    #[tokio::test]
    async fn test_reaction_remove_revokes_role() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let host = MockHost::new();
        host.seed_member(GUILD, USER);
        m.set_log_channel(GUILD, LOG_CHANNEL).await.unwrap();

        let anchor = published_fixture(&m, &host).await;
        let event = ReactionEvent {
            kind: ReactionKind::Remove,
            ..add_event(anchor, USER, EmojiRef::unicode("🎨"))
        };
        let outcome = m.handle_reaction(&host, &event).await.unwrap();

        assert_eq!(
            outcome,
            ReactionOutcome::Revoked {
                role_name: "Artist".to_string()
            }
        );
        assert_eq!(host.revokes().len(), 1);
        assert!(host.grants().is_empty());

        let audit = host
            .sent_messages()
            .into_iter()
            .find(|msg| msg.channel_id == LOG_CHANNEL)
            .unwrap();
        assert!(audit.content.contains("role removed"));
    }

    #[tokio::test]
    async fn test_bots_own_reaction_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let host = MockHost::new();
        host.seed_member(GUILD, BOT);

        let anchor = published_fixture(&m, &host).await;
        let outcome = m
            .handle_reaction(&host, &add_event(anchor, BOT, EmojiRef::unicode("🎮")))
            .await
            .unwrap();
        assert_eq!(outcome, ReactionOutcome::OwnReaction);
        assert!(host.grants().is_empty());
    }

    #[tokio::test]
    async fn test_reaction_on_other_message_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let host = MockHost::new();
        host.seed_member(GUILD, USER);
        m.set_log_channel(GUILD, LOG_CHANNEL).await.unwrap();

        let anchor = published_fixture(&m, &host).await;
        let before = host.sent_messages().len();
        let outcome = m
            .handle_reaction(&host, &add_event(anchor + 1, USER, EmojiRef::unicode("🎮")))
            .await
            .unwrap();

        assert_eq!(outcome, ReactionOutcome::ForeignMessage);
        assert!(host.grants().is_empty());
        // no audit line either
        assert_eq!(host.sent_messages().len(), before);
    }

    #[tokio::test]
    async fn test_unknown_member_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let host = MockHost::new();

        let anchor = published_fixture(&m, &host).await;
        let outcome = m
            .handle_reaction(&host, &add_event(anchor, 777, EmojiRef::unicode("🎮")))
            .await
            .unwrap();
        assert_eq!(outcome, ReactionOutcome::UnknownMember);
        assert!(host.grants().is_empty());
    }

    #[tokio::test]
    async fn test_unbound_emoji_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let host = MockHost::new();
        host.seed_member(GUILD, USER);

        let anchor = published_fixture(&m, &host).await;
        let outcome = m
            .handle_reaction(&host, &add_event(anchor, USER, EmojiRef::unicode("🔥")))
            .await
            .unwrap();
        assert_eq!(outcome, ReactionOutcome::UnboundEmoji);
        assert!(host.grants().is_empty());
    }

    #[tokio::test]
    async fn test_stale_role_is_ignored_and_not_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let host = MockHost::new();
        host.seed_member(GUILD, USER);

        let anchor = published_fixture(&m, &host).await;
        // The role disappears on the platform without a delete event.
        let gamer_id = host.find_role(GUILD, "Gamer").await.unwrap();
        host.drop_role(GUILD, gamer_id);

        let outcome = m
            .handle_reaction(&host, &add_event(anchor, USER, EmojiRef::unicode("🎮")))
            .await
            .unwrap();
        assert_eq!(outcome, ReactionOutcome::StaleRole);
        // The binding stays; only the role-delete listener prunes.
        assert_eq!(m.snapshot(GUILD).await.len(), 2);
    }

    #[tokio::test]
    async fn test_grant_permission_failure_surfaces_without_audit() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let host = MockHost::new();
        host.seed_member(GUILD, USER);
        m.set_log_channel(GUILD, LOG_CHANNEL).await.unwrap();

        let anchor = published_fixture(&m, &host).await;
        host.deny_grants();
        let before = host.sent_messages().len();

        let err = m
            .handle_reaction(&host, &add_event(anchor, USER, EmojiRef::unicode("🎮")))
            .await
            .unwrap_err();
        assert!(matches!(err, RoleError::PermissionDenied));
        assert_eq!(host.sent_messages().len(), before);
    }

    #[tokio::test]
    async fn test_duplicate_emoji_resolves_to_first_binding() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let host = MockHost::new();
        host.seed_member(GUILD, USER);

        m.bind(&host, GUILD, "🎮", "Gamer").await.unwrap();
        m.bind(&host, GUILD, "🎮", "Speedrunner").await.unwrap();
        let anchor = m.publish_list(&host, GUILD, CHANNEL).await.unwrap();

        let outcome = m
            .handle_reaction(&host, &add_event(anchor, USER, EmojiRef::unicode("🎮")))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ReactionOutcome::Granted {
                role_name: "Gamer".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_fail_the_grant() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let host = MockHost::new();
        host.seed_member(GUILD, USER);
        m.set_log_channel(GUILD, LOG_CHANNEL).await.unwrap();

        let anchor = published_fixture(&m, &host).await;
        host.deny_sends();

        let outcome = m
            .handle_reaction(&host, &add_event(anchor, USER, EmojiRef::unicode("🎮")))
            .await
            .unwrap();
        assert!(matches!(outcome, ReactionOutcome::Granted { .. }));
        assert_eq!(host.grants().len(), 1);
    }

    // ── removal and pruning ───────────────────────────────────────────────

    #[tokio::test]
    async fn test_remove_role_deletes_binding_and_platform_role() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let host = MockHost::new();

        m.bind(&host, GUILD, "🎮", "Gamer").await.unwrap();
        m.remove_role(&host, GUILD, "Gamer").await.unwrap();

        assert!(m.snapshot(GUILD).await.is_empty());
        assert_eq!(host.deleted_roles().len(), 1);
        assert!(StateStore::new(dir.path()).load(GUILD).roles.is_empty());
    }

    #[tokio::test]
    async fn test_remove_missing_role_reports_not_found_but_persists() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let host = MockHost::new();

        let err = m.remove_role(&host, GUILD, "Ghost").await.unwrap_err();
        assert!(matches!(err, RoleError::NotFound(_)));
        // The removal attempt still wrote the (empty) state file.
        assert!(StateStore::new(dir.path()).path(GUILD).exists());
    }

    #[tokio::test]
    async fn test_role_delete_event_prunes_binding() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let host = MockHost::new();

        m.bind(&host, GUILD, "🎮", "Gamer").await.unwrap();
        m.bind(&host, GUILD, "🎨", "Artist").await.unwrap();
        let gamer_id = host.find_role(GUILD, "Gamer").await.unwrap();

        let pruned = m
            .prune_deleted_role(GUILD, gamer_id, Some("Gamer"))
            .await
            .unwrap();
        assert!(pruned);

        let names: Vec<String> = m.snapshot(GUILD).await.into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Artist"]);

        let reloaded = StateStore::new(dir.path()).load(GUILD);
        assert_eq!(reloaded.roles.len(), 1);
        assert_eq!(reloaded.roles[0].name, "Artist");
    }

    #[tokio::test]
    async fn test_prune_without_cached_name_falls_back_to_id() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let host = MockHost::new();

        let BindOutcome::Created { role_id } = m.bind(&host, GUILD, "🎮", "Gamer").await.unwrap()
        else {
            panic!("expected Created");
        };
        let pruned = m.prune_deleted_role(GUILD, role_id, None).await.unwrap();
        assert!(pruned);
        assert!(m.snapshot(GUILD).await.is_empty());
    }

    #[tokio::test]
    async fn test_prune_miss_still_persists() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let _host = MockHost::new();

        let pruned = m.prune_deleted_role(GUILD, 999, Some("Ghost")).await.unwrap();
        assert!(!pruned);
        assert!(StateStore::new(dir.path()).path(GUILD).exists());
    }

    // ── guild isolation ───────────────────────────────────────────────────

    #[tokio::test]
    async fn test_guilds_do_not_share_tables() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let host = MockHost::new();

        m.bind(&host, 200, "🎮", "Gamer").await.unwrap();
        m.bind(&host, 201, "🎨", "Artist").await.unwrap();

        assert_eq!(m.snapshot(200).await.len(), 1);
        assert_eq!(m.snapshot(201).await.len(), 1);
        assert_eq!(m.snapshot(200).await[0].0, "Gamer");
        assert_eq!(m.snapshot(201).await[0].0, "Artist");
    }

    #[tokio::test]
    async fn test_concurrent_binds_are_all_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let m = std::sync::Arc::new(manager(&dir));
        let host = MockHost::new();

        let mut handles = Vec::new();
        for i in 0..8u64 {
            let m = m.clone();
            let host = host.clone();
            handles.push(tokio::spawn(async move {
                m.bind(&host, GUILD, &format!("{i}\u{fe0f}\u{20e3}"), &format!("Tier{i}"))
                    .await
                    .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(m.snapshot(GUILD).await.len(), 8);
        assert_eq!(StateStore::new(dir.path()).load(GUILD).roles.len(), 8);
    }

    // ── rendering ─────────────────────────────────────────────────────────

    #[test]
    fn test_render_role_list_layout() {
        let snapshot = vec![
            ("Gamer".to_string(), "🎮".to_string()),
            ("Artist".to_string(), "🎨".to_string()),
        ];
        assert_eq!(
            render_role_list(&snapshot),
            "**Server Roles:**\n- 🎮 Gamer\n- 🎨 Artist"
        );
    }
}
