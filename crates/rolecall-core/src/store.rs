//! Per-guild JSON state files.

use std::fs;
use std::path::PathBuf;

use tracing::warn;

use crate::error::RoleError;
use crate::state::GuildRoleState;

/// Owns the data directory holding one `<guild_id>.json` per guild.
///
/// `load` never fails: a missing or unreadable file yields the default
/// empty state, so a fresh deployment or a corrupted file degrades to
/// "no bindings" rather than a startup error. `persist` writes to a
/// temp file in the same directory and renames it over the target, so a
/// crash mid-write leaves the previous valid file intact.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, guild_id: u64) -> PathBuf {
        self.dir.join(format!("{guild_id}.json"))
    }

    pub fn load(&self, guild_id: u64) -> GuildRoleState {
        let path = self.path(guild_id);
        match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(state) => state,
                Err(e) => {
                    warn!("State file {} is unparsable, starting empty: {}", path.display(), e);
                    GuildRoleState::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => GuildRoleState::default(),
            Err(e) => {
                warn!("Failed to read state file {}: {}", path.display(), e);
                GuildRoleState::default()
            }
        }
    }

    pub fn persist(&self, guild_id: u64, state: &GuildRoleState) -> Result<(), RoleError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.dir.join(format!("{guild_id}.json.tmp"));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, self.path(guild_id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, StateStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_load_missing_file_is_empty_state() {
        let (_dir, store) = store();
        assert_eq!(store.load(100), GuildRoleState::default());
    }

    #[test]
    fn test_persist_then_load_roundtrip() {
        let (_dir, store) = store();
        let mut state = GuildRoleState::default();
        state.log_channel_id = 1;
        state.list_message_id = 2;
        state.push_binding("Gamer", "🎮", Some(3));
        state.push_binding("Artist", "🎨", None);

        store.persist(100, &state).unwrap();
        assert_eq!(store.load(100), state);
    }

    #[test]
    fn test_guilds_get_separate_files() {
        let (_dir, store) = store();
        let mut a = GuildRoleState::default();
        a.push_binding("A", "🎮", Some(1));
        let mut b = GuildRoleState::default();
        b.push_binding("B", "🎨", Some(2));

        store.persist(100, &a).unwrap();
        store.persist(200, &b).unwrap();
        assert_eq!(store.load(100), a);
        assert_eq!(store.load(200), b);
    }

    #[test]
    fn test_corrupt_file_loads_as_empty() {
        let (_dir, store) = store();
        fs::write(store.path(100), "{ not json").unwrap();
        assert_eq!(store.load(100), GuildRoleState::default());
    }

    #[test]
    fn test_persist_overwrites_previous_file() {
        let (_dir, store) = store();
        let mut state = GuildRoleState::default();
        state.push_binding("A", "🎮", Some(1));
        store.persist(100, &state).unwrap();

        state.remove_by_name("A");
        store.persist(100, &state).unwrap();
        assert!(store.load(100).roles.is_empty());
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let (dir, store) = store();
        store.persist(100, &GuildRoleState::default()).unwrap();
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|x| x == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
