use crate::domain::model::{format_reference, AppState, Board};
use crate::domain::ports::{SettingsProvider, Storage};
use crate::utils::error::Result;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

const BOARD_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const BOARD_ID_LEN: usize = 16;

/// Owns the persisted [`AppState`] and writes it back after every mutation.
pub struct BoardStore<S: Storage> {
    storage: S,
    key: String,
    default_season: String,
    default_kickoff: Option<DateTime<Utc>>,
    kickoff_cutoff: Duration,
    state: AppState,
}

impl<S: Storage> BoardStore<S> {
    /// Never fails: missing, unreadable or malformed data falls back to an empty state.
    pub fn load<C: SettingsProvider>(storage: S, settings: &C) -> Self {
        let key = settings.storage_key().to_string();
        let state = read_state(&storage, &key, settings.season_label());

        tracing::debug!(
            "Loaded state '{}': {} board(s), next ref {}",
            key,
            state.boards.len(),
            state.next_ref
        );

        Self {
            storage,
            key,
            default_season: settings.season_label().to_string(),
            default_kickoff: settings.default_kickoff(),
            kickoff_cutoff: settings.kickoff_cutoff(),
            state,
        }
    }

    pub fn save(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.state)?;
        self.storage.set_item(&self.key, &json)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn boards(&self) -> &[Board] {
        &self.state.boards
    }

    pub fn board(&self, id: &str) -> Option<&Board> {
        self.state.boards.iter().find(|b| b.id == id)
    }

    pub fn board_mut(&mut self, id: &str) -> Option<&mut Board> {
        self.state.boards.iter_mut().find(|b| b.id == id)
    }

    /// The active board, only if it is still open.
    pub fn active_board(&self) -> Option<&Board> {
        let id = self.state.active_id.as_deref()?;
        self.board(id).filter(|b| b.is_open())
    }

    /// Returns the id of the open active board, creating one if there is none.
    pub fn ensure_active_board(&mut self, now: DateTime<Utc>) -> Result<String> {
        if let Some(board) = self.active_board() {
            return Ok(board.id.clone());
        }
        let board = self.create_board(now)?;
        Ok(board.id.clone())
    }

    pub fn create_board(&mut self, now: DateTime<Utc>) -> Result<&Board> {
        let id = self.unique_board_id();
        let reference = format_reference(&self.state.season_label, self.state.next_ref);
        self.state.next_ref += 1;

        let mut board = Board::new(id.clone(), reference, now);
        board.kickoff_at = self.inherited_kickoff(now);

        tracing::info!("📋 Opened {}", board.reference);

        self.state.boards.insert(0, board);
        self.state.active_id = Some(id);
        self.save()?;

        Ok(&self.state.boards[0])
    }

    /// 設定檔的 kickoff 只套用到截止時間之前開的板子
    fn inherited_kickoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let kickoff = self.default_kickoff?;
        if now < kickoff - self.kickoff_cutoff {
            Some(kickoff)
        } else {
            tracing::debug!("Configured kickoff {} is past its cutoff, not applied", kickoff);
            None
        }
    }

    /// Drops everything stored under the key and starts over from defaults.
    pub fn reset(&mut self) -> Result<()> {
        self.storage.remove_item(&self.key)?;
        self.state = AppState::new(&self.default_season);
        tracing::info!("🧹 Reset state '{}'", self.key);
        Ok(())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    fn unique_board_id(&self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let id: String = (0..BOARD_ID_LEN)
                .map(|_| BOARD_ID_ALPHABET[rng.gen_range(0..BOARD_ID_ALPHABET.len())] as char)
                .collect();
            if self.board(&id).is_none() {
                return id;
            }
        }
    }
}

fn read_state<S: Storage>(storage: &S, key: &str, season_label: &str) -> AppState {
    let raw = match storage.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return AppState::new(season_label),
        Err(e) => {
            tracing::warn!("⚠️ Could not read '{}', starting fresh: {}", key, e);
            return AppState::new(season_label);
        }
    };

    let mut state = match serde_json::from_str::<AppState>(&raw) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!("⚠️ Stored state '{}' is malformed, starting fresh: {}", key, e);
            return AppState::new(season_label);
        }
    };

    if state.season_label.trim().is_empty() {
        state.season_label = season_label.to_string();
    }

    // next_ref 必須大於所有已用過的編號，才能維持編號唯一
    let highest = state
        .boards
        .iter()
        .filter_map(Board::reference_number)
        .max()
        .unwrap_or(0);
    if state.next_ref <= highest {
        tracing::warn!(
            "⚠️ Stored next ref {} is behind board #{:04}, advancing",
            state.next_ref,
            highest
        );
        state.next_ref = highest + 1;
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStorage;
    use crate::config::{Settings, DEFAULT_STORAGE_KEY};
    use crate::domain::model::BoardStatus;

    fn settings() -> Settings {
        Settings::default()
    }

    #[test]
    fn test_load_missing_state_gives_defaults() {
        let store = BoardStore::load(MemoryStorage::new(), &settings());
        assert_eq!(store.state().season_label, "Superbowl 2026");
        assert_eq!(store.state().next_ref, 1);
        assert!(store.state().active_id.is_none());
        assert!(store.boards().is_empty());
    }

    #[test]
    fn test_load_malformed_state_gives_defaults() {
        for raw in ["{not json", "null", "[]", r#"{"boards": 5}"#] {
            let storage = MemoryStorage::with_item(DEFAULT_STORAGE_KEY, raw);
            let store = BoardStore::load(storage, &settings());
            assert!(store.boards().is_empty(), "input {raw}");
            assert_eq!(store.state().next_ref, 1);
        }
    }

    #[test]
    fn test_create_board_formats_reference_and_activates() {
        let mut store = BoardStore::load(MemoryStorage::new(), &settings());
        let now = Utc::now();

        let first = store.create_board(now).unwrap().id.clone();
        let second = store.create_board(now).unwrap().id.clone();

        assert_ne!(first, second);
        assert_eq!(store.boards()[0].id, second);
        assert_eq!(store.boards()[0].reference, "Superbowl 2026 • Board #0002");
        assert_eq!(store.boards()[1].reference, "Superbowl 2026 • Board #0001");
        assert_eq!(store.state().active_id.as_deref(), Some(second.as_str()));
        assert_eq!(store.state().next_ref, 3);
        assert_eq!(store.boards()[0].id.len(), BOARD_ID_LEN);
    }

    #[test]
    fn test_ensure_active_board_reuses_open_board() {
        let mut store = BoardStore::load(MemoryStorage::new(), &settings());
        let now = Utc::now();

        let id = store.ensure_active_board(now).unwrap();
        assert_eq!(store.ensure_active_board(now).unwrap(), id);
        assert_eq!(store.boards().len(), 1);
    }

    #[test]
    fn test_ensure_active_board_replaces_closed_board() {
        let mut store = BoardStore::load(MemoryStorage::new(), &settings());
        let now = Utc::now();

        let id = store.ensure_active_board(now).unwrap();
        store.board_mut(&id).unwrap().close(BoardStatus::SoldOut);

        let next = store.ensure_active_board(now).unwrap();
        assert_ne!(next, id);
        assert_eq!(store.boards().len(), 2);
        assert!(store.active_board().unwrap().is_open());
    }

    #[test]
    fn test_load_advances_stale_next_ref() {
        let mut store = BoardStore::load(MemoryStorage::new(), &settings());
        store.create_board(Utc::now()).unwrap();
        store.create_board(Utc::now()).unwrap();
        store.state.next_ref = 1;
        store.save().unwrap();

        let reloaded = BoardStore::load(store.into_storage(), &settings());
        assert_eq!(reloaded.state().next_ref, 3);
    }

    #[test]
    fn test_new_board_inherits_kickoff_only_before_cutoff() {
        let kickoff = Utc::now() + Duration::days(1);
        let settings = Settings {
            default_kickoff: Some(kickoff),
            ..Settings::default()
        };
        let mut store = BoardStore::load(MemoryStorage::new(), &settings);

        let early = store.create_board(kickoff - Duration::hours(2)).unwrap();
        assert_eq!(early.kickoff_at, Some(kickoff));

        let at_cutoff = store.create_board(kickoff - Duration::hours(1)).unwrap();
        assert_eq!(at_cutoff.kickoff_at, None);

        let late = store.create_board(kickoff + Duration::hours(3)).unwrap();
        assert_eq!(late.kickoff_at, None);
    }

    #[test]
    fn test_reset_clears_storage() {
        let mut store = BoardStore::load(MemoryStorage::new(), &settings());
        store.create_board(Utc::now()).unwrap();
        assert!(store
            .storage()
            .get_item(DEFAULT_STORAGE_KEY)
            .unwrap()
            .is_some());

        store.reset().unwrap();
        assert!(store.boards().is_empty());
        assert_eq!(store.state().next_ref, 1);
        assert!(store
            .storage()
            .get_item(DEFAULT_STORAGE_KEY)
            .unwrap()
            .is_none());
    }
}
