use crate::core::assignment::AssignmentEngine;
use crate::core::export::export_csv;
use crate::core::lifecycle::{KickoffOutcome, LifecycleRules};
use crate::core::query::{self, EntryMatch};
use crate::core::store::BoardStore;
use crate::core::view::GridView;
use crate::domain::model::{Board, Entry, Square};
use crate::domain::ports::{SettingsProvider, Storage};
use crate::utils::error::{Result, SquaresError};
use crate::utils::validation::{parse_quantity, validate_identity};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::Rng;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRequest {
    pub username: String,
    pub email: String,
    pub quantity: usize,
}

impl PurchaseRequest {
    pub fn new(username: &str, email: &str, quantity: usize) -> Self {
        Self {
            username: username.trim().to_string(),
            email: email.trim().to_string(),
            quantity,
        }
    }

    /// Builds a request from raw form text; the quantity may be anything the user typed.
    pub fn from_form(username: &str, email: &str, quantity: &str) -> Result<Self> {
        validate_identity(username, email)?;
        let quantity = parse_quantity(quantity)?;
        Ok(Self::new(username, email, quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub board_id: String,
    pub reference: String,
    pub squares: Vec<Square>,
    /// Squares left on the board the purchase landed on.
    pub remaining: usize,
    pub sold_out: bool,
    /// Set when the purchase filled the board and a new one was opened.
    pub next_board_id: Option<String>,
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let squares: Vec<String> = self.squares.iter().map(|s| s.to_string()).collect();
        write!(
            f,
            "Purchased {} square(s)\nBoard: {}\nSquares: {}",
            self.squares.len(),
            self.reference,
            squares.join(", ")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KickoffReport {
    pub board_id: String,
    pub reference: String,
    pub outcome: KickoffOutcome,
    pub new_board_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportSelection {
    Active,
    /// Any board, by the number in its reference.
    Reference(String),
    All,
}

/// Entry point for callers: every operation validates, mutates and persists in one go.
pub struct SquaresEngine<S: Storage, R: Rng = StdRng> {
    store: BoardStore<S>,
    assigner: AssignmentEngine<R>,
    rules: LifecycleRules,
}

impl<S: Storage> SquaresEngine<S, StdRng> {
    pub fn new<C: SettingsProvider>(storage: S, settings: &C) -> Self {
        Self::with_assigner(storage, settings, AssignmentEngine::from_entropy())
    }
}

impl<S: Storage, R: Rng> SquaresEngine<S, R> {
    pub fn with_rng<C: SettingsProvider>(storage: S, settings: &C, rng: R) -> Self {
        Self::with_assigner(storage, settings, AssignmentEngine::with_rng(rng))
    }

    fn with_assigner<C: SettingsProvider>(
        storage: S,
        settings: &C,
        assigner: AssignmentEngine<R>,
    ) -> Self {
        Self {
            store: BoardStore::load(storage, settings),
            assigner,
            rules: LifecycleRules::from_settings(settings),
        }
    }

    pub fn store(&self) -> &BoardStore<S> {
        &self.store
    }

    pub fn boards(&self) -> &[Board] {
        self.store.boards()
    }

    pub fn into_storage(self) -> S {
        self.store.into_storage()
    }

    /// The open active board, opening one if needed.
    pub fn active_board(&mut self, now: DateTime<Utc>) -> Result<&Board> {
        let id = self.store.ensure_active_board(now)?;
        self.store.board(&id).ok_or_else(|| missing_board(&id))
    }

    /// Random squares for one buyer. Nothing is written unless every square fits.
    pub fn purchase(&mut self, request: &PurchaseRequest, now: DateTime<Utc>) -> Result<Receipt> {
        validate_identity(&request.username, &request.email)?;
        if request.quantity == 0 {
            return Err(SquaresError::validation(
                crate::utils::validation::ENTRY_FORM_MESSAGE,
            ));
        }

        let board_id = self.store.ensure_active_board(now)?;
        let board = self
            .store
            .board_mut(&board_id)
            .ok_or_else(|| missing_board(&board_id))?;
        ensure_accepting(&self.rules, board, now)?;

        let available = self.assigner.available_indices(board);
        let chosen = self.assigner.pick_random(available, request.quantity)?;
        let entry = Entry::new(&request.username, &request.email, now);
        self.assigner.assign(board, &chosen, &entry)?;

        self.finish_purchase(&board_id, chosen, now)
    }

    /// Manual pick of specific squares.
    pub fn purchase_selected(
        &mut self,
        username: &str,
        email: &str,
        squares: &[Square],
        now: DateTime<Utc>,
    ) -> Result<Receipt> {
        validate_identity(username, email)?;

        let board_id = self.store.ensure_active_board(now)?;
        let board = self
            .store
            .board_mut(&board_id)
            .ok_or_else(|| missing_board(&board_id))?;
        ensure_accepting(&self.rules, board, now)?;

        let entry = Entry::new(username, email, now);
        self.assigner.assign(board, squares, &entry)?;

        let mut chosen = squares.to_vec();
        chosen.sort_unstable();
        self.finish_purchase(&board_id, chosen, now)
    }

    fn finish_purchase(
        &mut self,
        board_id: &str,
        squares: Vec<Square>,
        now: DateTime<Utc>,
    ) -> Result<Receipt> {
        let board = self
            .store
            .board_mut(board_id)
            .ok_or_else(|| missing_board(board_id))?;

        let sold_out = self.rules.mark_sold_out_if_full(board);
        let reference = board.reference.clone();
        let remaining = board.remaining();

        let next_board_id = if sold_out {
            // create_board 內部會一併存檔
            Some(self.store.create_board(now)?.id.clone())
        } else {
            self.store.save()?;
            None
        };

        tracing::info!(
            "🎟️ {} square(s) sold on {}, {} left",
            squares.len(),
            reference,
            remaining
        );

        Ok(Receipt {
            board_id: board_id.to_string(),
            reference,
            squares,
            remaining,
            sold_out,
            next_board_id,
        })
    }

    pub fn set_kickoff(&mut self, kickoff_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<&Board> {
        let board_id = self.store.ensure_active_board(now)?;
        let board = self
            .store
            .board_mut(&board_id)
            .ok_or_else(|| missing_board(&board_id))?;
        board.kickoff_at = Some(kickoff_at);
        tracing::info!("⏰ Kickoff for {} set to {}", board.reference, kickoff_at);

        self.store.save()?;
        self.store.board(&board_id).ok_or_else(|| missing_board(&board_id))
    }

    /// Applies the kickoff cutoff to the active board. Runs only when called.
    pub fn run_kickoff_check(&mut self, now: DateTime<Utc>) -> Result<KickoffReport> {
        let board_id = self.store.ensure_active_board(now)?;
        let board = self
            .store
            .board_mut(&board_id)
            .ok_or_else(|| missing_board(&board_id))?;

        let outcome = self.rules.run_kickoff_check(board, now);
        let reference = board.reference.clone();

        let new_board_id = if outcome.closed_board() {
            Some(self.store.create_board(now)?.id.clone())
        } else {
            None
        };

        Ok(KickoffReport {
            board_id,
            reference,
            outcome,
            new_board_id,
        })
    }

    pub fn grid(&mut self, selected: &[Square], now: DateTime<Utc>) -> Result<GridView> {
        let board = self.active_board(now)?;
        Ok(GridView::from_board(board, selected))
    }

    pub fn export_csv(&mut self, selection: &ExportSelection, now: DateTime<Utc>) -> Result<String> {
        match selection {
            ExportSelection::Active => {
                let board = self.active_board(now)?;
                export_csv([board])
            }
            ExportSelection::Reference(number) => {
                let board = query::find_any_board_by_reference_number(self.boards(), number)?
                    .ok_or_else(|| SquaresError::NotFound {
                        what: "Board".to_string(),
                        query: number.clone(),
                    })?;
                export_csv([board])
            }
            ExportSelection::All => export_csv(self.boards()),
        }
    }

    pub fn find_board(&self, number: &str) -> Result<Option<&Board>> {
        query::find_board_by_reference_number(self.boards(), number)
    }

    pub fn search(&self, query: &str) -> Result<Vec<EntryMatch<'_>>> {
        query::find_entries_by_identity(self.boards(), query)
    }

    pub fn archive(&self) -> Vec<&Board> {
        query::archived_boards(self.boards())
    }

    pub fn refunds_due(&self) -> Vec<&Board> {
        query::boards_with_refunds(self.boards())
    }

    pub fn reset(&mut self) -> Result<()> {
        self.store.reset()
    }
}

fn ensure_accepting(rules: &LifecycleRules, board: &Board, now: DateTime<Utc>) -> Result<()> {
    if rules.accepts_entries(board, now) {
        return Ok(());
    }
    Err(SquaresError::BoardNotOpen {
        reference: board.reference.clone(),
        status: "past kickoff cutoff".to_string(),
    })
}

fn missing_board(id: &str) -> SquaresError {
    SquaresError::NotFound {
        what: "Board".to_string(),
        query: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStorage;
    use crate::config::Settings;
    use crate::domain::model::{BoardStatus, TOTAL_SQUARES};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn engine() -> SquaresEngine<MemoryStorage, ChaCha8Rng> {
        SquaresEngine::with_rng(
            MemoryStorage::new(),
            &Settings::default(),
            ChaCha8Rng::seed_from_u64(42),
        )
    }

    #[test]
    fn test_receipt_summary() {
        let receipt = Receipt {
            board_id: "b".to_string(),
            reference: "Superbowl 2026 • Board #0001".to_string(),
            squares: vec![Square::new(3).unwrap(), Square::new(47).unwrap()],
            remaining: 98,
            sold_out: false,
            next_board_id: None,
        };
        assert_eq!(
            receipt.to_string(),
            "Purchased 2 square(s)\nBoard: Superbowl 2026 • Board #0001\nSquares: H3-A0, H7-A4"
        );
    }

    #[test]
    fn test_from_form_validation() {
        assert!(PurchaseRequest::from_form("john", "john@x.com", "3").is_ok());
        assert!(PurchaseRequest::from_form("", "john@x.com", "3").is_err());
        assert!(PurchaseRequest::from_form("john", "john@x.com", "three").is_err());
        assert!(PurchaseRequest::from_form("john", "john@x.com", "0").is_err());
    }

    #[test]
    fn test_purchase_zero_quantity_mutates_nothing() {
        let mut engine = engine();
        let now = Utc::now();
        let err = engine
            .purchase(&PurchaseRequest::new("john", "john@x.com", 0), now)
            .unwrap_err();
        assert!(matches!(err, SquaresError::ValidationError { .. }));
        assert!(engine.boards().is_empty());
    }

    #[test]
    fn test_purchase_selected_records_picked_squares() {
        let mut engine = engine();
        let now = Utc::now();
        let picks = vec![Square::new(12).unwrap(), Square::new(5).unwrap()];

        let receipt = engine
            .purchase_selected("amy", "amy@x.com", &picks, now)
            .unwrap();
        assert_eq!(receipt.squares, vec![Square::new(5).unwrap(), Square::new(12).unwrap()]);
        assert_eq!(receipt.remaining, TOTAL_SQUARES - 2);

        let err = engine
            .purchase_selected("bob", "bob@x.com", &[Square::new(12).unwrap()], now)
            .unwrap_err();
        assert!(matches!(err, SquaresError::SquareTaken { .. }));
        assert_eq!(engine.active_board(now).unwrap().sold_count(), 2);
    }

    #[test]
    fn test_picking_the_last_square_rotates_board() {
        let mut engine = engine();
        let now = Utc::now();
        engine
            .purchase(&PurchaseRequest::new("a", "a@x.com", 99), now)
            .unwrap();
        let last = engine.grid(&[], now).unwrap();
        assert_eq!(last.remaining, 1);

        let free = Square::all()
            .find(|s| engine.active_board(now).unwrap().entry_at(*s).is_none())
            .unwrap();
        let receipt = engine
            .purchase_selected("b", "b@x.com", &[free], now)
            .unwrap();

        assert!(receipt.sold_out);
        assert_eq!(receipt.remaining, 0);
        let next = receipt.next_board_id.clone().unwrap();
        assert_eq!(engine.active_board(now).unwrap().id, next);
        assert_eq!(
            engine.store().board(&receipt.board_id).unwrap().status(),
            BoardStatus::SoldOut
        );
    }

    #[test]
    fn test_export_unknown_reference_is_not_found() {
        let mut engine = engine();
        let err = engine
            .export_csv(&ExportSelection::Reference("0042".to_string()), Utc::now())
            .unwrap_err();
        assert!(matches!(err, SquaresError::NotFound { .. }));
    }
}
