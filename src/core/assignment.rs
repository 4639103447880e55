use crate::domain::model::{Board, Entry, Square};
use crate::utils::error::{Result, SquaresError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

/// Chooses free squares and records entries on a board.
pub struct AssignmentEngine<R: Rng> {
    rng: R,
}

impl AssignmentEngine<StdRng> {
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl<R: Rng> AssignmentEngine<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Squares not yet sold, in ascending order.
    pub fn available_indices(&self, board: &Board) -> Vec<Square> {
        Square::all()
            .filter(|square| !board.sold().contains_key(square))
            .collect()
    }

    /// Fisher-Yates shuffle of `available`, keeping the first `qty`.
    pub fn pick_random(&mut self, mut available: Vec<Square>, qty: usize) -> Result<Vec<Square>> {
        if qty == 0 {
            return Err(SquaresError::validation("Quantity must be at least 1."));
        }
        if qty > available.len() {
            return Err(SquaresError::InsufficientSquares {
                requested: qty,
                available: available.len(),
            });
        }

        available.shuffle(&mut self.rng);
        available.truncate(qty);
        available.sort_unstable();
        Ok(available)
    }

    /// Manual pick: non-empty, no repeats, every square still free.
    pub fn validate_selection(&self, board: &Board, squares: &[Square]) -> Result<()> {
        if squares.is_empty() {
            return Err(SquaresError::validation("Select at least one square."));
        }

        let mut seen = HashSet::with_capacity(squares.len());
        for square in squares {
            if !seen.insert(*square) {
                return Err(SquaresError::validation(format!(
                    "Square {} was selected more than once.",
                    square
                )));
            }
            if board.sold().contains_key(square) {
                return Err(SquaresError::SquareTaken {
                    square: square.to_string(),
                });
            }
        }
        Ok(())
    }

    /// All or nothing: every check runs before the first write.
    pub fn assign(&self, board: &mut Board, squares: &[Square], entry: &Entry) -> Result<()> {
        if !board.is_open() {
            return Err(SquaresError::BoardNotOpen {
                reference: board.reference.clone(),
                status: board.status().to_string(),
            });
        }
        self.validate_selection(board, squares)?;

        for square in squares {
            board.sold.insert(*square, entry.clone());
        }

        tracing::debug!(
            "Assigned {} square(s) on {} to {}",
            squares.len(),
            board.reference,
            entry.username
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{BoardStatus, TOTAL_SQUARES};
    use chrono::Utc;
    use rand_chacha::ChaCha8Rng;

    fn engine() -> AssignmentEngine<ChaCha8Rng> {
        AssignmentEngine::with_rng(ChaCha8Rng::seed_from_u64(7))
    }

    fn board() -> Board {
        Board::new("b1".to_string(), "Test • Board #0001".to_string(), Utc::now())
    }

    fn entry(name: &str) -> Entry {
        Entry::new(name, &format!("{}@x.com", name), Utc::now())
    }

    fn squares(indices: &[u8]) -> Vec<Square> {
        indices.iter().map(|i| Square::new(*i).unwrap()).collect()
    }

    #[test]
    fn test_available_indices_excludes_sold() {
        let engine = engine();
        let mut board = board();
        assert_eq!(engine.available_indices(&board).len(), TOTAL_SQUARES);

        engine
            .assign(&mut board, &squares(&[0, 50, 99]), &entry("john"))
            .unwrap();
        let available = engine.available_indices(&board);
        assert_eq!(available.len(), 97);
        assert!(!available.contains(&Square::new(50).unwrap()));
        assert_eq!(available[0].index(), 1);
    }

    #[test]
    fn test_pick_random_returns_distinct_available_squares() {
        let mut engine = engine();
        let available = squares(&[3, 8, 13, 21, 34, 55]);

        let picked = engine.pick_random(available.clone(), 4).unwrap();
        assert_eq!(picked.len(), 4);
        let unique: HashSet<_> = picked.iter().collect();
        assert_eq!(unique.len(), 4);
        assert!(picked.iter().all(|s| available.contains(s)));
    }

    #[test]
    fn test_pick_random_rejects_bad_quantities() {
        let mut engine = engine();
        let err = engine.pick_random(squares(&[1, 2]), 3).unwrap_err();
        assert!(matches!(
            err,
            SquaresError::InsufficientSquares {
                requested: 3,
                available: 2
            }
        ));
        assert!(matches!(
            engine.pick_random(squares(&[1, 2]), 0),
            Err(SquaresError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_pick_one_covers_every_square() {
        let mut engine = engine();
        let all: Vec<Square> = Square::all().collect();
        let mut seen = HashSet::new();

        for _ in 0..5_000 {
            let picked = engine.pick_random(all.clone(), 1).unwrap();
            seen.insert(picked[0]);
        }
        assert_eq!(seen.len(), TOTAL_SQUARES);
    }

    #[test]
    fn test_assign_is_all_or_nothing() {
        let engine = engine();
        let mut board = board();
        engine
            .assign(&mut board, &squares(&[10]), &entry("alice"))
            .unwrap();

        let err = engine
            .assign(&mut board, &squares(&[11, 12, 10]), &entry("bob"))
            .unwrap_err();
        assert!(matches!(err, SquaresError::SquareTaken { .. }));
        assert_eq!(board.sold_count(), 1);
        assert_eq!(board.entry_at(Square::new(10).unwrap()).unwrap().username, "alice");
    }

    #[test]
    fn test_assign_rejects_duplicates_and_closed_boards() {
        let engine = engine();
        let mut board = board();
        assert!(matches!(
            engine.assign(&mut board, &squares(&[4, 4]), &entry("bob")),
            Err(SquaresError::ValidationError { .. })
        ));
        assert!(matches!(
            engine.assign(&mut board, &[], &entry("bob")),
            Err(SquaresError::ValidationError { .. })
        ));

        board.close(BoardStatus::Void);
        assert!(matches!(
            engine.assign(&mut board, &squares(&[4]), &entry("bob")),
            Err(SquaresError::BoardNotOpen { .. })
        ));
        assert_eq!(board.sold_count(), 0);
    }
}
