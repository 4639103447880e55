use crate::domain::model::{Board, BoardStatus, Square, GRID_SIZE, TOTAL_SQUARES};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellState {
    Available,
    Selected,
    Sold { username: String },
}

/// Read-only snapshot of one board for rendering; the renderer decides how to draw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridView {
    pub reference: String,
    pub status: BoardStatus,
    pub remaining: usize,
    cells: Vec<CellState>,
}

impl GridView {
    pub fn from_board(board: &Board, selected: &[Square]) -> Self {
        let cells = Square::all()
            .map(|square| match board.entry_at(square) {
                Some(entry) => CellState::Sold {
                    username: entry.username.clone(),
                },
                None if selected.contains(&square) => CellState::Selected,
                None => CellState::Available,
            })
            .collect();

        Self {
            reference: board.reference.clone(),
            status: board.status(),
            remaining: board.remaining(),
            cells,
        }
    }

    pub fn cell(&self, square: Square) -> &CellState {
        &self.cells[square.index() as usize]
    }

    /// Tooltip text for a sold square.
    pub fn buyer_at(&self, square: Square) -> Option<&str> {
        match self.cell(square) {
            CellState::Sold { username } => Some(username),
            _ => None,
        }
    }

    pub fn sold_count(&self) -> usize {
        TOTAL_SQUARES - self.remaining
    }
}

impl fmt::Display for GridView {
    /// 11×11 text grid: home digits across the top, away digits down the side.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} [{}]", self.reference, self.status)?;
        write!(f, "   ")?;
        for home in 0..GRID_SIZE {
            write!(f, " {}", home)?;
        }
        writeln!(f)?;

        for away in 0..GRID_SIZE {
            write!(f, "{:>2} ", away)?;
            for home in 0..GRID_SIZE {
                let mark = match Square::from_coords(home, away).map(|s| self.cell(s)) {
                    Some(CellState::Sold { .. }) => '■',
                    Some(CellState::Selected) => '*',
                    _ => '·',
                };
                write!(f, " {}", mark)?;
            }
            writeln!(f)?;
        }
        write!(f, "Remaining: {}", self.remaining)
    }
}
