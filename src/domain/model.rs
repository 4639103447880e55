use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

pub const GRID_SIZE: u8 = 10;
pub const TOTAL_SQUARES: usize = 100;

/// One cell of the 10×10 board, stored as `away * 10 + home`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Square(u8);

impl Square {
    pub fn new(index: u8) -> Option<Self> {
        if (index as usize) < TOTAL_SQUARES {
            Some(Square(index))
        } else {
            None
        }
    }

    pub fn from_coords(home: u8, away: u8) -> Option<Self> {
        if home < GRID_SIZE && away < GRID_SIZE {
            Some(Square(away * GRID_SIZE + home))
        } else {
            None
        }
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// Column, read off the top header.
    pub fn home_digit(self) -> u8 {
        self.0 % GRID_SIZE
    }

    /// Row, read off the left header.
    pub fn away_digit(self) -> u8 {
        self.0 / GRID_SIZE
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0..TOTAL_SQUARES as u8).map(Square)
    }
}

impl TryFrom<u8> for Square {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Square::new(value).ok_or_else(|| format!("square index {} out of range 0..=99", value))
    }
}

impl From<Square> for u8 {
    fn from(square: Square) -> Self {
        square.0
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}-A{}", self.home_digit(), self.away_digit())
    }
}

impl FromStr for Square {
    type Err = String;

    /// Parses the `H{home}-A{away}` label shown on receipts, or a bare index.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(index) = s.parse::<u8>() {
            return Square::try_from(index);
        }

        let invalid = || format!("invalid square '{}', expected H<0-9>-A<0-9> or 0-99", s);
        let (home, away) = s.split_once('-').ok_or_else(invalid)?;
        let home = home
            .strip_prefix(['H', 'h'])
            .and_then(|d| d.parse::<u8>().ok())
            .ok_or_else(invalid)?;
        let away = away
            .strip_prefix(['A', 'a'])
            .and_then(|d| d.parse::<u8>().ok())
            .ok_or_else(invalid)?;
        Square::from_coords(home, away).ok_or_else(invalid)
    }
}

/// Buyer record attached to a sold square.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub username: String,
    pub email: String,
    pub timestamp: DateTime<Utc>,
}

impl Entry {
    pub fn new(username: &str, email: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            username: username.trim().to_string(),
            email: email.trim().to_string(),
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardStatus {
    Open,
    SoldOut,
    Void,
}

impl fmt::Display for BoardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BoardStatus::Open => "open",
            BoardStatus::SoldOut => "soldout",
            BoardStatus::Void => "void",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kickoff_at: Option<DateTime<Utc>>,
    pub(crate) status: BoardStatus,
    #[serde(default)]
    pub(crate) sold: BTreeMap<Square, Entry>,
    #[serde(default)]
    pub(crate) refunds: Vec<Entry>,
}

impl Board {
    pub fn new(id: String, reference: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            reference,
            created_at,
            kickoff_at: None,
            status: BoardStatus::Open,
            sold: BTreeMap::new(),
            refunds: Vec::new(),
        }
    }

    pub fn status(&self) -> BoardStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.status == BoardStatus::Open
    }

    pub fn sold(&self) -> &BTreeMap<Square, Entry> {
        &self.sold
    }

    pub fn refunds(&self) -> &[Entry] {
        &self.refunds
    }

    pub fn sold_count(&self) -> usize {
        self.sold.len()
    }

    pub fn remaining(&self) -> usize {
        TOTAL_SQUARES - self.sold.len()
    }

    pub fn is_full(&self) -> bool {
        self.sold.len() == TOTAL_SQUARES
    }

    pub fn entry_at(&self, square: Square) -> Option<&Entry> {
        self.sold.get(&square)
    }

    /// The `#NNNN` sequence embedded in the reference label.
    pub fn reference_number(&self) -> Option<u32> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(r"#(\d+)\s*$").expect("reference regex"));
        re.captures(&self.reference)
            .and_then(|caps| caps[1].parse().ok())
    }

    /// Status only ever leaves `Open`; returns whether the transition happened.
    pub(crate) fn close(&mut self, next: BoardStatus) -> bool {
        if self.status != BoardStatus::Open || next == BoardStatus::Open {
            return false;
        }
        self.status = next;
        true
    }
}

pub fn format_reference(season_label: &str, number: u32) -> String {
    format!("{} • Board #{:04}", season_label, number)
}

fn default_next_ref() -> u32 {
    1
}

/// Everything persisted under one storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default)]
    pub season_label: String,
    #[serde(default = "default_next_ref")]
    pub next_ref: u32,
    #[serde(default)]
    pub active_id: Option<String>,
    #[serde(default)]
    pub boards: Vec<Board>,
}

impl AppState {
    pub fn new(season_label: &str) -> Self {
        Self {
            season_label: season_label.to_string(),
            next_ref: default_next_ref(),
            active_id: None,
            boards: Vec::new(),
        }
    }
}
