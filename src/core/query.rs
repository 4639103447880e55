use crate::domain::model::{Board, BoardStatus, Square};
use crate::utils::error::{Result, SquaresError};
use crate::utils::validation::parse_reference_number;

/// Squares on one board whose buyer matched a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMatch<'a> {
    pub board: &'a Board,
    pub squares: Vec<Square>,
}

pub fn pad_reference_number(number: u32) -> String {
    format!("{:04}", number)
}

/// Looks up a sold-out board by the `#NNNN` part of its reference.
///
/// `Ok(None)` is the ordinary "board not found" outcome; only a query that is not
/// a number is an error.
pub fn find_board_by_reference_number<'a>(
    boards: &'a [Board],
    query: &str,
) -> Result<Option<&'a Board>> {
    let number = parse_reference_number(query)?;
    Ok(boards
        .iter()
        .filter(|b| b.status() == BoardStatus::SoldOut)
        .find(|b| b.reference_number() == Some(number)))
}

/// Same lookup without the sold-out restriction, used for exports.
pub fn find_any_board_by_reference_number<'a>(
    boards: &'a [Board],
    query: &str,
) -> Result<Option<&'a Board>> {
    let number = parse_reference_number(query)?;
    Ok(boards.iter().find(|b| b.reference_number() == Some(number)))
}

/// Case-insensitive substring search over buyers on every board.
///
/// A query containing `@` is matched against emails only; anything else matches
/// either the username or the email.
pub fn find_entries_by_identity<'a>(
    boards: &'a [Board],
    query: &str,
) -> Result<Vec<EntryMatch<'a>>> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Err(SquaresError::validation("Enter a username or email to search."));
    }
    let email_only = needle.contains('@');

    let matches = boards
        .iter()
        .filter_map(|board| {
            let squares: Vec<Square> = board
                .sold()
                .iter()
                .filter(|(_, entry)| {
                    let email_hit = entry.email.to_lowercase().contains(&needle);
                    if email_only {
                        email_hit
                    } else {
                        email_hit || entry.username.to_lowercase().contains(&needle)
                    }
                })
                .map(|(square, _)| *square)
                .collect();

            if squares.is_empty() {
                None
            } else {
                Some(EntryMatch { board, squares })
            }
        })
        .collect();

    Ok(matches)
}

/// Sold-out boards, newest first.
pub fn archived_boards(boards: &[Board]) -> Vec<&Board> {
    boards
        .iter()
        .filter(|b| b.status() == BoardStatus::SoldOut)
        .collect()
}

/// Boards that still owe refunds, newest first.
pub fn boards_with_refunds(boards: &[Board]) -> Vec<&Board> {
    boards.iter().filter(|b| !b.refunds().is_empty()).collect()
}
