use crate::domain::model::Board;
use crate::utils::error::Result;
use csv::{QuoteStyle, Terminator, WriterBuilder};

pub const CSV_HEADER: [&str; 7] = [
    "board",
    "idx",
    "homeDigit",
    "awayDigit",
    "username",
    "email",
    "timestamp",
];

pub const DEFAULT_EXPORT_FILENAME: &str = "scoreline-squares.csv";

/// One row per sold square; every field quoted with inner quotes doubled.
pub fn export_csv<'a, I>(boards: I) -> Result<String>
where
    I: IntoIterator<Item = &'a Board>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;

    let mut rows = 0usize;
    for board in boards {
        for (square, entry) in board.sold() {
            writer.write_record([
                board.reference.clone(),
                square.index().to_string(),
                square.home_digit().to_string(),
                square.away_digit().to_string(),
                entry.username.clone(),
                entry.email.clone(),
                entry.timestamp.to_rfc3339(),
            ])?;
            rows += 1;
        }
    }

    tracing::debug!("Exported {} row(s) to CSV", rows);

    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    String::from_utf8(bytes)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
}
