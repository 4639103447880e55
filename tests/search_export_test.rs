use anyhow::Result;
use chrono::{Duration, TimeZone, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use scoreline_squares::domain::model::BoardStatus;
use scoreline_squares::{
    ExportSelection, MemoryStorage, PurchaseRequest, Settings, SquaresEngine, SquaresError,
};

fn engine() -> SquaresEngine<MemoryStorage, ChaCha8Rng> {
    SquaresEngine::with_rng(
        MemoryStorage::new(),
        &Settings::default(),
        ChaCha8Rng::seed_from_u64(21),
    )
}

#[test]
fn test_search_spans_every_board() -> Result<()> {
    let mut engine = engine();
    let now = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();

    engine.purchase(&PurchaseRequest::new("John", "jd@x.com", 4), now)?;
    engine.purchase(&PurchaseRequest::new("filler", "f@x.com", 96), now)?;
    engine.purchase(&PurchaseRequest::new("sam", "JOHNNY@mail.com", 2), now)?;
    engine.purchase(&PurchaseRequest::new("kim", "kim@x.com", 3), now)?;

    let matches = engine.search("john")?;
    assert_eq!(matches.len(), 2);

    // newest board first
    assert!(matches[0].board.is_open());
    assert_eq!(matches[0].squares.len(), 2);
    assert_eq!(matches[1].board.status(), BoardStatus::SoldOut);
    assert_eq!(matches[1].squares.len(), 4);
    for square in &matches[1].squares {
        assert_eq!(matches[1].board.entry_at(*square).unwrap().username, "John");
    }

    let by_email = engine.search("johnny@")?;
    assert_eq!(by_email.len(), 1);
    assert_eq!(by_email[0].squares.len(), 2);

    // 含 @ 時只比對 email，使用者名稱不算
    assert!(engine.search("kim@y")?.is_empty());
    assert!(matches!(
        engine.search("  "),
        Err(SquaresError::ValidationError { .. })
    ));
    Ok(())
}

#[test]
fn test_search_skips_refunded_entries() -> Result<()> {
    let mut engine = engine();
    let kickoff = Utc.with_ymd_and_hms(2026, 2, 8, 23, 30, 0).unwrap();
    let opened = kickoff - Duration::days(2);

    engine.purchase(&PurchaseRequest::new("john", "john@x.com", 3), opened)?;
    engine.set_kickoff(kickoff, opened)?;
    engine.run_kickoff_check(kickoff)?;

    // voided squares moved to refunds, so nothing left to find on that board
    assert!(engine.search("john")?.is_empty());

    engine.purchase(&PurchaseRequest::new("john", "john@x.com", 1), kickoff)?;
    let matches = engine.search("JOHN")?;
    assert_eq!(matches.len(), 1);
    assert!(matches[0].board.is_open());
    Ok(())
}

#[test]
fn test_find_board_is_informational() -> Result<()> {
    let mut engine = engine();
    let now = Utc::now();

    assert!(engine.find_board("0001")?.is_none());
    engine.purchase(&PurchaseRequest::new("john", "john@x.com", 100), now)?;
    assert!(engine.find_board("0001")?.is_some());
    assert!(engine.find_board("1")?.is_some());
    assert!(engine.find_board("#0001")?.is_some());
    assert!(engine.find_board("0002")?.is_none());

    let err = engine.find_board("abcd").unwrap_err();
    assert!(matches!(err, SquaresError::ValidationError { .. }));

    assert_eq!(engine.archive().len(), 1);
    Ok(())
}

#[test]
fn test_export_active_and_archived_boards() -> Result<()> {
    let mut engine = engine();
    let now = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();

    engine.purchase(&PurchaseRequest::new("john", "john@x.com", 100), now)?;
    engine.purchase(
        &PurchaseRequest::new("Amy \"Ace\"", "amy@x.com", 2),
        now + Duration::minutes(5),
    )?;

    let active = engine.export_csv(&ExportSelection::Active, now)?;
    let lines: Vec<&str> = active.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        r#""board","idx","homeDigit","awayDigit","username","email","timestamp""#
    );
    assert!(lines[1].starts_with(r#""Superbowl 2026 • Board #0002","#));
    assert!(lines[1].contains(r#""Amy ""Ace""","#));

    let archived = engine.export_csv(&ExportSelection::Reference("0001".to_string()), now)?;
    assert_eq!(archived.lines().count(), 101);
    assert!(archived
        .lines()
        .nth(1)
        .unwrap()
        .starts_with(r#""Superbowl 2026 • Board #0001","0","0","0","john""#));

    let all = engine.export_csv(&ExportSelection::All, now)?;
    assert_eq!(all.lines().count(), 103);
    Ok(())
}
