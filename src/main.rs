use chrono::Utc;
use clap::Parser;
use scoreline_squares::config::cli::KickoffCommand;
use scoreline_squares::config::toml_config::parse_kickoff;
use scoreline_squares::core::export::DEFAULT_EXPORT_FILENAME;
use scoreline_squares::core::query::pad_reference_number;
use scoreline_squares::domain::model::{Board, Square};
use scoreline_squares::utils::error::ErrorSeverity;
use scoreline_squares::utils::logger;
use scoreline_squares::{
    CliConfig, Command, ExportSelection, KickoffOutcome, LocalStorage, PurchaseRequest,
    SquaresEngine, SquaresError,
};

type Engine = SquaresEngine<LocalStorage>;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    let file_config = match cli.file_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if cli.json_logs(&file_config) {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::debug!("CLI config: {:?}", cli);

    let settings = match cli.settings_from(&file_config) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    tracing::debug!("Using data directory {}", settings.data_dir);

    let storage = LocalStorage::new(settings.data_dir.clone());
    let mut engine = SquaresEngine::new(storage, &settings);

    if let Err(e) = run(&mut engine, &cli.command) {
        tracing::debug!(
            "Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );

        // 找不到結果只是提示訊息，不算失敗
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };

        if exit_code == 0 {
            println!("ℹ️ {}", e.user_friendly_message());
        } else {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn run(engine: &mut Engine, command: &Command) -> scoreline_squares::Result<()> {
    let now = Utc::now();

    match command {
        Command::Buy {
            username,
            email,
            quantity,
        } => {
            let request = PurchaseRequest::from_form(username, email, quantity)?;
            let receipt = engine.purchase(&request, now)?;
            println!("✅ {}", receipt);
            print_rotation(engine, receipt.sold_out, receipt.remaining, now)?;
        }
        Command::Pick {
            username,
            email,
            squares,
        } => {
            let squares = parse_squares(squares)?;
            let receipt = engine.purchase_selected(username, email, &squares, now)?;
            println!("✅ {}", receipt);
            print_rotation(engine, receipt.sold_out, receipt.remaining, now)?;
        }
        Command::Grid { select, show } => {
            let selected = parse_squares(select)?;
            let view = engine.grid(&selected, now)?;
            println!("{}", view);
            println!("Sold: {}", view.sold_count());

            if let Some(raw) = show {
                let square = parse_square(raw)?;
                match view.buyer_at(square) {
                    Some(username) => println!("{}: Buyer {}", square, username),
                    None => println!("{}: available", square),
                }
            }
        }
        Command::Export { board, all, output } => {
            let selection = match (board, all) {
                (_, true) => ExportSelection::All,
                (Some(number), false) => ExportSelection::Reference(number.clone()),
                (None, false) => ExportSelection::Active,
            };
            let csv = engine.export_csv(&selection, now)?;

            match output {
                Some(path) => {
                    let path = if std::path::Path::new(path).is_dir() {
                        std::path::Path::new(path).join(DEFAULT_EXPORT_FILENAME)
                    } else {
                        std::path::PathBuf::from(path)
                    };
                    std::fs::write(&path, csv)?;
                    println!("📁 Export saved to: {}", path.display());
                }
                None => print!("{}", csv),
            }
        }
        Command::Archive { all, refunds } => {
            if *refunds {
                let owed = engine.refunds_due();
                if owed.is_empty() {
                    return Err(SquaresError::NotFound {
                        what: "Refund".to_string(),
                        query: "(none owed)".to_string(),
                    });
                }
                for board in owed {
                    print_board_line(board);
                    for entry in board.refunds() {
                        println!(
                            "  💸 {} <{}> bought {}",
                            entry.username,
                            entry.email,
                            entry.timestamp.to_rfc3339()
                        );
                    }
                }
                return Ok(());
            }

            let boards: Vec<&Board> = if *all {
                engine.boards().iter().collect()
            } else {
                engine.archive()
            };

            if boards.is_empty() {
                return Err(SquaresError::NotFound {
                    what: "Archived board".to_string(),
                    query: "(none yet)".to_string(),
                });
            }
            for board in boards {
                print_board_line(board);
            }
        }
        Command::FindBoard { number } => match engine.find_board(number)? {
            Some(board) => {
                print_board_line(board);
                for (square, entry) in board.sold() {
                    println!("  {:<6} {} <{}>", square.to_string(), entry.username, entry.email);
                }
            }
            None => {
                let padded = number
                    .trim()
                    .trim_start_matches('#')
                    .parse::<u32>()
                    .map(pad_reference_number)
                    .unwrap_or_else(|_| number.clone());
                return Err(SquaresError::NotFound {
                    what: "Sold-out board".to_string(),
                    query: format!("#{}", padded),
                });
            }
        },
        Command::Search { query } => {
            let matches = engine.search(query)?;
            if matches.is_empty() {
                return Err(SquaresError::NotFound {
                    what: "Squares".to_string(),
                    query: query.clone(),
                });
            }
            for found in matches {
                let squares: Vec<String> = found.squares.iter().map(|s| s.to_string()).collect();
                println!(
                    "{} [{}]: {}",
                    found.board.reference,
                    found.board.status(),
                    squares.join(", ")
                );
            }
        }
        Command::Kickoff { action } => match action {
            KickoffCommand::Set { at } => {
                let kickoff_at = parse_kickoff("at", at)?;
                let board = engine.set_kickoff(kickoff_at, now)?;
                println!("⏰ Kickoff for {} set to {}", board.reference, kickoff_at.to_rfc3339());
            }
            KickoffCommand::Check { now: at } => {
                let at = match at {
                    Some(raw) => parse_kickoff("now", raw)?,
                    None => now,
                };
                let report = engine.run_kickoff_check(at)?;
                match report.outcome {
                    KickoffOutcome::NoKickoff => {
                        println!("ℹ️ {} has no kickoff time set", report.reference)
                    }
                    KickoffOutcome::TooEarly { cutoff } => println!(
                        "⏳ Too early: {} is checked from {}",
                        report.reference,
                        cutoff.to_rfc3339()
                    ),
                    KickoffOutcome::NotOpen { status } => {
                        println!("ℹ️ {} is already {}", report.reference, status)
                    }
                    KickoffOutcome::SoldOut => {
                        println!("🎉 {} is full and valid", report.reference)
                    }
                    KickoffOutcome::Voided { refunded } => println!(
                        "🚫 {} was not full at the cutoff and is void; {} entr(ies) marked for refund",
                        report.reference, refunded
                    ),
                }
                if report.new_board_id.is_some() {
                    let active = engine.active_board(at)?;
                    println!("📋 New board opened: {}", active.reference);
                }
            }
        },
        Command::Reset { yes } => {
            if !yes {
                return Err(SquaresError::validation(
                    "Reset deletes every board. Pass --yes to confirm.",
                ));
            }
            engine.reset()?;
            println!("🧹 Game reset (local data only).");
        }
    }

    Ok(())
}

fn print_rotation(
    engine: &mut Engine,
    sold_out: bool,
    remaining: usize,
    now: chrono::DateTime<Utc>,
) -> scoreline_squares::Result<()> {
    if sold_out {
        let active = engine.active_board(now)?;
        println!("🎉 Board sold out! New board opened: {}", active.reference);
    } else {
        println!("Remaining: {}", remaining);
    }
    Ok(())
}

fn print_board_line(board: &Board) {
    println!(
        "{} [{}] sold {}/100, refunds {}, created {}",
        board.reference,
        board.status(),
        board.sold_count(),
        board.refunds().len(),
        board.created_at.to_rfc3339()
    );
}

fn parse_square(raw: &str) -> scoreline_squares::Result<Square> {
    raw.parse::<Square>().map_err(SquaresError::validation)
}

fn parse_squares(raw: &[String]) -> scoreline_squares::Result<Vec<Square>> {
    raw.iter().map(|s| parse_square(s)).collect()
}
