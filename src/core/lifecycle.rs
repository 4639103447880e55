use crate::domain::model::{Board, BoardStatus};
use crate::domain::ports::SettingsProvider;
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KickoffOutcome {
    /// The board has no kickoff time.
    NoKickoff,
    TooEarly { cutoff: DateTime<Utc> },
    NotOpen { status: BoardStatus },
    SoldOut,
    Voided { refunded: usize },
}

impl KickoffOutcome {
    /// The caller has to open a fresh active board after these outcomes.
    pub fn closed_board(&self) -> bool {
        matches!(self, KickoffOutcome::SoldOut | KickoffOutcome::Voided { .. })
    }
}

/// Status transitions: open → soldout when full, open → void when short at the cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleRules {
    cutoff: Duration,
}

impl Default for LifecycleRules {
    fn default() -> Self {
        Self {
            cutoff: Duration::hours(1),
        }
    }
}

impl LifecycleRules {
    pub fn new(cutoff: Duration) -> Self {
        Self { cutoff }
    }

    pub fn from_settings<C: SettingsProvider>(settings: &C) -> Self {
        Self::new(settings.kickoff_cutoff())
    }

    pub fn cutoff_for(&self, kickoff_at: DateTime<Utc>) -> DateTime<Utc> {
        kickoff_at - self.cutoff
    }

    /// Entries stop at the cutoff, even before a kickoff check has closed the board.
    pub fn accepts_entries(&self, board: &Board, now: DateTime<Utc>) -> bool {
        board.is_open()
            && board
                .kickoff_at
                .map_or(true, |kickoff_at| now < self.cutoff_for(kickoff_at))
    }

    /// Returns true only on the call that performed the transition.
    pub fn mark_sold_out_if_full(&self, board: &mut Board) -> bool {
        if board.is_open() && board.is_full() && board.close(BoardStatus::SoldOut) {
            tracing::info!("🎉 {} is sold out", board.reference);
            return true;
        }
        false
    }

    pub fn run_kickoff_check(&self, board: &mut Board, now: DateTime<Utc>) -> KickoffOutcome {
        let Some(kickoff_at) = board.kickoff_at else {
            return KickoffOutcome::NoKickoff;
        };

        let cutoff = self.cutoff_for(kickoff_at);
        if now < cutoff {
            tracing::debug!("Kickoff check for {} is too early", board.reference);
            return KickoffOutcome::TooEarly { cutoff };
        }

        if !board.is_open() {
            return KickoffOutcome::NotOpen {
                status: board.status(),
            };
        }

        if board.is_full() {
            board.close(BoardStatus::SoldOut);
            tracing::info!("🎉 {} is full at the kickoff cutoff", board.reference);
            return KickoffOutcome::SoldOut;
        }

        let refunds: Vec<_> = std::mem::take(&mut board.sold).into_values().collect();
        let refunded = refunds.len();
        board.refunds.extend(refunds);
        board.close(BoardStatus::Void);

        tracing::info!(
            "🚫 {} voided at the kickoff cutoff, {} entr(ies) marked for refund",
            board.reference,
            refunded
        );
        KickoffOutcome::Voided { refunded }
    }
}
