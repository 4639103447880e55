pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{CliConfig, Command};
pub use config::Settings;

pub use adapters::{LocalStorage, MemoryStorage};
pub use core::{
    engine::{ExportSelection, PurchaseRequest, Receipt, SquaresEngine},
    lifecycle::{KickoffOutcome, LifecycleRules},
    store::BoardStore,
};
pub use utils::error::{Result, SquaresError};
