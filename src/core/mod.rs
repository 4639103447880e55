pub mod assignment;
pub mod engine;
pub mod export;
pub mod lifecycle;
pub mod query;
pub mod store;
pub mod view;

pub use crate::domain::model::{AppState, Board, BoardStatus, Entry, Square};
pub use crate::domain::ports::{SettingsProvider, Storage};
pub use crate::utils::error::Result;
