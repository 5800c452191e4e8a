pub mod emit;
pub mod error;
pub mod journal;
pub mod pnl;
pub mod record;
pub mod report;
pub mod storage;
pub mod symbols;
pub mod types;

pub use error::JournalError;
pub use types::*;

/// Standard result type for all trade-journal operations
pub type JournalResult<T> = Result<T, JournalError>;
