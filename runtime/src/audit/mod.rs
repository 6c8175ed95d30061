//! Run ledger.

pub mod logger;
