//! Subcommand implementations.

pub mod backtranslate;
pub mod compare;
mod corpus;
pub mod evaluate;
pub mod filter;
pub mod predict;
pub mod stats;
pub mod train;
pub mod translate;
