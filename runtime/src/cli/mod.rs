//! CLI subcommand implementations for the oni-sitemap binary.

pub mod build_cmd;
pub mod output;
pub mod progress;
pub mod status_cmd;
