//! CLI command implementations.

pub mod args;
pub mod output;

pub mod backlinks;
pub mod generate;
pub mod graph;
pub mod query;
pub mod render;
pub mod resolve;
pub mod view;

pub use args::{Cli, Commands};
pub use output::Output;
