pub mod args;
pub mod commands;
pub mod logging;

pub use args::{Cli, Commands, OutputFormat};
pub use commands::run;
