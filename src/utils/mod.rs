pub mod constants;
pub mod literal;
pub mod progress;

pub use constants::*;
pub use literal::parse_literal;
pub use progress::ProgressReporter;
