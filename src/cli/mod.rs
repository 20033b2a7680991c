pub mod args;
pub mod runner;

pub use args::Args;
