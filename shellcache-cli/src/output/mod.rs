//! Output formatting for CLI.

mod json;
mod text;

pub use json::{FetchOutput, JsonFormatter, StoreOutput, classify_to_output};
pub use text::TextFormatter;
