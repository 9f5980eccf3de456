mod output;

pub use output::{redact, Output};
