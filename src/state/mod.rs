//! Application state module

mod forms;
mod progress;

pub use forms::*;
pub use progress::*;
