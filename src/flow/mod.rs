//! The registration flow: step sequencing, live validation and
//! persistence wired together behind one owner.

mod binding;
mod controller;
mod write_behind;

pub use binding::*;
pub use controller::*;
