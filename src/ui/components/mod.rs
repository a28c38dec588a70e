//! Reusable UI components

mod button;

pub use button::{render_step_button, StepMarker, BUTTON_HEIGHT};
