//! Button component for TUI

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Button height in rows (top border + content + bottom border)
pub const BUTTON_HEIGHT: u16 = 3;

/// How a step is shown in the sidebar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMarker {
    Current,
    Completed,
    /// Completed earlier, but later edits broke it
    NeedsReview,
    Available,
    Locked,
}

impl StepMarker {
    fn glyph(&self) -> &'static str {
        match self {
            StepMarker::Current => "▶",
            StepMarker::Completed => "✓",
            StepMarker::NeedsReview => "!",
            StepMarker::Available => "·",
            StepMarker::Locked => "×",
        }
    }
}

/// Render a generic button with border
fn render_button(frame: &mut Frame, area: Rect, content: &str, marker: StepMarker) {
    let border_style = match marker {
        StepMarker::Current => Style::default().fg(Color::Cyan),
        _ => Style::default().fg(Color::DarkGray),
    };

    let text_style = match marker {
        StepMarker::Current => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        StepMarker::Completed => Style::default().fg(Color::Green),
        StepMarker::NeedsReview => Style::default().fg(Color::Yellow),
        StepMarker::Available => Style::default(),
        StepMarker::Locked => Style::default().fg(Color::DarkGray),
    };

    let paragraph = Paragraph::new(format!(" {content} ")).style(text_style);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);

    frame.render_widget(paragraph.block(block), area);
}

/// Render a sidebar step button with function key, marker and label
pub fn render_step_button(frame: &mut Frame, area: Rect, key: &str, label: &str, marker: StepMarker) {
    let content = format!("{key} {} {label}", marker.glyph());
    render_button(frame, area, &content, marker);
}
