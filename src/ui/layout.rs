//! Layout components (step sidebar, status bar)

use super::components::{render_step_button, StepMarker, BUTTON_HEIGHT};
use crate::app::App;
use crate::flow::{FlowPosition, NoticeKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Sidebar width in columns
const SIDEBAR_WIDTH: u16 = 28;

/// Create the main layout with sidebar
pub fn create_layout(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(SIDEBAR_WIDTH), // Sidebar
            Constraint::Min(0),                // Main content
        ])
        .split(area);

    // Reserve bottom lines for notice and status bar
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Content
            Constraint::Length(2), // Notice + status bar
        ])
        .split(chunks[1]);

    let sidebar_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Sidebar content
            Constraint::Length(2), // Status bar continuation
        ])
        .split(chunks[0]);

    (sidebar_chunks[0], main_chunks[0])
}

/// Draw the sidebar with one boxed button per step
pub fn draw_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let controller = app.flow.controller();
    let definitions = app.flow.registry().definitions();

    let mut constraints = vec![Constraint::Min(0)];
    constraints.extend(definitions.iter().map(|_| Constraint::Length(BUTTON_HEIGHT)));
    constraints.push(Constraint::Min(0));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let position = controller.position();
    let max_reachable = controller.max_reachable();
    for (idx, definition) in definitions.iter().enumerate() {
        let marker = if position == FlowPosition::Step(idx) {
            StepMarker::Current
        } else if controller.is_completed(definition.key) {
            if app.flow.is_step_valid(definition.key).unwrap_or(false) {
                StepMarker::Completed
            } else {
                StepMarker::NeedsReview
            }
        } else if idx <= max_reachable && position != FlowPosition::Submitted {
            StepMarker::Available
        } else {
            StepMarker::Locked
        };
        render_step_button(
            frame,
            chunks[idx + 1],
            &format!("F{}", idx + 1),
            definition.label,
            marker,
        );
    }
}

/// Draw the notice line and the status bar
pub fn draw_status_bar(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Notice line above the status bar
    if let Some(notice) = app.flow.notice() {
        let color = match notice.kind {
            NoticeKind::Success => Color::Green,
            NoticeKind::Error => Color::Red,
        };
        let notice_area = Rect {
            x: 0,
            y: area.height.saturating_sub(2),
            width: area.width,
            height: 1,
        };
        let mut spans = vec![Span::styled(
            format!(" {}", notice.message),
            Style::default().fg(color),
        )];
        if notice.retryable {
            spans.push(Span::styled(
                "  Enter:retry  Esc:dismiss",
                Style::default().fg(Color::Gray),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), notice_area);
    }

    let status_area = Rect {
        x: 0,
        y: area.height.saturating_sub(1),
        width: area.width,
        height: 1,
    };

    let mut spans = vec![];

    // Unsaved edits indicator
    let storage = if app.flow.has_unsaved_changes() {
        Span::styled(" ◐ ", Style::default().fg(Color::Yellow))
    } else {
        Span::styled(" ● ", Style::default().fg(Color::Green))
    };
    spans.push(storage);

    spans.push(Span::styled(
        hints(app.flow.position()),
        Style::default().fg(Color::Gray),
    ));

    if let Some(msg) = &app.status_message {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(msg, Style::default().fg(Color::Yellow)));
    }

    spans.push(Span::raw(" | "));
    spans.push(Span::styled(
        app.flow.identity().display_name(),
        Style::default().fg(Color::Blue),
    ));

    let status = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status, status_area);
}

/// Keyboard hints for the current position
fn hints(position: FlowPosition) -> &'static str {
    match position {
        FlowPosition::Step(_) => "Tab:next field  Enter:continue  Esc:back  F1-F5:step  ^S:save  ^C:quit",
        FlowPosition::Submitted => "q:quit",
    }
}
