//! Step form and confirmation screens

mod field_renderer;

use crate::app::App;
use field_renderer::{draw_field, FIELD_HEIGHT};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Draw the fields of the current step
pub fn draw_step_form(frame: &mut Frame, area: Rect, app: &App) {
    let step = app.flow.current_step();
    let controller = app.flow.controller();
    let title = app
        .flow
        .registry()
        .definition(step)
        .map_or(step.as_str(), |definition| definition.label);

    let block = Block::default()
        .title(format!(
            " Step {}/{}: {title} ",
            controller.current_index() + 1,
            controller.step_count()
        ))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let fields = app.current_fields();
    let mut constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(FIELD_HEIGHT))
        .collect();
    constraints.push(Constraint::Min(0));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (idx, spec) in fields.iter().enumerate() {
        let error = app
            .flow
            .get_field_error(step, spec.name)
            .and_then(|errors| errors.first())
            .map(String::as_str);
        draw_field(
            frame,
            chunks[idx],
            spec,
            app.flow.value(step, spec.name),
            error,
            idx == app.active_field,
        );
    }
}

/// Draw the confirmation shown once the application is accepted
pub fn draw_submitted(frame: &mut Frame, area: Rect, app: &App) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Registration submitted",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    if let Some(receipt) = &app.receipt {
        lines.push(Line::from(format!("Reference: {}", receipt.reference)));
        lines.push(Line::from(format!(
            "Received:  {}",
            receipt.received_at.format("%Y-%m-%d %H:%M UTC")
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Quote the reference when contacting the consulate.",
        Style::default().fg(Color::DarkGray),
    )));

    let block = Block::default().title(" Done ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
