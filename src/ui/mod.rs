//! UI module for rendering the TUI

mod components;
mod forms;
mod layout;

use crate::app::App;
use crate::flow::FlowPosition;
use ratatui::Frame;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let (sidebar_area, main_area) = layout::create_layout(area);

    layout::draw_sidebar(frame, sidebar_area, app);

    match app.flow.position() {
        FlowPosition::Step(_) => forms::draw_step_form(frame, main_area, app),
        FlowPosition::Submitted => forms::draw_submitted(frame, main_area, app),
    }

    layout::draw_status_bar(frame, app);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::DraftStore;
    use crate::schema::SchemaRegistry;
    use crate::session::{Identity, Role};
    use crate::submission::MockSubmitter;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;
    use std::time::Duration;

    fn app() -> App {
        let flow = crate::flow::RegistrationFlow::start(
            Identity::new("u1", "Jane Doe", Role::Citizen).unwrap(),
            Arc::new(SchemaRegistry::consular_registration().unwrap()),
            DraftStore::in_memory("u1"),
            Duration::ZERO,
        )
        .unwrap();
        App::new(flow, Box::new(MockSubmitter::new()))
    }

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_renders_first_step() {
        let screen = render(&app());
        assert!(screen.contains("Step 1/5"));
        assert!(screen.contains("Last name"));
        assert!(screen.contains("Jane Doe"));
    }

    #[test]
    fn test_renders_field_error() {
        let mut app = app();
        app.flow
            .set_field(crate::state::StepKey::BasicInfo, "birth_date", "1990/01/01")
            .unwrap();
        let screen = render(&app);
        assert!(screen.contains("must be a date in YYYY-MM-DD format"));
    }

    #[test]
    fn test_sidebar_flags_completed_step_broken_by_later_edit() {
        use crate::state::StepKey;

        let mut app = app();
        for (field, value) in [
            ("last_name", "Doe"),
            ("first_name", "Jane"),
            ("birth_date", "1990-01-01"),
            ("birth_place", "Lyon"),
            ("nationality", "French"),
        ] {
            app.flow.set_field(StepKey::BasicInfo, field, value).unwrap();
        }
        app.flow.next().unwrap();
        assert!(render(&app).contains("F1 ✓ Basic information"));

        app.flow.set_field(StepKey::BasicInfo, "last_name", "").unwrap();
        assert!(render(&app).contains("F1 ! Basic information"));
    }
}
