mod browse;
mod menu;
mod quiz;
mod setup;
mod summary;

pub use browse::{draw_list_screen, draw_prompt, draw_viewer};
pub use menu::draw_menu;
pub use quiz::draw_quiz;
pub use setup::draw_setup;
pub use summary::draw_summary;

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// One "key - action" help bar line, keys highlighted like the rest of the
/// interface.
pub(crate) fn help_line(entries: &[(&str, &str)]) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, (key, action)) in entries.iter().enumerate() {
        spans.push(Span::styled(
            key.to_string(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));
        let sep = if i + 1 == entries.len() { " " } else { "  " };
        spans.push(Span::from(format!(" {}{}", action, sep)));
    }
    Line::from(spans)
}
