use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::ui::help_line;

pub fn draw_setup(
    f: &mut Frame,
    source_name: &str,
    count_input: &str,
    randomize: bool,
    status: Option<&str>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(f.area());

    let title = Paragraph::new(format!("Quiz Setup - {}", source_name))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    let count_label = if count_input.is_empty() {
        "10 (default)".to_string()
    } else {
        count_input.to_string()
    };
    let count = Paragraph::new(count_label)
        .block(Block::default().borders(Borders::ALL).title("Questions"));
    f.render_widget(count, chunks[1]);

    let randomize_label = if randomize { "On" } else { "Off" };
    let shuffle = Paragraph::new(randomize_label)
        .style(Style::default().fg(if randomize {
            Color::Green
        } else {
            Color::DarkGray
        }))
        .block(Block::default().borders(Borders::ALL).title("Shuffle"));
    f.render_widget(shuffle, chunks[2]);

    let mut lines = vec![help_line(&[
        ("0-9", "Count"),
        ("r", "Toggle Shuffle"),
        ("Enter", "Start"),
        ("Esc", "Back"),
    ])];
    if let Some(status) = status {
        lines.push(Line::from(status.to_string()).style(Style::default().fg(Color::Yellow)));
    }
    let help = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[4]);
}
