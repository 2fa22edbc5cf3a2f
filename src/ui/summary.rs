use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::ui::help_line;

pub fn draw_summary(f: &mut Frame, source_name: &str, correct: usize, total: usize) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(f.area());

    let title = Paragraph::new(format!("Quiz Finished - {}", source_name))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    let color = if total > 0 && correct == total {
        Color::Green
    } else {
        Color::Yellow
    };
    let score = Paragraph::new(vec![
        Line::from(""),
        Line::from(format!("{} / {}", correct, total)).style(
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title("Score"));
    f.render_widget(score, chunks[1]);

    let help = Paragraph::new(vec![help_line(&[
        ("r", "Retry Same Questions"),
        ("m", "Menu"),
        ("q", "Quit"),
    ])])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[2]);
}
