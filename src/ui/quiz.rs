use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::session::{Feedback, QuizItem, QuizSession};
use crate::ui::help_line;
use crate::utils::cursor_column;

pub fn draw_quiz(f: &mut Frame, session: &QuizSession, input: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(f.area());

    let (correct, total) = session.score();
    let progress = format!(
        "Question {} / {}   Correct {}",
        session.position() + 1,
        total,
        correct
    );
    let header = Paragraph::new(progress)
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    let Some(item) = session.current() else {
        return;
    };

    let question = Paragraph::new(item.prompt().to_string())
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Question"));
    f.render_widget(question, chunks[1]);

    match item {
        QuizItem::Choice {
            choices,
            answer_index,
            ..
        } => draw_choices(f, chunks[2], choices, *answer_index, session.feedback()),
        _ => draw_answer_box(f, chunks[2], item, input, session.feedback()),
    }

    let help = match session.feedback() {
        Feedback::None => {
            if item.is_choice() {
                help_line(&[("1-9", "Answer"), ("Tab", "Skip"), ("Esc", "Abandon")])
            } else {
                help_line(&[("Enter", "Submit"), ("Tab", "Skip"), ("Esc", "Abandon")])
            }
        }
        Feedback::Correct => help_line(&[("Enter", "Next")]),
        Feedback::Wrong => help_line(&[("Enter", "Next"), ("Esc", "Abandon")]),
    };
    let bar = Paragraph::new(vec![help])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(bar, chunks[3]);
}

fn draw_choices(
    f: &mut Frame,
    area: ratatui::layout::Rect,
    choices: &[String],
    answer_index: usize,
    feedback: Feedback,
) {
    let items: Vec<ListItem> = choices
        .iter()
        .enumerate()
        .map(|(i, choice)| {
            let style = match feedback {
                Feedback::None => Style::default(),
                // after judging, mark the correct row
                _ if i == answer_index => Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
                _ => Style::default().fg(Color::DarkGray),
            };
            ListItem::new(format!("{}. {}", i + 1, choice)).style(style)
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Choices"));
    f.render_widget(list, area);
}

fn draw_answer_box(
    f: &mut Frame,
    area: ratatui::layout::Rect,
    item: &QuizItem,
    input: &str,
    feedback: Feedback,
) {
    match feedback {
        Feedback::None => {
            let content = if input.is_empty() {
                Text::from(Span::styled(
                    "[Type your answer]",
                    Style::default().fg(Color::DarkGray),
                ))
            } else {
                Text::from(input.to_string())
            };
            let answer = Paragraph::new(content)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title("Your Answer"));
            f.render_widget(answer, area);
            let col = cursor_column(input, input.chars().count());
            f.set_cursor_position((area.x + 1 + col, area.y + 1));
        }
        Feedback::Correct => {
            let body = Paragraph::new(Span::styled(
                "Correct!",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ))
            .block(Block::default().borders(Borders::ALL).title("Result"));
            f.render_widget(body, area);
        }
        Feedback::Wrong => {
            let lines = vec![
                Line::from(Span::styled(
                    "Wrong",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(format!("Answer: {}", item.correct_answer_label())),
                Line::from(format!("You wrote: {}", input)),
            ];
            let body = Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title("Result"));
            f.render_widget(body, area);
        }
    }
}
