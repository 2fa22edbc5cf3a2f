use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::ui::help_line;
use crate::utils::{cursor_column, truncate_to_width};

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Shared list screen used by groups, words, wrongs, problem sets and
/// problem items. Browsing only differs in the rows and the help bar.
pub fn draw_list_screen(
    f: &mut Frame,
    title: &str,
    rows: &[String],
    selected: usize,
    help: &[(&str, &str)],
    status: Option<&str>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(f.area());

    let header = Paragraph::new(title.to_string())
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    let width = chunks[1].width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = if rows.is_empty() {
        vec![ListItem::new("Nothing here yet").style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )]
    } else {
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                let style = if i == selected {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(truncate_to_width(row, width)).style(style)
            })
            .collect()
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_widget(list, chunks[1]);

    let mut lines = vec![help_line(help)];
    if let Some(status) = status {
        lines.push(Line::from(status.to_string()).style(Style::default().fg(Color::Yellow)));
    }
    let bar = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(bar, chunks[2]);
}

/// Single-line input popup. The terminal cursor is placed after the typed
/// text so wide glyphs line up.
pub fn draw_prompt(f: &mut Frame, title: &str, input: &str) {
    let area = centered_rect(60, 3, f.area());
    f.render_widget(Clear, area);

    let prompt = Paragraph::new(input.to_string())
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    f.render_widget(prompt, area);

    let col = cursor_column(input, input.chars().count());
    f.set_cursor_position((area.x + 1 + col, area.y + 1));
}

/// Read-only popup for export payloads; the user copies the JSON out of
/// the terminal.
pub fn draw_viewer(f: &mut Frame, title: &str, text: &str) {
    let outer = f.area();
    let area = centered_rect(
        outer.width.saturating_sub(8).max(20),
        outer.height.saturating_sub(6).max(5),
        outer,
    );
    f.render_widget(Clear, area);

    let body = Paragraph::new(text.to_string())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} (Esc to close)", title)),
        );
    f.render_widget(body, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fits_inside() {
        let outer = Rect {
            x: 0,
            y: 0,
            width: 80,
            height: 24,
        };
        let inner = centered_rect(60, 3, outer);
        assert_eq!(inner.width, 60);
        assert_eq!(inner.height, 3);
        assert!(inner.x + inner.width <= outer.width);
        assert!(inner.y + inner.height <= outer.height);
    }

    #[test]
    fn test_centered_rect_clamps_to_small_terminal() {
        let outer = Rect {
            x: 0,
            y: 0,
            width: 20,
            height: 5,
        };
        let inner = centered_rect(60, 10, outer);
        assert_eq!(inner.width, 20);
        assert_eq!(inner.height, 5);
    }
}
