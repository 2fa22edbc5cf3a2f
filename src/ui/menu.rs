use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::models::{Group, ProblemSet};
use crate::ui::help_line;
use crate::utils::truncate_to_width;

/// Human label for a `lastUsed` millis stamp.
fn format_last_used(last_used: Option<i64>) -> String {
    let Some(millis) = last_used else {
        return "never".to_string();
    };
    let Some(datetime) = chrono::DateTime::from_timestamp_millis(millis) else {
        return "never".to_string();
    };
    let datetime = datetime.with_timezone(&chrono::Local);

    let today = chrono::Local::now().date_naive();
    let date = datetime.date_naive();
    if date == today {
        format!("Today {}", datetime.format("%H:%M"))
    } else if date == today - chrono::Duration::days(1) {
        format!("Yesterday {}", datetime.format("%H:%M"))
    } else {
        date.format("%Y-%m-%d").to_string()
    }
}

fn draw_panel_header(area: Rect, title: &str, focused: bool, f: &mut Frame) {
    let style = if focused {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let header = Paragraph::new(title)
        .style(style)
        .alignment(Alignment::Left);
    f.render_widget(header, area);
}

fn recency_panel(
    f: &mut Frame,
    area: Rect,
    header: &str,
    rows: Vec<(String, Option<i64>)>,
    selected: usize,
    focused: bool,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    draw_panel_header(chunks[0], header, focused, f);

    let width = area.width.saturating_sub(16) as usize;
    let items: Vec<ListItem> = if rows.is_empty() {
        vec![ListItem::new("Nothing here yet").style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )]
    } else {
        rows.iter()
            .enumerate()
            .map(|(i, (name, last_used))| {
                let text = format!(
                    "{} ({})",
                    truncate_to_width(name, width),
                    format_last_used(*last_used)
                );
                let style = if i == selected && focused {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(text).style(style)
            })
            .collect()
    };

    let list = List::new(items).block(Block::default().borders(Borders::ALL).border_style(
        if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        },
    ));
    f.render_widget(list, chunks[1]);
}

pub fn draw_menu(
    f: &mut Frame,
    recent_groups: &[Group],
    recent_sets: &[ProblemSet],
    selected: usize,
    focused_panel: usize,
    sync_enabled: bool,
    status: Option<&str>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(f.area());

    let title = Paragraph::new("wordquiz")
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    let group_rows = recent_groups
        .iter()
        .map(|g| (g.name.clone(), g.last_used))
        .collect();
    recency_panel(
        f,
        chunks[1],
        "[1] Recent Groups",
        group_rows,
        selected,
        focused_panel == 0,
    );

    let set_rows = recent_sets
        .iter()
        .map(|ps| (ps.name.clone(), ps.last_used))
        .collect();
    recency_panel(
        f,
        chunks[2],
        "[2] Recent Problem Sets",
        set_rows,
        selected,
        focused_panel == 1,
    );

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(chunks[3]);

    let sync_lines = if sync_enabled {
        vec![Line::from("Sync: Enabled"), Line::from("u Push  d Pull")]
    } else {
        vec![
            Line::from("Sync: Disabled"),
            Line::from("Set WORDQUIZ_SYNC_URL"),
        ]
    };
    let sync_status = Paragraph::new(sync_lines)
        .style(Style::default().fg(if sync_enabled {
            Color::Green
        } else {
            Color::Yellow
        }))
        .block(Block::default().borders(Borders::ALL).title("Sync"));
    f.render_widget(sync_status, bottom[0]);

    let mut help = vec![help_line(&[
        ("1/2", "Focus Panel"),
        ("↑/↓", "Navigate"),
        ("Enter", "Quiz"),
        ("g", "Groups"),
        ("p", "Sets"),
        ("w", "Wrongs"),
        ("q", "Quit"),
    ])];
    if let Some(status) = status {
        help.push(Line::from(status.to_string()).style(Style::default().fg(Color::Yellow)));
    }
    let help = Paragraph::new(help)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, bottom[1]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_last_used_never() {
        assert_eq!(format_last_used(None), "never");
    }

    #[test]
    fn test_format_last_used_today() {
        let now = chrono::Local::now().timestamp_millis();
        assert!(format_last_used(Some(now)).starts_with("Today "));
    }

    #[test]
    fn test_format_last_used_old_date() {
        // 2020-06-01 00:00:00 UTC
        let label = format_last_used(Some(1_590_969_600_000));
        assert!(label.starts_with("2020-"));
    }
}
