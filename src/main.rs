use std::io;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};

use wordquiz::app::{App, Screen, RECENT_LIMIT};
use wordquiz::store::Store;
use wordquiz::sync::SyncClient;
use wordquiz::{logger, ui};

// Poll with a short timeout so the quiz's delayed advance fires without
// a keypress.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

fn main() -> io::Result<()> {
    logger::init();

    let store = Store::open_default();
    let mut app = App::new(store, SyncClient::from_env());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    while !app.should_quit {
        terminal.draw(|f| draw(f, &app))?;

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key, Instant::now());
            }
        }
        app.tick(Instant::now());
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}

fn draw(f: &mut Frame, app: &App) {
    match app.screen {
        Screen::Menu => {
            let selected = app.selected.min(RECENT_LIMIT.saturating_sub(1));
            ui::draw_menu(
                f,
                app.recent_groups(),
                app.recent_sets(),
                selected,
                app.menu_panel,
                app.sync_enabled(),
                app.status.as_deref(),
            );
        }
        Screen::Groups
        | Screen::Words
        | Screen::Wrongs
        | Screen::ProblemSets
        | Screen::ProblemItems => {
            ui::draw_list_screen(
                f,
                &app.list_title(),
                &app.list_rows(),
                app.selected,
                &app.list_help(),
                app.status.as_deref(),
            );
        }
        Screen::Setup => {
            let (source_name, count_input, randomize) = app.setup_view();
            ui::draw_setup(f, source_name, count_input, randomize, app.status.as_deref());
        }
        Screen::Quiz => {
            if let Some(session) = app.session() {
                ui::draw_quiz(f, session, &app.quiz_input);
            }
        }
        Screen::Summary => {
            if let Some(session) = app.session() {
                let (correct, total) = session.score();
                ui::draw_summary(f, app.summary_source_name(), correct, total);
            }
        }
    }

    if let Some(title) = app.prompt_title() {
        ui::draw_prompt(f, title, &app.input);
    }
    if let Some((title, text)) = &app.viewer {
        ui::draw_viewer(f, title, text);
    }
}
