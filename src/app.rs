use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent};

use crate::models::{
    ChoiceItem, FreeItem, Group, PendingKind, ProblemItem, ProblemSet, Word,
};
use crate::session::{Feedback, QuizItem, QuizSession, Verdict};
use crate::share::{GroupPayload, ProblemSetPayload};
use crate::store::Store;
use crate::sync::{SyncClient, GROUPS_COLLECTION, PROBLEM_SETS_COLLECTION};
use crate::utils::truncate_to_width;

pub const RECENT_LIMIT: usize = 5;
const DEFAULT_QUESTION_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Screen {
    Menu,
    Groups,
    Words,
    Wrongs,
    ProblemSets,
    ProblemItems,
    Setup,
    Quiz,
    Summary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuizSource {
    Group(String),
    ProblemSet(String),
    Wrongs,
}

/// Multi-step input modal. Steps that need earlier answers carry them
/// along; `slot` is Some when editing an existing problem item.
#[derive(Debug, Clone, PartialEq)]
enum Prompt {
    AddGroup,
    ImportGroup,
    DownloadGroup,
    AddWordTerm,
    AddWordMeaning { word: String },
    AddSet,
    ImportProblemSet,
    DownloadProblemSet,
    ItemQuestion { slot: Option<usize> },
    ItemAnswer { slot: Option<usize>, question: String },
    ChoiceQuestion { slot: Option<usize> },
    ChoiceOptions { slot: Option<usize>, question: String },
    ChoiceAnswer {
        slot: Option<usize>,
        question: String,
        choices: Vec<String>,
    },
}

impl Prompt {
    fn title(&self) -> &'static str {
        match self {
            Prompt::AddGroup => "New group name",
            Prompt::ImportGroup => "Paste group JSON",
            Prompt::DownloadGroup => "Shared group id",
            Prompt::AddWordTerm => "Word",
            Prompt::AddWordMeaning { .. } => "Meaning",
            Prompt::AddSet => "New problem set name",
            Prompt::ImportProblemSet => "Paste problem set JSON",
            Prompt::DownloadProblemSet => "Shared problem set id",
            Prompt::ItemQuestion { .. } => "Question",
            Prompt::ItemAnswer { .. } => "Answer",
            Prompt::ChoiceQuestion { .. } => "Choice question",
            Prompt::ChoiceOptions { .. } => "Choices (separate with |)",
            Prompt::ChoiceAnswer { .. } => "Correct choice number",
        }
    }
}

#[derive(Debug, Default)]
struct SetupState {
    source: Option<QuizSource>,
    source_name: String,
    count_input: String,
    randomize: bool,
}

pub struct App {
    store: Store,
    sync: Option<SyncClient>,
    pub screen: Screen,
    pub should_quit: bool,

    recent_groups: Vec<Group>,
    recent_sets: Vec<ProblemSet>,
    groups: Vec<Group>,
    words: Vec<Word>,
    wrongs: Vec<Word>,
    problem_sets: Vec<ProblemSet>,
    items: Vec<ProblemItem>,

    pub selected: usize,
    pub menu_panel: usize,
    current_group: Option<String>,
    current_set: Option<String>,

    prompt: Option<Prompt>,
    pub input: String,
    pub viewer: Option<(String, String)>,
    pub status: Option<String>,

    setup: SetupState,
    session: Option<QuizSession>,
    pub quiz_input: String,
}

impl App {
    pub fn new(store: Store, sync: Option<SyncClient>) -> Self {
        let mut app = App {
            store,
            sync,
            screen: Screen::Menu,
            should_quit: false,
            recent_groups: Vec::new(),
            recent_sets: Vec::new(),
            groups: Vec::new(),
            words: Vec::new(),
            wrongs: Vec::new(),
            problem_sets: Vec::new(),
            items: Vec::new(),
            selected: 0,
            menu_panel: 0,
            current_group: None,
            current_set: None,
            prompt: None,
            input: String::new(),
            viewer: None,
            status: None,
            setup: SetupState::default(),
            session: None,
            quiz_input: String::new(),
        };
        app.refresh();
        app
    }

    pub fn sync_enabled(&self) -> bool {
        self.sync.is_some()
    }

    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    pub fn recent_groups(&self) -> &[Group] {
        &self.recent_groups
    }

    pub fn recent_sets(&self) -> &[ProblemSet] {
        &self.recent_sets
    }

    pub fn prompt_title(&self) -> Option<&'static str> {
        self.prompt.as_ref().map(Prompt::title)
    }

    pub fn setup_view(&self) -> (&str, &str, bool) {
        (
            &self.setup.source_name,
            &self.setup.count_input,
            self.setup.randomize,
        )
    }

    pub fn summary_source_name(&self) -> &str {
        &self.setup.source_name
    }

    /// Reload the cached lists for the current screen from the store.
    fn refresh(&mut self) {
        self.recent_groups = self.store.recent_groups(RECENT_LIMIT);
        self.recent_sets = self.store.recent_problem_sets(RECENT_LIMIT);
        self.groups = self.store.groups();
        self.problem_sets = self.store.problem_sets();
        self.wrongs = self.store.wrong_words();
        if let Some(group_id) = &self.current_group {
            self.words = self.store.words_by_group(group_id);
        }
        if let Some(set_id) = &self.current_set {
            self.items = self.store.problem_set_items(set_id);
        }
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let len = self.current_list_len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    fn current_list_len(&self) -> usize {
        match self.screen {
            Screen::Menu => {
                if self.menu_panel == 0 {
                    self.recent_groups.len()
                } else {
                    self.recent_sets.len()
                }
            }
            Screen::Groups => self.groups.len(),
            Screen::Words => self.words.len(),
            Screen::Wrongs => self.wrongs.len(),
            Screen::ProblemSets => self.problem_sets.len(),
            Screen::ProblemItems => self.items.len(),
            _ => 0,
        }
    }

    pub fn list_rows(&self) -> Vec<String> {
        match self.screen {
            Screen::Groups => self
                .groups
                .iter()
                .map(|g| {
                    let count = self.store.words_by_group(&g.id).len();
                    format!("{} ({} words)", g.name, count)
                })
                .collect(),
            Screen::Words => self
                .words
                .iter()
                .map(|w| format!("{} - {}", w.word, w.meaning))
                .collect(),
            Screen::Wrongs => self
                .wrongs
                .iter()
                .map(|w| format!("{} - {}", w.word, w.meaning))
                .collect(),
            Screen::ProblemSets => self
                .problem_sets
                .iter()
                .map(|ps| format!("{} ({} items)", ps.name, ps.items.len()))
                .collect(),
            Screen::ProblemItems => self
                .items
                .iter()
                .map(|item| match item {
                    ProblemItem::Choice(it) => {
                        format!("[choice] {} ({} options)", it.question, it.choices.len())
                    }
                    ProblemItem::Free(it) => format!("{} - {}", it.question, it.answer),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn list_title(&self) -> String {
        match self.screen {
            Screen::Groups => "Groups".to_string(),
            Screen::Words => {
                let name = self
                    .current_group
                    .as_ref()
                    .and_then(|id| self.groups.iter().find(|g| &g.id == id))
                    .map(|g| g.name.as_str())
                    .unwrap_or("?");
                format!("Words - {}", name)
            }
            Screen::Wrongs => "Wrong Words".to_string(),
            Screen::ProblemSets => "Problem Sets".to_string(),
            Screen::ProblemItems => {
                let name = self
                    .current_set
                    .as_ref()
                    .and_then(|id| self.problem_sets.iter().find(|ps| &ps.id == id))
                    .map(|ps| ps.name.as_str())
                    .unwrap_or("?");
                format!("Problems - {}", name)
            }
            _ => String::new(),
        }
    }

    pub fn list_help(&self) -> Vec<(&'static str, &'static str)> {
        match self.screen {
            Screen::Groups => {
                let mut help = vec![
                    ("Enter", "Open"),
                    ("a", "Add"),
                    ("s", "Quiz"),
                    ("e", "Export"),
                    ("i", "Import"),
                ];
                if self.sync.is_some() {
                    help.push(("u", "Upload"));
                    help.push(("d", "Download"));
                }
                help.push(("Esc", "Menu"));
                help
            }
            Screen::Words => vec![("a", "Add"), ("x", "Delete"), ("Esc", "Back")],
            Screen::Wrongs => vec![
                ("s", "Quiz"),
                ("x", "Remove"),
                ("c", "Clear All"),
                ("Esc", "Menu"),
            ],
            Screen::ProblemSets => {
                let mut help = vec![
                    ("Enter", "Open"),
                    ("a", "Add"),
                    ("s", "Quiz"),
                    ("x", "Delete"),
                    ("e", "Export"),
                    ("i", "Import"),
                ];
                if self.sync.is_some() {
                    help.push(("u", "Upload"));
                    help.push(("d", "Download"));
                }
                help.push(("Esc", "Menu"));
                help
            }
            Screen::ProblemItems => vec![
                ("a", "Add Q/A"),
                ("c", "Add Choice"),
                ("e", "Edit"),
                ("x", "Delete"),
                ("Esc", "Back"),
            ],
            _ => Vec::new(),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if self.viewer.is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                self.viewer = None;
            }
            return;
        }
        if self.prompt.is_some() {
            self.handle_prompt_key(key.code);
            return;
        }
        match self.screen {
            Screen::Menu => self.handle_menu_key(key.code),
            Screen::Groups => self.handle_groups_key(key.code),
            Screen::Words => self.handle_words_key(key.code),
            Screen::Wrongs => self.handle_wrongs_key(key.code),
            Screen::ProblemSets => self.handle_sets_key(key.code),
            Screen::ProblemItems => self.handle_items_key(key.code),
            Screen::Setup => self.handle_setup_key(key.code),
            Screen::Quiz => self.handle_quiz_key(key.code, now),
            Screen::Summary => self.handle_summary_key(key.code),
        }
    }

    /// Fires the session's delayed advance; called from the event loop on
    /// every poll timeout.
    pub fn tick(&mut self, now: Instant) {
        if self.screen != Screen::Quiz {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.tick(now) {
            self.quiz_input.clear();
            self.finish_if_done();
        }
    }

    fn goto(&mut self, screen: Screen) {
        self.screen = screen;
        self.selected = 0;
        self.status = None;
        self.refresh();
    }

    fn move_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    fn move_down(&mut self) {
        if self.selected + 1 < self.current_list_len() {
            self.selected += 1;
        }
    }

    fn handle_menu_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('1') => {
                self.menu_panel = 0;
                self.selected = 0;
            }
            KeyCode::Char('2') => {
                self.menu_panel = 1;
                self.selected = 0;
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_up(),
            KeyCode::Down | KeyCode::Char('j') => self.move_down(),
            KeyCode::Enter => {
                if self.menu_panel == 0 {
                    if let Some(group) = self.recent_groups.get(self.selected) {
                        let id = group.id.clone();
                        self.request_quiz(PendingKind::Group, &id);
                    }
                } else if let Some(ps) = self.recent_sets.get(self.selected) {
                    let id = ps.id.clone();
                    self.request_quiz(PendingKind::Problem, &id);
                }
            }
            KeyCode::Char('g') => self.goto(Screen::Groups),
            KeyCode::Char('p') => self.goto(Screen::ProblemSets),
            KeyCode::Char('w') => self.goto(Screen::Wrongs),
            KeyCode::Char('u') => self.push_all(),
            KeyCode::Char('d') => self.pull_all(),
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_groups_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Up | KeyCode::Char('k') => self.move_up(),
            KeyCode::Down | KeyCode::Char('j') => self.move_down(),
            KeyCode::Enter => {
                if let Some(group) = self.groups.get(self.selected) {
                    self.current_group = Some(group.id.clone());
                    self.goto(Screen::Words);
                }
            }
            KeyCode::Char('a') => self.open_prompt(Prompt::AddGroup),
            KeyCode::Char('s') => {
                if let Some(group) = self.groups.get(self.selected) {
                    let id = group.id.clone();
                    self.request_quiz(PendingKind::Group, &id);
                }
            }
            KeyCode::Char('e') => {
                if let Some(group) = self.groups.get(self.selected) {
                    let id = group.id.clone();
                    self.export_group(&id);
                }
            }
            KeyCode::Char('i') => self.open_prompt(Prompt::ImportGroup),
            KeyCode::Char('u') => {
                if let Some(group) = self.groups.get(self.selected) {
                    let id = group.id.clone();
                    self.upload_group(&id);
                }
            }
            KeyCode::Char('d') => {
                if self.sync.is_some() {
                    self.open_prompt(Prompt::DownloadGroup);
                }
            }
            KeyCode::Esc | KeyCode::Char('m') => self.goto(Screen::Menu),
            _ => {}
        }
    }

    fn handle_words_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Up | KeyCode::Char('k') => self.move_up(),
            KeyCode::Down | KeyCode::Char('j') => self.move_down(),
            KeyCode::Char('a') => self.open_prompt(Prompt::AddWordTerm),
            KeyCode::Char('x') => {
                if let Some(word) = self.words.get(self.selected) {
                    self.store.delete_word(&word.id.clone());
                    self.refresh();
                }
            }
            KeyCode::Esc => self.goto(Screen::Groups),
            _ => {}
        }
    }

    fn handle_wrongs_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Up | KeyCode::Char('k') => self.move_up(),
            KeyCode::Down | KeyCode::Char('j') => self.move_down(),
            KeyCode::Char('s') => self.open_setup(QuizSource::Wrongs),
            KeyCode::Char('x') => {
                if let Some(word) = self.wrongs.get(self.selected) {
                    self.store.remove_wrong(&word.id.clone());
                    self.refresh();
                }
            }
            KeyCode::Char('c') => {
                self.store.clear_wrongs();
                self.refresh();
            }
            KeyCode::Esc | KeyCode::Char('m') => self.goto(Screen::Menu),
            _ => {}
        }
    }

    fn handle_sets_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Up | KeyCode::Char('k') => self.move_up(),
            KeyCode::Down | KeyCode::Char('j') => self.move_down(),
            KeyCode::Enter => {
                if let Some(ps) = self.problem_sets.get(self.selected) {
                    self.current_set = Some(ps.id.clone());
                    self.goto(Screen::ProblemItems);
                }
            }
            KeyCode::Char('a') => self.open_prompt(Prompt::AddSet),
            KeyCode::Char('s') => {
                if let Some(ps) = self.problem_sets.get(self.selected) {
                    let id = ps.id.clone();
                    self.request_quiz(PendingKind::Problem, &id);
                }
            }
            KeyCode::Char('x') => {
                if let Some(ps) = self.problem_sets.get(self.selected) {
                    self.store.delete_problem_set(&ps.id.clone());
                    self.refresh();
                }
            }
            KeyCode::Char('e') => {
                if let Some(ps) = self.problem_sets.get(self.selected) {
                    let id = ps.id.clone();
                    self.export_problem_set(&id);
                }
            }
            KeyCode::Char('i') => self.open_prompt(Prompt::ImportProblemSet),
            KeyCode::Char('u') => {
                if let Some(ps) = self.problem_sets.get(self.selected) {
                    let id = ps.id.clone();
                    self.upload_problem_set(&id);
                }
            }
            KeyCode::Char('d') => {
                if self.sync.is_some() {
                    self.open_prompt(Prompt::DownloadProblemSet);
                }
            }
            KeyCode::Esc | KeyCode::Char('m') => self.goto(Screen::Menu),
            _ => {}
        }
    }

    fn handle_items_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Up | KeyCode::Char('k') => self.move_up(),
            KeyCode::Down | KeyCode::Char('j') => self.move_down(),
            KeyCode::Char('a') => self.open_prompt(Prompt::ItemQuestion { slot: None }),
            KeyCode::Char('c') => self.open_prompt(Prompt::ChoiceQuestion { slot: None }),
            KeyCode::Char('e') => {
                let prompt = match self.items.get(self.selected) {
                    Some(ProblemItem::Choice(_)) => Prompt::ChoiceQuestion {
                        slot: Some(self.selected),
                    },
                    Some(ProblemItem::Free(_)) => Prompt::ItemQuestion {
                        slot: Some(self.selected),
                    },
                    None => return,
                };
                self.open_prompt(prompt);
            }
            KeyCode::Char('x') => {
                if let Some(set_id) = self.current_set.clone() {
                    self.store.remove_problem_from_set(&set_id, self.selected);
                    self.refresh();
                }
            }
            KeyCode::Esc => self.goto(Screen::ProblemSets),
            _ => {}
        }
    }

    fn handle_setup_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if self.setup.count_input.len() < 3 {
                    self.setup.count_input.push(c);
                }
            }
            KeyCode::Backspace => {
                self.setup.count_input.pop();
            }
            KeyCode::Char('r') => self.setup.randomize = !self.setup.randomize,
            KeyCode::Enter => self.start_quiz(),
            KeyCode::Esc => self.goto(Screen::Menu),
            _ => {}
        }
    }

    fn handle_quiz_key(&mut self, key: KeyCode, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            self.goto(Screen::Menu);
            return;
        };

        if session.feedback() != Feedback::None {
            match key {
                KeyCode::Enter | KeyCode::Tab => {
                    session.advance();
                    self.quiz_input.clear();
                    self.finish_if_done();
                }
                KeyCode::Esc => self.abandon_quiz(),
                _ => {}
            }
            return;
        }

        let is_choice = session.current().is_some_and(QuizItem::is_choice);
        let choice_count = match session.current() {
            Some(QuizItem::Choice { choices, .. }) => choices.len(),
            _ => 0,
        };
        match key {
            KeyCode::Char(c) if is_choice && c.is_ascii_digit() && c != '0' => {
                let index = c as usize - '1' as usize;
                if index < choice_count {
                    let verdict = session.submit_choice(index, now);
                    self.apply_verdict(verdict);
                }
            }
            KeyCode::Enter if !is_choice => {
                let input = self.quiz_input.clone();
                let verdict = session.submit_text(&input, now);
                self.apply_verdict(verdict);
            }
            KeyCode::Backspace if !is_choice => {
                self.quiz_input.pop();
            }
            KeyCode::Char(c) if !is_choice => self.quiz_input.push(c),
            KeyCode::Tab => {
                session.skip();
                self.quiz_input.clear();
                self.finish_if_done();
            }
            KeyCode::Esc => self.abandon_quiz(),
            _ => {}
        }
    }

    fn handle_summary_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('r') => {
                if let Some(session) = self.session.as_mut() {
                    session.restart();
                    self.quiz_input.clear();
                    self.screen = Screen::Quiz;
                }
            }
            KeyCode::Char('m') | KeyCode::Esc => {
                self.session = None;
                self.goto(Screen::Menu);
            }
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    fn apply_verdict(&mut self, verdict: Verdict) {
        if let Verdict::Wrong { wrong_id: Some(id) } = &verdict {
            self.store.record_wrong(id);
        }
    }

    fn finish_if_done(&mut self) {
        if self.session.as_ref().is_some_and(QuizSession::is_finished) {
            self.screen = Screen::Summary;
        }
    }

    fn abandon_quiz(&mut self) {
        self.session = None;
        self.quiz_input.clear();
        self.goto(Screen::Menu);
    }

    /// Record the chosen quiz source in the pending relay and move to the
    /// setup screen, which consumes it.
    fn request_quiz(&mut self, kind: PendingKind, id: &str) {
        self.store.save_pending_selection(kind, id);
        let source = match self.store.pending_selection() {
            Some(pending) => {
                self.store.clear_pending_selection();
                match pending.kind {
                    PendingKind::Group => QuizSource::Group(pending.id),
                    PendingKind::Problem => QuizSource::ProblemSet(pending.id),
                }
            }
            // relay degraded to empty; fall back to the direct selection
            None => match kind {
                PendingKind::Group => QuizSource::Group(id.to_string()),
                PendingKind::Problem => QuizSource::ProblemSet(id.to_string()),
            },
        };
        self.open_setup(source);
    }

    fn open_setup(&mut self, source: QuizSource) {
        self.setup.source_name = match &source {
            QuizSource::Group(id) => self
                .store
                .groups()
                .into_iter()
                .find(|g| &g.id == id)
                .map(|g| g.name)
                .unwrap_or_else(|| "?".to_string()),
            QuizSource::ProblemSet(id) => self
                .store
                .problem_sets()
                .into_iter()
                .find(|ps| &ps.id == id)
                .map(|ps| ps.name)
                .unwrap_or_else(|| "?".to_string()),
            QuizSource::Wrongs => "Wrong Words".to_string(),
        };
        self.setup.source = Some(source);
        self.setup.count_input.clear();
        self.setup.randomize = true;
        self.screen = Screen::Setup;
        self.status = None;
    }

    fn start_quiz(&mut self) {
        let Some(source) = self.setup.source.clone() else {
            self.goto(Screen::Menu);
            return;
        };
        let items: Vec<QuizItem> = match &source {
            QuizSource::Group(id) => self
                .store
                .words_by_group(id)
                .iter()
                .map(QuizItem::from_word)
                .collect(),
            QuizSource::Wrongs => self
                .store
                .wrong_words()
                .iter()
                .map(QuizItem::from_word)
                .collect(),
            QuizSource::ProblemSet(id) => self
                .store
                .problem_set_items(id)
                .iter()
                .map(QuizItem::from_problem_item)
                .collect(),
        };

        let count = self
            .setup
            .count_input
            .parse::<usize>()
            .ok()
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_QUESTION_COUNT);

        match QuizSession::build(items, count, self.setup.randomize, &mut rand::thread_rng()) {
            Some(session) => {
                match &source {
                    QuizSource::Group(id) => {
                        self.store.touch_group(id);
                    }
                    QuizSource::ProblemSet(id) => {
                        self.store.touch_problem_set(id);
                    }
                    QuizSource::Wrongs => {}
                }
                self.session = Some(session);
                self.quiz_input.clear();
                self.screen = Screen::Quiz;
                self.status = None;
            }
            None => self.status = Some("Nothing to quiz here".to_string()),
        }
    }

    fn open_prompt(&mut self, prompt: Prompt) {
        self.prompt = Some(prompt);
        self.input.clear();
    }

    fn handle_prompt_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.prompt = None;
                self.input.clear();
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            KeyCode::Enter => {
                let Some(prompt) = self.prompt.take() else {
                    return;
                };
                let input = std::mem::take(&mut self.input);
                self.submit_prompt(prompt, input);
            }
            _ => {}
        }
    }

    fn submit_prompt(&mut self, prompt: Prompt, input: String) {
        let trimmed = input.trim().to_string();
        match prompt {
            Prompt::AddGroup => {
                if !trimmed.is_empty() {
                    self.store.add_group(&trimmed);
                    self.refresh();
                }
            }
            Prompt::ImportGroup => self.import_group_json(&trimmed),
            Prompt::DownloadGroup => self.download_group(&trimmed),
            Prompt::AddWordTerm => {
                if trimmed.is_empty() {
                    return;
                }
                self.open_prompt(Prompt::AddWordMeaning { word: trimmed });
            }
            Prompt::AddWordMeaning { word } => {
                if let Some(group_id) = self.current_group.clone() {
                    self.store.add_word(&group_id, &word, &trimmed);
                    self.refresh();
                }
            }
            Prompt::AddSet => {
                if !trimmed.is_empty() {
                    self.store.add_problem_set_with_items(&trimmed, &[]);
                    self.refresh();
                }
            }
            Prompt::ImportProblemSet => self.import_problem_set_json(&trimmed),
            Prompt::DownloadProblemSet => self.download_problem_set(&trimmed),
            Prompt::ItemQuestion { slot } => {
                if trimmed.is_empty() {
                    return;
                }
                self.open_prompt(Prompt::ItemAnswer {
                    slot,
                    question: trimmed,
                });
            }
            Prompt::ItemAnswer { slot, question } => {
                let item = ProblemItem::Free(FreeItem::new(question, trimmed));
                self.store_item(slot, item);
            }
            Prompt::ChoiceQuestion { slot } => {
                if trimmed.is_empty() {
                    return;
                }
                self.open_prompt(Prompt::ChoiceOptions {
                    slot,
                    question: trimmed,
                });
            }
            Prompt::ChoiceOptions { slot, question } => {
                let choices: Vec<String> = trimmed
                    .split('|')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect();
                if choices.len() < 2 {
                    self.status = Some("A choice item needs at least 2 choices".to_string());
                    self.open_prompt(Prompt::ChoiceOptions { slot, question });
                    return;
                }
                self.open_prompt(Prompt::ChoiceAnswer {
                    slot,
                    question,
                    choices,
                });
            }
            Prompt::ChoiceAnswer {
                slot,
                question,
                choices,
            } => {
                let parsed = trimmed
                    .parse::<usize>()
                    .ok()
                    .filter(|&n| n >= 1 && n <= choices.len());
                let Some(number) = parsed else {
                    self.status = Some(format!("Enter a number between 1 and {}", choices.len()));
                    self.open_prompt(Prompt::ChoiceAnswer {
                        slot,
                        question,
                        choices,
                    });
                    return;
                };
                let item = ProblemItem::Choice(ChoiceItem::new(question, choices, number - 1));
                self.store_item(slot, item);
            }
        }
    }

    fn store_item(&mut self, slot: Option<usize>, item: ProblemItem) {
        let Some(set_id) = self.current_set.clone() else {
            return;
        };
        match slot {
            Some(index) => {
                self.store.update_problem_in_set(&set_id, index, item);
            }
            None => {
                self.store.add_problem_to_set(&set_id, item);
            }
        }
        self.refresh();
    }

    fn export_group(&mut self, group_id: &str) {
        let Some(payload) = self.store.export_group(group_id) else {
            return;
        };
        match serde_json::to_string_pretty(&payload) {
            Ok(json) => self.viewer = Some((format!("Export - {}", payload.name), json)),
            Err(e) => self.status = Some(format!("Export failed: {e}")),
        }
    }

    fn export_problem_set(&mut self, set_id: &str) {
        let Some(payload) = self.store.export_problem_set(set_id) else {
            return;
        };
        match serde_json::to_string_pretty(&payload) {
            Ok(json) => self.viewer = Some((format!("Export - {}", payload.name), json)),
            Err(e) => self.status = Some(format!("Export failed: {e}")),
        }
    }

    fn import_group_json(&mut self, json: &str) {
        let Ok(payload) = serde_json::from_str::<GroupPayload>(json) else {
            self.status = Some("Not a valid group payload".to_string());
            return;
        };
        match self.store.import_group(&payload) {
            Some(_) => {
                self.status = Some(format!("Imported group \"{}\"", payload.name));
                self.refresh();
            }
            None => self.status = Some("Not a valid group payload".to_string()),
        }
    }

    fn import_problem_set_json(&mut self, json: &str) {
        let Ok(payload) = serde_json::from_str::<ProblemSetPayload>(json) else {
            self.status = Some("Not a valid problem set payload".to_string());
            return;
        };
        match self.store.import_problem_set(&payload) {
            Some(_) => {
                self.status = Some(format!("Imported problem set \"{}\"", payload.name));
                self.refresh();
            }
            None => self.status = Some("Not a valid problem set payload".to_string()),
        }
    }

    fn upload_group(&mut self, group_id: &str) {
        let Some(sync) = &self.sync else {
            return;
        };
        let Some(payload) = self.store.export_group(group_id) else {
            return;
        };
        let value = match serde_json::to_value(&payload) {
            Ok(value) => value,
            Err(e) => {
                self.status = Some(format!("Upload failed: {e}"));
                return;
            }
        };
        match sync.upload(GROUPS_COLLECTION, &value, None) {
            Ok(id) => self.status = Some(format!("Uploaded as {}", truncate_to_width(&id, 24))),
            Err(e) => self.status = Some(e),
        }
    }

    fn upload_problem_set(&mut self, set_id: &str) {
        let Some(sync) = &self.sync else {
            return;
        };
        let Some(payload) = self.store.export_problem_set(set_id) else {
            return;
        };
        let value = match serde_json::to_value(&payload) {
            Ok(value) => value,
            Err(e) => {
                self.status = Some(format!("Upload failed: {e}"));
                return;
            }
        };
        match sync.upload(PROBLEM_SETS_COLLECTION, &value, None) {
            Ok(id) => self.status = Some(format!("Uploaded as {}", truncate_to_width(&id, 24))),
            Err(e) => self.status = Some(e),
        }
    }

    fn download_group(&mut self, id: &str) {
        let Some(sync) = &self.sync else {
            return;
        };
        if id.is_empty() {
            return;
        }
        match sync.download(GROUPS_COLLECTION, id) {
            Ok(Some(value)) => match serde_json::from_value::<GroupPayload>(value) {
                Ok(payload) => match self.store.import_group(&payload) {
                    Some(_) => {
                        self.status = Some(format!("Downloaded \"{}\"", payload.name));
                        self.refresh();
                    }
                    None => self.status = Some("Shared document is not a group".to_string()),
                },
                Err(_) => self.status = Some("Shared document is not a group".to_string()),
            },
            Ok(None) => self.status = Some("No shared group with that id".to_string()),
            Err(e) => self.status = Some(e),
        }
    }

    fn download_problem_set(&mut self, id: &str) {
        let Some(sync) = &self.sync else {
            return;
        };
        if id.is_empty() {
            return;
        }
        match sync.download(PROBLEM_SETS_COLLECTION, id) {
            Ok(Some(value)) => match serde_json::from_value::<ProblemSetPayload>(value) {
                Ok(payload) => match self.store.import_problem_set(&payload) {
                    Some(_) => {
                        self.status = Some(format!("Downloaded \"{}\"", payload.name));
                        self.refresh();
                    }
                    None => self.status = Some("Shared document is not a problem set".to_string()),
                },
                Err(_) => self.status = Some("Shared document is not a problem set".to_string()),
            },
            Ok(None) => self.status = Some("No shared problem set with that id".to_string()),
            Err(e) => self.status = Some(e),
        }
    }

    fn push_all(&mut self) {
        let Some(sync) = &self.sync else {
            return;
        };
        let doc = self.store.load();
        match sync.push_all(&doc) {
            Ok(()) => self.status = Some("Pushed everything to the server".to_string()),
            Err(e) => self.status = Some(e),
        }
    }

    /// A failed pull leaves local state untouched; only a successfully
    /// fetched document is persisted.
    fn pull_all(&mut self) {
        let Some(sync) = &self.sync else {
            return;
        };
        match sync.pull_all() {
            Ok(Some(doc)) => {
                self.store.save(&doc);
                self.status = Some("Pulled everything from the server".to_string());
                self.refresh();
            }
            Ok(None) => self.status = Some("Nothing on the server yet".to_string()),
            Err(e) => self.status = Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;
    use crossterm::event::{KeyEvent, KeyModifiers};

    fn app() -> App {
        App::new(Store::new(Box::new(MemoryBackend::new())), None)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE), Instant::now());
    }

    fn type_line(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
        press(app, KeyCode::Enter);
    }

    #[test]
    fn test_add_group_through_prompt() {
        let mut app = app();
        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.screen, Screen::Groups);

        press(&mut app, KeyCode::Char('a'));
        assert!(app.prompt_title().is_some());
        type_line(&mut app, "Animals");

        assert!(app.groups.iter().any(|g| g.name == "Animals"));
    }

    #[test]
    fn test_blank_group_name_is_ignored() {
        let mut app = app();
        press(&mut app, KeyCode::Char('g'));
        let before = app.groups.len();

        press(&mut app, KeyCode::Char('a'));
        type_line(&mut app, "   ");

        assert_eq!(app.groups.len(), before);
    }

    #[test]
    fn test_add_word_two_step_prompt() {
        let mut app = app();
        press(&mut app, KeyCode::Char('g'));
        press(&mut app, KeyCode::Char('a'));
        type_line(&mut app, "Animals");

        // open the new group (default group sorts first)
        let index = app.groups.iter().position(|g| g.name == "Animals").unwrap();
        for _ in 0..index {
            press(&mut app, KeyCode::Down);
        }
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen, Screen::Words);

        press(&mut app, KeyCode::Char('a'));
        type_line(&mut app, "cat");
        type_line(&mut app, "ねこ");

        assert_eq!(app.words.len(), 1);
        assert_eq!(app.words[0].word, "cat");
        assert_eq!(app.words[0].meaning, "ねこ");
    }

    #[test]
    fn test_quiz_setup_consumes_pending_selection() {
        let mut app = app();
        press(&mut app, KeyCode::Char('g'));
        press(&mut app, KeyCode::Char('s'));

        assert_eq!(app.screen, Screen::Setup);
        // the relay was consumed on the way in
        assert!(app.store.pending_selection().is_none());
    }

    #[test]
    fn test_empty_source_stays_on_setup() {
        let mut app = app();
        press(&mut app, KeyCode::Char('g'));
        press(&mut app, KeyCode::Char('s')); // default group has no words
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.screen, Screen::Setup);
        assert!(app.status.is_some());
    }

    #[test]
    fn test_full_quiz_round_marks_wrong_word() {
        let mut app = app();
        let g = app.store.add_group("g");
        app.store.add_word(&g, "apple", "りんご");
        app.refresh();

        press(&mut app, KeyCode::Char('g'));
        let index = app.groups.iter().position(|grp| grp.id == g).unwrap();
        for _ in 0..index {
            press(&mut app, KeyCode::Down);
        }
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Enter); // start with defaults
        assert_eq!(app.screen, Screen::Quiz);

        type_line(&mut app, "orange"); // wrong answer
        assert_eq!(app.store.wrong_words().len(), 1);

        press(&mut app, KeyCode::Enter); // acknowledge, advance
        assert_eq!(app.screen, Screen::Summary);
        let session = app.session().unwrap();
        assert_eq!(session.score(), (0, 1));
    }

    #[test]
    fn test_summary_restart_runs_same_quiz_again() {
        let mut app = app();
        let g = app.store.add_group("g");
        app.store.add_word(&g, "apple", "りんご");
        app.refresh();

        press(&mut app, KeyCode::Char('g'));
        let index = app.groups.iter().position(|grp| grp.id == g).unwrap();
        for _ in 0..index {
            press(&mut app, KeyCode::Down);
        }
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Enter);
        type_line(&mut app, "orange");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen, Screen::Summary);

        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.screen, Screen::Quiz);
        assert_eq!(app.session().unwrap().score(), (0, 1));

        type_line(&mut app, "apple");
        assert_eq!(app.session().unwrap().score(), (1, 1));
    }

    #[test]
    fn test_starting_quiz_touches_recency() {
        let mut app = app();
        let g = app.store.add_group("g");
        app.store.add_word(&g, "apple", "りんご");
        app.refresh();

        press(&mut app, KeyCode::Char('g'));
        let index = app.groups.iter().position(|grp| grp.id == g).unwrap();
        for _ in 0..index {
            press(&mut app, KeyCode::Down);
        }
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Enter);

        let recent = app.store.recent_groups(1);
        assert_eq!(recent[0].id, g);
        assert!(recent[0].last_used.is_some());
    }

    #[test]
    fn test_choice_item_prompt_chain() {
        let mut app = app();
        app.store.add_problem_set_with_items("s", &[]);
        app.refresh();

        press(&mut app, KeyCode::Char('p'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen, Screen::ProblemItems);

        press(&mut app, KeyCode::Char('c'));
        type_line(&mut app, "2+2?");
        type_line(&mut app, "3|4|5");
        type_line(&mut app, "2");

        assert_eq!(app.items.len(), 1);
        match &app.items[0] {
            ProblemItem::Choice(it) => {
                assert_eq!(it.choices, vec!["3", "4", "5"]);
                assert_eq!(it.answer_index, 1);
            }
            ProblemItem::Free(_) => panic!("expected choice item"),
        }
    }

    #[test]
    fn test_choice_item_rejects_single_option() {
        let mut app = app();
        app.store.add_problem_set_with_items("s", &[]);
        app.refresh();

        press(&mut app, KeyCode::Char('p'));
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('c'));
        type_line(&mut app, "q");
        type_line(&mut app, "only one");

        // still on the choices prompt
        assert!(app.prompt_title().is_some());
        assert!(app.status.is_some());
        assert!(app.items.is_empty());
    }

    #[test]
    fn test_delete_word_from_words_screen() {
        let mut app = app();
        let g = app.store.add_group("g");
        app.store.add_word(&g, "cat", "ねこ");
        app.refresh();

        press(&mut app, KeyCode::Char('g'));
        let index = app.groups.iter().position(|grp| grp.id == g).unwrap();
        for _ in 0..index {
            press(&mut app, KeyCode::Down);
        }
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('x'));

        assert!(app.words.is_empty());
        assert!(app.store.words_by_group(&g).is_empty());
    }

    #[test]
    fn test_wrongs_screen_clear_all() {
        let mut app = app();
        let g = app.store.add_group("g");
        let w = app.store.add_word(&g, "cat", "ねこ");
        app.store.record_wrong(&w);
        app.refresh();

        press(&mut app, KeyCode::Char('w'));
        assert_eq!(app.screen, Screen::Wrongs);
        assert_eq!(app.wrongs.len(), 1);

        press(&mut app, KeyCode::Char('c'));
        assert!(app.wrongs.is_empty());
    }

    #[test]
    fn test_import_group_via_prompt() {
        let mut app = app();
        press(&mut app, KeyCode::Char('g'));
        press(&mut app, KeyCode::Char('i'));
        type_line(
            &mut app,
            r#"{"type":"group","name":"Imported","words":[{"word":"a","meaning":"b"}]}"#,
        );

        assert!(app.groups.iter().any(|g| g.name == "Imported"));
    }

    #[test]
    fn test_import_rejects_garbage() {
        let mut app = app();
        press(&mut app, KeyCode::Char('g'));
        let before = app.groups.len();
        press(&mut app, KeyCode::Char('i'));
        type_line(&mut app, "not json");

        assert_eq!(app.groups.len(), before);
        assert!(app.status.is_some());
    }

    #[test]
    fn test_quit_from_menu() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
