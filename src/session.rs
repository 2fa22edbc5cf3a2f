use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{ProblemItem, Word};

/// How long a correct answer stays on screen before the session moves on
/// by itself. An explicit advance or skip cancels it.
pub const ADVANCE_DELAY: Duration = Duration::from_millis(700);

/// One quizzable item, already detached from the store.
#[derive(Debug, Clone, PartialEq)]
pub enum QuizItem {
    /// A group word: the meaning is shown and the word is typed. Wrong
    /// answers are reported against the word id.
    Word {
        id: String,
        word: String,
        meaning: String,
    },
    /// Multiple choice. Never reported to the wrong list.
    Choice {
        question: String,
        choices: Vec<String>,
        answer_index: usize,
    },
    /// Free response. Items migrated from word references keep the word id
    /// so misses still land on the wrong list.
    Qa {
        id: Option<String>,
        question: String,
        answer: String,
    },
}

impl QuizItem {
    pub fn from_word(w: &Word) -> Self {
        QuizItem::Word {
            id: w.id.clone(),
            word: w.word.clone(),
            meaning: w.meaning.clone(),
        }
    }

    pub fn from_problem_item(item: &ProblemItem) -> Self {
        match item {
            ProblemItem::Choice(it) => QuizItem::Choice {
                question: it.question.clone(),
                choices: it.choices.clone(),
                answer_index: it.answer_index,
            },
            ProblemItem::Free(it) => QuizItem::Qa {
                id: if it.id.is_empty() {
                    None
                } else {
                    Some(it.id.clone())
                },
                question: it.question.clone(),
                answer: it.answer.clone(),
            },
        }
    }

    /// What the question panel shows.
    pub fn prompt(&self) -> &str {
        match self {
            QuizItem::Word { meaning, .. } => meaning,
            QuizItem::Choice { question, .. } => question,
            QuizItem::Qa { question, .. } => question,
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, QuizItem::Choice { .. })
    }

    /// The answer to reveal after a miss. Choices are shown with their
    /// one-based number, the way they are listed.
    pub fn correct_answer_label(&self) -> String {
        match self {
            QuizItem::Word { word, .. } => word.clone(),
            QuizItem::Qa { answer, .. } => answer.clone(),
            QuizItem::Choice {
                choices,
                answer_index,
                ..
            } => match choices.get(*answer_index) {
                Some(choice) => format!("{}. {}", answer_index + 1, choice),
                None => String::new(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Feedback {
    None,
    Correct,
    Wrong,
}

/// Outcome of a submission. `Wrong::wrong_id` is the id the caller should
/// record on the wrong list, when the item has one.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Correct,
    Wrong { wrong_id: Option<String> },
    NotJudged,
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// One quiz run over a fixed item sequence. Pure state machine: it owns no
/// I/O and reports misses only through the returned `Verdict`.
#[derive(Debug)]
pub struct QuizSession {
    items: Vec<QuizItem>,
    current_index: usize,
    correct_count: usize,
    feedback: Feedback,
    advance_at: Option<Instant>,
}

impl QuizSession {
    /// None if the source is empty. With `randomize` the source is
    /// shuffled (Fisher–Yates via `SliceRandom`) before truncating to
    /// `min(requested, len)`; the sequence is fixed from then on.
    pub fn build(
        source: Vec<QuizItem>,
        requested: usize,
        randomize: bool,
        rng: &mut impl Rng,
    ) -> Option<Self> {
        if source.is_empty() {
            return None;
        }
        let mut items = source;
        if randomize {
            items.shuffle(rng);
        }
        let count = requested.min(items.len());
        items.truncate(count);
        Some(QuizSession {
            items,
            current_index: 0,
            correct_count: 0,
            feedback: Feedback::None,
            advance_at: None,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Zero-based cursor; equals `len()` once finished.
    pub fn position(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> Option<&QuizItem> {
        self.items.get(self.current_index)
    }

    pub fn feedback(&self) -> Feedback {
        self.feedback
    }

    pub fn is_finished(&self) -> bool {
        self.current_index >= self.items.len()
    }

    /// `(correct, total)`.
    pub fn score(&self) -> (usize, usize) {
        (self.correct_count, self.items.len())
    }

    /// Judge a choice selection against the current item. Ignored when the
    /// current item is not a choice or the item was already judged.
    pub fn submit_choice(&mut self, choice_index: usize, now: Instant) -> Verdict {
        if self.feedback != Feedback::None {
            return Verdict::NotJudged;
        }
        let Some(QuizItem::Choice { answer_index, .. }) = self.current() else {
            return Verdict::NotJudged;
        };
        if choice_index == *answer_index {
            self.mark_correct(now);
            Verdict::Correct
        } else {
            self.feedback = Feedback::Wrong;
            Verdict::Wrong { wrong_id: None }
        }
    }

    /// Judge typed input against the current word or free-response item.
    /// Both sides are trimmed and lowercased; blank input is not judged
    /// and may be resubmitted.
    pub fn submit_text(&mut self, input: &str, now: Instant) -> Verdict {
        if self.feedback != Feedback::None {
            return Verdict::NotJudged;
        }
        let user = normalize(input);
        if user.is_empty() {
            return Verdict::NotJudged;
        }
        let (expected, wrong_id) = match self.current() {
            Some(QuizItem::Word { id, word, .. }) => (normalize(word), Some(id.clone())),
            Some(QuizItem::Qa { id, answer, .. }) => (normalize(answer), id.clone()),
            _ => return Verdict::NotJudged,
        };
        if user == expected {
            self.mark_correct(now);
            Verdict::Correct
        } else {
            self.feedback = Feedback::Wrong;
            Verdict::Wrong { wrong_id }
        }
    }

    fn mark_correct(&mut self, now: Instant) {
        self.correct_count += 1;
        self.feedback = Feedback::Correct;
        self.advance_at = Some(now + ADVANCE_DELAY);
    }

    /// Fires the delayed advance once its deadline has passed. Returns
    /// true if the session moved.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.advance_at {
            Some(deadline) if now >= deadline => {
                self.advance();
                true
            }
            _ => false,
        }
    }

    /// Move to the next item, cancelling any scheduled auto-advance so the
    /// delayed move and an explicit one can never both fire.
    pub fn advance(&mut self) {
        self.advance_at = None;
        self.feedback = Feedback::None;
        if self.current_index < self.items.len() {
            self.current_index += 1;
        }
    }

    /// Advance without scoring.
    pub fn skip(&mut self) {
        self.advance();
    }

    /// Back to the start of the same fixed sequence; no reshuffle.
    pub fn restart(&mut self) {
        self.current_index = 0;
        self.correct_count = 0;
        self.feedback = Feedback::None;
        self.advance_at = None;
    }
}
