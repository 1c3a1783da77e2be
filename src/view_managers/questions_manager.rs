use crate::{App, Focus, log_util::log_debug};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub(crate) struct QuestionsManager<'a> {
    app: &'a mut App,
}

impl<'a> QuestionsManager<'a> {
    pub(crate) fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Down | KeyCode::Char('j')) => self.select_next(),
            (KeyModifiers::NONE, KeyCode::Up | KeyCode::Char('k')) => self.select_previous(),
            (KeyModifiers::NONE, KeyCode::Home | KeyCode::Char('g')) => {
                self.app.question_cursor = 0
            }
            (KeyModifiers::NONE, KeyCode::End | KeyCode::Char('G'))
            | (KeyModifiers::SHIFT, KeyCode::Char('G')) => {
                self.app.question_cursor = self.visible_count().saturating_sub(1)
            }
            (KeyModifiers::NONE, KeyCode::Enter | KeyCode::Char(' ')) => self.toggle_current(),
            (KeyModifiers::NONE, KeyCode::Left | KeyCode::Char('h')) => {
                self.app.focus = Focus::Topics
            }
            _ => {}
        }
    }

    pub(crate) fn handle_search_key(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (_, KeyCode::Esc | KeyCode::Enter) => {
                self.app.search_editing = false;
            }
            (_, KeyCode::Backspace) => {
                self.app.session.pop_search_char();
                self.clamp_cursor();
            }
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(ch)) => {
                self.app.session.push_search_char(ch);
                self.clamp_cursor();
            }
            _ => {}
        }
    }

    pub(crate) fn start_search(&mut self) {
        self.app.search_editing = true;
        self.app.focus = Focus::Questions;
    }

    pub(crate) fn collapse_all(&mut self) {
        if !self.app.session.accordion().any_open() {
            return;
        }
        self.app.session.collapse_all();
        log_debug("App: collapsed all visible questions");
    }

    fn toggle_current(&mut self) {
        if self.visible_count() == 0 {
            return;
        }
        let index = self.app.question_cursor;
        self.app.session.toggle_question(index);
        log_debug(&format!(
            "App: question {} {}",
            index + 1,
            if self.app.session.accordion().is_open(index) {
                "expanded"
            } else {
                "collapsed"
            }
        ));
    }

    fn select_next(&mut self) {
        let total = self.visible_count();
        if total == 0 {
            self.app.question_cursor = 0;
            return;
        }
        self.app.question_cursor = (self.app.question_cursor + 1) % total;
    }

    fn select_previous(&mut self) {
        let total = self.visible_count();
        if total == 0 {
            self.app.question_cursor = 0;
            return;
        }
        if self.app.question_cursor == 0 {
            self.app.question_cursor = total - 1;
        } else {
            self.app.question_cursor -= 1;
        }
    }

    fn clamp_cursor(&mut self) {
        let total = self.visible_count();
        self.app.question_cursor = self.app.question_cursor.min(total.saturating_sub(1));
    }

    fn visible_count(&self) -> usize {
        self.app.session.filtered_questions().len()
    }
}
