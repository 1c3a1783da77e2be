use crate::{App, Focus, log_util::log_debug};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub(crate) struct TopicsManager<'a> {
    app: &'a mut App,
}

impl<'a> TopicsManager<'a> {
    pub(crate) fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Down | KeyCode::Char('j')) => self.select_next(),
            (KeyModifiers::NONE, KeyCode::Up | KeyCode::Char('k')) => self.select_previous(),
            (KeyModifiers::NONE, KeyCode::Enter | KeyCode::Right | KeyCode::Char('l')) => {
                self.open_current()
            }
            _ => {}
        }
    }

    /// Keep the sidebar cursor on the active topic after the catalog changes.
    pub(crate) fn sync_cursor(app: &mut App) {
        app.topic_cursor = app.session.selected_position().unwrap_or(0);
    }

    fn select_next(&mut self) {
        let total = self.app.session.catalog().len();
        if total == 0 {
            self.app.topic_cursor = 0;
            return;
        }
        self.app.topic_cursor = (self.app.topic_cursor + 1) % total;
    }

    fn select_previous(&mut self) {
        let total = self.app.session.catalog().len();
        if total == 0 {
            self.app.topic_cursor = 0;
            return;
        }
        if self.app.topic_cursor == 0 {
            self.app.topic_cursor = total - 1;
        } else {
            self.app.topic_cursor -= 1;
        }
    }

    fn open_current(&mut self) {
        let Some(file) = self.app.session.catalog().get(self.app.topic_cursor).cloned() else {
            return;
        };
        let request = self.app.session.select_topic(&file.location);
        self.app.question_cursor = 0;
        self.app.search_editing = false;
        self.app.focus = Focus::Questions;
        match request {
            Some(request) => {
                log_debug(&format!("App: selected topic {}", file.filename));
                self.app.loader.spawn_document_load(request);
            }
            None => log_debug(&format!(
                "App: topic {} already selected; collapsed open questions",
                file.filename
            )),
        }
    }
}
