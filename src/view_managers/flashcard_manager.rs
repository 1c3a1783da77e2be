use crate::{App, log_util::log_debug};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub(crate) struct FlashcardManager<'a> {
    app: &'a mut App,
}

impl<'a> FlashcardManager<'a> {
    pub(crate) fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    pub(crate) fn open(&mut self) {
        let mut rng = rand::rng();
        match self.app.session.open_flashcard(&mut rng) {
            Some(index) => {
                log_debug("App: building question index for random question");
                let files = self.app.session.catalog().to_vec();
                self.app.loader.spawn_index_build(index, files);
            }
            None => log_debug("App: opened random question"),
        }
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (_, KeyCode::Esc | KeyCode::Char('q')) => self.close(),
            (KeyModifiers::NONE, KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Char('a')) => {
                self.app.session.reveal_answer()
            }
            (KeyModifiers::NONE, KeyCode::Char('n') | KeyCode::Right | KeyCode::Char('l')) => {
                self.next()
            }
            _ => {}
        }
    }

    fn next(&mut self) {
        if self.app.session.is_flashcard_pending() {
            return;
        }
        let mut rng = rand::rng();
        self.app.session.reshuffle(&mut rng);
        log_debug("App: reshuffled random question");
    }

    fn close(&mut self) {
        self.app.session.close_flashcard();
        log_debug("App: closed random question");
    }
}
