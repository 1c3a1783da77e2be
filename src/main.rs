mod accordion;
mod catalog;
mod config;
mod content_source;
mod document;
mod failure;
mod loader;
mod log_util;
mod question_index;
mod random_selector;
mod search;
mod session;
mod ui_renderer;
mod view_managers;

use color_eyre::Result;
use content_source::HttpContentSource;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use dotenvy::dotenv;
use failure::FailureKind;
use loader::{LoadMessage, Loader};
use log_util::log_debug;
use random_selector::RandomSelector;
use ratatui::{DefaultTerminal, Frame};
use session::{CatalogOutcome, CatalogStatus, DocumentStatus, LoadOutcome, Session};
use std::{
    sync::mpsc::{Receiver, TryRecvError},
    time::Duration,
};
use ui_renderer::UiRenderer;
use view_managers::{FlashcardManager, QuestionsManager, TopicsManager};

pub(crate) const LOADING_FRAMES: [&str; 4] = ["-", "\\", "|", "/"];

/// Which pane receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Focus {
    Topics,
    Questions,
}

fn main() -> color_eyre::Result<()> {
    dotenv().ok();
    color_eyre::install()?;
    let app = App::new()?;
    let terminal = ratatui::init();
    let result = app.run(terminal);
    ratatui::restore();
    result
}

/// The main application which holds the state and logic of the application.
#[derive(Debug)]
pub struct App {
    /// Is the application running?
    pub(crate) running: bool,
    /// Pane that currently receives navigation keys.
    pub(crate) focus: Focus,
    /// Highlighted row in the topic sidebar.
    pub(crate) topic_cursor: usize,
    /// Highlighted row in the filtered question list.
    pub(crate) question_cursor: usize,
    /// Whether typed characters go to the search box.
    pub(crate) search_editing: bool,
    /// Catalog, selection, active document and question index.
    pub(crate) session: Session,
    /// Topic shown before the catalog arrives, if configured.
    initial_topic_url: Option<String>,
    /// Background fetches for catalog, titles, documents and the index.
    pub(crate) loader: Loader<HttpContentSource>,
    /// Receives background load results.
    load_receiver: Receiver<LoadMessage>,
    /// Listing endpoint shown in the header.
    pub(crate) catalog_url: String,
    /// Any error encountered while loading content.
    pub(crate) error: Option<String>,
    /// Latest load status message.
    pub(crate) status: Option<String>,
    /// Spinner frame index for the active loading indicator.
    pub(crate) loading_frame: usize,
}

impl App {
    /// Construct a new instance of [`App`].
    pub fn new() -> Result<Self> {
        let mut aggregated_error: Option<String> = None;

        if let Err(err) = config::initialize() {
            Self::push_error(
                &mut aggregated_error,
                format!("Configuration load failed: {}", err),
            );
        }

        let config = config::current();
        let source = HttpContentSource::from_config(&config)?;
        let catalog_url = source.catalog_url().to_string();
        let (loader, load_receiver) = Loader::new(source, config.document_extension.clone());

        Ok(Self {
            running: false,
            focus: Focus::Topics,
            topic_cursor: 0,
            question_cursor: 0,
            search_editing: false,
            session: Session::new(RandomSelector::new(config.max_reshuffle_attempts)),
            initial_topic_url: config.initial_topic_url,
            loader,
            load_receiver,
            catalog_url,
            error: aggregated_error,
            status: None,
            loading_frame: 0,
        })
    }

    /// Run the application's main loop.
    pub fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        self.running = true;
        self.start_session();
        let tick_rate = Duration::from_millis(120);
        while self.running {
            self.poll_load_messages();
            terminal.draw(|frame| self.render(frame))?;
            self.handle_crossterm_events(tick_rate)?;
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        UiRenderer::new(self).render(frame);
    }

    /// Kick off the default topic (if any) and the catalog load.
    fn start_session(&mut self) {
        if let Some(url) = self.initial_topic_url.clone() {
            if let Some(request) = self.session.select_topic(&url) {
                log_debug(&format!("App: loading default topic {}", url));
                self.loader.spawn_document_load(request);
            }
        }
        self.loader.spawn_catalog_load(self.session.catalog_generation());
        self.status = Some("Loading topics…".to_string());
    }

    /// Fetch the catalog again, dropping titles and the question index.
    fn reload_catalog(&mut self) {
        log_debug("App: reloading catalog");
        self.session.invalidate();
        self.topic_cursor = 0;
        self.loader.spawn_catalog_load(self.session.catalog_generation());
        self.status = Some("Reloading topics…".to_string());
    }

    /// Throw the whole session away and start over.
    fn reset_session(&mut self) {
        log_debug("App: resetting session");
        self.session.initialize();
        self.error = None;
        self.focus = Focus::Topics;
        self.topic_cursor = 0;
        self.question_cursor = 0;
        self.search_editing = false;
        self.start_session();
    }

    fn poll_load_messages(&mut self) {
        loop {
            match self.load_receiver.try_recv() {
                Ok(message) => self.handle_load_message(message),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    Self::push_error(
                        &mut self.error,
                        "Background loader disconnected".to_string(),
                    );
                    break;
                }
            }
        }
    }

    fn handle_load_message(&mut self, message: LoadMessage) {
        match message {
            LoadMessage::Catalog { generation, result } => match self
                .session
                .apply_catalog(generation, result)
            {
                CatalogOutcome::Ready { request } => {
                    let total = self.session.catalog().len();
                    log_debug(&format!("App: catalog ready with {} topic(s)", total));
                    self.status = Some(format!("Topics: {}", total));
                    TopicsManager::sync_cursor(self);
                    if let Some(request) = request {
                        self.question_cursor = 0;
                        self.loader.spawn_document_load(request);
                    }
                }
                CatalogOutcome::Unavailable { kind, message } => {
                    log_debug(&format!("App: {} failure: {}", kind.label(), message));
                    Self::push_error(
                        &mut self.error,
                        format!("Failed to load topics: {}", message),
                    );
                    self.status = Some("No topics available".to_string());
                }
                CatalogOutcome::Stale => {
                    log_debug(&format!(
                        "App: discarded stale catalog load (generation {})",
                        generation
                    ));
                }
            },
            LoadMessage::Title {
                generation,
                location,
                title,
            } => {
                if !self.session.record_title(generation, location, title) {
                    log_debug("App: discarded title from a superseded catalog load");
                }
            }
            LoadMessage::Document { request, result } => {
                match self.session.commit_document(&request, result) {
                    LoadOutcome::Applied => {
                        self.question_cursor = 0;
                        let document = self.session.document();
                        log_debug(&format!(
                            "App: loaded topic '{}' with {} question(s)",
                            document.topic,
                            document.questions.len()
                        ));
                        self.status = Some(format!("Questions: {}", document.questions.len()));
                    }
                    LoadOutcome::Degraded { kind, message } => {
                        self.question_cursor = 0;
                        log_debug(&format!("App: {} failure: {}", kind.label(), message));
                        Self::push_error(
                            &mut self.error,
                            format!("Failed to load topic: {}", message),
                        );
                    }
                    LoadOutcome::Stale => {
                        log_debug(&format!(
                            "App: discarded stale load of {} (generation {})",
                            request.location, request.generation
                        ));
                    }
                }
            }
            LoadMessage::Index { index, questions } => {
                let mut rng = rand::rng();
                if !self
                    .session
                    .complete_flashcard(&index, &questions, &mut rng)
                {
                    log_debug("App: discarded question index built for a stale catalog");
                    return;
                }
                if questions.is_empty() {
                    log_debug(&format!(
                        "App: {} failure: no questions available",
                        FailureKind::Aggregation.label()
                    ));
                    self.status = Some("No questions available for a random pick".to_string());
                } else {
                    self.status = Some(format!("Indexed {} question(s)", questions.len()));
                }
            }
            LoadMessage::WorkerFailed(message) => {
                log_debug(&format!("App: {}", message));
                Self::push_error(&mut self.error, message);
            }
        }
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.session.catalog_status() == CatalogStatus::Loading
            || self.session.document_status() == DocumentStatus::Loading
            || self.session.is_flashcard_pending()
    }

    /// Reads the crossterm events and updates the state of [`App`].
    fn handle_crossterm_events(&mut self, tick_rate: Duration) -> Result<()> {
        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key),
                Event::Mouse(_) => {}
                Event::Resize(_, _) => {}
                _ => {}
            }
            self.poll_load_messages();
        } else {
            self.on_tick();
        }
        Ok(())
    }

    fn on_tick(&mut self) {
        if self.is_loading() {
            self.loading_frame = (self.loading_frame + 1) % LOADING_FRAMES.len();
        }
        self.poll_load_messages();
    }

    /// Handles the key events and updates the state of [`App`].
    fn on_key_event(&mut self, key: KeyEvent) {
        if let (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) =
            (key.modifiers, key.code)
        {
            self.quit();
            return;
        }
        if self.session.is_flashcard_open() {
            FlashcardManager::new(self).handle_key(key);
            return;
        }
        if self.search_editing {
            QuestionsManager::new(self).handle_search_key(key);
            return;
        }

        match (key.modifiers, key.code) {
            (_, KeyCode::Esc | KeyCode::Char('q')) => self.quit(),
            (KeyModifiers::NONE, KeyCode::Tab) | (_, KeyCode::BackTab) => self.toggle_focus(),
            (KeyModifiers::NONE, KeyCode::Char('/')) => QuestionsManager::new(self).start_search(),
            (KeyModifiers::NONE, KeyCode::Char('c')) => QuestionsManager::new(self).collapse_all(),
            (KeyModifiers::NONE, KeyCode::Char('r')) => FlashcardManager::new(self).open(),
            (KeyModifiers::CONTROL, KeyCode::Char('r')) => self.reset_session(),
            (_, KeyCode::Char('R')) => self.reload_catalog(),
            _ => match self.focus {
                Focus::Topics => TopicsManager::new(self).handle_key(key),
                Focus::Questions => QuestionsManager::new(self).handle_key(key),
            },
        }
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Topics => Focus::Questions,
            Focus::Questions => Focus::Topics,
        };
    }

    /// Set running to false to quit the application.
    fn quit(&mut self) {
        self.running = false;
    }

    /// Append a message to an optional error slot.
    pub(crate) fn push_error(slot: &mut Option<String>, message: String) {
        if let Some(existing) = slot {
            existing.push_str(" | ");
            existing.push_str(&message);
        } else {
            *slot = Some(message);
        }
    }
}
