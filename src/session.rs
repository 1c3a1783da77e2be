use std::collections::HashMap;

use crate::{
    accordion::Accordion,
    catalog::TopicFileRef,
    document::TopicDocument,
    failure::FailureKind,
    question_index::{FlattenedQuestion, QuestionIndex},
    random_selector::{Flashcard, RandomSelector},
    search::{FilteredQuestion, filter_questions},
};
use color_eyre::eyre::Result;
use rand::Rng;

/// Title rendered for a topic whose title lookup has not settled yet.
pub const PENDING_TITLE: &str = "Loading...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogStatus {
    Loading,
    Ready,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    Idle,
    Loading,
    Ready,
    Degraded,
}

/// Identity of one document load. Completions are committed only while it is still current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRequest {
    pub location: String,
    pub generation: u64,
}

#[derive(Debug)]
pub enum CatalogOutcome {
    /// The catalog was applied; `request` is set when the first topic must now be loaded.
    Ready { request: Option<DocumentRequest> },
    Unavailable { kind: FailureKind, message: String },
    /// The listing belongs to a catalog load that a reload or reset has superseded.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    Degraded { kind: FailureKind, message: String },
    Stale,
}

/// All state for one viewing session: catalog, titles, selection, active document,
/// search, accordion, flashcard and the shared question index.
#[derive(Debug)]
pub struct Session {
    catalog: Vec<TopicFileRef>,
    catalog_status: CatalogStatus,
    titles: HashMap<String, String>,
    catalog_generation: u64,
    selected: Option<String>,
    generation: u64,
    document: TopicDocument,
    document_status: DocumentStatus,
    search_term: String,
    accordion: Accordion,
    index: QuestionIndex,
    selector: RandomSelector,
    flashcard: Option<Flashcard>,
    flashcard_pending: bool,
}

impl Session {
    pub fn new(selector: RandomSelector) -> Self {
        Self {
            catalog: Vec::new(),
            catalog_status: CatalogStatus::Loading,
            titles: HashMap::new(),
            catalog_generation: 0,
            selected: None,
            generation: 0,
            document: TopicDocument::placeholder(),
            document_status: DocumentStatus::Idle,
            search_term: String::new(),
            accordion: Accordion::default(),
            index: QuestionIndex::new(),
            selector,
            flashcard: None,
            flashcard_pending: false,
        }
    }

    /// Reset to a fresh session. Outstanding requests become stale.
    pub fn initialize(&mut self) {
        let generation = self.generation;
        let catalog_generation = self.catalog_generation;
        *self = Self::new(self.selector);
        self.generation = generation + 1;
        self.catalog_generation = catalog_generation + 1;
    }

    /// Drop everything derived from the catalog ahead of a reload.
    pub fn invalidate(&mut self) {
        self.catalog.clear();
        self.catalog_status = CatalogStatus::Loading;
        self.titles.clear();
        self.catalog_generation += 1;
        self.index.invalidate();
        self.flashcard_pending = false;
    }

    pub fn catalog(&self) -> &[TopicFileRef] {
        &self.catalog
    }

    pub fn catalog_status(&self) -> CatalogStatus {
        self.catalog_status
    }

    /// Stamp for the next catalog load. Listings and titles from older stamps are discarded.
    pub fn catalog_generation(&self) -> u64 {
        self.catalog_generation
    }

    pub fn apply_catalog(
        &mut self,
        generation: u64,
        result: Result<Vec<TopicFileRef>>,
    ) -> CatalogOutcome {
        if generation != self.catalog_generation {
            return CatalogOutcome::Stale;
        }
        match result {
            Ok(files) => {
                self.catalog = files;
                self.catalog_status = CatalogStatus::Ready;
                let first = self.catalog.first().map(|file| file.location.clone());
                let request = first.and_then(|location| self.select_topic(&location));
                CatalogOutcome::Ready { request }
            }
            Err(err) => {
                self.catalog.clear();
                self.catalog_status = CatalogStatus::Unavailable;
                CatalogOutcome::Unavailable {
                    kind: FailureKind::Network,
                    message: format!("{:#}", err),
                }
            }
        }
    }

    /// Store a resolved title. Returns false when it came from a superseded catalog load.
    pub fn record_title(
        &mut self,
        generation: u64,
        location: impl Into<String>,
        title: impl Into<String>,
    ) -> bool {
        if generation != self.catalog_generation {
            return false;
        }
        self.titles.insert(location.into(), title.into());
        true
    }

    pub fn title_for(&self, file: &TopicFileRef) -> &str {
        self.titles
            .get(&file.location)
            .map(String::as_str)
            .unwrap_or(PENDING_TITLE)
    }

    pub fn selected_location(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_position(&self) -> Option<usize> {
        let selected = self.selected.as_deref()?;
        self.catalog
            .iter()
            .position(|file| file.location == selected)
    }

    /// Make `location` the active topic. Returns the load to start, or `None` when the topic
    /// is already selected (only its open rows are collapsed).
    pub fn select_topic(&mut self, location: &str) -> Option<DocumentRequest> {
        self.accordion.clear();
        if self.selected.as_deref() == Some(location) {
            return None;
        }

        self.generation += 1;
        self.selected = Some(location.to_string());
        self.document = TopicDocument::placeholder();
        self.document_status = DocumentStatus::Loading;
        self.search_term.clear();
        Some(DocumentRequest {
            location: location.to_string(),
            generation: self.generation,
        })
    }

    pub fn is_current(&self, request: &DocumentRequest) -> bool {
        request.generation == self.generation
            && self.selected.as_deref() == Some(request.location.as_str())
    }

    /// Commit a finished document load unless a newer selection has superseded it.
    pub fn commit_document(
        &mut self,
        request: &DocumentRequest,
        result: Result<TopicDocument>,
    ) -> LoadOutcome {
        if !self.is_current(request) {
            return LoadOutcome::Stale;
        }

        self.accordion.clear();
        self.search_term.clear();
        match result {
            Ok(document) => {
                self.document = document;
                self.document_status = DocumentStatus::Ready;
                LoadOutcome::Applied
            }
            Err(err) => {
                self.document = TopicDocument::load_failed();
                self.document_status = DocumentStatus::Degraded;
                LoadOutcome::Degraded {
                    kind: FailureKind::Content,
                    message: format!("{:#}", err),
                }
            }
        }
    }

    pub fn document(&self) -> &TopicDocument {
        &self.document
    }

    pub fn document_status(&self) -> DocumentStatus {
        self.document_status
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    pub fn push_search_char(&mut self, ch: char) {
        self.search_term.push(ch);
    }

    pub fn pop_search_char(&mut self) {
        self.search_term.pop();
    }

    pub fn filtered_questions(&self) -> Vec<FilteredQuestion<'_>> {
        filter_questions(&self.document.questions, &self.search_term)
    }

    pub fn accordion(&self) -> &Accordion {
        &self.accordion
    }

    pub fn toggle_question(&mut self, index: usize) {
        self.accordion.toggle(index);
    }

    pub fn collapse_all(&mut self) {
        let visible = self.filtered_questions().len();
        self.accordion.collapse_all(visible);
    }

    pub fn question_index(&self) -> &QuestionIndex {
        &self.index
    }

    pub fn flashcard(&self) -> Option<&Flashcard> {
        self.flashcard.as_ref()
    }

    pub fn is_flashcard_pending(&self) -> bool {
        self.flashcard_pending
    }

    pub fn is_flashcard_open(&self) -> bool {
        self.flashcard.is_some() || self.flashcard_pending
    }

    /// Open the random-question modal. Returns the index handle to build when it is not
    /// cached yet; the card is shown once [`Session::complete_flashcard`] receives it.
    pub fn open_flashcard<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<QuestionIndex> {
        if let Some(questions) = self.index.cached() {
            self.flashcard = Some(self.selector.pick(&questions, rng));
            return None;
        }
        if self.catalog.is_empty() {
            self.flashcard = Some(self.selector.pick(&[], rng));
            return None;
        }
        self.flashcard = None;
        self.flashcard_pending = true;
        Some(self.index.clone())
    }

    /// Deliver a built index. Returns false when the index belongs to an invalidated catalog.
    pub fn complete_flashcard<R: Rng + ?Sized>(
        &mut self,
        index: &QuestionIndex,
        questions: &[FlattenedQuestion],
        rng: &mut R,
    ) -> bool {
        if !self.index.shares_cache_with(index) {
            return false;
        }
        if self.flashcard_pending {
            self.flashcard_pending = false;
            self.flashcard = Some(self.selector.pick(questions, rng));
        }
        true
    }

    /// Draw another card, avoiding the one on screen.
    pub fn reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let Some(current) = self.flashcard.as_ref() else {
            return;
        };
        let questions = self.index.cached().unwrap_or_default();
        self.flashcard = Some(self.selector.next(&questions, &current.entry, rng));
    }

    pub fn reveal_answer(&mut self) {
        if let Some(card) = self.flashcard.as_mut() {
            card.reveal();
        }
    }

    pub fn close_flashcard(&mut self) {
        self.flashcard = None;
        self.flashcard_pending = false;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(RandomSelector::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        content_source::fake::FakeSource,
        document::{ERROR_LOADING_TOPIC, Question},
        random_selector::RANDOM_QUESTION_ERROR,
    };
    use color_eyre::eyre::eyre;
    use rand::{SeedableRng, rngs::StdRng};

    fn file(name: &str) -> TopicFileRef {
        TopicFileRef {
            location: FakeSource::location(name),
            filename: name.to_string(),
        }
    }

    fn document(topic: &str, questions: &[&str]) -> TopicDocument {
        TopicDocument {
            topic: topic.to_string(),
            questions: questions
                .iter()
                .map(|text| Question {
                    question: text.to_string(),
                    answer: format!("{text} answer"),
                    ..Question::default()
                })
                .collect(),
        }
    }

    fn ready_session(files: &[&str]) -> (Session, Option<DocumentRequest>) {
        let mut session = Session::default();
        let generation = session.catalog_generation();
        let outcome = session.apply_catalog(
            generation,
            Ok(files.iter().map(|name| file(name)).collect()),
        );
        match outcome {
            CatalogOutcome::Ready { request } => (session, request),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn catalog_failure_leaves_no_topics() {
        let mut session = Session::default();

        let outcome = session.apply_catalog(0, Err(eyre!("connection refused")));

        assert!(matches!(
            outcome,
            CatalogOutcome::Unavailable {
                kind: FailureKind::Network,
                ..
            }
        ));
        assert!(session.catalog().is_empty());
        assert_eq!(session.catalog_status(), CatalogStatus::Unavailable);
    }

    #[test]
    fn first_catalog_entry_supersedes_default_selection() {
        let mut session = Session::default();
        let default_request = session.select_topic("https://cdn.example.test/oops.json");
        assert!(default_request.is_some());

        let outcome = session.apply_catalog(0, Ok(vec![file("a.json"), file("b.json")]));

        let CatalogOutcome::Ready {
            request: Some(request),
        } = outcome
        else {
            panic!("expected the first topic to be requested");
        };
        assert_eq!(request.location, FakeSource::location("a.json"));
        assert_eq!(session.selected_position(), Some(0));

        let stale = session.commit_document(
            &default_request.unwrap(),
            Ok(document("Default", &["stale"])),
        );
        assert_eq!(stale, LoadOutcome::Stale);
        assert!(session.document().questions.is_empty());
    }

    #[test]
    fn catalog_whose_first_entry_is_already_selected_does_not_reload() {
        let mut session = Session::default();
        session.select_topic(&FakeSource::location("a.json"));

        let outcome = session.apply_catalog(0, Ok(vec![file("a.json")]));

        assert!(matches!(outcome, CatalogOutcome::Ready { request: None }));
    }

    #[test]
    fn titles_are_pending_until_recorded() {
        let (mut session, _) = ready_session(&["a.json"]);
        let a = file("a.json");

        assert_eq!(session.title_for(&a), PENDING_TITLE);
        assert!(session.record_title(0, a.location.clone(), "Delegates"));
        assert_eq!(session.title_for(&a), "Delegates");
    }

    #[test]
    fn catalog_from_before_a_reset_is_discarded() {
        let mut session = Session::default();
        let old = session.catalog_generation();

        session.initialize();
        let current = session.catalog_generation();
        session.apply_catalog(current, Ok(vec![file("a.json")]));
        let outcome = session.apply_catalog(old, Err(eyre!("connection refused")));

        assert!(matches!(outcome, CatalogOutcome::Stale));
        assert_eq!(session.catalog(), &[file("a.json")]);
        assert_eq!(session.catalog_status(), CatalogStatus::Ready);
        assert_eq!(
            session.selected_location(),
            Some(FakeSource::location("a.json").as_str())
        );
    }

    #[test]
    fn titles_from_before_a_reload_are_discarded() {
        let (mut session, _) = ready_session(&["a.json"]);
        let old = session.catalog_generation();
        let a = file("a.json");

        session.invalidate();
        let current = session.catalog_generation();
        session.apply_catalog(current, Ok(vec![a.clone()]));

        assert!(!session.record_title(old, a.location.clone(), "Old title"));
        assert_eq!(session.title_for(&a), PENDING_TITLE);
        assert!(matches!(
            session.apply_catalog(old, Ok(Vec::new())),
            CatalogOutcome::Stale
        ));
        assert_eq!(session.catalog().len(), 1);
    }

    #[test]
    fn selecting_a_topic_shows_placeholder_and_resets_view_state() {
        let (mut session, request) = ready_session(&["a.json", "b.json"]);
        session.commit_document(&request.unwrap(), Ok(document("A", &["Q1", "Q2"])));
        session.toggle_question(1);
        session.set_search_term("Q");

        let request = session.select_topic(&FakeSource::location("b.json"));

        assert!(request.is_some());
        assert_eq!(session.document(), &TopicDocument::placeholder());
        assert_eq!(session.document_status(), DocumentStatus::Loading);
        assert!(!session.accordion().any_open());
        assert!(session.search_term().is_empty());
    }

    #[test]
    fn stale_document_never_overwrites_newer_selection() {
        let (mut session, _) = ready_session(&["x.json", "y.json"]);
        let y = session
            .select_topic(&FakeSource::location("y.json"))
            .unwrap();
        let x = session
            .select_topic(&FakeSource::location("x.json"))
            .unwrap();

        assert_eq!(
            session.commit_document(&x, Ok(document("X", &["from x"]))),
            LoadOutcome::Applied
        );
        assert_eq!(
            session.commit_document(&y, Ok(document("Y", &["from y"]))),
            LoadOutcome::Stale
        );

        assert_eq!(session.document().topic, "X");
        assert_eq!(session.document().questions[0].question, "from x");
    }

    #[test]
    fn reselecting_a_topic_discards_the_older_load_of_it() {
        let (mut session, first) = ready_session(&["a.json", "b.json"]);
        let first = first.unwrap();
        session.select_topic(&FakeSource::location("b.json"));
        let again = session
            .select_topic(&FakeSource::location("a.json"))
            .unwrap();

        assert_eq!(
            session.commit_document(&first, Ok(document("old", &[]))),
            LoadOutcome::Stale
        );
        assert!(session.is_current(&again));
    }

    #[test]
    fn failed_document_becomes_degraded_placeholder() {
        let (mut session, request) = ready_session(&["a.json"]);

        let outcome = session.commit_document(&request.unwrap(), Err(eyre!("invalid JSON")));

        assert!(matches!(
            outcome,
            LoadOutcome::Degraded {
                kind: FailureKind::Content,
                ..
            }
        ));
        assert_eq!(session.document().topic, ERROR_LOADING_TOPIC);
        assert!(session.document().questions.is_empty());
        assert_eq!(session.document_status(), DocumentStatus::Degraded);
    }

    #[test]
    fn open_rows_are_positional_across_topic_switches() {
        let (mut session, request) = ready_session(&["a.json", "b.json"]);
        session.commit_document(&request.unwrap(), Ok(document("A", &["A first", "A second"])));
        session.toggle_question(0);
        let opened_before = session.filtered_questions()[0].question.question.clone();

        let request = session
            .select_topic(&FakeSource::location("b.json"))
            .unwrap();
        session.commit_document(&request, Ok(document("B", &["B first"])));
        assert!(!session.accordion().is_open(0));
        session.toggle_question(0);

        let opened_after = session.filtered_questions()[0].question.question.clone();
        assert!(session.accordion().is_open(0));
        assert_ne!(opened_before, opened_after);
    }

    #[test]
    fn collapse_all_uses_filtered_rows() {
        let (mut session, request) = ready_session(&["a.json"]);
        session.commit_document(
            &request.unwrap(),
            Ok(document("A", &["Polymorphism", "Encapsulation", "Inheritance"])),
        );
        session.toggle_question(0);
        session.toggle_question(2);
        session.set_search_term("poly");

        session.collapse_all();

        assert!(!session.accordion().is_open(0));
        assert!(session.accordion().is_open(2));
    }

    #[test]
    fn flashcard_on_empty_catalog_is_the_sentinel() {
        let mut session = Session::default();
        session.apply_catalog(0, Ok(Vec::new()));
        let mut rng = StdRng::seed_from_u64(11);

        assert!(session.open_flashcard(&mut rng).is_none());

        let card = session.flashcard().unwrap();
        assert_eq!(card.entry.question, RANDOM_QUESTION_ERROR);
        assert!(!card.answer_revealed);
    }

    #[tokio::test]
    async fn flashcard_waits_for_index_then_reshuffles_without_repeats() {
        let source = FakeSource::new()
            .with_file("a.json")
            .with_document("a.json", document("A", &["Q1", "Q2", "Q3"]));
        let (mut session, _) = ready_session(&["a.json"]);
        let mut rng = StdRng::seed_from_u64(21);

        let index = session.open_flashcard(&mut rng).unwrap();
        assert!(session.is_flashcard_pending());
        let questions = index.get_all_questions(&source, session.catalog()).await;
        assert!(session.complete_flashcard(&index, &questions, &mut rng));

        session.reveal_answer();
        assert!(session.flashcard().unwrap().answer_revealed);
        let previous = session.flashcard().unwrap().entry.question.clone();
        session.reshuffle(&mut rng);
        let card = session.flashcard().unwrap();
        assert_ne!(card.entry.question, previous);
        assert!(!card.answer_revealed);
        assert_eq!(card.entry.topic, "A");

        session.close_flashcard();
        assert!(session.open_flashcard(&mut rng).is_none());
        assert!(session.flashcard().is_some());
    }

    #[tokio::test]
    async fn index_built_for_an_invalidated_catalog_is_discarded() {
        let source = FakeSource::new()
            .with_file("a.json")
            .with_document("a.json", document("A", &["Q1"]));
        let (mut session, _) = ready_session(&["a.json"]);
        let mut rng = StdRng::seed_from_u64(4);

        let index = session.open_flashcard(&mut rng).unwrap();
        session.invalidate();
        let questions = index.get_all_questions(&source, &[file("a.json")]).await;

        assert!(!session.complete_flashcard(&index, &questions, &mut rng));
        assert!(session.flashcard().is_none());
        assert!(session.question_index().cached().is_none());
        assert_eq!(session.catalog_status(), CatalogStatus::Loading);
    }

    #[test]
    fn initialize_makes_outstanding_requests_stale() {
        let (mut session, request) = ready_session(&["a.json"]);
        let request = request.unwrap();

        session.initialize();
        session.select_topic(&request.location);

        assert_eq!(
            session.commit_document(&request, Ok(document("A", &[]))),
            LoadOutcome::Stale
        );
    }
}
