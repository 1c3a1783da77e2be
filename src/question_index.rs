use std::sync::Arc;

use crate::{
    catalog::TopicFileRef,
    content_source::ContentSource,
    document::{Question, TopicDocument, load_document},
    log_util::log_debug,
};
use futures::future::join_all;
use tokio::sync::OnceCell;

/// A question tagged with the topic it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenedQuestion {
    pub id: Option<String>,
    pub question: String,
    pub answer: String,
    pub example: Option<String>,
    pub topic: String,
}

impl FlattenedQuestion {
    pub fn from_question(question: Question, topic: &str) -> Self {
        let Question {
            id,
            question,
            answer,
            example,
        } = question;
        Self {
            id,
            question,
            answer,
            example,
            topic: topic.to_string(),
        }
    }
}

/// Session-wide, write-once index of every question across the catalog.
///
/// Clones share the same cache. [`QuestionIndex::invalidate`] detaches this handle onto a fresh
/// cache so in-flight builds for the old catalog cannot populate it.
#[derive(Debug, Clone, Default)]
pub struct QuestionIndex {
    cell: Arc<OnceCell<Arc<Vec<FlattenedQuestion>>>>,
}

impl QuestionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return every known question, fetching and memoizing on first use.
    ///
    /// An empty catalog yields an empty list without memoizing it, since the catalog may not
    /// have arrived yet.
    pub async fn get_all_questions<S: ContentSource>(
        &self,
        source: &S,
        files: &[TopicFileRef],
    ) -> Arc<Vec<FlattenedQuestion>> {
        if let Some(questions) = self.cell.get() {
            return Arc::clone(questions);
        }
        if files.is_empty() {
            return Arc::new(Vec::new());
        }
        let questions = self
            .cell
            .get_or_init(|| async { Arc::new(build_index(source, files).await) })
            .await;
        Arc::clone(questions)
    }

    /// The memoized questions, if the index has been built.
    pub fn cached(&self) -> Option<Arc<Vec<FlattenedQuestion>>> {
        self.cell.get().cloned()
    }

    pub fn is_built(&self) -> bool {
        self.cell.initialized()
    }

    /// True when both handles point at the same cache generation.
    pub fn shares_cache_with(&self, other: &QuestionIndex) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    pub fn invalidate(&mut self) {
        self.cell = Arc::new(OnceCell::new());
    }
}

/// Fetch every document in parallel and flatten them in catalog order.
/// A document that fails to load contributes no questions.
pub async fn build_index<S: ContentSource>(
    source: &S,
    files: &[TopicFileRef],
) -> Vec<FlattenedQuestion> {
    let documents = join_all(files.iter().map(|file| async move {
        match load_document(source, &file.location).await {
            Ok(document) => Some(document),
            Err(err) => {
                log_debug(&format!(
                    "QuestionIndex: skipping {}: {:#}",
                    file.filename, err
                ));
                None
            }
        }
    }))
    .await;

    let questions = flatten_documents(files, documents);
    log_debug(&format!(
        "QuestionIndex: indexed {} question(s) from {} file(s)",
        questions.len(),
        files.len()
    ));
    questions
}

/// Tag each question with its document's topic, or the filename when the topic is empty.
pub fn flatten_documents(
    files: &[TopicFileRef],
    documents: Vec<Option<TopicDocument>>,
) -> Vec<FlattenedQuestion> {
    files
        .iter()
        .zip(documents)
        .filter_map(|(file, document)| document.map(|document| (file, document)))
        .flat_map(|(file, document)| {
            let topic = if document.topic.is_empty() {
                file.filename.clone()
            } else {
                document.topic
            };
            document
                .questions
                .into_iter()
                .map(move |question| FlattenedQuestion::from_question(question, &topic))
        })
        .collect()
}
