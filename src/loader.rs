use std::{
    future::Future,
    sync::{
        Arc,
        mpsc::{self, Receiver, Sender},
    },
    thread,
};

use crate::{
    catalog::{self, TopicFileRef},
    content_source::ContentSource,
    document::{self, TopicDocument},
    log_util::log_debug,
    question_index::{FlattenedQuestion, QuestionIndex},
    session::DocumentRequest,
};
use color_eyre::eyre::Result;
use tokio::runtime::Runtime;

/// Results reported from background loads to the UI loop.
#[derive(Debug)]
pub enum LoadMessage {
    Catalog {
        generation: u64,
        result: Result<Vec<TopicFileRef>>,
    },
    Title {
        generation: u64,
        location: String,
        title: String,
    },
    Document {
        request: DocumentRequest,
        result: Result<TopicDocument>,
    },
    Index {
        index: QuestionIndex,
        questions: Arc<Vec<FlattenedQuestion>>,
    },
    WorkerFailed(String),
}

/// Runs fetches on background threads and reports back over a channel.
#[derive(Debug, Clone)]
pub struct Loader<S> {
    source: S,
    extension: String,
    sender: Sender<LoadMessage>,
}

impl<S> Loader<S>
where
    S: ContentSource + Clone + Send + 'static,
{
    pub fn new(source: S, extension: impl Into<String>) -> (Self, Receiver<LoadMessage>) {
        let (sender, receiver) = mpsc::channel();
        let loader = Self {
            source,
            extension: extension.into(),
            sender,
        };
        (loader, receiver)
    }

    /// Load the catalog, then resolve every title concurrently. Each title is sent as it settles.
    /// Every message carries `generation` so the session can drop superseded loads.
    pub fn spawn_catalog_load(&self, generation: u64) {
        let extension = self.extension.clone();
        self.spawn("catalog", move |source, sender| async move {
            let result = catalog::load_catalog(&source, &extension).await;
            let files = result.as_ref().ok().cloned().unwrap_or_default();
            if sender
                .send(LoadMessage::Catalog { generation, result })
                .is_err()
            {
                return;
            }
            catalog::resolve_titles(&source, &files, |file, title| {
                let _ = sender.send(LoadMessage::Title {
                    generation,
                    location: file.location.clone(),
                    title,
                });
            })
            .await;
        });
    }

    pub fn spawn_document_load(&self, request: DocumentRequest) {
        self.spawn("document", move |source, sender| async move {
            let result = document::load_document(&source, &request.location).await;
            let _ = sender.send(LoadMessage::Document { request, result });
        });
    }

    pub fn spawn_index_build(&self, index: QuestionIndex, files: Vec<TopicFileRef>) {
        self.spawn("index", move |source, sender| async move {
            let questions = index.get_all_questions(&source, &files).await;
            let _ = sender.send(LoadMessage::Index { index, questions });
        });
    }

    fn spawn<F, Fut>(&self, label: &'static str, task: F)
    where
        F: FnOnce(S, Sender<LoadMessage>) -> Fut + Send + 'static,
        Fut: Future<Output = ()>,
    {
        let source = self.source.clone();
        let sender = self.sender.clone();
        log_debug(&format!("Loader: starting {} task", label));
        thread::spawn(move || {
            let runtime = match Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    let _ = sender.send(LoadMessage::WorkerFailed(format!(
                        "Failed to build Tokio runtime for {} task: {}",
                        label, err
                    )));
                    return;
                }
            };
            runtime.block_on(task(source, sender));
            log_debug(&format!("Loader: {} task finished", label));
        });
    }
}
