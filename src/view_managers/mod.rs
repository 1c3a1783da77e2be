pub mod flashcard_manager;
pub mod questions_manager;
pub mod topics_manager;

pub(crate) use flashcard_manager::FlashcardManager;
pub(crate) use questions_manager::QuestionsManager;
pub(crate) use topics_manager::TopicsManager;
