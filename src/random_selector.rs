use crate::question_index::FlattenedQuestion;
use rand::Rng;

/// Question text shown when there is nothing to draw from.
pub const RANDOM_QUESTION_ERROR: &str = "Error fetching random question.";

/// The question currently shown in the random-question modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flashcard {
    pub entry: FlattenedQuestion,
    pub answer_revealed: bool,
}

impl Flashcard {
    fn hidden(entry: FlattenedQuestion) -> Self {
        Self {
            entry,
            answer_revealed: false,
        }
    }

    /// Placeholder card rendered like any other when the index is empty.
    pub fn sentinel() -> Self {
        Self::hidden(FlattenedQuestion {
            question: RANDOM_QUESTION_ERROR.to_string(),
            ..FlattenedQuestion::default()
        })
    }

    pub fn is_sentinel(&self) -> bool {
        self.entry.question == RANDOM_QUESTION_ERROR && self.entry.topic.is_empty()
    }

    pub fn reveal(&mut self) {
        self.answer_revealed = true;
    }
}

/// Uniform random draws with a "no immediate repeat" rule for reshuffles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomSelector {
    max_attempts: usize,
}

impl RandomSelector {
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Draw any question; an empty index yields the sentinel card.
    pub fn pick<R: Rng + ?Sized>(&self, questions: &[FlattenedQuestion], rng: &mut R) -> Flashcard {
        match draw(questions, rng) {
            Some(entry) => Flashcard::hidden(entry.clone()),
            None => Flashcard::sentinel(),
        }
    }

    /// Draw a question whose text differs from `current`, unless no such question exists.
    pub fn next<R: Rng + ?Sized>(
        &self,
        questions: &[FlattenedQuestion],
        current: &FlattenedQuestion,
        rng: &mut R,
    ) -> Flashcard {
        let Some(mut candidate) = draw(questions, rng) else {
            return Flashcard::sentinel();
        };
        if questions.len() == 1 {
            return Flashcard::hidden(candidate.clone());
        }

        for _ in 1..self.max_attempts {
            if candidate.question != current.question {
                return Flashcard::hidden(candidate.clone());
            }
            if let Some(redrawn) = draw(questions, rng) {
                candidate = redrawn;
            }
        }
        if candidate.question != current.question {
            return Flashcard::hidden(candidate.clone());
        }

        // Duplicate-heavy sets: scan from a random offset for any different text.
        let start = rng.random_range(0..questions.len());
        let different = questions
            .iter()
            .cycle()
            .skip(start)
            .take(questions.len())
            .find(|entry| entry.question != current.question);
        Flashcard::hidden(different.unwrap_or(candidate).clone())
    }
}

impl Default for RandomSelector {
    fn default() -> Self {
        Self::new(16)
    }
}

fn draw<'a, R: Rng + ?Sized>(
    questions: &'a [FlattenedQuestion],
    rng: &mut R,
) -> Option<&'a FlattenedQuestion> {
    if questions.is_empty() {
        None
    } else {
        questions.get(rng.random_range(0..questions.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn entry(text: &str) -> FlattenedQuestion {
        FlattenedQuestion {
            question: text.to_string(),
            answer: format!("answer to {text}"),
            topic: "Topic".to_string(),
            ..FlattenedQuestion::default()
        }
    }

    #[test]
    fn pick_from_empty_index_returns_sentinel() {
        let mut rng = StdRng::seed_from_u64(7);
        let card = RandomSelector::default().pick(&[], &mut rng);

        assert!(card.is_sentinel());
        assert_eq!(card.entry.question, RANDOM_QUESTION_ERROR);
        assert!(card.entry.answer.is_empty());
        assert!(card.entry.topic.is_empty());
        assert!(!card.answer_revealed);
    }

    #[test]
    fn pick_opens_with_answer_hidden() {
        let mut rng = StdRng::seed_from_u64(7);
        let questions = vec![entry("Q1"), entry("Q2")];

        let card = RandomSelector::default().pick(&questions, &mut rng);

        assert!(questions.contains(&card.entry));
        assert!(!card.answer_revealed);
    }

    #[test]
    fn next_never_repeats_the_previous_question() {
        let mut rng = StdRng::seed_from_u64(42);
        let selector = RandomSelector::default();
        let questions = vec![entry("Q1"), entry("Q2"), entry("Q3")];

        let mut card = selector.pick(&questions, &mut rng);
        for _ in 0..200 {
            let next = selector.next(&questions, &card.entry, &mut rng);
            assert_ne!(next.entry.question, card.entry.question);
            card = next;
        }
    }

    #[test]
    fn next_with_single_question_returns_it_again() {
        let mut rng = StdRng::seed_from_u64(1);
        let selector = RandomSelector::default();
        let questions = vec![entry("Only")];

        let mut card = selector.pick(&questions, &mut rng);
        card.reveal();
        let next = selector.next(&questions, &card.entry, &mut rng);

        assert_eq!(next.entry.question, "Only");
        assert!(!next.answer_revealed);
    }

    #[test]
    fn next_falls_back_to_scan_for_duplicate_heavy_sets() {
        let mut rng = StdRng::seed_from_u64(3);
        let selector = RandomSelector::new(1);
        let mut questions: Vec<FlattenedQuestion> = (0..50).map(|_| entry("Same")).collect();
        questions.push(entry("Different"));

        for _ in 0..20 {
            let next = selector.next(&questions, &entry("Same"), &mut rng);
            assert_eq!(next.entry.question, "Different");
        }
    }

    #[test]
    fn next_returns_a_duplicate_when_every_text_matches() {
        let mut rng = StdRng::seed_from_u64(9);
        let questions = vec![entry("Same"), entry("Same")];

        let next = RandomSelector::default().next(&questions, &entry("Same"), &mut rng);

        assert_eq!(next.entry.question, "Same");
    }

    #[test]
    fn next_on_empty_index_returns_sentinel() {
        let mut rng = StdRng::seed_from_u64(5);
        let next = RandomSelector::default().next(&[], &entry("Q1"), &mut rng);
        assert!(next.is_sentinel());
    }
}
