//! Shuffling and sampling for session question lists.
//!
//! Shared by the practice and exam flows. All functions are pure with respect
//! to their inputs: they return fresh `Question` values and never mutate the
//! source list, so "retry same topic with a fresh shuffle" just calls them
//! again. Logic takes `&mut impl Rng` so tests can drive seeded generators;
//! the `fresh_*` wrappers use the thread-local RNG.

use rand::Rng;
use rand::seq::SliceRandom;
use rand::seq::index;

use exam_core::model::Question;

/// Returns a copy of the question with its options uniformly permuted.
///
/// The correct index of the copy points at the same option content as the
/// original's; content, not position, is authoritative.
#[must_use]
pub fn shuffle_options(question: &Question, rng: &mut impl Rng) -> Question {
    let mut order: Vec<usize> = (0..question.options().len()).collect();
    order.shuffle(rng);
    question
        .with_option_order(&order)
        .expect("shuffled indices form a permutation")
}

/// Uniformly permutes question order.
#[must_use]
pub fn shuffle_questions(mut questions: Vec<Question>, rng: &mut impl Rng) -> Vec<Question> {
    questions.shuffle(rng);
    questions
}

/// Takes a uniformly-random subset of `count` questions without replacement.
///
/// Sampling happens over the whole source list, not a truncated prefix, so no
/// bias toward the front survives. When `count` covers the list, the whole
/// list is returned in source order.
#[must_use]
pub fn sample(questions: &[Question], count: usize, rng: &mut impl Rng) -> Vec<Question> {
    if count >= questions.len() {
        return questions.to_vec();
    }
    index::sample(rng, questions.len(), count)
        .iter()
        .map(|i| questions[i].clone())
        .collect()
}

/// Full session draw: subset sample, then order shuffle, then per-question
/// option shuffle.
#[must_use]
pub fn draw(questions: &[Question], count: usize, rng: &mut impl Rng) -> Vec<Question> {
    let subset = sample(questions, count, rng);
    shuffle_questions(subset, rng)
        .into_iter()
        .map(|q| shuffle_options(&q, rng))
        .collect()
}

/// [`draw`] with the thread-local RNG.
#[must_use]
pub fn fresh_draw(questions: &[Question], count: usize) -> Vec<Question> {
    let mut rng = rand::rng();
    draw(questions, count, &mut rng)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::QuestionId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn build_question(id: u64, correct: usize) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}?"),
            vec![
                format!("opt-{id}-0"),
                format!("opt-{id}-1"),
                format!("opt-{id}-2"),
                format!("opt-{id}-3"),
            ],
            correct,
            "why",
            "Topic",
        )
        .unwrap()
    }

    #[test]
    fn option_shuffle_preserves_correct_content_across_seeds() {
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let q = build_question(seed, (seed % 4) as usize);
            let correct_text = q.correct_option().to_string();

            let shuffled = shuffle_options(&q, &mut rng);
            assert_eq!(
                shuffled.options()[shuffled.correct_index()],
                correct_text,
                "seed {seed}"
            );

            let mut sorted_before = q.options().to_vec();
            let mut sorted_after = shuffled.options().to_vec();
            sorted_before.sort();
            sorted_after.sort();
            assert_eq!(sorted_before, sorted_after, "seed {seed}");
        }
    }

    #[test]
    fn sample_is_without_replacement() {
        let source: Vec<Question> = (0..10).map(|i| build_question(i, 0)).collect();
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = sample(&source, 4, &mut rng);
            assert_eq!(picked.len(), 4, "seed {seed}");

            let mut ids: Vec<u64> = picked.iter().map(|q| q.id().value()).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), 4, "duplicate origin at seed {seed}");
        }
    }

    #[test]
    fn sample_returns_everything_when_count_covers_list() {
        let source: Vec<Question> = (0..3).map(|i| build_question(i, 0)).collect();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(sample(&source, 3, &mut rng).len(), 3);
        assert_eq!(sample(&source, 10, &mut rng).len(), 3);
    }

    #[test]
    fn draw_keeps_size_and_origin_distinctness() {
        let source: Vec<Question> = (0..8).map(|i| build_question(i, (i % 4) as usize)).collect();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let drawn = draw(&source, 5, &mut rng);
            assert_eq!(drawn.len(), 5);

            for q in &drawn {
                let original = source
                    .iter()
                    .find(|s| s.id() == q.id())
                    .expect("drawn question originates from the source");
                assert_eq!(q.correct_option(), original.correct_option(), "seed {seed}");
            }
        }
    }

    #[test]
    fn draw_leaves_source_untouched() {
        let source: Vec<Question> = (0..4).map(|i| build_question(i, 1)).collect();
        let snapshot = source.clone();
        let mut rng = StdRng::seed_from_u64(42);
        let _ = draw(&source, 2, &mut rng);
        assert_eq!(source, snapshot);
    }
}
