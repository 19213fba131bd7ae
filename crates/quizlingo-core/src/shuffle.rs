//! Per-session option display order.
//!
//! A display order is a permutation of a question's option positions:
//! `order[display_position] == authored_position`. Options themselves are
//! never copied or rewritten, so every displayed option still credits the
//! `result_index` it was authored with.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::model::QuizDefinition;

/// Draws uniform display orders. One shuffler belongs to one session.
pub struct OptionShuffler {
    rng: StdRng,
}

impl OptionShuffler {
    /// A shuffler seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// A reproducible shuffler.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A uniformly random permutation of `0..option_count`.
    pub fn display_order(&mut self, option_count: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..option_count).collect();
        // Fisher-Yates
        order.shuffle(&mut self.rng);
        order
    }

    /// Display orders for every question of `quiz`, drawn independently.
    pub fn shuffle_quiz(&mut self, quiz: &QuizDefinition) -> Vec<Vec<usize>> {
        quiz.questions()
            .iter()
            .map(|q| self.display_order(q.options.len()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use super::*;
    use crate::model::{OptionRecord, QuestionRecord, QuizRecord};

    fn quiz(option_indices: &[i64]) -> QuizDefinition {
        QuizDefinition::from_record(
            1,
            QuizRecord {
                id: None,
                title: "Shuffle".into(),
                result_names: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                questions: vec![QuestionRecord {
                    text: "Pick".into(),
                    options: option_indices
                        .iter()
                        .map(|&result_index| OptionRecord {
                            text: format!("opt {result_index}"),
                            result_index,
                        })
                        .collect(),
                }],
                author: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn display_order_is_a_bijection() {
        let quiz = quiz(&[3, 1, 1, 0]);
        let mut shuffler = OptionShuffler::seeded(42);
        for _ in 0..50 {
            let order = &shuffler.shuffle_quiz(&quiz)[0];
            let mut sorted = order.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, vec![0, 1, 2, 3]);

            let options = &quiz.questions()[0].options;
            let mut before: Vec<usize> = options.iter().map(|o| o.result_index).collect();
            let mut after: Vec<usize> = order.iter().map(|&i| options[i].result_index).collect();
            before.sort_unstable();
            after.sort_unstable();
            assert_eq!(before, after);
        }
    }

    #[test]
    fn independent_sessions_differ() {
        let quiz = quiz(&[0, 1, 2, 3]);
        let orders: HashSet<Vec<usize>> = (0..100)
            .map(|_| OptionShuffler::from_entropy().shuffle_quiz(&quiz).remove(0))
            .collect();
        assert!(
            orders.len() > 1,
            "100 independent sessions produced a single order"
        );
    }

    #[test]
    fn permutations_are_roughly_uniform() {
        let mut shuffler = OptionShuffler::seeded(7);
        let trials = 6_000;
        let mut freq: HashMap<Vec<usize>, u32> = HashMap::new();
        for _ in 0..trials {
            *freq.entry(shuffler.display_order(3)).or_default() += 1;
        }
        assert_eq!(freq.len(), 6, "every permutation of 3 options is reachable");
        for (perm, count) in &freq {
            assert!(
                (800..=1200).contains(count),
                "permutation {perm:?} drawn {count} times out of {trials}"
            );
        }
    }

    #[test]
    fn empty_and_single_option_orders() {
        let mut shuffler = OptionShuffler::seeded(1);
        assert!(shuffler.display_order(0).is_empty());
        assert_eq!(shuffler.display_order(1), vec![0]);
    }
}
