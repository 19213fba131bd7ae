//! Score tallying and winner selection.
//!
//! Winner selection is pure: the same score vector always yields the same
//! category. Ties go to the lowest category index.

use serde::{Deserialize, Serialize};

use crate::model::ResultCategory;

/// Running tally with one counter per result category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreVector {
    counts: Vec<u32>,
}

impl ScoreVector {
    /// A zeroed vector for `categories` result categories.
    pub fn zeroed(categories: usize) -> Self {
        Self {
            counts: vec![0; categories],
        }
    }

    /// Credit one answer to `index`. Returns `false` (and changes nothing)
    /// if `index` is out of range.
    pub fn record(&mut self, index: usize) -> bool {
        match self.counts.get_mut(index) {
            Some(count) => {
                *count += 1;
                true
            }
            None => false,
        }
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of answers recorded.
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Index of the winning category for this tally.
    pub fn winner_index(&self) -> usize {
        winner_index(&self.counts)
    }
}

/// Index of the first maximum in `scores`; `0` for an empty slice.
pub fn winner_index(scores: &[u32]) -> usize {
    let Some(&max) = scores.iter().max() else {
        return 0;
    };
    scores.iter().position(|&s| s == max).unwrap_or(0)
}

/// Pick the winning category for a completed score vector.
///
/// The winner is the category with the highest score; among equal scores
/// the lowest index wins. An all-zero vector therefore yields category 0.
/// Returns `None` only when `categories` is empty.
pub fn determine_winner<'a>(
    scores: &[u32],
    categories: &'a [ResultCategory],
) -> Option<&'a ResultCategory> {
    categories.get(winner_index(scores))
}
