//! Statistical check of the question picker's uniformity
//!
//! 10 000 picks over three active matches, tested with Pearson's chi-square
//! at df = 2 and 95% confidence (critical value 5.991). The store's seed is
//! fixed so the outcome is reproducible.

use std::collections::HashMap;
use std::sync::Arc;

use pairsync::backend::questions::QuestionPicker;
use pairsync::backend::store::{MemoryQuestionStore, QuestionStore};
use pairsync::shared::{NewQuestion, SelectionCriterion};

const TRIALS: usize = 10_000;
const CRITICAL_DF2_P05: f64 = 5.991;

fn question(title: &str, complexity: &str, category: &str) -> NewQuestion {
    NewQuestion {
        title: title.to_string(),
        description: String::new(),
        category: vec![category.to_string()],
        complexity: complexity.to_string(),
    }
}

fn chi_square(counts: &HashMap<i64, usize>, buckets: usize, trials: usize) -> f64 {
    let expected = trials as f64 / buckets as f64;
    counts
        .values()
        .map(|observed| {
            let diff = *observed as f64 - expected;
            diff * diff / expected
        })
        .sum()
}

#[tokio::test]
async fn test_active_matches_are_picked_uniformly() {
    let store = Arc::new(MemoryQuestionStore::with_seed(20240101));
    let mut matching = Vec::new();
    for title in ["Two Sum", "Valid Anagram", "Group Anagrams"] {
        matching.push(store.insert(question(title, "Easy", "Hashing")).await.unwrap().question_id);
    }
    // noise that must never be picked
    store.insert(question("LRU Cache", "Hard", "Hashing")).await.unwrap();
    store.insert(question("Two Pointers", "Easy", "Arrays")).await.unwrap();
    let retired = store.insert(question("Old Hashing", "Easy", "Hashing")).await.unwrap();
    store.soft_delete(retired.question_id).await.unwrap();

    let picker = QuestionPicker::new(store);
    let criterion = SelectionCriterion::new("Easy", "Hashing");

    let mut counts: HashMap<i64, usize> = HashMap::new();
    for _ in 0..TRIALS {
        let id = picker.pick(&criterion).await.unwrap();
        *counts.entry(id).or_default() += 1;
    }

    let mut picked: Vec<i64> = counts.keys().copied().collect();
    picked.sort_unstable();
    assert_eq!(picked, matching);

    let statistic = chi_square(&counts, matching.len(), TRIALS);
    assert!(
        statistic < CRITICAL_DF2_P05,
        "chi-square {} exceeds {} for counts {:?}",
        statistic,
        CRITICAL_DF2_P05,
        counts
    );
}
