//! Property-based tests for the document replica
//!
//! Two replicas make arbitrary local edits, exchange their fragments in an
//! arbitrary order with duplicates, and must end with identical text.

use pairsync::client::DocumentState;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Edit {
    Insert { at: u32, text: String },
    Delete { at: u32, len: u32 },
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        3 => (0u32..40, "[a-z ]{1,6}").prop_map(|(at, text)| Edit::Insert { at, text }),
        1 => (0u32..40, 1u32..5).prop_map(|(at, len)| Edit::Delete { at, len }),
    ]
}

fn apply_local(doc: &mut DocumentState, edit: &Edit) -> Option<Vec<u8>> {
    match edit {
        Edit::Insert { at, text } => doc.insert(*at, text),
        Edit::Delete { at, len } => doc.delete(*at, *len),
    }
}

proptest! {
    #[test]
    fn test_replicas_converge(
        seed in "[a-z]{0,12}",
        edits_a in prop::collection::vec(edit(), 0..12),
        edits_b in prop::collection::vec(edit(), 0..12),
        order in prop::collection::vec(any::<prop::sample::Index>(), 0..24),
    ) {
        let mut origin = DocumentState::new();
        origin.insert(0, &seed);
        let snapshot = origin.encode();

        let mut a = DocumentState::decode(&snapshot);
        let mut b = DocumentState::decode(&snapshot);

        let from_a: Vec<Vec<u8>> = edits_a.iter().filter_map(|e| apply_local(&mut a, e)).collect();
        let from_b: Vec<Vec<u8>> = edits_b.iter().filter_map(|e| apply_local(&mut b, e)).collect();

        // deliver in a shuffled order, with repeats, then everything once more
        for index in &order {
            if !from_b.is_empty() {
                a.apply_remote_update(index.get::<Vec<u8>>(&from_b)).unwrap();
            }
            if !from_a.is_empty() {
                b.apply_remote_update(index.get::<Vec<u8>>(&from_a)).unwrap();
            }
        }
        for update in from_b.iter().rev() {
            a.apply_remote_update(update).unwrap();
        }
        for update in from_a.iter().rev() {
            b.apply_remote_update(update).unwrap();
        }

        prop_assert_eq!(a.text(), b.text());
    }

    #[test]
    fn test_decode_is_idempotent(
        text in "[a-zA-Z0-9 (){};]{0,40}",
        cut in 0u32..40,
    ) {
        let mut doc = DocumentState::new();
        doc.insert(0, &text);
        doc.delete(cut, 3);

        let once = DocumentState::decode(&doc.encode());
        let twice = DocumentState::decode(&once.encode());
        prop_assert_eq!(once.text(), doc.text());
        prop_assert_eq!(twice.text(), once.text());
    }
}
