//! Property-based tests for the linked list using proptest
//!
//! These tests drive the list with arbitrary operation sequences and check
//! it against a `VecDeque` model, plus a couple of standalone invariants.

use super::ConcurrentLinkedList;
use proptest::prelude::*;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
enum Op {
    PushFront(i32),
    PushBack(i32),
    PopFront,
    RemoveValue(i32),
    Contains(i32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    // Small value domain so removals and lookups actually hit
    let value = -8i32..8;
    prop_oneof![
        value.clone().prop_map(Op::PushFront),
        value.clone().prop_map(Op::PushBack),
        Just(Op::PopFront),
        value.clone().prop_map(Op::RemoveValue),
        value.prop_map(Op::Contains),
    ]
}

proptest! {
    #[test]
    fn test_matches_vecdeque_model(ops in prop::collection::vec(op_strategy(), 1..200)) {
        let list = ConcurrentLinkedList::new();
        let mut model: VecDeque<i32> = VecDeque::new();

        for op in ops {
            match op {
                Op::PushFront(value) => {
                    list.push_front(value);
                    model.push_front(value);
                }
                Op::PushBack(value) => {
                    list.push_back(value);
                    model.push_back(value);
                }
                Op::PopFront => {
                    prop_assert_eq!(list.pop_front(), model.pop_front());
                }
                Op::RemoveValue(value) => {
                    let model_removed = match model.iter().position(|v| *v == value) {
                        Some(position) => {
                            model.remove(position);
                            true
                        }
                        None => false,
                    };
                    prop_assert_eq!(list.remove_value(&value), model_removed);
                }
                Op::Contains(value) => {
                    prop_assert_eq!(list.contains(&value), model.contains(&value));
                }
            }
            prop_assert_eq!(list.len(), model.len());
        }

        // Drain both and compare the full remaining sequence
        while let Some(expected) = model.pop_front() {
            prop_assert_eq!(list.pop_front(), Some(expected));
        }
        prop_assert_eq!(list.pop_front(), None);
        prop_assert!(list.is_empty());
    }

    #[test]
    fn test_push_back_then_pop_front_is_identity(values in prop::collection::vec(any::<i32>(), 0..100)) {
        let list = ConcurrentLinkedList::new();
        for &value in &values {
            list.push_back(value);
        }
        let mut drained = Vec::with_capacity(values.len());
        while let Some(value) = list.pop_front() {
            drained.push(value);
        }
        prop_assert_eq!(drained, values);
    }

    #[test]
    fn test_push_front_reverses(values in prop::collection::vec(any::<i32>(), 0..100)) {
        let list = ConcurrentLinkedList::new();
        for &value in &values {
            list.push_front(value);
        }
        let mut drained = Vec::with_capacity(values.len());
        while let Some(value) = list.pop_front() {
            drained.push(value);
        }
        let mut reversed = values;
        reversed.reverse();
        prop_assert_eq!(drained, reversed);
    }
}
