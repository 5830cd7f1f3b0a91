//! Property-based tests for the quorum vote.

use proptest::prelude::*;

use super::vote::{Consensus, strict_majority, unanimous, vote};

/// Small alphabet so that collisions (and therefore agreement) are common.
fn answer() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("4000".to_string()),
        Just("6300".to_string()),
        Just("6800".to_string()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// An agreed value always has at least the required votes and no other
    /// value has more.
    #[test]
    fn prop_agreed_value_meets_quorum(
        answers in prop::collection::vec(answer(), 1..8),
        required in 1usize..6,
    ) {
        if let Consensus::Agreed { value, votes } = vote(&answers, required) {
            prop_assert!(votes >= required);
            prop_assert!(!value.is_empty());
            prop_assert_eq!(answers.iter().filter(|a| **a == value).count(), votes);
            for other in &answers {
                prop_assert!(answers.iter().filter(|a| *a == other).count() <= votes);
            }
        }
    }

    /// With a unanimous quorum any dissent (including an empty answer) fails.
    #[test]
    fn prop_unanimous_fails_on_any_dissent(
        answers in prop::collection::vec(answer(), 2..7),
    ) {
        let all_same = answers.iter().all(|a| *a == answers[0]) && !answers[0].is_empty();
        prop_assert_eq!(vote(&answers, unanimous(answers.len())).is_agreed(), all_same);
    }

    /// A strict majority winner does not depend on the order of the answers.
    #[test]
    fn prop_majority_is_order_independent(
        answers in prop::collection::vec(answer(), 1..8),
    ) {
        let required = strict_majority(answers.len());
        let forward = vote(&answers, required).into_value();
        let mut reversed = answers.clone();
        reversed.reverse();
        prop_assert_eq!(forward, vote(&reversed, required).into_value());
    }
}
