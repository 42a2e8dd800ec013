//! Property tests for the dependent-toggle invariant.
//!
//! Over arbitrary operation sequences, every reachable `ToggleState`
//! satisfies `shura_mode ⇒ check_in`, and rejected operations change
//! nothing.

use proptest::prelude::*;
use shura_core::toggle::{ToggleError, ToggleState};

#[derive(Debug, Clone, Copy)]
enum Op {
    CheckIn(bool),
    ShuraMode(bool),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<bool>().prop_map(Op::CheckIn),
        any::<bool>().prop_map(Op::ShuraMode),
    ]
}

fn apply(state: ToggleState, op: Op) -> (ToggleState, Option<ToggleError>) {
    match op {
        Op::CheckIn(enabled) => (state.with_check_in(enabled), None),
        Op::ShuraMode(enabled) => match state.with_shura_mode(enabled) {
            Ok(next) => (next, None),
            Err(err) => (state, Some(err)),
        },
    }
}

proptest! {
    #[test]
    fn invariant_holds_for_all_reachable_states(ops in prop::collection::vec(op_strategy(), 0..64)) {
        let mut state = ToggleState::default();
        prop_assert!(state.is_valid());
        for op in ops {
            let (next, _) = apply(state, op);
            prop_assert!(next.is_valid(), "invariant broken: {next} after {op:?}");
            state = next;
        }
    }

    #[test]
    fn rejected_operations_leave_state_unchanged(ops in prop::collection::vec(op_strategy(), 0..64)) {
        let mut state = ToggleState::default();
        for op in ops {
            let before = state;
            let (next, err) = apply(state, op);
            if err.is_some() {
                prop_assert_eq!(next, before);
            }
            state = next;
        }
    }

    #[test]
    fn shura_enable_only_rejected_when_check_in_off(
        check_in in any::<bool>(),
        shura_before in any::<bool>(),
    ) {
        // Only valid starting states are reachable.
        prop_assume!(!shura_before || check_in);
        let state = ToggleState { check_in, shura_mode: shura_before };
        let result = state.with_shura_mode(true);
        if check_in {
            prop_assert!(result.is_ok());
        } else {
            prop_assert_eq!(result, Err(ToggleError::InvalidOperation));
        }
    }
}
