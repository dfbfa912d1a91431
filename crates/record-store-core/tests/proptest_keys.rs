// crates/record-store-core/tests/proptest_keys.rs
// ============================================================================
// Module: Key Builder Property-Based Tests
// Description: Property tests for key derivation injectivity.
// Purpose: Detect collisions between record, access-key, and counter keys.
// ============================================================================

//! Property-based tests for key namespace invariants.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use proptest::prelude::*;
use record_store_core::KeyBuilder;
use record_store_core::RecordId;

/// Arbitrary strings that may or may not be valid identities.
fn any_identity() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z0-9]{1,20}",
        "[ :a-z]{0,6}",
        Just("count".to_string()),
        Just("accesskey".to_string()),
        ".{0,12}",
    ]
}

proptest! {
    #[test]
    fn valid_ids_never_collide(a in any_identity(), b in any_identity()) {
        let (Ok(record_a), Ok(access_a)) =
            (KeyBuilder::for_record(&a), KeyBuilder::for_access_key(&a))
        else {
            return Ok(());
        };
        prop_assert_ne!(&record_a, &access_a);
        prop_assert_ne!(record_a.as_str(), KeyBuilder::for_record_count());
        prop_assert_ne!(access_a.as_str(), KeyBuilder::for_record_count());
        if let (Ok(record_b), Ok(access_b)) =
            (KeyBuilder::for_record(&b), KeyBuilder::for_access_key(&b))
        {
            prop_assert_eq!(a == b, record_a == record_b);
            prop_assert_eq!(a == b, access_a == access_b);
            prop_assert_ne!(&record_a, &access_b);
        }
    }

    #[test]
    fn derived_keys_invert_to_the_identity(id in any_identity()) {
        if let Ok(record_key) = KeyBuilder::for_record(&id) {
            prop_assert_eq!(KeyBuilder::extract_record_id(&record_key), Some(id.as_str()));
            prop_assert!(KeyBuilder::is_record_key(&record_key));
            let access_key = KeyBuilder::for_access_key(&id).unwrap();
            prop_assert_eq!(KeyBuilder::extract_record_id(&access_key), Some(id.as_str()));
            prop_assert!(KeyBuilder::is_access_key_key(&access_key));
        } else {
            prop_assert!(KeyBuilder::validate_id(&id).is_err());
        }
    }

    #[test]
    fn rejected_ids_match_the_validation_rules(id in any_identity()) {
        let expected_invalid = id.is_empty()
            || id.contains(':')
            || id.trim() != id
            || id == "count"
            || id == "accesskey";
        prop_assert_eq!(KeyBuilder::validate_id(&id).is_err(), expected_invalid);
    }
}

#[test]
fn generated_ids_are_always_valid() {
    for _ in 0..256 {
        let id = RecordId::generate();
        assert!(KeyBuilder::validate_id(id.as_str()).is_ok());
    }
}
