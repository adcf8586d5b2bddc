use formgen_spec::{field_id_from_marker, is_marker_safe_id, marker_for};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig { max_global_rejects: 100_000, ..ProptestConfig::default() })]

    #[test]
    fn distinct_ids_give_distinct_markers(a in "[a-z0-9_]{1,24}", b in "[a-z0-9_]{1,24}") {
        prop_assume!(a != b);
        prop_assert_ne!(marker_for(&a), marker_for(&b));
    }

    #[test]
    fn accepted_ids_never_nest_markers(a in "[a-z\\[\\]:_]{1,4}", b in "[a-z\\[\\]:_]{1,4}") {
        prop_assume!(a != b);
        prop_assume!(is_marker_safe_id(&a) && is_marker_safe_id(&b));
        prop_assert!(!marker_for(&b).contains(&marker_for(&a)));
    }

    #[test]
    fn marker_is_stable(id in ".{1,40}") {
        prop_assert_eq!(marker_for(&id), marker_for(&id));
    }

    #[test]
    fn marker_is_reversible(id in ".{1,40}") {
        let marker = marker_for(&id);
        prop_assert_eq!(field_id_from_marker(&marker), Some(id.as_str()));
    }
}

#[test]
fn bracketed_ids_are_refused() {
    assert!(is_marker_safe_id("pain"));
    assert!(!is_marker_safe_id("a]"));
    assert!(!is_marker_safe_id("a]]"));
    assert!(!is_marker_safe_id("[[FIELD:a"));
    assert!(!is_marker_safe_id("  "));
    assert!(marker_for("a]").contains(&marker_for("a")));
}
