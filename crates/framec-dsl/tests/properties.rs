use proptest::prelude::*;

use framec_dsl::types::{infer, validate, ValueType};

fn literal() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<i64>().prop_map(|n| n.to_string()),
        any::<i32>().prop_map(|n| n.to_string()),
        (-1_000_000i64..1_000_000, 0u32..1_000_000).prop_map(|(w, f)| format!("{w}.{f}")),
        any::<bool>().prop_map(|b| b.to_string()),
        "[a-zA-Z][a-zA-Z0-9_ ]{0,20}",
    ]
}

proptest! {
    #[test]
    fn inferred_type_accepts_its_literal(v in literal()) {
        let t = infer(&v);
        prop_assert_eq!(validate(&v, t), Ok(()), "{} inferred as {}", v, t);
    }

    #[test]
    fn infer_is_stable(v in literal()) {
        prop_assert_eq!(infer(&v), infer(&v));
    }

    #[test]
    fn short_integers_are_int(n in -999_999_999i64..=999_999_999) {
        prop_assert_eq!(infer(&n.to_string()), ValueType::Int);
    }
}
