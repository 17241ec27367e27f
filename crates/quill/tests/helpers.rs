//! Catalog helpers through the public call surface.

use proptest::prelude::*;
use quill::helpers;
use serde_json::json;

#[test]
fn test_every_catalog_entry_is_described() {
    let names = helpers::names();
    assert!(names.len() > 40);
    for name in &names {
        let description = helpers::describe(name).unwrap();
        assert!(!description.is_empty(), "{} has no description", name);
    }
    let mut unique = names.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), names.len());
    assert_eq!(helpers::describe("noSuchHelper"), None);
}

#[test]
fn test_call_by_name() {
    assert_eq!(helpers::call("add", &[json!(2), json!(3)]).unwrap(), json!(5));
    assert_eq!(helpers::call("slugify", &[json!("Hello, World!")]).unwrap(), json!("hello-world"));
    assert!(helpers::call("divide", &[json!(1), json!(0)]).is_err());
    assert!(helpers::call("noSuchHelper", &[]).is_err());
}

proptest! {
    #[test]
    fn uppercase_then_lowercase_matches_lowercase(s in "[a-zA-Z ]{0,24}") {
        let upper = helpers::call("uppercase", &[json!(s)]).unwrap();
        let lowered = helpers::call("lowercase", &[upper]).unwrap();
        prop_assert_eq!(lowered, json!(s.to_lowercase()));
    }

    #[test]
    fn add_integers_is_exact(a in -10_000i64..10_000, b in -10_000i64..10_000) {
        prop_assert_eq!(helpers::call("add", &[json!(a), json!(b)]).unwrap(), json!(a + b));
    }

    #[test]
    fn slugify_output_is_url_safe(s in "\\PC{0,32}") {
        let slug = helpers::call("slugify", &[json!(s)]).unwrap();
        let slug = slug.as_str().unwrap();
        prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
    }

    #[test]
    fn length_of_array_matches(xs in proptest::collection::vec(any::<i32>(), 0..20)) {
        prop_assert_eq!(helpers::call("length", &[json!(xs)]).unwrap(), json!(xs.len()));
    }
}
