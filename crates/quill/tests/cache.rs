//! The compiled template cache never changes rendered output.

use quill::{cache, Template, TemplateOptions};
use serde_json::json;
use serial_test::serial;

#[test]
#[serial]
fn test_cached_and_uncached_render_identically() {
    cache::clear();
    let source = "cache-it {{#each xs}}[{{this}}]{{/each}} {{uppercase y}}";
    let data = json!({"xs": [1, 2], "y": "z"});

    let cached = Template::new(source, TemplateOptions::new().cache(true)).unwrap();
    let again = Template::new(source, TemplateOptions::new().cache(true)).unwrap();
    let uncached = Template::new(source, TemplateOptions::new().cache(false)).unwrap();

    let expected = "cache-it [1][2] Z";
    assert_eq!(cached.render(&data).unwrap(), expected);
    assert_eq!(again.render(&data).unwrap(), expected);
    assert_eq!(uncached.render(&data).unwrap(), expected);
    assert!(cache::contains(source));
}

#[test]
#[serial]
fn test_second_construction_hits() {
    cache::clear();
    let source = "cache-hit {{a}}";
    Template::new(source, TemplateOptions::default()).unwrap();
    let after_first = cache::stats();
    Template::new(source, TemplateOptions::default()).unwrap();
    let after_second = cache::stats();

    assert_eq!(after_first.entries, 1);
    assert_eq!(after_second.entries, 1);
    assert_eq!(after_second.hits, after_first.hits + 1);
    assert_eq!(after_second.misses, after_first.misses);
}

#[test]
#[serial]
fn test_disabled_cache_stores_nothing() {
    cache::clear();
    Template::new("cache-off {{a}}", TemplateOptions::new().cache(false)).unwrap();
    assert!(!cache::contains("cache-off {{a}}"));
    assert_eq!(cache::stats(), cache::CacheStats::default());
}

#[test]
#[serial]
fn test_clear_then_rebuild() {
    let source = "cache-clear {{a}}";
    Template::new(source, TemplateOptions::default()).unwrap();
    cache::clear();
    assert!(!cache::contains(source));
    let template = Template::new(source, TemplateOptions::default()).unwrap();
    assert_eq!(template.render(&json!({"a": 1})).unwrap(), "cache-clear 1");
    assert!(cache::contains(source));
}
