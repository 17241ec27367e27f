//! Helper registration across the global and scoped registries.

use quill::{
    helpers, register_transformer, transformer, Engine, Error, HelperMetadata, HelperRegistry,
    Template, TemplateOptions,
};
use serde_json::{json, Value};

fn scoped_options(registry: std::sync::Arc<HelperRegistry>) -> TemplateOptions {
    TemplateOptions::new().registry(registry)
}

#[test]
fn test_catalog_registration_is_idempotent() {
    helpers::register_catalog();
    assert!(!helpers::register_catalog());

    let engine = Engine::default_engine();
    for name in helpers::names() {
        assert!(engine.has_helper(name), "catalog helper {} missing", name);
    }

    let template = Template::new("{{uppercase word}}", TemplateOptions::default()).unwrap();
    assert_eq!(template.render(&json!({"word": "twice"})).unwrap(), "TWICE");
}

#[test]
fn test_catalog_is_available_without_setup() {
    let template = Template::new(
        "{{add 2 3}} {{join (sort tags) \"/\"}} {{default missing \"none\"}}",
        TemplateOptions::default(),
    )
    .unwrap();
    let out = template.render(&json!({"tags": ["b", "a"]})).unwrap();
    assert_eq!(out, "5 a/b none");
}

#[test]
fn test_global_helper_reaches_default_templates() {
    register_transformer("registriesExclaim", |args, cx| {
        Ok(Value::String(format!("{}!", cx.text(args, 0)?)))
    });
    let template = Template::new("{{registriesExclaim msg}}", TemplateOptions::default()).unwrap();
    assert_eq!(template.render(&json!({"msg": "go"})).unwrap(), "go!");
}

#[test]
fn test_scoped_helper_is_invisible_globally() {
    let scoped = HelperRegistry::scoped();
    scoped.register("registriesScopedOnly", |_, _| Ok(json!("scoped")));

    let local = Template::new("{{registriesScopedOnly}}", scoped_options(scoped)).unwrap();
    assert_eq!(local.render(&json!({})).unwrap(), "scoped");

    assert!(!HelperRegistry::global().has("registriesScopedOnly"));
    assert!(!Engine::default_engine().has_helper("registriesScopedOnly"));

    let global = Template::new("{{registriesScopedOnly 1}}", TemplateOptions::default()).unwrap();
    let err = global.render(&json!({})).unwrap_err();
    assert!(matches!(err, Error::Render(_)));
}

#[test]
fn test_global_helper_is_invisible_to_scoped_templates() {
    register_transformer("registriesGlobalOnly", |_, _| Ok(json!("global")));

    let scoped = HelperRegistry::scoped();
    let template = Template::new("{{registriesGlobalOnly 1}}", scoped_options(scoped)).unwrap();
    assert!(template.render(&json!({})).is_err());
}

#[test]
fn test_scoped_registries_are_isolated_from_each_other() {
    let first = HelperRegistry::scoped();
    let second = HelperRegistry::scoped();
    first.register("registriesWho", |_, _| Ok(json!("first")));
    second.register("registriesWho", |_, _| Ok(json!("second")));

    let a = Template::new("{{registriesWho}}", scoped_options(first)).unwrap();
    let b = Template::new("{{registriesWho}}", scoped_options(second)).unwrap();
    assert_eq!(a.render(&json!({})).unwrap(), "first");
    assert_eq!(b.render(&json!({})).unwrap(), "second");
}

#[test]
fn test_scoped_templates_still_get_the_catalog() {
    let scoped = HelperRegistry::scoped();
    let template = Template::new("{{lowercase x}}", scoped_options(scoped)).unwrap();
    assert_eq!(template.render(&json!({"x": "QUIET"})).unwrap(), "quiet");
}

#[test]
fn test_custom_helper_overrides_catalog_in_scope() {
    let scoped = HelperRegistry::scoped();
    scoped.register("uppercase", |_, _| Ok(json!("overridden")));
    let template = Template::new("{{uppercase x}}", scoped_options(scoped)).unwrap();
    assert_eq!(template.render(&json!({"x": "a"})).unwrap(), "overridden");

    let plain = Template::new("{{uppercase x}}", TemplateOptions::default()).unwrap();
    assert_eq!(plain.render(&json!({"x": "a"})).unwrap(), "A");
}

#[test]
fn test_late_registration_reaches_existing_scope_after_new_template() {
    let scoped = HelperRegistry::scoped();
    let first = Template::new("{{lowercase x}}", scoped_options(scoped.clone())).unwrap();
    assert_eq!(first.render(&json!({"x": "A"})).unwrap(), "a");

    scoped.register("registriesLate", |_, _| Ok(json!("late")));
    let second = Template::new("{{registriesLate}}", scoped_options(scoped)).unwrap();
    assert_eq!(second.render(&json!({})).unwrap(), "late");
}

#[test]
fn test_register_many_and_metadata() {
    let scoped = HelperRegistry::scoped();
    scoped.register_many([
        ("registriesOne", transformer(|_, _| Ok(json!(1)))),
        ("registriesTwo", transformer(|_, _| Ok(json!(2)))),
    ]);
    scoped.register_with_metadata(
        "registriesThree",
        |_, _| Ok(json!(3)),
        HelperMetadata::new().description("three").version("0.1.0"),
    );
    assert_eq!(scoped.names(), vec!["registriesOne", "registriesTwo", "registriesThree"]);
    assert_eq!(
        scoped.metadata("registriesThree").and_then(|m| m.description),
        Some("three".to_string())
    );

    let template = Template::new(
        "{{registriesOne}}{{registriesTwo}}{{registriesThree}}",
        scoped_options(scoped),
    )
    .unwrap();
    assert_eq!(template.render(&json!({})).unwrap(), "123");
}

#[test]
fn test_helper_errors_surface_as_render_errors() {
    let scoped = HelperRegistry::scoped();
    scoped.register("registriesNeedsArg", |args, cx| Ok(cx.arg(args, 0)?.clone()));
    let template = Template::new("{{registriesNeedsArg}}", scoped_options(scoped)).unwrap();
    let err = template.render(&json!({})).unwrap_err();
    assert!(err.to_string().contains("registriesNeedsArg"), "{}", err);
}
