//! Rendering through the public [`TemplateEngine`] API.

use serde_json::json;
use widgetbar::templating::{Context, TemplateEngine, Value};
use widgetbar::test_utils::{context_from_json, init_test_logging};

#[test]
fn test_widget_markup_end_to_end() {
    init_test_logging(None);

    let engine = TemplateEngine::new();
    let context = context_from_json(json!({
        "workspaces": [
            {"name": "web", "focused": false, "windows": 3},
            {"name": "code", "focused": true, "windows": 1},
            {"name": "chat", "focused": false, "windows": 0},
        ],
        "battery": {"level": 76.5, "status": "discharging"},
    }));

    let template = concat!(
        "{% for ws in workspaces %}",
        "{% if ws.focused %}[{{ ws.name }}]{% else if ws.windows > 0 %}{{ ws.name }}{% end if %} ",
        "{% end for %}",
        "| {% switch battery.status %}",
        "{% case 'charging' %}+",
        "{% case 'full' %}=",
        "{% case %}-",
        "{% end switch %}{{ battery.level }}%",
    );

    assert_eq!(engine.render(template, &context).unwrap(), "web [code]  | -76.5%");
}

#[test]
fn test_conditional_takes_first_truthy_branch() {
    let engine = TemplateEngine::new();
    let output = engine
        .render(
            "{% if false %}A{% else if true %}B{% else %}C{% end if %}",
            &Context::new(),
        )
        .unwrap();
    assert_eq!(output, "B");
}

#[test]
fn test_loop_binding_does_not_leak() {
    let engine = TemplateEngine::new();
    let context = Context::new()
        .with("items", vec![1, 2, 3])
        .with("x", "outer");

    let output = engine
        .render("{% for x in items %}{{x}}{% end for %}/{{ x }}", &context)
        .unwrap();
    assert_eq!(output, "123/outer");
    assert_eq!(context.get("x"), Some(&Value::from("outer")));
}

#[test]
fn test_switch_without_match_or_default_is_empty() {
    let engine = TemplateEngine::new();
    let output = engine
        .render("{% switch 5 %}{% case 1 %}A{% case 2 %}B{% end switch %}", &Context::new())
        .unwrap();
    assert_eq!(output, "");
}

#[test]
fn test_undefined_values_render_empty() {
    let engine = TemplateEngine::new();
    assert_eq!(engine.render("{{ missing.nested }}", &Context::new()).unwrap(), "");
    assert_eq!(engine.render("[{{ missing[0].x }}]", &Context::new()).unwrap(), "[]");
}

#[test]
fn test_host_functions_and_operators() {
    let engine = TemplateEngine::new();
    let mut context = Context::new().with("used", 3).with("total", 8);
    context.insert_function("percent", |args| {
        match (args.first().and_then(Value::as_number), args.get(1).and_then(Value::as_number)) {
            (Some(a), Some(b)) if b != 0.0 => Value::from((a / b * 100.0).round()),
            _ => Value::Undefined,
        }
    });

    let output = engine
        .render(
            "{{ percent(used, total) }}% {{ used * 2 == 6 ? 'six' : 'other' }} {{ total % 3 }}",
            &context,
        )
        .unwrap();
    assert_eq!(output, "38% six 2");
}

#[test]
fn test_unclosed_block_reports_opening_tag() {
    let engine = TemplateEngine::new();
    let err = engine.render("{% if true %}A", &Context::new()).unwrap_err();
    assert_eq!(err.offset, 0);

    let err = engine
        .render("ok {% for x in xs %}{{ x }}", &Context::new())
        .unwrap_err();
    assert_eq!(err.offset, 3);
}

#[test]
fn test_unterminated_delimiter_is_an_error() {
    let engine = TemplateEngine::new();
    let err = engine.render("CPU {{ cpu", &Context::new()).unwrap_err();
    assert_eq!(err.offset, 4);
    assert!(err.message.contains("unterminated"));
}

#[test]
fn test_delimiters_inside_string_literals() {
    let engine = TemplateEngine::new();
    let context = context_from_json(json!({"sep": "%}", "stats": {"min": 1, "max": 2.5}}));
    let text = engine
        .render(
            "{{ '}}' }}{% if sep == '%}' %} ok{% end if %} {{ stats }}",
            &context,
        )
        .unwrap();
    assert_eq!(text, r#"}} ok {"min":1,"max":2.5}"#);
}

#[test]
fn test_unknown_tag_suggests_keyword() {
    let engine = TemplateEngine::new();
    let err = engine
        .render("{% swich x %}{% end switch %}", &Context::new())
        .unwrap_err();
    assert!(err.message.contains("did you mean 'switch'"), "{}", err.message);
}

#[test]
fn test_cache_is_shared_across_threads() {
    let engine = TemplateEngine::new();
    let template = "{% for n in ns %}{{ n * 2 }},{% end for %}";

    std::thread::scope(|scope| {
        for i in 0..4 {
            let engine = &engine;
            scope.spawn(move || {
                let context = Context::new().with("ns", vec![i, i + 1]);
                let expected = format!("{},{},", i * 2, (i + 1) * 2);
                for _ in 0..25 {
                    assert_eq!(engine.render(template, &context).unwrap(), expected);
                }
            });
        }
    });

    let stats = engine.cache_stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.hits + stats.misses, 100);
    assert!(stats.parses >= 1 && stats.parses <= 4);
}

#[test]
fn test_clear_cache_forces_reparse() {
    let engine = TemplateEngine::new();
    let context = Context::new().with("n", 1);

    let first = engine.compile("{{ n + 1 }}").unwrap();
    assert_eq!(engine.render("{{ n + 1 }}", &context).unwrap(), "2");
    assert_eq!(engine.cache_stats().parses, 1);

    engine.clear_cache();
    assert_eq!(engine.cache_stats().entries, 0);
    let second = engine.compile("{{ n + 1 }}").unwrap();
    let stats = engine.cache_stats();
    assert_eq!((stats.parses, stats.misses), (1, 1));
    assert!(!std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(*first, *second);
}
