//! Loading templated widget configuration files.

use serde_json::json;
use widgetbar::config::{ConfigError, ConfigStore, ElementConfig, load_config_file, load_widget_config};
use widgetbar::templating::{Context, TemplateEngine};
use widgetbar::test_utils::{
    SAMPLE_CONFIG, TestWorkspace, context_from_json, init_test_logging, sample_providers,
};

#[test]
fn test_sample_config_loads_and_renders() {
    init_test_logging(None);

    let workspace = TestWorkspace::new().unwrap();
    let path = workspace.write("bar.yaml", SAMPLE_CONFIG).unwrap();

    let raw = load_config_file(&path).unwrap();
    let engine = TemplateEngine::new();
    let config = load_widget_config(&raw, &Context::new(), &sample_providers(), &engine).unwrap();

    let window = &config.windows[0];
    assert_eq!(window.id, "bar");
    assert_eq!(window.class_names, ["bar", "warn"]);
    assert_eq!(window.width.as_deref(), Some("100%"));
    assert_eq!(window.height.as_deref(), Some("32"));
    assert!(window.always_on_top);
    assert_eq!(window.children.len(), 2);
    assert!(matches!(&window.children[0], ElementConfig::Group(group) if group.id == "left"));

    let rendered: Vec<_> = config
        .templates()
        .into_iter()
        .map(|(path, template)| (path, template.render(&engine).unwrap()))
        .collect();
    assert_eq!(
        rendered,
        [
            ("bar.left.cpu".to_string(), "CPU 42%".to_string()),
            ("bar.battery".to_string(), "+15".to_string()),
        ]
    );
}

#[test]
fn test_malformed_field_reports_property_path() {
    let workspace = TestWorkspace::new().unwrap();
    let path = workspace
        .write(
            "bar.toml",
            "[\"window/main\"]\nwidth = \"100%\"\n\n[\"window/main\".\"group/g\"]\nstyles = \"{{ 1 +\"\n",
        )
        .unwrap();

    let mut store = ConfigStore::new();
    let err = store.reload(&path, &Context::new(), &Context::new()).unwrap_err();
    let ConfigError::Property(err) = err else {
        panic!("expected a property error, got {err:?}");
    };
    assert_eq!(err.property_path, "window/main.group/g.styles");
    assert_eq!(err.template, "{{ 1 +");
    assert!(err.offset <= err.template.len());
    assert!(err.format_diagnostic().contains("{{ 1 +"));
    assert!(store.current().is_none());
}

#[test]
fn test_variables_are_scoped_to_element_subtree() {
    let workspace = TestWorkspace::new().unwrap();
    let path = workspace
        .write(
            "bar.json",
            r#"{
                "window/a": {
                    "variables": {"accent": "{{ theme == 'dark' ? '#fff' : '#000' }}"},
                    "group/one": {
                        "variables": {"size": 12, "label": "{{ size * 2 }}px"},
                        "template/t": {"template": "{{ accent }} {{ label }}"}
                    },
                    "template/u": {"template": "{{ accent }}|{{ label }}"}
                }
            }"#,
        )
        .unwrap();

    let mut store = ConfigStore::new();
    let base = Context::new().with("theme", "dark");
    store.reload(&path, &base, &Context::new()).unwrap();

    let rendered = store.render_templates(&Context::new());
    assert_eq!(rendered[0].1.as_deref().unwrap(), "#fff 24px");
    assert_eq!(rendered[1].1.as_deref().unwrap(), "#fff|");
}

#[test]
fn test_reload_recovers_after_fix() {
    let workspace = TestWorkspace::new().unwrap();
    let path = workspace.write("bar.yaml", "window/a:\n  styles: '{% if x %}'\n").unwrap();

    let mut store = ConfigStore::new();
    assert!(store.reload(&path, &Context::new(), &Context::new()).is_err());
    assert!(store.current().is_none());

    workspace
        .write("bar.yaml", "window/a:\n  styles: '{% if x %}on{% end if %}'\n")
        .unwrap();
    let config = store
        .reload(&path, &Context::new().with("x", true), &Context::new())
        .unwrap();
    assert_eq!(config.windows[0].styles.as_deref(), Some("on"));
}

#[test]
fn test_live_render_rebinds_declared_providers_only() {
    let workspace = TestWorkspace::new().unwrap();
    let mut config = SAMPLE_CONFIG.to_string();
    config.push_str("  template/stray:\n    template: \"[{{ cpu.usage }}]\"\n");
    let path = workspace.write("bar.yaml", &config).unwrap();

    let mut store = ConfigStore::new();
    store.reload(&path, &Context::new(), &sample_providers()).unwrap();

    let live = context_from_json(json!({
        "battery": {"level": 80, "status": "full"},
        "cpu": {"usage": 99},
    }));
    let rendered: Vec<_> = store
        .render_templates(&live)
        .into_iter()
        .map(|(path, output)| (path, output.unwrap()))
        .collect();
    assert_eq!(
        rendered,
        [
            ("bar.left.cpu".to_string(), "CPU 99%".to_string()),
            ("bar.battery".to_string(), "-80".to_string()),
            ("bar.stray".to_string(), "[]".to_string()),
        ]
    );
}
