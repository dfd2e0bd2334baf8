//! Evaluates a parsed [`Template`] against a [`Context`].
//!
//! Rendering is pure: the tree and the context are only read. A failing
//! expression is contained to its node and treated as undefined, so one bad
//! provider value does not blank a whole widget.

use tracing::debug;

use super::context::{Context, Scope, Value};
use super::expression::{Expr, evaluate};
use super::parser::{Node, Template};

/// Render `template` with `context`.
pub fn render(template: &Template, context: &Context) -> String {
    let mut out = String::new();
    render_nodes(&template.nodes, &Scope::Root(context), &mut out);
    out
}

fn render_nodes(nodes: &[Node], scope: &Scope<'_>, out: &mut String) {
    for node in nodes {
        render_node(node, scope, out);
    }
}

fn render_node(node: &Node, scope: &Scope<'_>, out: &mut String) {
    match node {
        Node::Text { value } => out.push_str(value),
        Node::Output { expression } => {
            let value = eval_contained(expression, scope);
            out.push_str(&value.to_string());
        }
        Node::Conditional { branches } => {
            let taken = branches.iter().find(|branch| match &branch.condition {
                Some(condition) => eval_contained(condition, scope).is_truthy(),
                None => true,
            });
            if let Some(branch) = taken {
                render_nodes(&branch.children, scope, out);
            }
        }
        Node::ForLoop {
            iterable,
            binding,
            children,
        } => {
            let Value::List(items) = eval_contained(iterable, scope) else {
                return;
            };
            for item in &items {
                let child = Scope::Binding {
                    name: binding,
                    value: item,
                    parent: scope,
                };
                render_nodes(children, &child, out);
            }
        }
        Node::Switch {
            discriminant,
            cases,
            default,
        } => {
            let value = eval_contained(discriminant, scope);
            let matched = cases
                .iter()
                .find(|case| eval_contained(&case.value, scope) == value)
                .map(|case| &case.children)
                .or(default.as_ref());
            if let Some(children) = matched {
                render_nodes(children, scope, out);
            }
        }
    }
}

fn eval_contained(expression: &Expr, scope: &Scope<'_>) -> Value {
    evaluate(expression, scope).unwrap_or_else(|err| {
        debug!("Template expression failed, rendering as undefined: {err}");
        Value::Undefined
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templating::parser::parse;
    use serde_json::json;

    fn render_str(source: &str, context: &Context) -> String {
        render(&parse(source).unwrap(), context)
    }

    fn ctx(value: serde_json::Value) -> Context {
        Context::from(value.as_object().cloned().unwrap())
    }

    #[test]
    fn test_text_and_output() {
        let context = ctx(json!({"name": "bar", "cpu": {"usage": 12}}));
        assert_eq!(render_str("{{ name }}: {{ cpu.usage }}%", &context), "bar: 12%");
    }

    #[test]
    fn test_conditional_order() {
        let context = Context::new();
        assert_eq!(
            render_str("{% if false %}A{% else if true %}B{% else %}C{% end if %}", &context),
            "B"
        );
        assert_eq!(render_str("{% if false %}A{% end if %}", &context), "");
        assert_eq!(
            render_str("{% if 1 %}A{% else if true %}B{% end if %}", &context),
            "A"
        );
    }

    #[test]
    fn test_loop_binding_shadows_only_inside() {
        let context = ctx(json!({"items": [1, 2, 3], "x": "outer"}));
        assert_eq!(
            render_str("{% for x in items %}{{x}}{% end for %}|{{ x }}", &context),
            "123|outer"
        );
        assert_eq!(context.get("x"), Some(&Value::from("outer")));
    }

    #[test]
    fn test_loop_over_non_list_renders_nothing() {
        let context = ctx(json!({"count": 3}));
        assert_eq!(render_str("[{% for x in count %}{{x}}{% end for %}]", &context), "[]");
        assert_eq!(render_str("[{% for x in nope %}{{x}}{% end for %}]", &context), "[]");
    }

    #[test]
    fn test_switch_matching() {
        let context = ctx(json!({"state": "charging"}));
        let source = "{% switch state %}{% case 'full' %}F{% case 'charging' %}C{% case %}?{% end switch %}";
        assert_eq!(render_str(source, &context), "C");
        assert_eq!(
            render_str("{% switch 5 %}{% case 1 %}A{% case 2 %}B{% end switch %}", &context),
            ""
        );
        assert_eq!(
            render_str("{% switch 5 %}{% case 1 %}A{% case %}D{% end switch %}", &context),
            "D"
        );
    }

    #[test]
    fn test_failures_are_contained() {
        let context = ctx(json!({"n": 1}));
        assert_eq!(render_str("a{{ missing.nested }}b", &context), "ab");
        assert_eq!(render_str("a{{ n() }}b", &context), "ab");
        assert_eq!(render_str("{% if n() %}x{% else %}y{% end if %}", &context), "y");
    }
}
