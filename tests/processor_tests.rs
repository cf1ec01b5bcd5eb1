//! End-to-end rendering tests: conditionals, modes, includes, tasks, and
//! the mode-stack invariants.

use std::cell::Cell;
use std::fs;
use std::path::Path;

use tempfile::TempDir;

use lg::config::AdaptiveConfig;
use lg::run_context::{RenderOptions, RunContext};
use lg::template::context::TemplateContext;
use lg::template::processor::Processor;
use lg::template::{RenderError, TemplateEngine};

const MODES_YAML: &str = r#"
tags:
  tag_sets:
    detail:
      tags:
        full: {}
        brief: {}
modes:
  mode_sets:
    M:
      modes:
        fast:
          tags: [fast]
          options:
            depth: 1
        slow:
          tags: [slow]
          options:
            depth: 3
"#;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn run_ctx(root: &Path, tags: &[&str], task: &str) -> RunContext {
    let mut ctx = RunContext::new(root.to_path_buf());
    ctx.options = RenderOptions {
        task_text: task.to_string(),
        extra_tags: tags.iter().map(|t| t.to_string()).collect(),
        modes: Default::default(),
    };
    ctx.adaptive = AdaptiveConfig::from_yaml(MODES_YAML).unwrap();
    ctx
}

fn render(template: &str, tags: &[&str]) -> String {
    let repo = TempDir::new().unwrap();
    let engine = TemplateEngine::new(run_ctx(repo.path(), tags, "")).unwrap();
    engine.render_text(template).unwrap()
}

#[test]
fn section_handler_output_replaces_the_placeholder() {
    let repo = TempDir::new().unwrap();
    let mut engine = TemplateEngine::new(run_ctx(repo.path(), &[], "")).unwrap();
    engine.set_section_handler(|section_ref, _ctx| {
        assert_eq!(section_ref.name, "who");
        Ok("world\n".to_string())
    });
    assert_eq!(engine.render_text("Hello ${who}!").unwrap(), "Hello world\n!");
}

#[test]
fn conditional_picks_else_without_the_tag() {
    let template = "{% if tag:x %}A{% else %}B{% endif %}";
    assert_eq!(render(template, &[]), "B");
    assert_eq!(render(template, &["x"]), "A");
}

#[test]
fn conjunction_needs_both_tags() {
    let template = "{% if tag:a AND tag:b %}yes{% endif %}";
    assert_eq!(render(template, &["a"]), "");
    assert_eq!(render(template, &["a", "b"]), "yes");
}

#[test]
fn elif_branches_take_the_first_match() {
    let template = "{% if tag:a %}1{% elif tag:b %}2{% elif tag:c %}3{% else %}4{% endif %}";
    assert_eq!(render(template, &["a"]), "1");
    assert_eq!(render(template, &["b"]), "2");
    assert_eq!(render(template, &["c"]), "3");
    assert_eq!(render(template, &["b", "c"]), "2");
    assert_eq!(render(template, &[]), "4");
}

#[test]
fn mode_block_activates_tags_only_inside() {
    let template =
        "{% mode M:fast %}{% if tag:fast %}F{% endif %}{% endmode %}{% if tag:fast %}X{% endif %}";
    assert_eq!(render(template, &[]), "F");
}

#[test]
fn nested_mode_blocks_restore_outer_state() {
    let template = "{% mode M:fast %}{% mode M:slow %}{% if tag:slow %}S{% endif %}{% endmode %}{% if tag:fast %}F{% endif %}{% endmode %}";
    // the inner block layers slow on top; fast stays active underneath
    assert_eq!(render(template, &[]), "SF");
}

#[test]
fn unknown_mode_reports_available_modes() {
    let repo = TempDir::new().unwrap();
    let engine = TemplateEngine::new(run_ctx(repo.path(), &[], "")).unwrap();
    let err = engine
        .render_text("{% mode M:turbo %}x{% endmode %}")
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("unknown mode 'turbo'"), "{}", message);
    assert!(message.contains("fast"), "{}", message);
}

#[test]
fn unknown_mode_set_is_an_error() {
    let repo = TempDir::new().unwrap();
    let engine = TemplateEngine::new(run_ctx(repo.path(), &[], "")).unwrap();
    let err = engine
        .render_text("{% mode Nope:fast %}x{% endmode %}")
        .unwrap_err();
    assert!(err.to_string().contains("unknown mode set 'Nope'"));
}

#[test]
fn comments_render_to_nothing() {
    assert_eq!(render("a{# hidden #}b", &[]), "ab");
}

#[test]
fn includes_render_in_place() {
    let repo = TempDir::new().unwrap();
    write(repo.path(), "lg-cfg/outer.ctx.md", "X${tpl:inner}Y");
    write(repo.path(), "lg-cfg/inner.tpl.md", "Z");
    let engine = TemplateEngine::new(run_ctx(repo.path(), &[], "")).unwrap();
    assert_eq!(engine.render_context("outer").unwrap(), "XZY");
}

#[test]
fn scope_conditions_see_the_include_origin() {
    let repo = TempDir::new().unwrap();
    write(
        repo.path(),
        "lg-cfg/main.ctx.md",
        "{% if scope:local %}L{% endif %}${ctx@apps/web:page}",
    );
    write(
        repo.path(),
        "apps/web/lg-cfg/page.ctx.md",
        "{% if scope:parent %}P{% endif %}",
    );
    let engine = TemplateEngine::new(run_ctx(repo.path(), &[], "")).unwrap();
    assert_eq!(engine.render_context("main").unwrap(), "LP");
}

#[test]
fn task_placeholder_prefers_the_supplied_text() {
    let repo = TempDir::new().unwrap();
    let engine = TemplateEngine::new(run_ctx(repo.path(), &[], "Fix the bug")).unwrap();
    assert_eq!(engine.render_text("${task}").unwrap(), "Fix the bug");
}

#[test]
fn task_placeholder_falls_back_to_the_prompt() {
    let repo = TempDir::new().unwrap();
    let engine = TemplateEngine::new(run_ctx(repo.path(), &[], "")).unwrap();
    assert_eq!(
        engine
            .render_text(r#"${task:prompt:"describe your change"}"#)
            .unwrap(),
        "describe your change"
    );
    assert_eq!(engine.render_text("${task}").unwrap(), "");
}

#[test]
fn task_condition_gates_on_presence() {
    let repo = TempDir::new().unwrap();
    let engine = TemplateEngine::new(run_ctx(repo.path(), &[], "do it")).unwrap();
    assert_eq!(
        engine
            .render_text("{% if task %}T: ${task}{% endif %}")
            .unwrap(),
        "T: do it"
    );
}

#[test]
fn render_restores_the_mode_stack_after_handler_failure() {
    let repo = TempDir::new().unwrap();
    let ctx = run_ctx(repo.path(), &[], "");
    let engine = TemplateEngine::new(ctx.clone()).unwrap();

    let ast = engine
        .parse("{% mode M:fast %}${data}{% endmode %}")
        .unwrap();
    let resolved = engine.resolve(&ast).unwrap();

    let calls = Cell::new(0usize);
    let failing = |_: &lg::SectionRef, _: &TemplateContext| -> Result<String, RenderError> {
        calls.set(calls.get() + 1);
        Err(RenderError::new("boom"))
    };

    let mut template_ctx = TemplateContext::new(ctx);
    let depth_before = template_ctx.stack_depth();
    {
        let mut processor = Processor::new(engine.registry(), &mut template_ctx, &failing);
        assert!(processor.process(&resolved).is_err());
    }
    assert_eq!(calls.get(), 1);
    assert_eq!(template_ctx.stack_depth(), depth_before);
}

#[test]
fn render_error_carries_node_kind_and_plugin() {
    let repo = TempDir::new().unwrap();
    let mut engine = TemplateEngine::new(run_ctx(repo.path(), &[], "")).unwrap();
    engine.set_section_handler(|_, _| Err(RenderError::new("section exploded")));
    let err = engine.render_text("${data}").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("section exploded"), "{}", message);
    assert!(message.contains("section"), "{}", message);
    assert!(message.contains("common_placeholders"), "{}", message);
}

#[test]
fn rendering_with_empty_state_leaves_no_markers() {
    let repo = TempDir::new().unwrap();
    let engine = TemplateEngine::new(run_ctx(repo.path(), &[], "")).unwrap();
    let out = engine
        .render_text("a{% if tag:x %}${sec}{% endif %}b{# c #}{% mode M:fast %}d{% endmode %}")
        .unwrap();
    assert!(!out.contains("${"));
    assert!(!out.contains("{%"));
    assert!(!out.contains("{#"));
    assert_eq!(out, "abd");
}
