//! Whole-engine scenarios: context files, frontmatter, nested scopes,
//! and the composed output of a realistic template tree.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use lg::config::AdaptiveConfig;
use lg::run_context::{RenderOptions, RunContext};
use lg::template::TemplateEngine;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

const CONFIG: &str = r#"
tags:
  tag_sets:
    audience:
      tags:
        dev: {}
        ops: {}
modes:
  mode_sets:
    verbosity:
      modes:
        terse:
          tags: [terse]
        chatty:
          tags: [chatty]
"#;

fn engine_at(root: &Path, tags: &[&str], task: &str) -> TemplateEngine<'static> {
    let mut ctx = RunContext::new(root.to_path_buf());
    ctx.options = RenderOptions {
        task_text: task.to_string(),
        extra_tags: tags.iter().map(|t| t.to_string()).collect(),
        modes: Default::default(),
    };
    ctx.adaptive = AdaptiveConfig::from_yaml(CONFIG).unwrap();
    TemplateEngine::new(ctx).unwrap()
}

#[test]
fn renders_a_context_file_with_frontmatter() {
    let repo = TempDir::new().unwrap();
    write(
        repo.path(),
        "lg-cfg/default.ctx.md",
        "---\ninclude: [extra]\n---\n# Context\n\ndone\n",
    );
    let engine = engine_at(repo.path(), &[], "");
    let out = engine.render_context("default").unwrap();
    assert_eq!(out, "# Context\n\ndone\n");
}

#[test]
fn renders_a_template_file() {
    let repo = TempDir::new().unwrap();
    write(repo.path(), "lg-cfg/snippet.tpl.md", "plain body\n");
    let engine = engine_at(repo.path(), &[], "");
    assert_eq!(engine.render_template_file("snippet").unwrap(), "plain body\n");
}

#[test]
fn missing_context_is_a_resolver_error() {
    let repo = TempDir::new().unwrap();
    let engine = engine_at(repo.path(), &[], "");
    assert!(engine.render_context("missing").is_err());
}

#[test]
fn composed_tree_renders_deterministically() {
    let repo = TempDir::new().unwrap();
    write(
        repo.path(),
        "lg-cfg/main.ctx.md",
        concat!(
            "# Project Context\n",
            "\n",
            "{% if TAGSET:audience:dev %}${tpl:dev-notes}{% endif %}\n",
            "\n",
            "## Docs\n",
            "\n",
            "${md:docs/overview}\n",
            "\n",
            "{% if task %}## Task\n\n${task}\n{% endif %}",
        ),
    );
    write(repo.path(), "lg-cfg/dev-notes.tpl.md", "Developer notes here.");
    write(repo.path(), "docs/overview.md", "# Overview\n\nThe big picture.\n");

    let engine = engine_at(repo.path(), &["dev"], "Refactor the parser");
    let out = engine.render_context("main").unwrap();

    insta::assert_snapshot!(out.trim_end(), @r###"
    # Project Context

    Developer notes here.

    ## Docs

    ### Overview

    The big picture.


    ## Task

    Refactor the parser
    "###);
}

#[test]
fn same_engine_renders_independently() {
    let repo = TempDir::new().unwrap();
    write(repo.path(), "lg-cfg/a.ctx.md", "{% mode verbosity:terse %}{% if tag:terse %}T{% endif %}{% endmode %}");
    write(repo.path(), "lg-cfg/b.ctx.md", "{% if tag:terse %}leak{% endif %}ok");
    let engine = engine_at(repo.path(), &[], "");

    assert_eq!(engine.render_context("a").unwrap(), "T");
    // state from the first render must not leak into the second
    assert_eq!(engine.render_context("b").unwrap(), "ok");
}

#[test]
fn reports_template_dependencies_without_rendering() {
    let repo = TempDir::new().unwrap();
    let engine = engine_at(repo.path(), &[], "");
    let deps = engine
        .template_dependencies(
            "${core}${@apps/web:assets}{% if tag:x %}${tpl:part}{% endif %}${ctx@apps/web:page}",
        )
        .unwrap();
    assert_eq!(deps.sections, vec!["core", "@apps/web:assets"]);
    assert_eq!(deps.includes, vec!["tpl:part", "ctx@apps/web:page"]);
}

#[test]
fn include_memoization_renders_identical_copies() {
    let repo = TempDir::new().unwrap();
    write(repo.path(), "lg-cfg/part.tpl.md", "[part]");
    write(repo.path(), "lg-cfg/main.ctx.md", "${tpl:part}-${tpl:part}");
    let engine = engine_at(repo.path(), &[], "");
    assert_eq!(engine.render_context("main").unwrap(), "[part]-[part]");
}
