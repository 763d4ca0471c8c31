mod common;

use common::{fixture, raw, template_tree};
use poja::catalog::Catalog;
use poja::config::ConfigModel;
use poja::constants::CATALOG_FILE;
use poja::error::RenderError;
use poja::generator::render_all;
use poja::renderer::{is_rendered_path_valid, MiniJinjaRenderer, Rendered, TemplateRenderer};
use serde_json::json;
use std::path::PathBuf;

fn config(pairs: &[(&str, &str)]) -> ConfigModel {
    let mut all = vec![("app_name", "demo")];
    all.extend_from_slice(pairs);
    ConfigModel::build(raw(&all)).unwrap()
}

fn render_tree(files: &[(&str, &str)], config: &ConfigModel) -> Result<Vec<Rendered>, RenderError> {
    let tree = template_tree(files);
    let catalog = Catalog::load(tree.path()).unwrap();
    match render_all(config, &catalog) {
        Ok(rendered) => Ok(rendered),
        Err(poja::error::Error::Render(e)) => Err(e),
        Err(e) => panic!("Unexpected error: {e}"),
    }
}

fn content(rendered: &[Rendered], path: &str) -> String {
    rendered
        .iter()
        .find_map(|r| match r {
            Rendered::File { path: p, content, .. } if p == &PathBuf::from(path) => {
                Some(String::from_utf8(content.clone()).unwrap())
            }
            _ => None,
        })
        .unwrap_or_else(|| panic!("{path} was not rendered"))
}

#[test]
fn test_minijinja_renderer() {
    let engine = MiniJinjaRenderer::new();
    let context = json!({ "app_name": "demo", "with_snapstart": "true" });

    let rendered = engine
        .render(
            "t",
            "name: {{ app_name }}\n{% if with_snapstart == \"true\" %}snap{% endif %}\n",
            &context,
        )
        .unwrap();
    assert_eq!(rendered, "name: demo\nsnap\n");

    // Values are not HTML-escaped.
    let rendered = engine.render("t.html", "{{ v }}", &json!({ "v": "<a & 'b'>" })).unwrap();
    assert_eq!(rendered, "<a & 'b'>");
}

#[test]
fn test_unknown_placeholder_is_an_error() {
    let engine = MiniJinjaRenderer::new();
    match engine.render("README.md.j2", "{{ app_nmae }}", &json!({ "app_name": "demo" })) {
        Err(RenderError::UnknownPlaceholder { template, .. }) => assert_eq!(template, "README.md.j2"),
        other => panic!("Expected UnknownPlaceholder, got {other:?}"),
    }

    assert!(matches!(
        engine.render("broken.j2", "{% if %}", &json!({})),
        Err(RenderError::Template { .. })
    ));
}

#[test]
fn test_rendered_path_validation() {
    assert!(is_rendered_path_valid("src/main/java/com/company/base/App.java"));
    assert!(!is_rendered_path_valid(""));
    assert!(!is_rendered_path_valid("/etc/passwd"));
    assert!(!is_rendered_path_valid("src//App.java"));
    assert!(!is_rendered_path_valid("../outside.txt"));
}

#[test]
fn test_paths_and_bodies_are_rendered() {
    let rendered = render_tree(
        &[
            ("src/{{package_path}}/App.java.j2", "package {{ package_full_name }};\n"),
            ("static/raw.txt", "kept {{ as_is }}"),
        ],
        &config(&[("package_full_name", "io.poja.demo")]),
    )
    .unwrap();

    let paths: Vec<&PathBuf> = rendered.iter().map(Rendered::path).collect();
    assert_eq!(
        paths,
        vec![
            &PathBuf::from("src"),
            &PathBuf::from("src/io/poja/demo"),
            &PathBuf::from("src/io/poja/demo/App.java"),
            &PathBuf::from("static"),
            &PathBuf::from("static/raw.txt"),
        ]
    );
    assert_eq!(content(&rendered, "src/io/poja/demo/App.java"), "package io.poja.demo;\n");
    assert_eq!(content(&rendered, "static/raw.txt"), "kept {{ as_is }}");
}

#[test]
fn test_path_rendering_to_an_invalid_location_fails() {
    let result = render_tree(&[("{{ ssm_sg_id }}/x.txt", "x")], &config(&[]));
    match result {
        Err(RenderError::InvalidPath { template, path }) => {
            assert_eq!(template, "{{ ssm_sg_id }}");
            assert_eq!(path, "");
        }
        other => panic!("Expected InvalidPath, got {other:?}"),
    }
}

#[test]
fn test_merge_replaces_marker_with_entries() {
    let manifest = "merges:\n  - { path: build.gradle.j2, aux: custom_java_deps }\n";
    let files = [
        (CATALOG_FILE, manifest),
        ("build.gradle.j2", "dependencies {\n  api 'base:{{ app_name }}:1'\n  // poja-merge: custom_java_deps\n}\n"),
    ];
    let deps = fixture("custom-java-deps.txt");

    let rendered = render_tree(&files, &config(&[("custom_java_deps", deps.as_str())])).unwrap();
    assert_eq!(
        content(&rendered, "build.gradle"),
        "dependencies {\n  api 'base:demo:1'\n  implementation 'com.github.javafaker:javafaker:1.0.2'\n  testImplementation(\"org.mockito:mockito-inline:5.2.0\")\n}\n"
    );

    // Without a fragment file the marker line disappears.
    let rendered = render_tree(&files, &config(&[])).unwrap();
    assert_eq!(content(&rendered, "build.gradle"), "dependencies {\n  api 'base:demo:1'\n}\n");
}

#[test]
fn test_merge_requires_exactly_one_marker() {
    let manifest = "merges:\n  - { path: template.yml, aux: custom_java_env_vars }\n";
    let result = render_tree(&[(CATALOG_FILE, manifest), ("template.yml", "Variables:\n")], &config(&[]));
    match result {
        Err(RenderError::MergeMarker { template, kind, found }) => {
            assert_eq!(template, "template.yml");
            assert_eq!(kind, "custom_java_env_vars");
            assert_eq!(found, 0);
        }
        other => panic!("Expected MergeMarker, got {other:?}"),
    }

    let body = "# poja-merge: custom_java_env_vars\n# poja-merge: custom_java_env_vars\n";
    let result = render_tree(&[(CATALOG_FILE, manifest), ("template.yml", body)], &config(&[]));
    assert!(matches!(result, Err(RenderError::MergeMarker { found: 2, .. })));
}

#[test]
fn test_executable_flag_is_carried() {
    let manifest = "executables:\n  - \"*.sh\"\n";
    let rendered = render_tree(
        &[(CATALOG_FILE, manifest), ("run.sh", "#!/bin/sh\n"), ("notes.txt", "n")],
        &config(&[]),
    )
    .unwrap();

    let executable: Vec<bool> = rendered
        .iter()
        .filter_map(|r| match r {
            Rendered::File { executable, .. } => Some(*executable),
            Rendered::Directory { .. } => None,
        })
        .collect();
    assert_eq!(executable, vec![false, true]);
}
