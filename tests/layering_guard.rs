//! Layering guardrails for the workspace crates.
//!
//! `nativize_core` is pure vocabulary and must stay dependency-free; `nativize_model` may only build on
//! `nativize_core` and serde. These tests scan the member manifests and fail if a dependency sneaks in.

/// Names listed in the `[dependencies]` table of a manifest.
fn dependencies(manifest: &str) -> Vec<String> {
    let mut in_dependencies = false;
    let mut names = Vec::new();

    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        // Track when we enter/exit the `[dependencies]` table.
        if line.starts_with('[') {
            in_dependencies = line == "[dependencies]";
            continue;
        }
        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }
        // Strip inline comments for robustness.
        let line_no_comment = line.split('#').next().unwrap_or("").trim();
        if let Some((name, _)) = line_no_comment.split_once('=') {
            names.push(name.trim().to_string());
        }
    }
    names
}

#[test]
fn core_has_no_dependencies() {
    let deps = dependencies(include_str!("../crates/nativize_core/Cargo.toml"));
    assert!(deps.is_empty(), "nativize_core must not depend on anything, found {:?}", deps);
}

#[test]
fn model_depends_only_on_core_and_serde() {
    let deps = dependencies(include_str!("../crates/nativize_model/Cargo.toml"));
    for dep in &deps {
        assert!(
            dep == "nativize_core" || dep == "serde",
            "nativize_model must not depend on `{}`",
            dep
        );
    }
}

#[test]
fn root_does_not_pull_in_test_crates() {
    let deps = dependencies(include_str!("../Cargo.toml"));
    for dev_only in ["insta", "proptest"] {
        assert!(
            !deps.iter().any(|d| d == dev_only),
            "`{}` must stay in [dev-dependencies]",
            dev_only
        );
    }
}
