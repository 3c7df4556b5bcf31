// tests/demo_config.rs

use std::path::PathBuf;

use assetflow::config::load_and_validate;
use assetflow::dag::DagGraph;
use assetflow::tasks::TaskRegistry;
use assetflow::types::ReloadKind;
use assetflow::watch::build_bindings_from_config;

fn demo_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/Assetflow.toml")
}

#[test]
fn demo_config_validates_and_registers() {
    let cfg = load_and_validate(demo_path()).unwrap();
    assert_eq!(cfg.config.mode_var, "NODE_ENV");

    let registry = TaskRegistry::from_config(&cfg).unwrap();
    for name in cfg.task.keys() {
        assert!(registry.contains(name), "{name} not registered");
    }
    assert_eq!(registry.reload_kind("styles"), ReloadKind::Css);
    assert_eq!(registry.reload_kind("scripts"), ReloadKind::Page);
}

#[test]
fn demo_build_covers_every_asset_class() {
    let cfg = load_and_validate(demo_path()).unwrap();
    let graph = DagGraph::from_config(&cfg);

    let leaves = graph.leaves_under(&cfg.pipeline.build);
    assert_eq!(
        leaves,
        vec![
            "copy:html",
            "fonts",
            "styles",
            "scripts:bundle",
            "scripts:minify",
            "icons",
            "image"
        ]
    );

    let order = graph.members_first_order();
    let pos = |n: &str| order.iter().position(|x| x == n).unwrap();
    assert!(pos("scripts:bundle") < pos("scripts"));
    assert!(pos("scripts") < pos("assets"));
}

#[test]
fn demo_watch_bindings_route_changes_to_their_task() {
    let cfg = load_and_validate(demo_path()).unwrap();
    let bindings = build_bindings_from_config(&cfg).unwrap();

    let tasks_for = |path: &str| -> Vec<&str> {
        bindings
            .iter()
            .filter(|b| b.matches(path))
            .map(|b| b.task())
            .collect()
    };

    assert_eq!(tasks_for("src/index.html"), vec!["copy:html"]);
    assert_eq!(tasks_for("src/styles/blocks/_header.scss"), vec!["styles"]);
    assert_eq!(tasks_for("src/scripts/swiper.js"), vec!["scripts"]);
    assert!(tasks_for("src/styles/.main.scss.swp").is_empty());
    assert!(tasks_for("dist/main.min.css").is_empty());
}
