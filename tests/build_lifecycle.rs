// tests/build_lifecycle.rs

use std::collections::BTreeSet;
use std::path::Path;

use assetflow::config::{ConfigFile, load_from_str};
use assetflow::engine::lifecycle::{Lifecycle, run_build, run_task, start_dev_session};
use assetflow::engine::LifecyclePhase;
use assetflow::errors::AssetflowError;
use assetflow::tasks::{RunContext, TaskRegistry};
use assetflow::transform::BuildSettings;
use assetflow::types::{Mode, ReloadKind};
use assetflow_test_utils::fakes::{EventLog, RecordingTransformer};
use assetflow_test_utils::{dev_settings, init_tracing, with_timeout};
use walkdir::WalkDir;

const SITE: &str = r#"
[config]
output = "dist"

[pipeline]
clean = "clean"
build = "assets"

[task.clean]
action = "clean"

[task."copy:html"]
action = "copy"
src = ["./src/*.html"]
dest = "."

[task.fonts]
action = "copy"
src = ["./src/fonts/**"]
dest = "fonts"

[task.scripts]
action = "concat"
src = ["vendor/jquery.js", "src/scripts/*.js"]
dest = "main.min.js"
separator = ";"

[task.assets]
parallel = ["copy:html", "fonts", "scripts"]
"#;

fn write(root: &Path, rel: &str, body: &str) {
    let p = root.join(rel);
    std::fs::create_dir_all(p.parent().unwrap()).unwrap();
    std::fs::write(p, body).unwrap();
}

fn files_under(dir: &Path) -> BTreeSet<String> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(dir)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

fn site_config() -> ConfigFile {
    ConfigFile::try_from(load_from_str(SITE).unwrap()).unwrap()
}

fn seed_site(root: &Path) {
    write(root, "src/index.html", "<html><body>home</body></html>");
    write(root, "src/fonts/roboto.woff2", "font");
    write(root, "src/scripts/app.js", "app()");
    write(root, "vendor/jquery.js", "jq()");
    // Leftover from an earlier build with a task that no longer exists.
    write(root, "dist/old/stale.css", "stale");
}

#[tokio::test]
async fn build_leaves_exactly_the_produced_files() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    seed_site(dir.path());

    let cfg = site_config();
    let registry = TaskRegistry::from_config(&cfg).unwrap();
    let settings = BuildSettings::new(dir.path(), &cfg.config.output, Mode::Production);
    let ctx = RunContext::new(settings.clone());

    let report = with_timeout(run_build(&registry, &ctx, &cfg.pipeline)).await.unwrap();

    let expected: BTreeSet<String> = ["index.html", "fonts/roboto.woff2", "main.min.js"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(files_under(&settings.output), expected);
    assert_eq!(report.outputs.len(), 3);
    assert_eq!(
        std::fs::read_to_string(settings.output.join("main.min.js")).unwrap(),
        "jq();app()"
    );
}

#[tokio::test]
async fn build_failure_is_an_error_naming_the_task() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    seed_site(dir.path());
    std::fs::remove_file(dir.path().join("vendor/jquery.js")).unwrap();

    let cfg = site_config();
    let registry = TaskRegistry::from_config(&cfg).unwrap();
    let ctx = RunContext::new(BuildSettings::new(dir.path(), "dist", Mode::Development));

    let err = with_timeout(run_build(&registry, &ctx, &cfg.pipeline)).await.unwrap_err();
    match err {
        AssetflowError::Task(failure) => {
            assert_eq!(failure.task, "scripts");
            assert_eq!(failure.path, Some(dir.path().join("vendor/jquery.js")));
        }
        other => panic!("expected task failure, got {other:?}"),
    }
}

#[tokio::test]
async fn clean_failure_is_fatal_and_build_never_starts() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let log = EventLog::new();
    let mut registry = TaskRegistry::new();
    registry
        .register(
            "clean",
            RecordingTransformer::new("clean", &log).failing("locked").arc(),
            ReloadKind::None,
        )
        .unwrap();
    registry
        .register("build", RecordingTransformer::new("build", &log).arc(), ReloadKind::None)
        .unwrap();
    let cfg = site_config();
    let mut pipeline = cfg.pipeline.clone();
    pipeline.build = "build".into();

    let ctx = RunContext::new(dev_settings(dir.path()));
    let mut lifecycle = Lifecycle::new();
    let err = start_dev_session(&mut lifecycle, &registry, &ctx, &pipeline)
        .await
        .unwrap_err();

    assert!(matches!(err, AssetflowError::Task(_)));
    assert_eq!(lifecycle.phase(), LifecyclePhase::Done);
    assert!(!log.started("build"));
}

#[tokio::test]
async fn dev_session_serves_even_when_initial_build_fails() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let log = EventLog::new();
    let mut registry = TaskRegistry::new();
    registry
        .register("clean", RecordingTransformer::new("clean", &log).arc(), ReloadKind::None)
        .unwrap();
    registry
        .register(
            "build",
            RecordingTransformer::new("build", &log).failing("scss syntax").arc(),
            ReloadKind::None,
        )
        .unwrap();
    let mut pipeline = site_config().pipeline;
    pipeline.build = "build".into();

    let ctx = RunContext::new(dev_settings(dir.path()));
    let mut lifecycle = Lifecycle::new();
    start_dev_session(&mut lifecycle, &registry, &ctx, &pipeline)
        .await
        .unwrap();

    assert_eq!(lifecycle.phase(), LifecyclePhase::SteadyServing);
    let clean_done = log.position(&assetflow_test_utils::fakes::Event::Finished("clean".into()));
    let build_start = log.position(&assetflow_test_utils::fakes::Event::Started("build".into()));
    assert!(clean_done.unwrap() < build_start.unwrap());
}

#[tokio::test]
async fn run_single_task_does_not_clean() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    seed_site(dir.path());

    let cfg = site_config();
    let registry = TaskRegistry::from_config(&cfg).unwrap();
    let settings = dev_settings(dir.path());
    let ctx = RunContext::new(settings.clone());

    run_task(&registry, &ctx, "copy:html").await.unwrap();

    assert!(settings.output.join("index.html").is_file());
    assert!(settings.output.join("old/stale.css").is_file());
}

#[tokio::test]
async fn run_unknown_task_is_task_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let registry = TaskRegistry::from_config(&site_config()).unwrap();
    let ctx = RunContext::new(dev_settings(dir.path()));

    let err = run_task(&registry, &ctx, "sprites").await.unwrap_err();
    assert!(matches!(err, AssetflowError::TaskNotFound(name) if name == "sprites"));
}
