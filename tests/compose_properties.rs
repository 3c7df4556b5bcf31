// tests/compose_properties.rs

use std::time::Duration;

use assetflow::tasks::{RunContext, TaskRegistry};
use assetflow::types::ReloadKind;
use assetflow_test_utils::dev_settings;
use assetflow_test_utils::fakes::{Event, EventLog, RecordingTransformer};
use proptest::prelude::*;

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
        .block_on(f)
}

/// Build a series over `delays.len()` leaves; `fail_at` makes that leaf fail.
fn series_registry(
    log: &EventLog,
    delays: &[u64],
    fail_at: Option<usize>,
) -> (TaskRegistry, Vec<String>) {
    let mut reg = TaskRegistry::new();
    let mut names = Vec::new();
    for (i, delay) in delays.iter().enumerate() {
        let name = format!("t{i}");
        let mut t =
            RecordingTransformer::new(&name, log).with_delay(Duration::from_millis(*delay));
        if fail_at == Some(i) {
            t = t.failing("injected");
        }
        reg.register(&name, t.arc(), ReloadKind::None).unwrap();
        names.push(name);
    }
    reg.compose_series("series", names.clone()).unwrap();
    (reg, names)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn series_never_starts_a_member_before_the_previous_one_finished(
        delays in proptest::collection::vec(0u64..4, 1..6)
    ) {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new();
        let (reg, names) = series_registry(&log, &delays, None);
        let ctx = RunContext::new(dev_settings(dir.path()));

        block_on(reg.run("series", &ctx)).unwrap();

        let expected: Vec<Event> = names
            .iter()
            .flat_map(|n| [Event::Started(n.clone()), Event::Finished(n.clone())])
            .collect();
        prop_assert_eq!(log.snapshot(), expected);
    }

    #[test]
    fn series_failure_prevents_every_later_member(
        (delays, fail_at) in (1usize..6).prop_flat_map(|n| {
            (proptest::collection::vec(0u64..3, n), 0..n)
        })
    ) {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new();
        let (reg, names) = series_registry(&log, &delays, Some(fail_at));
        let ctx = RunContext::new(dev_settings(dir.path()));

        let failure = block_on(reg.run("series", &ctx)).unwrap_err();

        prop_assert_eq!(&failure.task, &names[fail_at]);
        for (i, name) in names.iter().enumerate() {
            prop_assert_eq!(log.started(name), i <= fail_at);
        }
    }

    #[test]
    fn parallel_completes_after_every_member(
        delays in proptest::collection::vec(0u64..4, 1..6)
    ) {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new();
        let mut reg = TaskRegistry::new();
        let mut names = Vec::new();
        for (i, delay) in delays.iter().enumerate() {
            let name = format!("p{i}");
            reg.register(
                &name,
                RecordingTransformer::new(&name, &log).with_delay(Duration::from_millis(*delay)).arc(),
                ReloadKind::None,
            ).unwrap();
            names.push(name);
        }
        reg.compose_parallel("group", names.clone()).unwrap();
        let ctx = RunContext::new(dev_settings(dir.path()));

        block_on(reg.run("group", &ctx)).unwrap();

        for name in &names {
            prop_assert!(log.finished(name));
        }
    }
}
