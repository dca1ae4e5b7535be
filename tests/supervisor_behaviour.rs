// tests/supervisor_behaviour.rs
//
// End-to-end behaviour of the supervisor against a real `sh`.

#![cfg(unix)]

mod common;
use crate::common::{init_tracing, invocation, supervisor, with_timeout};

use std::time::{Duration, Instant};

use rvc_bootstrap::errors::SupervisorError;
use rvc_bootstrap::exec::{Shell, StreamKind, Supervisor};
use rvc_bootstrap_test_utils::builders::ConfigBuilder;
use rvc_bootstrap_test_utils::fake_runner::RecordingSink;

#[tokio::test]
async fn captures_stdout_in_order() {
    init_tracing();
    let (mut sup, sink) = supervisor();

    let result = with_timeout(sup.run(&invocation("echo A && echo B")))
        .await
        .expect("echo should succeed");

    assert_eq!(result.stdout, "A\nB\n");
    assert_eq!(result.stderr, "");
    assert_eq!(result.exit_code, 0);
    assert!(!result.timed_out);

    let forwarded: Vec<String> = sink.lines().iter().map(|l| l.text.clone()).collect();
    assert_eq!(forwarded, vec!["A\n", "B\n"]);
}

#[tokio::test]
async fn nonzero_exit_is_data_without_fail_fast() {
    init_tracing();
    let (mut sup, _sink) = supervisor();

    let result = with_timeout(sup.run(&invocation("exit 3").fail_fast(false)))
        .await
        .expect("nonzero exit is not an error without fail-fast");

    assert_eq!(result.exit_code, 3);
    assert!(!result.is_success());
}

#[tokio::test]
async fn nonzero_exit_is_fatal_with_fail_fast() {
    init_tracing();
    let (mut sup, sink) = supervisor();

    let err = with_timeout(sup.run(&invocation("echo partial; exit 3")))
        .await
        .expect_err("fail-fast must turn exit 3 into an error");

    assert_eq!(err.description(), "test `echo partial; exit 3`");
    match err {
        SupervisorError::NonZeroExit { code, ref result, .. } => {
            assert_eq!(code, 3);
            assert_eq!(result.stdout, "partial\n");
        }
        other => panic!("expected NonZeroExit, got {other:?}"),
    }
    assert_eq!(sink.failures(), vec![3]);
}

#[tokio::test]
async fn timeout_kills_and_reports_partial_output() {
    init_tracing();
    let (mut sup, _sink) = supervisor();
    let inv = invocation("echo before; sleep 5; echo after").timeout(Duration::from_secs(1));

    let started = Instant::now();
    let err = with_timeout(sup.run(&inv))
        .await
        .expect_err("sleep 5 must exceed a 1s timeout");
    let elapsed = started.elapsed();

    match err {
        SupervisorError::Timeout { timeout, partial, .. } => {
            assert_eq!(timeout, Duration::from_secs(1));
            assert!(partial.timed_out);
            assert!(partial.stdout.contains("before"));
            assert!(!partial.stdout.contains("after"));
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
    assert!(elapsed < Duration::from_secs(4), "took {elapsed:?}");
}

#[tokio::test]
async fn timeout_applies_without_fail_fast() {
    init_tracing();
    let (mut sup, _sink) = supervisor();
    let inv = invocation("sleep 5")
        .fail_fast(false)
        .timeout(Duration::from_millis(300));

    let err = with_timeout(sup.run(&inv)).await.expect_err("timeout is always fatal");
    assert!(matches!(err, SupervisorError::Timeout { .. }));
}

#[tokio::test]
async fn separates_stdout_and_stderr() {
    init_tracing();
    let (mut sup, _sink) = supervisor();

    let result = with_timeout(sup.run(&invocation("echo out; echo err 1>&2")))
        .await
        .unwrap();

    assert_eq!(result.stdout, "out\n");
    assert_eq!(result.stderr, "err\n");
}

#[tokio::test]
async fn per_stream_order_survives_interleaving() {
    init_tracing();
    let (mut sup, sink) = supervisor();
    let cmd = "for i in 1 2 3 4 5 6 7 8; do echo o$i; echo e$i 1>&2; done";

    let result = with_timeout(sup.run(&invocation(cmd))).await.unwrap();

    assert_eq!(result.stdout, "o1\no2\no3\no4\no5\no6\no7\no8\n");
    assert_eq!(result.stderr, "e1\ne2\ne3\ne4\ne5\ne6\ne7\ne8\n");

    let lines = sink.lines();
    for stream in [StreamKind::Stdout, StreamKind::Stderr] {
        let seqs: Vec<u64> = lines
            .iter()
            .filter(|l| l.stream == stream)
            .map(|l| l.seq)
            .collect();
        assert_eq!(seqs.len(), 8);
        assert!(seqs.windows(2).all(|w| w[0] < w[1]), "{stream}: {seqs:?}");
    }
}

#[tokio::test]
async fn keeps_final_line_without_terminator() {
    init_tracing();
    let (mut sup, _sink) = supervisor();

    let result = with_timeout(sup.run(&invocation("printf 'a\\nb'")))
        .await
        .unwrap();

    assert_eq!(result.stdout, "a\nb");
}

#[tokio::test]
async fn replaces_invalid_utf8() {
    init_tracing();
    let (mut sup, _sink) = supervisor();

    let result = with_timeout(sup.run(&invocation("printf 'x\\377y\\n'")))
        .await
        .unwrap();

    assert_eq!(result.exit_code, 0);
    assert_eq!(result.stdout, "x\u{FFFD}y\n");
}

#[tokio::test]
async fn injects_unbuffered_environment() {
    init_tracing();
    let (mut sup, _sink) = supervisor();

    let result = with_timeout(sup.run(&invocation("echo \"$PYTHONUNBUFFERED\"")))
        .await
        .unwrap();

    assert_eq!(result.stdout, "1\n");
}

#[tokio::test]
async fn honours_working_directory() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "x").unwrap();
    let (mut sup, _sink) = supervisor();

    let result = with_timeout(sup.run(&invocation("ls").in_dir(dir.path())))
        .await
        .unwrap();

    assert_eq!(result.stdout, "marker.txt\n");
}

#[tokio::test]
async fn missing_shell_is_a_spawn_error() {
    init_tracing();
    let mut sup = Supervisor::new()
        .with_shell(Shell::new("/definitely/not/a/shell", "-c"))
        .with_sink(RecordingSink::new());

    let err = with_timeout(sup.run(&invocation("echo hi")))
        .await
        .expect_err("spawning a missing program fails");

    match err {
        SupervisorError::Spawn { command, .. } => assert_eq!(command, "echo hi"),
        other => panic!("expected Spawn, got {other:?}"),
    }
}

#[tokio::test]
async fn repeated_runs_are_independent() {
    init_tracing();
    let (mut sup, _sink) = supervisor();
    let inv = invocation("echo same; echo also 1>&2").fail_fast(false);

    let first = with_timeout(sup.run(&inv)).await.unwrap();
    let second = with_timeout(sup.run(&inv)).await.unwrap();

    assert_eq!(first.stdout, second.stdout);
    assert_eq!(first.stderr, second.stderr);
    assert_eq!(first.exit_code, second.exit_code);
}

#[tokio::test]
async fn command_finishing_before_timeout_is_not_killed() {
    init_tracing();
    let (mut sup, _sink) = supervisor();
    let inv = invocation("sleep 0.2; echo done").timeout(Duration::from_secs(3));

    let result = with_timeout(sup.run(&inv)).await.unwrap();

    assert_eq!(result.stdout, "done\n");
    assert!(!result.timed_out);
}

#[tokio::test]
async fn configured_env_keeps_unbuffered_hint() {
    init_tracing();
    let cfg = ConfigBuilder::new()
        .shell(&["sh", "-c"])
        .poll_interval_ms(10)
        .env(&[("PIP_NO_CACHE_DIR", "1")])
        .build();
    assert!(!cfg.supervisor.env.contains_key("PYTHONUNBUFFERED"));

    let mut sup = Supervisor::from_config(&cfg.supervisor).with_sink(RecordingSink::new());
    let result = with_timeout(sup.run(&invocation("echo \"[$PYTHONUNBUFFERED|$PIP_NO_CACHE_DIR]\"")))
        .await
        .unwrap();

    assert_eq!(result.stdout, "[1|1]\n");
}

#[tokio::test]
async fn configured_env_can_override_unbuffered_value() {
    init_tracing();
    let cfg = ConfigBuilder::new()
        .shell(&["sh", "-c"])
        .env(&[("PYTHONUNBUFFERED", "0")])
        .build();

    let mut sup = Supervisor::from_config(&cfg.supervisor).with_sink(RecordingSink::new());
    let result = with_timeout(sup.run(&invocation("echo \"$PYTHONUNBUFFERED\"")))
        .await
        .unwrap();

    assert_eq!(result.stdout, "0\n");
}
