// tests/supervisor_ordering.rs
//
// Whatever a command prints on stdout comes back byte-for-byte, in order.

#![cfg(unix)]

use std::time::Duration;

use proptest::prelude::*;
use rvc_bootstrap::exec::{Invocation, Shell, Supervisor};
use rvc_bootstrap_test_utils::fake_runner::RecordingSink;

fn run_printf(lines: &[String]) -> (String, Vec<String>) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");

    let quoted: Vec<String> = lines.iter().map(|l| format!("'{l}'")).collect();
    let cmd = format!("printf '%s\\n' {}", quoted.join(" "));
    let sink = RecordingSink::new();
    let mut sup = Supervisor::new()
        .with_shell(Shell::new("sh", "-c"))
        .with_poll_interval(Duration::from_millis(5))
        .with_sink(sink.clone());

    let result = rt
        .block_on(sup.run(&Invocation::new(cmd, "printf lines")))
        .expect("printf succeeds");
    let forwarded = sink.lines().iter().map(|l| l.trimmed().to_string()).collect();
    (result.stdout, forwarded)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn stdout_preserves_emission_order(lines in proptest::collection::vec("[a-z0-9]{1,12}", 1..40)) {
        let (stdout, forwarded) = run_printf(&lines);

        let expected: String = lines.iter().map(|l| format!("{l}\n")).collect();
        prop_assert_eq!(stdout, expected);
        prop_assert_eq!(forwarded, lines);
    }
}
