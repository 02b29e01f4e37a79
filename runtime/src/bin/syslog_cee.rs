//! syslog-cee - reads JSON events on stdin, writes RFC 5424 lines to stdout
//!
//! Configured through `SYSLOG_FILTER_*` environment variables; `RUST_LOG`
//! overrides the log level. Pass `--pretty` for a human-readable view.

use std::time::Duration;
use syslog_cee_runtime::RuntimeBuilder;

fn main() -> anyhow::Result<()> {
    let pretty = std::env::args().skip(1).any(|arg| arg == "--pretty");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(RuntimeBuilder::new().pretty_output(pretty).run());

    // A pending stdin read sits on the blocking pool and never returns
    // after a signal; don't wait for it.
    runtime.shutdown_timeout(Duration::from_millis(100));

    result
}
