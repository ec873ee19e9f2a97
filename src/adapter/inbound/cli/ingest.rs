//! Handler for the `ingest` command.

use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use crate::adapter::inbound::cli::command::IngestArgs;
use crate::domain::event::parse_events;
use crate::error::Result;
use crate::port::OrderOperator;

/// Run one invocation per event in the file and print each outcome.
///
/// Exits with failure when any invocation aborted.
pub async fn execute(args: &IngestArgs, operator: &dyn OrderOperator) -> Result<ExitCode> {
    let payload = read_payload(&args.event)?;
    let events = parse_events(&payload)?;

    let mut aborted = false;
    for event in &events {
        let outcome = operator.ingest(event).await;
        aborted |= outcome.is_aborted();
        println!("{outcome}");
    }

    Ok(if aborted {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn read_payload(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        return Ok(buf);
    }
    Ok(std::fs::read(path)?)
}
