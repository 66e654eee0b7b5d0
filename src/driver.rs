//! Headless replay of input events.
//!
//! Reads one JSON [`InputEvent`] per line, feeds it to an [`EditSession`] and
//! writes one JSON report per line: the effect of every event, and the
//! disposition of every finished recalculation.

use std::io::Write;
use std::time::Duration;

use anyhow::Context;
use cabinetkit_designer::{EditSession, EventEffect, InputEvent, OutcomeDisposition};
use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Counters for one replay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplaySummary {
    pub events: usize,
    pub rejected_lines: usize,
    pub outcomes: usize,
    /// The session still had work pending when the drain timeout hit
    pub timed_out: bool,
}

/// Replay `input` against `session`, then wait up to `drain_timeout` for
/// outstanding recalculations.
pub async fn replay<R, W>(
    session: &mut EditSession,
    input: R,
    output: &mut W,
    drain_timeout: Duration,
) -> anyhow::Result<ReplaySummary>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut summary = ReplaySummary::default();
    let mut line_no = 0usize;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read input")? else {
                    break;
                };
                line_no += 1;
                handle_line(session, line_no, &line, output, &mut summary)?;
            }
            Some(disposition) = session.next_outcome() => {
                summary.outcomes += 1;
                write_outcome(session, &disposition, output)?;
            }
        }
    }

    tracing::debug!("Input exhausted after {} line(s), draining", line_no);
    let deadline = tokio::time::Instant::now() + drain_timeout;
    while !session.is_idle() {
        match tokio::time::timeout_at(deadline, session.next_outcome()).await {
            Ok(Some(disposition)) => {
                summary.outcomes += 1;
                write_outcome(session, &disposition, output)?;
            }
            Ok(None) => break,
            Err(_) => {
                tracing::warn!("Recalculation still pending after {:?}", drain_timeout);
                summary.timed_out = true;
                break;
            }
        }
    }
    for disposition in session.drain_outcomes() {
        summary.outcomes += 1;
        write_outcome(session, &disposition, output)?;
    }

    output.flush()?;
    Ok(summary)
}

fn handle_line<W: Write>(
    session: &mut EditSession,
    line_no: usize,
    line: &str,
    output: &mut W,
    summary: &mut ReplaySummary,
) -> anyhow::Result<()> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(());
    }

    let event: InputEvent = match serde_json::from_str(line) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Line {}: not an input event: {}", line_no, e);
            summary.rejected_lines += 1;
            let report = json!({ "kind": "rejected", "line": line_no, "error": e.to_string() });
            return write_line(output, &report);
        }
    };

    summary.events += 1;
    let report = match session.handle(event) {
        EventEffect::Committed(snapshot) => json!({ "kind": "committed", "snapshot": snapshot }),
        EventEffect::Measured(measurement) => {
            json!({ "kind": "measured", "measurement": measurement })
        }
        EventEffect::ModeChanged { measuring } => json!({ "kind": "mode", "measuring": measuring }),
        EventEffect::Ignored => json!({ "kind": "ignored", "line": line_no }),
    };
    write_line(output, &report)
}

fn write_outcome<W: Write>(
    session: &EditSession,
    disposition: &OutcomeDisposition,
    output: &mut W,
) -> anyhow::Result<()> {
    let report = match disposition {
        OutcomeDisposition::Applied => {
            json!({ "kind": "outcome", "disposition": "applied", "status": session.status() })
        }
        OutcomeDisposition::Failed(err) => json!({
            "kind": "outcome",
            "disposition": "failed",
            "category": err.category(),
            "error": err.to_string(),
        }),
        OutcomeDisposition::Discarded => json!({ "kind": "outcome", "disposition": "discarded" }),
    };
    write_line(output, &report)
}

fn write_line<W: Write>(output: &mut W, value: &serde_json::Value) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *output, value)?;
    output.write_all(b"\n")?;
    Ok(())
}
