// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//! Each host gets its own process lane; stalls appear as complete events
//! spanning the late interval.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use casement_core::stability::GateOutcome;
use casement_core::time::HostTime;
use casement_core::trace::PaintOutcome;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Host milliseconds are converted to the format's microseconds.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        let pid = recorded.host().get();
        let ts = ms_to_us(recorded.now());
        match recorded {
            RecordedEvent::Pass { index, rule, .. } => {
                events.push(json!({
                    "ph": "i",
                    "name": rule.as_deref().unwrap_or("idle"),
                    "cat": "Reconcile",
                    "ts": ts,
                    "pid": pid,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "index": index,
                    }
                }));
            }
            RecordedEvent::Gate(e) => {
                let (outcome, until) = match e.outcome {
                    GateOutcome::Programmatic => ("programmatic", None),
                    GateOutcome::Stable => ("stable", None),
                    GateOutcome::Wait(at) => ("wait", Some(ms_to_us(at))),
                };
                events.push(json!({
                    "ph": "i",
                    "name": format!("Gate {:?}", e.event),
                    "cat": "Stability",
                    "ts": ts,
                    "pid": pid,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "outcome": outcome,
                        "until_us": until,
                    }
                }));
            }
            RecordedEvent::Fire(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.event),
                    "cat": "Event",
                    "ts": ts,
                    "pid": pid,
                    "tid": 1,
                    "s": "p",
                }));
            }
            RecordedEvent::BackingCall(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.op),
                    "cat": "Backing",
                    "ts": ts,
                    "pid": pid,
                    "tid": 2,
                    "s": "t",
                    "args": {
                        "ok": e.ok,
                    }
                }));
            }
            RecordedEvent::Stall(e) => {
                let dur = e.lateness.millis() as f64 * 1000.0;
                events.push(json!({
                    "ph": "X",
                    "name": "Stall",
                    "cat": "Scheduler",
                    "ts": ts - dur,
                    "dur": dur,
                    "pid": pid,
                    "tid": 0,
                    "args": {
                        "newest_unstability_us": ms_to_us(e.newest_unstability),
                    }
                }));
            }
            RecordedEvent::Paint(e) => {
                let (name, args) = match e.outcome {
                    PaintOutcome::Painted(r) => (
                        "Paint",
                        json!({ "rect": [r.x0, r.y0, r.x1, r.y1] }),
                    ),
                    PaintOutcome::Deferred(at) => {
                        ("PaintDeferred", json!({ "until_us": ms_to_us(at) }))
                    }
                    PaintOutcome::Skipped => ("PaintSkipped", json!({})),
                    PaintOutcome::Failed => ("PaintFailed", json!({})),
                };
                events.push(json!({
                    "ph": "i",
                    "name": name,
                    "cat": "Paint",
                    "ts": ts,
                    "pid": pid,
                    "tid": 3,
                    "s": "t",
                    "args": args,
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn ms_to_us(t: HostTime) -> f64 {
    t.millis() as f64 * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use casement_core::event::WindowEvent;
    use casement_core::id::HostId;
    use casement_core::time::Duration;
    use casement_core::trace::{FireEvent, PassEvent, StallEvent, TraceSink};

    #[test]
    fn export_produces_valid_json() {
        let host = HostId::from_raw(3);
        let mut rec = RecorderSink::new();
        rec.on_pass(&PassEvent {
            host,
            now: HostTime(10),
            index: 0,
            rule: Some("visibility"),
        });
        rec.on_event(&FireEvent {
            host,
            now: HostTime(10),
            event: WindowEvent::Shown,
        });
        rec.on_stall(&StallEvent {
            host,
            now: HostTime(900),
            lateness: Duration(300),
            newest_unstability: HostTime(900),
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        // Should parse as a JSON array.
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 3);

        assert_eq!(parsed[0]["name"], "visibility");
        assert_eq!(parsed[0]["pid"], 3);

        assert_eq!(parsed[1]["ph"], "i");
        assert_eq!(parsed[1]["name"], "Shown");
        assert_eq!(parsed[1]["ts"], 10_000.0);

        // Stall spans the late interval.
        assert_eq!(parsed[2]["ph"], "X");
        assert_eq!(parsed[2]["ts"], 600_000.0);
        assert_eq!(parsed[2]["dur"], 300_000.0);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
