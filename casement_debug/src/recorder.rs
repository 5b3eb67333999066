// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records, each starting with a one-byte tag.
//! [`decode`] reads them back as an iterator of [`RecordedEvent`].
//!
//! Rule names are stored as length-prefixed UTF-8, so a decoded
//! [`RecordedEvent::Pass`] owns its name.

use casement_core::backing::BackingOp;
use casement_core::event::{StateEvent, WindowEvent};
use casement_core::geometry::Rect;
use casement_core::id::HostId;
use casement_core::stability::GateOutcome;
use casement_core::time::{Duration, HostTime};
use casement_core::trace::{
    BackingCallEvent, FireEvent, GateEvent, PaintEvent, PaintOutcome, PassEvent, StallEvent,
    TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PASS: u8 = 1;
const TAG_GATE: u8 = 2;
const TAG_FIRE: u8 = 3;
const TAG_BACKING_CALL: u8 = 4;
const TAG_STALL: u8 = 5;
const TAG_PAINT: u8 = 6;

const WINDOW_EVENTS: [WindowEvent; 11] = [
    WindowEvent::Shown,
    WindowEvent::Hidden,
    WindowEvent::FocusGained,
    WindowEvent::FocusLost,
    WindowEvent::Iconified,
    WindowEvent::Deiconified,
    WindowEvent::Maximized,
    WindowEvent::Demaximized,
    WindowEvent::Moved,
    WindowEvent::Resized,
    WindowEvent::Closed,
];

const STATE_EVENTS: [StateEvent; 6] = [
    StateEvent::Shown,
    StateEvent::Hidden,
    StateEvent::Iconified,
    StateEvent::Deiconified,
    StateEvent::Maximized,
    StateEvent::Demaximized,
];

fn code_of<T: PartialEq>(table: &[T], value: &T) -> u8 {
    table
        .iter()
        .position(|v| v == value)
        .and_then(|i| u8::try_from(i).ok())
        .unwrap_or(u8::MAX)
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_header(&mut self, tag: u8, host: HostId, now: HostTime) {
        self.write_u8(tag);
        self.write_u32(host.get());
        self.write_u64(now.millis());
    }

    fn write_name(&mut self, name: Option<&str>) {
        match name {
            Some(name) => {
                let bytes = &name.as_bytes()[..name.len().min(u8::MAX as usize)];
                self.write_u8(1);
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "length clamped to u8::MAX above"
                )]
                self.write_u8(bytes.len() as u8);
                self.buf.extend_from_slice(bytes);
            }
            None => self.write_u8(0),
        }
    }

    fn write_backing_op(&mut self, op: BackingOp) {
        let (code, arg) = match op {
            BackingOp::Show => (0, false),
            BackingOp::Hide => (1, false),
            BackingOp::RequestFocusGain => (2, false),
            BackingOp::SetIconified(v) => (3, v),
            BackingOp::SetMaximized(v) => (4, v),
            BackingOp::SetClientBounds => (5, false),
            BackingOp::SetWindowBounds => (6, false),
            BackingOp::Close => (7, false),
        };
        self.write_u8(code);
        self.write_u8(u8::from(arg));
    }
}

impl TraceSink for RecorderSink {
    fn on_pass(&mut self, e: &PassEvent) {
        self.write_header(TAG_PASS, e.host, e.now);
        self.write_u32(e.index);
        self.write_name(e.rule);
    }

    fn on_gate(&mut self, e: &GateEvent) {
        self.write_header(TAG_GATE, e.host, e.now);
        self.write_u8(code_of(&STATE_EVENTS, &e.event));
        let (kind, at) = match e.outcome {
            GateOutcome::Programmatic => (0, 0),
            GateOutcome::Stable => (1, 0),
            GateOutcome::Wait(at) => (2, at.millis()),
        };
        self.write_u8(kind);
        self.write_u64(at);
    }

    fn on_event(&mut self, e: &FireEvent) {
        self.write_header(TAG_FIRE, e.host, e.now);
        self.write_u8(code_of(&WINDOW_EVENTS, &e.event));
    }

    fn on_backing_call(&mut self, e: &BackingCallEvent) {
        self.write_header(TAG_BACKING_CALL, e.host, e.now);
        self.write_backing_op(e.op);
        self.write_u8(u8::from(e.ok));
    }

    fn on_stall(&mut self, e: &StallEvent) {
        self.write_header(TAG_STALL, e.host, e.now);
        self.write_u64(e.lateness.millis());
        self.write_u64(e.newest_unstability.millis());
    }

    fn on_paint(&mut self, e: &PaintEvent) {
        self.write_header(TAG_PAINT, e.host, e.now);
        match e.outcome {
            PaintOutcome::Painted(r) => {
                self.write_u8(0);
                for v in [r.x0, r.y0, r.x1, r.y1] {
                    self.write_f64(v);
                }
            }
            PaintOutcome::Deferred(at) => {
                self.write_u8(1);
                self.write_u64(at.millis());
            }
            PaintOutcome::Skipped => self.write_u8(2),
            PaintOutcome::Failed => self.write_u8(3),
        }
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`PassEvent`], with an owned rule name.
    Pass {
        /// The host.
        host: HostId,
        /// Pass start time.
        now: HostTime,
        /// Index within the reconciliation run.
        index: u32,
        /// The matching rule, or `None` for an idle pass.
        rule: Option<String>,
    },
    /// A [`GateEvent`].
    Gate(GateEvent),
    /// A [`FireEvent`].
    Fire(FireEvent),
    /// A [`BackingCallEvent`].
    BackingCall(BackingCallEvent),
    /// A [`StallEvent`].
    Stall(StallEvent),
    /// A [`PaintEvent`].
    Paint(PaintEvent),
}

impl RecordedEvent {
    /// The host the event belongs to.
    #[must_use]
    pub fn host(&self) -> HostId {
        match self {
            Self::Pass { host, .. } => *host,
            Self::Gate(e) => e.host,
            Self::Fire(e) => e.host,
            Self::BackingCall(e) => e.host,
            Self::Stall(e) => e.host,
            Self::Paint(e) => e.host,
        }
    }

    /// When the event happened.
    #[must_use]
    pub fn now(&self) -> HostTime {
        match self {
            Self::Pass { now, .. } => *now,
            Self::Gate(e) => e.now,
            Self::Fire(e) => e.now,
            Self::BackingCall(e) => e.now,
            Self::Stall(e) => e.now,
            Self::Paint(e) => e.now,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
///
/// Stops at the first truncated record or unknown tag.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.take().map(f64::from_le_bytes)
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_header(&mut self) -> Option<(HostId, HostTime)> {
        Some((
            HostId::from_raw(self.read_u32()?),
            HostTime(self.read_u64()?),
        ))
    }

    fn read_name(&mut self) -> Option<Option<String>> {
        if self.read_u8()? == 0 {
            return Some(None);
        }
        let len = usize::from(self.read_u8()?);
        let bytes = self.data.get(self.pos..self.pos + len)?;
        self.pos += len;
        Some(Some(String::from_utf8_lossy(bytes).into_owned()))
    }

    fn read_state_event(&mut self) -> Option<StateEvent> {
        STATE_EVENTS.get(usize::from(self.read_u8()?)).copied()
    }

    fn read_window_event(&mut self) -> Option<WindowEvent> {
        WINDOW_EVENTS.get(usize::from(self.read_u8()?)).copied()
    }

    fn read_backing_op(&mut self) -> Option<BackingOp> {
        let code = self.read_u8()?;
        let arg = self.read_bool()?;
        Some(match code {
            0 => BackingOp::Show,
            1 => BackingOp::Hide,
            2 => BackingOp::RequestFocusGain,
            3 => BackingOp::SetIconified(arg),
            4 => BackingOp::SetMaximized(arg),
            5 => BackingOp::SetClientBounds,
            6 => BackingOp::SetWindowBounds,
            7 => BackingOp::Close,
            _ => return None,
        })
    }

    fn decode_pass(&mut self) -> Option<RecordedEvent> {
        let (host, now) = self.read_header()?;
        Some(RecordedEvent::Pass {
            host,
            now,
            index: self.read_u32()?,
            rule: self.read_name()?,
        })
    }

    fn decode_gate(&mut self) -> Option<RecordedEvent> {
        let (host, now) = self.read_header()?;
        let event = self.read_state_event()?;
        let kind = self.read_u8()?;
        let at = HostTime(self.read_u64()?);
        let outcome = match kind {
            0 => GateOutcome::Programmatic,
            1 => GateOutcome::Stable,
            2 => GateOutcome::Wait(at),
            _ => return None,
        };
        Some(RecordedEvent::Gate(GateEvent {
            host,
            now,
            event,
            outcome,
        }))
    }

    fn decode_fire(&mut self) -> Option<RecordedEvent> {
        let (host, now) = self.read_header()?;
        Some(RecordedEvent::Fire(FireEvent {
            host,
            now,
            event: self.read_window_event()?,
        }))
    }

    fn decode_backing_call(&mut self) -> Option<RecordedEvent> {
        let (host, now) = self.read_header()?;
        Some(RecordedEvent::BackingCall(BackingCallEvent {
            host,
            now,
            op: self.read_backing_op()?,
            ok: self.read_bool()?,
        }))
    }

    fn decode_stall(&mut self) -> Option<RecordedEvent> {
        let (host, now) = self.read_header()?;
        Some(RecordedEvent::Stall(StallEvent {
            host,
            now,
            lateness: Duration(self.read_u64()?),
            newest_unstability: HostTime(self.read_u64()?),
        }))
    }

    fn decode_paint(&mut self) -> Option<RecordedEvent> {
        let (host, now) = self.read_header()?;
        let outcome = match self.read_u8()? {
            0 => PaintOutcome::Painted(Rect::new(
                self.read_f64()?,
                self.read_f64()?,
                self.read_f64()?,
                self.read_f64()?,
            )),
            1 => PaintOutcome::Deferred(HostTime(self.read_u64()?)),
            2 => PaintOutcome::Skipped,
            3 => PaintOutcome::Failed,
            _ => return None,
        };
        Some(RecordedEvent::Paint(PaintEvent { host, now, outcome }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_PASS => self.decode_pass(),
            TAG_GATE => self.decode_gate(),
            TAG_FIRE => self.decode_fire(),
            TAG_BACKING_CALL => self.decode_backing_call(),
            TAG_STALL => self.decode_stall(),
            TAG_PAINT => self.decode_paint(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: HostId = HostId::from_raw(9);

    #[test]
    fn mixed_recording_decodes_in_order() {
        let mut rec = RecorderSink::new();
        rec.on_gate(&GateEvent {
            host: HOST,
            now: HostTime(1_000),
            event: StateEvent::Iconified,
            outcome: GateOutcome::Wait(HostTime(1_200)),
        });
        rec.on_pass(&PassEvent {
            host: HOST,
            now: HostTime(1_000),
            index: 2,
            rule: Some("iconification"),
        });
        rec.on_event(&FireEvent {
            host: HOST,
            now: HostTime(1_200),
            event: WindowEvent::Iconified,
        });
        rec.on_backing_call(&BackingCallEvent {
            host: HOST,
            now: HostTime(1_300),
            op: BackingOp::SetMaximized(true),
            ok: false,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(
            events[0],
            RecordedEvent::Gate(GateEvent {
                outcome: GateOutcome::Wait(HostTime(1_200)),
                ..
            })
        ));
        assert_eq!(
            events[1],
            RecordedEvent::Pass {
                host: HOST,
                now: HostTime(1_000),
                index: 2,
                rule: Some("iconification".to_owned()),
            }
        );
        match &events[2] {
            RecordedEvent::Fire(e) => assert_eq!(e.event, WindowEvent::Iconified),
            other => panic!("expected Fire, got {other:?}"),
        }
        match &events[3] {
            RecordedEvent::BackingCall(e) => {
                assert_eq!(e.op, BackingOp::SetMaximized(true));
                assert!(!e.ok);
            }
            other => panic!("expected BackingCall, got {other:?}"),
        }
        assert!(events.iter().all(|e| e.host() == HOST));
    }

    #[test]
    fn painted_rect_survives_recording() {
        let mut rec = RecorderSink::new();
        let rect = Rect::new(0.5, 1.0, 64.0, 48.25);
        rec.on_paint(&PaintEvent {
            host: HOST,
            now: HostTime(16),
            outcome: PaintOutcome::Painted(rect),
        });
        rec.on_paint(&PaintEvent {
            host: HOST,
            now: HostTime(17),
            outcome: PaintOutcome::Skipped,
        });
        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(
            events,
            [
                RecordedEvent::Paint(PaintEvent {
                    host: HOST,
                    now: HostTime(16),
                    outcome: PaintOutcome::Painted(rect),
                }),
                RecordedEvent::Paint(PaintEvent {
                    host: HOST,
                    now: HostTime(17),
                    outcome: PaintOutcome::Skipped,
                }),
            ]
        );
    }

    #[test]
    fn truncated_record_stops_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_stall(&StallEvent {
            host: HOST,
            now: HostTime(500),
            lateness: Duration(400),
            newest_unstability: HostTime(500),
        });
        rec.on_event(&FireEvent {
            host: HOST,
            now: HostTime(600),
            event: WindowEvent::Closed,
        });
        let bytes = rec.into_bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 1]).collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], RecordedEvent::Stall(_)));
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }
}
