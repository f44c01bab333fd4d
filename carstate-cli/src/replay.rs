//! Frame log replay
//!
//! Feeds a JSON-lines frame log through a [`CanSignalSource`] and runs one
//! decoder tick per tick period of log time, writing each [`VehicleState`]
//! as one JSON line.

use anyhow::{Context, Result};
use carstate_decoder::{CanFrame, CanSignalSource, MotionEstimator, StateDecoder, VehicleState};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::io::{BufRead, Write};

/// Summary of one replay run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Frames parsed from the log
    pub frames: u64,
    /// Frames that belonged to a subscribed group
    pub consumed: u64,
    /// Decoder ticks emitted
    pub ticks: u64,
    /// Lines that were not valid frames
    pub skipped_lines: u64,
}

#[derive(Serialize)]
struct TickRecord<'a> {
    tick: u64,
    timestamp: String,
    #[serde(flatten)]
    state: &'a VehicleState,
}

/// Drives a decoder over a frame log
pub struct Replay<'a, E: MotionEstimator> {
    decoder: &'a mut StateDecoder,
    source: &'a mut CanSignalSource,
    estimator: &'a mut E,
    period_ns: u64,
}

impl<'a, E: MotionEstimator> Replay<'a, E> {
    pub fn new(
        decoder: &'a mut StateDecoder,
        source: &'a mut CanSignalSource,
        estimator: &'a mut E,
        tick_hz: u32,
    ) -> Self {
        Self {
            decoder,
            source,
            estimator,
            period_ns: 1_000_000_000 / u64::from(tick_hz.max(1)),
        }
    }

    /// Replay every frame of `reader`, writing one state per tick to `writer`
    pub fn run<R: BufRead, W: Write>(&mut self, reader: R, writer: &mut W) -> Result<ReplayStats> {
        let mut stats = ReplayStats::default();
        let mut next_tick_ns: Option<u64> = None;

        for (index, line) in reader.lines().enumerate() {
            let line = line.context("Failed to read frame log")?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let frame: CanFrame = match serde_json::from_str(line) {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!("Skipping line {}: {}", index + 1, e);
                    stats.skipped_lines += 1;
                    continue;
                }
            };
            stats.frames += 1;

            // the first tick fires one period after the first frame
            let mut tick_ns =
                *next_tick_ns.get_or_insert(frame.timestamp_ns.saturating_add(self.period_ns));
            while frame.timestamp_ns >= tick_ns {
                self.tick(tick_ns, &mut stats, writer)?;
                // saturated: the clock cannot advance any further
                if tick_ns == u64::MAX {
                    break;
                }
                tick_ns = tick_ns.saturating_add(self.period_ns);
            }
            next_tick_ns = Some(tick_ns);

            if self.source.feed(&frame) {
                stats.consumed += 1;
            }
        }

        // flush whatever arrived after the last full period
        if let Some(tick_ns) = next_tick_ns {
            self.tick(tick_ns, &mut stats, writer)?;
        }

        for (bus, group) in self.source.missing_groups() {
            log::warn!("No frames received for {} on {}", group, bus);
        }

        Ok(stats)
    }

    fn tick<W: Write>(&mut self, tick_ns: u64, stats: &mut ReplayStats, writer: &mut W) -> Result<()> {
        let state = self.decoder.update(&*self.source, &mut *self.estimator);
        let record = TickRecord {
            tick: stats.ticks,
            timestamp: format_timestamp(tick_ns),
            state: &state,
        };
        serde_json::to_writer(&mut *writer, &record).context("Failed to serialize state")?;
        writeln!(writer).context("Failed to write state")?;
        stats.ticks += 1;
        Ok(())
    }
}

fn format_timestamp(timestamp_ns: u64) -> String {
    let secs = (timestamp_ns / 1_000_000_000) as i64;
    let nsecs = (timestamp_ns % 1_000_000_000) as u32;
    let time: DateTime<Utc> = DateTime::from_timestamp(secs, nsecs).unwrap_or_default();
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
