//! Metrics sinks.
//!
//! The engine reports per-step debug notes and one [`EpisodeRecord`] per
//! episode. Sinks are notification-only: they cannot fail the run.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::episode::TerminalReason;

/// One row of training metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub episode: u32,
    pub entropy: f32,
    pub exploration: f32,
    pub terminal: TerminalReason,
    pub rooms: usize,
    pub env_width: f32,
    pub env_height: f32,
    pub frames: u32,
    pub frame_budget: u32,
    pub score: u32,
    pub room_changes: u32,
    pub random_actions: u32,
    pub reward: f32,
}

impl EpisodeRecord {
    pub const COLUMNS: [&'static str; 13] = [
        "id",
        "entropy",
        "epsilon",
        "terminal",
        "number-rooms",
        "env-width",
        "env-height",
        "frame-count",
        "frames-tot",
        "score",
        "room-changes",
        "random-actions",
        "reward",
    ];
}

impl fmt::Display for EpisodeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {} {} {} {} {} {} {}",
            self.episode,
            self.entropy,
            self.exploration,
            self.terminal,
            self.rooms,
            self.env_width,
            self.env_height,
            self.frames,
            self.frame_budget,
            self.score,
            self.room_changes,
            self.random_actions,
            self.reward
        )
    }
}

pub trait MetricsSink {
    fn debug(&mut self, step: u32, message: &str);
    fn log(&mut self, step: u32, record: &EpisodeRecord);
}

/// Forwards everything to the `log` facade.
#[derive(Debug, Default)]
pub struct LogMetrics;

impl MetricsSink for LogMetrics {
    fn debug(&mut self, step: u32, message: &str) {
        log::debug!("{} {}", step, message);
    }

    fn log(&mut self, step: u32, record: &EpisodeRecord) {
        log::info!("{} {}", step, record);
    }
}

/// Keeps every call in memory.
#[derive(Debug, Default)]
pub struct RecordingMetrics {
    pub messages: Vec<(u32, String)>,
    pub records: Vec<EpisodeRecord>,
}

impl MetricsSink for RecordingMetrics {
    fn debug(&mut self, step: u32, message: &str) {
        self.messages.push((step, message.to_string()));
    }

    fn log(&mut self, _step: u32, record: &EpisodeRecord) {
        self.records.push(record.clone());
    }
}
