//! In-memory display sink.

use crate::core::error::ChitraResult;
use crate::core::types::Frame;
use crate::engine::FrameSink;
use std::collections::VecDeque;
use std::path::Path;

/// Generations kept by [`RenderView::history`]; older ones are dropped.
pub const HISTORY_LIMIT: usize = 1024;

/// Keeps the latest presented frame, a count of presented frames and the
/// generations of the most recent ones.
#[derive(Debug, Default)]
pub struct RenderView {
    latest: Option<Frame>,
    presented: usize,
    history: VecDeque<u64>,
}

impl RenderView {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent frame.
    pub fn latest(&self) -> Option<&Frame> {
        self.latest.as_ref()
    }

    /// How many frames have been presented.
    pub fn presented(&self) -> usize {
        self.presented
    }

    /// Generations of the last [`HISTORY_LIMIT`] presented frames, oldest first.
    pub fn history(&self) -> Vec<u64> {
        self.history.iter().copied().collect()
    }

    /// Forget everything seen so far.
    pub fn clear(&mut self) {
        self.latest = None;
        self.presented = 0;
        self.history.clear();
    }

    /// Write the latest frame as an image file. Returns false if nothing has
    /// been presented yet.
    pub fn save(&self, path: impl AsRef<Path>) -> ChitraResult<bool> {
        match &self.latest {
            Some(frame) => {
                frame.image().save(path)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl FrameSink for RenderView {
    fn present(&mut self, frame: &Frame) {
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(frame.generation());
        self.presented += 1;
        self.latest = Some(frame.clone());
    }
}
