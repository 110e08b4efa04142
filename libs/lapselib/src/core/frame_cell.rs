// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Single-slot latest-frame handoff between the cadence loop and a preview.
//!
//! Last-frame-wins: publishing replaces whatever was in the slot, nothing is
//! queued. A renderer that polls slower than the capture cadence simply sees
//! the newest frame.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::frames::VideoFrame;
use crate::core::traits::DisplaySink;

/// Shared one-frame slot.
#[derive(Clone, Default)]
pub struct FrameCell {
    slot: Arc<Mutex<Option<VideoFrame>>>,
}

impl FrameCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot contents with `frame`.
    pub fn publish(&self, frame: VideoFrame) {
        *self.slot.lock() = Some(frame);
    }

    /// Take the current frame out of the slot, leaving it empty.
    pub fn take(&self) -> Option<VideoFrame> {
        self.slot.lock().take()
    }

    /// Clone of the current frame, slot left untouched.
    pub fn latest(&self) -> Option<VideoFrame> {
        self.slot.lock().clone()
    }

    /// Frame number of the current occupant, if any.
    pub fn latest_frame_number(&self) -> Option<u64> {
        self.slot.lock().as_ref().map(|f| f.frame_number)
    }
}

/// `DisplaySink` that publishes into a `FrameCell`.
pub struct CellDisplay {
    cell: FrameCell,
}

impl CellDisplay {
    pub fn new(cell: FrameCell) -> Self {
        Self { cell }
    }
}

impl DisplaySink for CellDisplay {
    fn publish(&self, frame: &VideoFrame) {
        self.cell.publish(frame.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: u64) -> VideoFrame {
        let mut frame = VideoFrame::blank(2, 2);
        frame.frame_number = n;
        frame
    }

    #[test]
    fn test_last_frame_wins() {
        let cell = FrameCell::new();
        cell.publish(numbered(1));
        cell.publish(numbered(2));
        cell.publish(numbered(3));
        assert_eq!(cell.latest_frame_number(), Some(3));
    }

    #[test]
    fn test_take_empties_slot() {
        let cell = FrameCell::new();
        cell.publish(numbered(7));
        assert_eq!(cell.take().map(|f| f.frame_number), Some(7));
        assert!(cell.take().is_none());
    }

    #[test]
    fn test_latest_leaves_slot() {
        let cell = FrameCell::new();
        cell.publish(numbered(4));
        assert!(cell.latest().is_some());
        assert!(cell.latest().is_some());
    }

    #[test]
    fn test_cell_display_publishes() {
        let cell = FrameCell::new();
        let display = CellDisplay::new(cell.clone());
        display.publish(&numbered(9));
        assert_eq!(cell.latest_frame_number(), Some(9));
    }
}
