//! Band alignment buffer
//!
//! Eight circular lanes (six band lanes plus the raw stereo input) shared by
//! the two passes of a processing block. The split pass writes one frame per
//! sample; the compression pass then rewinds the read cursor to
//! `(write - block_len) mod size` and replays the same positions in order.

use td_core::Sample;

use crate::Processor;

/// Frames per lane
pub const ALIGNMENT_BUFFER_SIZE: usize = 32768;

pub const LOW_LEFT: usize = 0;
pub const LOW_RIGHT: usize = 1;
pub const MID_LEFT: usize = 2;
pub const MID_RIGHT: usize = 3;
pub const HIGH_LEFT: usize = 4;
pub const HIGH_RIGHT: usize = 5;
pub const INPUT_LEFT: usize = 6;
pub const INPUT_RIGHT: usize = 7;

/// Band lanes followed by the two input lanes
pub const LANE_COUNT: usize = 8;

/// Fixed-size multi-lane circular buffer
#[derive(Debug, Clone)]
pub struct BandAlignmentBuffer {
    lanes: [Box<[Sample]>; LANE_COUNT],
    mask: usize,
    write_pos: usize,
    read_pos: usize,
    /// Frames written since the last `begin_read`, saturating at capacity
    unread: usize,
}

impl Default for BandAlignmentBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl BandAlignmentBuffer {
    pub fn new() -> Self {
        Self::with_capacity(ALIGNMENT_BUFFER_SIZE)
    }

    /// Capacity is rounded up to a power of two
    pub fn with_capacity(capacity: usize) -> Self {
        let size = capacity.max(1).next_power_of_two();
        Self {
            lanes: std::array::from_fn(|_| vec![0.0; size].into_boxed_slice()),
            mask: size - 1,
            write_pos: 0,
            read_pos: 0,
            unread: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    #[inline]
    pub fn write_position(&self) -> usize {
        self.write_pos
    }

    #[inline]
    pub fn read_position(&self) -> usize {
        self.read_pos
    }

    /// Write one lane at the write cursor
    #[inline(always)]
    pub fn write(&mut self, lane: usize, sample: Sample) {
        self.lanes[lane][self.write_pos] = sample;
    }

    /// Write a whole frame and advance the write cursor
    #[inline(always)]
    pub fn write_frame(&mut self, frame: &[Sample; LANE_COUNT]) {
        for (lane, &sample) in self.lanes.iter_mut().zip(frame.iter()) {
            lane[self.write_pos] = sample;
        }
        self.advance_write();
    }

    #[inline(always)]
    pub fn advance_write(&mut self) {
        self.write_pos = (self.write_pos + 1) & self.mask;
        self.unread = (self.unread + 1).min(self.capacity());
    }

    /// Rewind the read cursor over the last `block_len` frames.
    ///
    /// Returns the number of frames that may be read, never more than were
    /// written since the previous call.
    pub fn begin_read(&mut self, block_len: usize) -> usize {
        let len = block_len.min(self.unread);
        self.read_pos = self.write_pos.wrapping_sub(len) & self.mask;
        self.unread = 0;
        len
    }

    /// Read one lane at the read cursor
    #[inline(always)]
    pub fn read(&self, lane: usize) -> Sample {
        self.lanes[lane][self.read_pos]
    }

    /// Read a whole frame and advance the read cursor
    #[inline(always)]
    pub fn read_frame(&mut self) -> [Sample; LANE_COUNT] {
        let pos = self.read_pos;
        let frame = std::array::from_fn(|lane| self.lanes[lane][pos]);
        self.advance_read();
        frame
    }

    #[inline(always)]
    pub fn advance_read(&mut self) {
        self.read_pos = (self.read_pos + 1) & self.mask;
    }

    /// Every lane zero and both cursors at the origin
    pub fn is_clear(&self) -> bool {
        self.write_pos == 0
            && self.read_pos == 0
            && self.unread == 0
            && self.lanes.iter().all(|lane| lane.iter().all(|&s| s == 0.0))
    }
}

impl Processor for BandAlignmentBuffer {
    fn reset(&mut self) {
        for lane in self.lanes.iter_mut() {
            lane.fill(0.0);
        }
        self.write_pos = 0;
        self.read_pos = 0;
        self.unread = 0;
    }
}
