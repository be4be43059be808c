//! Animation controller: one playback clock bound to one frame sequence.
//!
//! The controller owns a shared cursor (sequence + current index) that the
//! clock's tick callback advances modulo the sequence length. Radar and
//! satellite each get their own instance so either can be mid-playback
//! independently.
//!
//! An empty sequence is inert, not an error: play is refused, seek and step
//! are no-ops, and `current_frame` is `None`.

use crate::catalog::{Frame, FrameSequence};
use crate::clock::{PlaybackClock, TickFn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug)]
struct Cursor {
    frames: FrameSequence,
    index: usize,
}

/// Playback state machine over a read-only frame sequence.
pub struct AnimationController {
    cursor: Arc<Mutex<Cursor>>,
    clock: PlaybackClock,
    tick: TickFn,
}

fn lock_cursor(cursor: &Mutex<Cursor>) -> MutexGuard<'_, Cursor> {
    // Tick callbacks never panic while holding the lock, but recover from
    // poisoning rather than propagating a panic into UI calls.
    cursor.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AnimationController {
    /// Create a controller positioned at `initial_index` (clamped).
    pub fn new(frames: FrameSequence, interval: Duration, initial_index: usize) -> Self {
        let index = if frames.is_empty() {
            0
        } else {
            initial_index.min(frames.len() - 1)
        };
        let cursor = Arc::new(Mutex::new(Cursor { frames, index }));

        let tick_cursor = cursor.clone();
        let tick: TickFn = Arc::new(move || {
            let mut c = lock_cursor(&tick_cursor);
            let len = c.frames.len();
            if len > 0 {
                c.index = (c.index + 1) % len;
            }
        });

        Self {
            cursor,
            clock: PlaybackClock::new(interval),
            tick,
        }
    }

    /// Create an inert controller with no frames yet.
    pub fn empty(interval: Duration) -> Self {
        Self::new(Vec::new().into(), interval, 0)
    }

    /// Start playback. Inert when the sequence is empty: the clock is never
    /// started and `is_playing` stays false.
    pub fn play(&mut self) {
        if self.frame_count() == 0 {
            return;
        }
        self.clock.start(self.tick.clone());
    }

    /// Stop playback. After this returns no further frame advance occurs.
    pub fn pause(&mut self) {
        self.clock.stop();
    }

    pub fn toggle_play(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.clock.is_running()
    }

    /// Jump to `index`, clamped into the valid range. No-op when empty.
    ///
    /// Takes an unsigned index: sliders and scrubbers address frames by
    /// position, and backwards motion goes through the wrapping
    /// [`AnimationController::step`] instead.
    pub fn seek(&mut self, index: usize) {
        let mut c = lock_cursor(&self.cursor);
        if !c.frames.is_empty() {
            c.index = index.min(c.frames.len() - 1);
        }
    }

    /// Move `delta` frames, wrapping at either end. No-op when empty.
    pub fn step(&mut self, delta: isize) {
        let mut c = lock_cursor(&self.cursor);
        let len = c.frames.len();
        if len > 0 {
            let next = (c.index as isize + delta).rem_euclid(len as isize);
            c.index = next as usize;
        }
    }

    /// Change the playback interval; takes effect immediately while playing.
    pub fn set_speed(&mut self, interval: Duration) {
        self.clock.set_interval(interval);
    }

    pub fn current_index(&self) -> usize {
        lock_cursor(&self.cursor).index
    }

    pub fn frame_count(&self) -> usize {
        lock_cursor(&self.cursor).frames.len()
    }

    pub fn current_frame(&self) -> Option<Frame> {
        let c = lock_cursor(&self.cursor);
        c.frames.get(c.index).cloned()
    }

    /// Swap in a freshly fetched sequence.
    ///
    /// The playback position is reclamped into the new bounds rather than
    /// reset, so a refresh mid-playback does not visibly jump. Only a
    /// previously empty controller adopts the catalog's `default_index`.
    /// An empty replacement stops playback and leaves the controller inert.
    pub fn rebind(&mut self, frames: FrameSequence, default_index: usize) {
        let mut c = lock_cursor(&self.cursor);
        let was_empty = c.frames.is_empty();

        if frames.is_empty() {
            c.index = 0;
            c.frames = frames;
            drop(c);
            self.clock.stop();
            return;
        }

        let last = frames.len() - 1;
        c.index = if was_empty {
            default_index.min(last)
        } else {
            c.index.min(last)
        };
        c.frames = frames;
    }
}

impl Drop for AnimationController {
    fn drop(&mut self) {
        self.clock.stop();
    }
}
