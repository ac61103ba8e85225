//! Single consumer for touch frames and long-press deadlines.
//!
//! Producers push frames from any context; one task owns the state machine
//! and serializes frame handling with timer fires.
//!
//! Frames carry producer time, while timers run on `embassy_time::Instant`.
//! Each received frame re-anchors the two clocks, so deadlines derived from
//! frame times are waited on and fired in the right epoch.

use core::{
    cell::Cell,
    sync::atomic::{AtomicU32, Ordering},
};

use embassy_futures::select::{select, Either};
use embassy_sync::{
    blocking_mutex::{raw::RawMutex, Mutex},
    channel::{Channel, TrySendError},
};
use embassy_time::{Instant, Timer};

use crate::{
    ports::TouchContext,
    touch::{SwipeGestureDetector, TouchStateMachine},
    types::TouchFrame,
};

pub const TOUCH_QUEUE_DEPTH: usize = 16;

#[derive(Clone, Debug, PartialEq)]
pub enum TouchPipelineInput {
    Frame(TouchFrame),
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStep {
    Frame,
    Reset,
    /// Deadline reached; carries how many long-presses actually ran.
    Timers(usize),
}

/// Same moment seen on the producer clock and on the embassy clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ClockAnchor {
    frame_ms: u64,
    instant_ms: u64,
}

impl ClockAnchor {
    fn to_instant(self, frame_ms: u64) -> u64 {
        frame_ms
            .saturating_sub(self.frame_ms)
            .saturating_add(self.instant_ms)
    }

    fn to_frame(self, instant_ms: u64) -> u64 {
        instant_ms
            .saturating_sub(self.instant_ms)
            .saturating_add(self.frame_ms)
    }
}

pub struct TouchPipeline<M: RawMutex, const N: usize = TOUCH_QUEUE_DEPTH> {
    inputs: Channel<M, TouchPipelineInput, N>,
    dropped: AtomicU32,
    anchor: Mutex<M, Cell<Option<ClockAnchor>>>,
}

impl<M: RawMutex, const N: usize> Default for TouchPipeline<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, const N: usize> TouchPipeline<M, N> {
    pub const fn new() -> Self {
        Self {
            inputs: Channel::new(),
            dropped: AtomicU32::new(0),
            anchor: Mutex::new(Cell::new(None)),
        }
    }

    /// Never blocks. When the queue is full the new input is dropped.
    pub fn push(&self, input: TouchPipelineInput) -> bool {
        match self.inputs.try_send(input) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                log::warn!("pipeline: queue_full dropped={}", dropped);
                false
            }
        }
    }

    pub fn push_frame(&self, frame: TouchFrame) -> bool {
        self.push(TouchPipelineInput::Frame(frame))
    }

    /// Discards queued frames and asks the consumer to cancel every pointer.
    pub fn request_reset(&self) {
        while self.inputs.try_receive().is_ok() {}
        let _ = self.push(TouchPipelineInput::Reset);
    }

    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn pending(&self) -> usize {
        self.inputs.len()
    }

    /// Current time on the producer clock, extrapolated from the last frame.
    /// Before any frame arrives both clocks are taken to be the same.
    pub fn now_ms(&self) -> u64 {
        let now = Instant::now().as_millis();
        match self.anchor.lock(Cell::get) {
            Some(anchor) => anchor.to_frame(now),
            None => now,
        }
    }

    fn deadline_instant(&self, deadline_ms: u64) -> Instant {
        let instant_ms = match self.anchor.lock(Cell::get) {
            Some(anchor) => anchor.to_instant(deadline_ms),
            None => deadline_ms,
        };
        Instant::from_millis(instant_ms)
    }

    fn anchor_to(&self, frame: &TouchFrame) {
        let anchor = ClockAnchor {
            frame_ms: frame.t_ms,
            instant_ms: Instant::now().as_millis(),
        };
        self.anchor.lock(|cell| cell.set(Some(anchor)));
    }

    /// Handles exactly one input or one expired deadline.
    pub async fn step<S: SwipeGestureDetector>(
        &self,
        machine: &mut TouchStateMachine<S>,
        context: &mut TouchContext<'_>,
    ) -> PipelineStep {
        let input = match machine.next_deadline() {
            Some(deadline_ms) => {
                match select(
                    self.inputs.receive(),
                    Timer::at(self.deadline_instant(deadline_ms)),
                )
                .await
                {
                    Either::First(input) => input,
                    Either::Second(()) => {
                        let now_ms = self.now_ms();
                        return PipelineStep::Timers(machine.fire_timers(now_ms, context));
                    }
                }
            }
            None => self.inputs.receive().await,
        };

        match input {
            TouchPipelineInput::Frame(frame) => {
                self.anchor_to(&frame);
                machine.handle_frame(&frame, context);
                PipelineStep::Frame
            }
            TouchPipelineInput::Reset => {
                log::info!("pipeline: reset");
                machine.reset(self.now_ms(), context);
                PipelineStep::Reset
            }
        }
    }

    pub async fn run<S: SwipeGestureDetector>(
        &self,
        machine: &mut TouchStateMachine<S>,
        context: &mut TouchContext<'_>,
    ) -> ! {
        loop {
            let _ = self.step(machine, context).await;
        }
    }
}

#[cfg(test)]
mod tests;
