//! Glide-typing handoff.
//!
//! The coordinator decides whether pointer 0's stream is a continuous glide
//! rather than discrete taps, accumulates its samples while it is, and turns
//! finished or abandoned glides into a fading trail. Recognising words from
//! the samples happens elsewhere.

mod hsm;
mod trail;

use statig::blocking::IntoStateMachineExt as _;

use hsm::{GlideDispatch, GlideHsm, GlideHsmEvent};
pub use trail::FadingTrail;

use crate::{
    config::GlideConfig,
    types::{KeyCode, Point, TouchAction, TouchFrame},
};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlideSample {
    pub point: Point,
    pub t_ms: u64,
}

#[derive(Debug, Default, PartialEq)]
pub struct GlideOutcome {
    /// The frame belongs to the glide and must not reach discrete handling.
    pub claimed: bool,
    pub started: bool,
    pub completed: Option<std::vec::Vec<GlideSample>>,
    pub cancelled: bool,
}

/// Keys whose own swipe semantics win over gliding.
pub fn is_glide_blocking_key(code: KeyCode) -> bool {
    code == KeyCode::DELETE || code == KeyCode::SHIFT || code.is_space()
}

pub struct GlideCoordinator {
    machine: statig::blocking::StateMachine<GlideHsm>,
    config: GlideConfig,
    gliding: bool,
    fading: Option<FadingTrail>,
}

impl GlideCoordinator {
    pub fn new(config: GlideConfig) -> Self {
        Self {
            machine: GlideHsm::new(config).state_machine(),
            config,
            gliding: false,
            fading: None,
        }
    }

    pub fn is_gliding(&self) -> bool {
        self.gliding
    }

    pub fn tracked_pointer(&self) -> Option<u32> {
        self.machine.inner().pointer_id
    }

    /// Samples accumulated so far for the current stream.
    pub fn samples(&self) -> &[GlideSample] {
        &self.machine.inner().samples
    }

    /// Feeds one raw frame. `initial_code` is the code of the key pointer 0
    /// first landed on, if any.
    pub fn on_touch(&mut self, frame: &TouchFrame, initial_code: Option<KeyCode>) -> GlideOutcome {
        let Some(event) = self.map_frame(frame, initial_code) else {
            return GlideOutcome {
                claimed: self.gliding,
                ..GlideOutcome::default()
            };
        };
        self.dispatch(event, frame.t_ms)
    }

    /// Offers a motion sample of the tracked pointer. Returns whether the
    /// stream is (now) a glide.
    pub fn accept(&mut self, sample: GlideSample, initial_code: Option<KeyCode>) -> bool {
        let eligible = initial_code.is_some_and(|code| !is_glide_blocking_key(code));
        self.dispatch(GlideHsmEvent::Move { sample, eligible }, sample.t_ms)
            .claimed
    }

    /// Finishes the active glide and returns its samples.
    pub fn complete(&mut self, sample: GlideSample) -> Option<std::vec::Vec<GlideSample>> {
        let event = GlideHsmEvent::Up {
            sample: Some(sample),
        };
        self.dispatch(event, sample.t_ms).completed
    }

    /// Discards the active glide. Returns whether one was running.
    pub fn cancel(&mut self, t_ms: u64) -> bool {
        self.dispatch(GlideHsmEvent::Cancel, t_ms).cancelled
    }

    pub fn fading_trail(&mut self, now_ms: u64) -> Option<(&[GlideSample], f32)> {
        if self.fading.as_ref().is_some_and(|trail| trail.is_expired(now_ms)) {
            self.fading = None;
        }
        let trail = self.fading.as_ref()?;
        let radius = trail.radius_at(now_ms)?;
        Some((trail.samples(), radius))
    }

    fn map_frame(&self, frame: &TouchFrame, initial_code: Option<KeyCode>) -> Option<GlideHsmEvent> {
        let sample_at = |slot: usize| {
            frame.point_at(slot).map(|point| GlideSample {
                point,
                t_ms: frame.t_ms,
            })
        };
        match frame.action {
            TouchAction::Down => {
                let pointer = frame.action_pointer()?;
                Some(GlideHsmEvent::Down {
                    pointer_id: pointer.id,
                    sample: GlideSample {
                        point: pointer.point,
                        t_ms: frame.t_ms,
                    },
                })
            }
            TouchAction::PointerDown => Some(GlideHsmEvent::PointerDown),
            TouchAction::Move => {
                let tracked = self.tracked_pointer()?;
                let sample = sample_at(frame.slot_of(tracked)?)?;
                let eligible = initial_code.is_some_and(|code| !is_glide_blocking_key(code));
                Some(GlideHsmEvent::Move { sample, eligible })
            }
            TouchAction::PointerUp => {
                let pointer = frame.action_pointer()?;
                Some(GlideHsmEvent::PointerUp {
                    pointer_id: pointer.id,
                    sample: GlideSample {
                        point: pointer.point,
                        t_ms: frame.t_ms,
                    },
                })
            }
            TouchAction::Up => {
                Some(GlideHsmEvent::Up {
                    sample: sample_at(frame.action_index),
                })
            }
            TouchAction::Cancel => Some(GlideHsmEvent::Cancel),
        }
    }

    fn dispatch(&mut self, event: GlideHsmEvent, t_ms: u64) -> GlideOutcome {
        let mut context = GlideDispatch::default();
        self.machine.handle_with_context(&event, &mut context);

        if context.started {
            self.gliding = true;
            log::debug!("glide: started t_ms={}", t_ms);
        }
        if let Some(samples) = context.completed.as_ref() {
            self.gliding = false;
            log::debug!("glide: completed samples={} t_ms={}", samples.len(), t_ms);
            self.start_fade(samples.clone(), t_ms);
        }
        if context.cancelled {
            self.gliding = false;
            log::debug!("glide: cancelled t_ms={}", t_ms);
            self.start_fade(core::mem::take(&mut context.abandoned), t_ms);
        }

        GlideOutcome {
            claimed: context.claimed,
            started: context.started,
            completed: context.completed,
            cancelled: context.cancelled,
        }
    }

    fn start_fade(&mut self, samples: std::vec::Vec<GlideSample>, t_ms: u64) {
        if !self.config.show_trail || samples.is_empty() {
            self.fading = None;
            return;
        }
        self.fading = Some(FadingTrail::new(
            samples,
            t_ms,
            self.config.trail_duration_ms,
            self.config.trail_radius_px,
        ));
    }
}
