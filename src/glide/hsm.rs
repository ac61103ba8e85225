use statig::prelude::*;

use super::GlideSample;
use crate::config::GlideConfig;

#[derive(Clone, Copy, Debug)]
pub(super) enum GlideHsmEvent {
    Down { pointer_id: u32, sample: GlideSample },
    Move { sample: GlideSample, eligible: bool },
    PointerDown,
    PointerUp { pointer_id: u32, sample: GlideSample },
    /// `None` when the frame carried no point for the lifted slot.
    Up { sample: Option<GlideSample> },
    Cancel,
}

#[derive(Debug, Default)]
pub(super) struct GlideDispatch {
    pub(super) claimed: bool,
    pub(super) started: bool,
    pub(super) completed: Option<std::vec::Vec<GlideSample>>,
    pub(super) cancelled: bool,
    pub(super) abandoned: std::vec::Vec<GlideSample>,
}

pub(super) struct GlideHsm {
    config: GlideConfig,
    pub(super) pointer_id: Option<u32>,
    first: GlideSample,
    pub(super) samples: std::vec::Vec<GlideSample>,
}

impl GlideHsm {
    pub(super) fn new(config: GlideConfig) -> Self {
        Self {
            config,
            pointer_id: None,
            first: GlideSample::default(),
            samples: std::vec::Vec::new(),
        }
    }

    fn begin(&mut self, pointer_id: u32, sample: GlideSample) {
        self.pointer_id = Some(pointer_id);
        self.first = sample;
        self.samples.clear();
        self.samples.push(sample);
    }

    fn reset(&mut self) {
        self.pointer_id = None;
        self.samples.clear();
    }

    fn is_tracked(&self, pointer_id: u32) -> bool {
        self.pointer_id == Some(pointer_id)
    }

    fn push_sample(&mut self, sample: GlideSample) {
        if self.samples.last().map(|last| last.point) != Some(sample.point) {
            self.samples.push(sample);
        }
    }

    /// `Some(true)` claims the stream, `Some(false)` rejects it for the rest
    /// of the gesture, `None` keeps waiting.
    fn classify(&self, sample: GlideSample) -> Option<bool> {
        let elapsed_ms = sample.t_ms.saturating_sub(self.first.t_ms);
        if elapsed_ms > self.config.detect_window_ms {
            return Some(false);
        }
        let distance = self.first.point.distance_to(sample.point);
        let velocity = distance / elapsed_ms.max(1) as f32;
        if distance >= self.config.min_distance_px
            && velocity > self.config.velocity_threshold_px_per_ms
        {
            Some(true)
        } else {
            None
        }
    }
}

#[state_machine(initial = "State::idle()")]
impl GlideHsm {
    #[state]
    fn idle(&mut self, context: &mut GlideDispatch, event: &GlideHsmEvent) -> Outcome<State> {
        let _ = context;
        match event {
            GlideHsmEvent::Down { pointer_id, sample } => {
                self.begin(*pointer_id, *sample);
                Transition(State::detecting())
            }
            _ => Handled,
        }
    }

    #[state]
    fn detecting(
        &mut self,
        context: &mut GlideDispatch,
        event: &GlideHsmEvent,
    ) -> Outcome<State> {
        match event {
            GlideHsmEvent::Move { sample, eligible } => {
                if !*eligible {
                    return Transition(State::rejected());
                }
                self.push_sample(*sample);
                match self.classify(*sample) {
                    Some(true) => {
                        context.started = true;
                        context.claimed = true;
                        Transition(State::gliding())
                    }
                    Some(false) => Transition(State::rejected()),
                    None => Handled,
                }
            }
            GlideHsmEvent::PointerUp { pointer_id, .. } if self.is_tracked(*pointer_id) => {
                self.reset();
                Transition(State::idle())
            }
            GlideHsmEvent::Up { .. } | GlideHsmEvent::Cancel => {
                self.reset();
                Transition(State::idle())
            }
            GlideHsmEvent::Down { pointer_id, sample } => {
                self.begin(*pointer_id, *sample);
                Handled
            }
            _ => Handled,
        }
    }

    #[state]
    fn gliding(&mut self, context: &mut GlideDispatch, event: &GlideHsmEvent) -> Outcome<State> {
        match event {
            GlideHsmEvent::Move { sample, .. } => {
                self.push_sample(*sample);
                context.claimed = true;
                Handled
            }
            GlideHsmEvent::PointerUp { pointer_id, sample } if self.is_tracked(*pointer_id) => {
                self.push_sample(*sample);
                context.claimed = true;
                context.completed = Some(core::mem::take(&mut self.samples));
                self.reset();
                Transition(State::idle())
            }
            GlideHsmEvent::Up { sample } => {
                if let Some(sample) = sample {
                    self.push_sample(*sample);
                }
                context.claimed = true;
                context.completed = Some(core::mem::take(&mut self.samples));
                self.reset();
                Transition(State::idle())
            }
            GlideHsmEvent::PointerDown | GlideHsmEvent::PointerUp { .. } => {
                // Extra fingers never interrupt a glide.
                context.claimed = true;
                Handled
            }
            GlideHsmEvent::Cancel => {
                context.cancelled = true;
                context.abandoned = core::mem::take(&mut self.samples);
                self.reset();
                Transition(State::idle())
            }
            GlideHsmEvent::Down { pointer_id, sample } => {
                context.cancelled = true;
                context.abandoned = core::mem::take(&mut self.samples);
                self.begin(*pointer_id, *sample);
                Transition(State::detecting())
            }
        }
    }

    #[state]
    fn rejected(&mut self, context: &mut GlideDispatch, event: &GlideHsmEvent) -> Outcome<State> {
        let _ = context;
        match event {
            GlideHsmEvent::PointerUp { pointer_id, .. } if self.is_tracked(*pointer_id) => {
                self.reset();
                Transition(State::idle())
            }
            GlideHsmEvent::Up { .. } | GlideHsmEvent::Cancel => {
                self.reset();
                Transition(State::idle())
            }
            GlideHsmEvent::Down { pointer_id, sample } => {
                self.begin(*pointer_id, *sample);
                Transition(State::detecting())
            }
            _ => Handled,
        }
    }
}
