use heapless::Vec;

use super::utils::classify_direction;
use crate::{
    config::SwipeConfig,
    types::{Point, MAX_POINTERS},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwipeDirection {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwipePhase {
    Move,
    Up,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwipeEvent {
    pub pointer_id: u32,
    pub direction: SwipeDirection,
    pub phase: SwipePhase,
    pub abs_unit_count_x: i32,
    pub abs_unit_count_y: i32,
    pub rel_unit_count_x: i32,
    pub rel_unit_count_y: i32,
}

/// Motion classifier consumed by the touch state machine. Detectors only
/// classify; whether a swipe is acted upon is decided by the caller.
pub trait SwipeGestureDetector {
    fn on_down(&mut self, pointer_id: u32, point: Point, t_ms: u64);
    fn on_move(
        &mut self,
        pointer_id: u32,
        point: Point,
        t_ms: u64,
        force_trigger: bool,
    ) -> Option<SwipeEvent>;
    fn on_up(&mut self, pointer_id: u32, point: Point, t_ms: u64) -> Option<SwipeEvent>;
    fn on_cancel(&mut self, pointer_id: u32);
}

#[derive(Clone, Copy, Debug)]
struct GesturePointer {
    id: u32,
    first: Point,
    last_fire: Point,
    last: Point,
    last_ms: u64,
    prev: Point,
    prev_ms: u64,
    abs_unit_count_x: i32,
    abs_unit_count_y: i32,
}

/// Threshold/velocity swipe classifier with per-axis unit counting.
pub struct DistanceSwipeDetector {
    config: SwipeConfig,
    pointers: Vec<GesturePointer, MAX_POINTERS>,
}

impl DistanceSwipeDetector {
    pub fn new(config: SwipeConfig) -> Self {
        Self {
            config,
            pointers: Vec::new(),
        }
    }

    fn find_mut(&mut self, pointer_id: u32) -> Option<&mut GesturePointer> {
        self.pointers.iter_mut().find(|p| p.id == pointer_id)
    }

    fn remove(&mut self, pointer_id: u32) -> Option<GesturePointer> {
        let index = self.pointers.iter().position(|p| p.id == pointer_id)?;
        Some(self.pointers.swap_remove(index))
    }

    fn unit_counts(&self, first: Point, point: Point) -> (i32, i32) {
        let unit = self.config.unit_px;
        (
            ((point.x - first.x) / unit) as i32,
            ((point.y - first.y) / unit) as i32,
        )
    }

    fn release_velocity(pointer: &GesturePointer, point: Point, t_ms: u64) -> (f32, f32) {
        let (from, from_ms) = if t_ms > pointer.last_ms {
            (pointer.last, pointer.last_ms)
        } else {
            (pointer.prev, pointer.prev_ms)
        };
        let dt_ms = t_ms.saturating_sub(from_ms).max(1) as f32;
        (
            (point.x - from.x) * 1_000.0 / dt_ms,
            (point.y - from.y) * 1_000.0 / dt_ms,
        )
    }
}

impl SwipeGestureDetector for DistanceSwipeDetector {
    fn on_down(&mut self, pointer_id: u32, point: Point, t_ms: u64) {
        let _ = self.remove(pointer_id);
        let pointer = GesturePointer {
            id: pointer_id,
            first: point,
            last_fire: point,
            last: point,
            last_ms: t_ms,
            prev: point,
            prev_ms: t_ms,
            abs_unit_count_x: 0,
            abs_unit_count_y: 0,
        };
        if self.pointers.push(pointer).is_err() {
            log::warn!("swipe: table_full dropped_pointer={}", pointer_id);
        }
    }

    fn on_move(
        &mut self,
        pointer_id: u32,
        point: Point,
        t_ms: u64,
        force_trigger: bool,
    ) -> Option<SwipeEvent> {
        let half_threshold = self.config.threshold_px / 2.0;
        let snapshot = *self.pointers.iter().find(|p| p.id == pointer_id)?;
        let (abs_x, abs_y) = self.unit_counts(snapshot.first, point);
        let pointer = self.find_mut(pointer_id)?;

        if point != pointer.last {
            pointer.prev = pointer.last;
            pointer.prev_ms = pointer.last_ms;
            pointer.last = point;
            pointer.last_ms = t_ms;
        }

        let rel_dx = point.x - pointer.last_fire.x;
        let rel_dy = point.y - pointer.last_fire.y;
        if !(force_trigger || rel_dx.abs() > half_threshold || rel_dy.abs() > half_threshold) {
            return None;
        }

        pointer.last_fire = point;
        let event = SwipeEvent {
            pointer_id,
            direction: classify_direction(rel_dx, rel_dy),
            phase: SwipePhase::Move,
            abs_unit_count_x: abs_x,
            abs_unit_count_y: abs_y,
            rel_unit_count_x: abs_x - pointer.abs_unit_count_x,
            rel_unit_count_y: abs_y - pointer.abs_unit_count_y,
        };
        pointer.abs_unit_count_x = abs_x;
        pointer.abs_unit_count_y = abs_y;
        Some(event)
    }

    fn on_up(&mut self, pointer_id: u32, point: Point, t_ms: u64) -> Option<SwipeEvent> {
        let pointer = self.remove(pointer_id)?;
        let (velocity_x, velocity_y) = Self::release_velocity(&pointer, point, t_ms);
        let dx = point.x - pointer.first.x;
        let dy = point.y - pointer.first.y;
        let threshold = self.config.threshold_px;
        let min_speed = self.config.velocity_threshold_px_per_s;

        let far_enough = dx.abs() > threshold || dy.abs() > threshold;
        let fast_enough = velocity_x.abs() > min_speed || velocity_y.abs() > min_speed;
        if !(far_enough && fast_enough) {
            return None;
        }

        let (abs_x, abs_y) = self.unit_counts(pointer.first, point);
        Some(SwipeEvent {
            pointer_id,
            direction: classify_direction(dx, dy),
            phase: SwipePhase::Up,
            abs_unit_count_x: abs_x,
            abs_unit_count_y: abs_y,
            rel_unit_count_x: abs_x - pointer.abs_unit_count_x,
            rel_unit_count_y: abs_y - pointer.abs_unit_count_y,
        })
    }

    fn on_cancel(&mut self, pointer_id: u32) {
        let _ = self.remove(pointer_id);
    }
}

#[cfg(test)]
mod tests;
