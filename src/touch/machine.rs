use super::{
    long_press::{FiredLongPress, LongPressAction, LongPressScheduler},
    registry::{PointerPhase, PointerRegistry},
    swipe::{DistanceSwipeDetector, SwipeGestureDetector},
    utils::outside_key_tolerance,
};
use crate::{
    config::{DeleteSwipeMode, KeyboardConfig, SwipeAction},
    glide::GlideCoordinator,
    ports::TouchContext,
    types::{KeyCode, KeyId, KeyboardMode, Point, TouchAction, TouchFrame},
};

/// Turns raw multi-touch frames into key-lifecycle events.
///
/// Every pointer that presses a key ends with exactly one terminal event for
/// it (`up` or `cancel`), whatever interrupts the press.
pub struct TouchStateMachine<S: SwipeGestureDetector = DistanceSwipeDetector> {
    pub(super) config: KeyboardConfig,
    pub(super) registry: PointerRegistry,
    pub(super) long_press: LongPressScheduler,
    pub(super) swipe: S,
    pub(super) glide: GlideCoordinator,
}

impl TouchStateMachine<DistanceSwipeDetector> {
    pub fn new(config: KeyboardConfig) -> Self {
        Self::with_detector(config, DistanceSwipeDetector::new(config.swipe))
    }
}

impl Default for TouchStateMachine<DistanceSwipeDetector> {
    fn default() -> Self {
        Self::new(KeyboardConfig::default())
    }
}

impl<S: SwipeGestureDetector> TouchStateMachine<S> {
    pub fn with_detector(config: KeyboardConfig, swipe: S) -> Self {
        Self {
            config,
            registry: PointerRegistry::new(),
            long_press: LongPressScheduler::new(),
            swipe,
            glide: GlideCoordinator::new(config.glide),
        }
    }

    pub fn config(&self) -> &KeyboardConfig {
        &self.config
    }

    pub fn registry(&self) -> &PointerRegistry {
        &self.registry
    }

    pub fn glide(&self) -> &GlideCoordinator {
        &self.glide
    }

    pub fn glide_mut(&mut self) -> &mut GlideCoordinator {
        &mut self.glide
    }

    /// `None` means the pointer is not tracked.
    pub fn pointer_phase(&self, pointer_id: u32) -> Option<PointerPhase> {
        self.registry.find_by_id(pointer_id).map(|pointer| pointer.phase)
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.long_press.next_deadline()
    }

    pub fn handle_frame(&mut self, frame: &TouchFrame, context: &mut TouchContext<'_>) {
        // Timers due before this frame run first so ordering matches wall time.
        self.fire_timers(frame.t_ms, context);
        log::trace!(
            "touch: frame action={:?} index={} pointers={} t_ms={}",
            frame.action,
            frame.action_index,
            frame.pointers.len(),
            frame.t_ms
        );

        if self.intercept_glide(frame, context) {
            return;
        }

        match frame.action {
            TouchAction::Down | TouchAction::PointerDown => self.contact_begins(frame, context),
            TouchAction::Move => self.motion(frame, context),
            TouchAction::PointerUp => self.pointer_up(frame, context),
            TouchAction::Up => self.last_up(frame, context),
            TouchAction::Cancel => self.cancel_all(context),
        }
    }

    /// Fires every long-press whose deadline has passed. Returns how many
    /// actually ran.
    pub fn fire_timers(&mut self, now_ms: u64, context: &mut TouchContext<'_>) -> usize {
        let mut fired = 0;
        while let Some(timer) = self.long_press.fire_due(now_ms) {
            if self.claim_fired_timer(&timer) {
                self.run_long_press(timer, context);
                fired += 1;
            }
        }
        fired
    }

    /// Cancels every pointer and any running glide.
    pub fn reset(&mut self, now_ms: u64, context: &mut TouchContext<'_>) {
        if self.glide.cancel(now_ms) {
            context.editor.glide_cancelled();
        }
        self.cancel_all(context);
    }

    fn intercept_glide(&mut self, frame: &TouchFrame, context: &mut TouchContext<'_>) -> bool {
        if !self.config.glide.enabled || context.layout.mode() != KeyboardMode::Characters {
            return false;
        }

        let glide_pointer = self.glide.tracked_pointer().unwrap_or(0);
        let initial_code = self
            .registry
            .find_by_id(glide_pointer)
            .and_then(|pointer| pointer.initial_key)
            .and_then(|key| context.key_code(key));

        let outcome = self.glide.on_touch(frame, initial_code);
        if let Some(samples) = outcome.completed.as_ref() {
            context.editor.glide_completed(samples);
        }
        if outcome.cancelled {
            context.editor.glide_cancelled();
        }
        if !outcome.claimed {
            return false;
        }

        for id in self.registry.ids() {
            if self
                .registry
                .find_by_id(id)
                .is_some_and(|pointer| pointer.active_key.is_some())
            {
                self.cancel_pointer(id, context);
            }
            if let Some(pointer) = self.registry.find_by_id_mut(id) {
                pointer.phase = PointerPhase::Gliding;
            }
        }

        match frame.action {
            TouchAction::Up | TouchAction::Cancel => {
                for id in self.registry.ids() {
                    self.swipe.on_cancel(id);
                }
                self.registry.clear(&mut self.long_press);
            }
            TouchAction::PointerUp => {
                if let Some(sample) = frame.action_pointer() {
                    self.swipe.on_cancel(sample.id);
                    self.registry.remove_by_id(sample.id, &mut self.long_press);
                }
            }
            _ => {}
        }
        true
    }

    fn contact_begins(&mut self, frame: &TouchFrame, context: &mut TouchContext<'_>) {
        let Some(sample) = frame.action_pointer() else {
            return;
        };

        if self.registry.find_by_id(sample.id).is_some() {
            // The previous contact with this id never ended cleanly.
            self.swipe.on_cancel(sample.id);
            self.cancel_pointer(sample.id, context);
            self.registry.remove_by_id(sample.id, &mut self.long_press);
        }

        if self.registry.is_full() {
            log::warn!("touch: registry_full dropped_pointer={}", sample.id);
            return;
        }

        // Keys offering popups are released before another finger takes over.
        for id in self.registry.ids() {
            let holds_popup_key = self
                .registry
                .find_by_id(id)
                .and_then(|pointer| pointer.active_key)
                .and_then(|key| context.layout.key(key))
                .is_some_and(|key| context.popup.is_eligible(key));
            let on_key = self.pointer_phase(id) == Some(PointerPhase::DownOnKey);
            if holds_popup_key && on_key {
                log::debug!("touch: superseded pointer={} by={}", id, sample.id);
                self.cancel_pointer(id, context);
            }
        }

        if self.registry.add(sample.id, frame.action_index).is_none() {
            return;
        }
        log::debug!(
            "touch: contact_begins pointer={} slot={} x={} y={}",
            sample.id,
            frame.action_index,
            sample.point.x,
            sample.point.y
        );
        self.swipe.on_down(sample.id, sample.point, frame.t_ms);
        self.press_at(sample.id, sample.point, frame.t_ms, context);
    }

    fn motion(&mut self, frame: &TouchFrame, context: &mut TouchContext<'_>) {
        for id in self.registry.ids() {
            let Some(slot) = frame.slot_of(id) else {
                continue;
            };
            let Some(point) = frame.point_at(slot) else {
                continue;
            };
            let Some(pointer) = self.registry.find_by_id_mut(id) else {
                continue;
            };
            pointer.slot_index = slot;
            let escalated = pointer.has_escalated_to_gesture;
            let initial_code = pointer.initial_key.and_then(|key| context.key_code(key));

            let force_trigger = escalated
                && initial_code.is_some_and(|code| {
                    (code == KeyCode::DELETE
                        && self.config.gestures.delete_key_swipe_left
                            == DeleteSwipeMode::CharactersPrecisely)
                        || code.is_space()
                });

            let swiped = match self.swipe.on_move(id, point, frame.t_ms, force_trigger) {
                Some(event) => self.evaluate_swipe(&event, context),
                None => false,
            };

            if swiped || escalated {
                self.escalate(id, context);
            } else {
                self.track_motion(id, point, frame.t_ms, context);
            }
        }
    }

    fn pointer_up(&mut self, frame: &TouchFrame, context: &mut TouchContext<'_>) {
        let Some(sample) = frame.action_pointer() else {
            return;
        };
        let Some(pointer) = self.registry.find_by_id_mut(sample.id) else {
            return;
        };
        pointer.slot_index = frame.action_index;
        self.release(sample.id, sample.point, frame.t_ms, context);
        self.registry.remove_by_id(sample.id, &mut self.long_press);
    }

    fn last_up(&mut self, frame: &TouchFrame, context: &mut TouchContext<'_>) {
        let lifted = frame.action_pointer();
        for id in self.registry.ids() {
            match lifted {
                Some(sample) if sample.id == id => {
                    if let Some(pointer) = self.registry.find_by_id_mut(id) {
                        pointer.slot_index = frame.action_index;
                    }
                    self.release(id, sample.point, frame.t_ms, context);
                }
                _ => {
                    self.swipe.on_cancel(id);
                    self.cancel_pointer(id, context);
                }
            }
        }
        self.registry.clear(&mut self.long_press);
    }

    fn cancel_all(&mut self, context: &mut TouchContext<'_>) {
        for id in self.registry.ids() {
            self.swipe.on_cancel(id);
            self.cancel_pointer(id, context);
        }
        context.popup.hide();
        self.registry.clear(&mut self.long_press);
    }

    fn release(&mut self, id: u32, point: Point, t_ms: u64, context: &mut TouchContext<'_>) {
        let swiped = match self.swipe.on_up(id, point, t_ms) {
            Some(event) => self.evaluate_swipe(&event, context),
            None => false,
        };
        let Some(pointer) = self.registry.find_by_id(id) else {
            return;
        };
        let escalated = pointer.has_escalated_to_gesture;
        let initial_code = pointer.initial_key.and_then(|key| context.key_code(key));

        if swiped || escalated || pointer.suppress_next_release {
            if escalated
                && initial_code == Some(KeyCode::DELETE)
                && context
                    .editor
                    .selection()
                    .is_some_and(|selection| selection.is_selection_mode())
            {
                context.editor.delete_backwards();
            }
            self.cancel_pointer(id, context);
        } else {
            self.finish_press(id, context);
        }
    }

    /// Resolves and presses the key under `point` for a tracked pointer.
    fn press_at(&mut self, id: u32, point: Point, t_ms: u64, context: &mut TouchContext<'_>) {
        let hit = context
            .layout
            .resolve_key_at(point)
            .and_then(|key_id| context.key_copy(key_id).map(|key| (key_id, key)))
            .filter(|(_, key)| key.is_enabled);

        let Some(pointer) = self.registry.find_by_id_mut(id) else {
            debug_assert!(false, "press for untracked pointer {id}");
            return;
        };
        self.long_press.cancel(pointer.pending_long_press.take());

        let Some((key_id, key)) = hit else {
            pointer.active_key = None;
            pointer.phase = PointerPhase::MovedOffKey;
            log::debug!("touch: no_key pointer={}", id);
            return;
        };

        context.dispatcher.down(key.code);
        if self.config.popup_enabled && context.popup.is_eligible(&key) {
            context.popup.show(&key);
        }
        context.layout.set_pressed(key_id, true);

        if pointer.initial_key.is_none() {
            pointer.initial_key = Some(key_id);
        }
        pointer.active_key = Some(key_id);
        pointer.phase = PointerPhase::DownOnKey;

        let action = LongPressAction::for_key(key.code, &self.config);
        let deadline_ms = t_ms.saturating_add(self.config.long_press_delay_for(key.code));
        pointer.pending_long_press = Some(self.long_press.schedule(id, key_id, action, deadline_ms));
        log::debug!("touch: down pointer={} code={}", id, key.code.0);
    }

    fn track_motion(&mut self, id: u32, point: Point, t_ms: u64, context: &mut TouchContext<'_>) {
        let Some(key_id) = self.registry.find_by_id(id).and_then(|pointer| pointer.active_key)
        else {
            return;
        };
        let Some(key) = context.key_copy(key_id) else {
            return;
        };

        let moved_off = if context.popup.is_open_extended() {
            !context.popup.resolve_from_coordinates(&key, point)
        } else {
            outside_key_tolerance(&key.visible_bounds, point, &self.config.key_tolerance)
        };

        if moved_off {
            log::trace!("touch: slide pointer={} from_code={}", id, key.code.0);
            self.cancel_pointer(id, context);
            self.press_at(id, point, t_ms, context);
        }
    }

    fn escalate(&mut self, id: u32, context: &mut TouchContext<'_>) {
        let Some(pointer) = self.registry.find_by_id_mut(id) else {
            return;
        };
        self.long_press.cancel(pointer.pending_long_press.take());
        if !pointer.has_escalated_to_gesture {
            log::debug!("touch: gesture pointer={}", id);
        }
        pointer.has_escalated_to_gesture = true;
        pointer.phase = PointerPhase::GestureEscalated;

        // The key stays referenced for swipe semantics but is no longer pressed.
        let Some(key_id) = pointer.active_key else {
            return;
        };
        let Some(key) = context.key_copy(key_id) else {
            return;
        };
        if key.is_pressed {
            self.unpress_key(key_id, context);
            if context.popup.is_eligible(&key) {
                context.popup.hide();
            }
        }
        if context.dispatcher.is_pressed(key.code) {
            context.dispatcher.cancel(key.code);
        }
    }

    /// Cancel path: drops the long-press and the key without emitting `up`.
    fn cancel_pointer(&mut self, id: u32, context: &mut TouchContext<'_>) {
        let Some(pointer) = self.registry.find_by_id_mut(id) else {
            return;
        };
        self.long_press.cancel(pointer.pending_long_press.take());
        pointer.has_escalated_to_gesture = false;
        pointer.suppress_next_release = false;
        if pointer.phase != PointerPhase::Gliding {
            pointer.phase = PointerPhase::MovedOffKey;
        }

        let Some(key_id) = pointer.active_key.take() else {
            return;
        };
        self.unpress_key(key_id, context);
        let Some(key) = context.key_copy(key_id) else {
            return;
        };
        if context.dispatcher.is_pressed(key.code) {
            context.dispatcher.cancel(key.code);
        }
        if context.popup.is_eligible(&key) {
            context.popup.hide();
        }
        log::debug!("touch: cancel pointer={} code={}", id, key.code.0);
    }

    /// Regular release: emits `up` for whatever the popup resolved to.
    fn finish_press(&mut self, id: u32, context: &mut TouchContext<'_>) {
        let Some(pointer) = self.registry.find_by_id_mut(id) else {
            return;
        };
        self.long_press.cancel(pointer.pending_long_press.take());

        let Some(key_id) = pointer.active_key.take() else {
            return;
        };
        self.unpress_key(key_id, context);
        let Some(key) = context.key_copy(key_id) else {
            return;
        };

        if context.popup.is_eligible(&key) {
            match context.popup.resolve_final(&key) {
                Some(resolved) if resolved == key.code => context.dispatcher.up(key.code),
                Some(resolved) => {
                    if context.dispatcher.is_pressed(key.code) {
                        context.dispatcher.cancel(key.code);
                    }
                    context.dispatcher.down_up(resolved, 0);
                }
                None => {
                    if context.dispatcher.is_pressed(key.code) {
                        context.dispatcher.cancel(key.code);
                    }
                }
            }
            context.popup.hide();
        } else {
            context.dispatcher.up(key.code);
        }
        log::debug!("touch: up pointer={} code={}", id, key.code.0);
    }

    /// Clears the pressed flag unless another live press still holds the key.
    fn unpress_key(&self, key_id: KeyId, context: &mut TouchContext<'_>) {
        let still_held = self.registry.iter().any(|pointer| {
            pointer.active_key == Some(key_id) && !pointer.has_escalated_to_gesture
        });
        if !still_held {
            context.layout.set_pressed(key_id, false);
        }
    }

    fn claim_fired_timer(&mut self, timer: &FiredLongPress) -> bool {
        let Some(pointer) = self.registry.find_by_id_mut(timer.handle.pointer_id()) else {
            return false;
        };
        if pointer.pending_long_press != Some(timer.handle) {
            return false;
        }
        pointer.pending_long_press = None;
        pointer.active_key == Some(timer.key)
    }

    fn run_long_press(&mut self, timer: FiredLongPress, context: &mut TouchContext<'_>) {
        let id = timer.handle.pointer_id();
        log::debug!("touch: long_press pointer={} action={:?}", id, timer.action);
        match timer.action {
            LongPressAction::LockShift => {
                context.dispatcher.down_up(KeyCode::CAPS_LOCK, 0);
                self.suppress_release(id);
            }
            LongPressAction::ShowInputMethodPicker => {
                self.suppress_release(id);
                context.editor.show_input_method_picker();
            }
            LongPressAction::Space(SwipeAction::NoAction | SwipeAction::InsertSpace) => {}
            LongPressAction::Space(action) => {
                context.editor.execute(action);
                self.suppress_release(id);
            }
            LongPressAction::ExtendPopup => self.extend_popup(timer.key, context),
        }
    }

    fn extend_popup(&mut self, key_id: KeyId, context: &mut TouchContext<'_>) {
        let surface = context.layout.surface_size();
        let Some(key) = context.layout.key(key_id) else {
            return;
        };
        if context.popup.is_eligible(key) {
            context.popup.extend(key, surface);
        }
    }

    pub(super) fn suppress_release(&mut self, id: u32) {
        if let Some(pointer) = self.registry.find_by_id_mut(id) {
            pointer.suppress_next_release = true;
        }
    }
}
