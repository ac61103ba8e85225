//! What a classified swipe means, depending on the key it started on.

use super::{
    machine::TouchStateMachine,
    swipe::{SwipeDirection, SwipeEvent, SwipeGestureDetector, SwipePhase},
};
use crate::{
    config::{DeleteSwipeMode, SwipeAction},
    ports::TouchContext,
    types::KeyCode,
};

impl<S: SwipeGestureDetector> TouchStateMachine<S> {
    /// Returns `true` when the swipe was consumed, which turns the pointer
    /// into a gesture for the rest of its life.
    pub(super) fn evaluate_swipe(
        &mut self,
        event: &SwipeEvent,
        context: &mut TouchContext<'_>,
    ) -> bool {
        let Some(pointer) = self.registry.find_by_id(event.pointer_id) else {
            return false;
        };
        let Some(initial_code) = pointer.initial_key.and_then(|key| context.key_code(key)) else {
            return false;
        };
        let active_code = pointer.active_key.and_then(|key| context.key_code(key));
        let escalated = pointer.has_escalated_to_gesture;

        log::trace!(
            "touch: swipe pointer={} direction={:?} phase={:?} abs_x={} rel_x={}",
            event.pointer_id,
            event.direction,
            event.phase,
            event.abs_unit_count_x,
            event.rel_unit_count_x
        );

        match initial_code {
            KeyCode::DELETE => self.delete_swipe(event, context),
            code if code.is_space() => self.space_swipe(event, escalated, context),
            KeyCode::SHIFT
                if event.phase == SwipePhase::Move
                    && active_code.is_some_and(|code| code.is_space()) =>
            {
                self.space_swipe(event, escalated, context)
            }
            KeyCode::SHIFT
                if event.phase == SwipePhase::Up
                    && active_code.is_some_and(|code| code != KeyCode::SHIFT) =>
            {
                self.release_through_shift(event.pointer_id, context);
                true
            }
            code if code.is_character() && !context.popup.is_open_extended() => {
                if self.config.glide.enabled || escalated || event.phase != SwipePhase::Up {
                    return false;
                }
                let gestures = &self.config.gestures;
                let action = match event.direction {
                    SwipeDirection::Up => gestures.swipe_up,
                    SwipeDirection::Down => gestures.swipe_down,
                    SwipeDirection::Left => gestures.swipe_left,
                    SwipeDirection::Right => gestures.swipe_right,
                    _ => SwipeAction::NoAction,
                };
                if action == SwipeAction::NoAction {
                    return false;
                }
                context.editor.execute(action);
                true
            }
            _ => false,
        }
    }

    fn delete_swipe(&mut self, event: &SwipeEvent, context: &mut TouchContext<'_>) -> bool {
        let mode = self.config.gestures.delete_key_swipe_left;
        match event.phase {
            SwipePhase::Move => match mode {
                DeleteSwipeMode::CharactersPrecisely => {
                    if let Some(selection) = context.editor.selection() {
                        let end = selection.end;
                        let start =
                            (end + i64::from(event.abs_unit_count_x) + 1).clamp(0, end.max(0));
                        context.editor.set_selection(start, end);
                    }
                    self.suppress_release(event.pointer_id);
                    true
                }
                DeleteSwipeMode::WordsPrecisely => {
                    // Two units of travel per word.
                    let now = event.abs_unit_count_x / 2;
                    let before = (event.abs_unit_count_x - event.rel_unit_count_x) / 2;
                    let delta = now - before;
                    if delta < 0 {
                        context.editor.select_words_left(delta.unsigned_abs());
                    } else if delta > 0 {
                        context.editor.deselect_words_left(delta.unsigned_abs());
                    }
                    self.suppress_release(event.pointer_id);
                    true
                }
                DeleteSwipeMode::None | DeleteSwipeMode::WholeWord => false,
            },
            SwipePhase::Up => {
                if event.direction == SwipeDirection::Left && mode == DeleteSwipeMode::WholeWord {
                    context.editor.execute(SwipeAction::DeleteWord);
                    true
                } else {
                    false
                }
            }
        }
    }

    fn space_swipe(
        &mut self,
        event: &SwipeEvent,
        escalated: bool,
        context: &mut TouchContext<'_>,
    ) -> bool {
        let gestures = self.config.gestures;
        match event.phase {
            SwipePhase::Move => {
                match event.direction {
                    SwipeDirection::Left
                        if gestures.space_bar_swipe_left == SwipeAction::MoveCursorLeft =>
                    {
                        self.move_cursor(KeyCode::ARROW_LEFT, event, escalated, context);
                    }
                    SwipeDirection::Right
                        if gestures.space_bar_swipe_right == SwipeAction::MoveCursorRight =>
                    {
                        self.move_cursor(KeyCode::ARROW_RIGHT, event, escalated, context);
                    }
                    _ => {}
                }
                // Any drag on space is a gesture; nearby keys must not pop up.
                true
            }
            SwipePhase::Up => {
                let action = match event.direction {
                    SwipeDirection::Left
                        if gestures.space_bar_swipe_left != SwipeAction::MoveCursorLeft =>
                    {
                        Some(gestures.space_bar_swipe_left)
                    }
                    SwipeDirection::Right
                        if gestures.space_bar_swipe_right != SwipeAction::MoveCursorRight =>
                    {
                        Some(gestures.space_bar_swipe_right)
                    }
                    SwipeDirection::Left | SwipeDirection::Right => None,
                    _ if event.abs_unit_count_y < -gestures.space_swipe_up_units => {
                        Some(gestures.space_bar_swipe_up)
                    }
                    _ => None,
                };
                let Some(action) = action else {
                    return false;
                };
                if action != SwipeAction::NoAction {
                    context.editor.execute(action);
                }
                true
            }
        }
    }

    /// One `down_up` per unit travelled. The first burst of a drag gives up
    /// the configured deadzone.
    fn move_cursor(
        &mut self,
        arrow: KeyCode,
        event: &SwipeEvent,
        escalated: bool,
        context: &mut TouchContext<'_>,
    ) {
        let units = event.rel_unit_count_x.unsigned_abs();
        let count = if escalated {
            units
        } else {
            units.saturating_sub(self.config.gestures.space_cursor_deadzone_units)
        };
        for repeat in 0..count {
            context.dispatcher.down_up(arrow, repeat);
        }
        if count > 0 {
            log::trace!("touch: cursor code={} count={}", arrow.0, count);
        }
    }

    /// Shift pressed, finger released on another key: commit that key and
    /// drop shift without locking it.
    fn release_through_shift(&mut self, pointer_id: u32, context: &mut TouchContext<'_>) {
        let Some(key_id) = self
            .registry
            .find_by_id(pointer_id)
            .and_then(|pointer| pointer.active_key)
        else {
            return;
        };
        // A key already cancelled by a cursor drag has nothing left to commit.
        let held = context
            .key_copy(key_id)
            .filter(|key| context.dispatcher.is_pressed(key.code));
        if let Some(key) = held {
            let resolved = context.popup.resolve_final(&key).unwrap_or(key.code);
            if resolved == key.code {
                context.dispatcher.up(key.code);
            } else {
                context.dispatcher.cancel(key.code);
                context.dispatcher.down_up(resolved, 0);
            }
        }
        if context.dispatcher.is_pressed(KeyCode::SHIFT) {
            context.dispatcher.cancel(KeyCode::SHIFT);
        }
    }
}
