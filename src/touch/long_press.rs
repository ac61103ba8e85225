use heapless::Vec;

use crate::{
    config::{KeyboardConfig, SwipeAction},
    types::{KeyCode, KeyId, MAX_POINTERS},
};

/// Ownership token for one scheduled long-press. A new generation is minted
/// for every schedule, so a handle never matches a later timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LongPressHandle {
    pointer_id: u32,
    generation: u32,
}

impl LongPressHandle {
    pub fn pointer_id(&self) -> u32 {
        self.pointer_id
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LongPressAction {
    LockShift,
    ShowInputMethodPicker,
    Space(SwipeAction),
    ExtendPopup,
}

impl LongPressAction {
    pub fn for_key(code: KeyCode, config: &KeyboardConfig) -> Self {
        match code {
            KeyCode::SHIFT => Self::LockShift,
            KeyCode::LANGUAGE_SWITCH => Self::ShowInputMethodPicker,
            code if code.is_space() => Self::Space(config.gestures.space_bar_long_press),
            _ => Self::ExtendPopup,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FiredLongPress {
    pub handle: LongPressHandle,
    pub key: KeyId,
    pub action: LongPressAction,
}

#[derive(Clone, Copy, Debug)]
struct PendingLongPress {
    handle: LongPressHandle,
    key: KeyId,
    action: LongPressAction,
    deadline_ms: u64,
}

pub struct LongPressScheduler {
    pending: Vec<PendingLongPress, MAX_POINTERS>,
    next_generation: u32,
}

impl Default for LongPressScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl LongPressScheduler {
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
            next_generation: 1,
        }
    }

    /// Schedules `action` for `pointer_id`, dropping whatever that pointer
    /// had pending before the new timer is stored.
    pub fn schedule(
        &mut self,
        pointer_id: u32,
        key: KeyId,
        action: LongPressAction,
        deadline_ms: u64,
    ) -> LongPressHandle {
        self.pending
            .retain(|entry| entry.handle.pointer_id != pointer_id);

        let handle = LongPressHandle {
            pointer_id,
            generation: self.next_generation,
        };
        self.next_generation = self.next_generation.wrapping_add(1).max(1);

        let entry = PendingLongPress {
            handle,
            key,
            action,
            deadline_ms,
        };
        // One entry per pointer and at most MAX_POINTERS pointers, so the
        // retain above always leaves room.
        let pushed = self.pending.push(entry);
        debug_assert!(pushed.is_ok(), "long-press table overflow");
        log::trace!(
            "touch: long_press_scheduled pointer={} generation={} deadline_ms={}",
            pointer_id,
            handle.generation,
            deadline_ms
        );
        handle
    }

    /// Idempotent: cancelling `None` or an already fired/cancelled handle is
    /// a no-op.
    pub fn cancel(&mut self, handle: Option<LongPressHandle>) -> bool {
        let Some(handle) = handle else {
            return false;
        };
        let before = self.pending.len();
        self.pending.retain(|entry| entry.handle != handle);
        before != self.pending.len()
    }

    pub fn is_pending(&self, handle: LongPressHandle) -> bool {
        self.pending.iter().any(|entry| entry.handle == handle)
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.iter().map(|entry| entry.deadline_ms).min()
    }

    /// Pops the earliest timer whose deadline has passed.
    pub fn fire_due(&mut self, now_ms: u64) -> Option<FiredLongPress> {
        let (index, _) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.deadline_ms <= now_ms)
            .min_by_key(|(_, entry)| entry.deadline_ms)?;
        let entry = self.pending.swap_remove(index);
        Some(FiredLongPress {
            handle: entry.handle,
            key: entry.key,
            action: entry.action,
        })
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
