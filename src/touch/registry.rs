use heapless::Vec;

use super::long_press::{LongPressHandle, LongPressScheduler};
use crate::types::{KeyId, MAX_POINTERS};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PointerPhase {
    #[default]
    DownOnKey,
    MovedOffKey,
    GestureEscalated,
    Gliding,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedPointer {
    pub id: u32,
    pub slot_index: usize,
    pub initial_key: Option<KeyId>,
    pub active_key: Option<KeyId>,
    pub pending_long_press: Option<LongPressHandle>,
    pub has_escalated_to_gesture: bool,
    pub suppress_next_release: bool,
    pub phase: PointerPhase,
}

impl TrackedPointer {
    fn new(id: u32, slot_index: usize) -> Self {
        Self {
            id,
            slot_index,
            initial_key: None,
            active_key: None,
            pending_long_press: None,
            has_escalated_to_gesture: false,
            suppress_next_release: false,
            phase: PointerPhase::MovedOffKey,
        }
    }
}

/// Fixed-capacity table of live pointers keyed by hardware id.
pub struct PointerRegistry {
    pointers: Vec<TrackedPointer, MAX_POINTERS>,
}

impl Default for PointerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerRegistry {
    pub const fn new() -> Self {
        Self {
            pointers: Vec::new(),
        }
    }

    /// Registers a new contact. Returns `None` without touching the table
    /// when the id is already tracked or every slot is taken.
    pub fn add(&mut self, id: u32, slot_index: usize) -> Option<&mut TrackedPointer> {
        if self.find_by_id(id).is_some() {
            return None;
        }
        if self.pointers.push(TrackedPointer::new(id, slot_index)).is_err() {
            log::warn!("touch: registry_full dropped_pointer={}", id);
            return None;
        }
        self.pointers.last_mut()
    }

    pub fn find_by_id(&self, id: u32) -> Option<&TrackedPointer> {
        self.pointers.iter().find(|pointer| pointer.id == id)
    }

    pub fn find_by_id_mut(&mut self, id: u32) -> Option<&mut TrackedPointer> {
        self.pointers.iter_mut().find(|pointer| pointer.id == id)
    }

    /// Drops the pointer, cancelling its pending long-press first.
    pub fn remove_by_id(&mut self, id: u32, scheduler: &mut LongPressScheduler) -> bool {
        let Some(index) = self.pointers.iter().position(|pointer| pointer.id == id) else {
            return false;
        };
        let mut pointer = self.pointers.swap_remove(index);
        scheduler.cancel(pointer.pending_long_press.take());
        true
    }

    pub fn clear(&mut self, scheduler: &mut LongPressScheduler) {
        for pointer in self.pointers.iter_mut() {
            scheduler.cancel(pointer.pending_long_press.take());
        }
        self.pointers.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedPointer> + '_ {
        self.pointers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TrackedPointer> + '_ {
        self.pointers.iter_mut()
    }

    /// Snapshot of the tracked ids, for walks that mutate the registry.
    pub fn ids(&self) -> Vec<u32, MAX_POINTERS> {
        self.pointers.iter().map(|pointer| pointer.id).collect()
    }

    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.pointers.is_full()
    }

    pub fn capacity(&self) -> usize {
        self.pointers.capacity()
    }
}
