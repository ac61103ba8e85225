use crate::{
    config::SwipeAction,
    glide::GlideSample,
    types::{Key, KeyCode, KeyId, KeyboardMode, Point, Size},
};

pub trait KeyLayout {
    fn resolve_key_at(&self, point: Point) -> Option<KeyId>;
    fn key(&self, id: KeyId) -> Option<&Key>;
    fn set_pressed(&mut self, id: KeyId, pressed: bool);
    fn surface_size(&self) -> Size;
    fn mode(&self) -> KeyboardMode;
}

/// Receiver of key-lifecycle events.
///
/// `cancel` and `up` for a code that is not currently pressed must be
/// accepted as no-ops; the cancel paths rely on it.
pub trait InputEventDispatcher {
    fn down(&mut self, code: KeyCode);
    fn up(&mut self, code: KeyCode);
    fn cancel(&mut self, code: KeyCode);
    fn down_up(&mut self, code: KeyCode, repeat_count: u32);
    fn is_pressed(&self, code: KeyCode) -> bool;
}

pub trait PopupController {
    fn show(&mut self, key: &Key);
    fn extend(&mut self, key: &Key, surface: Size);
    fn hide(&mut self);
    fn is_open_extended(&self) -> bool;
    fn is_eligible(&self, key: &Key) -> bool;
    /// Returns `false` once the pointer left the popup domain.
    fn resolve_from_coordinates(&mut self, key: &Key, point: Point) -> bool;
    fn resolve_final(&self, key: &Key) -> Option<KeyCode>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub start: i64,
    pub end: i64,
}

impl Selection {
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn is_selection_mode(&self) -> bool {
        self.start != self.end
    }
}

pub trait EditorActions {
    fn execute(&mut self, action: SwipeAction);
    fn selection(&self) -> Option<Selection>;
    fn set_selection(&mut self, start: i64, end: i64);
    fn select_words_left(&mut self, count: u32);
    fn deselect_words_left(&mut self, count: u32);
    fn delete_backwards(&mut self);
    fn show_input_method_picker(&mut self);
    fn glide_completed(&mut self, samples: &[GlideSample]);
    fn glide_cancelled(&mut self);
}

/// Borrowed collaborators for one dispatch, in the spirit of a statig
/// `handle_with_context` call.
pub struct TouchContext<'a> {
    pub layout: &'a mut dyn KeyLayout,
    pub dispatcher: &'a mut dyn InputEventDispatcher,
    pub popup: &'a mut dyn PopupController,
    pub editor: &'a mut dyn EditorActions,
}

impl<'a> TouchContext<'a> {
    pub fn new(
        layout: &'a mut dyn KeyLayout,
        dispatcher: &'a mut dyn InputEventDispatcher,
        popup: &'a mut dyn PopupController,
        editor: &'a mut dyn EditorActions,
    ) -> Self {
        Self {
            layout,
            dispatcher,
            popup,
            editor,
        }
    }

    pub(crate) fn key_copy(&self, id: KeyId) -> Option<Key> {
        self.layout.key(id).cloned()
    }

    pub(crate) fn key_code(&self, id: KeyId) -> Option<KeyCode> {
        self.layout.key(id).map(|key| key.code)
    }
}
