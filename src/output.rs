//! In-memory collaborators: a static key grid plus recording dispatcher,
//! popup and editor that append everything they receive to one shared log.

use std::{cell::RefCell, rc::Rc};

use crate::{
    config::SwipeAction,
    glide::GlideSample,
    ports::{EditorActions, InputEventDispatcher, KeyLayout, PopupController, Selection},
    types::{Key, KeyCode, KeyId, KeyboardMode, Point, Rect, Size},
};

#[derive(Clone, Debug, PartialEq)]
pub enum KeyboardOutput {
    Down(KeyCode),
    Up(KeyCode),
    Cancel(KeyCode),
    /// `up` or `cancel` for a code the dispatcher did not hold.
    UnmatchedRelease(KeyCode),
    DownUp { code: KeyCode, repeat: u32 },
    PopupShow(KeyCode),
    PopupExtend(KeyCode),
    PopupHide,
    Action(SwipeAction),
    Selection { start: i64, end: i64 },
    SelectWordsLeft(u32),
    DeselectWordsLeft(u32),
    DeleteBackwards,
    InputMethodPicker,
    GlideCompleted { samples: usize },
    GlideCancelled,
}

impl KeyboardOutput {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Down(_) => "down",
            Self::Up(_) => "up",
            Self::Cancel(_) => "cancel",
            Self::UnmatchedRelease(_) => "unmatched_release",
            Self::DownUp { .. } => "down_up",
            Self::PopupShow(_) => "popup_show",
            Self::PopupExtend(_) => "popup_extend",
            Self::PopupHide => "popup_hide",
            Self::Action(_) => "action",
            Self::Selection { .. } => "selection",
            Self::SelectWordsLeft(_) => "select_words_left",
            Self::DeselectWordsLeft(_) => "deselect_words_left",
            Self::DeleteBackwards => "delete_backwards",
            Self::InputMethodPicker => "input_method_picker",
            Self::GlideCompleted { .. } => "glide_completed",
            Self::GlideCancelled => "glide_cancelled",
        }
    }
}

/// Shared, ordered record of collaborator calls.
#[derive(Clone, Debug, Default)]
pub struct OutputLog(Rc<RefCell<Vec<KeyboardOutput>>>);

impl OutputLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, output: KeyboardOutput) {
        self.0.borrow_mut().push(output);
    }

    pub fn snapshot(&self) -> Vec<KeyboardOutput> {
        self.0.borrow().clone()
    }

    pub fn take(&self) -> Vec<KeyboardOutput> {
        core::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

pub struct StaticLayout {
    keys: Vec<Key>,
    surface: Size,
    mode: KeyboardMode,
}

impl StaticLayout {
    pub fn new(keys: Vec<Key>, surface: Size) -> Self {
        Self {
            keys,
            surface,
            mode: KeyboardMode::Characters,
        }
    }

    /// Lays rows top to bottom. Each entry is a code and its width in key
    /// units; every row starts at x = 0.
    pub fn from_rows(rows: &[&[(KeyCode, f32)]], key_width: f32, key_height: f32) -> Self {
        let mut keys = Vec::new();
        let mut width: f32 = 0.0;
        for (row_index, row) in rows.iter().enumerate() {
            let top = row_index as f32 * key_height;
            let mut left = 0.0;
            for &(code, units) in row.iter() {
                let right = left + units * key_width;
                keys.push(Key::new(code, Rect::new(left, top, right, top + key_height)));
                left = right;
            }
            width = width.max(left);
        }
        let surface = Size {
            width,
            height: rows.len() as f32 * key_height,
        };
        Self::new(keys, surface)
    }

    /// Three letter rows, a shift/delete row and a space bar.
    pub fn qwerty(key_width: f32, key_height: f32) -> Self {
        fn letters(text: &str) -> Vec<(KeyCode, f32)> {
            text.chars().map(|c| (KeyCode::from_char(c), 1.0)).collect()
        }
        let top = letters("qwertyuiop");
        let home = letters("asdfghjkl");
        let mut bottom = vec![(KeyCode::SHIFT, 1.5)];
        bottom.extend(letters("zxcvbnm"));
        bottom.push((KeyCode::DELETE, 1.5));
        let space = [
            (KeyCode::LANGUAGE_SWITCH, 2.0),
            (KeyCode::SPACE, 6.0),
            (KeyCode::from_char('.'), 2.0),
        ];
        Self::from_rows(&[&top, &home, &bottom, &space], key_width, key_height)
    }

    pub fn with_mode(mut self, mode: KeyboardMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn set_mode(&mut self, mode: KeyboardMode) {
        self.mode = mode;
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn key_id_of(&self, code: KeyCode) -> Option<KeyId> {
        self.keys.iter().position(|key| key.code == code).map(KeyId)
    }

    /// Centre of the first key with `code`.
    pub fn center_of(&self, code: KeyCode) -> Option<Point> {
        let key = &self.keys[self.key_id_of(code)?.0];
        let bounds = key.visible_bounds;
        Some(Point::new(
            (bounds.left + bounds.right) / 2.0,
            (bounds.top + bounds.bottom) / 2.0,
        ))
    }

    pub fn set_enabled(&mut self, code: KeyCode, enabled: bool) {
        for key in self.keys.iter_mut().filter(|key| key.code == code) {
            key.is_enabled = enabled;
        }
    }
}

impl KeyLayout for StaticLayout {
    fn resolve_key_at(&self, point: Point) -> Option<KeyId> {
        self.keys
            .iter()
            .position(|key| key.visible_bounds.contains(point))
            .map(KeyId)
    }

    fn key(&self, id: KeyId) -> Option<&Key> {
        self.keys.get(id.0)
    }

    fn set_pressed(&mut self, id: KeyId, pressed: bool) {
        if let Some(key) = self.keys.get_mut(id.0) {
            key.is_pressed = pressed;
        }
    }

    fn surface_size(&self) -> Size {
        self.surface
    }

    fn mode(&self) -> KeyboardMode {
        self.mode
    }
}

/// Tracks pressed codes. A release of a code that is not held is logged as
/// `UnmatchedRelease` instead of `Up`/`Cancel`.
pub struct RecordingDispatcher {
    log: OutputLog,
    pressed: Vec<KeyCode>,
}

impl RecordingDispatcher {
    pub fn new(log: OutputLog) -> Self {
        Self {
            log,
            pressed: Vec::new(),
        }
    }

    pub fn pressed(&self) -> &[KeyCode] {
        &self.pressed
    }

    fn release(&mut self, code: KeyCode) -> bool {
        let Some(index) = self.pressed.iter().position(|pressed| *pressed == code) else {
            return false;
        };
        self.pressed.remove(index);
        true
    }
}

impl InputEventDispatcher for RecordingDispatcher {
    fn down(&mut self, code: KeyCode) {
        self.pressed.push(code);
        self.log.push(KeyboardOutput::Down(code));
    }

    fn up(&mut self, code: KeyCode) {
        let output = if self.release(code) {
            KeyboardOutput::Up(code)
        } else {
            KeyboardOutput::UnmatchedRelease(code)
        };
        self.log.push(output);
    }

    fn cancel(&mut self, code: KeyCode) {
        let output = if self.release(code) {
            KeyboardOutput::Cancel(code)
        } else {
            KeyboardOutput::UnmatchedRelease(code)
        };
        self.log.push(output);
    }

    fn down_up(&mut self, code: KeyCode, repeat_count: u32) {
        self.log.push(KeyboardOutput::DownUp {
            code,
            repeat: repeat_count,
        });
    }

    fn is_pressed(&self, code: KeyCode) -> bool {
        self.pressed.contains(&code)
    }
}

/// Popup over ordinary character keys. Extended options are laid out as a
/// row of key-sized cells directly above the key.
pub struct RecordingPopup {
    log: OutputLog,
    options: Vec<(KeyCode, Vec<KeyCode>)>,
    shown: Option<KeyCode>,
    extended: Option<Vec<(Rect, KeyCode)>>,
    selected: Option<KeyCode>,
}

impl RecordingPopup {
    pub fn new(log: OutputLog) -> Self {
        Self {
            log,
            options: Vec::new(),
            shown: None,
            extended: None,
            selected: None,
        }
    }

    pub fn with_options(mut self, code: KeyCode, options: &[KeyCode]) -> Self {
        self.options.push((code, options.to_vec()));
        self
    }

    pub fn shown(&self) -> Option<KeyCode> {
        self.shown
    }

    pub fn selected(&self) -> Option<KeyCode> {
        self.selected
    }

    fn options_for(&self, code: KeyCode) -> Option<&[KeyCode]> {
        self.options
            .iter()
            .find(|(key, _)| *key == code)
            .map(|(_, options)| options.as_slice())
    }
}

impl PopupController for RecordingPopup {
    fn show(&mut self, key: &Key) {
        self.shown = Some(key.code);
        self.log.push(KeyboardOutput::PopupShow(key.code));
    }

    fn extend(&mut self, key: &Key, surface: Size) {
        let Some(options) = self.options_for(key.code) else {
            return;
        };
        let bounds = key.visible_bounds;
        let (width, height) = (bounds.width(), bounds.height());
        let top = (bounds.top - height).max(0.0);
        let cells = core::iter::once(key.code)
            .chain(options.iter().copied())
            .enumerate()
            .map(|(index, code)| {
                let left = (bounds.left + index as f32 * width).min(surface.width - width);
                (Rect::new(left, top, left + width, top + height), code)
            })
            .collect();
        self.extended = Some(cells);
        self.selected = Some(key.code);
        self.shown = Some(key.code);
        self.log.push(KeyboardOutput::PopupExtend(key.code));
    }

    fn hide(&mut self) {
        if self.shown.take().is_some() || self.extended.is_some() {
            self.log.push(KeyboardOutput::PopupHide);
        }
        self.extended = None;
        self.selected = None;
    }

    fn is_open_extended(&self) -> bool {
        self.extended.is_some()
    }

    fn is_eligible(&self, key: &Key) -> bool {
        key.code.is_character()
    }

    fn resolve_from_coordinates(&mut self, key: &Key, point: Point) -> bool {
        let Some(cells) = self.extended.as_ref() else {
            return key.visible_bounds.contains(point);
        };
        if let Some((_, code)) = cells.iter().find(|(cell, _)| {
            point.x >= cell.left && point.x <= cell.right && point.y <= key.visible_bounds.bottom
        }) {
            self.selected = Some(*code);
            return true;
        }
        false
    }

    fn resolve_final(&self, key: &Key) -> Option<KeyCode> {
        if self.extended.is_some() {
            self.selected
        } else {
            Some(key.code)
        }
    }
}

pub struct RecordingEditor {
    log: OutputLog,
    selection: Option<Selection>,
}

impl RecordingEditor {
    pub fn new(log: OutputLog) -> Self {
        Self {
            log,
            selection: None,
        }
    }

    pub fn with_selection(mut self, start: i64, end: i64) -> Self {
        self.selection = Some(Selection::new(start, end));
        self
    }

    pub fn current_selection(&self) -> Option<Selection> {
        self.selection
    }
}

impl EditorActions for RecordingEditor {
    fn execute(&mut self, action: SwipeAction) {
        self.log.push(KeyboardOutput::Action(action));
    }

    fn selection(&self) -> Option<Selection> {
        self.selection
    }

    fn set_selection(&mut self, start: i64, end: i64) {
        self.selection = Some(Selection::new(start, end));
        self.log.push(KeyboardOutput::Selection { start, end });
    }

    fn select_words_left(&mut self, count: u32) {
        self.log.push(KeyboardOutput::SelectWordsLeft(count));
    }

    fn deselect_words_left(&mut self, count: u32) {
        self.log.push(KeyboardOutput::DeselectWordsLeft(count));
    }

    fn delete_backwards(&mut self) {
        if let Some(selection) = self.selection.as_mut() {
            selection.end = selection.start;
        }
        self.log.push(KeyboardOutput::DeleteBackwards);
    }

    fn show_input_method_picker(&mut self) {
        self.log.push(KeyboardOutput::InputMethodPicker);
    }

    fn glide_completed(&mut self, samples: &[GlideSample]) {
        self.log.push(KeyboardOutput::GlideCompleted {
            samples: samples.len(),
        });
    }

    fn glide_cancelled(&mut self) {
        self.log.push(KeyboardOutput::GlideCancelled);
    }
}
