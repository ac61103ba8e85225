use serde::Deserialize;

pub const MAX_POINTERS: usize = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }

    /// Grows the rect by a fraction of its own width/height on each side.
    pub fn expanded(&self, horizontal_ratio: f32, vertical_ratio: f32) -> Rect {
        let dx = self.width() * horizontal_ratio;
        let dy = self.height() * vertical_ratio;
        Rect {
            left: self.left - dx,
            top: self.top - dy,
            right: self.right + dx,
            bottom: self.bottom + dy,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyCode(pub i32);

impl KeyCode {
    pub const UNSPECIFIED: KeyCode = KeyCode(0);
    pub const SPACE: KeyCode = KeyCode(32);
    pub const CJK_SPACE: KeyCode = KeyCode(12288);
    pub const DELETE: KeyCode = KeyCode(-5);
    pub const SHIFT: KeyCode = KeyCode(-11);
    pub const CAPS_LOCK: KeyCode = KeyCode(-13);
    pub const ARROW_LEFT: KeyCode = KeyCode(-21);
    pub const ARROW_RIGHT: KeyCode = KeyCode(-22);
    pub const LANGUAGE_SWITCH: KeyCode = KeyCode(-212);

    pub fn is_space(self) -> bool {
        self == Self::SPACE || self == Self::CJK_SPACE
    }

    pub fn is_character(self) -> bool {
        self > Self::SPACE && self != Self::CJK_SPACE
    }

    pub fn from_char(c: char) -> Self {
        KeyCode(c as i32)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyId(pub usize);

#[derive(Clone, Debug, PartialEq)]
pub struct Key {
    pub code: KeyCode,
    pub visible_bounds: Rect,
    pub is_enabled: bool,
    pub is_pressed: bool,
}

impl Key {
    pub fn new(code: KeyCode, visible_bounds: Rect) -> Self {
        Self {
            code,
            visible_bounds,
            is_enabled: true,
            is_pressed: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyboardMode {
    #[default]
    Characters,
    Symbols,
    Numeric,
    Phone,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchAction {
    Down,
    PointerDown,
    Move,
    PointerUp,
    Up,
    Cancel,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    pub id: u32,
    pub point: Point,
}

/// One multi-touch frame. `action_index` addresses `pointers` for the
/// down/up family of actions and is ignored for `Move` and `Cancel`.
#[derive(Clone, Debug, PartialEq)]
pub struct TouchFrame {
    /// Monotonic milliseconds on the producer's clock. Any epoch works; the
    /// machine only compares frame times with each other and with deadlines
    /// derived from them.
    pub t_ms: u64,
    pub action: TouchAction,
    pub action_index: usize,
    pub pointers: heapless::Vec<PointerSample, MAX_POINTERS>,
}

impl TouchFrame {
    pub fn new(t_ms: u64, action: TouchAction, action_index: usize) -> Self {
        Self {
            t_ms,
            action,
            action_index,
            pointers: heapless::Vec::new(),
        }
    }

    /// Appends a pointer slot. Slots past `MAX_POINTERS` are dropped.
    pub fn with_pointer(mut self, id: u32, x: f32, y: f32) -> Self {
        let _ = self.pointers.push(PointerSample {
            id,
            point: Point::new(x, y),
        });
        self
    }

    pub fn action_pointer(&self) -> Option<PointerSample> {
        self.pointers.get(self.action_index).copied()
    }

    pub fn slot_of(&self, id: u32) -> Option<usize> {
        self.pointers.iter().position(|sample| sample.id == id)
    }

    pub fn point_at(&self, slot: usize) -> Option<Point> {
        self.pointers.get(slot).map(|sample| sample.point)
    }
}
