//! Text-box annotations drawn over picture notes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Smallest width a text box can be resized to.
pub const MIN_TEXT_BOX_WIDTH: i32 = 100;
/// Smallest height a text box can be resized to.
pub const MIN_TEXT_BOX_HEIGHT: i32 = 30;

const DEFAULT_WIDTH: i32 = 200;
const DEFAULT_HEIGHT: i32 = 50;
const DEFAULT_FONT_SIZE: u32 = 14;
const DEFAULT_FONT_COLOR: &str = "#000000";

/// Controls how an annotation is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextBoxKind {
    /// Explains a feature of the picture (blue border).
    #[default]
    Description,
    /// Asks for something to be evaluated or adjusted (orange border).
    Instruction,
}

/// One of the eight resize grips around a text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
    TopCenter,
    RightCenter,
    BottomCenter,
    LeftCenter,
}

impl Handle {
    /// All handles in hit-test order.
    pub const ALL: [Handle; 8] = [
        Handle::TopLeft,
        Handle::TopRight,
        Handle::BottomRight,
        Handle::BottomLeft,
        Handle::TopCenter,
        Handle::RightCenter,
        Handle::BottomCenter,
        Handle::LeftCenter,
    ];

    fn moves_left_edge(self) -> bool {
        matches!(self, Self::TopLeft | Self::BottomLeft | Self::LeftCenter)
    }

    fn moves_right_edge(self) -> bool {
        matches!(self, Self::TopRight | Self::BottomRight | Self::RightCenter)
    }

    fn moves_top_edge(self) -> bool {
        matches!(self, Self::TopLeft | Self::TopRight | Self::TopCenter)
    }

    fn moves_bottom_edge(self) -> bool {
        matches!(self, Self::BottomLeft | Self::BottomRight | Self::BottomCenter)
    }
}

/// A positioned annotation overlay owned by a picture note.
///
/// Geometry is kept in image pixel coordinates. Every edit keeps the box at
/// non-negative coordinates and at least
/// [`MIN_TEXT_BOX_WIDTH`]×[`MIN_TEXT_BOX_HEIGHT`] in size, and stored boxes
/// are brought back within those bounds when they are loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TextBoxRecord")]
pub struct TextBox {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub text: String,
    pub font_size: u32,
    pub font_color: String,
    #[serde(rename = "box_type")]
    pub kind: TextBoxKind,
}

/// A text box as stored, before its geometry is clamped.
#[derive(Deserialize)]
struct TextBoxRecord {
    #[serde(default = "new_box_id")]
    id: String,
    #[serde(default)]
    x: i32,
    #[serde(default)]
    y: i32,
    #[serde(default = "default_width")]
    width: i32,
    #[serde(default = "default_height")]
    height: i32,
    #[serde(default)]
    text: String,
    #[serde(default = "default_font_size")]
    font_size: u32,
    #[serde(default = "default_font_color")]
    font_color: String,
    #[serde(default, rename = "box_type")]
    kind: TextBoxKind,
}

impl From<TextBoxRecord> for TextBox {
    fn from(record: TextBoxRecord) -> Self {
        Self {
            id: record.id,
            x: record.x.max(0),
            y: record.y.max(0),
            width: record.width.max(MIN_TEXT_BOX_WIDTH),
            height: record.height.max(MIN_TEXT_BOX_HEIGHT),
            text: record.text,
            font_size: record.font_size,
            font_color: record.font_color,
            kind: record.kind,
        }
    }
}

fn new_box_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_width() -> i32 {
    DEFAULT_WIDTH
}

fn default_height() -> i32 {
    DEFAULT_HEIGHT
}

fn default_font_size() -> u32 {
    DEFAULT_FONT_SIZE
}

fn default_font_color() -> String {
    DEFAULT_FONT_COLOR.to_string()
}

impl TextBox {
    /// Creates a default-sized box at `(x, y)`.
    pub fn new(x: i32, y: i32, text: impl Into<String>, kind: TextBoxKind) -> Self {
        Self {
            id: new_box_id(),
            x: x.max(0),
            y: y.max(0),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            text: text.into(),
            font_size: DEFAULT_FONT_SIZE,
            font_color: DEFAULT_FONT_COLOR.to_string(),
            kind,
        }
    }

    /// Whether `(px, py)` lies inside the box, edges included.
    #[must_use]
    pub fn contains_point(&self, px: i32, py: i32) -> bool {
        self.x <= px && px <= self.x + self.width && self.y <= py && py <= self.y + self.height
    }

    /// Center point of each handle, in [`Handle::ALL`] order.
    #[must_use]
    pub fn handles(&self) -> [(Handle, i32, i32); 8] {
        let (x, y, w, h) = (self.x, self.y, self.width, self.height);
        [
            (Handle::TopLeft, x, y),
            (Handle::TopRight, x + w, y),
            (Handle::BottomRight, x + w, y + h),
            (Handle::BottomLeft, x, y + h),
            (Handle::TopCenter, x + w / 2, y),
            (Handle::RightCenter, x + w, y + h / 2),
            (Handle::BottomCenter, x + w / 2, y + h),
            (Handle::LeftCenter, x, y + h / 2),
        ]
    }

    /// The first handle within `tolerance` pixels of `(px, py)`.
    #[must_use]
    pub fn handle_at(&self, px: i32, py: i32, tolerance: i32) -> Option<Handle> {
        self.handles()
            .into_iter()
            .find(|(_, hx, hy)| (hx - px).abs() <= tolerance && (hy - py).abs() <= tolerance)
            .map(|(handle, _, _)| handle)
    }

    /// Places the top-left corner at `(x, y)`, clamped to the image origin.
    pub fn set_position(&mut self, x: i32, y: i32) {
        self.x = x.max(0);
        self.y = y.max(0);
    }

    /// Moves the box by a delta without letting it cross the image origin.
    pub fn move_by(&mut self, dx: i32, dy: i32) {
        self.set_position(self.x.saturating_add(dx), self.y.saturating_add(dy));
    }

    /// Drags `handle` to `(px, py)`.
    ///
    /// The edge opposite the handle stays fixed. When the requested size would
    /// fall under the minimum, the dragged edge stops at the minimum instead of
    /// pushing the box around.
    pub fn resize_from_handle(&mut self, handle: Handle, px: i32, py: i32) {
        let right = self.x + self.width;
        let bottom = self.y + self.height;

        if handle.moves_left_edge() {
            let left = px.max(0).min(right - MIN_TEXT_BOX_WIDTH).max(0);
            self.x = left;
            self.width = (right - left).max(MIN_TEXT_BOX_WIDTH);
        } else if handle.moves_right_edge() {
            self.width = (px - self.x).max(MIN_TEXT_BOX_WIDTH);
        }

        if handle.moves_top_edge() {
            let top = py.max(0).min(bottom - MIN_TEXT_BOX_HEIGHT).max(0);
            self.y = top;
            self.height = (bottom - top).max(MIN_TEXT_BOX_HEIGHT);
        } else if handle.moves_bottom_edge() {
            self.height = (py - self.y).max(MIN_TEXT_BOX_HEIGHT);
        }
    }
}

/// Index of the topmost box containing `(x, y)`; later boxes draw on top.
#[must_use]
pub fn hit_test(boxes: &[TextBox], x: i32, y: i32) -> Option<usize> {
    boxes.iter().rposition(|b| b.contains_point(x, y))
}
