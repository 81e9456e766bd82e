//! The fixed sticky-note color palette.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the named note colors.
///
/// Stored on disk by its lowercase name (`"yellow"`, `"grey"`, ...). Unknown
/// names read back as [`NoteColor::Yellow`] so a single bad value never makes
/// a note unloadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NoteColor {
    #[default]
    Yellow,
    Green,
    Blue,
    Pink,
    Purple,
    Orange,
    Red,
    Teal,
    Magenta,
    White,
    Grey,
    Black,
}

impl NoteColor {
    /// Every palette entry, in menu order.
    pub const ALL: [NoteColor; 12] = [
        NoteColor::Yellow,
        NoteColor::Green,
        NoteColor::Blue,
        NoteColor::Pink,
        NoteColor::Purple,
        NoteColor::Orange,
        NoteColor::Red,
        NoteColor::Teal,
        NoteColor::Magenta,
        NoteColor::White,
        NoteColor::Grey,
        NoteColor::Black,
    ];

    /// The storage name written to note JSON.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Pink => "pink",
            Self::Purple => "purple",
            Self::Orange => "orange",
            Self::Red => "red",
            Self::Teal => "teal",
            Self::Magenta => "magenta",
            Self::White => "white",
            Self::Grey => "grey",
            Self::Black => "black",
        }
    }

    /// The label shown in color menus.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Yellow => "Yellow",
            Self::Green => "Green",
            Self::Blue => "Blue",
            Self::Pink => "Pink",
            Self::Purple => "Purple",
            Self::Orange => "Orange",
            Self::Red => "Red",
            Self::Teal => "Teal",
            Self::Magenta => "Magenta",
            Self::White => "White",
            Self::Grey => "Grey",
            Self::Black => "Black",
        }
    }

    /// Hex code of the note body color.
    #[must_use]
    pub fn hex_code(self) -> &'static str {
        match self {
            Self::Yellow => "#f6f907",
            Self::Green => "#90e743",
            Self::Blue => "#3d9bff",
            Self::Pink => "#ff8ce5",
            Self::Purple => "#c665ff",
            Self::Orange => "#fcaf3e",
            Self::Red => "#ff8990",
            Self::Teal => "#63e8e9",
            Self::Magenta => "#ff6496",
            Self::White => "#ffffff",
            Self::Grey => "#bbbbbb",
            Self::Black => "#222222",
        }
    }
}

impl fmt::Display for NoteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NoteColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        // "gray" is accepted for notes written by older builds.
        let wanted = if wanted == "gray" { "grey".to_string() } else { wanted };
        Self::ALL
            .into_iter()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| format!("Unknown note color: {s}"))
    }
}

impl From<String> for NoteColor {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|e| {
            log::warn!("{e}; using {}", NoteColor::default());
            NoteColor::default()
        })
    }
}

impl From<NoteColor> for String {
    fn from(value: NoteColor) -> Self {
        value.name().to_string()
    }
}
