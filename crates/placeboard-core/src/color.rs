//! Color codes and the fixed board palette.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An RGB color as written to and read back from a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Fallback color for codes outside the palette.
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value.
    pub const fn from_hex(hex: u32) -> Self {
        Self::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// Format as a CSS hex string (`#rrggbb`).
    pub fn to_css(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A single-letter color tag as stored on the board.
///
/// Any uppercase ASCII letter except the segment separator `Z` is a valid
/// code. Only `A`..=`P` are in the palette; the rest render as black.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColorCode(u8);

impl ColorCode {
    pub const A: ColorCode = ColorCode(b'A');
    pub const B: ColorCode = ColorCode(b'B');
    pub const C: ColorCode = ColorCode(b'C');
    pub const D: ColorCode = ColorCode(b'D');
    pub const E: ColorCode = ColorCode(b'E');
    pub const F: ColorCode = ColorCode(b'F');
    pub const G: ColorCode = ColorCode(b'G');
    pub const H: ColorCode = ColorCode(b'H');
    pub const I: ColorCode = ColorCode(b'I');
    pub const J: ColorCode = ColorCode(b'J');
    pub const K: ColorCode = ColorCode(b'K');
    pub const L: ColorCode = ColorCode(b'L');
    pub const M: ColorCode = ColorCode(b'M');
    pub const N: ColorCode = ColorCode(b'N');
    pub const O: ColorCode = ColorCode(b'O');
    pub const P: ColorCode = ColorCode(b'P');

    /// Letter used to separate tile segments on the wire.
    pub const SEPARATOR: char = 'Z';

    /// Parse a board letter. Returns `None` for anything but `A`..=`Y`.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'A'..='Y' => Some(ColorCode(c as u8)),
            _ => None,
        }
    }

    /// Parse a palette letter (`A`..=`P`), as accepted from user input.
    pub fn from_palette_char(c: char) -> Option<Self> {
        Self::from_char(c).filter(|code| code.is_palette())
    }

    pub fn as_char(self) -> char {
        self.0 as char
    }

    /// Whether this code has an entry in the palette.
    pub fn is_palette(self) -> bool {
        PALETTE.iter().any(|(code, _)| *code == self)
    }

    /// Color used when rendering this code; unknown codes fall back to black.
    pub fn rgb(self) -> Rgb {
        PALETTE
            .iter()
            .find(|(code, _)| *code == self)
            .map(|(_, rgb)| *rgb)
            .unwrap_or(Rgb::BLACK)
    }

    /// Reverse lookup from a rendered color.
    ///
    /// Linear scan over the 16 entries. Returns `None` when the color is not
    /// an exact palette match.
    pub fn from_rgb(rgb: Rgb) -> Option<Self> {
        PALETTE
            .iter()
            .find(|(_, entry)| *entry == rgb)
            .map(|(code, _)| *code)
    }

    /// Reverse lookup that falls back to `A` on a miss.
    pub fn from_rgb_or_default(rgb: Rgb) -> Self {
        Self::from_rgb(rgb).unwrap_or(ColorCode::A)
    }
}

impl Default for ColorCode {
    fn default() -> Self {
        ColorCode::A
    }
}

impl fmt::Display for ColorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl Serialize for ColorCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut buf = [0u8; 4];
        serializer.serialize_str(self.as_char().encode_utf8(&mut buf))
    }
}

impl<'de> Deserialize<'de> for ColorCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => ColorCode::from_char(c)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid color code: {:?}", s))),
            _ => Err(serde::de::Error::custom(format!(
                "color code must be a single letter, got {:?}",
                s
            ))),
        }
    }
}

/// The fixed board palette, in alphabet order.
pub const PALETTE: [(ColorCode, Rgb); 16] = [
    (ColorCode::A, Rgb::from_hex(0xff0000)),
    (ColorCode::B, Rgb::from_hex(0xffffff)),
    (ColorCode::C, Rgb::from_hex(0x0000ff)),
    (ColorCode::D, Rgb::from_hex(0x000000)),
    (ColorCode::E, Rgb::from_hex(0xffa500)),
    (ColorCode::F, Rgb::from_hex(0xffff00)),
    (ColorCode::G, Rgb::from_hex(0x00ff00)),
    (ColorCode::H, Rgb::from_hex(0x008000)),
    (ColorCode::I, Rgb::from_hex(0x00ffff)),
    (ColorCode::J, Rgb::from_hex(0x87ceeb)),
    (ColorCode::K, Rgb::from_hex(0x800080)),
    (ColorCode::L, Rgb::from_hex(0xff00ff)),
    (ColorCode::M, Rgb::from_hex(0xffc0cb)),
    (ColorCode::N, Rgb::from_hex(0xa52a2a)),
    (ColorCode::O, Rgb::from_hex(0x808080)),
    (ColorCode::P, Rgb::from_hex(0xc0c0c0)),
];
