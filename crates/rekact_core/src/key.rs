//! Key vocabulary
//!
//! Act kinds, key codes as they appear in act strings, and modifier flags.

use serde::Serialize;
use std::fmt;

/// Kind of a recorded key action. Discriminants are the wire values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ActKind {
    KeyDown = 1,
    KeyUp = 2,
    KeyPress = 3,
}

impl ActKind {
    /// Decode the kind token of a segment.
    pub fn from_wire(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::KeyDown),
            2 => Some(Self::KeyUp),
            3 => Some(Self::KeyPress),
            _ => None,
        }
    }
}

impl fmt::Display for ActKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::KeyDown => "KeyDown",
            Self::KeyUp => "KeyUp",
            Self::KeyPress => "KeyPress",
        };
        f.write_str(name)
    }
}

/// Key code carried by an act.
///
/// Negative values are synthetic codes written by the sensor. Non-negative
/// values are physical (virtual-key) codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct KeyCode(pub i32);

impl KeyCode {
    /// Sentinel for a printable key whose character was masked.
    pub const CHAR: KeyCode = KeyCode(-2);

    pub const BACKSPACE: KeyCode = KeyCode(8);
    pub const TAB: KeyCode = KeyCode(9);
    pub const ENTER: KeyCode = KeyCode(13);
    pub const SHIFT: KeyCode = KeyCode(16);
    pub const CTRL: KeyCode = KeyCode(17);
    pub const ALT: KeyCode = KeyCode(18);
    pub const ESCAPE: KeyCode = KeyCode(27);
    pub const SPACE: KeyCode = KeyCode(32);
    pub const DELETE: KeyCode = KeyCode(46);

    pub const fn value(self) -> i32 {
        self.0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Check if this is the masked-character sentinel.
    pub const fn is_char_sentinel(self) -> bool {
        self.0 == Self::CHAR.0
    }

    /// Check if the code resolves to a known symbol.
    pub fn is_known(self) -> bool {
        self.is_char_sentinel() || self.symbol().is_some()
    }

    /// Symbolic name of a physical key, if tabled.
    pub fn symbol(self) -> Option<&'static str> {
        let name = match self.0 {
            8 => "Backspace",
            9 => "Tab",
            13 => "Enter",
            16 => "Shift",
            17 => "Control",
            18 => "Alt",
            19 => "Pause",
            20 => "CapsLock",
            27 => "Escape",
            32 => "Space",
            33 => "PageUp",
            34 => "PageDown",
            35 => "End",
            36 => "Home",
            37 => "ArrowLeft",
            38 => "ArrowUp",
            39 => "ArrowRight",
            40 => "ArrowDown",
            45 => "Insert",
            46 => "Delete",
            48..=57 => "Digit",
            65..=90 => "Letter",
            91 | 92 => "Meta",
            93 => "ContextMenu",
            96..=105 => "Numpad",
            112..=123 => "Function",
            144 => "NumLock",
            145 => "ScrollLock",
            186..=192 | 219..=222 => "Punctuation",
            _ => return None,
        };
        Some(name)
    }

    /// Base character produced by a printable physical key.
    pub fn printable(self, modifiers: Modifiers) -> Option<char> {
        let code = u32::try_from(self.0).ok()?;
        let ch = match code {
            32 => ' ',
            48..=57 => char::from_u32(code)?,
            65..=90 => {
                let upper = char::from_u32(code)?;
                if modifiers.shift() {
                    upper
                } else {
                    upper.to_ascii_lowercase()
                }
            }
            96..=105 => char::from_u32(code - 48)?,
            186 => ';',
            187 => '=',
            188 => ',',
            189 => '-',
            190 => '.',
            191 => '/',
            192 => '`',
            219 => '[',
            220 => '\\',
            221 => ']',
            222 => '\'',
            _ => return None,
        };
        Some(ch)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.symbol() {
            Some(symbol) => write!(f, "{}({})", symbol, self.0),
            None if self.is_char_sentinel() => write!(f, "Char({})", self.0),
            None => write!(f, "Unknown({})", self.0),
        }
    }
}

/// Keyboard modifier flags
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Modifiers {
    bits: u8,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { bits: 0 };
    pub const SHIFT: u8 = 0b0001;
    pub const CTRL: u8 = 0b0010;
    pub const ALT: u8 = 0b0100;
    pub const META: u8 = 0b1000;

    /// Create from raw bits
    pub const fn from_bits(bits: u8) -> Self {
        Self { bits }
    }

    pub const fn bits(&self) -> u8 {
        self.bits
    }

    pub const fn shift(&self) -> bool {
        self.bits & Self::SHIFT != 0
    }

    pub const fn ctrl(&self) -> bool {
        self.bits & Self::CTRL != 0
    }

    pub const fn alt(&self) -> bool {
        self.bits & Self::ALT != 0
    }

    pub const fn meta(&self) -> bool {
        self.bits & Self::META != 0
    }

    /// Check if any modifier is held
    pub const fn any(&self) -> bool {
        self.bits != 0
    }
}

/// Physical location of the key on the keyboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum KeyLocation {
    #[default]
    Standard,
    Left,
    Right,
    Numpad,
}

impl KeyLocation {
    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Standard),
            1 => Some(Self::Left),
            2 => Some(Self::Right),
            3 => Some(Self::Numpad),
            _ => None,
        }
    }
}
