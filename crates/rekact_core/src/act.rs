//! Decoded key acts.
//!
//! A segment of an act string carries 7 or 8 comma separated tokens:
//!
//! | token | field |
//! |-------|-------|
//! | 0 | sequence index |
//! | 1 | kind (`1` down, `2` up, `3` press) |
//! | 2 | key code |
//! | 3 | milliseconds since the previous act |
//! | 4 | identity hash |
//! | 5 | modifier bits |
//! | 6 | key location |
//! | 7 | optional character code |

use serde::Serialize;

use crate::error::{KactError, Result};
use crate::key::{ActKind, KeyCode, KeyLocation, Modifiers};

/// Smallest number of tokens in a segment.
pub const MIN_TOKENS: usize = 7;
/// Largest number of tokens in a segment.
pub const MAX_TOKENS: usize = 8;

/// One decoded key action.
///
/// Everything except the character payload is fixed at parse time; the
/// character is filled in by replay correlation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KeyAct {
    index: u32,
    kind: ActKind,
    key_code: KeyCode,
    time: u64,
    hash: String,
    modifiers: Modifiers,
    location: KeyLocation,
    #[serde(skip)]
    hint: Option<char>,
    #[serde(rename = "char")]
    ch: Option<char>,
    is_char_event: bool,
    is_unknown: bool,
    is_submission: bool,
}

impl KeyAct {
    /// Decode the tokens of segment `segment`.
    ///
    /// The token count is checked by the splitter; this only rejects fields
    /// that do not decode.
    pub fn from_tokens(segment: usize, tokens: &[&str]) -> Result<Self> {
        if !(MIN_TOKENS..=MAX_TOKENS).contains(&tokens.len()) {
            return Err(KactError::TokenCount {
                segment,
                count: tokens.len(),
            });
        }

        let decode_err = |field: &'static str, value: &str| KactError::Decode {
            segment,
            field,
            value: value.to_string(),
        };

        let index = tokens[0]
            .parse::<u32>()
            .map_err(|_| decode_err("index", tokens[0]))?;
        let kind = tokens[1]
            .parse::<i64>()
            .ok()
            .and_then(ActKind::from_wire)
            .ok_or_else(|| decode_err("kind", tokens[1]))?;
        let key_code = tokens[2]
            .parse::<i32>()
            .map(KeyCode)
            .map_err(|_| decode_err("key code", tokens[2]))?;
        let time = tokens[3]
            .parse::<u64>()
            .map_err(|_| decode_err("time", tokens[3]))?;
        let hash = tokens[4].trim();
        if hash.is_empty() {
            return Err(decode_err("hash", tokens[4]));
        }
        let modifiers = tokens[5]
            .parse::<u8>()
            .map(Modifiers::from_bits)
            .map_err(|_| decode_err("modifiers", tokens[5]))?;
        let location = tokens[6]
            .parse::<u8>()
            .ok()
            .and_then(KeyLocation::from_wire)
            .ok_or_else(|| decode_err("location", tokens[6]))?;
        let ch = match tokens.get(7).copied() {
            Some(raw) => Some(
                raw.parse::<u32>()
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| decode_err("char code", raw))?,
            ),
            None => None,
        };

        Ok(Self {
            index,
            kind,
            key_code,
            time,
            hash: hash.to_string(),
            modifiers,
            location,
            hint: ch,
            ch,
            is_char_event: key_code.is_char_sentinel(),
            is_unknown: !key_code.is_known(),
            is_submission: kind == ActKind::KeyDown && key_code == KeyCode::ENTER,
        })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn kind(&self) -> ActKind {
        self.kind
    }

    pub fn key_code(&self) -> KeyCode {
        self.key_code
    }

    /// Milliseconds since the previous act.
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Opaque identity token used for queue matching.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn location(&self) -> KeyLocation {
        self.location
    }

    /// Character payload, if known or correlated.
    pub fn char(&self) -> Option<char> {
        self.ch
    }

    pub(crate) fn set_char(&mut self, ch: Option<char>) {
        self.ch = ch;
    }

    /// Character carried by the act string itself (token 7).
    pub fn char_hint(&self) -> Option<char> {
        self.hint
    }

    /// Drop anything replay wrote into the character payload.
    pub(crate) fn reset_char(&mut self) {
        self.ch = self.hint;
    }

    /// Whether this act is expected to yield a printable character.
    pub fn is_char_event(&self) -> bool {
        self.is_char_event
    }

    pub fn is_unknown(&self) -> bool {
        self.is_unknown
    }

    /// Whether this act triggers a submission (Enter pressed).
    pub fn is_submission(&self) -> bool {
        self.is_submission
    }

    /// Resolve the character this act's key code stands for.
    ///
    /// For the masked sentinel the character carried by the act string
    /// wins; otherwise a character is synthesized from the identity hash,
    /// but only when `force` is set. Physical printable keys always resolve
    /// from the key table.
    pub fn resolve_char(&self, force: bool) -> Option<char> {
        if self.key_code.is_char_sentinel() {
            return match self.hint {
                Some(ch) => Some(ch),
                None if force => Some(self.synthesize_char()),
                None => None,
            };
        }
        self.key_code.printable(self.modifiers)
    }

    /// Deterministic `a..z` pick derived from the identity hash (FNV-1a).
    fn synthesize_char(&self) -> char {
        let mut state: u32 = 0x811c_9dc5;
        for byte in self.hash.bytes() {
            state ^= u32::from(byte);
            state = state.wrapping_mul(0x0100_0193);
        }
        let ch = char::from(b'a' + (state % 26) as u8);
        if self.modifiers.shift() {
            ch.to_ascii_uppercase()
        } else {
            ch
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn act(raw: &str) -> Result<KeyAct> {
        let tokens: Vec<&str> = raw.split(',').collect();
        KeyAct::from_tokens(0, &tokens)
    }

    #[test]
    fn test_decode_seven_tokens() {
        let act = act("4,1,-2,120,abc,0,0").unwrap();
        assert_eq!(act.index(), 4);
        assert_eq!(act.kind(), ActKind::KeyDown);
        assert_eq!(act.key_code(), KeyCode::CHAR);
        assert_eq!(act.time(), 120);
        assert_eq!(act.hash(), "abc");
        assert_eq!(act.char(), None);
        assert!(act.is_char_event());
        assert!(!act.is_unknown());
        assert!(!act.is_submission());
    }

    #[test]
    fn test_decode_eighth_token_is_char_hint() {
        let act = act("0,3,-2,5,h1,0,0,113").unwrap();
        assert_eq!(act.kind(), ActKind::KeyPress);
        assert_eq!(act.char(), Some('q'));
    }

    #[test]
    fn test_enter_key_down_is_submission() {
        assert!(act("0,1,13,0,h,0,0").unwrap().is_submission());
        assert!(!act("0,2,13,0,h,0,0").unwrap().is_submission());
    }

    #[test]
    fn test_unknown_key_codes() {
        assert!(act("0,1,-9,0,h,0,0").unwrap().is_unknown());
        assert!(act("0,1,999,0,h,0,0").unwrap().is_unknown());
        assert!(!act("0,1,16,0,h,1,1").unwrap().is_unknown());
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            act("x,1,-2,0,h,0,0"),
            Err(KactError::Decode { field: "index", .. })
        ));
        assert!(matches!(
            act("0,7,-2,0,h,0,0"),
            Err(KactError::Decode { field: "kind", .. })
        ));
        assert!(matches!(
            act("0,1,-2,-5,h,0,0"),
            Err(KactError::Decode { field: "time", .. })
        ));
        assert!(matches!(
            act("0,1,-2,0,h,0,9"),
            Err(KactError::Decode { field: "location", .. })
        ));
        assert!(matches!(
            act("0,1,-2,0,h,0,0,55296"),
            Err(KactError::Decode { field: "char code", .. })
        ));
        assert!(matches!(
            act("0,1,-2,0,h,0"),
            Err(KactError::TokenCount { count: 6, .. })
        ));
    }

    #[test]
    fn test_resolve_char_sentinel() {
        let masked = act("0,1,-2,0,abc,0,0").unwrap();
        assert_eq!(masked.resolve_char(false), None);

        let forced = masked.resolve_char(true).unwrap();
        assert!(forced.is_ascii_lowercase());
        // Same hash, same character
        assert_eq!(masked.resolve_char(true), Some(forced));

        let hinted = act("0,1,-2,0,abc,0,0,90").unwrap();
        assert_eq!(hinted.resolve_char(false), Some('Z'));
        assert_eq!(hinted.resolve_char(true), Some('Z'));
    }

    #[test]
    fn test_resolve_char_shift_uppercases_synthesized() {
        let lower = act("0,1,-2,0,abc,0,0").unwrap().resolve_char(true).unwrap();
        let upper = act("0,1,-2,0,abc,1,0").unwrap().resolve_char(true).unwrap();
        assert_eq!(lower.to_ascii_uppercase(), upper);
    }

    #[test]
    fn test_resolve_char_physical() {
        assert_eq!(act("0,1,66,0,h,0,0").unwrap().resolve_char(false), Some('b'));
        assert_eq!(act("0,1,13,0,h,0,0").unwrap().resolve_char(true), None);
    }
}
