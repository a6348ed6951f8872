use tracing::debug;
use unicode_general_category::{GeneralCategory, get_general_category};

const ESC: u8 = 0x1b;
const DEL: u8 = 0x7f;

/// A logical event produced from one or more input bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditEvent {
    /// A printable character to append to the buffer.
    Insert(char),
    Backspace,
    Submit,
    /// Cursor-up: step back to an older history entry.
    RecallPrevious,
    /// Cursor-down: step forward to a newer history entry.
    RecallNext,
    /// Cursor-left/right. Consumed, no effect on the buffer.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    SawEscape,
    SawBracket,
    CsiParams,
    /// Inside a multi-byte UTF-8 character.
    Utf8 { buf: [u8; 4], len: u8, need: u8 },
}

/// Byte-synchronous escape and control decoder.
///
/// ```text
/// Idle --ESC--> SawEscape --any--> SawBracket --A/B/C/D--> Idle
///                                      |
///                                      +--0x30..=0x3F--> CsiParams --final--> Idle
/// ```
#[derive(Debug)]
pub struct Decoder {
    state: State,
}

impl Default for Decoder {
    fn default() -> Self {
        Self { state: State::Idle }
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop any partially decoded sequence.
    pub fn reset(&mut self) {
        self.state = State::Idle;
    }

    /// True when the decoder sits between sequences.
    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    /// Feed one byte.
    pub fn feed(&mut self, byte: u8) -> Option<EditEvent> {
        match self.state {
            State::Idle => self.on_idle(byte),
            State::SawEscape => self.on_escape(byte),
            State::SawBracket => self.on_bracket(byte),
            State::CsiParams => self.on_csi_params(byte),
            State::Utf8 { buf, len, need } => self.on_utf8(buf, len, need, byte),
        }
    }

    fn on_idle(&mut self, byte: u8) -> Option<EditEvent> {
        match byte {
            ESC => {
                self.state = State::SawEscape;
                None
            }
            DEL => Some(EditEvent::Backspace),
            b'\n' | b'\r' => Some(EditEvent::Submit),
            b'[' => None,
            0x00..=0x7f => accept(byte as char),
            _ => match utf8_width(byte) {
                Some(need) => {
                    let mut buf = [0u8; 4];
                    buf[0] = byte;
                    self.state = State::Utf8 { buf, len: 1, need };
                    None
                }
                None => None,
            },
        }
    }

    // The byte after ESC is conventionally `[` (or `O` in application
    // cursor mode); it only selects the next state.
    fn on_escape(&mut self, _byte: u8) -> Option<EditEvent> {
        self.state = State::SawBracket;
        None
    }

    fn on_bracket(&mut self, byte: u8) -> Option<EditEvent> {
        self.state = State::Idle;
        match byte {
            b'A' => Some(EditEvent::RecallPrevious),
            b'B' => Some(EditEvent::RecallNext),
            b'C' | b'D' => Some(EditEvent::Ignored),
            0x30..=0x3f => {
                self.state = State::CsiParams;
                None
            }
            _ => {
                debug!(byte, "dropping unrecognized escape sequence");
                None
            }
        }
    }

    fn on_csi_params(&mut self, byte: u8) -> Option<EditEvent> {
        if !(0x20..=0x3f).contains(&byte) {
            debug!(byte, "dropping unrecognized escape sequence");
            self.state = State::Idle;
        }
        None
    }

    fn on_utf8(&mut self, mut buf: [u8; 4], len: u8, need: u8, byte: u8) -> Option<EditEvent> {
        if byte & 0xc0 != 0x80 {
            // Broken sequence; start over with this byte.
            self.state = State::Idle;
            return self.feed(byte);
        }
        buf[len as usize] = byte;
        let len = len + 1;
        if len < need {
            self.state = State::Utf8 { buf, len, need };
            return None;
        }
        self.state = State::Idle;
        std::str::from_utf8(&buf[..len as usize])
            .ok()
            .and_then(|s| s.chars().next())
            .and_then(accept)
    }
}

/// Printable-character filter: whitespace, decimal digits, letters,
/// punctuation and symbols pass. Controls, marks, format and private-use
/// characters do not.
fn accept(c: char) -> Option<EditEvent> {
    use GeneralCategory::*;
    let printable = c.is_whitespace()
        || matches!(
            get_general_category(c),
            UppercaseLetter
                | LowercaseLetter
                | TitlecaseLetter
                | ModifierLetter
                | OtherLetter
                | DecimalNumber
                | ConnectorPunctuation
                | DashPunctuation
                | OpenPunctuation
                | ClosePunctuation
                | InitialPunctuation
                | FinalPunctuation
                | OtherPunctuation
                | MathSymbol
                | CurrencySymbol
                | ModifierSymbol
                | OtherSymbol
        );
    printable.then_some(EditEvent::Insert(c))
}

fn utf8_width(lead: u8) -> Option<u8> {
    match lead {
        0xc2..=0xdf => Some(2),
        0xe0..=0xef => Some(3),
        0xf0..=0xf4 => Some(4),
        _ => None,
    }
}
