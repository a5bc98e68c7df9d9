//! Terminal escape-sequence stripping.
//!
//! Output is run through a `vte` parser; printable characters and the
//! layout controls that carry meaning in a transcript (newline, carriage
//! return, tab) are kept, every CSI/OSC/ESC sequence and other control byte
//! is dropped.

use vte::{Parser, Perform};

/// Collects the printable content seen by the parser.
struct Printable {
    out: String,
}

impl Perform for Printable {
    fn print(&mut self, c: char) {
        self.out.push(c);
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.out.push(byte as char);
        }
    }
}

/// Strip escape sequences from raw terminal output.
pub fn strip(data: &[u8]) -> Vec<u8> {
    strip_str(data).into_bytes()
}

/// Strip escape sequences, returning text. Invalid UTF-8 becomes U+FFFD.
pub fn strip_str(data: &[u8]) -> String {
    let mut parser = Parser::new();
    let mut performer = Printable {
        out: String::with_capacity(data.len()),
    };
    parser.advance(&mut performer, data);
    performer.out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_color_codes() {
        assert_eq!(strip(b"\x1b[32mGreen text\x1b[0m"), b"Green text");
    }

    #[test]
    fn test_keeps_layout_controls() {
        assert_eq!(strip_str(b"a\tb\r\nc"), "a\tb\r\nc");
    }

    #[test]
    fn test_drops_bell_and_backspace() {
        assert_eq!(strip_str(b"ab\x08\x07c"), "abc");
    }

    #[test]
    fn test_strips_cursor_movement_and_title() {
        assert_eq!(strip_str(b"\x1b[2K\x1b[1Gxr1#"), "xr1#");
        assert_eq!(strip_str(b"\x1b]0;title\x07R1#"), "R1#");
    }

    #[test]
    fn test_plain_text_is_unchanged() {
        let text = "GigabitEthernet0/0/0/0 is up, line protocol is up";
        assert_eq!(strip_str(text.as_bytes()), text);
    }
}
