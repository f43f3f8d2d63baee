//! Built-in 5×7 bitmap font covering the overlay's character set.
//!
//! Each glyph is seven rows; bit 4 of a row is the leftmost column.

pub const GLYPH_WIDTH: u32 = 5;
pub const GLYPH_HEIGHT: u32 = 7;
/// Horizontal cells per character, spacing included.
pub const ADVANCE: u32 = 6;
/// Vertical cells per line, spacing included.
pub const LINE_ADVANCE: u32 = 9;

type Glyph = [u8; 7];

const BLANK: Glyph = [0; 7];

/// Bitmap for `c`.  Unsupported characters render blank.
pub fn glyph(c: char) -> Glyph {
    match c {
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
        ':' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'a' => [0b00000, 0b00000, 0b01110, 0b00001, 0b01111, 0b10001, 0b01111],
        't' => [0b01000, 0b01000, 0b11100, 0b01000, 0b01000, 0b01001, 0b00110],
        'o' => [0b00000, 0b00000, 0b01110, 0b10001, 0b10001, 0b10001, 0b01110],
        'n' => [0b00000, 0b00000, 0b10110, 0b11001, 0b10001, 0b10001, 0b10001],
        _ => BLANK,
    }
}

/// Whether cell (`col`, `row`) of `c` is inked.
pub fn is_set(c: char, col: u32, row: u32) -> bool {
    if col >= GLYPH_WIDTH || row >= GLYPH_HEIGHT {
        return false;
    }
    glyph(c)[row as usize] & (1 << (GLYPH_WIDTH - 1 - col)) != 0
}

/// Width of `text` in cells.
pub fn text_width(text: &str) -> u32 {
    text.chars().count() as u32 * ADVANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_characters_are_covered() {
        for c in "0123456789-.:Laton".chars() {
            assert_ne!(glyph(c), BLANK, "missing glyph for {c:?}");
        }
        assert_eq!(glyph(' '), BLANK);
        assert_eq!(glyph('?'), BLANK);
    }

    #[test]
    fn rows_fit_the_cell_width() {
        for c in "0123456789-.:Laton".chars() {
            assert!(glyph(c).iter().all(|row| *row < 1 << GLYPH_WIDTH));
        }
    }

    #[test]
    fn leftmost_column_is_bit_four() {
        assert!(is_set('L', 0, 0));
        assert!(!is_set('L', 4, 0));
        assert!(is_set('L', 4, 6));
        assert!(!is_set('L', 5, 6));
    }

    #[test]
    fn width_counts_characters() {
        assert_eq!(text_width("Lat: 1.0"), 8 * ADVANCE);
        assert_eq!(text_width(""), 0);
    }
}
