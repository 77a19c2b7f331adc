//////////////////////////////////////////////////////////////////////////////

// Colors

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Color(pub u32);

impl Color {
    pub fn gray(n: u8) -> Self { Self(0x010101 * n as u32) }

    // Scales each channel by `alpha`, toward black.
    pub fn fade(&self, alpha: f64) -> Self {
        let scale = |shift: u32| ((((self.0 >> shift) & 0xff) as f64 * alpha) as u32) << shift;
        Color(scale(16) | scale(8) | scale(0))
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        ((self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8)
    }
}

//////////////////////////////////////////////////////////////////////////////

// Glyph

// One tile's look: an ASCII char in the low byte, its color in the rest.
// Tiles are drawn with the full-width form of the char, so they render square.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Glyph(u32);

impl Glyph {
    pub fn new(ch: char, fg: Color) -> Self {
        debug_assert!(ch.is_ascii());
        Self((ch as u32 & 0xff) | (fg.0 << 8))
    }

    pub fn with_fg(&self, color: Color) -> Self {
        Self((self.0 & 0xff) | (color.0 << 8))
    }

    pub fn ch(&self) -> char { (self.0 & 0xff) as u8 as char }

    pub fn fg(&self) -> Color { Color(self.0 >> 8) }

    pub fn wide(&self) -> char {
        match self.ch() {
            x if x.is_ascii_graphic() => char::from_u32(x as u32 + 0xfee0).unwrap_or(x),
            _ => '\u{3000}',
        }
    }
}

//////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_fields() {
        let glyph = Glyph::new('@', Color::gray(8)).with_fg(Color(0x123456));
        assert_eq!(glyph.ch(), '@');
        assert_eq!(glyph.fg(), Color(0x123456));
        assert_eq!(glyph.wide(), '＠');
        assert_eq!(Glyph::default().wide(), '\u{3000}');
        assert_eq!(Glyph::new(' ', Color::gray(0)).wide(), '\u{3000}');
    }

    #[test]
    fn test_fade() {
        assert_eq!(Color::gray(0xff).fade(0.), Color(0));
        assert_eq!(Color(0x80ff40).fade(1.), Color(0x80ff40));
        assert_eq!(Color(0x80ff40).fade(0.5), Color(0x407f20));
        assert_eq!(Color(0x123456).rgb(), (0x12, 0x34, 0x56));
    }
}
