//! `#rrggbb` encoding of RGB triples.

use palette::Srgb;

/// A numeric channel value that can be squeezed into one byte.
///
/// Real values are truncated toward zero, then every value keeps only its
/// low byte, so `256` encodes as `00` and `-1` as `ff`.
pub trait Channel: Copy {
    fn low_byte(self) -> u8;
}

macro_rules! int_channel {
    ($($t:ty),*) => {
        $(
            impl Channel for $t {
                #[inline(always)]
                fn low_byte(self) -> u8 {
                    self as u8
                }
            }
        )*
    };
}

int_channel!(u8, u16, u32, u64, usize, i32, i64);

impl Channel for f32 {
    #[inline(always)]
    fn low_byte(self) -> u8 {
        (self.trunc() as i64) as u8
    }
}

impl Channel for f64 {
    #[inline(always)]
    fn low_byte(self) -> u8 {
        (self.trunc() as i64) as u8
    }
}

/// Encode an RGB triple as a lowercase, 7 character `#rrggbb` string.
pub fn to_hex<T: Channel>(rgb: [T; 3]) -> String {
    format!(
        "#{:02x}{:02x}{:02x}",
        rgb[0].low_byte(),
        rgb[1].low_byte(),
        rgb[2].low_byte()
    )
}

/// Parse `#rrggbb` (or `rrggbb`, either case) back into a color.
pub fn parse_hex(s: &str) -> Option<Srgb<u8>> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Srgb::new(r, g, b))
}

/// Label color that stays readable on top of a swatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextColor {
    Black,
    White,
}

impl TextColor {
    pub fn as_str(self) -> &'static str {
        match self {
            TextColor::Black => "black",
            TextColor::White => "white",
        }
    }
}

/// Pick black text for bright swatches and white text for dark ones.
///
/// Bright means `(299r + 587g + 114b) / 1000 > 128`, compared without
/// dividing so fractional brightness is not floored away.
pub fn text_color(color: Srgb<u8>) -> TextColor {
    let weighted = color.red as u32 * 299 + color.green as u32 * 587 + color.blue as u32 * 114;
    if weighted > 128_000 {
        TextColor::Black
    } else {
        TextColor::White
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_integers() {
        assert_eq!(to_hex([255u8, 0, 0]), "#ff0000");
        assert_eq!(to_hex([0u32, 171, 18]), "#00ab12");
        assert_eq!(to_hex([1i32, 2, 3]), "#010203");
    }

    #[test]
    fn truncates_reals() {
        assert_eq!(to_hex([254.9f32, 0.99, 16.5]), "#fe0010");
        assert_eq!(to_hex([127.999_f64, 128.0, 128.001]), "#7f8080");
    }

    #[test]
    fn out_of_range_keeps_low_byte() {
        assert_eq!(to_hex([256i32, 511, -1]), "#00ffff");
        assert_eq!(to_hex([300.7f32, 0.0, 0.0]), "#2c0000");
    }

    #[test]
    fn output_shape() {
        for rgb in [[0u8, 0, 0], [255, 255, 255], [10, 200, 99]] {
            let hex = to_hex(rgb);
            assert_eq!(hex.len(), 7);
            assert!(hex.starts_with('#'));
            assert!(hex[1..].bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
        }
    }

    #[test]
    fn parse_round_trips_lowercase() {
        for code in ["#000000", "#ff0000", "#0a1b2c", "#ffffff"] {
            let c = parse_hex(code).unwrap();
            assert_eq!(to_hex([c.red, c.green, c.blue]), code);
        }
        assert_eq!(parse_hex("FF8000"), Some(Srgb::new(255, 128, 0)));
    }

    #[test]
    fn parse_rejects_malformed() {
        assert_eq!(parse_hex("#fff"), None);
        assert_eq!(parse_hex("#gg0000"), None);
        assert_eq!(parse_hex("#+f0000"), None);
        assert_eq!(parse_hex("#ff00001"), None);
    }

    #[test]
    fn text_contrast() {
        assert_eq!(text_color(Srgb::new(255, 255, 255)), TextColor::Black);
        assert_eq!(text_color(Srgb::new(0, 0, 0)), TextColor::White);
        assert_eq!(text_color(Srgb::new(255, 255, 0)), TextColor::Black);
        assert_eq!(text_color(Srgb::new(0, 0, 255)), TextColor::White);
    }

    #[test]
    fn text_contrast_keeps_fractional_brightness() {
        // 128.08 once divided; flooring would make it 128 and pick white.
        assert_eq!(text_color(Srgb::new(0, 218, 1)), TextColor::Black);
        // 127.966
        assert_eq!(text_color(Srgb::new(0, 218, 0)), TextColor::White);
    }
}
