//! Four-channel color swizzles (`rgba`, `bgra`, `aaa1`, …).

use std::fmt;

/// A channel remapping over `r g b a 0 1`, packed four bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Swizzle {
    key: u16,
}

const CHANNELS: [char; 6] = ['r', 'g', 'b', 'a', '0', '1'];

const fn channel_index(c: u8) -> u16 {
    match c {
        b'r' => 0,
        b'g' => 1,
        b'b' => 2,
        b'a' => 3,
        b'0' => 4,
        b'1' => 5,
        _ => panic!("invalid swizzle channel"),
    }
}

impl Default for Swizzle {
    fn default() -> Self {
        Self::RGBA
    }
}

impl Swizzle {
    pub const RGBA: Self = Self::new("rgba");
    pub const BGRA: Self = Self::new("bgra");
    pub const RRRA: Self = Self::new("rrra");
    pub const AAAA: Self = Self::new("aaaa");
    pub const RGB1: Self = Self::new("rgb1");

    /// Parses a four-character swizzle. Panics (at compile time for consts)
    /// on anything other than four of `rgba01`.
    #[must_use]
    pub const fn new(s: &str) -> Self {
        let bytes = s.as_bytes();
        assert!(bytes.len() == 4, "swizzle must have four channels");
        let key = channel_index(bytes[0])
            | (channel_index(bytes[1]) << 4)
            | (channel_index(bytes[2]) << 8)
            | (channel_index(bytes[3]) << 12);
        Self { key }
    }

    /// Key contribution (16 bits).
    #[inline]
    #[must_use]
    pub fn as_key(self) -> u16 {
        self.key
    }

    #[must_use]
    pub fn channel(self, i: usize) -> char {
        CHANNELS[usize::from((self.key >> (4 * i)) & 0xf)]
    }

    #[inline]
    #[must_use]
    pub fn is_identity(self) -> bool {
        self == Self::RGBA
    }

    /// Applies `other` first, then `then`.
    #[must_use]
    pub fn concat(other: Self, then: Self) -> Self {
        let mut key = 0u16;
        for i in 0..4 {
            let idx = (then.key >> (4 * i)) & 0xf;
            let channel = if idx < 4 {
                (other.key >> (4 * idx)) & 0xf
            } else {
                idx
            };
            key |= channel << (4 * i);
        }
        Self { key }
    }

    /// WGSL expression applying this swizzle to the `vec4<f32>` variable `var`.
    #[must_use]
    pub fn apply(self, var: &str) -> String {
        if self.is_identity() {
            return var.to_string();
        }
        let channels: Vec<char> = (0..4).map(|i| self.channel(i)).collect();
        if channels.iter().all(char::is_ascii_alphabetic) {
            let s: String = channels.into_iter().collect();
            return format!("{var}.{s}");
        }
        let lanes: Vec<String> = channels
            .into_iter()
            .map(|c| match c {
                '0' => "0.0".to_string(),
                '1' => "1.0".to_string(),
                c => format!("{var}.{c}"),
            })
            .collect();
        format!("vec4<f32>({})", lanes.join(", "))
    }
}

impl fmt::Display for Swizzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..4 {
            write!(f, "{}", self.channel(i))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!(Swizzle::BGRA.to_string(), "bgra");
        assert_eq!(Swizzle::new("aaa1").channel(3), '1');
        assert!(Swizzle::RGBA.is_identity());
        assert_ne!(Swizzle::RGBA.as_key(), Swizzle::BGRA.as_key());
    }

    #[test]
    fn test_concat() {
        assert_eq!(Swizzle::concat(Swizzle::BGRA, Swizzle::BGRA), Swizzle::RGBA);
        assert_eq!(Swizzle::concat(Swizzle::RGBA, Swizzle::AAAA), Swizzle::AAAA);
        assert_eq!(Swizzle::concat(Swizzle::BGRA, Swizzle::RGB1).to_string(), "bgr1");
    }

    #[test]
    fn test_apply() {
        assert_eq!(Swizzle::RGBA.apply("c"), "c");
        assert_eq!(Swizzle::BGRA.apply("c"), "c.bgra");
        assert_eq!(Swizzle::RGB1.apply("c"), "vec4<f32>(c.r, c.g, c.b, 1.0)");
    }
}
