use serde::{ Serialize, Deserialize };

/// Opaque accent triple supplied by the host theme.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

pub const DEFAULT_ACCENT: Rgb = Rgb { r: 0x60, g: 0xa5, b: 0xfa };

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// Round and clamp a channel value into a byte. NaN becomes 0.
#[inline]
pub fn clamp_byte(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.round_ties_even().clamp(0.0, 255.0) as u8
}

/// Parse the color forms theme stylesheets use: `#rgb`, `#rrggbb`,
/// `#rrggbbaa`, `rgb(..)` and `rgba(..)`. Alpha is dropped.
pub fn parse_css_color(input: &str) -> Option<Rgb> {
    let s = input.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    let lower = s.to_ascii_lowercase();
    let body = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let parts: Vec<&str> = body
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() < 3 {
        return None;
    }
    let mut rgb = [0u8; 3];
    for (slot, part) in rgb.iter_mut().zip(&parts[..3]) {
        let v: f32 = part.parse().ok()?;
        *slot = clamp_byte(v);
    }
    Some(Rgb::new(rgb[0], rgb[1], rgb[2]))
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok();
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 | 4 => Some(Rgb::new(nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17)),
        6 | 8 => Some(Rgb::new(byte(0)?, byte(2)?, byte(4)?)),
        _ => None,
    }
}
