use std::fmt;

use serde::{Deserialize, Serialize};

/// Straight (non-premultiplied) sRGB color with a float alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0.0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from a `0xRRGGBB` literal.
    pub const fn from_u32(rgb: u32) -> Self {
        Self::rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// Build from float channels, rounding and clamping each to `0..=255`.
    pub fn from_channels(r: f64, g: f64, b: f64) -> Self {
        Self::rgb(channel(r), channel(g), channel(b))
    }

    pub const fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`, `rgba(r, g, b, a)` and a handful
    /// of keywords.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        let lower = s.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_rgb_args(args);
        }
        match lower.as_str() {
            "black" => Some(Self::BLACK),
            "white" => Some(Self::WHITE),
            "transparent" => Some(Self::TRANSPARENT),
            _ => None,
        }
    }

    /// CSS form accepted by canvas `fillStyle`/`strokeStyle`.
    pub fn to_css(&self) -> String {
        if self.a >= 1.0 {
            format!("rgb({}, {}, {})", self.r, self.g, self.b)
        } else {
            rgba_css(self.r, self.g, self.b, self.a)
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unrecognized color: {value}"))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        if color.a >= 1.0 {
            color.to_hex()
        } else {
            color.to_css()
        }
    }
}

/// Format RGBA as a CSS color string.
pub fn rgba_css(r: u8, g: u8, b: u8, a: f64) -> String {
    format!("rgba({r}, {g}, {b}, {a})")
}

fn channel(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.round().clamp(0.0, 255.0) as u8
}

fn parse_hex(hex: &str) -> Option<Color> {
    let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => Some(Color::rgb(
            nibble(0)? * 17,
            nibble(1)? * 17,
            nibble(2)? * 17,
        )),
        6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color::rgba(
            byte(0)?,
            byte(2)?,
            byte(4)?,
            byte(6)? as f64 / 255.0,
        )),
        _ => None,
    }
}

fn parse_rgb_args(args: &str) -> Option<Color> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let num = |s: &str| s.parse::<f64>().ok();
    match parts.as_slice() {
        [r, g, b] => Some(Color::from_channels(num(r)?, num(g)?, num(b)?)),
        [r, g, b, a] => Some(
            Color::from_channels(num(r)?, num(g)?, num(b)?).with_alpha(num(a)?.clamp(0.0, 1.0)),
        ),
        _ => None,
    }
}

/// Linear interpolation in RGB space; alpha is interpolated too.
pub fn lerp(from: Color, to: Color, t: f64) -> Color {
    let mix = |a: u8, b: u8| a as f64 + (b as f64 - a as f64) * t;
    Color::from_channels(mix(from.r, to.r), mix(from.g, to.g), mix(from.b, to.b))
        .with_alpha(from.a + (to.a - from.a) * t)
}

/// Uniform cubic B-spline through `colors`, sampled at `t ∈ [0, 1]`. Hits the first and last
/// color exactly at the ends.
pub fn rgb_basis(colors: &[Color], t: f64) -> Color {
    match colors {
        [] => Color::TRANSPARENT,
        [only] => *only,
        _ => {
            let r: Vec<f64> = colors.iter().map(|c| c.r as f64).collect();
            let g: Vec<f64> = colors.iter().map(|c| c.g as f64).collect();
            let b: Vec<f64> = colors.iter().map(|c| c.b as f64).collect();
            Color::from_channels(
                basis_spline(&r, t),
                basis_spline(&g, t),
                basis_spline(&b, t),
            )
        }
    }
}

fn basis(t1: f64, v0: f64, v1: f64, v2: f64, v3: f64) -> f64 {
    let t2 = t1 * t1;
    let t3 = t2 * t1;
    ((1.0 - 3.0 * t1 + 3.0 * t2 - t3) * v0
        + (4.0 - 6.0 * t2 + 3.0 * t3) * v1
        + (1.0 + 3.0 * t1 + 3.0 * t2 - 3.0 * t3) * v2
        + t3 * v3)
        / 6.0
}

fn basis_spline(values: &[f64], t: f64) -> f64 {
    let n = values.len() - 1;
    let (t, i) = if t.is_nan() || t <= 0.0 {
        (0.0, 0)
    } else if t >= 1.0 {
        (1.0, n - 1)
    } else {
        (t, ((t * n as f64).floor() as usize).min(n - 1))
    };
    let v1 = values[i];
    let v2 = values[i + 1];
    let v0 = if i > 0 { values[i - 1] } else { 2.0 * v1 - v2 };
    let v3 = if i + 2 <= n { values[i + 2] } else { 2.0 * v2 - v1 };
    basis((t - i as f64 / n as f64) * n as f64, v0, v1, v2, v3)
}

/// ColorBrewer ramps, as nine- or eleven-stop hex strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NamedScheme {
    #[default]
    Blues,
    Greens,
    Greys,
    Oranges,
    Purples,
    Reds,
    RdYlBu,
    RdBu,
    PiYG,
    Spectral,
}

impl NamedScheme {
    pub const ALL: [Self; 10] = [
        Self::Blues,
        Self::Greens,
        Self::Greys,
        Self::Oranges,
        Self::Purples,
        Self::Reds,
        Self::RdYlBu,
        Self::RdBu,
        Self::PiYG,
        Self::Spectral,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Blues => "blues",
            Self::Greens => "greens",
            Self::Greys => "greys",
            Self::Oranges => "oranges",
            Self::Purples => "purples",
            Self::Reds => "reds",
            Self::RdYlBu => "rdYlBu",
            Self::RdBu => "rdBu",
            Self::PiYG => "piYG",
            Self::Spectral => "spectral",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|scheme| scheme.name().eq_ignore_ascii_case(name))
    }

    fn hex(self) -> &'static str {
        match self {
            Self::Blues => "f7fbffdeebf7c6dbef9ecae16baed64292c62171b508519c08306b",
            Self::Greens => "f7fcf5e5f5e0c7e9c0a1d99b74c47641ab5d238b45006d2c00441b",
            Self::Greys => "fffffff0f0f0d9d9d9bdbdbd969696737373525252252525000000",
            Self::Oranges => "fff5ebfee6cefdd0a2fdae6bfd8d3cf16913d94801a636037f2704",
            Self::Purples => "fcfbfdefedf5dadaebbcbddc9e9ac8807dba6a51a354278f3f007d",
            Self::Reds => "fff5f0fee0d2fcbba1fc9272fb6a4aef3b2ccb181da50f1567000d",
            Self::RdYlBu => {
                "a50026d73027f46d43fdae61fee090ffffbfe0f3f8abd9e974add14575b4313695"
            }
            Self::RdBu => "67001fb2182bd6604df4a582fddbc7f7f7f7d1e5f092c5de4393c32166ac053061",
            Self::PiYG => "8e0152c51b7dde77aef1b6dafde0eff7f7f7e6f5d0b8e1867fbc414d9221276419",
            Self::Spectral => {
                "9e0142d53e4ff46d43fdae61fee08bffffbfe6f598abdda466c2a53288bd5e4fa2"
            }
        }
    }

    pub fn colors(self) -> Vec<Color> {
        let hex = self.hex();
        (0..hex.len() / 6)
            .filter_map(|i| parse_hex(&hex[i * 6..i * 6 + 6]))
            .collect()
    }

    pub fn sample(self, t: f64) -> Color {
        rgb_basis(&self.colors(), t)
    }
}
