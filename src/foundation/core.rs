use crate::foundation::error::{VisageError, VisageResult};

pub use kurbo::{Point, Rect, Size};

/// Straight (non-premultiplied) RGBA8 pixel.
pub type Rgba8 = [u8; 4];

/// Fully transparent pixel.
pub const TRANSPARENT: Rgba8 = [0, 0, 0, 0];

/// Integer pixel rectangle with a top-left origin.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
pub struct PixelRect {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelRect {
    /// Construct a pixel rectangle.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Pixel count covered by the rectangle.
    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Whether the rectangle lies inside a `width x height` image.
    pub fn fits_within(self, width: u32, height: u32) -> bool {
        self.right() <= width && self.bottom() <= height
    }
}

/// Opaque RGB colour associated with a persona (placeholder generation input).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb8 {
    /// Neutral gray used when a persona has no registered colour.
    pub const GRAY: Self = Self {
        r: 128,
        g: 128,
        b: 128,
    };

    /// Construct a colour from channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Multiply every channel by `factor`, saturating at 255.
    pub fn scaled(self, factor: f32) -> Self {
        fn ch(c: u8, f: f32) -> u8 {
            (f32::from(c) * f).round().clamp(0.0, 255.0) as u8
        }
        Self {
            r: ch(self.r, factor),
            g: ch(self.g, factor),
            b: ch(self.b, factor),
        }
    }

    /// Opaque RGBA8 pixel with this colour.
    pub fn to_rgba8(self) -> Rgba8 {
        [self.r, self.g, self.b, 255]
    }
}

impl From<[u8; 3]> for Rgb8 {
    fn from(v: [u8; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Rgb8> for [u8; 3] {
    fn from(c: Rgb8) -> Self {
        [c.r, c.g, c.b]
    }
}

impl std::str::FromStr for Rgb8 {
    type Err = VisageError;

    /// Parse `"r,g,b"`.
    fn from_str(s: &str) -> VisageResult<Self> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<u8>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| VisageError::validation(format!("parse colour '{s}': {e}")))?;
        match parts.as_slice() {
            [r, g, b] => Ok(Self::new(*r, *g, *b)),
            _ => Err(VisageError::validation(format!(
                "colour '{s}' must have exactly three components"
            ))),
        }
    }
}

/// Build a normalized rectangle from `(x, y, width, height)` in `[0, 1]` image units.
///
/// Negative sizes are kept as-is (not re-ordered) so they are reported as degenerate.
pub fn norm_rect(x: f64, y: f64, width: f64, height: f64) -> Rect {
    Rect::new(x, y, x + width, y + height)
}

/// Whether every coordinate of `r` is finite and its size is strictly positive.
pub fn is_non_degenerate(r: Rect) -> bool {
    let finite = r.x0.is_finite() && r.y0.is_finite() && r.x1.is_finite() && r.y1.is_finite();
    finite && r.width() > 0.0 && r.height() > 0.0
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
