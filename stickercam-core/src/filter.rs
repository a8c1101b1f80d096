//! Color filters applied when the camera frame is drawn
//!
//! Each [`FilterKind`] maps to an affine [`ColorTransform`] in normalized RGB
//! space. The matrices are the CSS filter-effect definitions at 100%, so a
//! photo looks the same as the `css()` tag attached to it.

use serde::{Deserialize, Serialize};

/// Selectable visual filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// Unfiltered camera image
    #[default]
    None,
    /// Luminance only
    Grayscale,
    /// Warm brownish tint
    Sepia,
    /// Negative image
    Invert,
}

impl FilterKind {
    /// All filters, in selector order
    pub const ALL: [FilterKind; 4] = [Self::None, Self::Grayscale, Self::Sepia, Self::Invert];

    /// Color transform for this filter
    pub fn transform(&self) -> ColorTransform {
        match self {
            Self::None => ColorTransform::identity(),
            Self::Grayscale => {
                let row = [0.2126, 0.7152, 0.0722];
                ColorTransform::new([row, row, row], [0.0; 3])
            }
            Self::Sepia => ColorTransform::new(
                [
                    [0.393, 0.769, 0.189],
                    [0.349, 0.686, 0.168],
                    [0.272, 0.534, 0.131],
                ],
                [0.0; 3],
            ),
            Self::Invert => ColorTransform::new(
                [[-1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, -1.0]],
                [1.0; 3],
            ),
        }
    }

    /// CSS filter string, used as the filter tag of still images
    pub fn css(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Grayscale => "grayscale(100%)",
            Self::Sepia => "sepia(100%)",
            Self::Invert => "invert(100%)",
        }
    }
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Grayscale => write!(f, "grayscale"),
            Self::Sepia => write!(f, "sepia"),
            Self::Invert => write!(f, "invert"),
        }
    }
}

impl std::str::FromStr for FilterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "off" | "original" => Ok(Self::None),
            "grayscale" | "greyscale" | "mono" | "bw" => Ok(Self::Grayscale),
            "sepia" => Ok(Self::Sepia),
            "invert" | "inverted" | "negative" => Ok(Self::Invert),
            _ => Err(format!("Unknown filter: {}", s)),
        }
    }
}

/// Affine RGB transform: `out = matrix * rgb + offset`, clamped to 0..1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorTransform {
    matrix: [[f32; 3]; 3],
    offset: [f32; 3],
}

impl ColorTransform {
    /// Create a transform from a row-major matrix and offset
    pub const fn new(matrix: [[f32; 3]; 3], offset: [f32; 3]) -> Self {
        Self { matrix, offset }
    }

    /// Transform that leaves colors untouched
    pub const fn identity() -> Self {
        Self::new([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]], [0.0; 3])
    }

    /// Whether this transform is a no-op
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Apply to a normalized RGB triple
    #[inline]
    pub fn apply_rgb(&self, rgb: [f32; 3]) -> [f32; 3] {
        let mut out = [0.0; 3];
        for (i, row) in self.matrix.iter().enumerate() {
            let v = row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2] + self.offset[i];
            out[i] = v.clamp(0.0, 1.0);
        }
        out
    }

    /// Apply to an 8-bit RGBA pixel; alpha is left alone
    #[inline]
    pub fn apply_pixel(&self, px: [u8; 4]) -> [u8; 4] {
        let rgb = self.apply_rgb([
            px[0] as f32 / 255.0,
            px[1] as f32 / 255.0,
            px[2] as f32 / 255.0,
        ]);
        [
            (rgb[0] * 255.0).round() as u8,
            (rgb[1] * 255.0).round() as u8,
            (rgb[2] * 255.0).round() as u8,
            px[3],
        ]
    }
}

impl Default for ColorTransform {
    fn default() -> Self {
        Self::identity()
    }
}
