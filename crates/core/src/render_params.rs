//! Render parameter lookups: resolution labels and aspect ratios.
//!
//! Unknown labels fall back to 1080p and 16:9 rather than failing; the
//! renderer always receives a usable configuration.

/* --------------------------------------------------------------------------
Named constants
-------------------------------------------------------------------------- */

/// Resolution label used when the submitted one is not recognized.
pub const DEFAULT_RESOLUTION: &str = "1080p";

/// Aspect ratio used when the submitted one is not recognized.
pub const DEFAULT_ASPECT_RATIO: &str = "16:9";

/// Quality presets understood by the renderer's CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityPreset {
    Low,
    Medium,
    High,
    Production,
    FourK,
}

impl QualityPreset {
    /// Command-line flag for this preset.
    pub fn flag(&self) -> &'static str {
        match self {
            QualityPreset::Low => "-ql",
            QualityPreset::Medium => "-qm",
            QualityPreset::High => "-qh",
            QualityPreset::Production => "-qp",
            QualityPreset::FourK => "-qk",
        }
    }

    /// Output height in pixels for a landscape frame.
    pub fn pixel_height(&self) -> u32 {
        match self {
            QualityPreset::Low => 480,
            QualityPreset::Medium => 720,
            QualityPreset::High => 1080,
            QualityPreset::Production => 1440,
            QualityPreset::FourK => 2160,
        }
    }
}

/* --------------------------------------------------------------------------
Lookups
-------------------------------------------------------------------------- */

/// Map a resolution label (e.g. `"720p"`, `"4k"`) to a quality preset.
pub fn quality_for_resolution(resolution: &str) -> QualityPreset {
    match resolution.trim().to_ascii_lowercase().as_str() {
        "480p" | "low" => QualityPreset::Low,
        "720p" | "medium" => QualityPreset::Medium,
        "1080p" | "high" => QualityPreset::High,
        "1440p" | "2k" => QualityPreset::Production,
        "2160p" | "4k" => QualityPreset::FourK,
        _ => QualityPreset::High,
    }
}

/// Width/height ratio parts for an aspect ratio label.
fn ratio_parts(aspect_ratio: &str) -> (u32, u32) {
    match aspect_ratio.trim() {
        "9:16" => (9, 16),
        "1:1" => (1, 1),
        "4:3" => (4, 3),
        _ => (16, 9),
    }
}

/// Pixel dimensions `(width, height)` for a resolution and aspect ratio.
///
/// The preset height is the length of the short edge; dimensions are rounded
/// down to even numbers as video encoders require.
pub fn frame_dimensions(resolution: &str, aspect_ratio: &str) -> (u32, u32) {
    let short_edge = quality_for_resolution(resolution).pixel_height();
    let (w, h) = ratio_parts(aspect_ratio);
    let (width, height) = if w >= h {
        (short_edge * w / h, short_edge)
    } else {
        (short_edge, short_edge * h / w)
    };
    (width & !1, height & !1)
}
