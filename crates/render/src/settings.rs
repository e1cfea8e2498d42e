use orbitview_common::Color;

/// Upper bound on the pixel ratio applied to a renderer.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Clamp a host-reported device pixel ratio to `(0, MAX_PIXEL_RATIO]`.
///
/// Non-finite or non-positive ratios fall back to 1.
pub fn clamp_pixel_ratio(device_pixel_ratio: f64) -> f64 {
    if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio.min(MAX_PIXEL_RATIO)
    } else {
        tracing::warn!(device_pixel_ratio, "invalid device pixel ratio, using 1");
        1.0
    }
}

/// Physical drawing-buffer size for a logical size and pixel ratio.
/// Never returns a zero dimension.
pub fn drawing_buffer_size(width: u32, height: u32, pixel_ratio: f64) -> (u32, u32) {
    let scale = |v: u32| ((v as f64 * pixel_ratio).round() as u32).max(1);
    (scale(width), scale(height))
}

/// Encoding of the final color output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Gamma-encoded output for display.
    Srgb,
    /// Raw linear values.
    Linear,
}

/// Shadow map filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowFilter {
    /// One depth comparison per fragment.
    Basic,
    /// 3x3 comparison kernel.
    Pcf,
    /// 5x5 comparison kernel.
    PcfSoft,
}

impl ShadowFilter {
    /// Half-width of the sampling kernel, in texels.
    pub fn kernel_radius(&self) -> u32 {
        match self {
            ShadowFilter::Basic => 0,
            ShadowFilter::Pcf => 1,
            ShadowFilter::PcfSoft => 2,
        }
    }
}

/// Renderer construction options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererSettings {
    pub antialias: bool,
    pub output_color_space: ColorSpace,
    /// Shadow mapping, off when `None`.
    pub shadows: Option<ShadowFilter>,
    /// Inverse-square falloff for point lights instead of the legacy
    /// distance-cutoff model.
    pub physically_correct_lights: bool,
    pub clear_color: Color,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            antialias: true,
            output_color_space: ColorSpace::Srgb,
            shadows: None,
            physically_correct_lights: false,
            clear_color: Color::rgb(0.0, 0.0, 0.0),
        }
    }
}

impl RendererSettings {
    pub fn msaa_samples(&self) -> u32 {
        if self.antialias { 4 } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_ratio_never_exceeds_two() {
        for dpr in [2.0, 2.5, 3.0, 4.0, 100.0, f64::MAX] {
            assert_eq!(clamp_pixel_ratio(dpr), 2.0);
        }
    }

    #[test]
    fn pixel_ratio_below_cap_passes_through() {
        assert_eq!(clamp_pixel_ratio(1.0), 1.0);
        assert_eq!(clamp_pixel_ratio(1.25), 1.25);
    }

    #[test]
    fn bad_pixel_ratio_falls_back_to_one() {
        assert_eq!(clamp_pixel_ratio(0.0), 1.0);
        assert_eq!(clamp_pixel_ratio(-2.0), 1.0);
        assert_eq!(clamp_pixel_ratio(f64::NAN), 1.0);
        assert_eq!(clamp_pixel_ratio(f64::INFINITY), 1.0);
    }

    #[test]
    fn drawing_buffer_scales_and_rounds() {
        assert_eq!(drawing_buffer_size(800, 600, 2.0), (1600, 1200));
        assert_eq!(drawing_buffer_size(801, 601, 1.5), (1202, 902));
        assert_eq!(drawing_buffer_size(0, 0, 1.0), (1, 1));
    }

    #[test]
    fn defaults() {
        let s = RendererSettings::default();
        assert!(s.antialias);
        assert_eq!(s.msaa_samples(), 4);
        assert_eq!(s.output_color_space, ColorSpace::Srgb);
        assert!(s.shadows.is_none());
        assert_eq!(ShadowFilter::PcfSoft.kernel_radius(), 2);
    }
}
