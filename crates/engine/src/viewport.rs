use orbitview_render::clamp_pixel_ratio;

/// Logical size of the drawing area plus the host's device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub device_pixel_ratio: f64,
}

impl Viewport {
    /// Dimensions are raised to at least 1.
    pub fn new(width: u32, height: u32, device_pixel_ratio: f64) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            device_pixel_ratio,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Ratio to hand to the renderer: the device ratio, capped.
    pub fn pixel_ratio(&self) -> f64 {
        clamp_pixel_ratio(self.device_pixel_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_is_width_over_height() {
        let v = Viewport::new(1920, 1080, 1.0);
        assert_eq!(v.aspect(), 1920.0 / 1080.0);
    }

    #[test]
    fn zero_dimensions_are_raised() {
        let v = Viewport::new(0, 0, 1.0);
        assert_eq!((v.width, v.height), (1, 1));
        assert_eq!(v.aspect(), 1.0);
    }

    #[test]
    fn pixel_ratio_is_capped() {
        assert_eq!(Viewport::new(10, 10, 3.0).pixel_ratio(), 2.0);
        assert_eq!(Viewport::new(10, 10, 1.5).pixel_ratio(), 1.5);
    }
}
