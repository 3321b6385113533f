//! Reconstruction options.

/// Options for rebuilding pages around translated text.
///
/// The font floor and growth settings are calibration parameters, not
/// invariants.
#[derive(Debug, Clone)]
pub struct ReconstructOptions {
    /// Smallest font scale the fitting ladder may reach (fraction of the
    /// original size)
    pub min_font_scale: f32,

    /// Scale decrement of each shrinking step
    pub font_step: f32,

    /// Line pitch of reflowed text when the block has a single line
    /// (multiple of the font size)
    pub line_spacing: f32,

    /// Let blocks grow into the whitespace below them
    pub allow_growth: bool,

    /// Appended to truncated text
    pub overflow_marker: String,

    /// Paint over each original run before placing new text
    pub cover_original: bool,

    /// Margin added around covered runs (points)
    pub cover_margin: f32,

    /// Growth never reaches into this band at the bottom of the page (points)
    pub bottom_margin: f32,

    /// Space kept between a table cell's border and its text (points)
    pub cell_padding: f32,

    /// Reconstruct pages and lanes in parallel
    pub parallel: bool,
}

impl ReconstructOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the font floor (clamped to 0.1-1.0).
    pub fn with_min_font_scale(mut self, scale: f32) -> Self {
        self.min_font_scale = scale.clamp(0.1, 1.0);
        self
    }

    pub fn with_font_step(mut self, step: f32) -> Self {
        self.font_step = step.clamp(0.005, 0.5);
        self
    }

    pub fn with_line_spacing(mut self, spacing: f32) -> Self {
        self.line_spacing = spacing.max(0.5);
        self
    }

    pub fn with_growth(mut self, allow: bool) -> Self {
        self.allow_growth = allow;
        self
    }

    pub fn with_overflow_marker(mut self, marker: impl Into<String>) -> Self {
        self.overflow_marker = marker.into();
        self
    }

    pub fn with_cover(mut self, cover: bool) -> Self {
        self.cover_original = cover;
        self
    }

    pub fn with_bottom_margin(mut self, margin: f32) -> Self {
        self.bottom_margin = margin.max(0.0);
        self
    }

    pub fn with_cell_padding(mut self, padding: f32) -> Self {
        self.cell_padding = padding.max(0.0);
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Font scales tried by the shrinking steps, largest first. Always ends
    /// at the floor.
    pub fn scale_steps(&self) -> Vec<f32> {
        let floor = self.min_font_scale.clamp(0.1, 1.0);
        let step = self.font_step.max(0.005);
        let mut steps = vec![1.0];
        let mut k = 1;
        loop {
            let scale = 1.0 - step * k as f32;
            if scale <= floor + 1e-4 {
                break;
            }
            steps.push(scale);
            k += 1;
        }
        if floor < 1.0 {
            steps.push(floor);
        }
        steps
    }
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self {
            min_font_scale: 0.7,
            font_step: 0.05,
            line_spacing: 1.2,
            allow_growth: true,
            overflow_marker: "…".to_string(),
            cover_original: false,
            cover_margin: 0.5,
            bottom_margin: 36.0,
            cell_padding: 2.0,
            parallel: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_steps_end_at_floor() {
        let steps = ReconstructOptions::new()
            .with_min_font_scale(0.7)
            .with_font_step(0.1)
            .scale_steps();
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0], 1.0);
        assert!((steps[1] - 0.9).abs() < 1e-6);
        assert!((steps[2] - 0.8).abs() < 1e-6);
        assert_eq!(steps[3], 0.7);
    }

    #[test]
    fn test_scale_steps_without_shrinking() {
        let steps = ReconstructOptions::new().with_min_font_scale(1.0).scale_steps();
        assert_eq!(steps, vec![1.0]);
    }

    #[test]
    fn test_uneven_step() {
        let steps = ReconstructOptions::new()
            .with_min_font_scale(0.75)
            .with_font_step(0.1)
            .scale_steps();
        assert_eq!(steps.last().copied(), Some(0.75));
        assert!(steps.windows(2).all(|w| w[0] > w[1]));
    }
}
