/// All overlap parameters in one struct.
/// Adjustable at runtime; the CLI overrides fields with struct-update syntax.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapConfig {
    /// Key that arms the tool while held. Compared case-insensitively.
    pub hotkey: char,
    /// Accuracy passed to kurbo's arc-length approximation (font units).
    pub arclen_accuracy: f64,
    /// Angular tolerance (radians) for the colinearity check that removes
    /// redundant points after a cross-overlap join.
    pub continuity_tolerance: f64,
    /// Grid size for committed coordinates when the host reports none.
    /// 0 = no snapping.
    pub snap_grid: f64,
    /// Stroke colour sent along with preview updates.
    pub preview_stroke: Rgba,
}

/// Straight RGBA colour, components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            hotkey: 'v',
            arclen_accuracy: 1e-3,
            continuity_tolerance: 0.1,
            snap_grid: 0.0,
            preview_stroke: Rgba::BLACK,
        }
    }
}

impl OverlapConfig {
    /// Whether `key` is the configured hotkey, ignoring case.
    pub fn is_hotkey(&self, key: char) -> bool {
        key.to_lowercase().eq(self.hotkey.to_lowercase())
    }
}
