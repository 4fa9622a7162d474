use crate::data::{Category, Feature, FeatureName};

/// A straight (non-premultiplied) color with opacity in `[0, 1]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Composite this color over an opaque background
    pub fn over(self, bg: (u8, u8, u8)) -> (u8, u8, u8) {
        let mix = |fg: u8, bg: u8| -> u8 {
            (fg as f32 * self.a + bg as f32 * (1.0 - self.a)).round() as u8
        };
        (mix(self.r, bg.0), mix(self.g, bg.1), mix(self.b, bg.2))
    }
}

impl std::fmt::Display for Rgba {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Fill and stroke of category-zero markers
pub const ORANGE: (Rgba, Rgba) = (Rgba::new(255, 153, 0, 0.4), Rgba::new(255, 204, 0, 0.2));

/// Fill and stroke of every other marker
pub const RED: (Rgba, Rgba) = (Rgba::new(255, 0, 0, 0.4), Rgba::new(255, 0, 0, 0.2));

/// Marker circle radius in CSS pixels
pub const MARKER_RADIUS: u32 = 10;

/// Marker outline width in CSS pixels
pub const STROKE_WIDTH: u32 = 2;

/// Circle marker style of a point feature
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerStyle {
    pub radius: u32,
    pub fill: Rgba,
    pub stroke: Rgba,
    pub stroke_width: u32,
}

/// Styling callback of a vector layer
pub type StyleFn = fn(&Feature) -> MarkerStyle;

/// Fill/stroke pair for a category.
///
/// An unparsed flag lands on the red pair, the same branch a `NaN`
/// comparison against zero takes.
pub fn palette(category: Category) -> (Rgba, Rgba) {
    match category {
        Category::Zero => ORANGE,
        Category::Nonzero(_) | Category::Unparsed => RED,
    }
}

pub fn resolve_style(name: &FeatureName) -> MarkerStyle {
    let (fill, stroke) = palette(name.category);
    MarkerStyle {
        radius: MARKER_RADIUS,
        fill,
        stroke,
        stroke_width: STROKE_WIDTH,
    }
}

/// Default [`StyleFn`] of the marker layer
pub fn feature_style(feature: &Feature) -> MarkerStyle {
    resolve_style(&feature.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_flag_is_orange() {
        let style = resolve_style(&FeatureName::decode("A 0 0042: Shrine"));
        assert_eq!((style.fill, style.stroke), ORANGE);
        assert_eq!(style.radius, 10);
        assert_eq!(style.stroke_width, 2);
    }

    #[test]
    fn test_nonzero_flag_is_red() {
        for name in ["A 1 0001: x", "A -3 0001: x", "A 0.5 001: x"] {
            let style = resolve_style(&FeatureName::decode(name));
            assert_eq!((style.fill, style.stroke), RED, "{}", name);
        }
    }

    #[test]
    fn test_unparseable_flag_is_red() {
        let style = resolve_style(&FeatureName::decode("A x 0001: x"));
        assert_eq!((style.fill, style.stroke), RED);
    }

    #[test]
    fn test_radius_never_varies() {
        let a = resolve_style(&FeatureName::decode("A 0 0001: x"));
        let b = resolve_style(&FeatureName::decode("A 7 0002: y"));
        assert_eq!(a.radius, b.radius);
    }

    #[test]
    fn test_over_blends() {
        let (fill, _) = RED;
        assert_eq!(fill.over((0, 0, 0)), (102, 0, 0));
        assert_eq!(fill.over((255, 255, 255)), (255, 153, 153));
    }

    #[test]
    fn test_css_form() {
        assert_eq!(ORANGE.0.to_string(), "rgba(255, 153, 0, 0.4)");
    }
}
