use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

use crate::data::model::Value;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: cell value → Color32
// ---------------------------------------------------------------------------

/// Maps unique values of a chosen column to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    pub column: String,
    mapping: BTreeMap<Value, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map for the given column from its unique values.
    pub fn new(column: &str, unique_values: &std::collections::BTreeSet<Value>) -> Self {
        let palette = generate_palette(unique_values.len());
        let mapping: BTreeMap<Value, Color32> = unique_values
            .iter()
            .zip(palette.into_iter())
            .map(|(v, c): (&Value, Color32)| (v.clone(), c))
            .collect();

        ColorMap {
            column: column.to_string(),
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given cell value.
    pub fn color_for(&self, value: &Value) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }

    /// Return the legend entries (value label → colour) for the UI.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.mapping
            .iter()
            .map(|(v, c): (&Value, &Color32)| (v.to_string(), *c))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Diverging ramp for correlation heatmap cells
// ---------------------------------------------------------------------------

/// Map a Pearson coefficient in [-1, 1] to a blue–white–red ramp.
pub fn diverging(coefficient: f64) -> Color32 {
    let t = coefficient.clamp(-1.0, 1.0) as f32;
    let white: LinSrgb = LinSrgb::new(1.0, 1.0, 1.0);
    let blue = Srgb::new(0.13, 0.31, 0.70).into_linear();
    let red = Srgb::new(0.75, 0.15, 0.15).into_linear();

    let mixed = if t < 0.0 {
        white.mix(blue, -t)
    } else {
        white.mix(red, t)
    };
    let rgb: Srgb = Srgb::from_linear(mixed);
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn palette_size_matches_request() {
        assert!(generate_palette(0).is_empty());
        assert_eq!(generate_palette(5).len(), 5);
    }

    #[test]
    fn color_map_covers_domain_with_fallback() {
        let domain: BTreeSet<Value> =
            [Value::String("AD".into()), Value::String("CU".into())]
                .into_iter()
                .collect();
        let cm = ColorMap::new("grp", &domain);
        assert_eq!(cm.legend_entries().len(), 2);
        assert_ne!(
            cm.color_for(&Value::String("AD".into())),
            cm.color_for(&Value::String("CU".into()))
        );
        assert_eq!(cm.color_for(&Value::String("??".into())), Color32::GRAY);
    }

    #[test]
    fn diverging_endpoints() {
        assert_eq!(diverging(0.0), Color32::from_rgb(255, 255, 255));
        let hot = diverging(1.0);
        let cold = diverging(-1.0);
        assert!(hot.r() > hot.b());
        assert!(cold.b() > cold.r());
    }
}
