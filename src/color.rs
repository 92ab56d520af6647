use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::Category;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues,
/// starting at `hue_offset` degrees.
pub fn generate_palette(n: usize, hue_offset: f32) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (hue_offset + (i as f32 / n as f32) * 360.0) % 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.5);
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
// Category → Color32
// ---------------------------------------------------------------------------

/// Blue-ish for non-food-desert tracts, orange for food deserts.
const FIRST_HUE: f32 = 210.0;

/// Fixed colour per food-desert category, so a wedge keeps its colour
/// whether or not the other category is present.
#[derive(Debug, Clone)]
pub struct CategoryColors {
    mapping: BTreeMap<Category, Color32>,
}

impl Default for CategoryColors {
    fn default() -> Self {
        let palette = generate_palette(Category::ALL.len(), FIRST_HUE);
        CategoryColors {
            mapping: Category::ALL.into_iter().zip(palette).collect(),
        }
    }
}

impl CategoryColors {
    pub fn color_for(&self, category: Category) -> Color32 {
        self.mapping
            .get(&category)
            .copied()
            .unwrap_or(Color32::GRAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0, 0.0).is_empty());
        assert_eq!(generate_palette(5, 0.0).len(), 5);
    }

    #[test]
    fn categories_get_distinct_colours() {
        let colors = CategoryColors::default();
        assert_ne!(
            colors.color_for(Category::NotFoodDesert),
            colors.color_for(Category::FoodDesert)
        );
    }
}
