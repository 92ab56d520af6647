//! Pie chart of food-desert prevalence: label resolution, wedge geometry
//! and PNG rasterization. The on-screen drawing lives in `ui::plot`.

use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::Color32;
use image::{ImageFormat, Rgba, RgbaImage};

use crate::color::CategoryColors;
use crate::data::filter::CategoryCounts;
use crate::data::model::Category;

/// Wedges start at 12 o'clock and run counter-clockwise.
pub const START_ANGLE_DEG: f64 = 90.0;

// ---------------------------------------------------------------------------
// Label resolution
// ---------------------------------------------------------------------------

/// How wedge labels are derived from the category counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelPolicy {
    /// Two labels whenever non-food-desert tracts are present, one label
    /// ("Food Desert") otherwise. A subset with no food deserts therefore
    /// gets a surplus "Food Desert" label.
    #[default]
    Compatible,
    /// One label per category actually present.
    Corrected,
}

/// Labels to pair with the wedges, in wedge order.
pub fn resolve_labels(counts: &CategoryCounts, policy: LabelPolicy) -> Vec<&'static str> {
    match policy {
        LabelPolicy::Compatible => {
            if counts.contains(Category::NotFoodDesert) {
                vec![Category::NotFoodDesert.label(), Category::FoodDesert.label()]
            } else if counts.contains(Category::FoodDesert) {
                vec![Category::FoodDesert.label()]
            } else {
                Vec::new()
            }
        }
        LabelPolicy::Corrected => counts.iter().map(|(c, _)| c.label()).collect(),
    }
}

// ---------------------------------------------------------------------------
// Wedges
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub category: Category,
    pub label: String,
    pub count: usize,
    pub fraction: f64,
    /// Degrees, counter-clockwise from the positive x axis.
    pub start_deg: f64,
    pub sweep_deg: f64,
    pub color: Color32,
}

impl PieSlice {
    /// Percentage text drawn on the wedge, e.g. `"50.0%"`.
    pub fn percent_text(&self) -> String {
        format!("{:.1}%", self.fraction * 100.0)
    }

    /// Unit-circle direction of the wedge's bisector.
    pub fn mid_direction(&self) -> [f64; 2] {
        let mid = (self.start_deg + self.sweep_deg / 2.0).to_radians();
        [mid.cos(), mid.sin()]
    }

    /// Outline of the wedge as a closed fan: centre, then arc points.
    pub fn outline(&self, center: [f64; 2], radius: f64) -> Vec<[f64; 2]> {
        let steps = ((self.sweep_deg / 2.0).ceil() as usize).max(2);
        let mut points = Vec::with_capacity(steps + 2);
        points.push(center);
        for i in 0..=steps {
            let deg = self.start_deg + self.sweep_deg * i as f64 / steps as f64;
            let rad = deg.to_radians();
            points.push([center[0] + radius * rad.cos(), center[1] + radius * rad.sin()]);
        }
        points
    }

    /// Split into equal pieces of at most `max_sweep_deg` each, so every
    /// piece is convex when `max_sweep_deg <= 180`.
    pub fn split(&self, max_sweep_deg: f64) -> Vec<PieSlice> {
        let n = ((self.sweep_deg / max_sweep_deg).ceil() as usize).max(1);
        let sweep = self.sweep_deg / n as f64;
        (0..n)
            .map(|k| PieSlice {
                start_deg: self.start_deg + sweep * k as f64,
                sweep_deg: sweep,
                ..self.clone()
            })
            .collect()
    }

    fn covers(&self, deg: f64) -> bool {
        let rel = (deg - self.start_deg).rem_euclid(360.0);
        rel < self.sweep_deg || self.sweep_deg >= 360.0
    }
}

/// Wedges plus any labels left over after positional pairing.
#[derive(Debug, Clone, PartialEq)]
pub struct PieChart {
    pub slices: Vec<PieSlice>,
    pub unmatched_labels: Vec<String>,
}

impl PieChart {
    /// Pair category counts with `labels` positionally, as a pie plot does.
    pub fn build(counts: &CategoryCounts, labels: &[&str], colors: &CategoryColors) -> Self {
        let total = counts.total() as f64;
        let mut slices = Vec::with_capacity(counts.len());
        let mut cursor = START_ANGLE_DEG;

        for (i, (category, count)) in counts.iter().enumerate() {
            let fraction = if total > 0.0 { count as f64 / total } else { 0.0 };
            let sweep_deg = fraction * 360.0;
            slices.push(PieSlice {
                category,
                label: labels
                    .get(i)
                    .map_or_else(|| category.label().to_string(), |l| (*l).to_string()),
                count,
                fraction,
                start_deg: cursor,
                sweep_deg,
                color: colors.color_for(category),
            });
            cursor += sweep_deg;
        }

        let unmatched_labels: Vec<String> = labels
            .iter()
            .skip(slices.len())
            .map(|l| (*l).to_string())
            .collect();
        if !unmatched_labels.is_empty() {
            log::warn!(
                "{} wedge(s) but {} label(s); no wedge for {:?}",
                slices.len(),
                labels.len(),
                unmatched_labels
            );
        }

        PieChart {
            slices,
            unmatched_labels,
        }
    }

    /// Slice containing the direction `deg` (counter-clockwise from +x).
    pub fn slice_at(&self, deg: f64) -> Option<&PieSlice> {
        self.slices.iter().find(|s| s.covers(deg))
    }

    // -----------------------------------------------------------------------
    // Raster export
    // -----------------------------------------------------------------------

    /// Rasterize the pie onto a white `size`×`size` canvas.
    pub fn render_png(&self, size: u32) -> RgbaImage {
        let mut img = RgbaImage::from_pixel(size, size, Rgba([255, 255, 255, 255]));
        let c = f64::from(size) / 2.0;
        let radius = c * 0.9;

        for (x, y, px) in img.enumerate_pixels_mut() {
            let dx = f64::from(x) + 0.5 - c;
            // Image rows grow downwards.
            let dy = c - (f64::from(y) + 0.5);
            if dx.hypot(dy) > radius {
                continue;
            }
            let deg = dy.atan2(dx).to_degrees();
            if let Some(slice) = self.slice_at(deg) {
                let col = slice.color;
                *px = Rgba([col.r(), col.g(), col.b(), 255]);
            }
        }
        img
    }

    pub fn export_png(&self, path: &Path, size: u32) -> Result<()> {
        self.render_png(size)
            .save_with_format(path, ImageFormat::Png)
            .with_context(|| format!("writing chart to {}", path.display()))?;
        log::info!("Exported chart to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn counts(pairs: &[(Category, usize)]) -> CategoryCounts {
        pairs.iter().copied().collect()
    }

    #[test]
    fn both_categories_get_two_labels_under_either_policy() {
        let c = counts(&[(Category::NotFoodDesert, 1), (Category::FoodDesert, 1)]);
        let expected = vec!["Not Food Desert", "Food Desert"];
        assert_eq!(resolve_labels(&c, LabelPolicy::Compatible), expected);
        assert_eq!(resolve_labels(&c, LabelPolicy::Corrected), expected);
    }

    #[test]
    fn only_food_deserts_gets_single_label() {
        let c = counts(&[(Category::FoodDesert, 3)]);
        assert_eq!(resolve_labels(&c, LabelPolicy::Compatible), vec!["Food Desert"]);
        assert_eq!(resolve_labels(&c, LabelPolicy::Corrected), vec!["Food Desert"]);
    }

    #[test]
    fn no_food_deserts_compatible_keeps_surplus_label() {
        let c = counts(&[(Category::NotFoodDesert, 1)]);
        let labels = resolve_labels(&c, LabelPolicy::Compatible);
        assert_eq!(labels, vec!["Not Food Desert", "Food Desert"]);

        let chart = PieChart::build(&c, &labels, &CategoryColors::default());
        assert_eq!(chart.slices.len(), 1);
        assert_eq!(chart.slices[0].label, "Not Food Desert");
        assert_eq!(chart.slices[0].percent_text(), "100.0%");
        assert_eq!(chart.unmatched_labels, vec!["Food Desert".to_string()]);
    }

    #[test]
    fn no_food_deserts_corrected_has_one_wedge_one_label() {
        let c = counts(&[(Category::NotFoodDesert, 1)]);
        let labels = resolve_labels(&c, LabelPolicy::Corrected);
        assert_eq!(labels, vec!["Not Food Desert"]);

        let chart = PieChart::build(&c, &labels, &CategoryColors::default());
        assert_eq!(chart.slices[0].label, "Not Food Desert");
        assert!(chart.unmatched_labels.is_empty());
    }

    #[test]
    fn wedges_start_at_top_and_run_counter_clockwise() {
        let c = counts(&[(Category::NotFoodDesert, 1), (Category::FoodDesert, 3)]);
        let labels = resolve_labels(&c, LabelPolicy::Compatible);
        let chart = PieChart::build(&c, &labels, &CategoryColors::default());

        assert_eq!(chart.slices[0].start_deg, 90.0);
        assert_eq!(chart.slices[0].sweep_deg, 90.0);
        assert_eq!(chart.slices[1].start_deg, 180.0);
        assert_eq!(chart.slices[1].percent_text(), "75.0%");

        // Upper-left quadrant is the first wedge, everything else the second.
        assert_eq!(chart.slice_at(135.0).unwrap().category, Category::NotFoodDesert);
        assert_eq!(chart.slice_at(45.0).unwrap().category, Category::FoodDesert);
        assert_eq!(chart.slice_at(-90.0).unwrap().category, Category::FoodDesert);
    }

    #[test]
    fn raster_matches_wedge_geometry() {
        let c = counts(&[(Category::NotFoodDesert, 1), (Category::FoodDesert, 1)]);
        let colors = CategoryColors::default();
        let chart = PieChart::build(&c, &resolve_labels(&c, LabelPolicy::Compatible), &colors);
        let img = chart.render_png(100);

        let rgba = |cat| {
            let col = colors.color_for(cat);
            Rgba([col.r(), col.g(), col.b(), 255])
        };
        // First half sweeps from the top through the left side.
        assert_eq!(*img.get_pixel(20, 50), rgba(Category::NotFoodDesert));
        assert_eq!(*img.get_pixel(80, 50), rgba(Category::FoodDesert));
        assert_eq!(*img.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn single_wedge_fills_the_disc() {
        let c = counts(&[(Category::FoodDesert, 2)]);
        let chart = PieChart::build(&c, &["Food Desert"], &CategoryColors::default());
        assert!(chart.slice_at(-179.0).is_some());
        assert!(chart.slice_at(89.9).is_some());

        let outline = chart.slices[0].outline([0.0, 0.0], 1.0);
        assert_eq!(outline[0], [0.0, 0.0]);
        assert!(outline.len() > 100);
    }

    #[test]
    fn split_keeps_pieces_convex() {
        let c = counts(&[(Category::NotFoodDesert, 1), (Category::FoodDesert, 3)]);
        let chart = PieChart::build(&c, &["a", "b"], &CategoryColors::default());

        let pieces = chart.slices[1].split(90.0);
        assert_eq!(pieces.len(), 3);
        assert!(pieces.iter().all(|p| p.sweep_deg <= 90.0 && p.label == "b"));
        assert_eq!(pieces[0].start_deg, 180.0);
        assert_eq!(pieces[2].start_deg + pieces[2].sweep_deg, 450.0);
        assert_eq!(chart.slices[0].split(90.0).len(), 1);
    }

    #[test]
    fn export_writes_a_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        let c = counts(&[(Category::FoodDesert, 2)]);
        let chart = PieChart::build(&c, &["Food Desert"], &CategoryColors::default());

        chart.export_png(&path, 64).unwrap();
        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (64, 64));
    }

    #[test]
    fn export_without_extension_is_still_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("food_deserts");
        let c = counts(&[(Category::NotFoodDesert, 1), (Category::FoodDesert, 1)]);
        let chart = PieChart::build(&c, &["Not Food Desert", "Food Desert"], &CategoryColors::default());

        chart.export_png(&path, 32).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
    }
}
