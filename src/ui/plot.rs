use eframe::egui::{self, Color32, RichText, Stroke, Ui};
use egui_plot::{Legend, Plot, PlotPoint, PlotPoints, Polygon, Text};

use crate::chart::PieChart;
use crate::insight::{self, Insight};
use crate::state::AppState;
use crate::ui::{panels, table};

/// Widest wedge piece handed to egui, which only fills convex polygons.
const MAX_PIECE_DEG: f64 = 90.0;

// ---------------------------------------------------------------------------
// Central panel: chart, insight, matching tracts, assistant
// ---------------------------------------------------------------------------

/// Render the central panel.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("🍎 InsightBridge: Food Desert Analysis");
    ui.separator();

    if let Some(err) = &state.load_error {
        ui.colored_label(Color32::RED, RichText::new(err).strong());
        ui.label("Open a tract dataset to continue  (File → Open…)");
        return;
    }

    let (Some(dataset), Some(selection)) = (state.dataset.clone(), state.selection.clone()) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to analyse tracts  (File → Open…)");
        });
        return;
    };

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.label(RichText::new(insight::heading(&selection)).size(18.0).strong());
            ui.add_space(6.0);

            match (&state.chart, &state.insight) {
                (Some(chart), Insight::Sentence(sentence)) => {
                    pie_chart(ui, chart);

                    ui.add_space(8.0);
                    ui.label(RichText::new("🧠 Insight").size(16.0).strong());
                    egui::Frame::group(ui.style())
                        .fill(Color32::from_rgb(223, 240, 216))
                        .show(ui, |ui: &mut Ui| {
                            ui.label(RichText::new(sentence).color(Color32::from_rgb(40, 90, 40)));
                        });

                    ui.add_space(8.0);
                    egui::CollapsingHeader::new(format!(
                        "Matching tracts ({})",
                        state.result.matching().len()
                    ))
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        table::tract_table(ui, &dataset, state.result.matching());
                    });
                }
                _ => {
                    egui::Frame::group(ui.style())
                        .fill(Color32::from_rgb(252, 248, 227))
                        .show(ui, |ui: &mut Ui| {
                            ui.label(
                                RichText::new(state.insight.text())
                                    .color(Color32::from_rgb(138, 109, 59)),
                            );
                        });
                }
            }

            ui.add_space(12.0);
            ui.separator();
            panels::assistant_panel(ui, state);
        });
}

// ---------------------------------------------------------------------------
// Pie chart
// ---------------------------------------------------------------------------

/// Draw the pie with a legend and percentage labels on each wedge.
pub fn pie_chart(ui: &mut Ui, chart: &PieChart) {
    Plot::new("food_desert_pie")
        .legend(Legend::default())
        .data_aspect(1.0)
        .view_aspect(1.0)
        .height(320.0)
        .show_axes(false)
        .show_grid(false)
        .show_x(false)
        .show_y(false)
        .allow_boxed_zoom(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .include_x(-1.4)
        .include_x(1.4)
        .include_y(-1.4)
        .include_y(1.4)
        .show(ui, |plot_ui| {
            for slice in &chart.slices {
                // Pieces share the slice name, so the legend lists it once.
                for piece in slice.split(MAX_PIECE_DEG) {
                    let points: PlotPoints = piece.outline([0.0, 0.0], 1.0).into();
                    plot_ui.polygon(
                        Polygon::new(points)
                            .name(&slice.label)
                            .fill_color(slice.color)
                            .stroke(Stroke::new(1.0, Color32::WHITE)),
                    );
                }

                let [dx, dy] = slice.mid_direction();
                plot_ui.text(
                    Text::new(
                        PlotPoint::new(dx * 0.6, dy * 0.6),
                        RichText::new(slice.percent_text()).strong(),
                    )
                    .color(Color32::WHITE),
                );
                plot_ui.text(Text::new(
                    PlotPoint::new(dx * 1.2, dy * 1.2),
                    RichText::new(&slice.label),
                ));
            }
        });

    if !chart.unmatched_labels.is_empty() {
        ui.colored_label(
            Color32::from_rgb(200, 120, 0),
            format!(
                "Label without a wedge: {}",
                chart.unmatched_labels.join(", ")
            ),
        );
    }
}
