use eframe::egui::{self, Color32, RichText, Ui};

use crate::chart::LabelPolicy;
use crate::state::{AppState, INCOME_STEP};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel: state, county and income range.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Options");
    ui.separator();

    let (Some(dataset), Some(selection)) = (state.dataset.clone(), state.selection.clone()) else {
        ui.label("No dataset loaded.");
        return;
    };

    // ---- State ----
    ui.strong("Select State");
    egui::ComboBox::from_id_salt("state")
        .selected_text(&selection.state)
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            for s in dataset.states() {
                if ui.selectable_label(selection.state == s, s).clicked() {
                    state.select_state(s);
                }
            }
        });
    ui.add_space(6.0);

    // ---- County (only the selected state's) ----
    ui.strong("Select County");
    egui::ComboBox::from_id_salt("county")
        .selected_text(&selection.county)
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            for c in dataset.counties(&selection.state) {
                if ui.selectable_label(selection.county == c, c).clicked() {
                    state.select_county(c);
                }
            }
        });
    ui.add_space(6.0);

    // ---- Income range ----
    let Some((lo, hi)) = dataset.income_bounds else {
        return;
    };
    ui.strong("Select Income Range");
    let mut min = selection.income.min;
    let mut max = selection.income.max;
    let min_changed = ui
        .add(egui::Slider::new(&mut min, lo..=hi).text("min").step_by(INCOME_STEP as f64))
        .changed();
    let max_changed = ui
        .add(egui::Slider::new(&mut max, lo..=hi).text("max").step_by(INCOME_STEP as f64))
        .changed();
    if min_changed || max_changed {
        // Keep the pair ordered, moving the bound that was not dragged.
        if min > max {
            if min_changed {
                max = min;
            } else {
                min = max;
            }
        }
        state.set_income_range(min, max);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.chart.is_some(), egui::Button::new("Export chart…"))
                .clicked()
            {
                export_chart_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(name) = state.dataset_path.as_ref().and_then(|p| p.file_name()) {
            ui.label(RichText::new(name.to_string_lossy()).monospace());
        }
        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} tracts loaded, {} matching",
                ds.len(),
                state.result.matching().len()
            ));
        }

        ui.separator();

        let corrected = state.label_policy == LabelPolicy::Corrected;
        if ui
            .selectable_label(corrected, "Labels: present categories only")
            .clicked()
        {
            state.set_label_policy(if corrected {
                LabelPolicy::Compatible
            } else {
                LabelPolicy::Corrected
            });
        }

        if let Some(msg) = &state.status_message {
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                ui.visuals().text_color()
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// Assistant
// ---------------------------------------------------------------------------

/// API key, question box and the assistant's answer or error.
pub fn assistant_panel(ui: &mut Ui, state: &mut AppState) {
    ui.label(RichText::new("💬 Ask the assistant").size(16.0).strong());

    ui.horizontal(|ui: &mut Ui| {
        ui.label("API key");
        ui.add(
            egui::TextEdit::singleline(&mut state.api_key_input)
                .password(true)
                .hint_text("entered per session, never saved"),
        );
    });

    ui.add(
        egui::TextEdit::multiline(&mut state.question)
            .hint_text("Ask a question about the filtered tracts")
            .desired_rows(3)
            .desired_width(f32::INFINITY),
    );

    let pending = state.assistant_pending();
    ui.horizontal(|ui: &mut Ui| {
        let can_ask = !pending && !state.result.is_empty();
        if ui.add_enabled(can_ask, egui::Button::new("Ask")).clicked() {
            state.ask_assistant();
        }
        if pending {
            ui.spinner();
            ui.label("Waiting for an answer…");
        }
    });

    if let Some(err) = &state.assistant_error {
        ui.colored_label(Color32::RED, err);
    }
    if let Some(answer) = &state.answer {
        egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
            ui.label(answer);
        });
    }
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open tract data")
        .add_filter("Supported files", &["csv", "tsv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv", "tsv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open_dataset(&path);
        state.status_message = state.load_error.as_ref().map(|e| format!("Error: {e}"));
    }
}

pub fn export_chart_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export chart")
        .add_filter("PNG", &["png"])
        .set_file_name("food_deserts.png")
        .save_file();

    if let Some(path) = file {
        state.export_chart(&path);
    }
}
