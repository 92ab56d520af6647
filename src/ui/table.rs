use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use crate::data::model::{
    COL_COUNTY, COL_HUNV, COL_INCOME, COL_LILA, COL_SNAP, COL_STATE, Dataset,
};

const HEADERS: [&str; 6] = [COL_STATE, COL_COUNTY, COL_INCOME, COL_LILA, COL_SNAP, COL_HUNV];

/// Table of the tracts at `indices`, in load order.
pub fn tract_table(ui: &mut Ui, dataset: &Dataset, indices: &[usize]) {
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(240.0)
        .columns(Column::auto().at_least(60.0), HEADERS.len())
        .header(20.0, |mut header| {
            for name in HEADERS {
                header.col(|ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, indices.len(), |mut row| {
                let t = &dataset.tracts[indices[row.index()]];
                row.col(|ui| {
                    ui.label(&t.state);
                });
                row.col(|ui| {
                    ui.label(&t.county);
                });
                row.col(|ui| {
                    ui.label(t.median_family_income.to_string());
                });
                row.col(|ui| {
                    ui.label(t.lila_tracts_1_and_10.to_string());
                });
                row.col(|ui| {
                    ui.label(format!("{:.3}", t.tract_snap));
                });
                row.col(|ui| {
                    ui.label(t.tract_hunv_flag.to_string());
                });
            });
        });
}
