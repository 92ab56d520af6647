use std::sync::Arc;
use std::time::Duration;

use eframe::egui;

use crate::assistant::openai::OpenAiChat;
use crate::assistant::AssistantError;
use crate::config::Args;
use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct InsightBridgeApp {
    pub state: AppState,
}

impl InsightBridgeApp {
    /// Build the app and load the dataset named on the command line.
    /// A dataset that fails to load leaves the app running with a notice.
    pub fn new(args: &Args) -> Result<Self, AssistantError> {
        let backend = OpenAiChat::new(&args.assistant())?;
        let mut state = AppState::new(Arc::new(backend), args.label_policy());
        state.open_dataset(&args.data);
        Ok(Self { state })
    }
}

impl eframe::App for InsightBridgeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.state.poll_assistant() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: chart, insight, assistant ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::central_panel(ui, &mut self.state);
        });
    }
}
