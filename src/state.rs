use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assistant::{ApiKey, AssistantError, AssistantRequest, AssistantWorker, ChatBackend};
use crate::chart::{LabelPolicy, PieChart, resolve_labels};
use crate::color::CategoryColors;
use crate::data::filter::{FilteredResult, IncomeRange, Selection, filter};
use crate::data::loader::DatasetCache;
use crate::data::model::Dataset;
use crate::data::stats::describe;
use crate::insight::{Insight, summarize};

/// Edge length of exported chart images, in pixels.
pub const EXPORT_SIZE: u32 = 640;

/// Step of the income sliders.
pub const INCOME_STEP: i64 = 100;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
///
/// Every change to the selection goes through [`AppState::recompute`]:
/// filter → summarize → chart. Nothing else derives these fields.
pub struct AppState {
    /// Datasets loaded so far, by path.
    pub cache: DatasetCache,

    /// Path of the active dataset (or of the failed attempt).
    pub dataset_path: Option<PathBuf>,

    /// Active dataset (None until a file loads successfully).
    pub dataset: Option<Arc<Dataset>>,

    /// Why the last dataset could not be loaded. Blocks all rendering.
    pub load_error: Option<String>,

    /// Current filters; None while no dataset is active.
    pub selection: Option<Selection>,

    pub result: FilteredResult,
    pub insight: Insight,
    /// None when the result is empty.
    pub chart: Option<PieChart>,

    pub label_policy: LabelPolicy,
    pub colors: CategoryColors,

    /// API key as typed; only ever turned into an [`ApiKey`] on submit.
    pub api_key_input: String,
    pub question: String,
    pub answer: Option<String>,
    pub assistant_error: Option<String>,
    assistant: AssistantWorker,

    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(backend: Arc<dyn ChatBackend>, label_policy: LabelPolicy) -> Self {
        Self {
            cache: DatasetCache::new(),
            dataset_path: None,
            dataset: None,
            load_error: None,
            selection: None,
            result: FilteredResult::Empty,
            insight: Insight::EmptyNotice,
            chart: None,
            label_policy,
            colors: CategoryColors::default(),
            api_key_input: String::new(),
            question: String::new(),
            answer: None,
            assistant_error: None,
            assistant: AssistantWorker::new(backend),
            status_message: None,
        }
    }

    // -----------------------------------------------------------------------
    // Dataset
    // -----------------------------------------------------------------------

    /// Load (or fetch from the cache) the dataset at `path` and make it active.
    /// On failure the dataset is treated as absent.
    pub fn open_dataset(&mut self, path: &Path) {
        self.dataset_path = Some(path.to_path_buf());
        match self.cache.load(path) {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => {
                self.dataset = None;
                self.selection = None;
                self.load_error = Some(e.to_string());
                self.recompute();
            }
        }
    }

    /// Ingest a loaded dataset and reset the filters to their defaults.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        self.selection = Selection::initial(&dataset);
        self.load_error = if dataset.is_empty() {
            Some("The dataset contains no tracts.".to_string())
        } else {
            None
        };
        self.dataset = Some(dataset);
        self.answer = None;
        self.assistant_error = None;
        self.recompute();
    }

    // -----------------------------------------------------------------------
    // Selection changes
    // -----------------------------------------------------------------------

    /// Switch state; the county resets to the state's first county.
    pub fn select_state(&mut self, state: &str) {
        let (Some(ds), Some(sel)) = (&self.dataset, &self.selection) else {
            return;
        };
        self.selection = Some(sel.with_state(ds, state));
        self.recompute();
    }

    pub fn select_county(&mut self, county: &str) {
        if let Some(sel) = &mut self.selection {
            sel.county = county.to_string();
        }
        self.recompute();
    }

    pub fn set_income_range(&mut self, min: i64, max: i64) {
        let bounds = self.dataset.as_ref().and_then(|ds| ds.income_bounds);
        if let Some(sel) = &mut self.selection {
            let range = IncomeRange::new(min, max);
            sel.income = match bounds {
                Some(b) => range.snapped_to(b, INCOME_STEP),
                None => range,
            };
        }
        self.recompute();
    }

    pub fn set_label_policy(&mut self, policy: LabelPolicy) {
        self.label_policy = policy;
        self.recompute();
    }

    /// Derive result, insight and chart from the dataset and selection.
    pub fn recompute(&mut self) {
        let (Some(ds), Some(sel)) = (&self.dataset, &self.selection) else {
            self.result = FilteredResult::Empty;
            self.insight = Insight::EmptyNotice;
            self.chart = None;
            return;
        };

        self.result = filter(ds, sel);
        self.insight = summarize(sel, &self.result);
        self.chart = match &self.result {
            FilteredResult::Empty => {
                log::warn!(
                    "No tracts for {} / {} with income {}..={}",
                    sel.state,
                    sel.county,
                    sel.income.min,
                    sel.income.max
                );
                None
            }
            FilteredResult::Matches(agg) => {
                let labels = resolve_labels(&agg.category_counts, self.label_policy);
                Some(PieChart::build(&agg.category_counts, &labels, &self.colors))
            }
        };
    }

    // -----------------------------------------------------------------------
    // Chart export
    // -----------------------------------------------------------------------

    pub fn export_chart(&mut self, path: &Path) {
        let Some(chart) = &self.chart else {
            self.status_message = Some("Nothing to export for the current filters.".to_string());
            return;
        };
        self.status_message = Some(match chart.export_png(path, EXPORT_SIZE) {
            Ok(()) => format!("Chart saved to {}", path.display()),
            Err(e) => {
                log::error!("Chart export failed: {e:#}");
                format!("Error: {e:#}")
            }
        });
    }

    // -----------------------------------------------------------------------
    // Assistant
    // -----------------------------------------------------------------------

    pub fn assistant_pending(&self) -> bool {
        self.assistant.is_pending()
    }

    /// Send the current question with a description of the filtered tracts.
    /// Failures end up in `assistant_error`; nothing else changes.
    pub fn ask_assistant(&mut self) {
        self.assistant_error = None;
        if let Err(e) = self.try_ask() {
            self.assistant_error = Some(e.to_string());
        }
    }

    fn try_ask(&mut self) -> Result<(), AssistantError> {
        let key = ApiKey::new(&self.api_key_input).ok_or(AssistantError::MissingCredential)?;
        let (Some(ds), Some(agg)) = (&self.dataset, self.result.aggregates()) else {
            return Err(AssistantError::NoData);
        };
        let description = describe(ds, &agg.matching).to_string();
        let request = AssistantRequest::new(description, &self.question)?;
        self.assistant.submit(key, request)
    }

    /// Collect a finished answer, if any. Returns whether a request is
    /// still outstanding.
    pub fn poll_assistant(&mut self) -> bool {
        if let Some(result) = self.assistant.poll() {
            match result {
                Ok(answer) => {
                    self.answer = Some(answer);
                    self.assistant_error = None;
                }
                Err(e) => self.assistant_error = Some(e.to_string()),
            }
        }
        self.assistant.is_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::tests::StubBackend;
    use crate::data::filter::scenario_dataset;
    use crate::data::model::tract;
    use pretty_assertions::assert_eq;
    use std::time::{Duration, Instant};

    fn state_with(backend: Arc<dyn ChatBackend>) -> AppState {
        let mut state = AppState::new(backend, LabelPolicy::Compatible);
        state.set_dataset(Arc::new(scenario_dataset()));
        state
    }

    fn settle(state: &mut AppState) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while state.poll_assistant() {
            assert!(Instant::now() < deadline, "assistant did not answer");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn dataset_sets_default_selection_and_result() {
        let state = state_with(StubBackend::answering("ok"));
        let sel = state.selection.clone().unwrap();
        assert_eq!(sel.income, IncomeRange::new(40_000, 45_000));

        let agg = state.result.aggregates().unwrap();
        assert_eq!(agg.total_tracts, 2);
        assert!(state.insight.text().contains("1 out of 2"));
        let labels: Vec<&str> = state
            .chart
            .as_ref()
            .unwrap()
            .slices
            .iter()
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Not Food Desert", "Food Desert"]);
    }

    #[test]
    fn income_change_recomputes_everything() {
        let mut state = state_with(StubBackend::answering("ok"));
        state.set_income_range(41_000, 100_000);
        assert_eq!(state.result.matching(), &[1]);
        assert!(state.insight.text().contains("10.0%"));

        let chart = state.chart.clone().unwrap();
        assert_eq!(chart.slices.len(), 1);
        assert_eq!(chart.unmatched_labels, vec!["Food Desert".to_string()]);

        state.set_label_policy(LabelPolicy::Corrected);
        assert!(state.chart.as_ref().unwrap().unmatched_labels.is_empty());
    }

    #[test]
    fn top_income_tract_stays_reachable_after_slider_edit() {
        let mut state = AppState::new(StubBackend::answering("ok"), LabelPolicy::Compatible);
        state.set_dataset(Arc::new(Dataset::from_tracts(vec![
            tract("AL", "Autauga", 40_000, 0, 0.1, 0),
            tract("AL", "Autauga", 61_838, 1, 0.3, 1),
        ])));

        // A 100-step slider dragged fully right reports 61 800.
        state.set_income_range(40_000, 61_800);
        let sel = state.selection.clone().unwrap();
        assert_eq!(sel.income, IncomeRange::new(40_000, 61_838));
        assert_eq!(state.result.matching(), &[0, 1]);
    }

    #[test]
    fn empty_selection_has_notice_and_no_chart() {
        let mut state = state_with(StubBackend::answering("ok"));
        state.set_income_range(90_000, 100_000);
        assert!(state.result.is_empty());
        assert_eq!(state.insight, Insight::EmptyNotice);
        assert!(state.chart.is_none());
    }

    #[test]
    fn state_switch_resets_county() {
        let mut state = AppState::new(StubBackend::answering("ok"), LabelPolicy::Compatible);
        state.set_dataset(Arc::new(Dataset::from_tracts(vec![
            tract("AL", "Autauga", 50_000, 0, 0.1, 0),
            tract("OH", "Franklin", 40_000, 1, 0.2, 1),
        ])));
        assert_eq!(state.selection.as_ref().unwrap().county, "Autauga");

        state.select_state("OH");
        assert_eq!(state.selection.as_ref().unwrap().county, "Franklin");
        assert_eq!(state.result.matching(), &[1]);

        // A county from another state matches nothing.
        state.select_county("Autauga");
        assert!(state.result.is_empty());
    }

    #[test]
    fn unavailable_dataset_blocks_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_with(StubBackend::answering("ok"));
        state.open_dataset(&dir.path().join("missing.csv"));

        assert!(state.load_error.as_deref().unwrap().starts_with("dataset unavailable"));
        assert!(state.dataset.is_none());
        assert!(state.result.is_empty());
        assert!(state.chart.is_none());
    }

    #[test]
    fn answer_is_displayed() {
        let backend = StubBackend::answering("Franklin has one food desert.");
        let mut state = state_with(backend.clone());
        state.api_key_input = "sk-test".to_string();
        state.question = "How many food deserts?".to_string();

        state.ask_assistant();
        settle(&mut state);

        assert_eq!(state.answer.as_deref(), Some("Franklin has one food desert."));
        assert_eq!(state.assistant_error, None);
        let seen = backend.seen.lock().unwrap();
        assert!(seen[0].data_description.contains("MedianFamilyIncome"));
        assert_eq!(seen[0].question, "How many food deserts?");
    }

    #[test]
    fn network_failure_leaves_results_untouched() {
        let mut state = state_with(StubBackend::failing());
        let result_before = state.result.clone();
        let insight_before = state.insight.clone();
        let chart_before = state.chart.clone();

        state.api_key_input = "sk-test".to_string();
        state.question = "Why?".to_string();
        state.ask_assistant();
        settle(&mut state);

        assert_eq!(
            state.assistant_error.as_deref(),
            Some("Provider error: network unreachable")
        );
        assert_eq!(state.answer, None);
        assert_eq!(state.result, result_before);
        assert_eq!(state.insight, insight_before);
        assert_eq!(state.chart, chart_before);
    }

    #[test]
    fn missing_key_and_empty_result_are_reported() {
        let mut state = state_with(StubBackend::answering("ok"));
        state.question = "Why?".to_string();
        state.ask_assistant();
        assert_eq!(
            state.assistant_error.as_deref(),
            Some("Enter an API key to ask the assistant.")
        );

        state.api_key_input = "sk-test".to_string();
        state.set_income_range(90_000, 100_000);
        state.ask_assistant();
        assert_eq!(
            state.assistant_error.as_deref(),
            Some("No data available for selected filters.")
        );
        assert!(!state.assistant_pending());
    }

    #[test]
    fn export_without_chart_sets_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_with(StubBackend::answering("ok"));
        state.set_income_range(90_000, 100_000);
        state.export_chart(&dir.path().join("chart.png"));
        assert!(state.status_message.as_deref().unwrap().starts_with("Nothing to export"));

        state.set_income_range(0, 100_000);
        let path = dir.path().join("chart.png");
        state.export_chart(&path);
        assert!(path.exists());
    }
}
