use std::fmt;

use crate::data::filter::{FilteredResult, Selection};

pub const EMPTY_NOTICE: &str = "No data available for selected filters.";

/// What the insight box shows for the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insight {
    /// Nothing matched; there are no statistics to report.
    EmptyNotice,
    Sentence(String),
}

impl Insight {
    pub fn text(&self) -> &str {
        match self {
            Insight::EmptyNotice => EMPTY_NOTICE,
            Insight::Sentence(s) => s,
        }
    }
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Heading shown above the chart.
pub fn heading(selection: &Selection) -> String {
    format!("{} County, {}", selection.county, selection.state)
}

/// Turn the filter result into a narrative sentence. The SNAP percentage is
/// rounded to one decimal; counts are reported as is.
pub fn summarize(selection: &Selection, result: &FilteredResult) -> Insight {
    let FilteredResult::Matches(agg) = result else {
        return Insight::EmptyNotice;
    };

    Insight::Sentence(format!(
        "In {county} County, {state}, {deserts} out of {total} census tracts are identified \
         as food deserts (low-income and low-access). The average SNAP participation rate is \
         {snap:.1}%, and {vehicle} tracts have limited vehicle access, indicating potential \
         mobility challenges for food-insecure populations.",
        county = selection.county,
        state = selection.state,
        deserts = agg.food_desert_count,
        total = agg.total_tracts,
        snap = agg.avg_snap_pct,
        vehicle = agg.low_vehicle_access_count,
    ))
}
