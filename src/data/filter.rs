use std::collections::BTreeMap;

use super::model::{Category, Dataset, TractRecord};

// ---------------------------------------------------------------------------
// Selection: state, county and inclusive income range
// ---------------------------------------------------------------------------

/// Inclusive `[min, max]` bounds on `MedianFamilyIncome`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncomeRange {
    pub min: i64,
    pub max: i64,
}

impl IncomeRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, income: i64) -> bool {
        self.min <= income && income <= self.max
    }

    /// Move values that sit within `step` of a dataset bound onto that bound.
    /// A stepped slider anchored at `lo` cannot otherwise land on a `hi` that
    /// is not a whole number of steps away. Values outside `[lo, hi]` are kept.
    pub fn snapped_to(self, (lo, hi): (i64, i64), step: i64) -> Self {
        let snap = |v: i64| {
            if (lo..=hi).contains(&v) && hi - v < step {
                hi
            } else if (lo..=hi).contains(&v) && v - lo < step {
                lo
            } else {
                v
            }
        };
        IncomeRange::new(snap(self.min), snap(self.max))
    }
}

/// The user's current filter choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub state: String,
    pub county: String,
    pub income: IncomeRange,
}

impl Selection {
    /// First state, its first county, and the full income range.
    /// `None` for an empty dataset.
    pub fn initial(dataset: &Dataset) -> Option<Self> {
        let state = dataset.states().next()?.to_string();
        let county = dataset.counties(&state).next()?.to_string();
        let (min, max) = dataset.income_bounds?;
        Some(Selection {
            state,
            county,
            income: IncomeRange::new(min, max),
        })
    }

    /// Switch to `state`, resetting the county to the state's first county.
    pub fn with_state(&self, dataset: &Dataset, state: &str) -> Self {
        let county = dataset.counties(state).next().unwrap_or_default().to_string();
        Selection {
            state: state.to_string(),
            county,
            income: self.income,
        }
    }

    fn matches(&self, tract: &TractRecord) -> bool {
        tract.state == self.state
            && tract.county == self.county
            && self.income.contains(tract.median_family_income)
    }
}

// ---------------------------------------------------------------------------
// Filter result
// ---------------------------------------------------------------------------

/// Tract counts per food-desert category. Only categories with at least one
/// tract are present; iteration is in ascending key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryCounts(BTreeMap<Category, usize>);

impl CategoryCounts {
    pub fn contains(&self, category: Category) -> bool {
        self.0.contains_key(&category)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, usize)> + '_ {
        self.0.iter().map(|(c, n)| (*c, *n))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }
}

impl FromIterator<(Category, usize)> for CategoryCounts {
    fn from_iter<I: IntoIterator<Item = (Category, usize)>>(iter: I) -> Self {
        CategoryCounts(iter.into_iter().filter(|(_, n)| *n > 0).collect())
    }
}

/// Aggregates over a non-empty set of matching tracts.
#[derive(Debug, Clone, PartialEq)]
pub struct TractAggregates {
    /// Indices into `Dataset::tracts`, in load order.
    pub matching: Vec<usize>,
    pub category_counts: CategoryCounts,
    pub total_tracts: usize,
    pub food_desert_count: usize,
    /// Mean `TractSNAP` × 100.
    pub avg_snap_pct: f64,
    pub low_vehicle_access_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilteredResult {
    /// No tract matches the selection; nothing is computed.
    Empty,
    Matches(TractAggregates),
}

impl FilteredResult {
    pub fn aggregates(&self) -> Option<&TractAggregates> {
        match self {
            FilteredResult::Empty => None,
            FilteredResult::Matches(agg) => Some(agg),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FilteredResult::Empty)
    }

    /// Matching indices; empty for [`FilteredResult::Empty`].
    pub fn matching(&self) -> &[usize] {
        self.aggregates().map_or(&[], |agg| agg.matching.as_slice())
    }
}

// ---------------------------------------------------------------------------
// filter
// ---------------------------------------------------------------------------

/// Select the tracts matching `selection` and aggregate them.
///
/// A county that does not belong to the state, or an inverted income range,
/// simply matches nothing.
pub fn filter(dataset: &Dataset, selection: &Selection) -> FilteredResult {
    let matching: Vec<usize> = dataset
        .tracts
        .iter()
        .enumerate()
        .filter(|(_, t)| selection.matches(t))
        .map(|(i, _)| i)
        .collect();

    if matching.is_empty() {
        return FilteredResult::Empty;
    }

    let tracts = || matching.iter().map(|&i| &dataset.tracts[i]);

    let mut per_category: BTreeMap<Category, usize> = BTreeMap::new();
    for t in tracts() {
        *per_category.entry(Category::of(t)).or_default() += 1;
    }

    let total_tracts = matching.len();
    let food_desert_count = tracts()
        .map(|t| usize::from(t.lila_tracts_1_and_10))
        .sum();
    let snap_sum: f64 = tracts().map(|t| t.tract_snap).sum();
    let low_vehicle_access_count = tracts().map(|t| usize::from(t.tract_hunv_flag)).sum();

    FilteredResult::Matches(TractAggregates {
        category_counts: per_category.into_iter().collect(),
        total_tracts,
        food_desert_count,
        avg_snap_pct: snap_sum / total_tracts as f64 * 100.0,
        low_vehicle_access_count,
        matching,
    })
}

#[cfg(test)]
pub(crate) fn scenario_dataset() -> Dataset {
    use super::model::tract;
    Dataset::from_tracts(vec![
        tract("OH", "Franklin", 40_000, 1, 0.2, 1),
        tract("OH", "Franklin", 45_000, 0, 0.1, 0),
    ])
}
