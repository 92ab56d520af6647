use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Column names of the tract schema
// ---------------------------------------------------------------------------

pub const COL_STATE: &str = "State";
pub const COL_COUNTY: &str = "County";
pub const COL_INCOME: &str = "MedianFamilyIncome";
pub const COL_LILA: &str = "LILATracts_1And10";
pub const COL_SNAP: &str = "TractSNAP";
pub const COL_HUNV: &str = "TractHUNVFlag";

// ---------------------------------------------------------------------------
// TractRecord – one row of the dataset
// ---------------------------------------------------------------------------

/// A single census tract with its food-access indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TractRecord {
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "County")]
    pub county: String,
    #[serde(rename = "MedianFamilyIncome", deserialize_with = "integral")]
    pub median_family_income: i64,
    /// 1 = low-income and low-access at 1 and 10 miles (food desert).
    #[serde(rename = "LILATracts_1And10", deserialize_with = "indicator")]
    pub lila_tracts_1_and_10: u8,
    /// Fraction of the tract participating in SNAP, in `[0, 1]`.
    #[serde(rename = "TractSNAP")]
    pub tract_snap: f64,
    /// 1 = households lacking vehicle access far from food retail.
    #[serde(rename = "TractHUNVFlag", deserialize_with = "indicator")]
    pub tract_hunv_flag: u8,
}

impl TractRecord {
    pub fn is_food_desert(&self) -> bool {
        self.lila_tracts_1_and_10 == 1
    }

    /// Check the value constraints of the schema. Returns a description of
    /// the first violation.
    pub fn validate(&self) -> Result<(), String> {
        if self.state.is_empty() {
            return Err(format!("empty {COL_STATE}"));
        }
        if self.county.is_empty() {
            return Err(format!("empty {COL_COUNTY}"));
        }
        if self.median_family_income < 0 {
            return Err(format!(
                "{COL_INCOME} is negative ({})",
                self.median_family_income
            ));
        }
        if !(0.0..=1.0).contains(&self.tract_snap) {
            return Err(format!("{COL_SNAP} {} outside [0, 1]", self.tract_snap));
        }
        Ok(())
    }
}

/// Pandas writes integer columns as `40000.0` once a column has seen a NaN,
/// so accept any float with a zero fraction.
fn integral<'de, D: Deserializer<'de>>(de: D) -> Result<i64, D::Error> {
    let v = f64::deserialize(de)?;
    // 2^63 is exactly representable; anything at or beyond it saturates.
    if v.fract() != 0.0 || !v.is_finite() || v < -(2f64.powi(63)) || v >= 2f64.powi(63) {
        return Err(serde::de::Error::custom(format!(
            "expected an integer, got {v}"
        )));
    }
    Ok(v as i64)
}

fn indicator<'de, D: Deserializer<'de>>(de: D) -> Result<u8, D::Error> {
    let v = integral(de)?;
    match v {
        0 | 1 => Ok(v as u8),
        other => Err(serde::de::Error::custom(format!(
            "expected indicator 0 or 1, got {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// All tracts in load order plus the indices the filter widgets are built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub tracts: Vec<TractRecord>,
    /// State → sorted set of its counties.
    pub counties_by_state: BTreeMap<String, BTreeSet<String>>,
    /// Global `(min, max)` of `MedianFamilyIncome`; `None` when empty.
    pub income_bounds: Option<(i64, i64)>,
}

impl Dataset {
    pub fn from_tracts(tracts: Vec<TractRecord>) -> Self {
        let mut counties_by_state: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut income_bounds: Option<(i64, i64)> = None;

        for t in &tracts {
            counties_by_state
                .entry(t.state.clone())
                .or_default()
                .insert(t.county.clone());
            let inc = t.median_family_income;
            income_bounds = Some(match income_bounds {
                None => (inc, inc),
                Some((lo, hi)) => (lo.min(inc), hi.max(inc)),
            });
        }

        Dataset {
            tracts,
            counties_by_state,
            income_bounds,
        }
    }

    /// Sorted unique state names.
    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.counties_by_state.keys().map(String::as_str)
    }

    /// Sorted unique counties of `state`; empty for an unknown state.
    pub fn counties(&self, state: &str) -> impl Iterator<Item = &str> {
        self.counties_by_state
            .get(state)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.tracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracts.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Category – value of the food-desert indicator
// ---------------------------------------------------------------------------

/// The two values of `LILATracts_1And10`, ordered by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    NotFoodDesert = 0,
    FoodDesert = 1,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::NotFoodDesert, Category::FoodDesert];

    pub fn of(record: &TractRecord) -> Self {
        if record.is_food_desert() {
            Category::FoodDesert
        } else {
            Category::NotFoodDesert
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::NotFoodDesert => "Not Food Desert",
            Category::FoodDesert => "Food Desert",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
pub(crate) fn tract(
    state: &str,
    county: &str,
    income: i64,
    lila: u8,
    snap: f64,
    hunv: u8,
) -> TractRecord {
    TractRecord {
        state: state.to_string(),
        county: county.to_string(),
        median_family_income: income,
        lila_tracts_1_and_10: lila,
        tract_snap: snap,
        tract_hunv_flag: hunv,
    }
}
