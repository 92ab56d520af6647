//! Writes `usda_food_access_sample.csv`: synthetic census tracts with the
//! columns the dashboard reads, plus a couple it ignores.

use serde::Serialize;

#[derive(Serialize)]
struct Row {
    #[serde(rename = "CensusTract")]
    census_tract: String,
    #[serde(rename = "State")]
    state: &'static str,
    #[serde(rename = "County")]
    county: &'static str,
    #[serde(rename = "Urban")]
    urban: u8,
    #[serde(rename = "MedianFamilyIncome")]
    median_family_income: i64,
    #[serde(rename = "LILATracts_1And10")]
    lila_tracts_1_and_10: u8,
    #[serde(rename = "TractSNAP")]
    tract_snap: f64,
    #[serde(rename = "TractHUNVFlag")]
    tract_hunv_flag: u8,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    /// Uniform in `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// (state, FIPS prefix, counties with a baseline income)
const COUNTIES: &[(&str, &str, &[(&str, f64)])] = &[
    ("AL", "01", &[("Autauga", 58_000.0), ("Baldwin", 64_000.0), ("Barbour", 38_000.0)]),
    ("MS", "28", &[("Hinds", 45_000.0), ("Bolivar", 33_000.0)]),
    ("OH", "39", &[("Franklin", 68_000.0), ("Cuyahoga", 55_000.0), ("Vinton", 42_000.0)]),
    ("TX", "48", &[("Travis", 85_000.0), ("Starr", 30_000.0)]),
];

const TRACTS_PER_COUNTY: usize = 25;

fn main() {
    let mut rng = SimpleRng::new(42);
    let output_path = "usda_food_access_sample.csv";
    let mut writer = csv::Writer::from_path(output_path).expect("Failed to create output file");

    let mut n = 0usize;
    for &(state, fips, counties) in COUNTIES {
        for (ci, &(county, base_income)) in counties.iter().enumerate() {
            for t in 0..TRACTS_PER_COUNTY {
                // ±40% around the county baseline.
                let income = base_income * (0.6 + 0.8 * rng.next_f64());
                let poverty = (1.0 - income / 90_000.0).clamp(0.05, 0.9);
                let urban = rng.chance(0.6);

                let row = Row {
                    census_tract: format!("{fips}{:03}{:06}", ci * 2 + 1, 100 + t * 100),
                    state,
                    county,
                    urban: u8::from(urban),
                    median_family_income: (income / 10.0).round() as i64 * 10,
                    lila_tracts_1_and_10: u8::from(rng.chance(poverty * 0.7)),
                    tract_snap: (poverty * 0.5 * (0.5 + rng.next_f64())).min(1.0),
                    tract_hunv_flag: u8::from(rng.chance(poverty * if urban { 0.6 } else { 0.3 })),
                };
                writer.serialize(&row).expect("Failed to write row");
                n += 1;
            }
        }
    }
    writer.flush().expect("Failed to flush output");

    println!("Wrote {n} tracts to {output_path}");
}
