#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const IRIS_CSV: &str = include_str!("../../data/iris.csv");

pub const HEADER: &str = "sepal_length,sepal_width,petal_length,petal_width,species";

/// Per-species (mean, spread) of each measurement, close to the real data.
const PROFILES: [(&str, [(f64, f64); 4]); 3] = [
    ("Iris-setosa", [(5.0, 0.35), (3.4, 0.38), (1.46, 0.17), (0.25, 0.1)]),
    ("Iris-versicolor", [(5.9, 0.5), (2.8, 0.31), (4.26, 0.47), (1.33, 0.2)]),
    ("Iris-virginica", [(6.6, 0.64), (3.0, 0.32), (5.55, 0.55), (2.03, 0.27)]),
];

/// `rows` iris-like data rows (species cycling) under the standard header.
pub fn iris_like_csv(rows: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = String::from(HEADER);
    out.push('\n');
    for i in 0..rows {
        let (name, profile) = PROFILES[i % 3];
        let values: Vec<String> = profile
            .iter()
            .map(|&(mean, spread)| {
                let v: f64 = mean + spread * (rng.gen::<f64>() * 2.0 - 1.0) * 1.5;
                format!("{:.1}", v.max(0.1))
            })
            .collect();
        out.push_str(&values.join(","));
        out.push(',');
        out.push_str(name);
        out.push('\n');
    }
    out
}
