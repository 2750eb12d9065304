use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use rusty_penguin::data::loader::save_file;
use rusty_penguin::{Dataset, Row, Schema};

/// Mean and spread of each numeric measurement for one species.
struct Profile {
    species: &'static str,
    islands: &'static [&'static str],
    /// (mean, std_dev) for flipper, culmen length, culmen depth, body mass.
    measurements: [(f64, f64); 4],
    /// Decimal places to print each measurement with.
    precision: [usize; 4],
    count: usize,
}

const PROFILES: [Profile; 3] = [
    Profile {
        species: "Adelie",
        islands: &["Torgersen", "Biscoe", "Dream"],
        measurements: [(190.0, 6.5), (38.8, 2.7), (18.3, 1.2), (3700.0, 460.0)],
        precision: [0, 1, 1, 0],
        count: 150,
    },
    Profile {
        species: "Chinstrap",
        islands: &["Dream"],
        measurements: [(196.0, 7.1), (48.8, 3.3), (18.4, 1.1), (3730.0, 380.0)],
        precision: [0, 1, 1, 0],
        count: 68,
    },
    Profile {
        species: "Gentoo",
        islands: &["Biscoe"],
        measurements: [(217.0, 6.5), (47.5, 3.1), (15.0, 1.0), (5080.0, 500.0)],
        precision: [0, 1, 1, 0],
        count: 124,
    },
];

/// Box-Muller transform for normal distribution
fn gauss<R: Rng>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-15);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

fn generate_row<R: Rng>(profile: &Profile, rng: &mut R) -> Row {
    let mut row = vec![profile.species.to_string()];
    for (&(mean, sd), &places) in profile.measurements.iter().zip(&profile.precision) {
        let value = gauss(rng, mean, sd).max(0.0);
        row.push(format!("{value:.places$}"));
    }
    row.push(profile.islands.choose(rng).copied().unwrap_or("Biscoe").to_string());
    row.push(if rng.gen_bool(0.5) { "MALE" } else { "FEMALE" }.to_string());
    row
}

fn main() -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let schema = Schema::penguins();

    let dataset: Dataset = PROFILES
        .iter()
        .flat_map(|profile| std::iter::repeat(profile).take(profile.count))
        .map(|profile| generate_row(profile, &mut rng))
        .collect();

    let output_path = "sample_penguins.csv";
    save_file(std::path::Path::new(output_path), &schema, &dataset)?;

    println!("Wrote {} penguins to {output_path}", dataset.len());
    Ok(())
}
