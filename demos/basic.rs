//! Minimize the Branin function with both DIRECT variants.
//!
//! Run with `RUST_LOG=debug cargo run --example basic` to see per-iteration output.

use direct_opt::{minimize, DirectAlgorithm, DirectOptions};

fn branin(x: &[f64]) -> (f64, bool) {
    let pi = std::f64::consts::PI;
    let b = 5.1 / (4.0 * pi * pi);
    let c = 5.0 / pi;
    let t = 1.0 / (8.0 * pi);
    let f = (x[1] - b * x[0] * x[0] + c * x[0] - 6.0).powi(2) + 10.0 * (1.0 - t) * x[0].cos() + 10.0;
    (f, true)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let bounds = [(-5.0, 10.0), (0.0, 15.0)];
    for algorithm in [DirectAlgorithm::Original, DirectAlgorithm::LocallyBiased] {
        let result = minimize(
            branin,
            &bounds,
            DirectOptions {
                algorithm,
                fglobal: 0.397887,
                fglper: 0.01,
                ..Default::default()
            },
        )?;
        println!("{}", algorithm);
        println!("{}", result);
    }

    Ok(())
}
