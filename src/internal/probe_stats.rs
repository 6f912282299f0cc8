//! Measures how many slots or keys a lookup examines in each table as the load factor rises,
//! then charts the averages and worst cases into `probe_lengths.png`.
#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use std::{collections::HashSet, error::Error};

use env_logger::Builder;
use log::{LevelFilter, info};
use plotters::{coord::Shift, prelude::*};
use primehash::{OpenAddressingTable, SeparateChainingTable, next_prime};
use rand::Rng;

// Requested slot count, rounded up to a prime
const TABLE_SIZE: usize = 100_000;
// Load factors from 0.1 to 0.95 in 10 steps
const NUM_LOAD_FACTORS: usize = 10;
const MAX_LOAD: f64 = 0.95;
const OUTPUT: &str = "probe_lengths.png";

const STRATEGIES: [&str; 2] = ["Open Addressing", "Separate Chaining"];
const COLORS: [RGBColor; 2] = [RGBColor(220, 50, 50), RGBColor(50, 90, 220)];

#[derive(Debug, Clone, Copy)]
struct ProbeStats {
    average: f64,
    worst: usize,
    capacity: usize,
}

fn summarize(lengths: impl Iterator<Item = usize>, capacity: usize) -> ProbeStats {
    let (count, total, worst) =
        lengths.fold((0_usize, 0_usize, 0_usize), |(count, total, worst), length| {
            (count + 1, total + length, worst.max(length))
        });
    let average = if count == 0 { 0.0 } else { total as f64 / count as f64 };
    ProbeStats { average, worst, capacity }
}

fn measure_open_addressing(keys: &[u64], capacity: usize) -> ProbeStats {
    let mut table = OpenAddressingTable::with_capacity(capacity);
    table.extend(keys.iter().copied());
    summarize(keys.iter().map(|key| table.probe_length(key)), table.capacity())
}

fn measure_separate_chaining(keys: &[u64], capacity: usize) -> ProbeStats {
    let mut table = SeparateChainingTable::with_capacity(capacity);
    table.extend(keys.iter().copied());
    summarize(keys.iter().map(|key| table.probe_length(key)), table.bucket_count())
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    caption: &str,
    y_desc: &str,
    load_factors: &[f64],
    series: &[Vec<f64>],
) -> Result<(), Box<dyn Error>> {
    let max_y = series.iter().flatten().fold(1.0_f64, |max, &y| max.max(y)) * 1.1; // 10% margin

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 30))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..1.0, 0.0..max_y)?;

    chart
        .configure_mesh()
        .x_desc("Load Factor")
        .y_desc(y_desc)
        .axis_desc_style(("sans-serif", 16))
        .draw()?;

    for ((&name, color), values) in STRATEGIES.iter().zip(&COLORS).zip(series) {
        let line_style = ShapeStyle::from(color).stroke_width(2);

        chart
            .draw_series(LineSeries::new(
                load_factors.iter().copied().zip(values.iter().copied()),
                line_style,
            ))?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_style));

        chart.draw_series(
            load_factors
                .iter()
                .zip(values)
                .map(|(&x, &y)| Circle::new((x, y), 4, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .format_timestamp_millis()
        .parse_default_env()
        .init();

    let capacity = next_prime(TABLE_SIZE);
    let load_factors: Vec<f64> = (0..NUM_LOAD_FACTORS)
        .map(|i| 0.1 + (MAX_LOAD - 0.1) * (i as f64) / ((NUM_LOAD_FACTORS - 1) as f64))
        .collect();

    // Distinct random keys, generated once so every run of both tables sees the same input
    let mut rng = rand::rng();
    let max_keys = (capacity as f64 * MAX_LOAD) as usize;
    let mut unique = HashSet::with_capacity(max_keys);
    while unique.len() < max_keys {
        unique.insert(rng.random::<u64>());
    }
    let keys: Vec<u64> = unique.into_iter().collect();
    info!("generated {} keys for {capacity} slots", keys.len());

    let mut average: Vec<Vec<f64>> = vec![Vec::new(); STRATEGIES.len()];
    let mut worst: Vec<Vec<f64>> = vec![Vec::new(); STRATEGIES.len()];

    for &load in &load_factors {
        let n_keys = ((capacity as f64 * load) as usize).min(keys.len());
        info!("measuring load factor {load:.2} with {n_keys} keys");

        let results = [
            measure_open_addressing(&keys[..n_keys], capacity),
            measure_separate_chaining(&keys[..n_keys], capacity),
        ];

        for (index, (name, stats)) in STRATEGIES.iter().zip(&results).enumerate() {
            println!(
                "  {name}: Avg probes = {:.3}, Worst = {}, Capacity = {}",
                stats.average, stats.worst, stats.capacity
            );
            average[index].push(stats.average);
            worst[index].push(stats.worst as f64);
        }
    }

    let root = BitMapBackend::new(OUTPUT, (1600, 700)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((1, 2));
    draw_panel(&panels[0], "Average Probe Length", "Probes", &load_factors, &average)?;
    draw_panel(&panels[1], "Worst-Case Probe Length", "Probes", &load_factors, &worst)?;
    root.present()?;

    println!("Generated plot image: {OUTPUT}");

    Ok(())
}
