//! Case duration distribution
//!
//! Converts per-case durations (seconds) to days and summarizes them as a
//! density histogram plus a Gaussian kernel density line for plotting.

use crate::engine::WorkHours;
use crate::filters::SECONDS_IN_DAY;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, Normal};
use statrs::statistics::Statistics;

/// Smallest value used as the lower end of the geometric sample range
const GEOMETRIC_FLOOR: f64 = 1e-6;

/// Distribution settings
///
/// `business_hours` and `work_hours` describe how the durations were
/// produced by the engine; they are carried here so the whole policy lives
/// in one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionOptions {
    pub bin_count: usize,
    pub business_hours: bool,
    pub work_hours: WorkHours,
}

impl Default for DistributionOptions {
    fn default() -> Self {
        Self {
            bin_count: 50,
            business_hours: true,
            work_hours: [9, 17],
        }
    }
}

/// Density histogram; `bin_edges` has one more entry than `density`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub density: Vec<f64>,
    pub bin_edges: Vec<f64>,
}

/// Smoothed density line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityLine {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationDistribution {
    pub histogram: Histogram,
    pub line: DensityLine,
}

/// Build the distribution of case durations given in seconds
///
/// Returns `None` for one case or fewer: there is no distribution to show.
pub fn compute(
    case_durations_seconds: &[f64],
    options: &DistributionOptions,
) -> Option<DurationDistribution> {
    if case_durations_seconds.len() <= 1 {
        tracing::debug!(
            "Skipping duration distribution for {} case(s)",
            case_durations_seconds.len()
        );
        return None;
    }
    if options.bin_count == 0 {
        tracing::warn!("Skipping duration distribution: bin count is 0");
        return None;
    }

    let days: Vec<f64> = case_durations_seconds
        .iter()
        .map(|s| s / SECONDS_IN_DAY)
        .collect();

    Some(DurationDistribution {
        histogram: histogram(&days, options.bin_count),
        line: kde_line(&days, options.bin_count * 4),
    })
}

/// Equal-width density histogram over [min, max]
///
/// Bins are half-open except the last, which includes `max`. A constant
/// series is spread over [v - 0.5, v + 0.5]. No bins or no values give an
/// empty histogram.
pub fn histogram(values: &[f64], bins: usize) -> Histogram {
    if bins == 0 || values.is_empty() {
        return Histogram {
            density: Vec::new(),
            bin_edges: Vec::new(),
        };
    }

    let (mut lo, mut hi) = bounds(values);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let mut bin_edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    bin_edges[bins] = hi;

    let mut counts = vec![0usize; bins];
    for &v in values {
        let mut i = (((v - lo) / width).floor() as usize).min(bins - 1);
        // Float drift can land a value one bin off its edges
        while i > 0 && v < bin_edges[i] {
            i -= 1;
        }
        while i < bins - 1 && v >= bin_edges[i + 1] {
            i += 1;
        }
        counts[i] += 1;
    }

    let total = values.len() as f64;
    let density = counts
        .iter()
        .zip(bin_edges.windows(2))
        .map(|(&c, edge)| c as f64 / (total * (edge[1] - edge[0])))
        .collect();

    Histogram { density, bin_edges }
}

/// Gaussian KDE (Scott's rule) sampled at `points` positions
///
/// Half of the positions are spaced linearly over [min, max], half
/// geometrically, which gives short durations more resolution.
pub fn kde_line(values: &[f64], points: usize) -> DensityLine {
    let (min, max) = bounds(values);
    let half = points / 2;

    let geo_start = min.max(GEOMETRIC_FLOOR);
    let mut x = linspace(min, max, points - half);
    if max > geo_start {
        x.extend(geomspace(geo_start, max, half));
    } else {
        x.extend(linspace(min, max, half));
    }
    x.sort_by(f64::total_cmp);

    let n = values.len() as f64;
    let bandwidth = values.iter().std_dev() * n.powf(-0.2);

    let y = match Normal::new(0.0, bandwidth) {
        Ok(kernel) if bandwidth.is_finite() && bandwidth > 0.0 => x
            .iter()
            .map(|&xi| values.iter().map(|&v| kernel.pdf(xi - v)).sum::<f64>() / n)
            .collect(),
        _ => {
            tracing::debug!("Degenerate KDE bandwidth {}, emitting a flat line", bandwidth);
            vec![0.0; x.len()]
        }
    };

    DensityLine { x, y }
}

fn bounds(values: &[f64]) -> (f64, f64) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (min, max)
}

fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| if i == count - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

fn geomspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    let (log_start, log_end) = (start.ln(), end.ln());
    linspace(log_start, log_end, count)
        .into_iter()
        .enumerate()
        .map(|(i, l)| match i {
            0 => start,
            _ if i == count - 1 => end,
            _ => l.exp(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn days(values: &[f64]) -> Vec<f64> {
        values.iter().map(|d| d * SECONDS_IN_DAY).collect()
    }

    #[test]
    fn test_histogram_integrates_to_one() {
        let dist = compute(&days(&[1.0, 2.0, 2.0, 3.0, 10.0]), &DistributionOptions::default())
            .unwrap();

        let hist = &dist.histogram;
        assert_eq!(hist.density.len(), 50);
        assert_eq!(hist.bin_edges.len(), 51);
        assert_eq!(hist.bin_edges[0], 1.0);
        assert_eq!(hist.bin_edges[50], 10.0);

        let area: f64 = hist
            .density
            .iter()
            .zip(hist.bin_edges.windows(2))
            .map(|(d, e)| d * (e[1] - e[0]))
            .sum();
        assert!((area - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_line_has_four_points_per_bin() {
        let dist = compute(&days(&[1.0, 2.0, 2.0, 3.0, 10.0]), &DistributionOptions::default())
            .unwrap();

        assert_eq!(dist.line.x.len(), 200);
        assert_eq!(dist.line.y.len(), 200);
        assert!(dist.line.x.windows(2).all(|w| w[0] <= w[1]));
        assert!(dist.line.y.iter().all(|y| *y >= 0.0));
        assert_eq!(dist.line.x[0], 1.0);
        assert_eq!(dist.line.x[199], 10.0);
    }

    #[test]
    fn test_single_case_has_no_distribution() {
        assert!(compute(&days(&[4.0]), &DistributionOptions::default()).is_none());
        assert!(compute(&[], &DistributionOptions::default()).is_none());
    }

    #[test]
    fn test_histogram_max_lands_in_last_bin() {
        let hist = histogram(&[0.0, 1.0, 2.0, 3.0], 3);
        assert_eq!(hist.bin_edges, vec![0.0, 1.0, 2.0, 3.0]);
        // counts [1, 1, 2] over width 1 and 4 values
        assert_eq!(hist.density, vec![0.25, 0.25, 0.5]);
    }

    #[test]
    fn test_histogram_without_bins_or_values_is_empty() {
        for hist in [histogram(&[1.0, 2.0], 0), histogram(&[], 4)] {
            assert!(hist.density.is_empty());
            assert!(hist.bin_edges.is_empty());
        }
    }

    #[test]
    fn test_constant_durations() {
        let dist = compute(&days(&[2.0, 2.0, 2.0]), &DistributionOptions {
            bin_count: 2,
            ..DistributionOptions::default()
        })
        .unwrap();

        assert_eq!(dist.histogram.bin_edges, vec![1.5, 2.0, 2.5]);
        assert_eq!(dist.histogram.density, vec![0.0, 2.0]);
        assert_eq!(dist.line.x.len(), 8);
        assert!(dist.line.y.iter().all(|y| *y == 0.0));
    }

    #[test]
    fn test_kde_peaks_near_mass() {
        let line = kde_line(&[1.0, 1.1, 0.9, 1.0, 5.0], 40);
        let peak = line
            .x
            .iter()
            .zip(&line.y)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(x, _)| *x)
            .unwrap();
        assert!(peak < 2.5);
    }
}
