//! Long-term temperature trends from yearly averages

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::stats;
use crate::models::{CityTrend, TrendClass};

/// Average temperature of one calendar year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearlyAverage {
    pub year: i32,
    pub average: f64,
}

/// Yearly averages in ascending year order
pub fn yearly_averages(points: impl IntoIterator<Item = (i32, f64)>) -> Vec<YearlyAverage> {
    let mut by_year: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for (year, temperature) in points {
        let entry = by_year.entry(year).or_insert((0.0, 0));
        entry.0 += temperature;
        entry.1 += 1;
    }
    by_year
        .into_iter()
        .map(|(year, (sum, count))| YearlyAverage {
            year,
            average: sum / count as f64,
        })
        .collect()
}

/// Least-squares fit over yearly averages as `(slope, intercept)`
#[must_use]
pub fn fit(yearly: &[YearlyAverage]) -> Option<(f64, f64)> {
    let xs: Vec<f64> = yearly.iter().map(|y| f64::from(y.year)).collect();
    let ys: Vec<f64> = yearly.iter().map(|y| y.average).collect();
    stats::linear_fit(&xs, &ys)
}

/// Trend for one city. A single year of data yields a flat, stable trend.
#[must_use]
pub fn city_trend(city: &str, yearly: &[YearlyAverage]) -> CityTrend {
    let averages: Vec<f64> = yearly.iter().map(|y| y.average).collect();
    let slope = fit(yearly).map_or(0.0, |(slope, _)| slope);

    CityTrend {
        city: city.to_string(),
        slope,
        class: TrendClass::from_slope(slope),
        avg_temperature: stats::mean(&averages).unwrap_or(f64::NAN),
        temperature_range: match (stats::max(&averages), stats::min(&averages)) {
            (Some(max), Some(min)) => max - min,
            _ => 0.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yearly_averages_grouped_and_sorted() {
        let points = vec![(2001, 12.0), (2000, 10.0), (2000, 14.0), (2001, 14.0)];
        let yearly = yearly_averages(points);
        assert_eq!(
            yearly,
            vec![
                YearlyAverage { year: 2000, average: 12.0 },
                YearlyAverage { year: 2001, average: 13.0 },
            ]
        );
    }

    #[test]
    fn test_warming_city() {
        let yearly = yearly_averages(vec![(2010, 5.0), (2011, 5.5), (2012, 6.0)]);
        let trend = city_trend("Oslo", &yearly);
        assert!((trend.slope - 0.5).abs() < 1e-9);
        assert_eq!(trend.class, TrendClass::StrongWarming);
        assert!((trend.avg_temperature - 5.5).abs() < 1e-9);
        assert!((trend.temperature_range - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_year_is_stable() {
        let yearly = yearly_averages(vec![(2020, 7.0), (2020, 9.0)]);
        let trend = city_trend("Cairo", &yearly);
        assert_eq!(trend.slope, 0.0);
        assert_eq!(trend.class, TrendClass::Stable);
        assert_eq!(trend.avg_temperature, 8.0);
        assert_eq!(trend.temperature_range, 0.0);
    }
}
