//! Current reading vs. seasonal history

use tracing::debug;

use crate::history::anomaly::Bounds;
use crate::history::{HistoricalDataset, stats};
use crate::models::{CurrentAnalysis, Season, TemperatureZone};
use crate::{ApiErrorKind, Result, TempwatchError};

/// Width of the normal range in standard deviations
pub const NORMAL_RANGE_SIGMA: f64 = 2.0;

/// Compare `temperature` with the city's history for the season of `month`
///
/// The normal range is `mean ± 2·std` regardless of the rolling anomaly
/// sigma; the zone uses a single standard deviation. Fewer than two seasonal
/// samples means there is no usable baseline.
pub fn analyze_current(
    dataset: &HistoricalDataset,
    city: &str,
    temperature: f64,
    month: u32,
) -> Result<CurrentAnalysis> {
    let season = Season::from_month(month);
    let seasonal = dataset.seasonal_temperatures(city, season);

    let (Some(mean), Some(std)) = (stats::mean(&seasonal), stats::sample_std(&seasonal)) else {
        return Err(TempwatchError::api(
            ApiErrorKind::NoHistoricalData,
            format!("{city} ({season})"),
        ));
    };

    let bounds = Bounds::around(mean, std, NORMAL_RANGE_SIGMA);
    let anomaly_kind = bounds.classify(temperature);

    let zone = if temperature < mean - std {
        TemperatureZone::BelowAverage
    } else if temperature > mean + std {
        TemperatureZone::AboveAverage
    } else {
        TemperatureZone::WithinNormal
    };

    debug!(
        "{city}: {temperature:.1}°C vs {season} mean {mean:.2}°C (σ {std:.2}), {anomaly_kind}"
    );

    Ok(CurrentAnalysis {
        city: city.to_string(),
        current_temperature: temperature,
        season,
        historical_mean: stats::round2(mean),
        historical_std: stats::round2(std),
        normal_range: (stats::round2(bounds.lower), stats::round2(bounds.upper)),
        is_anomaly: anomaly_kind.is_anomaly(),
        anomaly_kind,
        zone,
        deviation_from_mean: stats::round2(temperature - mean),
    })
}
