use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

use tempwatch::history::{CitySummary, TrendSortKey};
use tempwatch::monitor::{self, MonitorMode, MonitorReport, MonitorRun};
use tempwatch::{HistoricalDataset, TempwatchConfig, TempwatchError, dashboard, load_csv, logging};

#[derive(Parser, Debug)]
#[command(name = "tempwatch", version)]
#[command(about = "Historical temperature analysis and live weather anomaly monitoring")]
struct Args {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Historical temperature CSV (city, timestamp, temperature)
    #[arg(short, long, global = true, env = "TEMPWATCH_DATA")]
    data: Option<PathBuf>,

    /// OpenWeatherMap API key
    #[arg(long, global = true, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summaries, anomalies and seasonal statistics per city
    Analyze {
        /// Only this city
        #[arg(long)]
        city: Option<String>,
    },
    /// Long-term trend table across cities
    Trends {
        /// slope, average or range
        #[arg(long, default_value = "slope")]
        sort: String,
        #[arg(long)]
        ascending: bool,
    },
    /// Current weather for one city compared with its history
    Current {
        city: String,
        #[arg(long, value_enum, default_value_t = CliMode::Async)]
        mode: CliMode,
        /// Country code, e.g. RU
        #[arg(long)]
        country: Option<String>,
    },
    /// Current weather for several cities
    Compare {
        #[arg(required = true, num_args = 1..)]
        cities: Vec<String>,
        /// `both` runs the blocking and the async client and reports timings
        #[arg(long, value_enum, default_value_t = CliMode::Async)]
        mode: CliMode,
    },
    /// Run the JSON dashboard API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum CliMode {
    Sync,
    Async,
    Both,
}

impl CliMode {
    fn modes(self) -> Vec<MonitorMode> {
        match self {
            CliMode::Sync => vec![MonitorMode::Sync],
            CliMode::Async => vec![MonitorMode::Async],
            CliMode::Both => vec![MonitorMode::Sync, MonitorMode::Async],
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run(Args::parse()).await {
        let message = match e.downcast_ref::<TempwatchError>() {
            Some(err) => err.user_message(),
            None => format!("{e:#}"),
        };
        eprintln!("Error: {message}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = TempwatchConfig::load_from_path(args.config.clone())
        .with_context(|| "Failed to load configuration")?;
    if let Some(key) = args.api_key {
        config.weather.api_key = Some(key);
        config.validate_api_key()?;
    }

    logging::init(&config.logging, args.verbose)?;
    debug!("Configuration loaded: {:?}", config.analysis);

    match args.command {
        Command::Analyze { city } => {
            let dataset = load_dataset(require_data(args.data.as_deref())?, &config)?;
            info!(
                "Rolling window {} observations, anomaly threshold {}σ",
                dataset.window(),
                dataset.anomaly_sigma()
            );
            match city {
                Some(city) => print_summary(&dataset.city_summary(&city)?),
                None => {
                    for city in dataset.cities() {
                        print_summary(&dataset.city_summary(city)?);
                    }
                }
            }
        }
        Command::Trends { sort, ascending } => {
            let key: TrendSortKey = sort.parse()?;
            let dataset = load_dataset(require_data(args.data.as_deref())?, &config)?;
            print_trends(&dataset, key, ascending);
        }
        Command::Current {
            city,
            mode,
            country,
        } => {
            if country.is_some() {
                config.weather.country_code = country;
            }
            let dataset = optional_dataset(args.data.as_deref(), &config)?;
            for mode in mode.modes() {
                let run = monitor::monitor(
                    mode,
                    &config.weather,
                    vec![city.clone()],
                    dataset.clone(),
                    monitor::current_month(),
                )
                .await?;
                print_run(&run);
            }
        }
        Command::Compare { cities, mode } => {
            let dataset = optional_dataset(args.data.as_deref(), &config)?;
            let mut runs = Vec::new();
            for mode in mode.modes() {
                let run = monitor::monitor(
                    mode,
                    &config.weather,
                    cities.clone(),
                    dataset.clone(),
                    monitor::current_month(),
                )
                .await?;
                print_run(&run);
                runs.push(run);
            }
            if let [sync, async_run] = runs.as_slice() {
                print_timing(sync, async_run);
            }
        }
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.dashboard.host = host;
            }
            if let Some(port) = port {
                config.dashboard.port = port;
            }
            let dataset = match args.data.as_deref() {
                Some(path) => Some(load_dataset(path, &config)?),
                None => None,
            };
            dashboard::serve(&config, dataset).await?;
        }
    }

    Ok(())
}

fn require_data(data: Option<&Path>) -> Result<&Path> {
    data.ok_or_else(|| {
        TempwatchError::validation("A historical CSV is required. Pass --data <FILE>.").into()
    })
}

fn load_dataset(path: &Path, config: &TempwatchConfig) -> Result<HistoricalDataset> {
    let (observations, report) = load_csv(path)?;
    info!(
        "Loaded {} rows from {} ({} skipped)",
        report.rows_loaded,
        path.display(),
        report.rows_skipped()
    );
    Ok(HistoricalDataset::from_observations(
        observations,
        &config.analysis,
    )?)
}

fn optional_dataset(
    data: Option<&Path>,
    config: &TempwatchConfig,
) -> Result<Option<Arc<HistoricalDataset>>> {
    data.map(|path| load_dataset(path, config).map(Arc::new))
        .transpose()
}

fn print_summary(summary: &CitySummary) {
    println!("== {} ({} observations)", summary.city, summary.observations);
    println!(
        "   mean {:.2}°C  std {}  min {:.1}°C  max {:.1}°C",
        summary.mean,
        summary
            .std
            .map_or_else(|| "n/a".to_string(), |s| format!("{s:.2}")),
        summary.min,
        summary.max
    );
    println!(
        "   anomalies: {} ({} positive, {} negative)",
        summary.anomalies.total, summary.anomalies.positive, summary.anomalies.negative
    );
    for (season, count) in &summary.anomalies_by_season {
        println!("     {season}: {count}");
    }
    for d in &summary.seasonal_distribution {
        println!(
            "   {:<7} min {:>6.1}  q1 {:>6.1}  median {:>6.1}  q3 {:>6.1}  max {:>6.1}",
            d.season.as_str(),
            d.min,
            d.q1,
            d.median,
            d.q3,
            d.max
        );
    }
    if let Some(trend) = &summary.trend {
        println!("   trend: {:+.4}°C/year ({})", trend.slope, trend.class);
    }
}

fn print_trends(dataset: &HistoricalDataset, key: TrendSortKey, ascending: bool) {
    println!(
        "{:<20} {:>12} {:>18} {:>10} {:>10}",
        "city", "°C/year", "class", "avg °C", "range"
    );
    for t in dataset.sorted_trends(key, ascending) {
        println!(
            "{:<20} {:>+12.4} {:>18} {:>10.2} {:>10.2}",
            t.city,
            t.slope,
            t.class.to_string(),
            t.avg_temperature,
            t.temperature_range
        );
    }
    if let Some(overview) = dataset.trend_overview() {
        println!();
        println!("mean slope: {:+.4}°C/year", overview.mean_slope);
        println!(
            "strongest warming: {} ({:+.4})",
            overview.strongest_warming.city, overview.strongest_warming.slope
        );
        println!(
            "strongest cooling: {} ({:+.4})",
            overview.strongest_cooling.city, overview.strongest_cooling.slope
        );
        println!(
            "hottest: {} ({:.2}°C), coldest: {} ({:.2}°C)",
            overview.hottest.city,
            overview.hottest.avg_temperature,
            overview.coldest.city,
            overview.coldest.avg_temperature
        );
    }
}

fn print_report(report: &MonitorReport) {
    match (&report.reading, &report.error) {
        (Some(reading), _) => {
            println!(
                "{:<20} {:>8}  {}",
                report.city,
                reading.format_temperature(),
                reading.description
            );
            if let Some(analysis) = &report.analysis {
                println!(
                    "{:<20} {} norm {:.2}°C, range {:.2}..{:.2}°C, deviation {:+.2}°C, {}{}",
                    "",
                    analysis.season,
                    analysis.historical_mean,
                    analysis.normal_range.0,
                    analysis.normal_range.1,
                    analysis.deviation_from_mean,
                    analysis.zone,
                    if analysis.is_anomaly { " [ANOMALY]" } else { "" }
                );
            } else if let Some(reason) = &report.analysis_error {
                println!("{:<20} {}", "", reason);
            }
        }
        (None, Some(failure)) => println!("{:<20} error: {}", report.city, failure.message),
        (None, None) => println!("{:<20} no data", report.city),
    }
}

fn print_run(run: &MonitorRun) {
    println!(
        "-- {} ({} of {} ok, {} ms)",
        run.mode,
        run.successes(),
        run.reports.len(),
        run.elapsed_ms
    );
    for report in &run.reports {
        print_report(report);
    }
}

fn print_timing(sync: &MonitorRun, async_run: &MonitorRun) {
    let speedup = if async_run.elapsed_ms > 0 {
        sync.elapsed_ms as f64 / async_run.elapsed_ms as f64
    } else {
        f64::INFINITY
    };
    println!(
        "sync {} ms vs async {} ms ({:.1}x)",
        sync.elapsed_ms, async_run.elapsed_ms, speedup
    );
}
