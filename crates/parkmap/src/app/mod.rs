use std::io::Write;
use std::sync::PoisonError;
use std::time::Duration;

use cap_std::fs_utf8::camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand, ValueEnum};
use miette::{Context, IntoDiagnostic, Result};
use parkmap_core::paths::open_parent_dir;
use parkmap_core::LatLon;
use parkmap_marker_manager::{map_slot, wire_markers, ColorBehavior, ReadinessWaiter};
use parkmap_marker_models::{LeafletMap, ParkingLot, SharedMap};
use parkmap_nrel::{resolve_api_key, write_stations_csv, CityStations, NrelClient};
use parkmap_overpass::{thin_by_city, write_lots_csv, OverpassClient};
use tracing_appender::non_blocking::WorkerGuard;
use parkmap_ownership::{
    HttpOwnershipSource, OwnershipLookupPanel, OwnershipSource, UNKNOWN_CONTACT,
};
use tracing::{info, info_span, warn};

mod config;
mod init;
mod session;

use config::ParkmapConfiguration;
use init::{init_tracing, load_configuration};
use session::Session;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<Utf8PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
enum LotsFormat {
    /// pretty printed array, what `session` reads
    #[default]
    Json,
    /// one line per lot with a header, for spreadsheets and static map generators
    Csv,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the parking lots of the configured cities from OpenStreetMap, thinned per city.
    Fetch {
        /// Where to write the lots, stdout when absent
        #[arg(short, long)]
        out: Option<Utf8PathBuf>,
        #[arg(short, long, value_enum, default_value_t)]
        format: LotsFormat,
        /// Keep every lot instead of one per cluster
        #[arg(long)]
        no_thinning: bool,
    },
    /// List the electric vehicle charging stations of the configured cities.
    Stations {
        /// Stations asked per state, at most 200
        #[arg(short, long)]
        limit: Option<u32>,
        /// Also save every station found as CSV
        #[arg(long)]
        csv: Option<Utf8PathBuf>,
    },
    /// Ask the ownership service who owns the lot at a position.
    #[command(allow_negative_numbers = true)]
    Lookup {
        #[arg(long)]
        lat: f64,
        #[arg(long)]
        lon: f64,
    },
    /// Build the map of a lots file, wire its markers and drive it from stdin.
    Session {
        /// JSON array of lots, as written by `fetch`
        #[arg(short, long)]
        lots: Utf8PathBuf,
        /// Markers turn into a green dot once instead of toggling red and green
        #[arg(long)]
        single_shot: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
}

/// Parses `args` and only then installs logging, so `--help` and usage errors touch nothing on disk.
pub fn start_from<I, T>(args: I) -> Result<(Cli, Option<WorkerGuard>), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    Ok((cli, init_tracing()))
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = load_configuration(self.config)?;
        match self.command {
            Command::Fetch {
                out,
                format,
                no_thinning,
            } => fetch(config, out.as_deref(), format, no_thinning).await,
            Command::Stations { limit, csv } => stations(config, limit, csv.as_deref()).await,
            Command::Lookup { lat, lon } => lookup(config, LatLon::new(lat, lon)).await,
            Command::Session { lots, single_shot } => run_session(config, &lots, single_shot).await,
            Command::Config => {
                let content = toml::to_string_pretty(&config).into_diagnostic()?;
                print!("{content}");
                Ok(())
            }
        }
    }
}

fn write_lots<W: Write>(mut writer: W, lots: &[ParkingLot], format: LotsFormat) -> Result<()> {
    match format {
        LotsFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, lots).into_diagnostic()?;
            writeln!(writer).into_diagnostic()
        }
        LotsFormat::Csv => write_lots_csv(writer, lots).into_diagnostic(),
    }
}

async fn fetch(
    config: ParkmapConfiguration,
    out: Option<&Utf8Path>,
    format: LotsFormat,
    no_thinning: bool,
) -> Result<()> {
    let lots = tokio::task::spawn_blocking(move || {
        let parameters = &config.overpass;
        let client = OverpassClient::new(
            parameters.url.clone(),
            Duration::from_millis(parameters.timeout_ms),
            Duration::from_millis(parameters.pause_ms),
        );
        let lots = client.fetch_cities(&config.cities);
        if no_thinning {
            lots
        } else {
            thin_by_city(&lots, &config.cities)
        }
    })
    .await
    .into_diagnostic()?;

    match out {
        Some(path) => {
            let (dir, file_name) = open_parent_dir(path)?;
            let file = dir
                .create(file_name)
                .into_diagnostic()
                .wrap_err(path.to_string())
                .wrap_err("failed to create lots file")?;
            write_lots(std::io::BufWriter::new(file), &lots, format)?;
            info!(%path, lots = lots.len(), "lots written");
            Ok(())
        }
        None => write_lots(std::io::stdout().lock(), &lots, format),
    }
}

fn print_stations<W: Write>(mut out: W, found: &[CityStations]) -> std::io::Result<()> {
    for city in found {
        if city.stations.is_empty() {
            writeln!(out, "\nNo charging stations found in {}, {}.", city.city, city.state)?;
            continue;
        }
        writeln!(out, "\nCharging Stations in {}, {}:", city.city, city.state)?;
        for station in &city.stations {
            writeln!(out, "{}", "=".repeat(50))?;
            writeln!(out, "{station}")?;
        }
        writeln!(out, "{}", "=".repeat(50))?;
    }
    Ok(())
}

async fn stations(config: ParkmapConfiguration, limit: Option<u32>, csv: Option<&Utf8Path>) -> Result<()> {
    let parameters = config.nrel;
    let cities: Vec<(String, String)> = config
        .cities
        .iter()
        .filter_map(|city| match &city.state_code {
            Some(code) => Some((city.name.to_string(), code.to_string())),
            None => {
                warn!(city = %city.name, "no state code, charging stations skipped");
                None
            }
        })
        .collect();
    let limit = limit.unwrap_or(parameters.limit);
    let client = NrelClient::new(
        &parameters.url,
        resolve_api_key(parameters.api_key.as_deref()),
        Duration::from_millis(parameters.timeout_ms),
    )?;
    let found = tokio::task::spawn_blocking(move || {
        client.fetch_cities(cities.iter().map(|(c, s)| (c.as_str(), s.as_str())), limit)
    })
    .await
    .into_diagnostic()?;

    print_stations(std::io::stdout().lock(), &found).into_diagnostic()?;

    let all: Vec<_> = found.into_iter().flat_map(|city| city.stations).collect();
    if let (Some(path), false) = (csv, all.is_empty()) {
        let (dir, file_name) = open_parent_dir(path)?;
        let file = dir
            .create(file_name)
            .into_diagnostic()
            .wrap_err(path.to_string())
            .wrap_err("failed to create stations file")?;
        write_stations_csv(std::io::BufWriter::new(file), &all).into_diagnostic()?;
        info!(%path, stations = all.len(), "stations written");
    }
    Ok(())
}

async fn lookup(config: ParkmapConfiguration, position: LatLon) -> Result<()> {
    let source = HttpOwnershipSource::new(
        &config.ownership.origin,
        Duration::from_millis(config.ownership.timeout_ms),
    )?;
    let record = tokio::task::spawn_blocking(move || source.fetch(position))
        .await
        .into_diagnostic()?
        .wrap_err_with(|| format!("ownership lookup of {position} failed"))?;
    println!("Owner: {}", record.owner_or_unknown());
    if let Some(contact) = &record.contact {
        println!("Contact: {}", if contact.is_empty() { UNKNOWN_CONTACT } else { contact });
    }
    Ok(())
}

fn read_lots(path: &Utf8Path) -> Result<Vec<ParkingLot>> {
    let (dir, file_name) = open_parent_dir(path)?;
    let content = dir
        .read_to_string(file_name)
        .into_diagnostic()
        .wrap_err(path.to_string())
        .wrap_err("failed to read lots file")?;
    serde_json::from_str(&content)
        .into_diagnostic()
        .wrap_err("lots file is not a JSON array of parking lots")
}

async fn run_session(config: ParkmapConfiguration, lots_path: &Utf8Path, single_shot: bool) -> Result<()> {
    let lots = read_lots(lots_path)?;
    let behavior = if single_shot {
        ColorBehavior::single_shot()
    } else {
        ColorBehavior::toggle()
    };

    let (publisher, slot) = map_slot();
    let waiter = ReadinessWaiter::new(slot, move |map: SharedMap| {
        let report = {
            let mut map = map.lock().unwrap_or_else(PoisonError::into_inner);
            wire_markers(&mut *map, behavior)
        };
        (map, report)
    });
    let readiness = tokio::spawn(waiter.poll(
        config.readiness.poll_interval(),
        config.readiness.max_attempts(),
    ));

    let map = {
        let _span_guard = info_span!("building map", lots = lots.len()).entered();
        LeafletMap::from_lots(&lots).into_shared()
    };
    publisher.publish(map);

    let (map, report) = readiness.await.into_diagnostic()??;
    if !report.skipped.is_empty() {
        warn!(skipped = report.skipped.len(), "some markers kept their previous behavior");
    }

    let source = HttpOwnershipSource::new(
        &config.ownership.origin,
        Duration::from_millis(config.ownership.timeout_ms),
    )?;
    info!(origin = %source.origin(), "ownership lookups enabled");
    let panel = OwnershipLookupPanel::new(lots, source);
    let session = Session::new(map, panel);

    tokio::task::spawn_blocking(move || {
        session.run(std::io::stdin().lock(), std::io::stdout().lock())
    })
    .await
    .into_diagnostic()?
}
