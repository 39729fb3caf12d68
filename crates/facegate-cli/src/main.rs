use anyhow::{Context, Result};
use chrono::{Duration, Local, Utc};
use clap::{Parser, Subcommand};
use facegate_core::evidence::EvidenceDir;
use facegate_core::detector::{FaceDetector, FrameDiffDetector};
use facegate_core::KnownIdentityRegistry;
use facegate_hw::{Camera, FrameSource};
use facegate_store::{AccessStore, SqliteAccessStore};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "facegate", about = "Facegate access-control CLI")]
struct Cli {
    /// Path to the access-record database.
    #[arg(long, default_value = "access_records.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate statistics over a recent window
    Stats {
        /// Window size in hours
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },
    /// Most recent access records
    Recent {
        /// Number of records to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Known identities in the dataset directory
    Registry {
        #[arg(long, default_value = "datasets")]
        dataset_dir: PathBuf,
    },
    /// Scan for usable capture devices
    Probe,
    /// Capture region crops into the dataset directory
    Enroll {
        /// Person name (dataset subfolder)
        #[arg(short, long)]
        name: String,
        /// Number of samples to capture
        #[arg(short, long, default_value_t = 20)]
        count: usize,
        /// Camera device index
        #[arg(long, default_value_t = 0)]
        camera: u32,
        #[arg(long, default_value = "datasets")]
        dataset_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Stats { hours } => show_stats(&cli.db, hours),
        Commands::Recent { limit } => show_recent(&cli.db, limit),
        Commands::Registry { dataset_dir } => show_registry(&dataset_dir),
        Commands::Probe => probe_cameras(),
        Commands::Enroll {
            name,
            count,
            camera,
            dataset_dir,
        } => enroll(&name, count, camera, &dataset_dir),
    }
}

fn show_stats(db: &PathBuf, hours: i64) -> Result<()> {
    let store = SqliteAccessStore::open(db).context("opening access store")?;

    let until = Utc::now() + Duration::seconds(1);
    let since = until - Duration::hours(hours);

    let stats = store.stats(since, until)?;
    let unknown = store.unknown_count(since, until)?;

    println!("=== ACCESS STATS [last {hours}h] ===");
    println!("attempts:       {}", stats.total);
    println!("granted:        {}", stats.granted);
    println!("denied:         {}", stats.denied());
    println!("unknown faces:  {unknown}");
    println!("success rate:   {:.1}%", stats.success_rate());
    println!("avg confidence: {:.2}", stats.avg_confidence);
    Ok(())
}

fn show_recent(db: &PathBuf, limit: usize) -> Result<()> {
    let store = SqliteAccessStore::open(db).context("opening access store")?;
    let records = store.recent(limit)?;

    if records.is_empty() {
        println!("no recent activity");
        return Ok(());
    }

    for record in records {
        let time = record
            .timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S");
        let status = if record.granted { "GRANTED" } else { "DENIED " };
        println!(
            "{time}  {status}  {} ({:.2})",
            record.identity, record.confidence
        );
    }
    Ok(())
}

fn show_registry(dataset_dir: &PathBuf) -> Result<()> {
    let registry = KnownIdentityRegistry::load(dataset_dir).with_context(|| {
        format!("loading identity registry from {}", dataset_dir.display())
    })?;

    if registry.is_empty() {
        println!("no known identities in {}", dataset_dir.display());
        return Ok(());
    }

    for name in registry.names() {
        let samples = registry.sample_count(name).unwrap_or(0);
        println!("{name}: {samples} samples");
    }
    println!("total: {} known identities", registry.len());
    Ok(())
}

fn probe_cameras() -> Result<()> {
    let devices = Camera::probe();
    if devices.is_empty() {
        println!("no capture devices found");
        return Ok(());
    }
    for device in devices {
        println!("{}  {} ({})", device.path, device.name, device.driver);
    }
    Ok(())
}

/// Capture frames and save detected region crops into `datasets/<name>/`
/// until `count` samples exist or the attempt budget runs out.
fn enroll(name: &str, count: usize, camera_index: u32, dataset_dir: &PathBuf) -> Result<()> {
    let sink = EvidenceDir::create(dataset_dir.join(name))
        .with_context(|| format!("creating dataset directory for {name}"))?;

    let mut camera = Camera::open(camera_index)
        .with_context(|| format!("opening camera /dev/video{camera_index}"))?;
    camera.discard_frames(4);

    let mut detector = FrameDiffDetector::new();
    let mut captured = 0usize;
    let max_attempts = count.saturating_mul(25);

    println!("capturing {count} samples for {name}; move slightly in front of the camera");

    for _ in 0..max_attempts {
        if captured >= count {
            break;
        }

        let Some(frame) = camera.read_frame()? else {
            break;
        };

        let regions = match detector.detect(&frame.data, frame.width, frame.height) {
            Ok(regions) => regions,
            Err(err) => {
                tracing::warn!(error = %err, "detection failed during enrollment");
                continue;
            }
        };

        if let Some(region) = regions.first() {
            match sink.save_region(&frame.data, frame.width, frame.height, region, "sample") {
                Ok(path) => {
                    captured += 1;
                    println!("captured {captured}/{count}: {}", path.display());
                }
                Err(err) => tracing::warn!(error = %err, "sample write failed"),
            }
        }

        std::thread::sleep(std::time::Duration::from_millis(100));
    }

    if captured == 0 {
        println!("no samples captured; nothing moved in front of the camera?");
    } else {
        println!("enrolled {captured} samples for {name} in {}", sink.path().display());
    }
    Ok(())
}
