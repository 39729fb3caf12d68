use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod config;
mod runner;

use config::{CameraSpec, Config};
use facegate_core::detector::FrameDiffDetector;
use facegate_core::evidence::EvidenceDir;
use facegate_core::{CoordinateMatcher, FramePipeline, KnownIdentityRegistry};
use facegate_hw::{Camera, FrameSource, SyntheticSource};
use facegate_store::SqliteAccessStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = Config::from_env();
    tracing::info!(
        camera = ?cfg.camera,
        db = %cfg.db_path.display(),
        threshold = cfg.threshold,
        process_interval = cfg.process_interval,
        "facegated starting"
    );

    let registry = KnownIdentityRegistry::load(&cfg.dataset_dir).with_context(|| {
        format!(
            "loading identity registry from {}",
            cfg.dataset_dir.display()
        )
    })?;
    if registry.is_empty() {
        tracing::info!("no known identities; running in detection-only mode");
    } else {
        tracing::info!(identities = registry.len(), "identity registry loaded");
    }

    let mut store = SqliteAccessStore::open(&cfg.db_path).context("opening access store")?;

    // Camera unavailable at startup is fatal for the run.
    let mut source: Box<dyn FrameSource> = match cfg.camera {
        CameraSpec::Index(index) => {
            let mut camera = Camera::open(index)
                .with_context(|| format!("opening camera /dev/video{index}"))?;
            camera.discard_frames(cfg.warmup_frames);
            Box::new(camera)
        }
        CameraSpec::Synthetic => {
            let mut synthetic = SyntheticSource::new(640, 480);
            if let Some(limit) = cfg.synthetic_frames {
                synthetic = synthetic.with_limit(limit);
            }
            Box::new(synthetic)
        }
    };
    tracing::info!(source = %source.describe(), "frame source ready");

    let mut pipeline = FramePipeline::new(
        FrameDiffDetector::new(),
        CoordinateMatcher,
        registry,
        cfg.threshold,
        cfg.process_interval,
    );
    if cfg.save_evidence {
        let sink = EvidenceDir::create(&cfg.evidence_dir).with_context(|| {
            format!(
                "creating evidence directory {}",
                cfg.evidence_dir.display()
            )
        })?;
        pipeline = pipeline.with_evidence(sink);
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let (done_tx, mut done_rx) = tokio::sync::oneshot::channel();
    let stats_interval = Duration::from_secs(cfg.stats_interval_secs.max(1));

    let loop_shutdown = Arc::clone(&shutdown);
    let handle = std::thread::Builder::new()
        .name("facegate-loop".into())
        .spawn(move || {
            let summary = runner::run_loop(
                source.as_mut(),
                &mut pipeline,
                &mut store,
                stats_interval,
                &loop_shutdown,
            );
            // Flush final aggregates before the camera handle is released.
            runner::display_stats(&store);
            let _ = done_tx.send(summary);
        })
        .context("spawning loop thread")?;

    let mut summary = None;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, stopping");
            shutdown.store(true, Ordering::Relaxed);
        }
        done = &mut done_rx => summary = done.ok(),
    }

    // After an interrupt, wait for the loop to flush stats and wind down.
    if summary.is_none() {
        summary = done_rx.await.ok();
    }

    let _ = tokio::task::spawn_blocking(move || handle.join()).await;

    if let Some(summary) = summary {
        tracing::info!(
            frames = summary.frames_read,
            records = summary.records_written,
            store_failures = summary.store_failures,
            "facegated stopped"
        );
    }

    Ok(())
}
