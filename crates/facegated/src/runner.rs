//! The blocking capture/decide/record loop.

use chrono::{DateTime, Local, Utc};
use facegate_core::detector::FaceDetector;
use facegate_core::{FramePipeline, IdentityMatcher};
use facegate_hw::FrameSource;
use facegate_store::AccessStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Pause between iterations to keep an unbounded source from spinning.
const IDLE_DELAY: Duration = Duration::from_millis(10);

/// Counters reported when the loop stops.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub frames_read: u64,
    pub records_written: u64,
    pub store_failures: u64,
}

/// Run the decision loop until the source ends, a read fails, or `shutdown`
/// is set. Per-frame failures (detection, store writes) are logged and the
/// loop moves on; only read failures stop it.
pub fn run_loop<D, M>(
    source: &mut dyn FrameSource,
    pipeline: &mut FramePipeline<D, M>,
    store: &mut dyn AccessStore,
    stats_interval: Duration,
    shutdown: &AtomicBool,
) -> RunSummary
where
    D: FaceDetector,
    M: IdentityMatcher,
{
    let mut summary = RunSummary::default();
    let mut frame_index = 0u64;
    let mut last_stats = Instant::now();

    while !shutdown.load(Ordering::Relaxed) {
        let frame = match source.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::info!("frame source ended");
                break;
            }
            Err(err) => {
                tracing::error!(error = %err, "frame read failed, stopping loop");
                break;
            }
        };
        summary.frames_read += 1;

        match pipeline.step(&frame.data, frame.width, frame.height, frame_index) {
            Ok(records) => {
                for record in &records {
                    match store.append(record) {
                        Ok(()) => summary.records_written += 1,
                        Err(err) => {
                            summary.store_failures += 1;
                            tracing::warn!(
                                error = %err,
                                identity = %record.identity,
                                "record append failed"
                            );
                        }
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, frame = frame_index, "frame processing failed");
            }
        }
        frame_index += 1;

        if last_stats.elapsed() >= stats_interval {
            display_stats(store);
            last_stats = Instant::now();
        }

        std::thread::sleep(IDLE_DELAY);
    }

    summary
}

/// Print today's aggregates to the operator.
pub fn display_stats(store: &dyn AccessStore) {
    let since = start_of_today();
    // Second-resolution storage: push the upper bound past "now".
    let until = Utc::now() + chrono::Duration::seconds(1);

    match store.stats(since, until) {
        Ok(stats) => {
            println!("\n=== STATS [today] ===");
            println!("attempts:       {}", stats.total);
            println!("granted:        {}", stats.granted);
            println!("denied:         {}", stats.denied());
            println!("success rate:   {:.1}%", stats.success_rate());
            println!("avg confidence: {:.2}", stats.avg_confidence);
            println!("====================");
        }
        Err(err) => tracing::warn!(error = %err, "stats query failed"),
    }
}

fn start_of_today() -> DateTime<Utc> {
    Local::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.and_local_timezone(Local).single())
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| Utc::now() - chrono::Duration::hours(24))
}
