//! Worker pool driving an organize batch.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Instant;

use crossbeam_channel::Receiver;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use canonfile_core::{FileRecord, OrganizeConfig, OrganizeError};
use canonfile_scan::{
    CaptureTimeReader, DiscoveredFile, ExifCaptureTime, FileEnumerator, Fingerprinter,
    HeaderSniffer, TypeSniffer,
};

use crate::dedup::Deduplicator;
use crate::locks::{DirectoryLocks, KnownDirectories};
use crate::namer::Namer;
use crate::outcome::{ItemOutcome, OrganizeReport, SkipReason};
use crate::progress::OrganizeProgress;
use crate::PROGRESS_CHANNEL_SIZE;

/// State shared by the workers of one batch.
struct Batch {
    locks: DirectoryLocks,
    known: KnownDirectories,
    aborted: AtomicBool,
    progress: Mutex<OrganizeProgress>,
}

impl Batch {
    fn new(files_total: usize, bytes_total: u64) -> Self {
        Self {
            locks: DirectoryLocks::new(),
            known: KnownDirectories::new(),
            aborted: AtomicBool::new(false),
            progress: Mutex::new(OrganizeProgress::new(files_total, bytes_total)),
        }
    }
}

#[derive(Default)]
struct WorkerOutput {
    results: Vec<(PathBuf, Result<ItemOutcome, OrganizeError>)>,
    unprocessed: usize,
}

/// Organizes a source tree into the canonical destination layout.
///
/// Each call to [`Organizer::run`] gets its own lock registry and
/// known-directories set, so independent batches never share state.
pub struct Organizer {
    config: OrganizeConfig,
    sniffer: Box<dyn TypeSniffer>,
    clock: Box<dyn CaptureTimeReader>,
    fingerprinter: Fingerprinter,
    namer: Namer,
    dedup: Deduplicator,
    progress_tx: broadcast::Sender<OrganizeProgress>,
}

impl Organizer {
    /// Create an organizer using header sniffing and EXIF capture times.
    pub fn new(config: OrganizeConfig) -> Self {
        Self::with_probes(config, HeaderSniffer::new(), ExifCaptureTime::new())
    }

    /// Create an organizer with custom media probes.
    pub fn with_probes(
        config: OrganizeConfig,
        sniffer: impl TypeSniffer + 'static,
        clock: impl CaptureTimeReader + 'static,
    ) -> Self {
        let (progress_tx, _) = broadcast::channel(PROGRESS_CHANNEL_SIZE);
        Self {
            sniffer: Box::new(sniffer),
            clock: Box::new(clock),
            fingerprinter: Fingerprinter::new(config.hash),
            namer: Namer::new(&config.destination).with_separate_videos(config.separate_videos),
            dedup: Deduplicator::from_config(&config),
            progress_tx,
            config,
        }
    }

    /// Subscribe to progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<OrganizeProgress> {
        self.progress_tx.subscribe()
    }

    pub fn config(&self) -> &OrganizeConfig {
        &self.config
    }

    /// Run the batch to completion.
    ///
    /// Only enumeration failures are returned as errors. Per-item failures
    /// are collected in the report; a fatal item error (or any error with
    /// `fail_fast`) stops the workers from taking further items.
    pub fn run(&self) -> Result<OrganizeReport, OrganizeError> {
        let start = Instant::now();
        let listing = FileEnumerator::new().enumerate(&self.config.source)?;
        info!(
            root = %listing.root.display(),
            files = listing.files.len(),
            bytes = listing.total_bytes,
            "found files"
        );

        let mut report =
            OrganizeReport::new(self.config.dry_run, listing.len(), listing.total_bytes);
        report.warnings = listing.warnings;

        let mut work = listing.files;
        shuffle_work(&mut work, self.config.shuffle_seed);

        let batch = Batch::new(work.len(), listing.total_bytes);
        let (tx, rx) = crossbeam_channel::unbounded();
        for item in work {
            if tx.send(item).is_err() {
                break;
            }
        }
        drop(tx);

        let workers = self.config.workers.max(1);
        let outputs: Vec<WorkerOutput> = thread::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|id| {
                    let rx = rx.clone();
                    let batch = &batch;
                    s.spawn(move || self.worker(id, rx, batch))
                })
                .collect();

            handles
                .into_iter()
                .filter_map(|handle| match handle.join() {
                    Ok(output) => Some(output),
                    Err(_) => {
                        error!("organize worker panicked");
                        batch.aborted.store(true, Ordering::SeqCst);
                        None
                    }
                })
                .collect()
        });
        // Left in the queue when every worker died.
        report.unprocessed += rx.len();

        let mut results = Vec::new();
        for output in outputs {
            results.extend(output.results);
            report.unprocessed += output.unprocessed;
        }
        results.sort_by(|a, b| a.0.cmp(&b.0));
        for (source, result) in results {
            report.record(source, result);
        }

        report.aborted = batch.aborted.load(Ordering::SeqCst);
        report.duration = start.elapsed();
        info!(summary = %report.summary(), "organize finished");
        Ok(report)
    }

    fn worker(&self, id: usize, rx: Receiver<DiscoveredFile>, batch: &Batch) -> WorkerOutput {
        let mut output = WorkerOutput::default();

        for item in rx.iter() {
            if batch.aborted.load(Ordering::SeqCst) {
                output.unprocessed += 1;
                continue;
            }

            let result = panic::catch_unwind(AssertUnwindSafe(|| self.process(&item, batch)))
                .unwrap_or_else(|payload| {
                    Err(OrganizeError::Panicked {
                        path: item.path.clone(),
                        message: panic_message(payload.as_ref()),
                    })
                });
            if let Err(err) = &result {
                if err.is_fatal() || self.config.fail_fast {
                    error!(worker = id, path = %item.path.display(), %err, "aborting batch");
                    batch.aborted.store(true, Ordering::SeqCst);
                } else {
                    warn!(worker = id, path = %item.path.display(), %err, "item failed");
                }
            }

            self.report_progress(batch, &item, result.is_err());
            output.results.push((item.path, result));
        }

        debug!(worker = id, items = output.results.len(), "worker finished");
        output
    }

    /// Sniff, fingerprint, name and place one file.
    fn process(&self, item: &DiscoveredFile, batch: &Batch) -> Result<ItemOutcome, OrganizeError> {
        let Some(media) = self.sniffer.sniff(&item.path) else {
            return Ok(ItemOutcome::Skipped {
                reason: SkipReason::NotMedia,
            });
        };

        let record = FileRecord {
            digest: self.fingerprinter.identity_digest(&item.path)?,
            captured: self.clock.capture_time(&item.path),
            source: item.path.clone(),
            size: item.size,
            media,
        };
        let location = self.namer.locate_record(&record);

        batch.locks.with_locked(&location.bucket, || {
            batch.known.ensure(&location.bucket, self.config.dry_run)?;
            self.dedup.place(&record, &location)
        })
    }

    fn report_progress(&self, batch: &Batch, item: &DiscoveredFile, failed: bool) {
        let snapshot = {
            let mut progress = batch
                .progress
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            progress.complete_file(item.path.clone(), item.size, failed);
            progress.clone()
        };
        let _ = self.progress_tx.send(snapshot);
    }
}

/// Randomize the processing order so workers rarely contend for the same
/// bucket. A seed makes the order reproducible.
fn shuffle_work(work: &mut [DiscoveredFile], seed: Option<u64>) {
    match seed {
        Some(seed) => work.shuffle(&mut StdRng::seed_from_u64(seed)),
        None => work.shuffle(&mut rand::rng()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
