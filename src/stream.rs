//! Batch extraction API: many documents, results as they complete.
//!
//! Each document is an independent, CPU-bound pipeline run, so documents are
//! read with tokio and extracted on the blocking pool, `concurrency` at a
//! time. Results are yielded in completion order (not input order); every
//! [`DocumentResult`] carries its path so callers can re-sort.
//!
//! A document that exceeds `timeout_secs` yields [`ExtractError::Timeout`].
//! The blocking task cannot be interrupted; its result is simply discarded
//! when it eventually finishes.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::extract::{extract, read_document};
use crate::output::ExtractionOutput;
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::Stream;
use tracing::{info, warn};

/// Outcome of one document in a batch.
#[derive(Debug)]
pub struct DocumentResult {
    pub path: PathBuf,
    pub result: Result<ExtractionOutput, ExtractError>,
}

/// A boxed stream of per-document results.
pub type DocumentStream = Pin<Box<dyn Stream<Item = DocumentResult> + Send>>;

/// Extract every document in `paths`, streaming results as they are ready.
///
/// Progress events from `config.progress_callback` fire per document;
/// `on_batch_complete` fires once the stream is exhausted.
///
/// # Example
/// ```rust,no_run
/// use doc2mcq::{extract_stream, ExtractionConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() {
/// let paths = vec!["paper1.docx".into(), "paper2.docx".into()];
/// let mut results = extract_stream(paths, &ExtractionConfig::default());
/// while let Some(doc) = results.next().await {
///     match doc.result {
///         Ok(out) => println!("{}: {} questions", doc.path.display(), out.questions.len()),
///         Err(e) => eprintln!("{}: {e}", doc.path.display()),
///     }
/// }
/// # }
/// ```
pub fn extract_stream(paths: Vec<PathBuf>, config: &ExtractionConfig) -> DocumentStream {
    let total = paths.len();
    info!(
        "Starting batch extraction: {} documents, concurrency {}",
        total, config.concurrency
    );

    let config = Arc::new(config.clone());
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let succeeded = Arc::new(AtomicUsize::new(0));
    let concurrency = config.concurrency.max(1);

    let documents = {
        let config = Arc::clone(&config);
        let succeeded = Arc::clone(&succeeded);
        stream::iter(paths.into_iter().map(move |path| {
            let config = Arc::clone(&config);
            let succeeded = Arc::clone(&succeeded);
            async move {
                let doc = extract_one(path, config).await;
                if doc.result.is_ok() {
                    succeeded.fetch_add(1, Ordering::SeqCst);
                }
                doc
            }
        }))
        .buffer_unordered(concurrency)
    };

    // Fires after the last document without yielding an item of its own.
    let finished = stream::once(async move {
        let ok = succeeded.load(Ordering::SeqCst);
        info!("Batch extraction complete: {}/{} documents", ok, total);
        if let Some(ref cb) = config.progress_callback {
            cb.on_batch_complete(total, ok);
        }
    })
    .filter_map(|_| async { None::<DocumentResult> });

    Box::pin(documents.chain(finished))
}

async fn extract_one(path: PathBuf, config: Arc<ExtractionConfig>) -> DocumentResult {
    let cb = config.progress_callback.clone();
    if let Some(ref cb) = cb {
        cb.on_document_start(&path);
    }

    let work = {
        let path = path.clone();
        let config = Arc::clone(&config);
        async move {
            let bytes = read_document(&path).await?;
            tokio::task::spawn_blocking(move || extract(&bytes, &config))
                .await
                .map_err(|e| ExtractError::Internal(format!("Extraction task failed: {e}")))?
        }
    };

    let result = match config.timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), work)
            .await
            .unwrap_or_else(|_| {
                Err(ExtractError::Timeout {
                    path: path.clone(),
                    secs,
                })
            }),
        None => work.await,
    };

    match &result {
        Ok(output) => {
            if let Some(ref cb) = cb {
                cb.on_document_complete(&path, output.questions.len(), output.diagnostics.blocks_seen);
            }
        }
        Err(e) => {
            warn!("{}: {}", path.display(), e);
            if let Some(ref cb) = cb {
                cb.on_document_error(&path, &e.to_string());
            }
        }
    }

    DocumentResult { path, result }
}
