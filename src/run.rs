//! Application execution logic.
//!
//! This module contains the async loop that reads events from standard
//! input and feeds them through the debounced handler.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;

use modulate::config::ValidatedConfig;
use modulate::{InvalidArgument, Modulator, Options, Outcome};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// The demo handler: event name in, summary out.
type Handler = Modulator<String, String, Infallible>;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// The handler could not be built from the configured options.
    #[error("Failed to create handler: {0}")]
    Handler(#[from] InvalidArgument),

    /// Reading events from the input failed.
    #[error("Failed to read events: {0}")]
    Input(#[source] std::io::Error),
}

/// Counts of events seen during a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Events read from the input
    pub detected: usize,
    /// Events whose call resolved with a result
    pub completed: usize,
    /// Events whose call was cancelled
    pub cancelled: usize,
    /// Events whose call failed
    pub failed: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} event(s) detected: {} completed, {} cancelled, {} failed",
            self.detected, self.completed, self.cancelled, self.failed
        )
    }
}

/// A settled call, as seen by the event that made it.
struct Completion {
    event: String,
    elapsed: Duration,
    outcome: Outcome<String, Infallible>,
}

/// Executes the main application loop.
///
/// Reads event names from stdin until EOF or a shutdown signal. On shutdown,
/// the pending window is cancelled and every outstanding call is drained
/// before returning.
///
/// # Errors
///
/// Returns an error if the handler cannot be created or stdin fails.
///
/// # Coverage Note
///
/// This function is excluded from coverage because it requires a real
/// stdin and signal handling.
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig) -> Result<(), RunError> {
    let handler = create_handler(config.options, config.work)?;

    tracing::info!("Reading events from stdin, one per line");
    let input = BufReader::new(tokio::io::stdin());
    let summary = process(input, &handler, shutdown_signal()).await?;

    tracing::info!("{summary}");
    Ok(())
}

/// Builds the debounced handler.
///
/// The handler simulates `work` of processing and then reports which event
/// it handled.
fn create_handler(options: Options, work: Duration) -> Result<Handler, InvalidArgument> {
    Modulator::new(options, move |_receiver, event: String| async move {
        if !work.is_zero() {
            tokio::time::sleep(work).await;
        }
        Ok::<_, Infallible>(format!("handled {event}"))
    })
}

/// Feeds every line of `input` through `handler` until EOF or `shutdown`.
///
/// Blank lines are ignored. Each event is logged when detected and again
/// when its call settles.
///
/// # Errors
///
/// Returns [`RunError::Input`] if reading a line fails.
async fn process<I, S>(input: I, handler: &Handler, shutdown: S) -> Result<Summary, RunError>
where
    I: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let mut lines = LinesStream::new(input.lines());
    let mut completions = JoinSet::new();
    let mut summary = Summary::default();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            () = &mut shutdown => {
                tracing::info!("Shutdown signal received, cancelling pending events...");
                handler.cancel();
                break;
            }

            Some(joined) = completions.join_next(), if !completions.is_empty() => {
                record(&mut summary, joined);
            }

            line = lines.next() => {
                match line {
                    Some(Ok(line)) => {
                        let event = line.trim();
                        if event.is_empty() {
                            continue;
                        }
                        summary.detected += 1;
                        tracing::info!("{event} detected");

                        let detected_at = Instant::now();
                        let event = event.to_string();
                        let pending = handler.call(event.clone());
                        completions.spawn(async move {
                            let outcome = pending.await;
                            Completion { event, elapsed: detected_at.elapsed(), outcome }
                        });
                    }
                    Some(Err(e)) => return Err(RunError::Input(e)),
                    None => break,
                }
            }
        }
    }

    while let Some(joined) = completions.join_next().await {
        record(&mut summary, joined);
    }

    Ok(summary)
}

/// Logs a settled call and counts it.
fn record(summary: &mut Summary, joined: Result<Completion, tokio::task::JoinError>) {
    let completion = match joined {
        Ok(completion) => completion,
        Err(e) => {
            tracing::error!("Completion task failed: {e}");
            summary.failed += 1;
            return;
        }
    };

    let line = describe(&completion);
    match &completion.outcome {
        Ok(_) => {
            summary.completed += 1;
            tracing::info!("{line}");
        }
        Err(e) if e.is_cancelled() => {
            summary.cancelled += 1;
            tracing::info!("{line}");
        }
        Err(_) => {
            summary.failed += 1;
            tracing::warn!("{line}");
        }
    }
}

/// Formats a settled call for the log.
fn describe(completion: &Completion) -> String {
    let elapsed = completion.elapsed.as_millis();
    match &completion.outcome {
        Ok(result) => format!("{}: {result} ({elapsed}ms after detection)", completion.event),
        Err(e) => format!("{}: {e} ({elapsed}ms after detection)", completion.event),
    }
}

/// Returns a future that completes when a shutdown signal is received.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
