use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::display::{DisplaySurface, PublishedState, Snapshot};
use crate::error::FetchError;
use crate::fetch::CountSource;
use crate::predictor::Predictor;

/// Fixed delay between one cycle's publication and the next fetch.
pub const POLL_INTERVAL: Duration = Duration::from_secs(15);

/// The periodic prediction pipeline: fetch the count, run inference when a
/// model is available, publish the pair, wait, repeat. One request in flight
/// at a time; a failed cycle is displayed and overwritten by the next tick.
pub struct Poller<C: CountSource> {
    source: C,
    predictor: Option<Arc<Predictor>>,
    state: Arc<PublishedState>,
    surface: Arc<dyn DisplaySurface>,
}

impl<C: CountSource> Poller<C> {
    pub fn new(
        source: C,
        predictor: Option<Arc<Predictor>>,
        state: Arc<PublishedState>,
        surface: Arc<dyn DisplaySurface>,
    ) -> Self {
        if predictor.is_none() {
            warn!("No prediction model; publishing visitor counts only");
        }
        Self {
            source,
            predictor,
            state,
            surface,
        }
    }

    /// Runs until the shutdown signal fires. The original screen never tears
    /// the loop down; the handle exists for hosts that do.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("Starting visitor poll loop");
        loop {
            self.run_cycle().await;
            tokio::select! {
                _ = sleep(POLL_INTERVAL) => {}
                _ = shutdown.changed() => {
                    info!("Poll loop stopping");
                    break;
                }
            }
        }
    }

    async fn run_cycle(&self) {
        debug!("Running poll cycle");
        let outcome = self.source.fetch().await;
        let snapshot = next_snapshot(outcome, self.predictor.as_deref(), &self.state.current());
        self.state.publish(snapshot.clone());
        self.surface.render(&snapshot);
    }
}

/// One cycle's publication, derived from the fetch outcome and the previously
/// published snapshot.
///
/// A successful body is shown verbatim and parsed as a non-negative integer,
/// falling back to 0 when unparseable. A failed fetch shows the error string
/// in the count position and carries the prior prediction forward.
pub fn next_snapshot(
    outcome: Result<String, FetchError>,
    predictor: Option<&Predictor>,
    previous: &Snapshot,
) -> Snapshot {
    match outcome {
        Ok(body) => {
            let body = body.trim().to_string();
            let visitors = body.parse::<u32>().unwrap_or(0);
            let waiting_text = match predictor {
                Some(predictor) => {
                    Some(format!("{:.1}", predictor.predict(visitors as f32)))
                }
                None => previous.waiting_text.clone(),
            };
            Snapshot {
                visitors_text: body,
                waiting_text,
                updated_at: Utc::now(),
            }
        }
        Err(err) => {
            warn!("Fetch failed: {}", err);
            Snapshot {
                visitors_text: err.to_string(),
                waiting_text: previous.waiting_text.clone(),
                updated_at: Utc::now(),
            }
        }
    }
}
