use crate::analyzer::AnalyzerClient;
use crate::settings::PollSettings;
use crate::{AppController, RefreshOutcome};
use std::future::Future;
use std::sync::Arc;
use tokio::time::{MissedTickBehavior, interval};

/// Keeps the controller in sync with the analyzer: health on one interval,
/// full snapshot refresh on another.
pub struct Poller {
    controller: AppController,
    client: Arc<dyn AnalyzerClient>,
    settings: PollSettings,
}

impl Poller {
    pub fn new(
        controller: AppController,
        client: Arc<dyn AnalyzerClient>,
        settings: PollSettings,
    ) -> Self {
        Self {
            controller,
            client,
            settings,
        }
    }

    /// Polls until `shutdown` resolves. Both timers fire once immediately,
    /// health first, so the initial snapshot fetch already knows whether the
    /// analyzer is up.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut health = interval(self.settings.health_interval());
        let mut snapshot = interval(self.settings.snapshot_interval());
        health.set_missed_tick_behavior(MissedTickBehavior::Delay);
        snapshot.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        tracing::info!(
            "Polling analyzer: health every {:?}, snapshot every {:?}",
            self.settings.health_interval(),
            self.settings.snapshot_interval()
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = health.tick() => {
                    self.controller.check_health(self.client.as_ref()).await;
                }
                _ = snapshot.tick() => {
                    match self.controller.refresh(self.client.as_ref()).await {
                        RefreshOutcome::Applied { generation } => {
                            tracing::debug!("Applied snapshot generation {}", generation)
                        }
                        RefreshOutcome::Failed(err) => tracing::debug!("Snapshot fetch failed: {}", err),
                        _ => {}
                    }
                }
            }
        }
        tracing::info!("Polling stopped");
    }
}
