//! Background playback reconciliation loop.

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::usecase::ReconcilePlaybackUseCase;

/// Spawn the reconciliation loop. Abort the returned handle to stop it.
pub fn spawn_reconciler(
    usecase: Arc<ReconcilePlaybackUseCase>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        interval.tick().await;

        tracing::info!("Playback reconciliation every {:?}", period);
        loop {
            interval.tick().await;
            usecase.execute().await;
        }
    })
}
