//! Idempotent state reconciliation.
//!
//! The reconciler applies [`NormalizedUpdate`]s to a [`StateStore`]. Right
//! after startup it runs *cold*: every write is preceded by an existence
//! check so metadata can be created or merged. Once the warm-up window has
//! elapsed it runs *warm* and writes values directly. The transition happens
//! once and is never reversed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aerolink_core::{StatePath, StateStore};
use dashmap::DashSet;
use tokio::task::JoinHandle;
use tracing::{info, trace, warn};

use crate::error::{DeviceError, Result};
use crate::normalizer::{NormalizedUpdate, UpdateValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmupPhase {
    /// Existence checks precede every write
    Cold,
    /// Values are written directly
    Warm,
}

/// What a single reconcile did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Nothing to write
    Skipped,
    /// Path was absent and has been created
    Created,
    /// Path existed; metadata merged and value written
    Extended,
    /// Value written without touching metadata
    Written,
}

/// Summary of applying one batch of updates.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub applied: usize,
    pub created: usize,
    pub skipped: usize,
    pub failures: Vec<(StatePath, DeviceError)>,
    /// Stored values whose write-back registration failed
    pub subscription_failures: Vec<(StatePath, DeviceError)>,
}

impl ReconcileReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.subscription_failures.is_empty()
    }
}

/// Applies updates to a state store.
pub struct StateReconciler {
    store: Arc<dyn StateStore>,
    warm: AtomicBool,
    /// Paths already registered for write-back
    subscribed: DashSet<StatePath>,
}

impl StateReconciler {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            warm: AtomicBool::new(false),
            subscribed: DashSet::new(),
        }
    }

    pub fn phase(&self) -> WarmupPhase {
        if self.warm.load(Ordering::Acquire) {
            WarmupPhase::Warm
        } else {
            WarmupPhase::Cold
        }
    }

    /// End the warm-up window. Later calls are no-ops.
    pub fn mark_warm(&self) {
        if !self.warm.swap(true, Ordering::AcqRel) {
            info!("Warm-up window elapsed, skipping existence checks from now on");
        }
    }

    /// Flip to [`WarmupPhase::Warm`] after `window`.
    pub fn spawn_warmup_timer(self: &Arc<Self>, window: Duration) -> JoinHandle<()> {
        let reconciler = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            reconciler.mark_warm();
        })
    }

    /// Apply one update.
    ///
    /// A failed write-back subscription is logged and does not fail an
    /// update whose value was stored.
    pub async fn reconcile(&self, update: &NormalizedUpdate) -> Result<ReconcileOutcome> {
        let outcome = self.write(update).await?;
        if let Err(e) = self.ensure_subscribed(update, outcome).await {
            warn!(path = %update.path, error = %e, "Failed to subscribe for writes");
        }
        Ok(outcome)
    }

    async fn write(&self, update: &NormalizedUpdate) -> Result<ReconcileOutcome> {
        let value = match &update.value {
            UpdateValue::Set(value) => value,
            UpdateValue::Unchanged => {
                trace!("Unchanged: {}", update.path);
                return Ok(ReconcileOutcome::Skipped);
            }
        };
        let path = &update.path;

        let outcome = match self.phase() {
            WarmupPhase::Cold => {
                let existed = self.store.exists(path).await?;
                self.store
                    .create_or_extend(path, &update.metadata())
                    .await?;
                self.store.set_value(path, value).await?;
                if existed {
                    ReconcileOutcome::Extended
                } else {
                    ReconcileOutcome::Created
                }
            }
            WarmupPhase::Warm => {
                self.store.set_value(path, value).await?;
                ReconcileOutcome::Written
            }
        };

        trace!("{:?} {} = {}", outcome, path, value);
        Ok(outcome)
    }

    /// Register a writable path for write-back once its value is stored.
    async fn ensure_subscribed(
        &self,
        update: &NormalizedUpdate,
        outcome: ReconcileOutcome,
    ) -> Result<()> {
        if outcome == ReconcileOutcome::Skipped || !update.writable() {
            return Ok(());
        }
        let path = &update.path;
        if self.subscribed.insert(path.clone()) {
            if let Err(e) = self.store.subscribe_for_writes(path).await {
                // Forget the path so the next update retries.
                self.subscribed.remove(path);
                return Err(e.into());
            }
        }
        Ok(())
    }

    /// Apply updates in order. A failed update is recorded and the rest
    /// still run.
    pub async fn apply(&self, updates: &[NormalizedUpdate]) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for update in updates {
            let outcome = match self.write(update).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(path = %update.path, error = %e, "Failed to reconcile update");
                    report.failures.push((update.path.clone(), e));
                    continue;
                }
            };
            match outcome {
                ReconcileOutcome::Skipped => report.skipped += 1,
                ReconcileOutcome::Created => {
                    report.created += 1;
                    report.applied += 1;
                }
                _ => report.applied += 1,
            }

            if let Err(e) = self.ensure_subscribed(update, outcome).await {
                warn!(path = %update.path, error = %e, "Failed to subscribe for writes");
                report.subscription_failures.push((update.path.clone(), e));
            }
        }

        report
    }
}
