//! In-memory call store
//!
//! One record per active call. The outer map is a `parking_lot::RwLock` so
//! distinct calls never contend; each record sits behind its own
//! `tokio::sync::Mutex` so at most one mutation per call id is ever in
//! flight, no matter how many turns the transport delivers concurrently.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};

use crate::record::CallRecord;
use crate::AgentError;

pub struct CallStore {
    records: RwLock<HashMap<String, Arc<Mutex<CallRecord>>>>,
    stale_after: chrono::Duration,
}

impl CallStore {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            stale_after: chrono::Duration::from_std(stale_after)
                .unwrap_or_else(|_| chrono::Duration::seconds(900)),
        }
    }

    /// Register a new call. Creating an id that already exists is an error;
    /// silently resetting a live conversation would lose its state.
    pub fn create(&self, call_id: &str) -> Result<(), AgentError> {
        let mut records = self.records.write();
        if records.contains_key(call_id) {
            return Err(AgentError::DuplicateCall(call_id.to_string()));
        }
        records.insert(
            call_id.to_string(),
            Arc::new(Mutex::new(CallRecord::new(call_id))),
        );
        tracing::info!(call_id = %call_id, total = records.len(), "call registered");
        Ok(())
    }

    /// Shared handle to a live record. Locking the handle serializes an
    /// entire turn for this call (read, handler, write) while other calls
    /// proceed untouched.
    pub fn get(&self, call_id: &str) -> Option<Arc<Mutex<CallRecord>>> {
        self.records.read().get(call_id).cloned()
    }

    /// Cloned point-in-time copy of a record
    pub async fn snapshot(&self, call_id: &str) -> Option<CallRecord> {
        let record = self.get(call_id)?;
        let guard = record.lock().await;
        Some(guard.clone())
    }

    /// Run `f` with exclusive access to the record
    pub async fn with_record<T>(
        &self,
        call_id: &str,
        f: impl FnOnce(&mut CallRecord) -> T,
    ) -> Result<T, AgentError> {
        let record = self
            .get(call_id)
            .ok_or_else(|| AgentError::UnknownCall(call_id.to_string()))?;
        let mut guard = record.lock().await;
        Ok(f(&mut guard))
    }

    /// Remove a call's record. Removing an unknown id is a no-op, so hangup
    /// and cleanup paths can race without harm.
    pub fn remove(&self, call_id: &str) {
        if self.records.write().remove(call_id).is_some() {
            tracing::info!(call_id = %call_id, "call removed");
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Drop records idle past the staleness threshold; returns how many.
    /// Records currently locked are mid-turn and therefore not stale.
    pub fn sweep_stale(&self) -> usize {
        let now = chrono::Utc::now();
        let mut stale = Vec::new();
        {
            let records = self.records.read();
            for (call_id, record) in records.iter() {
                if let Ok(guard) = record.try_lock() {
                    if guard.is_stale(now, self.stale_after) {
                        stale.push(call_id.clone());
                    }
                }
            }
        }
        let mut records = self.records.write();
        for call_id in &stale {
            records.remove(call_id);
            tracing::info!(call_id = %call_id, "swept stale call");
        }
        stale.len()
    }

    /// Start a background task that periodically sweeps stale records.
    ///
    /// Returns a shutdown sender; send `true` to stop the task.
    pub fn start_sweep_task(self: &Arc<Self>, interval: Duration) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let store = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let swept = store.sweep_stale();
                        if swept > 0 {
                            tracing::info!(swept, remaining = store.len(), "stale call sweep");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("call sweep task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_core::CallStep;

    fn store() -> CallStore {
        CallStore::new(Duration::from_secs(900))
    }

    #[tokio::test]
    async fn test_create_then_snapshot() {
        let store = store();
        store.create("call-1").unwrap();

        let snapshot = store.snapshot("call-1").await.unwrap();
        assert_eq!(snapshot.call_id, "call-1");
        assert_eq!(snapshot.step, CallStep::Greeting);
    }

    #[tokio::test]
    async fn test_duplicate_create_is_an_error() {
        let store = store();
        store.create("call-1").unwrap();
        assert!(matches!(
            store.create("call-1"),
            Err(AgentError::DuplicateCall(_))
        ));
        // The original record is untouched.
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_with_record_unknown_call() {
        let store = store();
        let result = store.with_record("missing", |_| ()).await;
        assert!(matches!(result, Err(AgentError::UnknownCall(_))));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = store();
        store.create("call-1").unwrap();
        store.remove("call-1");
        store.remove("call-1");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_mutations_for_one_call_are_serialized() {
        use crate::record::CallEvent;

        let store = Arc::new(store());
        store.create("call-1").unwrap();

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .with_record("call-1", |record| {
                        record.apply(CallEvent::UserSaid(format!("turn {i}")));
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let snapshot = store.snapshot("call-1").await.unwrap();
        assert_eq!(snapshot.history.len(), 20);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_stale_records() {
        let store = store();
        store.create("fresh").unwrap();
        store.create("stale").unwrap();

        store
            .with_record("stale", |record| {
                record.last_activity = chrono::Utc::now() - chrono::Duration::seconds(3600);
            })
            .await
            .unwrap();

        assert_eq!(store.sweep_stale(), 1);
        assert!(store.snapshot("stale").await.is_none());
        assert!(store.snapshot("fresh").await.is_some());
    }
}
