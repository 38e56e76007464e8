use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

/// Per-customer turn serialization.
///
/// Two concurrent deliveries for the same customer would otherwise run
/// independent load-mutate-save cycles and silently lose the earlier turn.
/// Each customer gets a lane mutex; turns for the same customer queue behind
/// it while different customers proceed in parallel. Idle lanes are
/// reclaimed once nobody holds or waits on them.
#[derive(Default)]
pub struct TurnSerializer {
    lanes: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TurnSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn run<F, T>(&self, key: &str, turn: F) -> T
    where
        F: Future<Output = T>,
    {
        let lane = {
            let mut lanes = self.lanes.lock().await;
            lanes.entry(key.to_string()).or_default().clone()
        };

        let output = {
            let _guard = lane.lock().await;
            turn.await
        };

        // With the lanes map locked, a count of two (map + our clone) proves
        // no other task holds or waits on this lane.
        let mut lanes = self.lanes.lock().await;
        if Arc::strong_count(&lane) == 2 {
            lanes.remove(key);
        }

        output
    }

    #[cfg(test)]
    async fn lane_count(&self) -> usize {
        self.lanes.lock().await.len()
    }
}
