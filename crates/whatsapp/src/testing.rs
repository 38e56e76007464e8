//! Shared doubles for the service tests in this crate.

use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Mutex;

use aurum_core::channel::{ChannelError, MessageChannel, OutboundMessage};
use aurum_core::clock::Clock;

#[derive(Default)]
pub(crate) struct RecordingChannel {
    pub sent: Mutex<Vec<OutboundMessage>>,
}

impl RecordingChannel {
    pub async fn sent_to(&self, recipient: &str) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|message| message.to.as_str() == recipient)
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl MessageChannel for RecordingChannel {
    async fn send(&self, message: &OutboundMessage) -> Result<(), ChannelError> {
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

pub(crate) struct ManualClock {
    now: StdMutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        let start = Utc.with_ymd_and_hms(2026, 8, 7, 9, 0, 0).single().expect("timestamp");
        Arc::new(Self { now: StdMutex::new(start) })
    }

    pub fn advance_secs(&self, secs: i64) {
        *self.now.lock().expect("clock lock") += Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}
