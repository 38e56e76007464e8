use std::sync::Arc;

use tracing::warn;

use aurum_core::channel::{MessageChannel, OutboundMessage};
use aurum_core::domain::approval::ApprovalId;
use aurum_core::domain::session::CustomerId;
use aurum_core::domain::settings::OwnerContext;
use aurum_core::store::SettingsStore;

use crate::inbound::with_channel_prefix;

/// What an alert is about; persisted as the owner context so shorthand
/// commands ("approve 15000", bare "reply") know their target.
#[derive(Clone, Debug, Default)]
pub struct AlertContext {
    pub customer: Option<CustomerId>,
    pub request_id: Option<ApprovalId>,
}

/// Out-of-band notifications to the store owner over the same messaging
/// channel. Nothing here may fail a customer turn: an unconfigured owner
/// number skips the alert, send and context-write errors are logged and
/// dropped.
#[derive(Clone)]
pub struct OwnerNotifier {
    channel: Arc<dyn MessageChannel>,
    settings: Arc<dyn SettingsStore>,
}

impl OwnerNotifier {
    pub fn new(channel: Arc<dyn MessageChannel>, settings: Arc<dyn SettingsStore>) -> Self {
        Self { channel, settings }
    }

    pub async fn alert(&self, body: &str, context: AlertContext) {
        self.remember_context(context).await;

        let owner_number = match self.settings.load().await {
            Ok(settings) => settings.owner_number,
            Err(error) => {
                warn!(error = %error, "could not load settings for owner alert");
                return;
            }
        };
        if owner_number.trim().is_empty() {
            return;
        }

        let message = OutboundMessage::text(
            CustomerId(with_channel_prefix(&owner_number)),
            format!("🔔 *Owner Alert*\n\n{body}"),
        );
        if let Err(error) = self.channel.send(&message).await {
            warn!(error = %error, "owner alert send failed");
        }
    }

    async fn remember_context(&self, context: AlertContext) {
        if context.customer.is_none() && context.request_id.is_none() {
            return;
        }

        let current = match self.settings.owner_context().await {
            Ok(current) => current,
            Err(error) => {
                warn!(error = %error, "could not load owner context");
                OwnerContext::default()
            }
        };

        let merged = OwnerContext {
            customer: context.customer.or(current.customer),
            request_id: context.request_id.or(current.request_id),
        };
        if let Err(error) = self.settings.set_owner_context(merged).await {
            warn!(error = %error, "could not persist owner context");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use aurum_core::domain::approval::ApprovalId;
    use aurum_core::domain::session::CustomerId;
    use aurum_core::domain::settings::{SettingsPatch, StoreSettings};
    use aurum_core::store::SettingsStore;
    use aurum_db::repositories::InMemorySettingsStore;

    use crate::testing::RecordingChannel;

    use super::{AlertContext, OwnerNotifier};

    fn settings_with_owner() -> Arc<InMemorySettingsStore> {
        Arc::new(InMemorySettingsStore::with_settings(StoreSettings {
            owner_number: "919876543210".to_string(),
            ..StoreSettings::default()
        }))
    }

    #[tokio::test]
    async fn alert_reaches_prefixed_owner_number() {
        let channel = Arc::new(RecordingChannel::default());
        let notifier = OwnerNotifier::new(channel.clone(), settings_with_owner());

        notifier.alert("Customer waiting", AlertContext::default()).await;

        let sent = channel.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to.as_str(), "whatsapp:919876543210");
        assert!(sent[0].body.contains("Owner Alert"));
        assert!(sent[0].body.contains("Customer waiting"));
    }

    #[tokio::test]
    async fn unconfigured_owner_number_skips_send() {
        let channel = Arc::new(RecordingChannel::default());
        let notifier =
            OwnerNotifier::new(channel.clone(), Arc::new(InMemorySettingsStore::default()));

        notifier.alert("anyone there?", AlertContext::default()).await;

        assert!(channel.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn context_merges_instead_of_clobbering() {
        let settings = settings_with_owner();
        let notifier = OwnerNotifier::new(Arc::new(RecordingChannel::default()), settings.clone());
        let customer = CustomerId("whatsapp:+919000000001".to_string());

        notifier
            .alert(
                "chat request",
                AlertContext { customer: Some(customer.clone()), request_id: None },
            )
            .await;
        notifier
            .alert(
                "estimate",
                AlertContext { customer: None, request_id: Some(ApprovalId("req-9".to_string())) },
            )
            .await;

        let context = settings.owner_context().await.expect("context");
        assert_eq!(context.customer, Some(customer));
        assert_eq!(context.request_id, Some(ApprovalId("req-9".to_string())));

        // Settings writes elsewhere must not clear the context.
        settings.update(SettingsPatch::default()).await.expect("update");
        assert!(settings.owner_context().await.expect("context").customer.is_some());
    }
}
