use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use aurum_core::domain::session::{CustomerId, Session, SessionMode};
use aurum_core::store::{CustomerStore, SessionStore};

use crate::notify::{AlertContext, OwnerNotifier};

/// Flips a customer between automated and human-operated mode.
///
/// The state machine's gate only ever reads mode; every write funnels
/// through here. Switching to agent disables the bot flag, marks the inbox
/// for owner action, and alerts the owner; switching back re-enables the
/// bot. Re-issuing the current mode is a no-op apart from the timestamp
/// refresh.
#[derive(Clone)]
pub struct HandoffController {
    sessions: Arc<dyn SessionStore>,
    customers: Arc<dyn CustomerStore>,
    notifier: OwnerNotifier,
}

impl HandoffController {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        customers: Arc<dyn CustomerStore>,
        notifier: OwnerNotifier,
    ) -> Self {
        Self { sessions, customers, notifier }
    }

    pub async fn set_mode(
        &self,
        customer: &CustomerId,
        mode: SessionMode,
        reason: &str,
        now: DateTime<Utc>,
    ) {
        let mut session = match self.sessions.find(customer).await {
            Ok(Some(session)) => session,
            Ok(None) => Session::new(customer.clone(), now),
            Err(error) => {
                warn!(customer = %customer, error = %error, "session read failed during handoff; starting fresh");
                Session::new(customer.clone(), now)
            }
        };
        session.mode = mode;
        session.updated_at = now;
        if let Err(error) = self.sessions.save(session).await {
            warn!(customer = %customer, error = %error, "session mode write failed");
        }

        let bot_enabled = mode == SessionMode::Bot;
        if let Err(error) = self.customers.set_handoff(customer, bot_enabled, Some(reason), now).await
        {
            warn!(customer = %customer, error = %error, "handoff flag write failed");
        }

        if mode == SessionMode::Agent {
            self.notifier
                .alert(
                    &format!("Customer {customer} wants to chat!\nReply to start chatting."),
                    AlertContext { customer: Some(customer.clone()), request_id: None },
                )
                .await;
        }
    }
}
