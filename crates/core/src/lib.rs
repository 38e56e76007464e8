pub mod channel;
pub mod clock;
pub mod config;
pub mod domain;
pub mod flows;
pub mod pricing;
pub mod store;

pub use channel::{ChannelError, MessageChannel, NoopMessageChannel, OutboundMessage};
pub use clock::{Clock, SystemClock};
pub use domain::approval::{ApprovalId, ApprovalKind, ApprovalRequest, ApprovalStatus};
pub use domain::customer::{InboxPatch, InboxRecord};
pub use domain::message::MessageRecord;
pub use domain::rates::{FixedRateProvider, Metal, RateOrigin, RateProvider, RateSnapshot};
pub use domain::session::{BuyFlow, CustomerId, FlowStep, ItemCategory, Session, SessionMode};
pub use domain::settings::{ManualRates, OwnerContext, SettingsPatch, StoreSettings};
pub use flows::{advance, classify, hard_reset, Intent, MenuChoice, Reply, TurnEffect, TurnOutcome};
pub use store::{
    ApprovalStore, CustomerStore, MessageStore, SessionStore, SettingsStore, StoreError,
};
