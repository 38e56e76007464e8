pub mod approval;
pub mod customer;
pub mod message;
pub mod rates;
pub mod session;
pub mod settings;

pub use approval::{ApprovalId, ApprovalKind, ApprovalRequest, ApprovalStatus};
pub use customer::{InboxPatch, InboxRecord};
pub use message::MessageRecord;
pub use rates::{FixedRateProvider, Metal, RateOrigin, RateProvider, RateSnapshot};
pub use session::{BuyFlow, CustomerId, FlowStep, ItemCategory, Session, SessionMode};
pub use settings::{ManualRates, OwnerContext, SettingsPatch, StoreSettings};
