//! Pure transition logic: (session, input text) → (new session, replies,
//! side-effect requests). No IO happens here; the turn router owns rate
//! lookups, persistence, and sending.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::rates::Metal;
use crate::domain::session::{BuyFlow, FlowStep, ItemCategory, Session};
use crate::domain::settings::StoreSettings;
use crate::flows::classify::{classify, Intent, MenuChoice};
use crate::flows::texts;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub body: String,
    pub media_url: Option<String>,
}

impl Reply {
    pub fn text(body: impl Into<String>) -> Self {
        Self { body: body.into(), media_url: None }
    }

    pub fn with_media(body: impl Into<String>, media_url: impl Into<String>) -> Self {
        Self { body: body.into(), media_url: Some(media_url.into()) }
    }
}

/// Work the engine asks the turn router to perform after the transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnEffect {
    /// Switch the customer to agent mode and alert the owner.
    Handoff { reason: String },
    /// Price the collected buy flow, route it through the approval
    /// threshold, and persist the quote to inbox metadata.
    ComputeEstimate { metal: Metal, item: ItemCategory, grams: Decimal, budget: String },
    /// Record a trade-in inquiry on the inbox record.
    RecordExchange { metal: Metal },
    /// Tag the inbox record with the store-location intent.
    TagStoreLocation,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnOutcome {
    pub session: Session,
    pub replies: Vec<Reply>,
    pub effects: Vec<TurnEffect>,
}

impl TurnOutcome {
    fn new(session: Session) -> Self {
        Self { session, replies: Vec::new(), effects: Vec::new() }
    }

    fn reply(mut self, reply: Reply) -> Self {
        self.replies.push(reply);
        self
    }

    fn effect(mut self, effect: TurnEffect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Literal `"0"`: back to the menu with cleared flow data. Mode is left
/// untouched, so a handed-off conversation stays handed off.
pub fn hard_reset(session: &Session, now: DateTime<Utc>) -> TurnOutcome {
    let mut next = session.clone();
    next.step = FlowStep::Menu;
    next.buy_flow = BuyFlow::default();
    next.updated_at = now;
    TurnOutcome::new(next).reply(Reply::text(texts::welcome_menu()))
}

/// One automated turn. Callers have already handled owner commands, the
/// `"0"` override, and the handoff gate.
pub fn advance(
    session: &Session,
    input: &str,
    settings: &StoreSettings,
    now: DateTime<Utc>,
) -> TurnOutcome {
    let mut next = session.clone();
    next.updated_at = now;

    match classify(session.step, input) {
        Intent::HardReset => hard_reset(session, now),
        Intent::Greeting => {
            next.step = FlowStep::Menu;
            next.buy_flow = BuyFlow::default();
            TurnOutcome::new(next).reply(greeting_reply(settings))
        }
        Intent::Menu(choice) => menu_turn(next, choice, settings),
        Intent::Metal(metal) => metal_turn(next, metal),
        Intent::Item(item) => {
            next.buy_flow.item_type = Some(item);
            next.step = FlowStep::BuyGrams;
            TurnOutcome::new(next).reply(Reply::text(texts::grams_prompt(item)))
        }
        Intent::Grams(grams) => {
            next.buy_flow.grams = Some(grams);
            next.step = FlowStep::BuyBudget;
            TurnOutcome::new(next).reply(Reply::text(texts::budget_prompt()))
        }
        Intent::FreeText(text) => free_text_turn(next, text),
        Intent::Unrecognized => unrecognized_turn(next),
    }
}

fn greeting_reply(settings: &StoreSettings) -> Reply {
    let body = texts::welcome_menu();
    if settings.welcome_media_url.is_empty() {
        Reply::text(body)
    } else {
        Reply::with_media(body, settings.welcome_media_url.clone())
    }
}

fn menu_turn(mut next: Session, choice: MenuChoice, settings: &StoreSettings) -> TurnOutcome {
    match choice {
        MenuChoice::Buy => {
            next.step = FlowStep::BuyMetal;
            next.buy_flow = BuyFlow::default();
            TurnOutcome::new(next).reply(Reply::text(texts::buy_metal_prompt()))
        }
        MenuChoice::Exchange => {
            next.step = FlowStep::ExchangeMetal;
            next.buy_flow = BuyFlow::default();
            TurnOutcome::new(next).reply(Reply::text(texts::exchange_metal_prompt()))
        }
        MenuChoice::Agent => TurnOutcome::new(next)
            .reply(Reply::text(texts::handoff_ack()))
            .effect(TurnEffect::Handoff { reason: "customer asked for a sales expert".to_string() }),
        MenuChoice::Location => TurnOutcome::new(next)
            .reply(Reply::text(texts::location_reply(settings)))
            .effect(TurnEffect::TagStoreLocation),
    }
}

fn metal_turn(mut next: Session, metal: Metal) -> TurnOutcome {
    match next.step {
        FlowStep::ExchangeMetal => {
            next.buy_flow = BuyFlow { metal: Some(metal), ..BuyFlow::default() };
            next.step = FlowStep::ExchangeGrams;
            TurnOutcome::new(next).reply(Reply::text(texts::exchange_grams_prompt(metal)))
        }
        // Menu shortcut ("gold") and the BuyMetal step both land here.
        _ => {
            next.buy_flow = BuyFlow { metal: Some(metal), ..BuyFlow::default() };
            next.step = FlowStep::BuyItem;
            TurnOutcome::new(next).reply(Reply::text(texts::item_prompt(metal)))
        }
    }
}

fn free_text_turn(mut next: Session, text: String) -> TurnOutcome {
    match next.step {
        FlowStep::BuyBudget => {
            let Some(grams) = next.buy_flow.grams else {
                // Session drifted (grams never collected); recover via menu.
                next.step = FlowStep::Menu;
                return TurnOutcome::new(next).reply(Reply::text(texts::start_over()));
            };
            let metal = next.buy_flow.metal.unwrap_or(Metal::Gold);
            let item = next.buy_flow.item_type.unwrap_or(ItemCategory::Other);
            next.buy_flow.budget = Some(text.clone());
            next.step = FlowStep::Menu;
            TurnOutcome::new(next)
                .effect(TurnEffect::ComputeEstimate { metal, item, grams, budget: text })
        }
        FlowStep::ExchangeGrams => {
            let metal = next.buy_flow.metal.unwrap_or(Metal::Gold);
            next.step = FlowStep::Menu;
            TurnOutcome::new(next)
                .reply(Reply::text(texts::exchange_valuation_reply(metal)))
                .effect(TurnEffect::RecordExchange { metal })
        }
        _ => unrecognized_turn(next),
    }
}

fn unrecognized_turn(mut next: Session) -> TurnOutcome {
    match next.step {
        FlowStep::Menu => TurnOutcome::new(next).reply(Reply::text(texts::menu_reprompt())),
        FlowStep::BuyMetal | FlowStep::ExchangeMetal => {
            TurnOutcome::new(next).reply(Reply::text(texts::metal_reprompt()))
        }
        FlowStep::BuyGrams => TurnOutcome::new(next).reply(Reply::text(texts::grams_reprompt())),
        // Welcome and any state the storage layer no longer recognizes.
        _ => {
            next.step = FlowStep::Menu;
            TurnOutcome::new(next).reply(Reply::text(texts::start_over()))
        }
    }
}
