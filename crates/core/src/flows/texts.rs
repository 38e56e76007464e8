//! Customer-facing reply text. Kept in one module so wording changes never
//! touch transition logic.

use rust_decimal::Decimal;

use crate::domain::rates::Metal;
use crate::domain::session::ItemCategory;
use crate::domain::settings::StoreSettings;
use crate::pricing::format_inr;

pub fn welcome_menu() -> String {
    "💎 *Welcome to Aurum Jewels!*\n\n\
     How can I help you today?\n\n\
     1️⃣ *Buy Jewelry* (Gold/Silver/Platinum)\n\
     2️⃣ *Exchange Old Jewel*\n\
     3️⃣ *Talk to Sales Assistant*\n\
     4️⃣ *Store Location*"
        .to_string()
}

pub fn menu_reprompt() -> String {
    "Please select an option or type *Gold*, *Sales*, etc.".to_string()
}

pub fn buy_metal_prompt() -> String {
    "What would you like to buy?\n\nType *Gold* (a), *Silver* (b), or *Platinum* (c).".to_string()
}

pub fn exchange_metal_prompt() -> String {
    "What would you like to exchange?\n\nType *Gold*, *Silver*, or *Platinum*.".to_string()
}

pub fn metal_reprompt() -> String {
    "Please type *Gold*, *Silver*, or *Platinum*.".to_string()
}

pub fn item_prompt(metal: Metal) -> String {
    format!(
        "👍 *Buying {}*\n\n\
         What type of item?\n\
         1️⃣ *Ring*\n\
         2️⃣ *Necklace*\n\
         3️⃣ *Bangle*\n\
         4️⃣ *Earrings*\n\
         5️⃣ *Chain*\n\
         6️⃣ *Coin*\n\n\
         (Or describe it in your own words.)",
        metal.label()
    )
}

pub fn grams_prompt(item: ItemCategory) -> String {
    format!("👍 *{}*\n\nPlease enter the *weight (grams)*.", item.label())
}

pub fn grams_reprompt() -> String {
    "Please enter a valid number (e.g. 10).".to_string()
}

pub fn budget_prompt() -> String {
    "What is your approximate budget?".to_string()
}

pub fn estimate_reply(grams: Decimal, metal: Metal, price: Decimal) -> String {
    format!(
        "💰 *Estimate*\n\n\
         Based on today's rate, the approx cost for {grams}g {} is *{}*.\n\n\
         Visit our store to purchase!",
        metal.label(),
        format_inr(price)
    )
}

pub fn pending_approval_reply(grams: Decimal, metal: Metal, price: Decimal) -> String {
    format!(
        "✅ *Request Received for {grams}g {}*\n\n\
         Approx Value: ~{}\n\n\
         I have sent this to the owner for best price approval. I will confirm shortly!",
        metal.label(),
        format_inr(price)
    )
}

pub fn approved_price_notice(price: Decimal) -> String {
    format!(
        "🎉 *The owner has approved a special price for your request!*\n\n\
         Approx Estimate: {}\n\n\
         Visit our showroom today to finalize the design!",
        format_inr(price)
    )
}

pub fn exchange_grams_prompt(metal: Metal) -> String {
    format!("*{} Exchange*\n\nWhat is the approximate weight (grams)?", metal.label())
}

pub fn exchange_valuation_reply(metal: Metal) -> String {
    format!(
        "*{} Exchange Process*:\n\n\
         1. Purity Check\n\
         2. Net Weight\n\
         3. Valuation\n\n\
         Trade-in values are confirmed in store. Visit us for an exact valuation.",
        metal.label()
    )
}

pub fn location_reply(settings: &StoreSettings) -> String {
    format!(
        "📍 *Store Location*\n\n{}\n\n[Google Maps Link]({})",
        settings.store_location, settings.map_link
    )
}

pub fn handoff_ack() -> String {
    "👨‍💼 *Our sales expert will message you shortly.*".to_string()
}

pub fn start_over() -> String {
    "Type *Menu* to start over.".to_string()
}

pub fn nudge_reminder() -> String {
    "👋 *Just a gentle reminder!*\n\n\
     We are holding your special price estimate at our showroom. When can we expect you?"
        .to_string()
}
