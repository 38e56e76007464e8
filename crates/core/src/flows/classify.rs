//! Input classification. Maps normalized free text plus the current flow
//! position to an explicit intent, so transition logic never touches raw
//! string matching and new keywords can be added in one place.

use rust_decimal::Decimal;

use crate::domain::rates::Metal;
use crate::domain::session::{FlowStep, ItemCategory};

pub const GREETINGS: [&str; 5] = ["hi", "hello", "start", "menu", "reset"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Literal `"0"`: hard reset, honored even through the handoff gate.
    HardReset,
    Greeting,
    Menu(MenuChoice),
    Metal(Metal),
    Item(ItemCategory),
    Grams(Decimal),
    FreeText(String),
    Unrecognized,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuChoice {
    Buy,
    Exchange,
    Agent,
    Location,
}

pub fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}

pub fn is_greeting(normalized: &str) -> bool {
    GREETINGS.contains(&normalized)
}

pub fn detect_metal(normalized: &str) -> Option<Metal> {
    if normalized.contains("gold") || normalized.contains("22k") || normalized.contains("916") || normalized == "a" {
        return Some(Metal::Gold);
    }
    if normalized.contains("silver") || normalized.contains("925") || normalized == "b" {
        return Some(Metal::Silver);
    }
    if normalized.contains("platinum") || normalized.contains("pt") || normalized == "c" {
        return Some(Metal::Platinum);
    }
    None
}

pub fn menu_choice(normalized: &str) -> Option<MenuChoice> {
    if normalized.contains('1') || normalized.contains("buy") {
        Some(MenuChoice::Buy)
    } else if normalized.contains('2') || normalized.contains("exchange") {
        Some(MenuChoice::Exchange)
    } else if normalized.contains('3') || normalized.contains("sales") || normalized.contains("talk") {
        Some(MenuChoice::Agent)
    } else if normalized.contains('4') || normalized.contains("location") {
        Some(MenuChoice::Location)
    } else {
        None
    }
}

/// `earring` must be checked before `ring`; the taxonomy always resolves,
/// defaulting to `Other`.
pub fn detect_item(normalized: &str) -> ItemCategory {
    if normalized.contains("earring") || normalized == "4" {
        ItemCategory::Earrings
    } else if normalized.contains("ring") || normalized == "1" {
        ItemCategory::Ring
    } else if normalized.contains("necklace") || normalized == "2" {
        ItemCategory::Necklace
    } else if normalized.contains("bangle") || normalized == "3" {
        ItemCategory::Bangle
    } else if normalized.contains("chain") || normalized == "5" {
        ItemCategory::Chain
    } else if normalized.contains("coin") || normalized == "6" {
        ItemCategory::Coin
    } else {
        ItemCategory::Other
    }
}

/// Accepts `10`, `10.5`, `10g`, `10 g`; rejects zero, negatives, and
/// anything that does not parse.
pub fn parse_grams(normalized: &str) -> Option<Decimal> {
    let stripped = normalized.trim_end_matches('g').trim();
    let grams: Decimal = stripped.parse().ok()?;
    (grams > Decimal::ZERO).then_some(grams)
}

pub fn classify(step: FlowStep, raw: &str) -> Intent {
    let normalized = normalize(raw);

    if normalized == "0" {
        return Intent::HardReset;
    }
    if is_greeting(&normalized) {
        return Intent::Greeting;
    }

    match step {
        FlowStep::Menu => {
            if let Some(choice) = menu_choice(&normalized) {
                Intent::Menu(choice)
            } else if let Some(metal) = detect_metal(&normalized) {
                // "gold" straight from the menu starts the buy flow with the
                // metal pre-filled.
                Intent::Metal(metal)
            } else {
                Intent::Unrecognized
            }
        }
        FlowStep::BuyMetal | FlowStep::ExchangeMetal => match detect_metal(&normalized) {
            Some(metal) => Intent::Metal(metal),
            None => Intent::Unrecognized,
        },
        FlowStep::BuyItem => Intent::Item(detect_item(&normalized)),
        FlowStep::BuyGrams => match parse_grams(&normalized) {
            Some(grams) => Intent::Grams(grams),
            None => Intent::Unrecognized,
        },
        FlowStep::BuyBudget | FlowStep::ExchangeGrams => Intent::FreeText(raw.trim().to_string()),
        FlowStep::Welcome => Intent::Unrecognized,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::rates::Metal;
    use crate::domain::session::{FlowStep, ItemCategory};

    use super::{classify, detect_item, detect_metal, parse_grams, Intent, MenuChoice};

    #[test]
    fn metal_detection_accepts_letters_and_purity_aliases() {
        assert_eq!(detect_metal("a"), Some(Metal::Gold));
        assert_eq!(detect_metal("22k gold"), Some(Metal::Gold));
        assert_eq!(detect_metal("916"), Some(Metal::Gold));
        assert_eq!(detect_metal("b"), Some(Metal::Silver));
        assert_eq!(detect_metal("925 silver"), Some(Metal::Silver));
        assert_eq!(detect_metal("c"), Some(Metal::Platinum));
        assert_eq!(detect_metal("pt"), Some(Metal::Platinum));
        assert_eq!(detect_metal("diamond"), None);
    }

    #[test]
    fn item_detection_defaults_to_other() {
        assert_eq!(detect_item("ring"), ItemCategory::Ring);
        assert_eq!(detect_item("earrings please"), ItemCategory::Earrings);
        assert_eq!(detect_item("4"), ItemCategory::Earrings);
        assert_eq!(detect_item("1"), ItemCategory::Ring);
        assert_eq!(detect_item("something for my wife"), ItemCategory::Other);
    }

    #[test]
    fn grams_parser_requires_positive_numbers() {
        assert_eq!(parse_grams("10"), Some(Decimal::from(10)));
        assert_eq!(parse_grams("10g"), Some(Decimal::from(10)));
        assert_eq!(parse_grams("10 g"), Some(Decimal::from(10)));
        assert_eq!(parse_grams("10.5"), Some(Decimal::new(105, 1)));
        assert_eq!(parse_grams("0"), None);
        assert_eq!(parse_grams("-3"), None);
        assert_eq!(parse_grams("ten"), None);
    }

    #[test]
    fn zero_is_a_hard_reset_from_any_step() {
        for step in [FlowStep::Menu, FlowStep::BuyGrams, FlowStep::ExchangeMetal] {
            assert_eq!(classify(step, "0"), Intent::HardReset);
        }
    }

    #[test]
    fn greetings_classify_before_step_rules() {
        assert_eq!(classify(FlowStep::BuyGrams, "menu"), Intent::Greeting);
        assert_eq!(classify(FlowStep::Welcome, "Hi"), Intent::Greeting);
    }

    #[test]
    fn menu_routes_numbers_keywords_and_direct_metals() {
        assert_eq!(classify(FlowStep::Menu, "1"), Intent::Menu(MenuChoice::Buy));
        assert_eq!(classify(FlowStep::Menu, "exchange"), Intent::Menu(MenuChoice::Exchange));
        assert_eq!(classify(FlowStep::Menu, "talk to someone"), Intent::Menu(MenuChoice::Agent));
        assert_eq!(classify(FlowStep::Menu, "4"), Intent::Menu(MenuChoice::Location));
        assert_eq!(classify(FlowStep::Menu, "gold"), Intent::Metal(Metal::Gold));
        assert_eq!(classify(FlowStep::Menu, "??"), Intent::Unrecognized);
    }

    #[test]
    fn budget_step_passes_text_through_untrimmed_of_meaning() {
        assert_eq!(
            classify(FlowStep::BuyBudget, "  around 20000  "),
            Intent::FreeText("around 20000".to_string())
        );
    }
}
