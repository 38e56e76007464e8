use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::approval::ApprovalId;
use crate::domain::rates::Metal;
use crate::domain::session::CustomerId;

/// Operator-configured per-gram rates. Zero means "not set"; a positive
/// value replaces the fetched rate for that metal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualRates {
    pub gold: Decimal,
    pub silver: Decimal,
    pub platinum: Decimal,
}

impl ManualRates {
    pub fn for_metal(&self, metal: Metal) -> Decimal {
        match metal {
            Metal::Gold => self.gold,
            Metal::Silver => self.silver,
            Metal::Platinum => self.platinum,
        }
    }

    pub fn any_set(&self) -> bool {
        self.gold > Decimal::ZERO || self.silver > Decimal::ZERO || self.platinum > Decimal::ZERO
    }
}

/// Runtime store configuration, editable from the operator surface and the
/// owner's chat commands. Persisted in the `settings` partition, unlike
/// `AppConfig` which is process-level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    pub store_location: String,
    pub map_link: String,
    pub owner_number: String,
    pub welcome_media_url: String,
    pub approval_threshold: Decimal,
    pub manual_rates: ManualRates,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            store_location: "123 Gold Street, Market City, Chennai".to_string(),
            map_link: "https://maps.google.com/?q=Aurum+Showroom".to_string(),
            owner_number: String::new(),
            welcome_media_url: String::new(),
            approval_threshold: Decimal::from(20_000),
            manual_rates: ManualRates::default(),
        }
    }
}

/// Partial settings update; `None` fields keep their stored value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SettingsPatch {
    pub store_location: Option<String>,
    pub map_link: Option<String>,
    pub owner_number: Option<String>,
    pub welcome_media_url: Option<String>,
    pub approval_threshold: Option<Decimal>,
    pub manual_gold: Option<Decimal>,
    pub manual_silver: Option<Decimal>,
    pub manual_platinum: Option<Decimal>,
}

impl SettingsPatch {
    pub fn apply_to(&self, settings: &mut StoreSettings) {
        if let Some(store_location) = &self.store_location {
            settings.store_location = store_location.clone();
        }
        if let Some(map_link) = &self.map_link {
            settings.map_link = map_link.clone();
        }
        if let Some(owner_number) = &self.owner_number {
            settings.owner_number = owner_number.clone();
        }
        if let Some(welcome_media_url) = &self.welcome_media_url {
            settings.welcome_media_url = welcome_media_url.clone();
        }
        if let Some(approval_threshold) = self.approval_threshold {
            settings.approval_threshold = approval_threshold;
        }
        if let Some(gold) = self.manual_gold {
            settings.manual_rates.gold = gold;
        }
        if let Some(silver) = self.manual_silver {
            settings.manual_rates.silver = silver;
        }
        if let Some(platinum) = self.manual_platinum {
            settings.manual_rates.platinum = platinum;
        }
    }
}

/// Last customer / approval request the owner was notified about, so owner
/// shorthand commands ("approve 15000", bare "reply") have a target.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerContext {
    pub customer: Option<CustomerId>,
    pub request_id: Option<ApprovalId>,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{SettingsPatch, StoreSettings};

    #[test]
    fn patch_merges_only_present_fields() {
        let mut settings = StoreSettings::default();
        let patch = SettingsPatch {
            approval_threshold: Some(Decimal::from(50_000)),
            manual_gold: Some(Decimal::from(7800)),
            ..SettingsPatch::default()
        };

        patch.apply_to(&mut settings);

        assert_eq!(settings.approval_threshold, Decimal::from(50_000));
        assert_eq!(settings.manual_rates.gold, Decimal::from(7800));
        assert_eq!(settings.manual_rates.silver, Decimal::ZERO);
        assert_eq!(settings.store_location, StoreSettings::default().store_location);
    }
}
