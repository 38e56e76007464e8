use serde::Deserialize;

/// One webhook delivery, already stripped of provider-specific framing.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct InboundDelivery {
    pub delivery_id: String,
    pub from: String,
    pub body: String,
}

/// Phone-style ids arrive in several shapes (`whatsapp:+9198...`, `+9198...`,
/// bare digits). Comparison keys on the last ten digits.
pub fn normalize_number(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let start = digits.len().saturating_sub(10);
    digits[start..].to_string()
}

/// Flexible owner match; an unconfigured owner number matches nobody.
pub fn is_owner(sender: &str, owner_number: &str) -> bool {
    if owner_number.trim().is_empty() {
        return false;
    }
    normalize_number(sender) == normalize_number(owner_number)
}

/// Outbound addresses carry the provider prefix exactly once.
pub fn with_channel_prefix(number: &str) -> String {
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{number}")
    }
}
