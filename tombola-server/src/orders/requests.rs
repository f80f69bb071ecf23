//! Order creation requests and their validation

use serde::Deserialize;
use shared::models::{MAX_COMBOS_COUNT, MAX_COMBO_SIZE};
use shared::{AppError, AppResult};

/// Buyer-facing order creation request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub event_id: String,
    pub offer_id: String,
    pub buyer_name: String,
    pub buyer_phone: String,
    #[serde(default)]
    pub buyer_email: Option<String>,
    /// Card delivery format, e.g. "digital"
    #[serde(default)]
    pub format: String,
    /// Vendor id or link token the buyer arrived with
    #[serde(default)]
    pub vendor_code: Option<String>,
    /// Client-supplied key for safe retries
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> AppResult<()> {
        require_non_empty("event_id", &self.event_id)?;
        require_non_empty("offer_id", &self.offer_id)?;
        require_non_empty("buyer_name", &self.buyer_name)?;
        validate_phone(&self.buyer_phone)?;
        validate_optional_email(self.buyer_email.as_deref())?;
        Ok(())
    }
}

/// Admin-created order, used at physical points of sale
///
/// Pricing and sizing come from the request instead of an offer; missing
/// values fall back to event defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ManualOrderRequest {
    pub event_id: String,
    pub buyer_name: String,
    pub buyer_phone: String,
    #[serde(default)]
    pub buyer_email: Option<String>,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub vendor_code: Option<String>,
    #[serde(default)]
    pub combos_count: Option<u32>,
    #[serde(default)]
    pub combo_size: Option<u32>,
    /// Amount collected, in minor currency units
    #[serde(default)]
    pub amount: Option<i64>,
}

impl ManualOrderRequest {
    pub fn validate(&self) -> AppResult<()> {
        require_non_empty("event_id", &self.event_id)?;
        require_non_empty("buyer_name", &self.buyer_name)?;
        validate_phone(&self.buyer_phone)?;
        validate_optional_email(self.buyer_email.as_deref())?;
        validate_quantity("combos_count", self.combos_count, MAX_COMBOS_COUNT)?;
        validate_quantity("combo_size", self.combo_size, MAX_COMBO_SIZE)?;
        Ok(())
    }
}

/// Quantity check: at least 1, bounded so `total_cards` can never overflow
fn validate_quantity(field: &str, value: Option<u32>, max: u32) -> AppResult<()> {
    match value {
        Some(0) => Err(AppError::validation(format!("{} must be at least 1", field))
            .with_detail("field", field)),
        Some(n) if n > max => Err(AppError::validation(format!("{} is too large", field))
            .with_detail("field", field)
            .with_detail("max", max)),
        _ => Ok(()),
    }
}

fn require_non_empty(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(
            AppError::validation(format!("{} is required", field)).with_detail("field", field)
        );
    }
    Ok(())
}

/// Phone check: 7 to 15 digits, separators ignored
fn validate_phone(phone: &str) -> AppResult<()> {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    let separators_only = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '+' | '.'));
    if (7..=15).contains(&digits) && separators_only {
        Ok(())
    } else {
        Err(AppError::validation("buyer_phone is not a valid phone number")
            .with_detail("field", "buyer_phone"))
    }
}

fn validate_optional_email(email: Option<&str>) -> AppResult<()> {
    let Some(email) = email.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(());
    };
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(AppError::validation("buyer_email is not a valid email address")
            .with_detail("field", "buyer_email"))
    }
}

/// Shape check only: `local@domain.tld`, no whitespace, tld of 2+
fn is_valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && tld.len() >= 2,
        None => false,
    }
}
