//! Textual request parsing
//!
//! Callers hand the engine plain strings (as they arrive in a request
//! body). Parsing turns them into typed requests, range-checking every
//! number against the configured limits and reporting all problems in a
//! single `Rejection`.

use crate::config::{AmountRange, EngineConfig, QuantityRange};
use esop_types::errors::{ExchangeError, Rejection};
use esop_types::numeric::{Amount, Price, Quantity};
use esop_types::order::{EsopClass, Side};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn blank(field: &str) -> ExchangeError {
    ExchangeError::invalid_field(field, "field is blank")
}

/// Parse a decimal integer and check it against `min..=max`
fn parse_bounded(
    field: &str,
    raw: Option<&str>,
    min: &BigUint,
    max: &BigUint,
    limits: &str,
) -> Result<BigUint, ExchangeError> {
    let text = present(raw).ok_or_else(|| blank(field))?;
    let out_of_limits = || ExchangeError::invalid_amount(field, format!("value not in {limits} limits of the system"));

    // A well-formed negative number is out of range rather than malformed
    if let Some(digits) = text.strip_prefix('-') {
        return if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            Err(out_of_limits())
        } else {
            Err(ExchangeError::invalid_amount(field, "not a valid number"))
        };
    }

    let value: Quantity = text
        .parse()
        .map_err(|_| ExchangeError::invalid_amount(field, "not a valid number"))?;
    let value = value.as_biguint();
    if value < min || value > max {
        return Err(out_of_limits());
    }
    Ok(value.clone())
}

/// Parse a currency amount within the wallet limits
pub fn parse_amount(field: &str, raw: Option<&str>, range: &AmountRange) -> Result<Amount, ExchangeError> {
    parse_bounded(field, raw, range.min.as_biguint(), range.max.as_biguint(), "wallet").map(Amount::from_biguint)
}

/// Parse a unit price; prices share the wallet limits
pub fn parse_price(field: &str, raw: Option<&str>, range: &AmountRange) -> Result<Price, ExchangeError> {
    parse_bounded(field, raw, range.min.as_biguint(), range.max.as_biguint(), "wallet").map(Price::from_biguint)
}

/// Parse a unit count within the inventory limits
pub fn parse_quantity(field: &str, raw: Option<&str>, range: &QuantityRange) -> Result<Quantity, ExchangeError> {
    parse_bounded(field, raw, range.min.as_biguint(), range.max.as_biguint(), "inventory")
        .map(Quantity::from_biguint)
}

/// Accepts `PERFORMANCE`, `NORMAL` and the legacy `NON_PERFORMANCE`
pub fn parse_esop_class(raw: &str) -> Option<EsopClass> {
    match raw.trim() {
        "PERFORMANCE" => Some(EsopClass::PERFORMANCE),
        "NORMAL" | "NON_PERFORMANCE" => Some(EsopClass::NORMAL),
        _ => None,
    }
}

/// A validated order placement request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub side: Side,
    /// Class offered by a SELL; always NORMAL for a BUY
    pub esop_class: EsopClass,
    pub quantity: Quantity,
    pub price: Price,
}

impl OrderRequest {
    pub fn buy(quantity: Quantity, price: Price) -> Self {
        Self {
            side: Side::BUY,
            esop_class: EsopClass::NORMAL,
            quantity,
            price,
        }
    }

    pub fn sell(esop_class: EsopClass, quantity: Quantity, price: Price) -> Self {
        Self {
            side: Side::SELL,
            esop_class,
            quantity,
            price,
        }
    }

    /// Validate raw order fields
    ///
    /// A SELL must name its class; a BUY must not.
    pub fn parse(
        side: Option<&str>,
        quantity: Option<&str>,
        price: Option<&str>,
        esop_type: Option<&str>,
        config: &EngineConfig,
    ) -> Result<Self, Rejection> {
        let mut errors = Vec::new();

        let side = match present(side) {
            None => {
                errors.push(blank("type"));
                None
            }
            Some("BUY") => Some(Side::BUY),
            Some("SELL") => Some(Side::SELL),
            Some(_) => {
                errors.push(ExchangeError::invalid_field("type", "order type must be of type buy or sell"));
                None
            }
        };

        let quantity = parse_quantity("quantity", quantity, &config.inventory_limit)
            .map_err(|e| errors.push(e))
            .ok();
        let price = parse_price("price", price, &config.wallet_limit)
            .map_err(|e| errors.push(e))
            .ok();

        let esop_class = match (side, esop_type) {
            (Some(Side::SELL), raw) => {
                let class = raw.and_then(parse_esop_class);
                if class.is_none() {
                    errors.push(ExchangeError::invalid_field(
                        "esopType",
                        "sell order needs to have esopType with value PERFORMANCE or NON_PERFORMANCE",
                    ));
                }
                class
            }
            (Some(Side::BUY), Some(_)) => {
                errors.push(ExchangeError::invalid_field("esopType", "buy order need not have esopType field"));
                None
            }
            (Some(Side::BUY), None) => Some(EsopClass::NORMAL),
            (None, _) => None,
        };

        match (side, esop_class, quantity, price) {
            (Some(side), Some(esop_class), Some(quantity), Some(price)) if errors.is_empty() => Ok(Self {
                side,
                esop_class,
                quantity,
                price,
            }),
            _ => Err(Rejection::new(errors)),
        }
    }
}

/// Raw order body as received from a client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequestBody {
    #[serde(rename = "type")]
    pub order_type: Option<String>,
    pub quantity: Option<String>,
    pub price: Option<String>,
    pub esop_type: Option<String>,
}

impl OrderRequestBody {
    pub fn validate(&self, config: &EngineConfig) -> Result<OrderRequest, Rejection> {
        OrderRequest::parse(
            self.order_type.as_deref(),
            self.quantity.as_deref(),
            self.price.as_deref(),
            self.esop_type.as_deref(),
            config,
        )
    }
}

/// A validated inventory addition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryRequest {
    pub quantity: Quantity,
    pub esop_class: EsopClass,
}

impl InventoryRequest {
    /// Validate raw inventory fields; the class defaults to NORMAL
    pub fn parse(quantity: Option<&str>, esop_type: Option<&str>, config: &EngineConfig) -> Result<Self, Rejection> {
        let mut errors = Vec::new();

        let quantity = parse_quantity("quantity", quantity, &config.inventory_limit)
            .map_err(|e| errors.push(e))
            .ok();
        let esop_class = match esop_type {
            None => Some(EsopClass::NORMAL),
            Some(raw) => {
                let class = parse_esop_class(raw);
                if class.is_none() {
                    errors.push(ExchangeError::invalid_field(
                        "type",
                        "type can be PERFORMANCE or NON_PERFORMANCE",
                    ));
                }
                class
            }
        };

        match (quantity, esop_class) {
            (Some(quantity), Some(esop_class)) if errors.is_empty() => Ok(Self { quantity, esop_class }),
            _ => Err(Rejection::new(errors)),
        }
    }
}
