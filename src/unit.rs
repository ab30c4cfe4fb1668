// Bookable units as served by the apartments endpoint
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// Identifiers arrive as JSON numbers from the backend and as strings from form
// fields, so both shapes are accepted and the string form is what gets sent back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(String);

impl UnitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for UnitId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for UnitId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for UnitId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UnitId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawId::deserialize(deserializer).map(|raw| Self(raw.into_string()))
    }
}

// Shared by every opaque identifier on the wire
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum RawId {
    Number(u64),
    Text(String),
}

impl RawId {
    pub(crate) fn into_string(self) -> String {
        match self {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

/// A bookable apartment listing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    #[serde(deserialize_with = "non_negative_price")]
    pub price_per_night: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    // Only some responses carry the occupancy limit
    #[serde(default, alias = "max_occupancy", skip_serializing_if = "Option::is_none")]
    pub max_guests: Option<u32>,
}

pub(crate) fn non_negative_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    let price = <Decimal as Deserialize>::deserialize(deserializer)?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(serde::de::Error::custom(format!("negative price: {price}")));
    }
    Ok(price)
}

impl Unit {
    pub fn new(id: impl Into<UnitId>, name: impl Into<String>, price_per_night: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price_per_night,
            image: None,
            max_guests: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_max_guests(mut self, max_guests: u32) -> Self {
        self.max_guests = Some(max_guests);
        self
    }

    pub fn price_tier(&self) -> PriceTier {
        PriceTier::of(self.price_per_night)
    }
}

/// Units offered when the catalog endpoint cannot be reached.
pub fn fallback_units() -> Vec<Unit> {
    vec![
        Unit::new(1u64, "2 Bedroom Luxury Apartment", Decimal::from(150_000))
            .with_image("media/IMG-20250918-WA0005.jpg"),
        Unit::new(2u64, "3 Bedroom Premium Apartment", Decimal::from(250_000))
            .with_image("media/IMG-20250918-WA0006.jpg"),
        Unit::new(3u64, "Deluxe Studio Apartment", Decimal::from(100_000))
            .with_image("media/IMG-20250918-WA0007.jpg"),
    ]
}

// Listing price bands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceTier {
    Low,
    Medium,
    High,
}

impl PriceTier {
    pub const LOW_CEILING: u32 = 100_000;
    pub const MEDIUM_CEILING: u32 = 200_000;

    pub fn of(price_per_night: Decimal) -> Self {
        if price_per_night <= Decimal::from(Self::LOW_CEILING) {
            PriceTier::Low
        } else if price_per_night <= Decimal::from(Self::MEDIUM_CEILING) {
            PriceTier::Medium
        } else {
            PriceTier::High
        }
    }

    pub fn matches(&self, unit: &Unit) -> bool {
        unit.price_tier() == *self
    }
}

pub fn filter_by_tier(units: &[Unit], tier: Option<PriceTier>) -> Vec<&Unit> {
    units
        .iter()
        .filter(|unit| tier.map_or(true, |t| t.matches(unit)))
        .collect()
}
