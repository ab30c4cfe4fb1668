// Page configuration embedded in the rendered booking page
// The server renders the nightly price, the guest limit and a JSON map of
// apartments as attributes; this reads them back out of the markup.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::unit::{Unit, UnitId};

#[derive(Error, Debug)]
pub enum MarkupError {
    #[error("Markup parse error at position {position}: {message}")]
    Parse { position: u64, message: String },

    #[error("Invalid value for {attribute}: {value:?}")]
    InvalidAttribute { attribute: &'static str, value: String },

    #[error("Invalid apartments data: {0}")]
    ApartmentsJson(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageConfig {
    pub price_per_night: Option<Decimal>,
    pub max_guests: Option<u32>,
    pub embedded_units: Vec<Unit>,
}

// One entry of the data-apartments attribute
#[derive(Debug, Deserialize)]
struct EmbeddedApartment {
    name: String,
    #[serde(deserialize_with = "crate::unit::non_negative_price")]
    price: Decimal,
    #[serde(default)]
    image_url: Option<String>,
}

impl PageConfig {
    pub fn from_markup(markup: &str) -> Result<Self, MarkupError> {
        let mut config = PageConfig::default();
        let mut reader = Reader::from_str(markup);
        // Rendered HTML is not XML: void elements are never closed
        reader.config_mut().check_end_names = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => config.read_element(&e)?,
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(MarkupError::Parse {
                        position: reader.error_position(),
                        message: e.to_string(),
                    })
                }
                _ => (),
            }
        }

        debug!(
            price_per_night = ?config.price_per_night,
            max_guests = ?config.max_guests,
            embedded_units = config.embedded_units.len(),
            "read page configuration"
        );
        Ok(config)
    }

    fn read_element(&mut self, element: &BytesStart<'_>) -> Result<(), MarkupError> {
        let mut is_guests_input = false;
        let mut max = None;

        for attribute in element.html_attributes().flatten() {
            let value = attribute
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attribute.value).into_owned());

            match attribute.key.as_ref() {
                b"data-price-per-night" => {
                    let price = Decimal::from_str(value.trim()).map_err(|_| {
                        MarkupError::InvalidAttribute {
                            attribute: "data-price-per-night",
                            value: value.clone(),
                        }
                    })?;
                    self.price_per_night = Some(price);
                }
                b"data-apartments" => {
                    self.embedded_units = parse_embedded_units(&value)?;
                }
                b"id" | b"name" if value == "guests" => is_guests_input = true,
                b"max" => max = Some(value),
                _ => (),
            }
        }

        if let (true, Some(max)) = (is_guests_input, max) {
            let parsed = max.trim().parse::<u32>().map_err(|_| MarkupError::InvalidAttribute {
                attribute: "max",
                value: max.clone(),
            })?;
            self.max_guests = Some(parsed);
        }
        Ok(())
    }
}

fn parse_embedded_units(json: &str) -> Result<Vec<Unit>, MarkupError> {
    let apartments: BTreeMap<String, EmbeddedApartment> = serde_json::from_str(json)?;
    let mut units: Vec<Unit> = apartments
        .into_iter()
        .map(|(id, apartment)| Unit {
            id: UnitId::new(id),
            name: apartment.name,
            price_per_night: apartment.price,
            image: apartment.image_url.filter(|url| !url.is_empty()),
            max_guests: None,
        })
        .collect();
    // Numeric ids sort numerically, anything else keeps map order after them
    units.sort_by_key(|unit| unit.id.as_str().parse::<u64>().unwrap_or(u64::MAX));
    Ok(units)
}
