//! Payment card payload.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Card record stored as JSON in the `data` of a `card` secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub number: String,
    pub holder: String,
    /// Expiry as `MM/YY`.
    pub expires: String,
    pub cvc: String,
}

impl Card {
    /// Build a card, normalising the number and validating every field.
    pub fn new(
        number: &str,
        holder: impl Into<String>,
        expires: impl Into<String>,
        cvc: impl Into<String>,
    ) -> Result<Self> {
        let card = Self {
            number: number.chars().filter(|c| !c.is_whitespace() && *c != '-').collect(),
            holder: holder.into(),
            expires: expires.into(),
            cvc: cvc.into(),
        };
        card.validate()?;
        Ok(card)
    }

    /// Check number (Luhn), expiry format and CVC.
    pub fn validate(&self) -> Result<()> {
        if !luhn_valid(&self.number) {
            return Err(Error::InvalidCard("card number fails checksum".into()));
        }
        if !expiry_valid(&self.expires) {
            return Err(Error::InvalidCard(format!(
                "expiry '{}' is not MM/YY",
                self.expires
            )));
        }
        if !(3..=4).contains(&self.cvc.len()) || !self.cvc.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::InvalidCard("cvc must be 3 or 4 digits".into()));
        }
        Ok(())
    }

    /// Serialize into a secret payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a secret payload.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Number with all but the last four digits masked.
    pub fn masked_number(&self) -> String {
        let total = self.number.chars().count();
        let hidden = total.saturating_sub(4);
        let tail: String = self.number.chars().skip(hidden).collect();
        format!("{}{}", "*".repeat(hidden), tail)
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Card")
            .field("number", &self.masked_number())
            .field("holder", &self.holder)
            .field("expires", &self.expires)
            .field("cvc", &"***")
            .finish()
    }
}

fn luhn_valid(number: &str) -> bool {
    if number.len() < 12 || number.len() > 19 {
        return false;
    }

    let mut sum = 0u32;
    for (i, c) in number.chars().rev().enumerate() {
        let Some(mut digit) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    sum % 10 == 0
}

fn expiry_valid(expires: &str) -> bool {
    let Some((month, year)) = expires.split_once('/') else {
        return false;
    };
    if month.len() != 2 || year.len() != 2 || !year.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    matches!(month.parse::<u8>(), Ok(1..=12))
}
