//! Normalized token account records

use serde::{Deserialize, Serialize};

/// Inline SVG shown when a token has no usable image
pub const DEFAULT_TOKEN_ICON: &str = "data:image/svg+xml;base64,PHN2ZyB3aWR0aD0iMjQiIGhlaWdodD0iMjQiIHZpZXdCb3g9IjAgMCAyNCAyNCIgZmlsbD0ibm9uZSIgeG1sbnM9Imh0dHA6Ly93d3cudzMub3JnLzIwMDAvc3ZnIj48cGF0aCBkPSJNMTIgMjRDMTguNjI3NCAyNCAyNCAxOC42Mjc0IDI0IDEyQzI0IDUuMzcyNTggMTguNjI3NCAwIDEyIDBDNS4zNzI1OCAwIDAgNS4zNzI1OCAwIDEyQzAgMTguNjI3NCA1LjM3MjU4IDI0IDEyIDI0WiIgZmlsbD0iI0Q5RDlEOSIvPjx0ZXh0IHg9IjUwJSIgeT0iNTAlIiBkb21pbmFudC1iYXNlbGluZT0ibWlkZGxlIiB0ZXh0LWFuY2hvcj0ibWlkZGxlIiBmb250LXNpemU9IjE2IiBmaWxsPSIjNjY2NjY2Ij4/PC90ZXh0Pjwvc3ZnPg==";

/// Name used when the metadata service knows the asset but not its name
pub const UNKNOWN_TOKEN_NAME: &str = "unknown token";

/// Display metadata attached to a token account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub image_uri: String,
}

impl TokenMetadata {
    /// Placeholder derived from a truncated mint address
    pub fn placeholder(mint: &str) -> Self {
        Self {
            name: format!("{UNKNOWN_TOKEN_NAME} ({})", abbreviate(mint)),
            image_uri: DEFAULT_TOKEN_ICON.to_string(),
        }
    }
}

/// Raw token account as reported by the RPC node
#[derive(Debug, Clone, PartialEq)]
pub struct RawTokenAccount {
    pub address: String,
    pub mint: String,
    pub amount: String,
    pub decimals: u8,
    pub ui_amount: Option<f64>,
}

/// One token account owned by the connected wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenAccountRecord {
    /// The token account's own address
    pub address: String,
    pub mint: String,
    /// Integer amount as a decimal string
    pub raw_amount: String,
    pub decimals: u8,
    /// Display only. Transaction logic uses `raw_amount`.
    pub ui_amount: f64,
    pub metadata: TokenMetadata,
}

impl TokenAccountRecord {
    pub fn from_raw(raw: RawTokenAccount) -> Self {
        let ui_amount = raw
            .ui_amount
            .unwrap_or_else(|| ui_amount(&raw.amount, raw.decimals));
        let metadata = TokenMetadata::placeholder(&raw.mint);

        Self {
            address: raw.address,
            mint: raw.mint,
            raw_amount: raw.amount,
            decimals: raw.decimals,
            ui_amount,
            metadata,
        }
    }

    /// Whether the account holds a nonzero balance
    pub fn has_balance(&self) -> bool {
        match self.raw_amount.parse::<u128>() {
            Ok(amount) => amount > 0,
            Err(_) => self.ui_amount > 0.0,
        }
    }
}

/// `ABCD...WXYZ` form of an address
pub fn abbreviate(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 8 {
        return address.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

fn ui_amount(raw: &str, decimals: u8) -> f64 {
    let amount = raw.parse::<f64>().unwrap_or(0.0);
    amount / 10f64.powi(i32::from(decimals))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(amount: &str, decimals: u8, ui: Option<f64>) -> RawTokenAccount {
        RawTokenAccount {
            address: "Acct1111111111111111111111111111111111111111".to_string(),
            mint: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
            amount: amount.to_string(),
            decimals,
            ui_amount: ui,
        }
    }

    #[test]
    fn test_placeholder_name() {
        let meta = TokenMetadata::placeholder("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");
        assert_eq!(meta.name, "unknown token (EPjF...Dt1v)");
        assert_eq!(meta.image_uri, DEFAULT_TOKEN_ICON);
    }

    #[test]
    fn test_abbreviate_short_address() {
        assert_eq!(abbreviate("abc"), "abc");
        assert_eq!(abbreviate("abcdefghij"), "abcd...ghij");
    }

    #[test]
    fn test_ui_amount_computed_when_missing() {
        let record = TokenAccountRecord::from_raw(raw("1500000", 6, None));
        assert!((record.ui_amount - 1.5).abs() < f64::EPSILON);
        assert_eq!(record.raw_amount, "1500000");
    }

    #[test]
    fn test_ui_amount_prefers_reported_value() {
        let record = TokenAccountRecord::from_raw(raw("42", 0, Some(42.0)));
        assert!((record.ui_amount - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_has_balance_uses_raw_amount() {
        assert!(TokenAccountRecord::from_raw(raw("1", 9, Some(0.0))).has_balance());
        assert!(!TokenAccountRecord::from_raw(raw("0", 9, Some(0.0))).has_balance());
    }
}
