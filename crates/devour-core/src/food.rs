//! Food items placed on the table

use crate::{
    image_uri::resolve_image_uri,
    messages::{Language, Message},
    token::TokenAccountRecord,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Foods keep this far (in percent) from the table edge
const EDGE_MARGIN: f64 = 10.0;

/// Size range of token foods in pixels
const TOKEN_FOOD_SIZE: std::ops::Range<u32> = 50..80;

/// Decorative food types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoodKind {
    Burger,
    Pizza,
    Fries,
    Sushi,
    Cake,
    IceCream,
}

impl FoodKind {
    pub const ALL: [FoodKind; 6] = [
        FoodKind::Burger,
        FoodKind::Pizza,
        FoodKind::Fries,
        FoodKind::Sushi,
        FoodKind::Cake,
        FoodKind::IceCream,
    ];

    /// Display name in `language`
    pub fn name(self, language: Language) -> String {
        Message::FoodName(self).text(language)
    }

    pub fn image(self) -> &'static str {
        match self {
            FoodKind::Burger => "/burger.png",
            FoodKind::Pizza => "/pizza.png",
            FoodKind::Fries => "/fries.png",
            FoodKind::Sushi => "/sushi.png",
            FoodKind::Cake => "/cake.png",
            FoodKind::IceCream => "/ice-cream.png",
        }
    }

    /// Size range in pixels, upper bound exclusive
    pub fn size_range(self) -> std::ops::Range<u32> {
        match self {
            FoodKind::Burger | FoodKind::Cake => 60..80,
            FoodKind::Pizza => 70..90,
            FoodKind::Fries | FoodKind::IceCream => 50..70,
            FoodKind::Sushi => 40..60,
        }
    }
}

/// What a food item stands for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FoodSource {
    Token { address: String, mint: String },
    Decorative(FoodKind),
}

/// Position in percent of the table size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: u64,
    pub name: String,
    /// Resolved, directly fetchable image URI
    pub image_uri: String,
    pub position: Position,
    pub size: u32,
    pub rotation_degrees: f64,
    pub is_being_consumed: bool,
    pub source: FoodSource,
}

impl FoodItem {
    pub fn token_address(&self) -> Option<&str> {
        match &self.source {
            FoodSource::Token { address, .. } => Some(address),
            FoodSource::Decorative(_) => None,
        }
    }

    /// Refresh display fields from a newer record, keeping layout and latch
    pub fn update_from(&mut self, record: &TokenAccountRecord) {
        self.name.clone_from(&record.metadata.name);
        self.image_uri = resolve_image_uri(&record.metadata.image_uri);
    }
}

fn random_position<R: Rng + ?Sized>(rng: &mut R) -> Position {
    Position {
        x: rng.gen_range(EDGE_MARGIN..100.0 - EDGE_MARGIN),
        y: rng.gen_range(EDGE_MARGIN..100.0 - EDGE_MARGIN),
    }
}

pub fn token_food<R: Rng + ?Sized>(rng: &mut R, id: u64, record: &TokenAccountRecord) -> FoodItem {
    FoodItem {
        id,
        name: record.metadata.name.clone(),
        image_uri: resolve_image_uri(&record.metadata.image_uri),
        position: random_position(rng),
        size: rng.gen_range(TOKEN_FOOD_SIZE),
        rotation_degrees: rng.gen_range(0.0..360.0),
        is_being_consumed: false,
        source: FoodSource::Token {
            address: record.address.clone(),
            mint: record.mint.clone(),
        },
    }
}

/// Records worth a food: nonzero balance, capped at `limit`, in order
pub fn edible_records(
    records: &[TokenAccountRecord],
    limit: usize,
) -> impl Iterator<Item = &TokenAccountRecord> {
    records.iter().filter(|record| record.has_balance()).take(limit)
}

/// Random decorative foods with no on-chain counterpart
pub fn decorative_foods<R: Rng + ?Sized>(
    rng: &mut R,
    next_id: &mut u64,
    count: usize,
    language: Language,
) -> Vec<FoodItem> {
    (0..count)
        .map(|_| {
            let kind = FoodKind::ALL[rng.gen_range(0..FoodKind::ALL.len())];
            let food = FoodItem {
                id: *next_id,
                name: kind.name(language),
                image_uri: kind.image().to_string(),
                position: random_position(rng),
                size: rng.gen_range(kind.size_range()),
                rotation_degrees: rng.gen_range(0.0..360.0),
                is_being_consumed: false,
                source: FoodSource::Decorative(kind),
            };
            *next_id += 1;
            food
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{RawTokenAccount, DEFAULT_TOKEN_ICON};
    use rand::{rngs::StdRng, SeedableRng};

    fn record(address: &str, amount: &str) -> TokenAccountRecord {
        TokenAccountRecord::from_raw(RawTokenAccount {
            address: address.to_string(),
            mint: format!("{address}Mint"),
            amount: amount.to_string(),
            decimals: 0,
            ui_amount: None,
        })
    }

    #[test]
    fn test_zero_balance_excluded() {
        let records = vec![
            record("a", "5"),
            record("b", "0"),
            record("c", "1"),
            record("d", "100"),
        ];

        let addresses: Vec<_> = edible_records(&records, 10)
            .map(|record| record.address.as_str())
            .collect();

        assert_eq!(addresses, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_token_food_limit_and_layout() {
        let mut rng = StdRng::seed_from_u64(1);
        let records: Vec<_> = (0..20).map(|i| record(&format!("acct{i}"), "1")).collect();

        let foods: Vec<_> = edible_records(&records, 5)
            .zip(10..)
            .map(|(record, id)| token_food(&mut rng, id, record))
            .collect();
        assert_eq!(foods.len(), 5);
        assert_eq!(foods[0].id, 10);
        assert_eq!(foods[4].token_address(), Some("acct4"));
        for food in &foods {
            assert!((10.0..90.0).contains(&food.position.x));
            assert!((10.0..90.0).contains(&food.position.y));
            assert!((50..80).contains(&food.size));
            assert!((0.0..360.0).contains(&food.rotation_degrees));
            assert!(!food.is_being_consumed);
            assert_eq!(food.image_uri, DEFAULT_TOKEN_ICON);
        }
    }

    #[test]
    fn test_decorative_sizes_within_kind_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut next_id = 0;

        let foods = decorative_foods(&mut rng, &mut next_id, 200, Language::En);
        assert_eq!(foods.len(), 200);
        for food in &foods {
            let FoodSource::Decorative(kind) = food.source else {
                panic!("expected decorative food");
            };
            assert!(kind.size_range().contains(&food.size));
            assert_eq!(food.image_uri, kind.image());
            assert_eq!(food.name, kind.name(Language::En));
            assert!(food.token_address().is_none());
        }
        assert_eq!(next_id, 200);
    }

    #[test]
    fn test_decorative_names_default_to_chinese() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut next_id = 0;
        let chinese = ["汉堡", "披萨", "薯条", "寿司", "蛋糕", "冰淇淋"];

        let foods = decorative_foods(&mut rng, &mut next_id, 30, Language::default());
        assert!(foods.iter().all(|food| chinese.contains(&food.name.as_str())));
    }
}
