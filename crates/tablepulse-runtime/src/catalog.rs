//! Fixed rosters and templates the simulator draws from.

use rand::Rng;
use tablepulse_types::{AlertCategory, Severity};

pub const CHEFS: [&str; 4] = ["Chef Marco", "Chef Aiko", "Chef Daniela", "Chef Omar"];

pub const SERVERS: [&str; 5] = ["Sarah", "Miguel", "Priya", "Jordan", "Elena"];

pub const INVENTORY_ITEMS: [&str; 5] = [
    "Atlantic salmon",
    "Ribeye steak",
    "Burrata",
    "Truffle oil",
    "House red wine",
];

/// Highest table number on the floor plan.
pub const TABLE_COUNT: u32 = 25;

/// Largest party the service stream reports.
pub const MAX_GUESTS: u32 = 6;

/// Sale amounts, in cents.
pub const MIN_SALE_CENTS: u64 = 5_000;
pub const MAX_SALE_CENTS: u64 = 25_000;

/// Alert shapes the feed can raise on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertTemplate {
    TableWait,
    KitchenStatus,
    LowInventory,
}

/// Rendered alert body, before ids and timestamps are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDraft {
    pub severity: Severity,
    pub category: AlertCategory,
    pub title: String,
    pub message: String,
}

impl AlertTemplate {
    pub const ALL: [AlertTemplate; 3] = [
        AlertTemplate::TableWait,
        AlertTemplate::KitchenStatus,
        AlertTemplate::LowInventory,
    ];

    pub fn severity(self) -> Severity {
        match self {
            AlertTemplate::TableWait | AlertTemplate::LowInventory => Severity::Warning,
            AlertTemplate::KitchenStatus => Severity::Info,
        }
    }

    pub fn category(self) -> AlertCategory {
        match self {
            AlertTemplate::TableWait => AlertCategory::Service,
            AlertTemplate::KitchenStatus => AlertCategory::Kitchen,
            AlertTemplate::LowInventory => AlertCategory::Inventory,
        }
    }

    /// Fill in the template's variable parts.
    pub fn render<R: Rng>(self, rng: &mut R) -> AlertDraft {
        let (title, message) = match self {
            AlertTemplate::TableWait => {
                let table = rng.gen_range(1..=TABLE_COUNT);
                let minutes = rng.gen_range(15..=30);
                (
                    "Long wait time".to_string(),
                    format!("Table {table} has been waiting {minutes} minutes"),
                )
            }
            AlertTemplate::KitchenStatus => (
                "Kitchen status".to_string(),
                "Grill station is running at full capacity".to_string(),
            ),
            AlertTemplate::LowInventory => {
                let item = pick(rng, &INVENTORY_ITEMS);
                let portions = rng.gen_range(2..=8);
                (
                    "Low inventory".to_string(),
                    format!("{item} is running low ({portions} portions left)"),
                )
            }
        };
        AlertDraft {
            severity: self.severity(),
            category: self.category(),
            title,
            message,
        }
    }
}

/// Uniform choice from a non-empty fixed array.
pub fn pick<R: Rng, T: Copy, const N: usize>(rng: &mut R, items: &[T; N]) -> T {
    items[rng.gen_range(0..N)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn templates_carry_fixed_severity_and_category() {
        let mut rng = StdRng::seed_from_u64(1);
        for template in AlertTemplate::ALL {
            let draft = template.render(&mut rng);
            assert_eq!(draft.severity, template.severity());
            assert_eq!(draft.category, template.category());
            assert!(!draft.title.is_empty());
            assert!(!draft.message.is_empty());
        }
    }

    #[test]
    fn table_wait_mentions_a_table_on_the_floor() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let draft = AlertTemplate::TableWait.render(&mut rng);
            let table: u32 = draft
                .message
                .split_whitespace()
                .nth(1)
                .and_then(|t| t.parse().ok())
                .expect("message names a table");
            assert!((1..=TABLE_COUNT).contains(&table));
        }
    }

    #[test]
    fn pick_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            assert!(SERVERS.contains(&pick(&mut rng, &SERVERS)));
        }
    }
}
