//! Live-operations records.
//!
//! Every record serialises with camelCase field names so that a snapshot can
//! be pushed verbatim to a browser dashboard.

use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Kitchen orders
// ---------------------------------------------------------------------------

/// Preparation stage of a [`KitchenOrder`].
///
/// Variants are declared in pipeline order, so `Ord` compares progress:
/// an order's status may only ever increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Cooking,
    Plating,
    Ready,
}

impl OrderStatus {
    /// `true` while the order still accrues elapsed time.
    pub fn is_active(self) -> bool {
        !matches!(self, OrderStatus::Ready)
    }

    /// `true` for the two stages where the line is physically working on it.
    pub fn is_in_progress(self) -> bool {
        matches!(self, OrderStatus::Cooking | OrderStatus::Plating)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    High,
}

/// A unit of food preparation in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KitchenOrder {
    pub id: String,
    pub table: u32,
    pub items: Vec<String>,
    pub order_time: String,
    #[serde(default)]
    pub cook_time: Option<String>,
    pub estimated_time_minutes: u32,
    pub elapsed_minutes: u32,
    pub status: OrderStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub chef: Option<String>,
    #[serde(default)]
    pub temperature: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Service updates
// ---------------------------------------------------------------------------

/// Front-of-house actions reported on the service stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceAction {
    OrderDelivered,
    TableCleared,
    WalkInSeated,
    DrinksRefilled,
    CheckRequested,
}

impl ServiceAction {
    pub const ALL: [ServiceAction; 5] = [
        ServiceAction::OrderDelivered,
        ServiceAction::TableCleared,
        ServiceAction::WalkInSeated,
        ServiceAction::DrinksRefilled,
        ServiceAction::CheckRequested,
    ];

    /// Human-readable phrase used to build the entry message.
    pub fn describe(self) -> &'static str {
        match self {
            ServiceAction::OrderDelivered => "Order delivered",
            ServiceAction::TableCleared => "Table cleared and reset",
            ServiceAction::WalkInSeated => "Walk-in party seated",
            ServiceAction::DrinksRefilled => "Drinks refilled",
            ServiceAction::CheckRequested => "Check requested",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceUpdate {
    pub id: String,
    pub timestamp: String,
    pub action: ServiceAction,
    pub message: String,
    pub server: String,
    pub table: u32,
    pub guests: u32,
}

// ---------------------------------------------------------------------------
// Financial stream
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialKind {
    Sale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Cash,
    Mobile,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::Card,
        PaymentMethod::Cash,
        PaymentMethod::Mobile,
    ];
}

/// A money movement on the financial stream.
///
/// Amounts are held in cents so that revenue accumulation is exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialEvent {
    pub id: String,
    pub timestamp: String,
    pub kind: FinancialKind,
    pub amount_cents: u64,
    pub table: u32,
    pub payment_method: PaymentMethod,
    pub server: String,
}

impl FinancialEvent {
    pub fn amount(&self) -> f64 {
        self.amount_cents as f64 / 100.0
    }
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Service,
    Kitchen,
    Inventory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub timestamp: String,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub category: AlertCategory,
    pub acknowledged: bool,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Aggregate operating metrics for one feed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub current_revenue_cents: u64,
    pub orders_today: u32,
    pub avg_wait_time_minutes: f64,
    pub table_occupancy_pct: f64,
    pub kitchen_efficiency_pct: f64,
    pub customer_satisfaction: f64,
    pub staff_performance_pct: f64,
}

impl Metrics {
    pub const AVG_WAIT_TIME: RangeInclusive<f64> = 15.0..=45.0;
    pub const TABLE_OCCUPANCY: RangeInclusive<f64> = 50.0..=100.0;
    pub const KITCHEN_EFFICIENCY: RangeInclusive<f64> = 80.0..=100.0;
    pub const CUSTOMER_SATISFACTION: RangeInclusive<f64> = 4.0..=5.0;
    pub const STAFF_PERFORMANCE: RangeInclusive<f64> = 75.0..=100.0;

    pub fn current_revenue(&self) -> f64 {
        self.current_revenue_cents as f64 / 100.0
    }

    /// Pull every bounded metric back into its documented range.
    pub fn clamp_all(&mut self) {
        self.avg_wait_time_minutes = clamp(self.avg_wait_time_minutes, &Self::AVG_WAIT_TIME);
        self.table_occupancy_pct = clamp(self.table_occupancy_pct, &Self::TABLE_OCCUPANCY);
        self.kitchen_efficiency_pct = clamp(self.kitchen_efficiency_pct, &Self::KITCHEN_EFFICIENCY);
        self.customer_satisfaction =
            clamp(self.customer_satisfaction, &Self::CUSTOMER_SATISFACTION);
        self.staff_performance_pct = clamp(self.staff_performance_pct, &Self::STAFF_PERFORMANCE);
    }

    /// `true` when every bounded metric lies inside its range.
    pub fn within_bounds(&self) -> bool {
        Self::AVG_WAIT_TIME.contains(&self.avg_wait_time_minutes)
            && Self::TABLE_OCCUPANCY.contains(&self.table_occupancy_pct)
            && Self::KITCHEN_EFFICIENCY.contains(&self.kitchen_efficiency_pct)
            && Self::CUSTOMER_SATISFACTION.contains(&self.customer_satisfaction)
            && Self::STAFF_PERFORMANCE.contains(&self.staff_performance_pct)
    }
}

fn clamp(value: f64, range: &RangeInclusive<f64>) -> f64 {
    value.clamp(*range.start(), *range.end())
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Point-in-time copy of the live feed.
///
/// Consumers only ever see snapshots; the owning simulator keeps its
/// collections private.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    pub kitchen_orders: Vec<KitchenOrder>,
    pub service_updates: Vec<ServiceUpdate>,
    pub financial_stream: Vec<FinancialEvent>,
    pub alerts: Vec<Alert>,
    pub metrics: Metrics,
    pub is_active: bool,
    pub last_update: Option<DateTime<Utc>>,
    pub unacknowledged_alerts: usize,
    pub critical_alerts: usize,
    pub active_orders: usize,
    pub pending_orders: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> Metrics {
        Metrics {
            current_revenue_cents: 456_789,
            orders_today: 87,
            avg_wait_time_minutes: 18.0,
            table_occupancy_pct: 78.0,
            kitchen_efficiency_pct: 92.0,
            customer_satisfaction: 4.6,
            staff_performance_pct: 88.0,
        }
    }

    #[test]
    fn order_status_orders_by_progress() {
        assert!(OrderStatus::Pending < OrderStatus::Cooking);
        assert!(OrderStatus::Cooking < OrderStatus::Plating);
        assert!(OrderStatus::Plating < OrderStatus::Ready);
        assert!(!OrderStatus::Ready.is_active());
        assert!(OrderStatus::Plating.is_in_progress());
        assert!(!OrderStatus::Pending.is_in_progress());
    }

    #[test]
    fn clamp_all_pulls_metrics_into_range() {
        let mut m = metrics();
        m.avg_wait_time_minutes = 3.0;
        m.table_occupancy_pct = 140.0;
        m.kitchen_efficiency_pct = 12.0;
        m.customer_satisfaction = 5.7;
        m.staff_performance_pct = -4.0;
        assert!(!m.within_bounds());

        m.clamp_all();
        assert!(m.within_bounds());
        assert_eq!(m.avg_wait_time_minutes, 15.0);
        assert_eq!(m.table_occupancy_pct, 100.0);
        assert_eq!(m.kitchen_efficiency_pct, 80.0);
        assert_eq!(m.customer_satisfaction, 5.0);
        assert_eq!(m.staff_performance_pct, 75.0);
    }

    #[test]
    fn revenue_is_reported_in_currency_units() {
        let m = metrics();
        assert!((m.current_revenue() - 4567.89).abs() < 1e-9);
    }

    #[test]
    fn kitchen_order_uses_camel_case_on_the_wire() {
        let order = KitchenOrder {
            id: "K-101".to_string(),
            table: 7,
            items: vec!["Ribeye".to_string()],
            order_time: "7:02 PM".to_string(),
            cook_time: None,
            estimated_time_minutes: 15,
            elapsed_minutes: 5,
            status: OrderStatus::Pending,
            priority: Priority::High,
            chef: None,
            temperature: Some("medium rare".to_string()),
            notes: None,
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["estimatedTimeMinutes"], 15);
        assert_eq!(json["status"], "pending");
        assert_eq!(json["priority"], "high");
    }
}
