//! Demo state a fresh feed session starts from.

use tablepulse_types::{
    Alert, AlertCategory, FinancialEvent, FinancialKind, KitchenOrder, Metrics, OrderStatus,
    PaymentMethod, Priority, ServiceAction, ServiceUpdate, Severity,
};

/// Initial contents of every feed collection.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoState {
    pub kitchen_orders: Vec<KitchenOrder>,
    /// Newest first.
    pub service_updates: Vec<ServiceUpdate>,
    /// Newest first.
    pub financial_stream: Vec<FinancialEvent>,
    /// Newest first.
    pub alerts: Vec<Alert>,
    pub metrics: Metrics,
}

impl DemoState {
    /// No orders, no history, metrics at their floor values.
    pub fn empty() -> Self {
        Self {
            kitchen_orders: Vec::new(),
            service_updates: Vec::new(),
            financial_stream: Vec::new(),
            alerts: Vec::new(),
            metrics: Metrics {
                current_revenue_cents: 0,
                orders_today: 0,
                avg_wait_time_minutes: *Metrics::AVG_WAIT_TIME.start(),
                table_occupancy_pct: *Metrics::TABLE_OCCUPANCY.start(),
                kitchen_efficiency_pct: *Metrics::KITCHEN_EFFICIENCY.start(),
                customer_satisfaction: *Metrics::CUSTOMER_SATISFACTION.start(),
                staff_performance_pct: *Metrics::STAFF_PERFORMANCE.start(),
            },
        }
    }
}

impl Default for DemoState {
    fn default() -> Self {
        Self {
            kitchen_orders: vec![
                order(
                    "K-1001",
                    12,
                    &["Ribeye steak", "Caesar salad"],
                    "6:42 PM",
                    15,
                    5,
                    OrderStatus::Pending,
                )
                .priority(Priority::High)
                .temperature("medium rare"),
                order("K-1002", 4, &["Margherita pizza"], "6:45 PM", 12, 7, OrderStatus::Cooking)
                    .cooked("6:47 PM", "Chef Aiko"),
                order(
                    "K-1003",
                    19,
                    &["Pan-seared salmon", "Risotto", "Tiramisu"],
                    "6:38 PM",
                    20,
                    17,
                    OrderStatus::Plating,
                )
                .cooked("6:41 PM", "Chef Marco")
                .notes("Nut allergy"),
                order(
                    "K-1004",
                    7,
                    &["Burrata", "Truffle fries"],
                    "6:30 PM",
                    10,
                    10,
                    OrderStatus::Ready,
                )
                .cooked("6:33 PM", "Chef Daniela"),
                order("K-1005", 22, &["Kids pasta"], "6:49 PM", 8, 0, OrderStatus::Pending),
            ],
            service_updates: vec![
                ServiceUpdate {
                    id: "svc-seed-2".to_string(),
                    timestamp: "6:48 PM".to_string(),
                    action: ServiceAction::WalkInSeated,
                    message: "Walk-in party seated at table 22".to_string(),
                    server: "Priya".to_string(),
                    table: 22,
                    guests: 3,
                },
                ServiceUpdate {
                    id: "svc-seed-1".to_string(),
                    timestamp: "6:44 PM".to_string(),
                    action: ServiceAction::OrderDelivered,
                    message: "Order delivered at table 7".to_string(),
                    server: "Sarah".to_string(),
                    table: 7,
                    guests: 2,
                },
            ],
            financial_stream: vec![FinancialEvent {
                id: "fin-seed-1".to_string(),
                timestamp: "6:40 PM".to_string(),
                kind: FinancialKind::Sale,
                amount_cents: 12_450,
                table: 9,
                payment_method: PaymentMethod::Card,
                server: "Miguel".to_string(),
            }],
            alerts: vec![
                Alert {
                    id: "alert-seed-2".to_string(),
                    timestamp: "6:46 PM".to_string(),
                    severity: Severity::Critical,
                    title: "Walk-in freezer".to_string(),
                    message: "Freezer temperature above -15°C".to_string(),
                    category: AlertCategory::Kitchen,
                    acknowledged: false,
                },
                Alert {
                    id: "alert-seed-1".to_string(),
                    timestamp: "6:35 PM".to_string(),
                    severity: Severity::Warning,
                    title: "Low inventory".to_string(),
                    message: "Atlantic salmon is running low (4 portions left)".to_string(),
                    category: AlertCategory::Inventory,
                    acknowledged: false,
                },
            ],
            metrics: Metrics {
                current_revenue_cents: 456_789,
                orders_today: 87,
                avg_wait_time_minutes: 18.0,
                table_occupancy_pct: 78.0,
                kitchen_efficiency_pct: 92.0,
                customer_satisfaction: 4.6,
                staff_performance_pct: 88.0,
            },
        }
    }
}

fn order(
    id: &str,
    table: u32,
    items: &[&str],
    order_time: &str,
    estimated_time_minutes: u32,
    elapsed_minutes: u32,
    status: OrderStatus,
) -> KitchenOrder {
    KitchenOrder {
        id: id.to_string(),
        table,
        items: items.iter().map(|s| s.to_string()).collect(),
        order_time: order_time.to_string(),
        cook_time: None,
        estimated_time_minutes,
        elapsed_minutes,
        status,
        priority: Priority::Normal,
        chef: None,
        temperature: None,
        notes: None,
    }
}

trait OrderExt {
    fn priority(self, priority: Priority) -> Self;
    fn temperature(self, temperature: &str) -> Self;
    fn notes(self, notes: &str) -> Self;
    fn cooked(self, cook_time: &str, chef: &str) -> Self;
}

impl OrderExt for KitchenOrder {
    fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    fn temperature(mut self, temperature: &str) -> Self {
        self.temperature = Some(temperature.to_string());
        self
    }

    fn notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    fn cooked(mut self, cook_time: &str, chef: &str) -> Self {
        self.cook_time = Some(cook_time.to_string());
        self.chef = Some(chef.to_string());
        self
    }
}
