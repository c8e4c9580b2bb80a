//! [`LiveOpsSimulator`] – synthetic live-operations feed.
//!
//! The simulator owns every feed collection and mutates them only from
//! [`LiveOpsSimulator::tick`] and the alert commands.  Each tick runs five
//! procedures in a fixed order so that a seeded random source reproduces the
//! same feed:
//!
//! 1. kitchen orders advance along `pending → cooking → plating → ready`;
//! 2. a service update may be logged;
//! 3. a sale may be booked, updating revenue and the order count;
//! 4. an alert may be raised;
//! 5. every bounded metric drifts and is clamped back into range.
//!
//! Randomness comes from an injected [`Rng`]; construct with
//! [`LiveOpsSimulator::seeded`] or [`LiveOpsSimulator::with_rng`] for
//! deterministic runs.

use chrono::{DateTime, Local, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tablepulse_types::{
    Alert, FeedSnapshot, FinancialEvent, FinancialKind, KitchenOrder, Metrics, OrderStatus,
    PaymentMethod, RollingLog, ServiceAction, ServiceUpdate, Severity,
};
use tracing::{debug, trace};

use crate::catalog::{self, AlertTemplate};
use crate::seed::DemoState;

/// Cooking hands over to plating at this fraction of the estimate.
const PLATING_THRESHOLD: f64 = 0.9;

/// Runtime knobs for the simulator.
///
/// The defaults reproduce the nominal feed: a 30 % chance per tick that a
/// pending order starts cooking, 40 % for a service update, 30 % for a sale
/// and 20 % for an alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub pending_to_cooking_chance: f64,
    pub service_update_chance: f64,
    pub financial_chance: f64,
    pub alert_chance: f64,
    pub service_log_cap: usize,
    pub financial_log_cap: usize,
    pub alert_log_cap: usize,
    /// Fixed seed for reproducible feeds; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            pending_to_cooking_chance: 0.30,
            service_update_chance: 0.40,
            financial_chance: 0.30,
            alert_chance: 0.20,
            service_log_cap: 20,
            financial_log_cap: 20,
            alert_log_cap: 10,
            seed: None,
        }
    }
}

pub struct LiveOpsSimulator<R: Rng = StdRng> {
    config: SimulatorConfig,
    rng: R,
    kitchen_orders: Vec<KitchenOrder>,
    service_updates: RollingLog<ServiceUpdate>,
    financial_stream: RollingLog<FinancialEvent>,
    alerts: RollingLog<Alert>,
    metrics: Metrics,
    running: bool,
    last_update: Option<DateTime<Utc>>,
    next_id: u64,
}

impl LiveOpsSimulator<StdRng> {
    /// Simulator over the demo state, seeded from `config.seed` when set.
    pub fn new(config: SimulatorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    /// Default configuration with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(SimulatorConfig {
            seed: Some(seed),
            ..SimulatorConfig::default()
        })
    }
}

impl<R: Rng> LiveOpsSimulator<R> {
    pub fn with_rng(config: SimulatorConfig, rng: R) -> Self {
        Self::from_state(config, rng, DemoState::default())
    }

    /// Start from an explicit state instead of the demo seed.
    pub fn from_state(config: SimulatorConfig, rng: R, state: DemoState) -> Self {
        let mut metrics = state.metrics;
        metrics.clamp_all();
        Self {
            service_updates: RollingLog::from_newest_first(
                config.service_log_cap,
                state.service_updates,
            ),
            financial_stream: RollingLog::from_newest_first(
                config.financial_log_cap,
                state.financial_stream,
            ),
            alerts: RollingLog::from_newest_first(config.alert_log_cap, state.alerts),
            kitchen_orders: state.kitchen_orders,
            metrics,
            config,
            rng,
            running: false,
            last_update: None,
            next_id: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    pub fn start(&mut self) {
        self.start_at(Utc::now());
    }

    /// Enable ticking and record `now` as the last update.
    pub fn start_at(&mut self, now: DateTime<Utc>) {
        self.running = true;
        self.last_update = Some(now);
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    pub fn tick(&mut self) -> bool {
        self.tick_at(Utc::now())
    }

    /// Advance the feed by one tick stamped `now`.
    ///
    /// Returns `false`, leaving every collection untouched, while stopped.
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> bool {
        if !self.running {
            return false;
        }
        self.advance_kitchen_orders(now);
        self.maybe_log_service_update(now);
        self.maybe_book_sale(now);
        self.maybe_raise_alert(now);
        self.drift_metrics();
        self.last_update = Some(now);
        trace!(
            active = self.active_order_count(),
            pending = self.pending_order_count(),
            revenue = self.metrics.current_revenue(),
            "feed tick"
        );
        true
    }

    fn advance_kitchen_orders(&mut self, now: DateTime<Utc>) {
        let stamp = clock_label(now);
        let chance = self.config.pending_to_cooking_chance;
        for order in &mut self.kitchen_orders {
            // Transitions key off the status at tick start: one step at most.
            match order.status {
                OrderStatus::Pending => {
                    if roll(&mut self.rng, chance) {
                        order.status = OrderStatus::Cooking;
                        order.cook_time = Some(stamp.clone());
                        if order.chef.is_none() {
                            order.chef =
                                Some(catalog::pick(&mut self.rng, &catalog::CHEFS).to_string());
                        }
                        debug!(order = %order.id, "order started cooking");
                    }
                }
                OrderStatus::Cooking => {
                    order.elapsed_minutes += self.rng.gen_range(0..=1);
                    let threshold = PLATING_THRESHOLD * f64::from(order.estimated_time_minutes);
                    if f64::from(order.elapsed_minutes) >= threshold {
                        order.status = OrderStatus::Plating;
                        debug!(order = %order.id, "order moved to plating");
                    }
                }
                OrderStatus::Plating => {
                    order.elapsed_minutes += self.rng.gen_range(0..=1);
                    if order.elapsed_minutes >= order.estimated_time_minutes {
                        order.status = OrderStatus::Ready;
                        debug!(order = %order.id, "order ready");
                    }
                }
                OrderStatus::Ready => {}
            }
        }
    }

    fn maybe_log_service_update(&mut self, now: DateTime<Utc>) {
        if !roll(&mut self.rng, self.config.service_update_chance) {
            return;
        }
        let action = catalog::pick(&mut self.rng, &ServiceAction::ALL);
        let table = self.rng.gen_range(1..=catalog::TABLE_COUNT);
        let update = ServiceUpdate {
            id: self.next_id("svc", now),
            timestamp: clock_label(now),
            action,
            message: format!("{} at table {table}", action.describe()),
            server: catalog::pick(&mut self.rng, &catalog::SERVERS).to_string(),
            table,
            guests: self.rng.gen_range(1..=catalog::MAX_GUESTS),
        };
        self.service_updates.push(update);
    }

    fn maybe_book_sale(&mut self, now: DateTime<Utc>) {
        if !roll(&mut self.rng, self.config.financial_chance) {
            return;
        }
        let sale = FinancialEvent {
            id: self.next_id("fin", now),
            timestamp: clock_label(now),
            kind: FinancialKind::Sale,
            amount_cents: self
                .rng
                .gen_range(catalog::MIN_SALE_CENTS..=catalog::MAX_SALE_CENTS),
            table: self.rng.gen_range(1..=catalog::TABLE_COUNT),
            payment_method: catalog::pick(&mut self.rng, &PaymentMethod::ALL),
            server: catalog::pick(&mut self.rng, &catalog::SERVERS).to_string(),
        };
        self.record_sale(sale);
    }

    fn maybe_raise_alert(&mut self, now: DateTime<Utc>) {
        if !roll(&mut self.rng, self.config.alert_chance) {
            return;
        }
        let template = catalog::pick(&mut self.rng, &AlertTemplate::ALL);
        let draft = template.render(&mut self.rng);
        let alert = Alert {
            id: self.next_id("alert", now),
            timestamp: clock_label(now),
            severity: draft.severity,
            title: draft.title,
            message: draft.message,
            category: draft.category,
            acknowledged: false,
        };
        self.alerts.push(alert);
    }

    fn drift_metrics(&mut self) {
        let rng = &mut self.rng;
        let m = &mut self.metrics;
        m.avg_wait_time_minutes += rng.gen_range(-1.0..=1.0);
        m.table_occupancy_pct += rng.gen_range(-2.0..=2.0);
        m.kitchen_efficiency_pct += rng.gen_range(-1.0..=1.0);
        m.customer_satisfaction += rng.gen_range(-0.05..=0.05);
        m.staff_performance_pct += rng.gen_range(-1.0..=1.0);
        m.clamp_all();
    }

    fn next_id(&mut self, prefix: &str, now: DateTime<Utc>) -> String {
        self.next_id += 1;
        format!("{prefix}-{}-{}", now.timestamp_millis(), self.next_id)
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Log `sale` at the head of the financial stream and book it against
    /// today's revenue and order count.
    pub fn record_sale(&mut self, sale: FinancialEvent) {
        self.metrics.current_revenue_cents = self
            .metrics
            .current_revenue_cents
            .saturating_add(sale.amount_cents);
        self.metrics.orders_today = self.metrics.orders_today.saturating_add(1);
        self.financial_stream.push(sale);
    }

    /// Mark the alert `id` acknowledged.
    ///
    /// Returns `false` when no alert has that id.  Acknowledging twice is
    /// the same as acknowledging once.
    pub fn acknowledge_alert(&mut self, id: &str) -> bool {
        match self.alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.acknowledged = true;
                true
            }
            None => false,
        }
    }

    /// Drop every acknowledged alert, returning how many were removed.
    pub fn clear_acknowledged_alerts(&mut self) -> usize {
        let before = self.alerts.len();
        self.alerts.retain(|a| !a.acknowledged);
        before - self.alerts.len()
    }

    // -----------------------------------------------------------------------
    // Read surface
    // -----------------------------------------------------------------------

    pub fn kitchen_orders(&self) -> &[KitchenOrder] {
        &self.kitchen_orders
    }

    pub fn service_updates(&self) -> &RollingLog<ServiceUpdate> {
        &self.service_updates
    }

    pub fn financial_stream(&self) -> &RollingLog<FinancialEvent> {
        &self.financial_stream
    }

    pub fn alerts(&self) -> &RollingLog<Alert> {
        &self.alerts
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn unacknowledged_alert_count(&self) -> usize {
        self.alerts.iter().filter(|a| !a.acknowledged).count()
    }

    pub fn critical_alert_count(&self) -> usize {
        self.alerts
            .iter()
            .filter(|a| !a.acknowledged && a.severity == Severity::Critical)
            .count()
    }

    /// Orders on the line (`cooking` or `plating`).
    pub fn active_order_count(&self) -> usize {
        self.kitchen_orders
            .iter()
            .filter(|o| o.status.is_in_progress())
            .count()
    }

    pub fn pending_order_count(&self) -> usize {
        self.kitchen_orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .count()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            kitchen_orders: self.kitchen_orders.clone(),
            service_updates: self.service_updates.to_vec(),
            financial_stream: self.financial_stream.to_vec(),
            alerts: self.alerts.to_vec(),
            metrics: self.metrics.clone(),
            is_active: self.running,
            last_update: self.last_update,
            unacknowledged_alerts: self.unacknowledged_alert_count(),
            critical_alerts: self.critical_alert_count(),
            active_orders: self.active_order_count(),
            pending_orders: self.pending_order_count(),
        }
    }
}

/// Bernoulli trial that tolerates out-of-range and NaN probabilities.
fn roll<R: Rng>(rng: &mut R, chance: f64) -> bool {
    if chance.is_nan() || chance <= 0.0 {
        false
    } else if chance >= 1.0 {
        true
    } else {
        rng.gen_bool(chance)
    }
}

/// Local wall-clock label, e.g. `7:05 PM`.
fn clock_label(now: DateTime<Utc>) -> String {
    now.with_timezone(&Local).format("%-I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablepulse_types::{AlertCategory, Priority};

    fn forced(chance: f64) -> SimulatorConfig {
        SimulatorConfig {
            pending_to_cooking_chance: chance,
            service_update_chance: chance,
            financial_chance: chance,
            alert_chance: chance,
            ..SimulatorConfig::default()
        }
    }

    fn running(config: SimulatorConfig, state: DemoState) -> LiveOpsSimulator {
        let mut sim = LiveOpsSimulator::from_state(config, StdRng::seed_from_u64(42), state);
        sim.start();
        sim
    }

    fn order(status: OrderStatus, elapsed: u32, estimated: u32) -> KitchenOrder {
        KitchenOrder {
            id: "K-1".to_string(),
            table: 3,
            items: vec!["Risotto".to_string()],
            order_time: "7:00 PM".to_string(),
            cook_time: None,
            estimated_time_minutes: estimated,
            elapsed_minutes: elapsed,
            status,
            priority: Priority::Normal,
            chef: None,
            temperature: None,
            notes: None,
        }
    }

    fn alert(id: &str, severity: Severity) -> Alert {
        Alert {
            id: id.to_string(),
            timestamp: "7:00 PM".to_string(),
            severity,
            title: "t".to_string(),
            message: "m".to_string(),
            category: AlertCategory::Service,
            acknowledged: false,
        }
    }

    fn sale(cents: u64) -> FinancialEvent {
        FinancialEvent {
            id: "fin-test".to_string(),
            timestamp: "7:00 PM".to_string(),
            kind: FinancialKind::Sale,
            amount_cents: cents,
            table: 4,
            payment_method: PaymentMethod::Card,
            server: "Sarah".to_string(),
        }
    }

    #[test]
    fn default_config_matches_nominal_feed() {
        let config = SimulatorConfig::default();
        assert_eq!(config.pending_to_cooking_chance, 0.30);
        assert_eq!(config.service_update_chance, 0.40);
        assert_eq!(config.financial_chance, 0.30);
        assert_eq!(config.alert_chance, 0.20);
        assert_eq!(
            (config.service_log_cap, config.financial_log_cap, config.alert_log_cap),
            (20, 20, 10)
        );
    }

    #[test]
    fn stopped_simulator_does_not_tick() {
        let mut sim = LiveOpsSimulator::seeded(1);
        let before = sim.snapshot();
        assert!(!sim.tick());
        assert_eq!(sim.snapshot(), before);
    }

    #[test]
    fn start_records_last_update() {
        let mut sim = LiveOpsSimulator::seeded(1);
        assert!(sim.last_update().is_none());
        let now = Utc::now();
        sim.start_at(now);
        assert!(sim.is_running());
        assert_eq!(sim.last_update(), Some(now));
        sim.stop();
        assert!(!sim.is_running());
    }

    #[test]
    fn rolling_logs_respect_caps_with_newest_at_head() {
        let mut sim = running(forced(1.0), DemoState::default());
        for _ in 0..60 {
            sim.tick();
            assert!(sim.service_updates().len() <= 20);
            assert!(sim.financial_stream().len() <= 20);
            assert!(sim.alerts().len() <= 10);
        }
        assert_eq!(sim.service_updates().len(), 20);
        assert_eq!(sim.financial_stream().len(), 20);
        assert_eq!(sim.alerts().len(), 10);

        let before = sim.service_updates().newest().map(|u| u.id.clone());
        sim.tick();
        let after = sim.service_updates().newest().map(|u| u.id.clone());
        assert_ne!(before, after);
    }

    #[test]
    fn orders_never_regress() {
        let mut sim = running(SimulatorConfig::default(), DemoState::default());
        let mut previous = sim.kitchen_orders().to_vec();
        for _ in 0..200 {
            sim.tick();
            for (old, new) in previous.iter().zip(sim.kitchen_orders()) {
                assert_eq!(old.id, new.id);
                assert!(new.status >= old.status, "{} regressed", new.id);
                assert!(new.elapsed_minutes >= old.elapsed_minutes);
            }
            previous = sim.kitchen_orders().to_vec();
        }
        assert_eq!(previous.len(), DemoState::default().kitchen_orders.len());
    }

    #[test]
    fn order_advances_at_most_one_stage_per_tick() {
        let state = DemoState {
            kitchen_orders: vec![order(OrderStatus::Cooking, 20, 10)],
            ..DemoState::empty()
        };
        let mut sim = running(forced(1.0), state);
        sim.tick();
        assert_eq!(sim.kitchen_orders()[0].status, OrderStatus::Plating);
        sim.tick();
        assert_eq!(sim.kitchen_orders()[0].status, OrderStatus::Ready);
    }

    #[test]
    fn ready_orders_stay_put() {
        let state = DemoState {
            kitchen_orders: vec![order(OrderStatus::Ready, 12, 12)],
            ..DemoState::empty()
        };
        let mut sim = running(forced(1.0), state);
        for _ in 0..10 {
            sim.tick();
        }
        assert_eq!(sim.kitchen_orders()[0].status, OrderStatus::Ready);
        assert_eq!(sim.kitchen_orders()[0].elapsed_minutes, 12);
    }

    #[test]
    fn pending_order_that_starts_cooking_gets_cook_time_and_chef() {
        let state = DemoState {
            kitchen_orders: vec![order(OrderStatus::Pending, 5, 15)],
            ..DemoState::empty()
        };
        let mut sim = running(forced(1.0), state);
        sim.tick();
        let order = &sim.kitchen_orders()[0];
        assert_eq!(order.status, OrderStatus::Cooking);
        assert!(order.cook_time.is_some());
        assert!(order.chef.is_some());
        assert_eq!(order.elapsed_minutes, 5);
    }

    #[test]
    fn assigned_chef_is_kept() {
        let mut pending = order(OrderStatus::Pending, 5, 15);
        pending.chef = Some("Chef Nobu".to_string());
        let state = DemoState {
            kitchen_orders: vec![pending],
            ..DemoState::empty()
        };
        let mut sim = running(forced(1.0), state);
        sim.tick();
        assert_eq!(sim.kitchen_orders()[0].chef.as_deref(), Some("Chef Nobu"));
    }

    #[test]
    fn zero_chance_leaves_pending_orders_and_logs_alone() {
        let state = DemoState {
            kitchen_orders: vec![order(OrderStatus::Pending, 5, 15)],
            ..DemoState::empty()
        };
        let mut sim = running(forced(0.0), state);
        for _ in 0..50 {
            sim.tick();
        }
        assert_eq!(sim.kitchen_orders()[0].status, OrderStatus::Pending);
        assert!(sim.service_updates().is_empty());
        assert!(sim.financial_stream().is_empty());
        assert!(sim.alerts().is_empty());
        assert_eq!(sim.metrics().orders_today, 0);
    }

    #[test]
    fn out_of_range_chances_are_clamped() {
        let mut sim = running(forced(f64::NAN), DemoState::default());
        sim.tick();
        let mut sim = running(forced(7.5), DemoState::empty());
        sim.tick();
        assert_eq!(sim.service_updates().len(), 1);
    }

    #[test]
    fn metrics_stay_in_bounds() {
        let mut sim = running(SimulatorConfig::default(), DemoState::default());
        for _ in 0..2_000 {
            sim.tick();
            let m = sim.metrics();
            assert!(m.within_bounds(), "{m:?}");
            assert!(m.avg_wait_time_minutes >= 15.0);
        }
    }

    #[test]
    fn sale_updates_revenue_and_order_count() {
        let mut sim = running(forced(0.0), DemoState::default());
        assert_eq!(sim.metrics().current_revenue_cents, 456_789);
        assert_eq!(sim.metrics().orders_today, 87);

        sim.record_sale(sale(7_500));

        assert_eq!(sim.metrics().current_revenue_cents, 464_289);
        assert!((sim.metrics().current_revenue() - 4642.89).abs() < 1e-9);
        assert_eq!(sim.metrics().orders_today, 88);
        assert_eq!(sim.financial_stream().newest().map(|s| s.amount_cents), Some(7_500));
    }

    #[test]
    fn ticked_sale_is_booked_in_the_same_tick() {
        let config = SimulatorConfig {
            financial_chance: 1.0,
            ..forced(0.0)
        };
        let mut sim = running(config, DemoState::default());
        let revenue = sim.metrics().current_revenue_cents;
        sim.tick();
        let head = sim.financial_stream().newest().cloned().expect("sale booked");
        assert!((5_000..=25_000).contains(&head.amount_cents));
        assert_eq!(sim.metrics().current_revenue_cents, revenue + head.amount_cents);
        assert_eq!(sim.metrics().orders_today, 88);
    }

    #[test]
    fn generated_entries_use_catalog_ranges() {
        let mut sim = running(forced(1.0), DemoState::empty());
        for _ in 0..40 {
            sim.tick();
        }
        for update in sim.service_updates().iter() {
            assert!((1..=25).contains(&update.table));
            assert!((1..=6).contains(&update.guests));
            assert!(catalog::SERVERS.contains(&update.server.as_str()));
        }
        for alert in sim.alerts().iter() {
            assert!(!alert.acknowledged);
            assert_ne!(alert.severity, Severity::Critical);
        }
    }

    #[test]
    fn generated_ids_are_unique() {
        let mut sim = running(forced(1.0), DemoState::empty());
        let now = Utc::now();
        for _ in 0..5 {
            sim.tick_at(now);
        }
        let mut ids: Vec<String> = sim.service_updates().iter().map(|u| u.id.clone()).collect();
        ids.extend(sim.alerts().iter().map(|a| a.id.clone()));
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn acknowledging_is_idempotent_and_ignores_unknown_ids() {
        let state = DemoState {
            alerts: vec![alert("a-2", Severity::Critical), alert("a-1", Severity::Warning)],
            ..DemoState::empty()
        };
        let mut sim = running(forced(0.0), state);
        assert_eq!(sim.unacknowledged_alert_count(), 2);
        assert_eq!(sim.critical_alert_count(), 1);

        assert!(sim.acknowledge_alert("a-2"));
        let once = sim.snapshot();
        assert!(sim.acknowledge_alert("a-2"));
        assert_eq!(sim.snapshot(), once);
        assert_eq!(sim.critical_alert_count(), 0);
        assert_eq!(sim.unacknowledged_alert_count(), 1);

        assert!(!sim.acknowledge_alert("missing"));
        assert_eq!(sim.snapshot(), once);
    }

    #[test]
    fn clearing_removes_only_acknowledged_alerts() {
        let state = DemoState {
            alerts: vec![
                alert("a-3", Severity::Info),
                alert("a-2", Severity::Warning),
                alert("a-1", Severity::Info),
            ],
            ..DemoState::empty()
        };
        let mut sim = running(forced(0.0), state);
        sim.acknowledge_alert("a-1");
        sim.acknowledge_alert("a-3");
        assert_eq!(sim.clear_acknowledged_alerts(), 2);
        let ids: Vec<&str> = sim.alerts().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a-2"]);
        assert_eq!(sim.clear_acknowledged_alerts(), 0);
    }

    #[test]
    fn derived_counts_follow_order_status() {
        let state = DemoState {
            kitchen_orders: vec![
                order(OrderStatus::Pending, 0, 10),
                order(OrderStatus::Cooking, 1, 10),
                order(OrderStatus::Plating, 9, 10),
                order(OrderStatus::Ready, 10, 10),
            ],
            ..DemoState::empty()
        };
        let sim = LiveOpsSimulator::from_state(forced(0.0), StdRng::seed_from_u64(0), state);
        assert_eq!(sim.pending_order_count(), 1);
        assert_eq!(sim.active_order_count(), 2);

        let snap = sim.snapshot();
        assert!(!snap.is_active);
        assert_eq!((snap.pending_orders, snap.active_orders), (1, 2));
    }

    #[test]
    fn same_seed_same_feed() {
        let now = Utc::now();
        let mut a = LiveOpsSimulator::seeded(99);
        let mut b = LiveOpsSimulator::seeded(99);
        a.start_at(now);
        b.start_at(now);
        for _ in 0..25 {
            a.tick_at(now);
            b.tick_at(now);
        }
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn config_deserialises_with_defaults() {
        let config: SimulatorConfig =
            serde_json::from_str(r#"{"alert_chance":0.5,"seed":7}"#).unwrap();
        assert_eq!(config.alert_chance, 0.5);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.service_log_cap, 20);
    }
}
