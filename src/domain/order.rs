//! Broker orders placed on behalf of a session.
//!
//! Orders relate to positions only through the `(session, leg_number)` pair.
//! There is no stored reference, so an order may exist without a matching
//! position and vice versa.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::id::{OrderId, SessionId, SessionKey};

text_enum! {
    /// Broker-side status of an order.
    OrderStatus, "order status" {
        Pending => "PENDING",
        Placed => "PLACED",
        Accepted => "ACCEPTED",
        Executed => "EXECUTED",
        Partial => "PARTIAL",
        Rejected => "REJECTED",
        Cancelled => "CANCELLED",
    }
}

impl OrderStatus {
    /// Returns true once the broker will not change the order again.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(
            self,
            OrderStatus::Executed | OrderStatus::Rejected | OrderStatus::Cancelled
        )
    }
}

text_enum! {
    /// Purpose of an order within the leg lifecycle.
    OrderType, "order type" {
        Entry => "ENTRY",
        Exit => "EXIT",
        StopLoss => "SL_ORDER",
    }
}

text_enum! {
    OrderSide, "order side" {
        Buy => "BUY",
        Sell => "SELL",
    }
}

/// Exchange segment used when none is given.
pub const DEFAULT_EXCHANGE: &str = "NFO";

/// A persisted order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub session: SessionKey,
    pub broker_order_id: Option<String>,
    pub leg_number: Option<i32>,
    pub order_type: OrderType,
    pub symbol: String,
    pub exchange: String,
    pub side: OrderSide,
    pub quantity: i32,
    pub price: Option<Decimal>,
    pub order_time: DateTime<Utc>,
    pub status: OrderStatus,
    pub execution_price: Option<Decimal>,
    pub executed_quantity: Option<i32>,
    pub execution_time: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for placing an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_type: OrderType,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: i32,
    pub price: Option<Decimal>,
    pub leg_number: Option<i32>,
    pub exchange: String,
    pub order_time: DateTime<Utc>,
}

impl NewOrder {
    /// Order placed now on the default exchange.
    pub fn new(
        order_type: OrderType,
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: i32,
    ) -> Self {
        Self {
            order_type,
            symbol: symbol.into(),
            side,
            quantity,
            price: None,
            leg_number: None,
            exchange: DEFAULT_EXCHANGE.to_string(),
            order_time: Utc::now(),
        }
    }

    #[must_use]
    pub fn for_leg(mut self, leg_number: i32) -> Self {
        self.leg_number = Some(leg_number);
        self
    }

    #[must_use]
    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    #[must_use]
    pub fn on_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = exchange.into();
        self
    }

    #[must_use]
    pub fn at(mut self, order_time: DateTime<Utc>) -> Self {
        self.order_time = order_time;
        self
    }
}

/// Broker execution report applied to a stored order.
#[derive(Debug, Clone)]
pub struct OrderExecution {
    pub broker_order_id: Option<String>,
    pub status: OrderStatus,
    pub price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub time: DateTime<Utc>,
}

impl OrderExecution {
    /// Fully executed at `price`, reported now.
    #[must_use]
    pub fn executed(price: Decimal, quantity: i32) -> Self {
        Self {
            broker_order_id: None,
            status: OrderStatus::Executed,
            price: Some(price),
            quantity: Some(quantity),
            time: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_broker_id(mut self, broker_order_id: impl Into<String>) -> Self {
        self.broker_order_id = Some(broker_order_id.into());
        self
    }

    #[must_use]
    pub fn at(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }
}

/// Read filter for orders. Results are chronological by order time.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub session: Option<SessionId>,
    pub status: Option<OrderStatus>,
    pub symbol: Option<String>,
    /// Inclusive lower bound on order time.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on order time.
    pub to: Option<DateTime<Utc>>,
}

impl OrderFilter {
    #[must_use]
    pub fn for_session(session: impl Into<SessionId>) -> Self {
        Self {
            session: Some(session.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    #[must_use]
    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_loss_order_type_uses_broker_label() {
        assert_eq!(OrderType::StopLoss.as_str(), "SL_ORDER");
        assert_eq!("SL_ORDER".parse::<OrderType>().unwrap(), OrderType::StopLoss);
    }

    #[test]
    fn final_statuses() {
        assert!(OrderStatus::Executed.is_final());
        assert!(OrderStatus::Cancelled.is_final());
        assert!(!OrderStatus::Accepted.is_final());
        assert!(!OrderStatus::Partial.is_final());
    }

    #[test]
    fn new_order_defaults_to_nfo() {
        let order = NewOrder::new(OrderType::Entry, "NIFTY26JAN24500CE", OrderSide::Buy, 75);
        assert_eq!(order.exchange, DEFAULT_EXCHANGE);
        assert!(order.leg_number.is_none());
    }

    #[test]
    fn unknown_side_is_rejected() {
        assert!("HOLD".parse::<OrderSide>().is_err());
    }
}
