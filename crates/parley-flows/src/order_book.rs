//! Order and shipment lookup capability

use async_trait::async_trait;
use parley_core::Result;
use std::collections::HashMap;

/// Read access to order data
#[async_trait]
pub trait OrderBook: Send + Sync {
    /// Human-readable order status, `None` when the order is unknown
    async fn order_status(&self, order_id: &str) -> Result<Option<String>>;

    /// Human-readable shipment details, `None` when nothing is on record
    async fn shipment(&self, order_id: &str) -> Result<Option<String>>;
}

#[derive(Debug, Clone)]
struct OrderRecord {
    status: String,
    shipment: Option<String>,
}

/// Fixed in-memory order book
#[derive(Debug, Clone, Default)]
pub struct StaticOrderBook {
    orders: HashMap<String, OrderRecord>,
}

impl StaticOrderBook {
    /// Empty book
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The demo orders `12345`, `67890` and `11111`
    #[must_use]
    pub fn fixtures() -> Self {
        Self::new()
            .with_order(
                "12345",
                "已发货，预计明天送达\n物流单号：SF1234567890",
                Some("快递公司：顺丰速运\n单号：SF1234567890\n当前状态：已到达【北京朝阳区】\n预计送达：今天下午"),
            )
            .with_order(
                "67890",
                "处理中，预计3个工作日内发货",
                Some("快递公司：中通快递\n单号：ZT9876543210\n当前状态：运输中【上海分拨中心】\n预计送达：明天"),
            )
            .with_order(
                "11111",
                "已签收，签收时间：2024-01-15 14:30",
                Some("快递公司：圆通速递\n单号：YT5555666677\n当前状态：已签收\n签收人：本人"),
            )
    }

    /// Add or replace an order
    #[must_use]
    pub fn with_order(
        mut self,
        order_id: impl Into<String>,
        status: impl Into<String>,
        shipment: Option<&str>,
    ) -> Self {
        self.orders.insert(
            order_id.into(),
            OrderRecord {
                status: status.into(),
                shipment: shipment.map(str::to_string),
            },
        );
        self
    }
}

#[async_trait]
impl OrderBook for StaticOrderBook {
    async fn order_status(&self, order_id: &str) -> Result<Option<String>> {
        Ok(self.orders.get(order_id).map(|o| o.status.clone()))
    }

    async fn shipment(&self, order_id: &str) -> Result<Option<String>> {
        Ok(self.orders.get(order_id).and_then(|o| o.shipment.clone()))
    }
}
