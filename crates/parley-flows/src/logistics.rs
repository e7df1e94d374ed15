//! `logistics` flow: shipment tracking

use crate::order_book::OrderBook;
use crate::text::extract_order_id;
use async_trait::async_trait;
use parley_core::{Flow, FlowContext, Result, Session, StepHandler, StepOutcome};
use std::sync::Arc;

/// Flow id
pub const FLOW_ID: &str = "logistics";

const ASK_ORDER_ID: &str = "请提供您的订单号，我来帮您查询物流信息。";
const SHIPMENT_NOT_FOUND: &str = "未查询到该订单的物流信息，请检查订单号是否正确。";

/// Build the flow
pub fn flow(orders: Arc<dyn OrderBook>) -> Flow {
    Flow::new(FLOW_ID)
        .step(
            "start",
            Track {
                orders: orders.clone(),
                ask_when_missing: true,
            },
        )
        .step(
            "query",
            Track {
                orders,
                ask_when_missing: false,
            },
        )
}

/// Both steps answer when an order id is present; only `start` asks for one
struct Track {
    orders: Arc<dyn OrderBook>,
    ask_when_missing: bool,
}

#[async_trait]
impl StepHandler for Track {
    async fn handle(
        &self,
        _ctx: &FlowContext,
        _session: &mut Session,
        user_message: &str,
    ) -> Result<StepOutcome> {
        let order_id = match extract_order_id(user_message) {
            Some(id) => id,
            None if self.ask_when_missing => {
                return Ok(StepOutcome::next(ASK_ORDER_ID, "query"));
            }
            None => user_message.trim().to_string(),
        };

        let info = self
            .orders
            .shipment(&order_id)
            .await?
            .unwrap_or_else(|| SHIPMENT_NOT_FOUND.to_string());

        Ok(StepOutcome::done(format!(
            "订单 {order_id} 的物流信息：\n{info}\n\n如需其他帮助，请继续提问。"
        )))
    }
}
