//! `order_query` flow: look up an order's status

use crate::order_book::OrderBook;
use crate::text::extract_order_id;
use async_trait::async_trait;
use parley_core::{Flow, FlowContext, Result, Session, StepHandler, StepOutcome};
use std::sync::Arc;
use tracing::debug;

/// Flow id
pub const FLOW_ID: &str = "order_query";

const ASK_ORDER_ID: &str = "请提供您要查询的订单号。";
const ORDER_NOT_FOUND: &str = "未找到该订单，请检查订单号是否正确。";

/// Build the flow
pub fn flow(orders: Arc<dyn OrderBook>) -> Flow {
    Flow::new(FLOW_ID)
        .step(
            "start",
            Start {
                orders: orders.clone(),
            },
        )
        .step("processing", Processing { orders })
}

async fn status_reply(orders: &dyn OrderBook, order_id: &str) -> Result<String> {
    let status = orders
        .order_status(order_id)
        .await?
        .unwrap_or_else(|| ORDER_NOT_FOUND.to_string());
    Ok(format!(
        "订单 {order_id} 的状态：{status}\n\n如需其他帮助，请继续提问。"
    ))
}

struct Start {
    orders: Arc<dyn OrderBook>,
}

#[async_trait]
impl StepHandler for Start {
    async fn handle(
        &self,
        _ctx: &FlowContext,
        session: &mut Session,
        user_message: &str,
    ) -> Result<StepOutcome> {
        match extract_order_id(user_message) {
            Some(order_id) => {
                debug!(session_id = %session.id, %order_id, "Order id supplied up front");
                Ok(StepOutcome::done(
                    status_reply(self.orders.as_ref(), &order_id).await?,
                ))
            }
            None => Ok(StepOutcome::next(ASK_ORDER_ID, "processing")),
        }
    }
}

struct Processing {
    orders: Arc<dyn OrderBook>,
}

#[async_trait]
impl StepHandler for Processing {
    async fn handle(
        &self,
        _ctx: &FlowContext,
        _session: &mut Session,
        user_message: &str,
    ) -> Result<StepOutcome> {
        let order_id =
            extract_order_id(user_message).unwrap_or_else(|| user_message.trim().to_string());
        Ok(StepOutcome::done(
            status_reply(self.orders.as_ref(), &order_id).await?,
        ))
    }
}
