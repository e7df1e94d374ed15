//! `return_goods` flow: collect an order id and reason, then confirm

use crate::text::{extract_order_id, normalize_confirm, Confirmation};
use parley_core::{sync_step, Flow, Result, Session, StepOutcome};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Flow id
pub const FLOW_ID: &str = "return_goods";

const WELCOME: &str = "欢迎使用退货服务！请提供您要退货的订单号。";
const ASK_AGAIN: &str = "好的，请重新提供订单号。";
const CONFIRM_PROMPT: &str = "请回复【确认】提交退货申请，或回复【修改】重新填写信息。";
const INCOMPLETE: &str = "抱歉，信息不完整，请重新开始退货流程。";
const ORDER_ID_LOST: &str = "抱歉，订单号信息丢失，请重新开始。";
const IN_PROGRESS: &str = "您的退货申请正在处理中，请耐心等待客服人员联系您。";

/// Data collected across the flow's steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnGoodsData {
    /// Order being returned
    #[serde(default)]
    pub order_id: String,
    /// Stated reason
    #[serde(default)]
    pub reason: String,
}

/// Build the flow
pub fn flow() -> Flow {
    Flow::new(FLOW_ID)
        .step(
            "start",
            sync_step(|_session, _msg| Ok(StepOutcome::next(WELCOME, "ask_order_id"))),
        )
        .step("ask_order_id", sync_step(ask_order_id))
        .step("ask_reason", sync_step(ask_reason))
        .step("confirm", sync_step(confirm))
        .step(
            "processing",
            sync_step(|_session, _msg| Ok(StepOutcome::done(IN_PROGRESS))),
        )
}

fn ask_order_id(session: &mut Session, user_message: &str) -> Result<StepOutcome> {
    let order_id =
        extract_order_id(user_message).unwrap_or_else(|| user_message.trim().to_string());

    let mut data: ReturnGoodsData = session.flow_data()?.unwrap_or_default();
    data.order_id = order_id;
    session.set_flow_data(&data)?;

    Ok(StepOutcome::next(
        format!(
            "订单号 {} 已记录。请问退货原因是什么？\n1. 商品质量问题\n2. 收到商品与描述不符\n3. 尺寸/颜色不合适\n4. 其他原因",
            data.order_id
        ),
        "ask_reason",
    ))
}

fn ask_reason(session: &mut Session, user_message: &str) -> Result<StepOutcome> {
    let mut data: ReturnGoodsData = session.flow_data()?.unwrap_or_default();
    data.reason = user_message.trim().to_string();
    session.set_flow_data(&data)?;

    Ok(StepOutcome::next(
        format!(
            "退货原因: {reason}\n\n请确认以下信息是否正确？\n订单号: {order_id}\n退货原因: {reason}\n\n回复【确认】提交退货申请，或回复【修改】重新填写。",
            reason = data.reason,
            order_id = data.order_id,
        ),
        "confirm",
    ))
}

fn confirm(session: &mut Session, user_message: &str) -> Result<StepOutcome> {
    match normalize_confirm(user_message) {
        Confirmation::Confirm => {
            let Some(data) = session.flow_data::<ReturnGoodsData>()? else {
                return Ok(StepOutcome::done(INCOMPLETE));
            };
            if data.order_id.is_empty() {
                return Ok(StepOutcome::done(ORDER_ID_LOST));
            }

            info!(
                session_id = %session.id,
                order_id = %data.order_id,
                "Return request submitted"
            );
            Ok(StepOutcome::done(format!(
                "退货申请已提交！\n\n订单号: {}\n退货原因: {}\n状态: 处理中\n\n我们的客服人员将在24小时内与您联系。",
                data.order_id, data.reason
            )))
        }
        Confirmation::Modify => {
            let mut data: ReturnGoodsData = session.flow_data()?.unwrap_or_default();
            data.order_id.clear();
            session.set_flow_data(&data)?;
            Ok(StepOutcome::next(ASK_AGAIN, "ask_order_id"))
        }
        Confirmation::Other(_) => Ok(StepOutcome::next(CONFIRM_PROMPT, "confirm")),
    }
}
