//! `customer_service` flow: gather a problem report and file a ticket

use async_trait::async_trait;
use chrono::Utc;
use parley_core::{sync_step, Flow, FlowContext, Result, Session, StepHandler, StepOutcome};
use parley_inference::{Ticket, TicketStatus};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Flow id
pub const FLOW_ID: &str = "customer_service";

const MENU: &str = "请问您需要什么帮助？\n1. 产品问题\n2. 订单问题\n3. 退款问题\n4. 其他";
const ASK_DESCRIPTION: &str = "请详细描述您的问题或需求。";
const ASK_CONTACT: &str = "请留下您的联系方式（电话或邮箱），以便我们及时回复您。";

/// Data collected across the flow's steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerServiceData {
    /// Menu choice or free-text category
    #[serde(default)]
    pub category: String,
    /// Problem description
    #[serde(default)]
    pub description: String,
    /// Phone or email
    #[serde(default)]
    pub contact: String,
}

/// Build the flow
pub fn flow() -> Flow {
    Flow::new(FLOW_ID)
        .step(
            "start",
            sync_step(|_session, _msg| Ok(StepOutcome::next(MENU, "ask_category"))),
        )
        .step(
            "ask_category",
            sync_step(|session, msg| {
                let mut data: CustomerServiceData = session.flow_data()?.unwrap_or_default();
                data.category = msg.trim().to_string();
                session.set_flow_data(&data)?;
                Ok(StepOutcome::next(ASK_DESCRIPTION, "ask_description"))
            }),
        )
        .step(
            "ask_description",
            sync_step(|session, msg| {
                let mut data: CustomerServiceData = session.flow_data()?.unwrap_or_default();
                data.description = msg.trim().to_string();
                session.set_flow_data(&data)?;
                Ok(StepOutcome::next(ASK_CONTACT, "ask_contact"))
            }),
        )
        .step("ask_contact", FileTicket)
}

/// Final step: files the ticket through the inference service
struct FileTicket;

#[async_trait]
impl StepHandler for FileTicket {
    async fn handle(
        &self,
        ctx: &FlowContext,
        session: &mut Session,
        user_message: &str,
    ) -> Result<StepOutcome> {
        let mut data: CustomerServiceData = session.flow_data()?.unwrap_or_default();
        data.contact = user_message.trim().to_string();
        session.set_flow_data(&data)?;

        let now = Utc::now().to_rfc3339();
        let ticket = Ticket {
            id: String::new(),
            session_id: session.id.clone(),
            user_id: session.user_id.clone(),
            intent: FLOW_ID.to_string(),
            subject: Some(data.category.clone()),
            description: format!("{}\n联系方式: {}", data.description, data.contact),
            status: TicketStatus::Open,
            created_at: now.clone(),
            updated_at: now,
        };

        let filed = ctx.call(ctx.inference().create_ticket(ticket)).await?;
        let ticket_id = if filed.id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            filed.id
        };

        info!(session_id = %session.id, %ticket_id, "Customer service ticket filed");

        Ok(StepOutcome::done(format!(
            "感谢您提供的信息！\n\n工单号: {}\n问题分类: {}\n问题描述: {}\n联系方式: {}\n\n我们的客服人员将尽快与您联系。",
            ticket_id, data.category, data.description, data.contact
        )))
    }
}
