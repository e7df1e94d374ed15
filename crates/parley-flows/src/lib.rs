//! Parley Flows - business conversations
//!
//! Step handlers for the guided flows the agent ships with:
//! - `order_query`: order status lookup
//! - `logistics`: shipment tracking
//! - `return_goods`: return request with confirmation
//! - `customer_service`: problem report that ends in a support ticket
//!
//! Order data is read through the [`OrderBook`] capability so deployments can
//! swap the fixture book for a real backend.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod customer_service;
pub mod logistics;
pub mod order_book;
pub mod order_query;
pub mod return_goods;
pub mod text;


pub use customer_service::CustomerServiceData;
pub use order_book::{OrderBook, StaticOrderBook};
pub use return_goods::ReturnGoodsData;
pub use text::{extract_order_id, normalize, normalize_confirm, Confirmation};

use parley_core::FlowRegistry;
use std::sync::Arc;

/// Registry with every shipped flow
pub fn default_registry(orders: Arc<dyn OrderBook>) -> FlowRegistry {
    FlowRegistry::builder()
        .flow(order_query::flow(orders.clone()))
        .flow(logistics::flow(orders))
        .flow(return_goods::flow())
        .flow(customer_service::flow())
        .build()
}
