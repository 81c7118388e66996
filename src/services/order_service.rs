use crate::error::Result;
use crate::models::{Order, OrderRequest, OrderStatusView};
use crate::services::api_client::ApiClient;

/// Web-shop orders. Status is owned by the backend and only ever re-fetched.
#[derive(Clone)]
pub struct OrderService {
    client: ApiClient,
}

impl OrderService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, request: &OrderRequest) -> Result<Order> {
        let order: Order = self.client.post_json("/orders", request).await?;
        log::info!("🧾 Order {} created ({})", order.id, order.order_status.as_str());
        Ok(order)
    }

    pub async fn get(&self, id: i64) -> Result<Order> {
        self.client.get_json(&format!("/orders/{}", id)).await
    }

    /// Orders of the signed-in user
    pub async fn list_mine(&self) -> Result<Vec<Order>> {
        self.client.get_json("/orders").await
    }

    pub async fn status(&self, merchant_order_id: &str) -> Result<OrderStatusView> {
        let view: OrderStatusView = self
            .client
            .get_json(&format!(
                "/orders/status?merchantOrderId={}",
                urlencoding::encode(merchant_order_id)
            ))
            .await?;
        log::info!(
            "🔎 Order {} is {}",
            merchant_order_id,
            view.order_status.as_str()
        );
        Ok(view)
    }
}
