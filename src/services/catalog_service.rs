use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::models::{Equipment, Insurance, Vehicle};
use crate::services::api_client::ApiClient;

/// A rentable catalog resource and where it lives
pub trait CatalogItem: Serialize + DeserializeOwned {
    const PATH: &'static str;
    const NAME: &'static str;

    /// Backend id; `None` before creation
    fn id(&self) -> Option<i64>;
}

impl CatalogItem for Vehicle {
    const PATH: &'static str = "/vehicles";
    const NAME: &'static str = "vehicles";

    fn id(&self) -> Option<i64> {
        self.id
    }
}

impl CatalogItem for Equipment {
    const PATH: &'static str = "/equipment";
    const NAME: &'static str = "equipment";

    fn id(&self) -> Option<i64> {
        self.id
    }
}

impl CatalogItem for Insurance {
    const PATH: &'static str = "/insurances";
    const NAME: &'static str = "insurances";

    fn id(&self) -> Option<i64> {
        self.id
    }
}

/// Web-shop catalog CRUD
#[derive(Clone)]
pub struct CatalogService {
    client: ApiClient,
}

impl CatalogService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list<T: CatalogItem>(&self) -> Result<Vec<T>> {
        let items: Vec<T> = self.client.get_json(T::PATH).await?;
        log::debug!("📋 {} {} loaded", items.len(), T::NAME);
        Ok(items)
    }

    pub async fn list_available<T: CatalogItem>(&self) -> Result<Vec<T>> {
        self.client
            .get_json(&format!("{}/available", T::PATH))
            .await
    }

    pub async fn get<T: CatalogItem>(&self, id: i64) -> Result<T> {
        self.client.get_json(&format!("{}/{}", T::PATH, id)).await
    }

    pub async fn create<T: CatalogItem>(&self, item: &T) -> Result<T> {
        log::info!("➕ Creating {} entry", T::NAME);
        self.client
            .post_json(&format!("{}/create", T::PATH), item)
            .await
    }

    pub async fn update<T: CatalogItem>(&self, id: i64, item: &T) -> Result<T> {
        log::info!("✏️ Updating {} {}", T::NAME, id);
        self.client
            .put_json(&format!("{}/{}", T::PATH, id), item)
            .await
    }

    pub async fn delete<T: CatalogItem>(&self, id: i64) -> Result<String> {
        log::info!("🗑️ Deleting {} {}", T::NAME, id);
        self.client.delete(&format!("{}/{}", T::PATH, id)).await
    }
}
