use crate::entities::location::{self, Column, Entity};
use crate::error::Result;
use crate::store::AlertStore;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait, Order, QueryOrder};
use wxmon_alert::LocationDirectory;
use wxmon_common::types::{CreateLocationRequest, Location};

fn to_location(m: location::Model) -> Location {
    Location {
        id: m.id,
        name: m.name,
        region: m.region,
        country: m.country,
        created_at: m.created_at.with_timezone(&Utc),
    }
}

impl AlertStore {
    pub async fn create_location(&self, req: &CreateLocationRequest) -> Result<Location> {
        let am = location::ActiveModel {
            name: Set(req.name.clone()),
            region: Set(req.region.clone()),
            country: Set(req.country.clone()),
            created_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        };
        let model = am.insert(self.db()).await?;
        Ok(to_location(model))
    }

    pub async fn get_location(&self, id: i64) -> Result<Option<Location>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        Ok(model.map(to_location))
    }

    pub async fn list_locations(&self) -> Result<Vec<Location>> {
        let rows = Entity::find()
            .order_by(Column::Name, Order::Asc)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_location).collect())
    }
}

#[async_trait]
impl LocationDirectory for AlertStore {
    async fn resolve_name(&self, location_id: i64) -> anyhow::Result<Option<String>> {
        let model = Entity::find_by_id(location_id).one(self.db()).await?;
        Ok(model.map(|m| m.name))
    }
}
