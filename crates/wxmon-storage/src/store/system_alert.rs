use crate::entities::system_alert::{self, Column, Entity};
use crate::error::{Result, StorageError};
use crate::store::AlertStore;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, EntityTrait, Order, QueryFilter,
    QueryOrder,
};
use wxmon_common::types::{CreateSystemAlertRequest, SystemAlert};

fn to_alert(m: system_alert::Model) -> Result<SystemAlert> {
    let severity = m
        .severity
        .parse()
        .map_err(|_| StorageError::InvalidSeverity(m.severity.clone()))?;
    Ok(SystemAlert {
        id: m.id,
        title: m.title,
        message: m.message,
        severity,
        location_id: m.location_id,
        expires_at: m.expires_at.map(|t| t.with_timezone(&Utc)),
        is_active: m.is_active,
        created_at: m.created_at.with_timezone(&Utc),
    })
}

impl AlertStore {
    pub async fn create_system_alert(&self, req: &CreateSystemAlertRequest) -> Result<SystemAlert> {
        let am = system_alert::ActiveModel {
            title: Set(req.title.clone()),
            message: Set(req.message.clone()),
            severity: Set(req.severity.to_string()),
            location_id: Set(req.location_id),
            expires_at: Set(req.expires_at.map(|t| t.fixed_offset())),
            is_active: Set(true),
            created_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        };
        let model = am.insert(self.db()).await?;
        to_alert(model)
    }

    /// Alerts still shown to clients: active flag set and not expired
    /// at `now`.
    pub async fn list_active_system_alerts(&self, now: DateTime<Utc>) -> Result<Vec<SystemAlert>> {
        let rows = Entity::find()
            .filter(Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(Column::ExpiresAt.is_null())
                    .add(Column::ExpiresAt.gt(now.fixed_offset())),
            )
            .order_by(Column::CreatedAt, Order::Desc)
            .all(self.db())
            .await?;
        rows.into_iter().map(to_alert).collect()
    }

    /// Retires a broadcast before its expiry.
    pub async fn deactivate_system_alert(&self, id: i64) -> Result<SystemAlert> {
        let model = Entity::find_by_id(id)
            .one(self.db())
            .await?
            .ok_or(StorageError::NotFound {
                entity: "system_alert",
                id,
            })?;
        let mut am: system_alert::ActiveModel = model.into();
        am.is_active = Set(false);
        let model = am.update(self.db()).await?;
        to_alert(model)
    }
}
