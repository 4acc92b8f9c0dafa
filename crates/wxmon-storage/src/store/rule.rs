use crate::entities::alert_rule::{self, Column, Entity};
use crate::error::{Result, StorageError};
use crate::store::AlertStore;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, ModelTrait, Order, QueryFilter,
    QueryOrder,
};
use wxmon_alert::RuleStore;
use wxmon_common::types::{AlertRule, CreateRuleRequest, UpdateRuleRequest};

fn to_rule(m: alert_rule::Model) -> Result<AlertRule> {
    let metric = m
        .metric_type
        .parse()
        .map_err(|_| StorageError::InvalidMetric(m.metric_type.clone()))?;
    Ok(AlertRule {
        id: m.id,
        user_id: m.user_id,
        location_id: m.location_id,
        metric,
        threshold: m.threshold,
        is_active: m.is_active,
        description: m.description,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    })
}

impl AlertStore {
    pub async fn create_rule(&self, req: &CreateRuleRequest) -> Result<AlertRule> {
        let now = Utc::now().fixed_offset();
        let am = alert_rule::ActiveModel {
            user_id: Set(req.user_id),
            location_id: Set(req.location_id),
            metric_type: Set(req.metric.to_string()),
            threshold: Set(req.threshold),
            is_active: Set(req.is_active),
            description: Set(req.description.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = am.insert(self.db()).await?;
        to_rule(model)
    }

    pub async fn get_rule(&self, id: i64) -> Result<Option<AlertRule>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        model.map(to_rule).transpose()
    }

    pub async fn list_rules_for_user(&self, user_id: i64) -> Result<Vec<AlertRule>> {
        let rows = Entity::find()
            .filter(Column::UserId.eq(user_id))
            .order_by(Column::CreatedAt, Order::Desc)
            .all(self.db())
            .await?;
        rows.into_iter().map(to_rule).collect()
    }

    /// Owner-scoped update: threshold, active flag, and description are
    /// each optional; omitted fields are left untouched.
    pub async fn update_rule(
        &self,
        id: i64,
        user_id: i64,
        req: &UpdateRuleRequest,
    ) -> Result<AlertRule> {
        let model = Entity::find_by_id(id)
            .filter(Column::UserId.eq(user_id))
            .one(self.db())
            .await?
            .ok_or(StorageError::NotFound {
                entity: "alert_rule",
                id,
            })?;

        let mut am: alert_rule::ActiveModel = model.into();
        if let Some(threshold) = req.threshold {
            am.threshold = Set(threshold);
        }
        if let Some(is_active) = req.is_active {
            am.is_active = Set(is_active);
        }
        if let Some(description) = &req.description {
            am.description = Set(Some(description.clone()));
        }
        am.updated_at = Set(Utc::now().fixed_offset());
        let model = am.update(self.db()).await?;
        to_rule(model)
    }

    /// Owner-scoped delete. Returns false when the rule does not exist
    /// or belongs to another user.
    pub async fn delete_rule(&self, id: i64, user_id: i64) -> Result<bool> {
        let model = Entity::find_by_id(id)
            .filter(Column::UserId.eq(user_id))
            .one(self.db())
            .await?;
        match model {
            Some(model) => {
                model.delete(self.db()).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_active(&self) -> Result<Vec<AlertRule>> {
        let rows = Entity::find()
            .filter(Column::IsActive.eq(true))
            .all(self.db())
            .await?;
        rows.into_iter().map(to_rule).collect()
    }

    async fn list_active_for(&self, location_id: i64, user_id: i64) -> Result<Vec<AlertRule>> {
        let rows = Entity::find()
            .filter(Column::IsActive.eq(true))
            .filter(Column::LocationId.eq(location_id))
            .filter(Column::UserId.eq(user_id))
            .all(self.db())
            .await?;
        rows.into_iter().map(to_rule).collect()
    }
}

#[async_trait]
impl RuleStore for AlertStore {
    async fn list_active_rules(&self) -> anyhow::Result<Vec<AlertRule>> {
        Ok(self.list_active().await?)
    }

    async fn list_active_rules_for_location(
        &self,
        location_id: i64,
        user_id: i64,
    ) -> anyhow::Result<Vec<AlertRule>> {
        Ok(self.list_active_for(location_id, user_id).await?)
    }
}
