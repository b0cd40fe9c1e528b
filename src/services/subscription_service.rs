use crate::config::SubscriptionConfig;
use crate::entities::{
    NotificationType, SubscriptionStatus, SubscriptionTier, subscription_entity as sub,
};
use crate::error::{AppError, AppResult};
use crate::models::{PremiumPayment, SubscriptionActionResponse, SubscriptionResponse};
use crate::services::NotificationService;
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, Set, TransactionTrait,
};

#[derive(Clone)]
pub struct SubscriptionService {
    pool: DatabaseConnection,
    cfg: SubscriptionConfig,
}

impl SubscriptionService {
    pub fn new(pool: DatabaseConnection, cfg: SubscriptionConfig) -> Self {
        Self { pool, cfg }
    }

    pub fn trial_messages(&self) -> i32 {
        self.cfg.trial_messages
    }

    pub async fn create_trial<C: ConnectionTrait>(
        conn: &C,
        user_id: i64,
        trial_messages: i32,
    ) -> AppResult<sub::Model> {
        let now = Utc::now();
        let row = sub::ActiveModel {
            user_id: Set(user_id),
            status: Set(SubscriptionStatus::Trial),
            tier: Set(SubscriptionTier::Free),
            trial_message_limit: Set(Some(trial_messages)),
            total_messages_sent: Set(0),
            limit_reached: Set(false),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        Ok(row)
    }

    pub async fn find(&self, user_id: i64) -> AppResult<Option<sub::Model>> {
        Ok(sub::Entity::find()
            .filter(sub::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?)
    }

    /// Users that predate subscriptions get a fresh trial on first use.
    pub async fn get_or_create(&self, user_id: i64) -> AppResult<sub::Model> {
        if let Some(existing) = self.find(user_id).await? {
            return Ok(existing);
        }
        log::info!("Creating trial subscription for user {user_id}");
        match Self::create_trial(&self.pool, user_id, self.cfg.trial_messages).await {
            Ok(row) => Ok(row),
            // lost a race with a concurrent insert on the unique user_id
            Err(e) => self.find(user_id).await?.ok_or(e),
        }
    }

    pub async fn check(&self, user_id: i64) -> AppResult<SubscriptionResponse> {
        let s = self.get_or_create(user_id).await?;
        Ok(SubscriptionResponse::from(s))
    }

    pub async fn cancel(&self, user_id: i64) -> AppResult<SubscriptionActionResponse> {
        let s = self
            .find(user_id)
            .await?
            .ok_or_else(|| AppError::ValidationError("No active subscription".into()))?;
        if s.status != SubscriptionStatus::Active {
            return Err(AppError::ValidationError(
                "Only active subscriptions can be cancelled".into(),
            ));
        }
        let end = s.subscription_end;
        let mut am = s.into_active_model();
        am.status = Set(SubscriptionStatus::Cancelled);
        am.updated_at = Set(Some(Utc::now()));
        am.update(&self.pool).await?;

        let until = end
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "the end of the current period".to_string());
        Ok(SubscriptionActionResponse {
            message: format!("Subscription cancelled. Access until {until}"),
        })
    }

    pub async fn reactivate(&self, user_id: i64) -> AppResult<SubscriptionActionResponse> {
        let s = self
            .find(user_id)
            .await?
            .ok_or_else(|| AppError::ValidationError("Subscription not cancelled".into()))?;
        if s.status != SubscriptionStatus::Cancelled {
            return Err(AppError::ValidationError(
                "Only cancelled subscriptions can be reactivated".into(),
            ));
        }
        match s.subscription_end {
            Some(end) if end > Utc::now() => {}
            _ => {
                return Err(AppError::ValidationError(
                    "Subscription period has ended, please subscribe again".into(),
                ));
            }
        }
        let mut am = s.into_active_model();
        am.status = Set(SubscriptionStatus::Active);
        am.updated_at = Set(Some(Utc::now()));
        am.update(&self.pool).await?;
        Ok(SubscriptionActionResponse {
            message: "Subscription reactivated".into(),
        })
    }

    pub async fn activate_premium<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: i64,
        payment: PremiumPayment,
    ) -> AppResult<sub::Model> {
        let existing = sub::Entity::find()
            .filter(sub::Column::UserId.eq(user_id))
            .one(conn)
            .await?;
        let existing = match existing {
            Some(s) => s,
            None => Self::create_trial(conn, user_id, self.cfg.trial_messages).await?,
        };

        let now = Utc::now();
        let mut am = existing.into_active_model();
        am.status = Set(SubscriptionStatus::Active);
        am.tier = Set(SubscriptionTier::Premium);
        am.payment_method = Set(Some(payment.method));
        am.subscription_start = Set(Some(now));
        am.subscription_end = Set(Some(now + Duration::days(self.cfg.premium_period_days)));
        am.trial_message_limit = Set(None);
        am.limit_reached = Set(false);
        am.amount_paid_cents = Set(Some(payment.amount_cents));
        am.currency = Set(Some(payment.currency));
        if payment.gcash_reference_number.is_some() {
            am.gcash_reference_number = Set(payment.gcash_reference_number);
        }
        if payment.lemonsqueezy_subscription_id.is_some() {
            am.lemonsqueezy_subscription_id = Set(payment.lemonsqueezy_subscription_id);
        }
        am.updated_at = Set(Some(now));
        let updated = am.update(conn).await?;
        log::info!("Premium activated for user {user_id} via {}", payment.method);
        Ok(updated)
    }

    /// Renewal from the card provider. Only the period end moves, a
    /// cancelled row stays cancelled. Returns false for an unknown id.
    pub async fn extend_by_provider_id(&self, provider_id: &str) -> AppResult<bool> {
        let now = Utc::now();
        let res = sub::Entity::update_many()
            .col_expr(
                sub::Column::SubscriptionEnd,
                Expr::value(now + Duration::days(self.cfg.premium_period_days)),
            )
            .col_expr(sub::Column::UpdatedAt, Expr::value(now))
            .filter(sub::Column::LemonsqueezySubscriptionId.eq(provider_id))
            .exec(&self.pool)
            .await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn mark_cancelled_by_provider_id(&self, provider_id: &str) -> AppResult<bool> {
        let res = sub::Entity::update_many()
            .col_expr(sub::Column::Status, Expr::value(SubscriptionStatus::Cancelled))
            .col_expr(sub::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(sub::Column::LemonsqueezySubscriptionId.eq(provider_id))
            .filter(sub::Column::Status.eq(SubscriptionStatus::Active))
            .exec(&self.pool)
            .await?;
        Ok(res.rows_affected > 0)
    }

    /// Counts one sent message. Returns the updated row and whether this
    /// message used up the trial.
    pub async fn record_message_sent(&self, user_id: i64) -> AppResult<(sub::Model, bool)> {
        let now = Utc::now();
        sub::Entity::update_many()
            .col_expr(
                sub::Column::TotalMessagesSent,
                Expr::col(sub::Column::TotalMessagesSent).add(1),
            )
            .col_expr(sub::Column::UpdatedAt, Expr::value(now))
            .filter(sub::Column::UserId.eq(user_id))
            .exec(&self.pool)
            .await?;

        let s = self
            .find(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Subscription not found".into()))?;

        let reached = s.status == SubscriptionStatus::Trial
            && !s.limit_reached
            && s.total_messages_sent >= s.trial_message_limit.unwrap_or(0);
        if !reached {
            return Ok((s, false));
        }

        let mut am = s.into_active_model();
        am.limit_reached = Set(true);
        am.limit_reached_at = Set(Some(now));
        let s = am.update(&self.pool).await?;
        Ok((s, true))
    }

    /// Returns cancelled subscriptions whose period ended to a fresh trial.
    pub async fn expire_cancelled(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let due = sub::Entity::find()
            .filter(sub::Column::Status.eq(SubscriptionStatus::Cancelled))
            .filter(sub::Column::SubscriptionEnd.lte(now))
            .all(&self.pool)
            .await?;

        let mut expired = 0u64;
        for s in due {
            let user_id = s.user_id;
            let txn = self.pool.begin().await?;
            let new_limit = s.total_messages_sent + self.cfg.trial_messages;
            let mut am = s.into_active_model();
            am.status = Set(SubscriptionStatus::Trial);
            am.tier = Set(SubscriptionTier::Free);
            am.payment_method = Set(None);
            am.subscription_start = Set(None);
            am.subscription_end = Set(None);
            am.trial_message_limit = Set(Some(new_limit));
            am.limit_reached = Set(false);
            am.limit_reached_at = Set(None);
            am.updated_at = Set(Some(now));
            am.update(&txn).await?;

            NotificationService::create(
                &txn,
                user_id,
                NotificationType::SubscriptionExpired,
                "Subscription Expired",
                &format!(
                    "Your Premium access has ended. You have {} free messages to keep exploring.",
                    self.cfg.trial_messages
                ),
            )
            .await?;
            txn.commit().await?;
            expired += 1;
        }

        if expired > 0 {
            log::info!("Expired {expired} cancelled subscriptions");
        }
        Ok(expired)
    }
}
