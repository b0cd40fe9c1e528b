use crate::entities::{NotificationType, user_notification_entity as un};
use crate::error::{AppError, AppResult};
use crate::models::{NotificationResponse, PaginatedResponse, PaginationParams};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

#[derive(Clone)]
pub struct NotificationService {
    pool: DatabaseConnection,
}

impl NotificationService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Inserts on any connection so callers can join an open transaction.
    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        user_id: i64,
        kind: NotificationType,
        title: &str,
        message: &str,
    ) -> AppResult<un::Model> {
        let row = un::ActiveModel {
            user_id: Set(user_id),
            notification_type: Set(kind),
            title: Set(title.to_string()),
            message: Set(message.to_string()),
            is_read: Set(false),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        Ok(row)
    }

    pub async fn list(
        &self,
        user_id: i64,
        params: PaginationParams,
    ) -> AppResult<PaginatedResponse<NotificationResponse>> {
        let base = un::Entity::find().filter(un::Column::UserId.eq(user_id));
        let total = base.clone().count(&self.pool).await?;

        let rows = base
            .order_by_desc(un::Column::CreatedAt)
            .order_by_desc(un::Column::Id)
            .offset(params.offset())
            .limit(params.page_size())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            rows.into_iter().map(NotificationResponse::from).collect(),
            params.page(),
            params.page_size(),
            total,
        ))
    }

    pub async fn mark_read(&self, user_id: i64, notification_id: i64) -> AppResult<()> {
        let res = un::Entity::update_many()
            .col_expr(un::Column::IsRead, Expr::value(true))
            .filter(un::Column::Id.eq(notification_id))
            .filter(un::Column::UserId.eq(user_id))
            .exec(&self.pool)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Notification not found".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    #[tokio::test]
    async fn list_is_newest_first_and_paginated() {
        let db = test_db().await;
        let u = insert_user(&db, "a@example.com").await;
        for i in 0..3 {
            NotificationService::create(
                &db,
                u.id,
                NotificationType::PaymentApproved,
                &format!("n{i}"),
                "body",
            )
            .await
            .unwrap();
        }
        let svc = NotificationService::new(db);
        let page = svc
            .list(
                u.id,
                PaginationParams {
                    page: Some(1),
                    page_size: Some(2),
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.data[0].title, "n2");
        assert_eq!(page.data[1].title, "n1");
    }

    #[tokio::test]
    async fn mark_read_only_touches_own_rows() {
        let db = test_db().await;
        let owner = insert_user(&db, "owner@example.com").await;
        let other = insert_user(&db, "other@example.com").await;
        let n = NotificationService::create(
            &db,
            owner.id,
            NotificationType::SubscriptionExpired,
            "t",
            "m",
        )
        .await
        .unwrap();
        let svc = NotificationService::new(db.clone());

        let err = svc.mark_read(other.id, n.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        svc.mark_read(owner.id, n.id).await.unwrap();
        let row = un::Entity::find_by_id(n.id).one(&db).await.unwrap().unwrap();
        assert!(row.is_read);
    }
}
