use crate::config::GcashConfig;
use crate::entities::{
    NotificationType, PaymentMethod, ReceiptValidationStatus, SubscriptionStatus,
    payment_receipt_entity as pr,
};
use crate::error::{AppError, AppResult};
use crate::external::{AnthropicClient, LemonSqueezyService, ReceiptExpectation, WebhookEvent};
use crate::models::*;
use crate::services::{NotificationService, ReceiptStorage, StoredReceipt, SubscriptionService};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

const APPROVED_TITLE: &str = "Payment Approved";
const APPROVED_MESSAGE: &str = "Your Premium subscription is now active!";

/// A receipt screenshot as received from the multipart form.
#[derive(Debug, Clone)]
pub struct ReceiptUpload {
    pub image: Vec<u8>,
    pub content_type: Option<String>,
    pub reference_number: Option<String>,
}

fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

#[derive(Clone)]
pub struct PaymentService {
    pool: DatabaseConnection,
    anthropic: AnthropicClient,
    lemonsqueezy: LemonSqueezyService,
    subscriptions: SubscriptionService,
    storage: ReceiptStorage,
    gcash: GcashConfig,
}

impl PaymentService {
    pub fn new(
        pool: DatabaseConnection,
        anthropic: AnthropicClient,
        lemonsqueezy: LemonSqueezyService,
        subscriptions: SubscriptionService,
        storage: ReceiptStorage,
        gcash: GcashConfig,
    ) -> Self {
        Self {
            pool,
            anthropic,
            lemonsqueezy,
            subscriptions,
            storage,
            gcash,
        }
    }

    pub fn max_receipt_bytes(&self) -> usize {
        self.gcash.max_receipt_bytes
    }

    pub async fn upload_receipt(
        &self,
        user_id: i64,
        upload: ReceiptUpload,
    ) -> AppResult<UploadReceiptResponse> {
        let reference = upload
            .reference_number
            .map(|r| r.trim().to_uppercase())
            .filter(|r| !r.is_empty());
        let (Some(reference), false) = (reference, upload.image.is_empty()) else {
            return Err(AppError::ValidationError("Missing file or reference".into()));
        };
        let content_type = upload.content_type.unwrap_or_default();
        let ext = image_extension(&content_type).ok_or_else(|| {
            AppError::ValidationError("Receipt must be a JPEG, PNG, WebP or GIF image".into())
        })?;
        if upload.image.len() > self.gcash.max_receipt_bytes {
            return Err(AppError::ValidationError("Receipt image is too large".into()));
        }

        let reused = pr::Entity::find()
            .filter(pr::Column::ReferenceNumber.eq(reference.as_str()))
            .filter(pr::Column::ValidationStatus.eq(ReceiptValidationStatus::Approved))
            .one(&self.pool)
            .await?;
        if reused.is_some() {
            return Err(AppError::ValidationError(
                "This reference number has already been used".into(),
            ));
        }

        let analysis = self
            .anthropic
            .analyze_receipt(
                &upload.image,
                &content_type,
                &ReceiptExpectation {
                    amount_pesos: self.gcash.amount_pesos,
                    recipient_name: self.gcash.recipient_name.clone(),
                },
            )
            .await?;

        let status = if analysis.valid {
            ReceiptValidationStatus::Approved
        } else {
            ReceiptValidationStatus::Rejected
        };

        let stored = self.storage.save(user_id, &upload.image, ext).await?;
        if let Err(err) = self
            .record_receipt(user_id, &stored, &analysis, status, reference)
            .await
        {
            self.storage.remove(&stored.key).await;
            return Err(err);
        }

        let message = if analysis.valid {
            "Payment approved! Premium activated.".to_string()
        } else {
            log::info!("Receipt rejected for user {user_id}: {:?}", analysis.reason);
            format!(
                "Payment rejected: {}",
                analysis.reason.as_deref().unwrap_or("receipt could not be verified")
            )
        };
        Ok(UploadReceiptResponse {
            valid: analysis.valid,
            message,
        })
    }

    async fn record_receipt(
        &self,
        user_id: i64,
        stored: &StoredReceipt,
        analysis: &ReceiptAnalysis,
        status: ReceiptValidationStatus,
        reference: String,
    ) -> AppResult<()> {
        let txn = self.pool.begin().await?;
        pr::ActiveModel {
            user_id: Set(user_id),
            receipt_image_url: Set(stored.public_url.clone()),
            analysis: Set(serde_json::to_value(analysis)?),
            validation_status: Set(status),
            reference_number: Set(reference.clone()),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        if analysis.valid {
            self.subscriptions
                .activate_premium(
                    &txn,
                    user_id,
                    PremiumPayment {
                        method: PaymentMethod::Gcash,
                        amount_cents: self.gcash.amount_pesos * 100,
                        currency: "PHP".into(),
                        gcash_reference_number: Some(reference),
                        lemonsqueezy_subscription_id: None,
                    },
                )
                .await?;
            NotificationService::create(
                &txn,
                user_id,
                NotificationType::PaymentApproved,
                APPROVED_TITLE,
                APPROVED_MESSAGE,
            )
            .await?;
        }
        txn.commit().await?;
        Ok(())
    }

    pub fn checkout_url(&self, user_id: i64) -> AppResult<CheckoutUrlResponse> {
        Ok(CheckoutUrlResponse {
            checkout_url: self.lemonsqueezy.checkout_url(user_id)?,
        })
    }

    /// Verifies and applies a LemonSqueezy webhook delivery.
    pub async fn handle_webhook(&self, body: &[u8], signature: &str) -> AppResult<()> {
        self.lemonsqueezy.verify_signature(body, signature)?;
        let event = self.lemonsqueezy.parse_event(body)?;
        log::info!("LemonSqueezy webhook: {event:?}");

        match event {
            WebhookEvent::SubscriptionCreated {
                user_id,
                subscription_id,
            } => {
                let current = self.subscriptions.find(user_id).await?;
                if current.is_some_and(|s| {
                    s.status == SubscriptionStatus::Active
                        && s.lemonsqueezy_subscription_id.as_deref() == Some(subscription_id.as_str())
                }) {
                    log::info!("Subscription {subscription_id} already active for user {user_id}");
                    return Ok(());
                }
                let txn = self.pool.begin().await?;
                self.subscriptions
                    .activate_premium(
                        &txn,
                        user_id,
                        PremiumPayment {
                            method: PaymentMethod::Lemonsqueezy,
                            amount_cents: self.lemonsqueezy.amount_cents(),
                            currency: self.lemonsqueezy.currency().to_string(),
                            gcash_reference_number: None,
                            lemonsqueezy_subscription_id: Some(subscription_id),
                        },
                    )
                    .await?;
                NotificationService::create(
                    &txn,
                    user_id,
                    NotificationType::PaymentApproved,
                    APPROVED_TITLE,
                    APPROVED_MESSAGE,
                )
                .await?;
                txn.commit().await?;
            }
            WebhookEvent::SubscriptionUpdated { subscription_id } => {
                if !self.subscriptions.extend_by_provider_id(&subscription_id).await? {
                    log::warn!("Renewal for unknown subscription {subscription_id}");
                }
            }
            WebhookEvent::SubscriptionCancelled { subscription_id } => {
                if !self
                    .subscriptions
                    .mark_cancelled_by_provider_id(&subscription_id)
                    .await?
                {
                    log::warn!("Cancellation for unknown subscription {subscription_id}");
                }
            }
            WebhookEvent::Ignored(name) => {
                log::debug!("Ignoring LemonSqueezy event {name}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{
        AnthropicConfig, LemonSqueezyConfig, StorageConfig, SubscriptionConfig,
    };
    use crate::entities::{SubscriptionTier, user_notification_entity as un};
    use crate::external::lemonsqueezy::sign;
    use crate::test_support::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) const WEBHOOK_SECRET: &str = "whsec_test";

    pub(crate) fn service(
        db: &DatabaseConnection,
        anthropic_url: &str,
        receipts_dir: &std::path::Path,
    ) -> PaymentService {
        PaymentService::new(
            db.clone(),
            AnthropicClient::new(AnthropicConfig {
                api_key: "k".into(),
                base_url: anthropic_url.to_string(),
                ..Default::default()
            }),
            LemonSqueezyService::new(LemonSqueezyConfig {
                webhook_secret: WEBHOOK_SECRET.into(),
                checkout_url: "https://clarity.lemonsqueezy.com/checkout/buy/x".into(),
                ..Default::default()
            }),
            SubscriptionService::new(db.clone(), SubscriptionConfig::default()),
            ReceiptStorage::new(&StorageConfig {
                receipts_dir: receipts_dir.to_string_lossy().into_owned(),
                public_base_url: "http://localhost/receipts".into(),
            }),
            GcashConfig::default(),
        )
    }

    async fn mount_verdict(server: &MockServer, verdict: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": verdict.to_string()}]
            })))
            .mount(server)
            .await;
    }

    fn upload(reference: &str) -> ReceiptUpload {
        ReceiptUpload {
            image: b"\x89PNG fake".to_vec(),
            content_type: Some("image/png".into()),
            reference_number: Some(reference.into()),
        }
    }

    #[tokio::test]
    async fn invalid_receipt_leaves_subscription_unchanged() {
        let server = MockServer::start().await;
        mount_verdict(&server, json!({"valid": false, "reason": "Amount is 199"})).await;
        let dir = tempfile::tempdir().unwrap();
        let db = test_db().await;
        let u = insert_user(&db, "r@example.com").await;
        insert_trial(&db, u.id, 20, 5).await;
        let svc = service(&db, &server.uri(), dir.path());

        let resp = svc.upload_receipt(u.id, upload("GC111111")).await.unwrap();
        assert!(!resp.valid);
        assert_eq!(resp.message, "Payment rejected: Amount is 199");

        let s = svc.subscriptions.find(u.id).await.unwrap().unwrap();
        assert_eq!(s.status, SubscriptionStatus::Trial);
        let receipt = pr::Entity::find().one(&db).await.unwrap().unwrap();
        assert_eq!(receipt.validation_status, ReceiptValidationStatus::Rejected);
    }

    #[tokio::test]
    async fn valid_receipt_activates_premium_and_notifies() {
        let server = MockServer::start().await;
        mount_verdict(
            &server,
            json!({"valid": true, "amount": "299", "reference": "GC222222", "date": "2025-10-01", "recipient": "Clarity"}),
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let db = test_db().await;
        let u = insert_user(&db, "v@example.com").await;
        insert_trial(&db, u.id, 20, 20).await;
        let svc = service(&db, &server.uri(), dir.path());

        let resp = svc.upload_receipt(u.id, upload("gc222222")).await.unwrap();
        assert!(resp.valid);

        let s = svc.subscriptions.find(u.id).await.unwrap().unwrap();
        assert_eq!(s.status, SubscriptionStatus::Active);
        assert_eq!(s.tier, SubscriptionTier::Premium);
        assert_eq!(s.payment_method, Some(PaymentMethod::Gcash));
        assert_eq!(s.amount_paid_cents, Some(29_900));
        assert!(!s.limit_reached);
        assert_eq!(s.gcash_reference_number.as_deref(), Some("GC222222"));

        let notes = un::Entity::find().all(&db).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].notification_type, NotificationType::PaymentApproved);

        // the same reference cannot buy a second period
        let err = svc.upload_receipt(u.id, upload("GC222222")).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn upload_rejects_missing_or_non_image() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let db = test_db().await;
        let svc = service(&db, &server.uri(), dir.path());

        let mut no_ref = upload("GC1");
        no_ref.reference_number = None;
        assert!(svc.upload_receipt(1, no_ref).await.is_err());

        let mut pdf = upload("GC1");
        pdf.content_type = Some("application/pdf".into());
        assert!(matches!(
            svc.upload_receipt(1, pdf).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn webhook_lifecycle() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let db = test_db().await;
        let u = insert_user(&db, "w@example.com").await;
        let svc = service(&db, &server.uri(), dir.path());

        let created = json!({
            "meta": {"event_name": "subscription_created", "custom_data": {"user_id": u.id}},
            "data": {"id": "ls_1", "attributes": {}}
        })
        .to_string();
        svc.handle_webhook(created.as_bytes(), &sign(WEBHOOK_SECRET, created.as_bytes()))
            .await
            .unwrap();
        let s = svc.subscriptions.find(u.id).await.unwrap().unwrap();
        assert_eq!(s.status, SubscriptionStatus::Active);
        assert_eq!(s.lemonsqueezy_subscription_id.as_deref(), Some("ls_1"));
        assert_eq!(s.currency.as_deref(), Some("USD"));

        let cancelled = json!({
            "meta": {"event_name": "subscription_cancelled"},
            "data": {"id": "ls_1"}
        })
        .to_string();
        svc.handle_webhook(
            cancelled.as_bytes(),
            &sign(WEBHOOK_SECRET, cancelled.as_bytes()),
        )
        .await
        .unwrap();
        let s = svc.subscriptions.find(u.id).await.unwrap().unwrap();
        assert_eq!(s.status, SubscriptionStatus::Cancelled);
    }

    #[tokio::test]
    async fn webhook_bad_signature_is_auth_error() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let db = test_db().await;
        let svc = service(&db, &server.uri(), dir.path());
        let err = svc
            .handle_webhook(b"{}", &sign("other-secret", b"{}"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthError(_)));
    }

    #[tokio::test]
    async fn failed_analysis_stores_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let db = test_db().await;
        let u = insert_user(&db, "f@example.com").await;
        insert_trial(&db, u.id, 20, 5).await;
        let svc = service(&db, &server.uri(), dir.path());

        let err = svc.upload_receipt(u.id, upload("GC333333")).await.unwrap_err();
        assert!(matches!(err, AppError::ExternalApiError(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(pr::Entity::find().one(&db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn redelivered_creation_notifies_once() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let db = test_db().await;
        let u = insert_user(&db, "d@example.com").await;
        let svc = service(&db, &server.uri(), dir.path());

        let created = json!({
            "meta": {"event_name": "subscription_created", "custom_data": {"user_id": u.id}},
            "data": {"id": "ls_9", "attributes": {}}
        })
        .to_string();
        let signature = sign(WEBHOOK_SECRET, created.as_bytes());
        svc.handle_webhook(created.as_bytes(), &signature).await.unwrap();
        let first = svc.subscriptions.find(u.id).await.unwrap().unwrap();
        svc.handle_webhook(created.as_bytes(), &signature).await.unwrap();

        let notes = un::Entity::find().all(&db).await.unwrap();
        assert_eq!(notes.len(), 1);
        let second = svc.subscriptions.find(u.id).await.unwrap().unwrap();
        assert_eq!(second.subscription_end, first.subscription_end);
    }
}
