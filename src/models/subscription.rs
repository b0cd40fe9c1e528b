use crate::entities::{
    PaymentMethod, SubscriptionStatus, SubscriptionTier, subscription_entity as sub,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    pub id: i64,
    pub status: SubscriptionStatus,
    pub tier: SubscriptionTier,
    pub payment_method: Option<PaymentMethod>,
    pub trial_message_limit: Option<i32>,
    pub total_messages_sent: i32,
    pub messages_remaining: Option<i32>,
    pub limit_reached: bool,
    pub subscription_start: Option<DateTime<Utc>>,
    pub subscription_end: Option<DateTime<Utc>>,
    pub amount_paid_cents: Option<i64>,
    pub currency: Option<String>,
}

impl From<sub::Model> for SubscriptionResponse {
    fn from(m: sub::Model) -> Self {
        let messages_remaining = m.messages_remaining();
        Self {
            id: m.id,
            status: m.status,
            tier: m.tier,
            payment_method: m.payment_method,
            trial_message_limit: m.trial_message_limit,
            total_messages_sent: m.total_messages_sent,
            messages_remaining,
            limit_reached: m.limit_reached,
            subscription_start: m.subscription_start,
            subscription_end: m.subscription_end,
            amount_paid_cents: m.amount_paid_cents,
            currency: m.currency,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionActionResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExpireSubscriptionsResponse {
    pub expired_count: u64,
}

/// A confirmed premium payment from either payment path.
#[derive(Debug, Clone)]
pub struct PremiumPayment {
    pub method: PaymentMethod,
    pub amount_cents: i64,
    pub currency: String,
    pub gcash_reference_number: Option<String>,
    pub lemonsqueezy_subscription_id: Option<String>,
}
