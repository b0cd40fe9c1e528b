use crate::entities::{
    MessageRole, birth_detail_entity as bd, conversation_entity as conv,
    vedic_chart_entity as vc,
};
use crate::error::{AppError, AppResult};
use crate::external::{ChatTurn, PerplexityClient};
use crate::models::*;
use crate::services::{BirthDetailService, SubscriptionService};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

const CONTEXT_MESSAGES: u64 = 20;
const HISTORY_MESSAGES: u64 = 50;
const MAX_MESSAGE_CHARS: usize = 4000;

#[derive(Clone)]
pub struct ChatService {
    pool: DatabaseConnection,
    perplexity: PerplexityClient,
    subscriptions: SubscriptionService,
    birth_details: BirthDetailService,
}

impl ChatService {
    pub fn new(
        pool: DatabaseConnection,
        perplexity: PerplexityClient,
        subscriptions: SubscriptionService,
        birth_details: BirthDetailService,
    ) -> Self {
        Self {
            pool,
            perplexity,
            subscriptions,
            birth_details,
        }
    }

    pub async fn send_message(
        &self,
        user_id: i64,
        request: SendMessageRequest,
    ) -> AppResult<SendMessageResponse> {
        let message = request.message.trim().to_string();
        if message.is_empty() {
            return Err(AppError::ValidationError("Message cannot be empty".into()));
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AppError::ValidationError("Message is too long".into()));
        }

        let subscription = self.subscriptions.get_or_create(user_id).await?;
        if subscription.trial_exhausted() {
            return Err(AppError::TrialLimitReached);
        }

        let (birth, chart) = self
            .birth_details
            .active_with_chart(user_id)
            .await?
            .ok_or_else(|| AppError::ValidationError("No birth details found".into()))?;

        let mut recent = conv::Entity::find()
            .filter(conv::Column::UserId.eq(user_id))
            .filter(conv::Column::BirthDetailId.eq(birth.id))
            .order_by_desc(conv::Column::CreatedAt)
            .order_by_desc(conv::Column::Id)
            .limit(CONTEXT_MESSAGES)
            .all(&self.pool)
            .await?;
        recent.reverse();

        let mut turns = vec![ChatTurn::new(
            MessageRole::System.as_str(),
            system_prompt(&birth, chart.as_ref()),
        )];
        turns.extend(normalize_history(&recent));
        turns.push(ChatTurn::new(MessageRole::User.as_str(), message.clone()));

        self.insert_message(user_id, birth.id, MessageRole::User, &message, None, false)
            .await?;

        let completion = self.perplexity.complete(&turns).await?;

        self.insert_message(
            user_id,
            birth.id,
            MessageRole::Assistant,
            &completion.content,
            Some(serde_json::to_value(&completion.citations)?),
            false,
        )
        .await?;

        let (subscription, limit_reached) = self.subscriptions.record_message_sent(user_id).await?;
        if limit_reached {
            log::info!("User {user_id} reached the trial message limit");
            let text = format!(
                "You've reached your {} free messages. Subscribe to Premium for unlimited access to continue your journey with Clarity.",
                self.subscriptions.trial_messages()
            );
            self.insert_message(user_id, birth.id, MessageRole::System, &text, None, true)
                .await?;
        }

        Ok(SendMessageResponse {
            message: completion.content,
            limit_reached,
            messages_remaining: subscription.messages_remaining(),
        })
    }

    pub async fn history(&self, user_id: i64) -> AppResult<ChatHistoryResponse> {
        let Some(birth) = self.birth_details.active(user_id).await? else {
            return Ok(ChatHistoryResponse { messages: vec![] });
        };

        let mut rows = conv::Entity::find()
            .filter(conv::Column::UserId.eq(user_id))
            .filter(conv::Column::BirthDetailId.eq(birth.id))
            .order_by_desc(conv::Column::CreatedAt)
            .order_by_desc(conv::Column::Id)
            .limit(HISTORY_MESSAGES)
            .all(&self.pool)
            .await?;
        rows.reverse();

        Ok(ChatHistoryResponse {
            messages: rows.into_iter().map(ChatMessageResponse::from).collect(),
        })
    }

    async fn insert_message(
        &self,
        user_id: i64,
        birth_detail_id: i64,
        role: MessageRole,
        content: &str,
        sources: Option<serde_json::Value>,
        is_limit_message: bool,
    ) -> AppResult<conv::Model> {
        let assistant = role == MessageRole::Assistant;
        let row = conv::ActiveModel {
            user_id: Set(user_id),
            birth_detail_id: Set(birth_detail_id),
            role: Set(role),
            content: Set(content.to_string()),
            chart_context_used: Set(assistant),
            search_used: Set(assistant),
            sources: Set(sources.filter(|v| !v.is_null())),
            is_limit_message: Set(is_limit_message),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(row)
    }
}

fn system_prompt(birth: &bd::Model, chart: Option<&vc::Model>) -> String {
    let chart_json = chart
        .map(|c| VedicChartResponse::from(c.clone()))
        .and_then(|c| serde_json::to_string_pretty(&c).ok())
        .unwrap_or_else(|| "null".to_string());

    format!(
        "You are Clarity, a warm and empathetic Vedic astrology guide. You provide personalized insights based on the user's birth chart using authentic Vedic astrology principles.

Birth Details:
- Name: {name}
- Date: {date}
- Time: {time}
- Location: {city}

Vedic Chart Data:
{chart_json}

Instructions:
- Respond in a friendly, conversational, and supportive tone
- Base your guidance on the user's actual birth chart data provided above
- Use current Vedic astrology knowledge from web search when relevant
- Be insightful but never make absolute predictions
- Encourage self-reflection and personal growth
- Keep responses concise (2-3 paragraphs max)",
        name = birth.name,
        date = birth.birth_date.format("%Y-%m-%d"),
        time = birth.birth_time.format("%H:%M:%S"),
        city = birth.birth_city,
    )
}

/// The API wants strict user/assistant alternation ending before the new
/// user turn.
fn normalize_history(rows: &[conv::Model]) -> Vec<ChatTurn> {
    let mut out: Vec<ChatTurn> = Vec::with_capacity(rows.len());
    for row in rows {
        let role = match row.role {
            MessageRole::System => continue,
            MessageRole::Assistant => MessageRole::Assistant,
            MessageRole::User => MessageRole::User,
        };
        if out.last().is_some_and(|t| t.role == role.as_str()) {
            continue;
        }
        out.push(ChatTurn::new(role.as_str(), row.content.clone()));
    }
    if out.last().is_some_and(|t| t.role == MessageRole::User.as_str()) {
        out.pop();
    }
    out
}
