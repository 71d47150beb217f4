use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::conversations::StoredMessage;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartConversationRequest {
    pub conversation_type: Option<String>,
    pub essential_category: Option<String>,
    pub target_content_ids: Option<Vec<String>>,
    pub ai_personality: Option<String>,
    pub learning_objectives: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub message_text: Option<String>,
    pub audio_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRequest {
    pub assessment_type: Option<String>,
    pub input_data: Option<serde_json::Value>,
    pub target_content: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalityView {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartConversationResponse {
    pub conversation_id: String,
    pub ai_personality: String,
    pub welcome_message: String,
    pub available_personalities: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    pub original: String,
    pub corrected: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyItem {
    pub word: String,
    pub meaning: String,
    pub example: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub conversation_id: String,
    pub user_message: String,
    pub ai_response: String,
    pub suggestions: Vec<String>,
    pub corrections: Vec<Correction>,
    pub vocabulary: Vec<VocabularyItem>,
    pub message_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationHistoryResponse {
    pub conversation_id: String,
    pub personality: String,
    pub messages: Vec<StoredMessage>,
    pub started_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub message_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: String,
    pub personality: String,
    pub started_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub message_count: usize,
    pub last_message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResponse {
    pub assessment_type: String,
    pub score: u8,
    pub feedback: String,
    pub improvements: Vec<String>,
    pub strengths: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSet {
    pub daily_plan: Vec<String>,
    pub review_items: Vec<String>,
    pub new_content: Vec<String>,
    pub focus_areas: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsResponse {
    pub user_id: String,
    pub recommendations: RecommendationSet,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiStatusResponse {
    pub configured: bool,
    pub connected: bool,
    pub model: String,
    pub personalities: Vec<String>,
}
