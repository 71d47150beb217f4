use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use std::sync::Arc;

use crate::middleware::auth::auth_middleware;
use crate::models::ai::*;
use crate::models::auth::Claims;
use crate::openai_client::OpenAiClient;
use crate::response::{self, ApiError};
use crate::services::ai::{self, ChatRequest, LearningRecord};
use crate::services::personalities;
use crate::store::conversations::{Conversation, ConversationStore, StoredMessage};
use crate::AppState;

pub fn ai_routes() -> Router {
    let public = Router::new()
        .route("/api/ai/status", get(service_status))
        .route("/api/ai/personalities", get(list_personalities));

    let protected = Router::new()
        .route(
            "/api/ai/conversations",
            post(start_conversation).get(list_conversations),
        )
        .route("/api/ai/conversations/:id", get(conversation_history))
        .route("/api/ai/conversations/:id/messages", post(send_message))
        .route("/api/ai/assess", post(assess))
        .route("/api/ai/recommendations", get(recommendations))
        .layer(axum::middleware::from_fn(auth_middleware));

    public.merge(protected)
}

fn provider(state: &AppState) -> Result<&OpenAiClient, ApiError> {
    state.openai.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("AI service is not properly configured".to_string())
    })
}

/// Looks up a conversation and enforces per-request ownership: unknown id
/// is 404, a foreign conversation is 403 with no content leaked.
async fn owned_conversation(
    store: &dyn ConversationStore,
    id: &str,
    claims: &Claims,
) -> Result<Conversation, ApiError> {
    let conversation = store
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFound("Conversation not found".to_string()))?;

    if conversation.user_id != claims.sub {
        return Err(ApiError::Forbidden("Access denied".to_string()));
    }

    Ok(conversation)
}

/// Prior history for a conversation whose newest stored entry is the message
/// being sent; that message goes in the final provider slot, not the history.
fn history_before_latest(messages: &[StoredMessage]) -> &[StoredMessage] {
    messages.split_last().map_or(&[][..], |(_, rest)| rest)
}

async fn list_personalities() -> impl IntoResponse {
    let personalities: Vec<PersonalityView> = personalities::PERSONALITIES
        .iter()
        .map(|p| PersonalityView {
            id: p.key.to_string(),
            name: p.name.to_string(),
            description: p.description.to_string(),
        })
        .collect();

    response::ok(personalities, "AI personalities retrieved successfully")
}

async fn service_status(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let configured = state.openai.is_some();
    let (connected, model) = match &state.openai {
        Some(client) => (
            client.validate_configuration().await,
            client.model().to_string(),
        ),
        None => (false, String::new()),
    };

    response::ok(
        AiStatusResponse {
            configured,
            connected,
            model,
            personalities: personalities::keys(),
        },
        "AI service status checked",
    )
}

async fn start_conversation(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    axum::Json(payload): axum::Json<StartConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = Vec::new();
    if payload.conversation_type.as_deref().unwrap_or("").is_empty() {
        errors.push("Conversation type is required".to_string());
    }

    let personality_key = payload
        .ai_personality
        .as_deref()
        .unwrap_or(personalities::DEFAULT_PERSONALITY);
    let personality = match personalities::find(personality_key) {
        Some(p) => p,
        None => {
            errors.push("Invalid AI personality".to_string());
            personalities::default()
        }
    };

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    provider(&state)?;

    let conversation = state.conversations.create(&claims.sub, personality.key).await;
    tracing::info!(
        conversation_id = %conversation.id,
        user_id = %claims.sub,
        personality = %personality.key,
        "conversation started"
    );

    let welcome_message = personalities::welcome_message(
        personality.key,
        payload.essential_category.as_deref(),
    );

    Ok(response::created(
        StartConversationResponse {
            conversation_id: conversation.id,
            ai_personality: personality.key.to_string(),
            welcome_message,
            available_personalities: personalities::keys(),
        },
        "AI conversation started successfully",
    ))
}

async fn send_message(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    axum::Json(payload): axum::Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message_text = match payload.message_text.as_deref() {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => return Err(ApiError::BadRequest("Message text is required".to_string())),
    };

    let conversation = owned_conversation(state.conversations.as_ref(), &id, &claims).await?;
    let client = provider(&state)?;

    let personality =
        personalities::find(&conversation.personality).unwrap_or_else(personalities::default);

    // Store the user message before calling the provider so a failed
    // generation does not drop it from the conversation.
    let with_user = state
        .conversations
        .append(&id, StoredMessage::user(message_text.clone()))
        .await
        .ok_or_else(|| ApiError::NotFound("Conversation not found".to_string()))?;

    let reply = ai::generate_chat_response(
        client,
        ChatRequest {
            message: &message_text,
            history: history_before_latest(&with_user.messages),
            personality,
            essential_category: None,
            target_vocabulary: &[],
        },
    )
    .await
    .map_err(ApiError::Generation)?;

    let updated = state
        .conversations
        .append(&id, StoredMessage::assistant(reply.message.clone()))
        .await
        .ok_or_else(|| ApiError::NotFound("Conversation not found".to_string()))?;

    Ok(response::ok(
        MessageResponse {
            conversation_id: id,
            user_message: message_text,
            ai_response: reply.message,
            suggestions: reply.suggestions,
            corrections: reply.corrections,
            vocabulary: reply.vocabulary,
            message_count: updated.messages.len(),
        },
        "Message sent successfully",
    ))
}

async fn conversation_history(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation = owned_conversation(state.conversations.as_ref(), &id, &claims).await?;

    Ok(response::ok(
        ConversationHistoryResponse {
            conversation_id: conversation.id,
            personality: conversation.personality,
            message_count: conversation.messages.len(),
            messages: conversation.messages,
            started_at: conversation.started_at,
            last_active_at: conversation.last_active_at,
        },
        "Conversation history retrieved successfully",
    ))
}

async fn list_conversations(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let conversations = state.conversations.list_for_user(&claims.sub).await;

    let summaries: Vec<ConversationSummary> = conversations
        .into_iter()
        .map(|c| ConversationSummary {
            id: c.id,
            personality: c.personality,
            started_at: c.started_at,
            last_active_at: c.last_active_at,
            message_count: c.messages.len(),
            last_message: c
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default(),
        })
        .collect();

    Ok(response::ok(
        summaries,
        "User conversations retrieved successfully",
    ))
}

/// Assessment input arrives either as a bare string or as `{"text": ...}`.
fn assessment_text(input: &serde_json::Value) -> Option<String> {
    match input {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Object(map) => map
            .get("text")
            .and_then(|t| t.as_str())
            .filter(|t| !t.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

async fn assess(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    axum::Json(payload): axum::Json<AssessmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let assessment_type = payload.assessment_type.unwrap_or_default();
    let input_text = payload.input_data.as_ref().and_then(assessment_text);

    let (assessment_type, input_text) = match (assessment_type.is_empty(), input_text) {
        (false, Some(text)) => (assessment_type, text),
        _ => {
            return Err(ApiError::BadRequest(
                "Assessment type and input data are required".to_string(),
            ))
        }
    };

    let client = provider(&state)?;

    let assessment = ai::generate_assessment(
        client,
        &input_text,
        payload.target_content.as_deref(),
        &assessment_type,
    )
    .await
    .map_err(ApiError::Generation)?;

    tracing::info!(user_id = %claims.sub, assessment_type = %assessment_type, score = assessment.score, "assessment completed");

    Ok(response::ok(
        AssessmentResponse {
            assessment_type,
            score: assessment.score,
            feedback: assessment.feedback,
            improvements: assessment.improvements,
            strengths: assessment.strengths,
            timestamp: Utc::now(),
        },
        "Assessment completed successfully",
    ))
}

async fn recommendations(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let client = provider(&state)?;

    // Mock learning history; a progress store would supply this.
    let learning_history = vec![
        LearningRecord {
            content: "CET-4 vocabulary".to_string(),
            score: 85,
        },
        LearningRecord {
            content: "Business dialogue".to_string(),
            score: 78,
        },
    ];

    let recommendations = ai::generate_recommendations(client, &learning_history, "intermediate")
        .await
        .map_err(ApiError::Generation)?;

    Ok(response::ok(
        RecommendationsResponse {
            user_id: claims.sub,
            recommendations,
            generated_at: Utc::now(),
        },
        "Personalized recommendations generated successfully",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::conversations::MemoryConversationStore;
    use serde_json::json;

    fn claims_for(user_id: &str) -> Claims {
        Claims {
            sub: user_id.to_string(),
            email: format!("{}@example.com", user_id),
            username: user_id.to_string(),
            exp: 0,
            iat: 0,
        }
    }

    #[tokio::test]
    async fn unknown_conversation_is_not_found() {
        let store = MemoryConversationStore::new();
        let err = owned_conversation(&store, "conv_missing", &claims_for("alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn foreign_conversation_is_forbidden_without_leaking_content() {
        let store = MemoryConversationStore::new();
        let conv = store.create("alice", "friendly_teacher").await;
        store
            .append(&conv.id, StoredMessage::user("private note".to_string()))
            .await
            .unwrap();

        let err = owned_conversation(&store, &conv.id, &claims_for("bob"))
            .await
            .unwrap_err();
        match err {
            ApiError::Forbidden(message) => assert!(!message.contains("private note")),
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn owner_can_read_own_conversation() {
        let store = MemoryConversationStore::new();
        let conv = store.create("alice", "friendly_teacher").await;

        let found = owned_conversation(&store, &conv.id, &claims_for("alice"))
            .await
            .unwrap();
        assert_eq!(found.id, conv.id);
    }

    #[test]
    fn history_excludes_the_message_being_sent() {
        let messages = vec![
            StoredMessage::user("first".to_string()),
            StoredMessage::assistant("reply".to_string()),
            StoredMessage::user("second".to_string()),
        ];
        let history = history_before_latest(&messages);
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, "reply");

        assert!(history_before_latest(&[]).is_empty());
    }

    #[tokio::test]
    async fn user_message_survives_failed_generation() {
        let state = Arc::new(AppState {
            users: Arc::new(crate::store::users::MemoryUserStore::seeded()),
            conversations: Arc::new(MemoryConversationStore::new()),
            catalog: crate::catalog::EssentialCatalog::seed(),
            // Nothing listens here, so the provider call fails immediately.
            openai: Some(OpenAiClient::with_base_url(
                "test-key".to_string(),
                "http://127.0.0.1:1".to_string(),
            )),
        });
        let conv = state.conversations.create("alice", "friendly_teacher").await;

        let result = send_message(
            Extension(state.clone()),
            Extension(claims_for("alice")),
            Path(conv.id.clone()),
            axum::Json(SendMessageRequest {
                message_text: Some("Hello there".to_string()),
                audio_url: None,
            }),
        )
        .await;
        assert!(result.is_err());

        let stored = state.conversations.get(&conv.id).await.unwrap();
        assert_eq!(stored.messages.len(), 1);
        assert_eq!(stored.messages[0].content, "Hello there");
    }

    #[test]
    fn assessment_text_accepts_string_or_text_field() {
        assert_eq!(
            assessment_text(&json!("I has a apple")),
            Some("I has a apple".to_string())
        );
        assert_eq!(
            assessment_text(&json!({"text": "I has a apple"})),
            Some("I has a apple".to_string())
        );
        assert_eq!(assessment_text(&json!({"audio": "clip.mp3"})), None);
        assert_eq!(assessment_text(&json!(42)), None);
        assert_eq!(assessment_text(&json!("")), None);
    }
}
