use serde::Serialize;

use crate::models::ai::{Correction, RecommendationSet, VocabularyItem};
use crate::openai_client::{ChatMessage, OpenAiClient, OpenAiError, SamplingParams};
use crate::services::personalities::Personality;
use crate::store::conversations::{MessageRole, StoredMessage};

/// Conversation context sent to the provider is capped at this many of the
/// most recent stored messages.
pub const CONTEXT_WINDOW: usize = 10;

const CHAT_SAMPLING: SamplingParams = SamplingParams {
    max_tokens: 500,
    temperature: 0.7,
    presence_penalty: 0.1,
    frequency_penalty: 0.1,
};

const ASSESSMENT_SAMPLING: SamplingParams = SamplingParams {
    max_tokens: 300,
    temperature: 0.3,
    presence_penalty: 0.0,
    frequency_penalty: 0.0,
};

const RECOMMENDATION_SAMPLING: SamplingParams = SamplingParams {
    max_tokens: 400,
    temperature: 0.5,
    presence_penalty: 0.0,
    frequency_penalty: 0.0,
};

/// Returns the most recent `CONTEXT_WINDOW` messages.
pub fn trim_history(messages: &[StoredMessage]) -> &[StoredMessage] {
    let start = messages.len().saturating_sub(CONTEXT_WINDOW);
    &messages[start..]
}

pub struct ChatRequest<'a> {
    pub message: &'a str,
    pub history: &'a [StoredMessage],
    pub personality: &'a Personality,
    pub essential_category: Option<&'a str>,
    pub target_vocabulary: &'a [String],
}

pub struct ChatReply {
    pub message: String,
    pub suggestions: Vec<String>,
    pub corrections: Vec<Correction>,
    pub vocabulary: Vec<VocabularyItem>,
}

fn build_system_prompt(
    personality: &Personality,
    essential_category: Option<&str>,
    target_vocabulary: &[String],
) -> String {
    let mut prompt = personality.system_prompt.to_string();

    if let Some(category) = essential_category {
        prompt.push_str(&format!(
            "\n\nCurrent learning focus: {} level English. Tailor your responses to this level.",
            category
        ));
    }

    if !target_vocabulary.is_empty() {
        prompt.push_str(&format!(
            "\n\nTarget vocabulary to practice: {}. Try to naturally incorporate these words when appropriate.",
            target_vocabulary.join(", ")
        ));
    }

    prompt.push_str(
        "\n\nIMPORTANT: Keep responses conversational and natural. If you notice grammar or vocabulary errors, provide gentle corrections. Be encouraging and help build confidence.",
    );

    prompt
}

fn to_chat_message(message: &StoredMessage) -> ChatMessage {
    match message.role {
        MessageRole::User => ChatMessage::user(message.content.clone()),
        MessageRole::Assistant => ChatMessage::assistant(message.content.clone()),
    }
}

/// Assembles system prompt + trimmed history + the new user message, calls
/// the provider, and shapes the reply. The structured extras (suggestions,
/// corrections, vocabulary) are placeholders for future parsing of
/// structured model output and are currently always empty.
pub async fn generate_chat_response(
    client: &OpenAiClient,
    request: ChatRequest<'_>,
) -> Result<ChatReply, OpenAiError> {
    let mut messages = Vec::with_capacity(request.history.len().min(CONTEXT_WINDOW) + 2);
    messages.push(ChatMessage::system(build_system_prompt(
        request.personality,
        request.essential_category,
        request.target_vocabulary,
    )));
    messages.extend(trim_history(request.history).iter().map(to_chat_message));
    messages.push(ChatMessage::user(request.message.to_string()));

    let reply = client.chat_completion(&messages, CHAT_SAMPLING).await?;

    Ok(ChatReply {
        message: reply,
        suggestions: Vec::new(),
        corrections: Vec::new(),
        vocabulary: Vec::new(),
    })
}

pub struct Assessment {
    pub score: u8,
    pub feedback: String,
    pub improvements: Vec<String>,
    pub strengths: Vec<String>,
}

/// Score used when the model output cannot be parsed.
const FALLBACK_SCORE: u8 = 75;

/// Extracts a 1-100 score from a leading "Score: NN" line.
pub(crate) fn parse_score(text: &str) -> Option<u8> {
    for line in text.lines() {
        let line = line.trim();
        let rest = match line
            .strip_prefix("Score:")
            .or_else(|| line.strip_prefix("score:"))
        {
            Some(rest) => rest,
            None => continue,
        };
        let digits: String = rest
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if let Ok(value) = digits.parse::<u32>() {
            return Some(value.clamp(1, 100) as u8);
        }
    }
    None
}

pub async fn generate_assessment(
    client: &OpenAiClient,
    user_text: &str,
    target_content: Option<&str>,
    assessment_type: &str,
) -> Result<Assessment, OpenAiError> {
    let mut system_prompt = format!(
        "You are an English language assessment AI. Analyze the following English text and provide:\n\
1. A score from 1-100\n\
2. Specific feedback on {}\n\
3. Areas for improvement\n\
4. Strengths to acknowledge\n\n\
Begin your reply with a line in exactly this form: Score: NN\n\
Be encouraging but constructive. Focus on helping the learner improve.",
        assessment_type
    );
    if let Some(target) = target_content {
        system_prompt.push_str(&format!("\n\nTarget content for reference: {}", target));
    }

    let messages = vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(format!("Please assess this English text: \"{}\"", user_text)),
    ];

    let feedback = client.chat_completion(&messages, ASSESSMENT_SAMPLING).await?;

    let score = match parse_score(&feedback) {
        Some(score) => score,
        None => {
            tracing::warn!("assessment reply had no parsable score line, using fallback");
            FALLBACK_SCORE
        }
    };

    Ok(Assessment {
        score,
        feedback,
        improvements: vec![
            "Practice more complex sentence structures".to_string(),
            "Expand vocabulary".to_string(),
        ],
        strengths: vec![
            "Good basic grammar".to_string(),
            "Clear communication".to_string(),
        ],
    })
}

#[derive(Debug, Serialize)]
pub struct LearningRecord {
    pub content: String,
    pub score: u32,
}

pub async fn generate_recommendations(
    client: &OpenAiClient,
    learning_history: &[LearningRecord],
    current_level: &str,
) -> Result<RecommendationSet, OpenAiError> {
    let system_prompt = "You are a personalized English learning advisor. Based on the user's learning history and current level, provide specific recommendations for:\n\
1. Daily learning plan (3-5 items)\n\
2. Content to review\n\
3. New content to explore\n\
4. Areas that need focus\n\n\
Be specific and actionable.";

    let recent: Vec<&LearningRecord> = learning_history.iter().rev().take(5).collect();
    let history_json = serde_json::to_string(&recent).unwrap_or_else(|_| "[]".to_string());

    let messages = vec![
        ChatMessage::system(system_prompt.to_string()),
        ChatMessage::user(format!(
            "User level: {}. Recent learning: {}",
            current_level, history_json
        )),
    ];

    // The advisor text is generated but the structured plan is still the
    // curated default set; parsing the model output into the plan is a
    // known placeholder in this mock backend.
    let _advisor_notes = client
        .chat_completion(&messages, RECOMMENDATION_SAMPLING)
        .await?;

    Ok(RecommendationSet {
        daily_plan: vec![
            "Review 20 essential vocabulary words".to_string(),
            "Practice one dialogue conversation".to_string(),
            "Read one short passage".to_string(),
        ],
        review_items: vec![
            "Previous week vocabulary".to_string(),
            "Grammar patterns".to_string(),
        ],
        new_content: vec![
            "Business email templates".to_string(),
            "Interview phrases".to_string(),
        ],
        focus_areas: vec!["Pronunciation".to_string(), "Grammar accuracy".to_string()],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::personalities;

    fn message(role: MessageRole, content: &str) -> StoredMessage {
        StoredMessage {
            role,
            content: content.to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    fn history(len: usize) -> Vec<StoredMessage> {
        (0..len)
            .map(|i| {
                let role = if i % 2 == 0 {
                    MessageRole::User
                } else {
                    MessageRole::Assistant
                };
                message(role, &format!("message {}", i))
            })
            .collect()
    }

    #[test]
    fn trim_keeps_short_histories_intact() {
        assert!(trim_history(&[]).is_empty());
        assert_eq!(trim_history(&history(3)).len(), 3);
        assert_eq!(trim_history(&history(10)).len(), 10);
    }

    #[test]
    fn trim_keeps_only_the_most_recent_window() {
        let full = history(25);
        let trimmed = trim_history(&full);
        assert_eq!(trimmed.len(), CONTEXT_WINDOW);
        assert_eq!(trimmed[0].content, "message 15");
        assert_eq!(trimmed[9].content, "message 24");
    }

    #[test]
    fn system_prompt_includes_optional_hints() {
        let teacher = personalities::default();

        let bare = build_system_prompt(teacher, None, &[]);
        assert!(bare.starts_with(teacher.system_prompt));
        assert!(!bare.contains("Current learning focus"));

        let vocab = vec!["abandon".to_string(), "abstract".to_string()];
        let full = build_system_prompt(teacher, Some("cet4"), &vocab);
        assert!(full.contains("Current learning focus: cet4"));
        assert!(full.contains("abandon, abstract"));
    }

    #[test]
    fn parse_score_accepts_leading_score_line() {
        assert_eq!(parse_score("Score: 85\nGood work overall."), Some(85));
        assert_eq!(parse_score("score: 42"), Some(42));
        assert_eq!(parse_score("Score: 100."), Some(100));
    }

    #[test]
    fn parse_score_clamps_and_rejects_garbage() {
        assert_eq!(parse_score("Score: 250"), Some(100));
        assert_eq!(parse_score("Score: 0"), Some(1));
        assert_eq!(parse_score("Great effort, keep going!"), None);
        assert_eq!(parse_score("Score: excellent"), None);
    }

    #[test]
    fn stored_messages_map_to_provider_roles() {
        let user = to_chat_message(&message(MessageRole::User, "hi"));
        assert_eq!(user.role, "user");
        let assistant = to_chat_message(&message(MessageRole::Assistant, "hello"));
        assert_eq!(assistant.role, "assistant");
    }
}
