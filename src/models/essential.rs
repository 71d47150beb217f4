use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EssentialCategory {
    pub id: String,
    pub category_key: String,
    pub name: String,
    pub display_name_cn: String,
    pub display_name_en: String,
    pub target_level: String,
    pub total_vocabulary_count: u32,
    pub total_passages_count: u32,
    pub total_dialogues_count: u32,
    pub estimated_duration_days: u32,
    pub is_popular: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_color: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EssentialContent {
    pub id: String,
    pub category_id: String,
    pub content_type: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub difficulty_level: String,
    pub content_data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_learn_time: Option<u32>,
    pub importance_score: u32,
}

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
