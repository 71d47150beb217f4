use serde_json::json;

use crate::models::essential::{EssentialCategory, EssentialContent};

/// Mock essential-learning catalog. Stands in for a content database;
/// seeded once at startup and read-only afterwards.
pub struct EssentialCatalog {
    categories: Vec<EssentialCategory>,
    content: Vec<EssentialContent>,
}

impl EssentialCatalog {
    pub fn seed() -> Self {
        Self {
            categories: seed_categories(),
            content: seed_content(),
        }
    }

    pub fn categories(&self) -> &[EssentialCategory] {
        &self.categories
    }

    pub fn category(&self, id: &str) -> Option<&EssentialCategory> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn content(&self, id: &str) -> Option<&EssentialContent> {
        self.content.iter().find(|c| c.id == id)
    }

    pub fn content_for_category(
        &self,
        category_id: &str,
        content_type: Option<&str>,
    ) -> Vec<&EssentialContent> {
        self.content
            .iter()
            .filter(|c| c.category_id == category_id)
            .filter(|c| content_type.map_or(true, |t| c.content_type == t))
            .collect()
    }
}

fn category(
    id: &str,
    key: &str,
    name: &str,
    cn: &str,
    en: &str,
    level: &str,
    vocab: u32,
    passages: u32,
    dialogues: u32,
    days: u32,
    popular: bool,
    color: &str,
) -> EssentialCategory {
    EssentialCategory {
        id: id.to_string(),
        category_key: key.to_string(),
        name: name.to_string(),
        display_name_cn: cn.to_string(),
        display_name_en: en.to_string(),
        target_level: level.to_string(),
        total_vocabulary_count: vocab,
        total_passages_count: passages,
        total_dialogues_count: dialogues,
        estimated_duration_days: days,
        is_popular: popular,
        difficulty_color: Some(color.to_string()),
    }
}

fn seed_categories() -> Vec<EssentialCategory> {
    vec![
        category(
            "1",
            "junior_high",
            "junior_high_essentials",
            "初中必会",
            "Junior High Essentials",
            "A1-A2",
            1500,
            50,
            30,
            90,
            false,
            "#4CAF50",
        ),
        category(
            "2",
            "senior_high",
            "senior_high_essentials",
            "高中必会",
            "Senior High Essentials",
            "A2-B1",
            3500,
            100,
            50,
            120,
            false,
            "#FF9800",
        ),
        category(
            "3",
            "cet4",
            "cet4_essentials",
            "四级必会",
            "CET-4 Essentials",
            "B1",
            4500,
            100,
            100,
            100,
            true,
            "#2196F3",
        ),
        category(
            "4",
            "business",
            "business_essentials",
            "商务必会",
            "Business Essentials",
            "B1-B2",
            2500,
            60,
            80,
            80,
            false,
            "#795548",
        ),
        category(
            "5",
            "postgraduate",
            "postgraduate_essentials",
            "考研必会",
            "Postgraduate Essentials",
            "B2-C1",
            5500,
            200,
            80,
            150,
            true,
            "#F44336",
        ),
    ]
}

fn seed_content() -> Vec<EssentialContent> {
    vec![
        EssentialContent {
            id: "1".to_string(),
            category_id: "3".to_string(),
            content_type: "vocabulary".to_string(),
            title: "CET-4 Core Vocabulary - Unit 1".to_string(),
            subtitle: Some("大学英语四级核心词汇第一单元".to_string()),
            difficulty_level: "intermediate".to_string(),
            content_data: json!({
                "words": [
                    {
                        "word": "abandon",
                        "pronunciation": "/əˈbændən/",
                        "meaning": "放弃，抛弃",
                        "example": "He abandoned his car in the snow.",
                        "chineseMeaning": "放弃，抛弃"
                    },
                    {
                        "word": "abstract",
                        "pronunciation": "/ˈæbstrækt/",
                        "meaning": "抽象的",
                        "example": "Mathematics is an abstract subject.",
                        "chineseMeaning": "抽象的"
                    }
                ]
            }),
            estimated_learn_time: Some(30),
            importance_score: 95,
        },
        EssentialContent {
            id: "2".to_string(),
            category_id: "4".to_string(),
            content_type: "dialogues".to_string(),
            title: "Business Meeting Introduction".to_string(),
            subtitle: Some("商务会议介绍对话".to_string()),
            difficulty_level: "intermediate".to_string(),
            content_data: json!({
                "scenario": "Meeting Room Introduction",
                "dialogue": [
                    {
                        "speaker": "A",
                        "text": "Good morning everyone. Let me introduce myself. I'm Sarah from the marketing department."
                    },
                    {
                        "speaker": "B",
                        "text": "Nice to meet you, Sarah. I'm David, the project manager for this initiative."
                    }
                ]
            }),
            estimated_learn_time: Some(15),
            importance_score: 85,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_five_categories() {
        let catalog = EssentialCatalog::seed();
        assert_eq!(catalog.categories().len(), 5);
        assert!(catalog.category("3").is_some());
        assert!(catalog.category("99").is_none());
    }

    #[test]
    fn filters_content_by_category_and_type() {
        let catalog = EssentialCatalog::seed();

        let cet4 = catalog.content_for_category("3", None);
        assert_eq!(cet4.len(), 1);
        assert_eq!(cet4[0].content_type, "vocabulary");

        let cet4_dialogues = catalog.content_for_category("3", Some("dialogues"));
        assert!(cet4_dialogues.is_empty());

        let business_dialogues = catalog.content_for_category("4", Some("dialogues"));
        assert_eq!(business_dialogues.len(), 1);
    }
}
