// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Meal analysis: food extraction from text or photos, then MIND scoring.

use serde_json::Value;

use crate::models::{MindCategory, MindResult};
use crate::services::gemini::{CallPolicy, GeminiClient, InlineImage, ResponseFormat};
use crate::services::lenient_json;

const TEXT_EXTRACTION: CallPolicy = CallPolicy::new(12, 3);
const TEXT_EXTRACTION_FALLBACK: CallPolicy = CallPolicy::new(12, 2);
const IMAGE_EXTRACTION: CallPolicy = CallPolicy::new(15, 3);
const IMAGE_EXTRACTION_FALLBACK: CallPolicy = CallPolicy::new(15, 2);
const MIND_SCORING: CallPolicy = CallPolicy::new(15, 3);

const IMAGE_EXTRACTION_PROMPT: &str =
    "이미지에 보이는 음식 이름만 골라 [\"음식1\",\"음식2\"] 형태의 JSON 배열로만 답해.";

/// Food groups and examples included in the scoring prompt.
const MIND_RULES: &str = "\
건강군 (뇌 건강에 좋음, 높은 점수)
- 녹색 잎채소: 케일, 시금치, 상추
- 기타 채소: 브로콜리, 당근, 토마토
- 견과류: 호두, 아몬드
- 베리류: 딸기, 블루베리
- 콩/두류: 렌즈콩, 두부
- 통곡물: 현미, 오트밀
- 생선: 연어, 고등어
- 가금류: 닭고기, 오리고기
- 올리브유
- 와인

제한군 (뇌 건강에 해로움, 낮은 점수)
- 붉은 고기: 소고기, 돼지고기, 양고기
- 버터/마가린
- 치즈
- 과자/디저트: 케이크, 쿠키, 아이스크림
- 튀김/패스트푸드: 감자튀김, 햄버거";

/// Analyzes meals with the configured text and vision models.
#[derive(Clone)]
pub struct MealAnalyzer {
    gemini: GeminiClient,
    text_model: String,
    vision_model: String,
}

impl MealAnalyzer {
    pub fn new(gemini: GeminiClient, text_model: String, vision_model: String) -> Self {
        Self {
            gemini,
            text_model,
            vision_model,
        }
    }

    /// Food names mentioned in a free-text message.
    pub async fn extract_food_names(&self, message: &str) -> Vec<String> {
        if message.trim().is_empty() {
            return Vec::new();
        }
        let prompt = format!(
            "다음 문장에서 음식 이름만 뽑아줘.\n\
             설명 없이 [\"음식1\",\"음식2\"] 형태의 JSON 배열로만 답해.\n\
             문장: \"{}\"",
            message.trim()
        );
        self.extract_foods(
            &self.text_model,
            &prompt,
            None,
            TEXT_EXTRACTION,
            TEXT_EXTRACTION_FALLBACK,
        )
        .await
    }

    /// Food names visible in a meal photo.
    pub async fn extract_foods_from_image(&self, image: &InlineImage) -> Vec<String> {
        if image.data.is_empty() {
            return Vec::new();
        }
        self.extract_foods(
            &self.vision_model,
            IMAGE_EXTRACTION_PROMPT,
            Some(image),
            IMAGE_EXTRACTION,
            IMAGE_EXTRACTION_FALLBACK,
        )
        .await
    }

    /// JSON mode first, strictly parsed; then text mode through the tolerant parser.
    async fn extract_foods(
        &self,
        model: &str,
        prompt: &str,
        image: Option<&InlineImage>,
        strict: CallPolicy,
        fallback: CallPolicy,
    ) -> Vec<String> {
        if let Some(text) = self
            .gemini
            .generate(model, prompt, image, ResponseFormat::Json, strict)
            .await
        {
            if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(&text) {
                return food_names(items);
            }
            tracing::debug!(model, "Food list was not strict JSON, retrying in text mode");
        }

        if let Some(text) = self
            .gemini
            .generate(model, prompt, image, ResponseFormat::Text, fallback)
            .await
        {
            let foods = food_names(lenient_json::parse_list(&text));
            if !foods.is_empty() {
                return foods;
            }
            tracing::warn!(model, "No foods recovered from model answer");
        }

        Vec::new()
    }

    /// Score a meal against the MIND diet.
    pub async fn score_foods(&self, foods: &[String], meal_type: &str) -> MindResult {
        if foods.is_empty() {
            return MindResult::empty_meal();
        }

        let prompt = mind_prompt(foods, meal_type);
        let text = self
            .gemini
            .generate(
                &self.text_model,
                &prompt,
                None,
                ResponseFormat::Json,
                MIND_SCORING,
            )
            .await;

        let parsed = text.as_deref().and_then(lenient_json::parse_object);
        if parsed.is_none() {
            tracing::warn!(foods = foods.len(), "MIND scoring produced no usable answer");
        }

        let result = MindResult::from_model_output(parsed.as_ref());
        tracing::info!(
            foods = foods.len(),
            items = result.items.len(),
            meal_score = result.meal_score,
            "Meal scored"
        );
        result
    }
}

/// Keep non-blank string entries, trimmed.
fn food_names(items: Vec<Value>) -> Vec<String> {
    items
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect()
}

fn mind_prompt(foods: &[String], meal_type: &str) -> String {
    let labels: Vec<&str> = MindCategory::ALL.iter().map(|c| c.label()).collect();
    format!(
        "너는 저속노화를 잘 아는 영양 코치다. 아래 음식들을 MIND 식단 기준으로 100점 만점으로 평가해.\n\
         100점에 가까울수록 뇌 건강과 저속노화에 좋은 식사다.\n\n\
         # MIND 식단 규칙\n{rules}\n\n\
         - 각 음식에 categories를 지정해. 사용할 수 있는 카테고리: {labels}\n\
         - score는 0에서 100 사이의 정수로 매겨.\n\
         - note에는 점수에 대한 짧은 설명을 써.\n\
         - recommendation에는 다음 식사를 위한 저속노화 관점의 구체적인 팁을 짧게 써.\n\
         - 입력된 음식 외의 음식은 평가하지 마.\n\
         - JSON 객체로만 답해. 형식: \
         {{\"items\":[{{\"food\":\"닭가슴살 샐러드\",\"categories\":[\"가금류\",\"녹색 잎채소\"],\"score\":90,\"note\":\"채소와 단백질이 풍부합니다.\"}}],\
         \"notes\":\"전체 평가\",\"recommendation\":\"다음 식사 팁\"}}\n\n\
         음식 목록: {foods}\n\
         식사 종류: {meal_type}",
        rules = MIND_RULES,
        labels = labels.join(", "),
        foods = foods.join(", "),
        meal_type = meal_type,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_food_names_filters_non_strings() {
        let names = food_names(vec![json!(" 김치 "), json!(3), json!(""), json!("밥"), json!(null)]);
        assert_eq!(names, vec!["김치".to_string(), "밥".to_string()]);
    }

    #[test]
    fn test_mind_prompt_mentions_inputs() {
        let prompt = mind_prompt(&["연어".to_string(), "현미밥".to_string()], "점심");
        assert!(prompt.contains("연어, 현미밥"));
        assert!(prompt.contains("식사 종류: 점심"));
        assert!(prompt.contains("튀김/패스트푸드"));
    }

    #[tokio::test]
    async fn test_empty_meal_skips_model() {
        // Unroutable base URL: any model call would fail, not return a result.
        let gemini = GeminiClient::new("k".to_string()).with_base_url("http://127.0.0.1:9");
        let analyzer = MealAnalyzer::new(gemini, "m".to_string(), "m".to_string());

        assert_eq!(analyzer.score_foods(&[], "아침").await, MindResult::empty_meal());
        assert!(analyzer.extract_food_names("   ").await.is_empty());
        assert!(analyzer
            .extract_foods_from_image(&InlineImage::new("image/jpeg", Vec::new()))
            .await
            .is_empty());
    }
}
