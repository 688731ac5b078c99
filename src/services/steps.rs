// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Step counts read from pedometer screenshots.

use crate::services::gemini::{CallPolicy, GeminiClient, InlineImage, ResponseFormat};

const STEP_EXTRACTION: CallPolicy = CallPolicy::new(15, 3);

const STEP_PROMPT: &str = "이 이미지는 만보기 앱 화면이다. 화면에 기록된 걸음 수를 숫자로만 답해. \
                           다른 말은 하지 마.";

/// Reads step counts with the vision model.
#[derive(Clone)]
pub struct StepCounter {
    gemini: GeminiClient,
    model: String,
}

impl StepCounter {
    pub fn new(gemini: GeminiClient, model: String) -> Self {
        Self { gemini, model }
    }

    /// Estimated step count shown in the screenshot; 0 when unreadable.
    pub async fn count_steps(&self, image: &InlineImage) -> u64 {
        let Some(answer) = self
            .gemini
            .generate(
                &self.model,
                STEP_PROMPT,
                Some(image),
                ResponseFormat::Text,
                STEP_EXTRACTION,
            )
            .await
        else {
            return 0;
        };

        let steps = parse_step_count(&answer);
        tracing::debug!(steps, "Step count extracted");
        steps
    }
}

/// Concatenate every digit in the answer ("8,532 걸음" reads as 8532).
///
/// No digits, or a number too large for `u64`, reads as 0.
pub fn parse_step_count(answer: &str) -> u64 {
    let digits: String = answer.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}
