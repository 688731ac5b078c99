// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod gemini;
pub mod lenient_json;
pub mod meal;
pub mod news;
pub mod steps;
pub mod storage;

pub use gemini::{CallPolicy, GeminiClient, InlineImage, ResponseFormat};
pub use meal::MealAnalyzer;
pub use news::NewsClient;
pub use steps::StepCounter;
pub use storage::ImageStorage;
