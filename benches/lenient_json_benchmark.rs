use criterion::{black_box, criterion_group, criterion_main, Criterion};
use slowage_tracker::models::MindResult;
use slowage_tracker::services::lenient_json::{parse_list, parse_object};

/// A scoring answer wrapped in prose and a code fence, as models often return.
fn fenced_scoring_answer(items: usize) -> String {
    let body: Vec<String> = (0..items)
        .map(|i| {
            format!(
                r#"{{"food": "음식{i}", "categories": ["통곡물", "green_leafy_veg"], "score": {}, "note": "설명 {i}"}}"#,
                40 + (i * 7) % 60
            )
        })
        .collect();
    format!(
        "평가 결과입니다.\n```json\n{{\"items\": [{}], \"notes\": \"좋아요\", \"recommendation\": \"생선 추가\"}}\n```\n감사합니다.",
        body.join(", ")
    )
}

fn benchmark_parse_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_list");

    let strict = r#"["현미밥", "시금치나물", "고등어구이", "된장국"]"#;
    let single_quoted = "```\n['현미밥', '시금치나물', '고등어구이', '된장국']\n```";
    let embedded = "사진에서 찾은 음식은 [\"현미밥\", \"시금치나물\"] 입니다.";
    let garbage = "음식을 찾지 못했습니다. 다시 시도해 주세요.";

    group.bench_function("strict", |b| b.iter(|| parse_list(black_box(strict))));
    group.bench_function("single_quoted_fenced", |b| {
        b.iter(|| parse_list(black_box(single_quoted)))
    });
    group.bench_function("embedded_in_prose", |b| {
        b.iter(|| parse_list(black_box(embedded)))
    });
    group.bench_function("garbage", |b| b.iter(|| parse_list(black_box(garbage))));

    group.finish();
}

fn benchmark_mind_scoring(c: &mut Criterion) {
    let small = fenced_scoring_answer(3);
    let large = fenced_scoring_answer(40);

    let mut group = c.benchmark_group("mind_scoring");

    group.bench_function("three_items", |b| {
        b.iter(|| MindResult::from_model_output(parse_object(black_box(&small)).as_ref()))
    });
    group.bench_function("forty_items", |b| {
        b.iter(|| MindResult::from_model_output(parse_object(black_box(&large)).as_ref()))
    });

    group.finish();
}

criterion_group!(benches, benchmark_parse_list, benchmark_mind_scoring);
criterion_main!(benches);
