//! Benchmarks for the exam core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use prova_core::document::SetSelections;
use prova_core::{
    expand, generate, remap, Exam, ExamConfig, Gabarito, HeightOracle, Question, QuestionKind,
    TextMetricOracle, VariantConfig,
};
use serde_json::{json, Value};

fn paragraph(text: &str) -> Value {
    json!({"type": "paragraph", "content": [{"type": "text", "text": text}]})
}

fn choice_question(i: usize) -> Question {
    let options: Vec<Value> = (0..5)
        .map(|o| json!({"type": "option", "content": [paragraph(&format!("Alternative {} of question {}", o + 1, i))]}))
        .collect();
    Question::new(
        format!("q{}", i),
        QuestionKind::MultipleChoice,
        Some(Gabarito::Choice(['A', 'B', 'C', 'D', 'E'][i % 5])),
        json!({"type": "doc", "content": [
            paragraph(&format!(
                "Question {} has a statement long enough to wrap over several lines of a narrow column, \
                 which exercises the line breaker and the fragmenting paths of the paginator.",
                i
            )),
            {"type": "options", "content": options}
        ]}),
    )
}

fn set_question(i: usize) -> Question {
    let mut content = vec![json!({
        "type": "baseText",
        "content": (0..6).map(|p| paragraph(&format!("Shared text paragraph {} of set {}.", p, i))).collect::<Vec<_>>()
    })];
    for item in 0..3 {
        content.push(json!({
            "type": "questionItem",
            "attrs": {"kind": "multipleChoice", "gabarito": "B"},
            "content": [
                {"type": "statement", "content": [paragraph(&format!("Item {} of set {}", item + 1, i))]},
                {"type": "options", "content": (0..4).map(|o| json!({"type": "option", "content": [paragraph(&format!("option {}", o + 1))]})).collect::<Vec<_>>()}
            ]
        }));
    }
    Question::new(format!("s{}", i), QuestionKind::Set, None, json!({"type": "doc", "content": content}))
}

/// 60 questions with a set every tenth position
fn question_bank() -> Vec<Question> {
    (0..60)
        .map(|i| if i % 10 == 9 { set_question(i) } else { choice_question(i) })
        .collect()
}

fn bench_expand(c: &mut Criterion) {
    let questions = question_bank();
    let selections = SetSelections::new();
    c.bench_function("expand_60_questions", |b| {
        b.iter(|| black_box(expand(black_box(&questions), &selections)));
    });
}

fn bench_measure(c: &mut Criterion) {
    let exam = Exam::with_questions(question_bank(), ExamConfig::default());
    let oracle = TextMetricOracle::default();
    c.bench_function("measure_headless", |b| {
        b.iter(|| black_box(oracle.measure(exam.units(), &exam.config().layout)));
    });
}

fn bench_paginate(c: &mut Criterion) {
    let exam = Exam::with_questions(question_bank(), ExamConfig::default());
    let layout = &exam.config().layout;
    let measurements = TextMetricOracle::default()
        .measure(exam.units(), layout)
        .unwrap();

    c.bench_function("paginate_two_columns", |b| {
        b.iter(|| black_box(prova_core::paginate(exam.units(), black_box(&measurements), layout)));
    });

    let mut optimized = layout.clone();
    optimized.optimize_layout = true;
    c.bench_function("paginate_optimized", |b| {
        b.iter(|| black_box(prova_core::paginate(exam.units(), black_box(&measurements), &optimized)));
    });
}

fn bench_display_list(c: &mut Criterion) {
    let exam = Exam::with_questions(question_bank(), ExamConfig::default());
    let result = exam.paginate(&TextMetricOracle::default(), None).unwrap();
    c.bench_function("build_display_list", |b| {
        b.iter(|| black_box(result.display_list()));
    });
}

fn bench_variants(c: &mut Criterion) {
    let exam = Exam::with_questions(question_bank(), ExamConfig::default());
    let config = VariantConfig {
        shuffle_questions: true,
        ..VariantConfig::default()
    };
    c.bench_function("generate_4_variants", |b| {
        b.iter(|| black_box(generate(exam.units(), 4, black_box(42), &config)));
    });

    let variants = generate(exam.units(), 4, 42, &config);
    let canonical = exam.canonical_answer_key();
    let ordered = exam.canonical_order();
    c.bench_function("remap_answer_keys", |b| {
        b.iter(|| {
            for variant in &variants {
                black_box(remap(&canonical, variant, &ordered)).ok();
            }
        });
    });
}

criterion_group!(
    benches,
    bench_expand,
    bench_measure,
    bench_paginate,
    bench_display_list,
    bench_variants,
);

criterion_main!(benches);
