use std::sync::Arc;

use serde_json::{json, Value};
use vibe_pipeline::testing::{document_content, mixed_content, tiktok_content, MockAnalyzer};
use vibe_pipeline::{
    AnalysisKind, ContentType, PipelineError, PipelineRunner, RawContent, Report, RunOptions,
};

fn runner(analyzer: Arc<MockAnalyzer>) -> PipelineRunner {
    PipelineRunner::with_defaults(analyzer)
}

async fn run_json(runner: &PipelineRunner, variant: &str, raw: RawContent, options: RunOptions) -> Value {
    let report = runner.run(variant, Arc::new(raw), options).await.unwrap();
    serde_json::to_value(report).unwrap()
}

#[tokio::test]
async fn tiktok_video_scenario() {
    let analyzer = Arc::new(MockAnalyzer::typical());
    let raw: RawContent = serde_json::from_value(json!({
        "data": [{
            "videoUrl": "x",
            "diggCount": 10,
            "commentCount": 2,
            "shareCount": 1,
            "playCount": 100,
            "duration": 15
        }],
        "platform": "tiktok"
    }))
    .unwrap();

    let report = run_json(&runner(analyzer.clone()), "video-only", raw, RunOptions::default()).await;

    assert_eq!(report["summary"]["contentType"], "video");
    assert_eq!(report["summary"]["platform"], "tiktok");
    assert_eq!(report["summary"]["analysisCompleteness"]["video"], true);
    assert_eq!(report["analysis"]["video"]["viralPotential"]["score"], 82);
    assert!(report["analysis"]["video"].get("skipped").is_none());
    assert!(!analyzer.called(AnalysisKind::Document));
    assert!(!analyzer.called(AnalysisKind::Vibe));
}

#[tokio::test]
async fn loosely_typed_counters_still_reach_the_video_stage() {
    let analyzer = Arc::new(MockAnalyzer::typical());
    let raw: RawContent = serde_json::from_value(json!({
        "data": [{ "likesCount": "12", "videoUrl": "x" }],
        "platform": "tiktok"
    }))
    .unwrap();

    let report = run_json(&runner(analyzer.clone()), "full", raw, RunOptions::default()).await;

    assert_eq!(report["metadata"]["errors"], json!([]));
    assert_eq!(report["summary"]["contentType"], "video");
    assert_eq!(report["summary"]["analysisCompleteness"]["video"], true);
    assert_eq!(report["analysis"]["video"]["viralPotential"]["score"], 82);

    let (_, payload) = analyzer
        .calls()
        .into_iter()
        .find(|(kind, _)| *kind == AnalysisKind::Video)
        .unwrap();
    assert_eq!(payload["engagement"][0]["likes"], 0.0);
}

#[tokio::test]
async fn sentiment_failure_does_not_stop_the_pipeline() {
    let analyzer = Arc::new(MockAnalyzer::typical().failing(AnalysisKind::Sentiment, "quota exceeded"));

    let report = run_json(&runner(analyzer), "full", mixed_content(), RunOptions::default()).await;

    assert_eq!(report["analysis"]["sentiment"], json!({ "error": "quota exceeded" }));
    assert_eq!(report["summary"]["hasErrors"], true);
    assert_eq!(report["summary"]["analysisCompleteness"]["sentiment"], false);
    assert_eq!(report["analysis"]["video"]["viralPotential"]["score"], 82);
    assert_eq!(report["analysis"]["document"]["relevanceScoring"]["curation_score"], 64);
    assert_eq!(
        report["metadata"]["errors"],
        json!(["Sentiment analysis failed: quota exceeded"])
    );
    assert!(report["insights"]["performanceMetrics"]["overallScore"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn forced_document_type_skips_video() {
    let analyzer = Arc::new(MockAnalyzer::typical());
    let options = RunOptions::builder().content_type(ContentType::Document).build();

    let report = run_json(&runner(analyzer.clone()), "full", mixed_content(), options).await;

    assert_eq!(report["analysis"]["video"], json!({ "skipped": "Not video content" }));
    assert_eq!(report["summary"]["analysisCompleteness"]["video"], false);
    assert_eq!(report["contentOverview"]["contentDistribution"]["hasVideo"], false);
    assert_eq!(report["summary"]["hasErrors"], false);
    assert!(!analyzer.called(AnalysisKind::Video));

    // sentiment 80, document 64, multiModal 70, trends 75; no video 82
    assert_eq!(report["insights"]["performanceMetrics"]["overallScore"], 72);
}

#[tokio::test]
async fn document_content_classifies_as_document() {
    let analyzer = Arc::new(MockAnalyzer::typical());

    let report = run_json(&runner(analyzer), "document-only", document_content(4), RunOptions::default()).await;

    assert_eq!(report["summary"]["contentType"], "document");
    assert_eq!(report["summary"]["analysisCompleteness"]["document"], true);
    assert_eq!(report["analysis"]["video"], Value::Null);
    assert_eq!(
        report["insights"]["keyFindings"],
        json!([
            "Lean into behind-the-scenes clips",
            "Add a short summary up top",
            "Use the current night-market audio"
        ])
    );
}

#[tokio::test]
async fn fast_variant_scores_from_sentiment_alone() {
    let analyzer =
        Arc::new(MockAnalyzer::new().responding(AnalysisKind::Sentiment, json!({ "overallSentiment": 0.5 })));

    let report = runner(analyzer.clone())
        .run("fast", Arc::new(tiktok_content(2)), RunOptions::default())
        .await
        .unwrap();

    assert_eq!(report.overall_score(), Some(75));
    assert_eq!(analyzer.calls().len(), 1);
}

#[tokio::test]
async fn empty_content_still_produces_a_report() {
    let analyzer = Arc::new(MockAnalyzer::new());

    let report = run_json(&runner(analyzer.clone()), "full", RawContent::default(), RunOptions::default()).await;

    assert_eq!(report["summary"]["contentType"], "mixed");
    assert_eq!(report["summary"]["hasErrors"], true);
    assert_eq!(report["contentOverview"]["textPosts"], 0);
    assert_eq!(report["contentOverview"]["totalHashtags"], 0);
    assert_eq!(report["analysis"]["sentiment"], json!({ "error": "No content to analyze" }));
    assert_eq!(report["analysis"]["video"], json!({ "error": "No video content to analyze" }));
    assert_eq!(
        report["analysis"]["document"],
        json!({ "error": "No document content to analyze" })
    );
    assert_eq!(report["insights"]["performanceMetrics"]["overallScore"], 0);
}

#[tokio::test]
async fn malformed_posts_fail_preprocessing_only() {
    let analyzer = Arc::new(MockAnalyzer::typical());
    let raw = RawContent::new(vec![json!("not a post")]).with_platform("tiktok");

    let report = run_json(&runner(analyzer.clone()), "full", raw, RunOptions::default()).await;

    assert_eq!(report["summary"]["platform"], "tiktok");
    let errors = report["metadata"]["errors"].as_array().unwrap();
    assert!(errors[0].as_str().unwrap().starts_with("Preprocessing failed:"));
    assert_eq!(
        report["analysis"]["categorization"],
        json!({ "error": "No preprocessed content available" })
    );
    assert_eq!(report["summary"]["totalPosts"], Value::Null);
    assert!(analyzer.calls().is_empty());
}

#[tokio::test]
async fn malformed_recommendations_yield_the_minimal_report() {
    let analyzer = Arc::new(MockAnalyzer::typical().responding(
        AnalysisKind::Trends,
        json!({ "recommendations": { "timing_strategy": [1, 2] } }),
    ));

    let report = runner(analyzer)
        .run("full", Arc::new(mixed_content()), RunOptions::default())
        .await
        .unwrap();

    assert!(matches!(report, Report::Failed(_)));
    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        json!({ "error": "Failed to generate comprehensive final report" })
    );
}

#[tokio::test]
async fn unknown_variant_propagates() {
    let err = runner(Arc::new(MockAnalyzer::new()))
        .run("video", Arc::new(mixed_content()), RunOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::UnknownVariant(ref name) if name == "video"));
    assert_eq!(err.to_string(), "Unknown pipeline variant: video");
}
