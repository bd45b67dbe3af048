//! End-to-end example: run a staged analysis and print the verdict.
//!
//! This example shows how to:
//! - Register analyzers as catalog stages
//! - Run the pipeline and reuse the content cache
//! - Aggregate a verdict
//! - Watch a definitive metadata result end a run early
//!
//! Run with: cargo run --example analyze_image

use evidencefuse::analyzers::MockAnalyzer;
use evidencefuse::prelude::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn camera_photo_registry() -> Result<StageRegistry, AnalysisError> {
    StageRegistry::builder()
        .catalog_stage(Arc::new(MockAnalyzer::new(
            "exif",
            json!({ "Make": "Canon", "Model": "EOS R5", "Software": "Lightroom" }),
        )))
        .catalog_stage(Arc::new(MockAnalyzer::new(
            "color-balance",
            json!({ "ai_color_score": 0.18 }),
        )))
        .catalog_stage(Arc::new(
            MockAnalyzer::new(
                "compression",
                json!({ "compression_ai_analysis": { "ai_probability": 0.22 } }),
            )
            .with_latency(Duration::from_millis(40)),
        ))
        .catalog_stage(Arc::new(MockAnalyzer::new(
            "lighting-analysis",
            json!({ "lighting_analysis": { "ai_lighting_score": 0.3 } }),
        )))
        .catalog_stage(Arc::new(MockAnalyzer::failing("ai-model", "weights not loaded")))
        .build()
}

fn generated_image_registry() -> Result<StageRegistry, AnalysisError> {
    StageRegistry::builder()
        .catalog_stage(Arc::new(MockAnalyzer::new(
            "metadata-quick",
            json!({ "XMP": { "CreatorTool": "Midjourney v6" } }),
        )))
        .catalog_stage(Arc::new(MockAnalyzer::new(
            "color-balance",
            json!({ "ai_color_score": 0.9 }),
        )))
        .build()
}

fn print_verdict(verdict: &Verdict) {
    println!("Verdict: {}", verdict.summary());
    for line in &verdict.reasoning {
        println!("  - {line}");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Evidencefuse Example ===\n");

    let metrics = Arc::new(PipelineMetrics::new());
    let runner = PipelineRunner::builder()
        .with_registry(camera_photo_registry()?)
        .with_metrics(metrics.clone())
        .build()?;
    let aggregator = VerdictAggregator::new().with_metrics(metrics.clone());

    let photo = Artifact::from_bytes(b"pretend these are JPEG bytes".to_vec())
        .with_filename("holiday.jpg");
    let context = AnalysisContext::new()
        .with_request_id("req-1")
        .with_source("example")
        .with_timeout(Duration::from_secs(30));

    let result = runner.run_analysis(&context, &photo).await?;
    println!("Run ID: {}", result.id);
    println!("Fingerprint: {}", result.fingerprint);
    println!("Stages run: {:?}", result.stages_run);
    println!("Coverage confidence: {:.2}", result.confidence);
    print_verdict(&aggregator.aggregate(&result));

    // Same bytes under another name are served from the cache
    let renamed = Artifact::from_bytes(b"pretend these are JPEG bytes".to_vec())
        .with_filename("copy-of-holiday.jpg");
    let again = runner.run_analysis(&AnalysisContext::new(), &renamed).await?;
    println!("\nSecond run cache hit: {}", again.cache_hit);

    println!("\n=== Definitive Metadata ===\n");

    let runner = PipelineRunner::builder()
        .with_registry(generated_image_registry()?)
        .with_metrics(metrics.clone())
        .build()?;
    let generated = Artifact::from_bytes(b"generated".to_vec()).with_filename("render.png");
    let result = runner.run_analysis(&AnalysisContext::new(), &generated).await?;
    println!("Early exit: {} after {:?}", result.early_exit, result.stages_run);
    print_verdict(&aggregator.aggregate(&result));

    println!("\n=== Metrics ===\n");
    println!("{}", serde_json::to_string_pretty(&metrics.snapshot())?);

    Ok(())
}
