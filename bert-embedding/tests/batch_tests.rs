mod common;

use bert_embedding::{BatchProcessor, EmbeddingError};
use common::*;
use std::sync::Arc;
use tempfile::TempDir;

fn write_input(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("input.txt");
    std::fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_process_batch_builds_results() {
    let (model, _fixture) = load_fake_model(two_threads());
    let mut processor = BatchProcessor::new(Arc::new(model), 4);

    let texts = vec!["Hello world".to_string(), "hello".to_string()];
    let results = processor.process_batch(&texts).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].text, "Hello world");
    assert_eq!(results[0].sequence_length, 4);
    assert_eq!(results[0].embedding, vec![2.0, 11.0, 2.0, 1.0]);
    assert_eq!(results[1].sequence_length, 3);
    assert_eq!(results[1].text_hash, "5d41402abc4b2a76b9719d911017c592");
}

#[tokio::test]
async fn test_process_batch_empty_is_noop() {
    let (model, _fixture) = load_fake_model(two_threads());
    let mut processor = BatchProcessor::new(Arc::new(model), 4);

    let results = processor.process_batch(&[]).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_process_batch_zero_batch_size() {
    let (model, _fixture) = load_fake_model(two_threads());
    let mut processor = BatchProcessor::new(Arc::new(model), 0);

    let result = processor.process_batch(&["hello".to_string()]).await;
    assert!(matches!(result, Err(EmbeddingError::Configuration(_))));
}

#[tokio::test]
async fn test_process_file_skips_blank_lines() {
    let (model, _fixture) = load_fake_model(two_threads());
    let mut processor = BatchProcessor::new(Arc::new(model), 2);
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "first line\n\n   \nsecond line\nthird\n");

    let results = processor.process_file(&input).await.unwrap();
    let texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["first line", "second line", "third"]);
}

#[tokio::test]
async fn test_process_file_streaming_batches() {
    let (model, _fixture) = load_fake_model(two_threads());
    let mut processor = BatchProcessor::new(Arc::new(model), 2);
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "a\nb\nc\nd\ne\n");

    let mut batch_sizes = Vec::new();
    let processed = processor
        .process_file_streaming(&input, |batch| {
            batch_sizes.push(batch.len());
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(processed, 5);
    assert_eq!(batch_sizes, vec![2, 2, 1]);
}

#[tokio::test]
async fn test_process_file_streaming_propagates_callback_error() {
    let (model, _fixture) = load_fake_model(two_threads());
    let mut processor = BatchProcessor::new(Arc::new(model), 1);
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "a\nb\n");

    let result = processor
        .process_file_streaming(&input, |_| {
            Err(EmbeddingError::batch_processing("sink full"))
        })
        .await;
    assert!(matches!(result, Err(EmbeddingError::BatchProcessing(_))));
}

#[tokio::test]
async fn test_process_file_missing() {
    let (model, _fixture) = load_fake_model(two_threads());
    let mut processor = BatchProcessor::new(Arc::new(model), 2);
    let dir = TempDir::new().unwrap();

    let result = processor.process_file(dir.path().join("nope.txt")).await;
    assert!(matches!(result, Err(EmbeddingError::Io(_))));
}

#[tokio::test]
async fn test_processor_reports_closed_model() {
    let (model, _fixture) = load_fake_model(two_threads());
    let model = Arc::new(model);
    model.close().unwrap();

    let mut processor = BatchProcessor::new(Arc::clone(&model), 2);
    let result = processor.process_batch(&["hello".to_string()]).await;
    assert!(matches!(result, Err(EmbeddingError::ModelClosed)));
    assert_eq!(processor.batch_size(), 2);
    processor.set_batch_size(8);
    assert_eq!(processor.batch_size(), 8);
}
