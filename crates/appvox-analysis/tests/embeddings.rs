//! Integration tests for the embedding-backed keyword ranker against a
//! wiremock embeddings server.

use appvox_analysis::{EmbeddingRanker, KeywordModel, ModelError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn candidates(words: &[&str]) -> Vec<String> {
    words.iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn scores_candidates_by_cosine_against_document() {
    let server = MockServer::start().await;
    // First vector is the document embedding; the rest line up with the
    // candidates. "crashes" points the same way as the document, "sunsets"
    // is orthogonal.
    Mock::given(method("POST"))
        .and(path("/embed"))
        .and(body_partial_json(json!({
            "inputs": ["the app crashes on launch", "crashes", "sunsets"]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([[1.0, 0.0], [1.0, 0.0], [0.0, 1.0]])),
        )
        .mount(&server)
        .await;

    let ranker = EmbeddingRanker::new(&server.uri());
    let scores = ranker
        .rank("the app crashes on launch", &candidates(&["crashes", "sunsets"]))
        .await
        .expect("rank should succeed");

    assert_eq!(scores.len(), 2);
    assert!((scores[0] - 1.0).abs() < 1e-9, "got {scores:?}");
    assert!(scores[1].abs() < 1e-9, "got {scores:?}");
}

#[tokio::test]
async fn server_error_surfaces_as_inference_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let ranker = EmbeddingRanker::new(&server.uri());
    let result = ranker.rank("some text", &candidates(&["some"])).await;

    assert!(matches!(result, Err(ModelError::Inference(_))));
}

#[tokio::test]
async fn mismatched_vector_count_is_rejected() {
    let server = MockServer::start().await;
    // Two inputs (document + one candidate) but only one vector back.
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[1.0, 0.0]])))
        .mount(&server)
        .await;

    let ranker = EmbeddingRanker::new(&server.uri());
    let result = ranker.rank("some text", &candidates(&["some"])).await;

    assert!(matches!(result, Err(ModelError::Inference(_))));
}

#[tokio::test]
async fn extraction_falls_back_to_frequency_when_server_is_down() {
    // Point at a closed port; the ranker errors and extraction degrades to
    // frequency scores instead of failing the batch.
    let ranker = EmbeddingRanker::new("http://127.0.0.1:1");
    let keywords =
        appvox_analysis::extract_keywords(&ranker, "crashes crashes crashes freezes", 5).await;

    assert!(!keywords.is_empty());
    assert!(keywords[0].contains("crash"), "got {keywords:?}");
}
