// Integration tests for the transcription collaborator
//
// The collaborator endpoint is stubbed with wiremock; no real
// transcription service is involved.

use serde_json::json;
use wiremock::matchers::{body_bytes, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use capture_studio::captions::{CaptionError, TranscriptionClient};

#[tokio::test]
async fn test_segments_become_captions_in_milliseconds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transcribe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "segments": [
                { "start": 0.0, "end": 1.25, "text": "  hello world ", "confidence": 0.92 },
                { "start": 1.25, "end": 2.5, "text": "second segment" }
            ]
        })))
        .mount(&server)
        .await;

    let client = TranscriptionClient::new(format!("{}/transcribe", server.uri()));
    let captions = client.transcribe(vec![0u8; 128]).await.unwrap();

    assert_eq!(captions.len(), 2);
    let first = captions.iter().next().unwrap();
    assert_eq!(first.id, "caption-0");
    assert_eq!(first.start_ms, 0);
    assert_eq!(first.end_ms, 1250);
    assert_eq!(first.text, "hello world");
    assert_eq!(first.confidence, Some(0.92));

    let second = captions.iter().nth(1).unwrap();
    assert_eq!(second.id, "caption-1");
    assert_eq!(second.start_ms, 1250);
    assert_eq!(second.end_ms, 2500);
    assert_eq!(second.confidence, None);
}

#[tokio::test]
async fn test_audio_payload_is_posted_verbatim() {
    let server = MockServer::start().await;
    let payload = vec![1u8, 2, 3, 4, 5];

    Mock::given(method("POST"))
        .and(path("/transcribe"))
        .and(body_bytes(payload.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "segments": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = TranscriptionClient::new(format!("{}/transcribe", server.uri()));
    let captions = client.transcribe(payload).await.unwrap();
    assert!(captions.is_empty());
}

#[tokio::test]
async fn test_non_success_status_surfaces_as_transcription_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transcribe"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = TranscriptionClient::new(format!("{}/transcribe", server.uri()));
    let err = client.transcribe(vec![0u8; 8]).await.unwrap_err();

    match err {
        CaptionError::TranscriptionFailed(status) => assert_eq!(status, 503),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_generated_captions_serialize_to_srt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transcribe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "segments": [
                { "start": 0.5, "end": 1.5, "text": "first" },
                { "start": 2.0, "end": 3.0, "text": "second" }
            ]
        })))
        .mount(&server)
        .await;

    let client = TranscriptionClient::new(format!("{}/transcribe", server.uri()));
    let mut captions = client.transcribe(vec![0u8; 8]).await.unwrap();

    captions.edit_text("caption-1", "edited");
    let srt = captions.to_srt();

    assert!(srt.starts_with("1\n00:00:00,500 --> 00:00:01,500\nfirst\n"));
    assert!(srt.contains("2\n00:00:02,000 --> 00:00:03,000\nedited\n"));
}
