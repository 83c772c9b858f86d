use crate::core::{SdkError, TransportError};
use crate::streaming_sse::{sse_records, PipelineBuilder, SseRecord};
use bytes::Bytes;
use futures_util::stream;
use futures_util::StreamExt;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::Poll;

fn byte_stream(chunks: &[&str]) -> impl futures_core::Stream<Item = Result<Bytes, SdkError>> {
    let chunks = chunks
        .iter()
        .map(|chunk| Ok::<Bytes, SdkError>(Bytes::from(chunk.to_string())))
        .collect::<Vec<_>>();
    stream::iter(chunks)
}

async fn collect_records<S>(stream: S) -> Vec<SseRecord>
where
    S: futures_core::Stream<Item = Result<SseRecord, SdkError>>,
{
    stream.map(|r| r.expect("record")).collect().await
}

fn build_error<T>(result: Result<T, SdkError>) -> SdkError {
    match result {
        Ok(_) => panic!("expected build to fail"),
        Err(err) => err,
    }
}

#[tokio::test]
async fn default_pipeline_parses_single_event() {
    let records =
        collect_records(sse_records(byte_stream(&["data: Hello World\nevent: message\nid: 1\n\n"])))
            .await;

    let expected: SseRecord = [("data", "Hello World"), ("event", "message"), ("id", "1")]
        .into_iter()
        .collect();
    assert_eq!(records, vec![expected]);
}

#[tokio::test]
async fn records_follow_input_order() {
    let records = collect_records(sse_records(byte_stream(&[
        "id: 1\ndata: a\n\nid: 2\ndata: b\n\n",
        "id: 3\ndata: c",
    ])))
    .await;

    let ids: Vec<_> = records.iter().map(|r| r.id().unwrap_or_default()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn chunk_boundaries_do_not_change_output() {
    let text = "event: greet\ndata: héllo\n\n: keep-alive\n\ndata: wörld\nid: 7\n\n";
    let whole = collect_records(sse_records(byte_stream(&[text]))).await;

    let byte_chunks: Vec<Result<Bytes, SdkError>> = text
        .as_bytes()
        .chunks(3)
        .map(|b| Ok(Bytes::copy_from_slice(b)))
        .collect();
    let chunked = collect_records(sse_records(stream::iter(byte_chunks))).await;

    assert_eq!(whole.len(), 2);
    assert_eq!(chunked, whole);
    assert_eq!(whole[0].data(), Some("héllo"));
    assert_eq!(whole[1].id(), Some("7"));
}

#[tokio::test]
async fn empty_and_blank_input_yield_nothing() {
    assert!(collect_records(sse_records(byte_stream(&[]))).await.is_empty());
    assert!(collect_records(sse_records(byte_stream(&["", "\n\n", "  \n\n\n"])))
        .await
        .is_empty());
}

#[tokio::test]
async fn custom_separators() {
    let events = PipelineBuilder::new()
        .source(byte_stream(&[
            "data=First Message\r\nevent=custom\r\n\r\ndata=Second Message\r\nevent=test\r\n\r\n",
        ]))
        .stream_separator("\r\n\r\n")
        .part_separator("\r\n")
        .kv_separator("=")
        .build()
        .expect("pipeline");
    let records = collect_records(events).await;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].data(), Some("First Message"));
    assert_eq!(records[0].event(), Some("custom"));
    assert_eq!(records[1].data(), Some("Second Message"));
    assert_eq!(records[1].event(), Some("test"));
}

#[tokio::test]
async fn custom_transform_bypasses_splitter_and_parser() {
    let events = PipelineBuilder::new()
        .source(byte_stream(&["data: a\n\n", "data: b\n\n"]))
        .transform(|text| text.map(|fragment| fragment.map(|s| s.to_uppercase())))
        .build()
        .expect("pipeline");

    let fragments: Vec<String> = events.map(|r| r.expect("fragment")).collect().await;
    assert_eq!(fragments, vec!["DATA: A\n\n", "DATA: B\n\n"]);
}

#[tokio::test]
async fn transform_output_hook_sees_transformed_values() {
    let lengths = Arc::new(std::sync::Mutex::new(Vec::new()));
    let seen = lengths.clone();
    let events = PipelineBuilder::new()
        .source(byte_stream(&["abc", "de"]))
        .transform(|text| text.map(|fragment| fragment.map(|s| s.len())))
        .on_output(move |len: &usize| seen.lock().expect("lock").push(*len))
        .build()
        .expect("pipeline");

    let out: Vec<usize> = events.map(|r| r.expect("len")).collect().await;
    assert_eq!(out, vec![3, 2]);
    assert_eq!(*lengths.lock().expect("lock"), vec![3, 2]);
}

#[test]
fn missing_source_fails_at_build() {
    let err = build_error(PipelineBuilder::new().build());
    match err {
        SdkError::InvalidArgument { message } => assert!(message.contains("`source`")),
        other => panic!("unexpected error variant: {other:?}"),
    }
}

#[test]
fn empty_separator_fails_at_build() {
    let err = build_error(
        PipelineBuilder::new()
            .source(byte_stream(&["data: x\n\n"]))
            .kv_separator("")
            .build(),
    );
    match err {
        SdkError::InvalidArgument { message } => assert!(message.contains("kv_separator")),
        other => panic!("unexpected error variant: {other:?}"),
    }
}

#[tokio::test]
async fn build_does_not_read_the_source() {
    let polled = Arc::new(AtomicBool::new(false));
    let flag = polled.clone();
    let mut sent = false;
    let source = stream::poll_fn(move |_| {
        flag.store(true, Ordering::SeqCst);
        if sent {
            Poll::Ready(None)
        } else {
            sent = true;
            Poll::Ready(Some(Ok::<Bytes, SdkError>(Bytes::from("data: lazy\n\n"))))
        }
    });

    let mut events = PipelineBuilder::new().source(source).build().expect("pipeline");
    assert!(!polled.load(Ordering::SeqCst));

    let first = events.next().await.expect("record").expect("ok");
    assert!(polled.load(Ordering::SeqCst));
    assert_eq!(first.data(), Some("lazy"));
}

#[tokio::test]
async fn transport_errors_convert_through_source() {
    let chunks: Vec<Result<Bytes, TransportError>> = vec![
        Ok(Bytes::from("data: ok\n\n")),
        Err(TransportError::Network("reset".into())),
    ];
    let mut events = PipelineBuilder::new()
        .source(stream::iter(chunks))
        .build()
        .expect("pipeline");

    assert_eq!(
        events.next().await.expect("item").expect("record").data(),
        Some("ok")
    );
    assert!(matches!(
        events.next().await,
        Some(Err(SdkError::Transport(TransportError::Network(_))))
    ));
    assert!(events.next().await.is_none());
}

#[cfg(feature = "stream")]
#[tokio::test]
async fn byte_stream_extension() {
    use crate::streaming_sse::SseStreamExt;
    use std::io;

    let chunks: Vec<Result<Bytes, io::Error>> = vec![
        Ok(Bytes::from("data: hello")),
        Ok(Bytes::from(" world\n\n")),
        Ok(Bytes::from("data: second event\n\n")),
    ];
    let mut records = stream::iter(chunks).into_sse_records();

    let first = records.next().await.unwrap().unwrap();
    assert_eq!(first.data(), Some("hello world"));
    let second = records.next().await.unwrap().unwrap();
    assert_eq!(second.data(), Some("second event"));
    assert!(records.next().await.is_none());
}

#[tokio::test]
async fn records_serialize_as_flat_json() {
    let records = collect_records(sse_records(byte_stream(&["event: ping\ndata: {}\n\n"]))).await;

    assert_eq!(
        serde_json::to_value(&records[0]).expect("json"),
        json!({ "event": "ping", "data": "{}" })
    );
    assert_eq!(records[0].to_json(), json!({ "event": "ping", "data": "{}" }));
}
