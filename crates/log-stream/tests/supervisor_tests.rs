//! 감독 루프 통합 테스트
//!
//! - 취소 후 추가 전송 없음, 한 번의 디코드-전송 주기 안에 종료
//! - 전송 실패는 재시작을 일으키지 않음
//! - 디코드 에러 후 고정 지연 뒤 재시작, 새 디코더 상태 사용
//! - 실행 실패는 지연 후 재시도
//! - 실제 프로세스 종단 간 흐름 (unix)

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{Script, ScriptedProducer, TestSink};
use oslog_core::types::EntryTag;
use oslog_stream::{StreamConfig, StreamSupervisor};
use tokio_util::sync::CancellationToken;

fn test_config() -> StreamConfig {
    StreamConfig {
        tag_name: "macos".to_owned(),
        source_override: Some("192.0.2.1".parse().expect("ip")),
        restart_delay: Duration::from_millis(100),
        ..StreamConfig::default()
    }
}

// =============================================================================
// 취소
// =============================================================================

#[tokio::test(start_paused = true)]
async fn cancellation_stops_submissions() {
    // Given: 끝없이 레코드를 내는 프로듀서, 3번째 배치 수락 후 취소하는 싱크
    let cancel = CancellationToken::new();
    let sink = Arc::new(TestSink::new().cancelling_after(3, cancel.clone()));
    let producer = ScriptedProducer::new(vec![Script::Endless]);
    let launches = producer.launches();

    let supervisor = StreamSupervisor::builder(producer, Arc::clone(&sink))
        .config(test_config())
        .cancel_token(cancel.clone())
        .build()
        .expect("build");

    // When
    let report = tokio::time::timeout(Duration::from_secs(5), supervisor.run())
        .await
        .expect("supervisor must stop after cancellation");

    // Then: 취소 이후 싱크 호출 없음
    assert_eq!(sink.attempts(), 3);
    assert_eq!(sink.batches().len(), 3);
    assert_eq!(report.batches_delivered, 3);
    assert_eq!(report.restarts, 0);
    assert_eq!(launches.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_before_run_submits_nothing() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let sink = Arc::new(TestSink::new());

    let supervisor = StreamSupervisor::builder(
        ScriptedProducer::new(vec![Script::Endless]),
        Arc::clone(&sink),
    )
    .config(test_config())
    .cancel_token(cancel)
    .build()
    .expect("build");

    let report = supervisor.run().await;
    assert_eq!(sink.attempts(), 0);
    assert_eq!(report.launches, 1);
    assert_eq!(report.records_decoded, 1);
}

// =============================================================================
// 전송 실패
// =============================================================================

#[tokio::test(start_paused = true)]
async fn submit_failure_keeps_same_producer() {
    // Given: 처음 두 번의 전송이 실패하는 싱크
    let cancel = CancellationToken::new();
    let sink = Arc::new(
        TestSink::new()
            .failing_first(2)
            .cancelling_after(2, cancel.clone()),
    );
    let producer = ScriptedProducer::new(vec![Script::Endless]);
    let launches = producer.launches();

    let supervisor = StreamSupervisor::builder(producer, Arc::clone(&sink))
        .config(test_config())
        .cancel_token(cancel.clone())
        .build()
        .expect("build");

    // When
    let report = supervisor.run().await;

    // Then: 재시작 없이 같은 프로듀서에서 다음 레코드가 전달됨
    assert_eq!(launches.load(Ordering::SeqCst), 1);
    assert_eq!(report.submit_failures, 2);
    assert_eq!(report.restarts, 0);
    assert_eq!(report.batches_delivered, 2);

    // 실패한 배치는 버려지고, 이후 배치는 순서대로 이어짐
    let payloads = sink.payloads();
    assert_eq!(payloads[0], r#"{"seq":2}"#);
    assert_eq!(payloads[1], r#"{"seq":3}"#);
}

// =============================================================================
// 재시작
// =============================================================================

#[tokio::test(start_paused = true)]
async fn decode_error_restarts_with_fresh_state() {
    // Given: 첫 실행은 미완성 꼬리를 남기고 종료, 두 번째 실행은 정상 스트림
    let cancel = CancellationToken::new();
    let sink = Arc::new(TestSink::new().cancelling_after(2, cancel.clone()));
    let producer = ScriptedProducer::new(vec![
        Script::Output(b"[{\n\"first\":1\n},{\n\"stale\":".to_vec()),
        Script::Output(b"[{\n\"second\":2\n},{\n\"third\":3\n},{\n".to_vec()),
    ]);
    let launches = producer.launches();

    let supervisor = StreamSupervisor::builder(producer, Arc::clone(&sink))
        .config(test_config())
        .cancel_token(cancel.clone())
        .build()
        .expect("build");

    // When
    let report = supervisor.run().await;

    // Then: 이전 실행의 꼬리("stale")는 다음 실행으로 넘어가지 않음.
    // 두 번째 실행도 EOF로 끝나지만 재시작 대기 중 취소가 확인되어 세 번째 실행은 없음
    assert_eq!(launches.load(Ordering::SeqCst), 2);
    assert_eq!(report.launches, 2);
    assert_eq!(report.decode_errors, 2);
    assert_eq!(
        sink.payloads(),
        vec![
            r#"{"first":1}"#.to_owned(),
            r#"{"second":2}"#.to_owned(),
            r#"{"third":3}"#.to_owned(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn malformed_record_triggers_restart() {
    let cancel = CancellationToken::new();
    let sink = Arc::new(TestSink::new().cancelling_after(1, cancel.clone()));
    let producer = ScriptedProducer::new(vec![
        Script::Output(b"[{\n\"broken\":\n},{\n".to_vec()),
        Script::Output(b"[{\n\"ok\":true\n},{\n".to_vec()),
    ]);

    let supervisor = StreamSupervisor::builder(producer, Arc::clone(&sink))
        .config(test_config())
        .cancel_token(cancel.clone())
        .build()
        .expect("build");

    let report = supervisor.run().await;
    assert_eq!(report.launches, 2);
    assert!(report.decode_errors >= 1);
    assert_eq!(sink.payloads(), vec![r#"{"ok":true}"#.to_owned()]);
}

#[tokio::test(start_paused = true)]
async fn restart_waits_fixed_delay() {
    // Given: 매 실행이 즉시 EOF
    let cancel = CancellationToken::new();
    let sink = Arc::new(TestSink::new());
    let producer = ScriptedProducer::new(vec![
        Script::Output(Vec::new()),
        Script::Output(Vec::new()),
        Script::Output(Vec::new()),
        Script::Output(Vec::new()),
    ]);
    let launches = producer.launches();

    let supervisor = StreamSupervisor::builder(producer, Arc::clone(&sink))
        .config(test_config())
        .cancel_token(cancel.clone())
        .build()
        .expect("build");
    let handle = tokio::spawn(supervisor.run());

    // When: 지연(100ms) 2.5번 분량만큼 진행
    tokio::time::sleep(Duration::from_millis(250)).await;
    cancel.cancel();
    let report = handle.await.expect("join");

    // Then: 0ms, 100ms, 200ms에 실행
    assert_eq!(launches.load(Ordering::SeqCst), 3);
    assert_eq!(report.restarts, 3);
    assert_eq!(sink.attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn launch_failure_then_recovery() {
    let cancel = CancellationToken::new();
    let sink = Arc::new(TestSink::new().cancelling_after(1, cancel.clone()));
    let producer = ScriptedProducer::new(vec![
        Script::FailLaunch,
        Script::FailLaunch,
        Script::Output(b"[{\n\"up\":1\n},{\n".to_vec()),
    ]);

    let supervisor = StreamSupervisor::builder(producer, Arc::clone(&sink))
        .config(test_config())
        .cancel_token(cancel.clone())
        .build()
        .expect("build");

    let report = supervisor.run().await;
    assert_eq!(report.launch_failures, 2);
    assert_eq!(report.launches, 1);
    assert_eq!(sink.payloads(), vec![r#"{"up":1}"#.to_owned()]);
}

// =============================================================================
// 보강
// =============================================================================

#[tokio::test(start_paused = true)]
async fn delivered_records_are_enriched() {
    let cancel = CancellationToken::new();
    let sink = Arc::new(TestSink::new().cancelling_after(1, cancel.clone()));
    let producer = ScriptedProducer::new(vec![Script::Output(
        b"[{\n\"a\":1\n},{\n\"b\":2\n},{\n".to_vec(),
    )]);

    let supervisor = StreamSupervisor::builder(producer, Arc::clone(&sink))
        .config(test_config())
        .cancel_token(cancel.clone())
        .build()
        .expect("build");
    supervisor.run().await;

    let batches = sink.batches();
    assert_eq!(batches.len(), 1);
    let batch = &batches[0];
    assert_eq!(batch.len(), 2);
    assert!(batch.iter().all(|r| r.tag == EntryTag::new(1)));
    assert!(batch.iter().all(|r| r.source == Some("192.0.2.1".parse().expect("ip"))));
    assert_eq!(batch[0].timestamp, batch[1].timestamp);
}

// =============================================================================
// 실제 프로세스
// =============================================================================

#[cfg(unix)]
#[tokio::test]
async fn command_producer_end_to_end() {
    use oslog_stream::{ChannelSink, CommandProducer, TagSet};

    let script = r#"printf '[{\n  "eventMessage" : "one"\n},{\n  "eventMessage" : "two"\n},{\n'; sleep 30"#;
    let config = StreamConfig {
        command: "sh".to_owned(),
        args: vec!["-c".to_owned(), script.to_owned()],
        ..StreamConfig::default()
    };

    let (sink, mut rx) = ChannelSink::with_capacity("e2e", TagSet::new(["default"]).expect("tags"), 8);
    let cancel = CancellationToken::new();
    let supervisor = StreamSupervisor::builder(CommandProducer::from_config(&config), Arc::new(sink))
        .config(config)
        .cancel_token(cancel.clone())
        .build()
        .expect("build");
    let handle = tokio::spawn(supervisor.run());

    let mut payloads: Vec<String> = Vec::new();
    while payloads.len() < 2 {
        let batch = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("batch within timeout")
            .expect("channel open");
        payloads.extend(batch.iter().map(|r| r.payload.to_string()));
    }
    assert_eq!(
        payloads,
        vec![r#"{"eventMessage":"one"}"#, r#"{"eventMessage":"two"}"#]
    );

    // 프로듀서는 sleep 중이므로 읽기가 블로킹됨. 취소 후 태스크를 중단하면
    // kill_on_drop으로 자식 프로세스가 정리됨
    cancel.cancel();
    handle.abort();
    let _ = handle.await;
}
