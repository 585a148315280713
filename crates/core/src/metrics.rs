//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `oslog_`
//! - 컴포넌트: `producer_`, `decoder_`, `sink_`, `daemon_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(oslog_core::metrics::DECODER_RECORDS_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (delivered, cancelled, failed)
pub const LABEL_RESULT: &str = "result";

/// 에러 종류 레이블 키 (end_of_stream, read, compact, record_too_large)
pub const LABEL_ERROR_KIND: &str = "kind";

// ─── Producer 메트릭 ────────────────────────────────────────────────

/// Producer: 프로세스 실행 횟수 (counter)
pub const PRODUCER_LAUNCHES_TOTAL: &str = "oslog_producer_launches_total";

/// Producer: 실행 실패 횟수 (counter)
pub const PRODUCER_LAUNCH_FAILURES_TOTAL: &str = "oslog_producer_launch_failures_total";

/// Producer: 디코드 실패로 인한 재시작 횟수 (counter)
pub const PRODUCER_RESTARTS_TOTAL: &str = "oslog_producer_restarts_total";

// ─── Decoder 메트릭 ─────────────────────────────────────────────────

/// Decoder: 디코딩된 레코드 수 (counter)
pub const DECODER_RECORDS_TOTAL: &str = "oslog_decoder_records_total";

/// Decoder: 디코드 에러 수 (counter, label: kind)
pub const DECODER_ERRORS_TOTAL: &str = "oslog_decoder_errors_total";

/// Decoder: 미해결 누적 버퍼 크기 (gauge, 바이트)
pub const DECODER_BUFFER_BYTES: &str = "oslog_decoder_buffer_bytes";

// ─── Sink 메트릭 ────────────────────────────────────────────────────

/// Sink: 제출된 배치 수 (counter, label: result)
pub const SINK_BATCHES_TOTAL: &str = "oslog_sink_batches_total";

/// Sink: 전달된 레코드 수 (counter)
pub const SINK_RECORDS_DELIVERED_TOTAL: &str = "oslog_sink_records_delivered_total";

// ─── Daemon 메트릭 ──────────────────────────────────────────────────

/// Daemon: 빌드 정보 (gauge, 항상 1, label: version)
pub const DAEMON_BUILD_INFO: &str = "oslog_daemon_build_info";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
/// 일반적으로 `oslog-daemon`의 시작 시점에서 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    // Producer
    describe_counter!(
        PRODUCER_LAUNCHES_TOTAL,
        "Total number of log stream producer processes launched"
    );
    describe_counter!(
        PRODUCER_LAUNCH_FAILURES_TOTAL,
        "Total number of producer launch attempts that failed"
    );
    describe_counter!(
        PRODUCER_RESTARTS_TOTAL,
        "Total number of producer restarts caused by decode failures"
    );

    // Decoder
    describe_counter!(
        DECODER_RECORDS_TOTAL,
        "Total number of records decoded from the producer stream"
    );
    describe_counter!(
        DECODER_ERRORS_TOTAL,
        "Decode failures by kind (end_of_stream, read, compact, record_too_large)"
    );
    describe_gauge!(
        DECODER_BUFFER_BYTES,
        "Bytes held in the decoder accumulation buffer after the last decode"
    );

    // Sink
    describe_counter!(
        SINK_BATCHES_TOTAL,
        "Batches handed to the sink by result (delivered, cancelled, failed)"
    );
    describe_counter!(
        SINK_RECORDS_DELIVERED_TOTAL,
        "Total number of records accepted by the sink"
    );

    // Daemon
    describe_gauge!(DAEMON_BUILD_INFO, "Build information (always 1)");
}
