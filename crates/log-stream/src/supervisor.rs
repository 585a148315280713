//! 스트림 감독 루프 -- 프로듀서 실행, 디코딩, 보강, 전송, 재시작
//!
//! # 상태 전이
//!
//! ```text
//! Starting ──launch ok──> Streaming ──decode error──> Restarting ──delay──> Starting
//!    │ launch fail (delay 후 재시도)      │ 전송 취소                 │ 대기 중 취소
//!    └──────────────> Starting           └──> Stopped <─────────────┘
//! ```
//!
//! - 실행 실패와 재시작 모두 고정된 `restart_delay`만큼 기다립니다 (backoff 증가 없음).
//! - 취소는 배치 전송 직전과 재시작 대기 중에 확인합니다.
//! - 전송 실패는 로그만 남기고 같은 프로듀서로 계속 진행합니다.
//! - 감독 루프는 취소 외의 이유로 멈추지 않습니다.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use oslog_core::metrics as m;
use oslog_core::sink::Sink;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::StreamConfig;
use crate::decoder::StreamDecoder;
use crate::enricher::RecordEnricher;
use crate::error::StreamError;
use crate::producer::{Producer, ProducerRun};
use crate::sink::{Delivery, SinkAdapter};

/// 감독 루프 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// 프로듀서 실행 시도 중
    Starting,
    /// 디코딩/전송 중
    Streaming,
    /// 프로듀서 종료 후 재시작 대기 중
    Restarting,
    /// 취소되어 종료됨
    Stopped,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starting => write!(f, "starting"),
            Self::Streaming => write!(f, "streaming"),
            Self::Restarting => write!(f, "restarting"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// 감독 루프 종료 시 반환되는 누적 카운터
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupervisorReport {
    /// 성공한 프로듀서 실행 수
    pub launches: u64,
    /// 실패한 실행 시도 수
    pub launch_failures: u64,
    /// 디코드 실패로 인한 재시작 수
    pub restarts: u64,
    /// 디코드 에러 수
    pub decode_errors: u64,
    /// 디코딩된 레코드 수
    pub records_decoded: u64,
    /// 싱크가 수락한 배치 수
    pub batches_delivered: u64,
    /// 싱크가 수락한 레코드 수
    pub records_delivered: u64,
    /// 일시적 전송 실패 수
    pub submit_failures: u64,
}

/// 한 번의 스트리밍 구간이 끝난 이유
enum StreamExit {
    Cancelled,
    DecodeFailed(StreamError),
}

/// 스트림 감독자
pub struct StreamSupervisor<P: Producer, S: Sink> {
    producer: P,
    sink: SinkAdapter<S>,
    enricher: RecordEnricher,
    config: StreamConfig,
    cancel: CancellationToken,
    state: SupervisorState,
    report: SupervisorReport,
}

impl<P: Producer, S: Sink> StreamSupervisor<P, S> {
    /// 빌더를 생성합니다.
    pub fn builder(producer: P, sink: Arc<S>) -> StreamSupervisorBuilder<P, S> {
        StreamSupervisorBuilder::new(producer, sink)
    }

    /// 현재 상태
    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// 레코드 보강기
    pub fn enricher(&self) -> &RecordEnricher {
        &self.enricher
    }

    /// 취소될 때까지 감독 루프를 실행합니다.
    pub async fn run(mut self) -> SupervisorReport {
        info!(
            command = %self.config.command,
            tag = %self.config.tag_name,
            sink = %self.sink.sink().name(),
            "stream supervisor starting"
        );

        let mut active: Option<ProducerRun<P::Output>> = None;

        loop {
            match self.state {
                SupervisorState::Starting => match self.producer.launch() {
                    Ok(run) => {
                        self.report.launches += 1;
                        metrics::counter!(m::PRODUCER_LAUNCHES_TOTAL).increment(1);
                        info!(pid = ?run.pid(), command = %self.config.command, "producer launched");
                        active = Some(run);
                        self.transition(SupervisorState::Streaming);
                    }
                    Err(e) => {
                        self.report.launch_failures += 1;
                        metrics::counter!(m::PRODUCER_LAUNCH_FAILURES_TOTAL).increment(1);
                        error!(error = %e, "failed to start producer");
                        if !wait_restart_delay(&self.cancel, self.config.restart_delay).await {
                            self.transition(SupervisorState::Stopped);
                        }
                    }
                },
                SupervisorState::Streaming => {
                    let Some(run) = active.as_mut() else {
                        self.transition(SupervisorState::Starting);
                        continue;
                    };
                    match self.stream(run).await {
                        StreamExit::Cancelled => self.transition(SupervisorState::Stopped),
                        StreamExit::DecodeFailed(e) => {
                            self.report.decode_errors += 1;
                            metrics::counter!(m::DECODER_ERRORS_TOTAL, m::LABEL_ERROR_KIND => e.kind())
                                .increment(1);
                            warn!(error = %e, kind = e.kind(), "failed to decode producer output");
                            self.transition(SupervisorState::Restarting);
                        }
                    }
                }
                SupervisorState::Restarting => {
                    if let Some(run) = active.take() {
                        run.terminate().await;
                    }
                    self.report.restarts += 1;
                    metrics::counter!(m::PRODUCER_RESTARTS_TOTAL).increment(1);

                    if wait_restart_delay(&self.cancel, self.config.restart_delay).await {
                        self.transition(SupervisorState::Starting);
                    } else {
                        self.transition(SupervisorState::Stopped);
                    }
                }
                SupervisorState::Stopped => {
                    if let Some(run) = active.take() {
                        run.terminate().await;
                    }
                    info!(report = ?self.report, "stream supervisor stopped");
                    return self.report;
                }
            }
        }
    }

    async fn stream(&mut self, run: &mut ProducerRun<P::Output>) -> StreamExit {
        let mut decoder = StreamDecoder::new(self.config.decoder.clone());

        loop {
            let result = decoder.decode(run.output_mut()).await;
            metrics::gauge!(m::DECODER_BUFFER_BYTES).set(decoder.state().buffered_len() as f64);

            let records = match result {
                Ok(records) => records,
                Err(e) => return StreamExit::DecodeFailed(e),
            };
            self.report.records_decoded += records.len() as u64;
            metrics::counter!(m::DECODER_RECORDS_TOTAL).increment(records.len() as u64);

            let batch = self.enricher.enrich(records);
            match self.sink.deliver(&self.cancel, batch).await {
                Delivery::Delivered { records } => {
                    self.report.batches_delivered += 1;
                    self.report.records_delivered += records as u64;
                }
                Delivery::Cancelled => return StreamExit::Cancelled,
                Delivery::Failed(e) => {
                    self.report.submit_failures += 1;
                    error!(error = %e, sink = %self.sink.sink().name(), "failed to send batch");
                }
            }
        }
    }

    fn transition(&mut self, next: SupervisorState) {
        debug!(from = %self.state, to = %next, "supervisor state change");
        self.state = next;
    }
}

/// 재시작 지연만큼 대기합니다. 대기 중 취소되면 `false`를 반환합니다.
async fn wait_restart_delay(cancel: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

/// [`StreamSupervisor`] 빌더
pub struct StreamSupervisorBuilder<P: Producer, S: Sink> {
    producer: P,
    sink: Arc<S>,
    config: StreamConfig,
    cancel: Option<CancellationToken>,
}

impl<P: Producer, S: Sink> StreamSupervisorBuilder<P, S> {
    /// 새 빌더를 생성합니다.
    pub fn new(producer: P, sink: Arc<S>) -> Self {
        Self {
            producer,
            sink,
            config: StreamConfig::default(),
            cancel: None,
        }
    }

    /// 런타임 설정을 지정합니다.
    pub fn config(mut self, config: StreamConfig) -> Self {
        self.config = config;
        self
    }

    /// 외부 취소 토큰을 지정합니다. 지정하지 않으면 새 토큰을 만듭니다.
    pub fn cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// 설정을 검증하고 태그를 해석하여 감독자를 생성합니다.
    pub fn build(self) -> Result<StreamSupervisor<P, S>, StreamError> {
        self.config.validate()?;
        let tag = self.sink.resolve_tag(&self.config.tag_name)?;
        let enricher = RecordEnricher::new(self.config.source_override, tag);

        Ok(StreamSupervisor {
            producer: self.producer,
            sink: SinkAdapter::new(self.sink),
            enricher,
            config: self.config,
            cancel: self.cancel.unwrap_or_else(CancellationToken::new),
            state: SupervisorState::Starting,
            report: SupervisorReport::default(),
        })
    }
}
