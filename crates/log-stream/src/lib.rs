//! # oslog-stream
//!
//! 시스템 로그 스트림 수집 파이프라인입니다.
//!
//! 외부 프로듀서(`log stream --style=json`)가 출력하는 끝나지 않는 JSON 배열을
//! 레코드 단위로 잘라내고, 수집 메타데이터를 붙여 [`Sink`](oslog_core::sink::Sink)로 전송합니다.
//!
//! # 구성 요소
//!
//! - [`decoder`]: 프리앰블 제거, 구분자 기반 분리, 레코드 압축
//! - [`producer`]: 프로듀서 프로세스 실행과 종료
//! - [`enricher`]: 타임스탬프, 출처 주소, 태그 부착
//! - [`sink`]: 싱크 어댑터와 내장 싱크 ([`ChannelSink`], [`JsonLinesSink`])
//! - [`supervisor`]: 실행/디코딩/전송/재시작 상태 기계
//!
//! # 사용 예시
//!
//! ```ignore
//! use std::sync::Arc;
//! use oslog_stream::{CommandProducer, JsonLinesSink, StreamConfig, StreamSupervisor, TagSet};
//!
//! let config = StreamConfig::default();
//! let sink = Arc::new(JsonLinesSink::open("-", TagSet::new(["default"])?).await?);
//! let supervisor = StreamSupervisor::builder(CommandProducer::from_config(&config), sink)
//!     .config(config)
//!     .cancel_token(cancel.clone())
//!     .build()?;
//! let report = supervisor.run().await;
//! ```

pub mod config;
pub mod decoder;
pub mod enricher;
pub mod error;
pub mod producer;
pub mod sink;
pub mod supervisor;

pub use config::{DecoderConfig, StreamConfig};
pub use decoder::{DecoderState, StreamDecoder};
pub use enricher::RecordEnricher;
pub use error::StreamError;
pub use producer::{CommandProducer, Producer, ProducerRun};
pub use sink::{ChannelSink, Delivery, JsonLinesSink, SinkAdapter, TagSet};
pub use supervisor::{StreamSupervisor, StreamSupervisorBuilder, SupervisorReport, SupervisorState};
