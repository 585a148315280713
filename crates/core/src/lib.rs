//! # oslog-core
//!
//! oslog-ingest 워크스페이스의 공통 기반 크레이트입니다.
//!
//! - [`config`]: `oslog.toml` 파싱, 환경변수 오버라이드, 검증
//! - [`error`]: 도메인 에러 타입
//! - [`types`]: 레코드 페이로드, 라우팅 태그, 보강된 레코드
//! - [`sink`]: 다운스트림 전송 trait
//! - [`metrics`]: 메트릭 이름 상수

pub mod config;
pub mod error;
pub mod metrics;
pub mod sink;
pub mod types;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{ConfigError, OslogError, SinkError};

// 설정
pub use config::OslogConfig;

// 싱크 trait
pub use sink::Sink;

// 도메인 타입
pub use types::{EnrichedRecord, EntryTag, RecordPayload};
