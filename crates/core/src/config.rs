//! 설정 관리: oslog.toml 파싱 및 런타임 설정
//!
//! [`OslogConfig`]는 모든 컴포넌트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`OSLOG_STREAM_TAG_NAME=macos` 형식)
//! 3. 설정 파일 (`oslog.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), oslog_core::error::OslogError> {
//! use oslog_core::config::OslogConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = OslogConfig::load("oslog.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = OslogConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::net::IpAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, OslogError};

/// 태그 이름이 비어있을 때 사용하는 기본 태그
pub const DEFAULT_TAG_NAME: &str = "default";

/// oslog-ingest 통합 설정
///
/// `oslog.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 컴포넌트는 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OslogConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 로그 스트림(프로듀서/디코더) 설정
    #[serde(default)]
    pub stream: StreamSection,
    /// 싱크 설정
    #[serde(default)]
    pub sink: SinkSection,
    /// 메트릭 엔드포인트 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl OslogConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 정규화 및 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, OslogError> {
        let mut config = Self::read_file(path.as_ref()).await?;
        config.apply_env_overrides();
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, OslogError> {
        let mut config = Self::read_file(path.as_ref()).await?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    async fn read_file(path: &Path) -> Result<Self, OslogError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                OslogError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                OslogError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, OslogError> {
        toml::from_str(toml_str).map_err(|e| {
            OslogError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `OSLOG_{SECTION}_{FIELD}`
    /// 예: `OSLOG_STREAM_SOURCE_OVERRIDE=10.0.0.1`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "OSLOG_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "OSLOG_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.log_file, "OSLOG_GENERAL_LOG_FILE");
        override_string(&mut self.general.data_dir, "OSLOG_GENERAL_DATA_DIR");
        override_string(
            &mut self.general.ingester_uuid,
            "OSLOG_GENERAL_INGESTER_UUID",
        );
        override_u64(
            &mut self.general.shutdown_timeout_secs,
            "OSLOG_GENERAL_SHUTDOWN_TIMEOUT_SECS",
        );

        // Stream
        override_string(&mut self.stream.command, "OSLOG_STREAM_COMMAND");
        override_args(&mut self.stream.args, "OSLOG_STREAM_ARGS");
        override_string(&mut self.stream.tag_name, "OSLOG_STREAM_TAG_NAME");
        override_string(
            &mut self.stream.source_override,
            "OSLOG_STREAM_SOURCE_OVERRIDE",
        );
        override_u64(
            &mut self.stream.restart_delay_ms,
            "OSLOG_STREAM_RESTART_DELAY_MS",
        );
        override_u64(&mut self.stream.retry_delay_ms, "OSLOG_STREAM_RETRY_DELAY_MS");
        override_usize(
            &mut self.stream.read_chunk_size,
            "OSLOG_STREAM_READ_CHUNK_SIZE",
        );
        override_usize(
            &mut self.stream.max_record_bytes,
            "OSLOG_STREAM_MAX_RECORD_BYTES",
        );

        // Sink
        override_string(&mut self.sink.output, "OSLOG_SINK_OUTPUT");
        override_csv(&mut self.sink.tags, "OSLOG_SINK_TAGS");
        override_u64(
            &mut self.sink.sync_timeout_secs,
            "OSLOG_SINK_SYNC_TIMEOUT_SECS",
        );

        // Metrics
        override_bool(&mut self.metrics.enabled, "OSLOG_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "OSLOG_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "OSLOG_METRICS_PORT");
    }

    /// 비어있는 값을 기본값으로 채웁니다.
    ///
    /// 태그 이름이 비어있으면 `"default"`를 사용합니다.
    pub fn normalize(&mut self) {
        if self.stream.tag_name.trim().is_empty() {
            self.stream.tag_name = DEFAULT_TAG_NAME.to_owned();
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), OslogError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if !self.general.ingester_uuid.is_empty()
            && uuid::Uuid::parse_str(&self.general.ingester_uuid).is_err()
        {
            return Err(invalid(
                "general.ingester_uuid",
                format!("'{}' is not a valid UUID", self.general.ingester_uuid),
            ));
        }

        if self.general.shutdown_timeout_secs == 0 {
            return Err(invalid(
                "general.shutdown_timeout_secs",
                "must be greater than 0".to_owned(),
            ));
        }

        self.stream.validate()?;
        self.sink.validate()?;
        self.metrics.validate()?;

        Ok(())
    }
}

// Default는 derive 매크로로 자동 생성 (각 필드가 Default를 구현하므로)

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 추가 로그 파일 경로 (비어있으면 stdout만 사용)
    pub log_file: String,
    /// 데이터 디렉토리 (ingester UUID 저장 위치)
    pub data_dir: String,
    /// 수집기 UUID (비어있으면 data_dir에서 읽거나 새로 생성)
    pub ingester_uuid: String,
    /// 종료 시 감독 태스크를 기다리는 최대 시간 (초)
    pub shutdown_timeout_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            log_file: String::new(),
            data_dir: "/var/lib/oslog-ingest".to_owned(),
            ingester_uuid: String::new(),
            shutdown_timeout_secs: 5,
        }
    }
}

/// 로그 스트림 설정
///
/// 외부 프로듀서 명령, 라우팅 태그, 소스 주소 오버라이드,
/// 재시작/재시도 지연, 디코더 버퍼 한계를 정의합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSection {
    /// 프로듀서 실행 파일
    pub command: String,
    /// 프로듀서 인자
    pub args: Vec<String>,
    /// 라우팅 태그 이름
    pub tag_name: String,
    /// 소스 주소 오버라이드 (IP 문자열, 비어있으면 미설정)
    pub source_override: String,
    /// 프로듀서 재시작 지연 (밀리초)
    pub restart_delay_ms: u64,
    /// 진행 없는 읽기 후 재시도 지연 (밀리초)
    pub retry_delay_ms: u64,
    /// 한 번에 읽을 바이트 수
    pub read_chunk_size: usize,
    /// 구분자 없이 누적될 수 있는 최대 바이트 수
    pub max_record_bytes: usize,
}

impl Default for StreamSection {
    fn default() -> Self {
        Self {
            command: "log".to_owned(),
            args: vec!["stream".to_owned(), "--style=json".to_owned()],
            tag_name: DEFAULT_TAG_NAME.to_owned(),
            source_override: String::new(),
            restart_delay_ms: 1000,
            retry_delay_ms: 1000,
            read_chunk_size: 1024,
            max_record_bytes: 1024 * 1024, // 1MB
        }
    }
}

impl StreamSection {
    /// 소스 주소 오버라이드를 파싱합니다.
    ///
    /// 비어있으면 `Ok(None)`을 반환합니다.
    pub fn parsed_source_override(&self) -> Result<Option<IpAddr>, ConfigError> {
        let raw = self.source_override.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<IpAddr>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                field: "stream.source_override".to_owned(),
                reason: format!("'{raw}' is not a valid IP address: {e}"),
            })
    }

    fn validate(&self) -> Result<(), OslogError> {
        if self.command.trim().is_empty() {
            return Err(invalid("stream.command", "must not be empty".to_owned()));
        }

        self.parsed_source_override()?;

        if self.restart_delay_ms == 0 {
            return Err(invalid(
                "stream.restart_delay_ms",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.retry_delay_ms == 0 {
            return Err(invalid(
                "stream.retry_delay_ms",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.read_chunk_size == 0 {
            return Err(invalid(
                "stream.read_chunk_size",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.max_record_bytes < self.read_chunk_size {
            return Err(invalid(
                "stream.max_record_bytes",
                format!(
                    "must be at least read_chunk_size ({})",
                    self.read_chunk_size
                ),
            ));
        }

        Ok(())
    }
}

/// 싱크 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkSection {
    /// 출력 대상 (`"-"`는 stdout, 그 외는 파일 경로)
    pub output: String,
    /// 추가로 등록할 태그 이름 (stream.tag_name은 항상 등록됨)
    pub tags: Vec<String>,
    /// 종료 시 동기화 타임아웃 (초)
    pub sync_timeout_secs: u64,
}

impl Default for SinkSection {
    fn default() -> Self {
        Self {
            output: "-".to_owned(),
            tags: Vec::new(),
            sync_timeout_secs: 1,
        }
    }
}

impl SinkSection {
    fn validate(&self) -> Result<(), OslogError> {
        if self.output.trim().is_empty() {
            return Err(invalid("sink.output", "must not be empty".to_owned()));
        }
        if self.tags.iter().any(|t| t.trim().is_empty()) {
            return Err(invalid(
                "sink.tags",
                "tag names must not be empty".to_owned(),
            ));
        }
        if self.sync_timeout_secs == 0 {
            return Err(invalid(
                "sink.sync_timeout_secs",
                "must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }
}

/// 메트릭 엔드포인트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 리슨 주소
    pub listen_addr: String,
    /// 포트
    pub port: u16,
    /// 스크레이프 경로 (현재 `/metrics`만 지원)
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9100,
            endpoint: "/metrics".to_owned(),
        }
    }
}

impl MetricsConfig {
    fn validate(&self) -> Result<(), OslogError> {
        if !self.enabled {
            return Ok(());
        }
        if self.port == 0 {
            return Err(invalid(
                "metrics.port",
                "must be greater than 0".to_owned(),
            ));
        }
        if self.endpoint != "/metrics" {
            return Err(invalid(
                "metrics.endpoint",
                "only '/metrics' is supported".to_owned(),
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> OslogError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

// 프로듀서 인자는 공백으로 구분 (`--style=json` 같은 인자에 쉼표가 올 수 있음)
fn override_args(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val.split_whitespace().map(str::to_owned).collect();
    }
}
