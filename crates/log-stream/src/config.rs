//! 스트림 런타임 설정
//!
//! [`StreamConfig`]는 `oslog-core`의 [`StreamSection`](oslog_core::config::StreamSection)을
//! 런타임에서 바로 쓸 수 있는 형태(Duration, 파싱된 IP)로 변환한 것입니다.

use std::net::IpAddr;
use std::time::Duration;

use oslog_core::config::{DEFAULT_TAG_NAME, StreamSection};

use crate::error::StreamError;

/// 기본 읽기 청크 크기 (바이트)
pub const DEFAULT_READ_CHUNK_SIZE: usize = 1024;

/// 기본 레코드 최대 크기 (바이트)
pub const DEFAULT_MAX_RECORD_BYTES: usize = 1024 * 1024;

/// 기본 재시작/재시도 지연
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// 디코더 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// 한 번의 읽기 요청 크기
    pub read_chunk_size: usize,
    /// 구분자 없이 누적 가능한 최대 바이트 수
    pub max_record_bytes: usize,
    /// 진행 없는 읽기(Interrupted/WouldBlock) 후 재시도 전 대기 시간
    pub retry_delay: Duration,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
            retry_delay: DEFAULT_DELAY,
        }
    }
}

/// 스트림 감독 루프 런타임 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// 프로듀서 명령
    pub command: String,
    /// 프로듀서 인자
    pub args: Vec<String>,
    /// 레코드에 붙일 태그 이름
    pub tag_name: String,
    /// 레코드 출처 주소 (없으면 보고하지 않음)
    pub source_override: Option<IpAddr>,
    /// 재시작 전 고정 대기 시간
    pub restart_delay: Duration,
    /// 디코더 설정
    pub decoder: DecoderConfig,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            command: "log".to_owned(),
            args: vec!["stream".to_owned(), "--style=json".to_owned()],
            tag_name: DEFAULT_TAG_NAME.to_owned(),
            source_override: None,
            restart_delay: DEFAULT_DELAY,
            decoder: DecoderConfig::default(),
        }
    }
}

impl StreamConfig {
    /// core 설정 섹션에서 런타임 설정을 생성합니다.
    pub fn from_core(section: &StreamSection) -> Result<Self, StreamError> {
        let source_override =
            section
                .parsed_source_override()
                .map_err(|e| StreamError::Config {
                    field: "stream.source_override".to_owned(),
                    reason: e.to_string(),
                })?;

        let tag_name = if section.tag_name.is_empty() {
            DEFAULT_TAG_NAME.to_owned()
        } else {
            section.tag_name.clone()
        };

        let config = Self {
            command: section.command.clone(),
            args: section.args.clone(),
            tag_name,
            source_override,
            restart_delay: Duration::from_millis(section.restart_delay_ms),
            decoder: DecoderConfig {
                read_chunk_size: section.read_chunk_size,
                max_record_bytes: section.max_record_bytes,
                retry_delay: Duration::from_millis(section.retry_delay_ms),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// 런타임 불변 조건을 검증합니다.
    pub fn validate(&self) -> Result<(), StreamError> {
        if self.command.is_empty() {
            return Err(config_error("command", "must not be empty"));
        }
        if self.decoder.read_chunk_size == 0 {
            return Err(config_error("read_chunk_size", "must be greater than 0"));
        }
        if self.decoder.max_record_bytes < self.decoder.read_chunk_size {
            return Err(config_error(
                "max_record_bytes",
                "must be at least read_chunk_size",
            ));
        }
        if self.restart_delay.is_zero() {
            return Err(config_error("restart_delay", "must be greater than 0"));
        }
        if self.decoder.retry_delay.is_zero() {
            return Err(config_error("retry_delay", "must be greater than 0"));
        }
        Ok(())
    }
}

fn config_error(field: &str, reason: &str) -> StreamError {
    StreamError::Config {
        field: format!("stream.{field}"),
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = StreamConfig::default();
        config.validate().unwrap();
        assert_eq!(config.tag_name, "default");
        assert_eq!(config.decoder.read_chunk_size, 1024);
    }

    #[test]
    fn from_core_converts_units() {
        let section = StreamSection {
            restart_delay_ms: 250,
            retry_delay_ms: 50,
            source_override: "10.0.0.7".to_owned(),
            ..StreamSection::default()
        };
        let config = StreamConfig::from_core(&section).unwrap();
        assert_eq!(config.restart_delay, Duration::from_millis(250));
        assert_eq!(config.decoder.retry_delay, Duration::from_millis(50));
        assert_eq!(config.source_override, Some("10.0.0.7".parse().unwrap()));
    }

    #[test]
    fn from_core_empty_tag_becomes_default() {
        let section = StreamSection {
            tag_name: String::new(),
            ..StreamSection::default()
        };
        let config = StreamConfig::from_core(&section).unwrap();
        assert_eq!(config.tag_name, DEFAULT_TAG_NAME);
    }

    #[test]
    fn from_core_rejects_bad_ip() {
        let section = StreamSection {
            source_override: "not-an-ip".to_owned(),
            ..StreamSection::default()
        };
        let err = StreamConfig::from_core(&section).unwrap_err();
        assert!(matches!(err, StreamError::Config { ref field, .. } if field == "stream.source_override"));
    }

    #[test]
    fn validate_rejects_zero_chunk() {
        let mut config = StreamConfig::default();
        config.decoder.read_chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_retry_delay() {
        let mut config = StreamConfig::default();
        config.decoder.retry_delay = Duration::ZERO;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, StreamError::Config { ref field, .. } if field == "stream.retry_delay"));
    }

    #[test]
    fn validate_rejects_limit_below_chunk() {
        let mut config = StreamConfig::default();
        config.decoder.max_record_bytes = 16;
        assert!(config.validate().is_err());
    }
}
