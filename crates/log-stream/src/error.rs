//! 로그 스트림 에러 타입
//!
//! [`StreamError`]는 프로듀서 실행, 스트림 디코딩, 설정 변환 중 발생하는 에러를 표현합니다.
//! 감독 루프는 [`StreamError::Launch`]를 재시도 대상으로, 나머지 디코드 에러를
//! 프로듀서 재시작 사유로 취급합니다.

use oslog_core::error::{OslogError, SinkError};

/// 로그 스트림 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// 프로듀서 프로세스 실행 실패
    #[error("failed to launch producer '{command}': {reason}")]
    Launch {
        /// 실행하려던 명령
        command: String,
        /// 실패 사유
        reason: String,
    },

    /// 프로듀서 출력 스트림 종료 (0바이트 읽기)
    #[error("producer stream ended")]
    EndOfStream,

    /// 읽기 에러
    #[error("read error: {0}")]
    Read(#[from] std::io::Error),

    /// 레코드 압축(compact) 실패 -- 구문이 깨진 조각
    #[error("malformed record ({record_len} bytes): {reason}")]
    Compact {
        /// 다시 감싼 조각의 길이
        record_len: usize,
        /// JSON 에러 내용
        reason: String,
    },

    /// 구분자 없이 누적된 바이트가 한계를 넘음
    #[error("record exceeds {limit} bytes without a separator ({buffered} bytes buffered)")]
    RecordTooLarge {
        /// 현재 누적 바이트 수
        buffered: usize,
        /// 최대 허용 바이트 수
        limit: usize,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 싱크 에러 (태그 해석 실패 등)
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}

impl StreamError {
    /// 메트릭 레이블용 에러 종류를 반환합니다.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Launch { .. } => "launch",
            Self::EndOfStream => "end_of_stream",
            Self::Read(_) => "read",
            Self::Compact { .. } => "compact",
            Self::RecordTooLarge { .. } => "record_too_large",
            Self::Config { .. } => "config",
            Self::Sink(_) => "sink",
        }
    }
}

impl From<StreamError> for OslogError {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Sink(e) => OslogError::Sink(e),
            other => OslogError::Stream(other.to_string()),
        }
    }
}
