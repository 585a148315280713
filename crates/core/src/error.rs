//! 에러 타입: 도메인별 에러 정의

/// oslog-ingest 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum OslogError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 싱크(다운스트림 전송) 에러
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// 로그 스트림 처리 에러
    #[error("stream error: {0}")]
    Stream(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 싱크 에러
///
/// 취소([`SinkError::Cancelled`])와 그 밖의 전송 실패를 구분합니다.
/// 취소는 감독 루프의 종료 신호이고, 나머지는 일시적 실패로 취급됩니다.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// 취소 토큰에 의해 전송이 중단됨
    #[error("operation cancelled")]
    Cancelled,

    /// 등록되지 않은 태그 이름
    #[error("unknown tag: {0}")]
    UnknownTag(String),

    /// 싱크가 이미 닫힘
    #[error("sink closed")]
    Closed,

    /// 동기화 타임아웃
    #[error("sync timed out after {timeout_ms}ms")]
    SyncTimeout { timeout_ms: u64 },

    /// 전송 실패 (채널 닫힘, 쓰기 실패 등)
    #[error("transport failure: {0}")]
    Transport(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SinkError {
    /// 취소 에러인지 확인합니다.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
