//! 도메인 타입: 디코더, 보강기, 싱크가 공유하는 레코드 타입
//!
//! - [`RecordPayload`]: 디코더가 만든 압축(compact)된 JSON 객체 한 건
//! - [`EntryTag`]: 다운스트림 스트림을 식별하는 라우팅 토큰
//! - [`EnrichedRecord`]: 페이로드 + 수집 시각 + 소스 주소 + 태그

use std::fmt;
use std::net::IpAddr;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 라우팅 태그 토큰
///
/// 싱크가 태그 이름을 해석(resolve)하여 발급하는 불투명 토큰입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryTag(u16);

impl EntryTag {
    /// 새 태그 토큰을 생성합니다.
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// 토큰 값을 반환합니다.
    pub const fn value(self) -> u16 {
        self.0
    }
}

impl fmt::Display for EntryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 디코딩된 레코드 페이로드
///
/// 구분자로 잘린 조각을 `{`/`}`로 다시 감싼 뒤 공백을 제거한 JSON 객체 바이트열입니다.
/// 생성 이후에는 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordPayload(Bytes);

impl RecordPayload {
    /// 바이트열로부터 페이로드를 생성합니다.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self(data.into())
    }

    /// 페이로드 바이트를 반환합니다.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// 내부 `Bytes`를 반환합니다 (참조 카운트 복사).
    pub fn bytes(&self) -> Bytes {
        self.0.clone()
    }

    /// 페이로드 길이 (바이트)
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 페이로드가 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for RecordPayload {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for RecordPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// 보강된 레코드
///
/// 싱크로 전달되는 단위입니다. 타임스탬프는 디코딩 시점이 아니라
/// 보강 시점에 찍힙니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedRecord {
    /// 레코드 본문
    pub payload: RecordPayload,
    /// 수집(보강) 시각
    pub timestamp: DateTime<Utc>,
    /// 소스 주소 오버라이드 (설정되지 않으면 None)
    pub source: Option<IpAddr>,
    /// 라우팅 태그
    pub tag: EntryTag,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_tag_roundtrips_value() {
        let tag = EntryTag::new(7);
        assert_eq!(tag.value(), 7);
        assert_eq!(tag.to_string(), "7");
    }

    #[test]
    fn payload_accessors() {
        let payload = RecordPayload::new(Bytes::from_static(br#"{"a":1}"#));
        assert_eq!(payload.len(), 7);
        assert!(!payload.is_empty());
        assert_eq!(payload.as_bytes(), br#"{"a":1}"#);
        assert_eq!(payload.to_string(), r#"{"a":1}"#);
    }

    #[test]
    fn payload_clone_shares_bytes() {
        let payload = RecordPayload::new(Bytes::from_static(b"{}"));
        let bytes = payload.bytes();
        assert_eq!(bytes.as_ptr(), payload.as_bytes().as_ptr());
    }
}
