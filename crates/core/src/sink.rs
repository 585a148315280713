//! 싱크 trait: 다운스트림 전송 확장 포인트
//!
//! 감독 루프는 구체적인 전송 방식을 모릅니다. [`Sink`]를 구현한 객체가
//! "취소 가능한 컨텍스트에서 배치 전송"과 "태그 이름 → 토큰 해석"을 제공합니다.
//!
//! # 취소 의미
//! `submit`은 취소 토큰이 발화되면 [`SinkError::Cancelled`]를 반환해야 합니다.
//! 호출자는 이 에러를 종료 신호로, 나머지 에러는 일시적 실패로 해석합니다.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::SinkError;
use crate::types::{EnrichedRecord, EntryTag};

/// 다운스트림 전송 trait
///
/// 전송 보장(재시도, 캐싱, 내구성)은 구현체의 책임입니다.
pub trait Sink: Send + Sync {
    /// 싱크 이름 (로그용)
    fn name(&self) -> &str;

    /// 태그 이름을 라우팅 토큰으로 해석합니다.
    fn resolve_tag(&self, name: &str) -> Result<EntryTag, SinkError>;

    /// 보강된 레코드 배치를 전송합니다.
    fn submit(
        &self,
        cancel: &CancellationToken,
        batch: Vec<EnrichedRecord>,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;

    /// 버퍼에 남은 데이터를 `timeout` 안에 내보냅니다.
    fn sync(&self, timeout: Duration) -> impl Future<Output = Result<(), SinkError>> + Send;

    /// 싱크를 닫습니다. 이후의 `submit`은 실패합니다.
    fn close(&self) -> impl Future<Output = Result<(), SinkError>> + Send;
}
