//! 싱크 어댑터와 내장 싱크 구현
//!
//! - [`SinkAdapter`]: 취소 토큰 확인 후 배치를 [`Sink`]에 넘기고 결과를 [`Delivery`]로 분류
//! - [`ChannelSink`]: 프로세스 내부 mpsc 채널 전송
//! - [`JsonLinesSink`]: 파일/표준 출력으로 JSON Lines 기록
//! - [`TagSet`]: 태그 이름 → [`EntryTag`] 해석 테이블

mod channel;
mod jsonl;

pub use channel::ChannelSink;
pub use jsonl::JsonLinesSink;

use std::sync::Arc;

use oslog_core::error::SinkError;
use oslog_core::metrics as m;
use oslog_core::sink::Sink;
use oslog_core::types::{EnrichedRecord, EntryTag};
use tokio_util::sync::CancellationToken;

/// 싱크 전송 결과
#[derive(Debug)]
pub enum Delivery {
    /// 전송 성공 (전달된 레코드 수)
    Delivered {
        /// 레코드 수
        records: usize,
    },
    /// 취소 토큰 발화로 전송하지 않았거나 중단됨
    Cancelled,
    /// 일시적 전송 실패
    Failed(SinkError),
}

impl Delivery {
    /// 메트릭 레이블 값
    pub fn label(&self) -> &'static str {
        match self {
            Self::Delivered { .. } => "delivered",
            Self::Cancelled => "cancelled",
            Self::Failed(_) => "failed",
        }
    }
}

/// [`Sink`] 앞단 어댑터
pub struct SinkAdapter<S> {
    sink: Arc<S>,
}

impl<S: Sink> SinkAdapter<S> {
    /// 새 어댑터를 생성합니다.
    pub fn new(sink: Arc<S>) -> Self {
        Self { sink }
    }

    /// 내부 싱크
    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    /// 배치를 전송합니다.
    ///
    /// 취소 토큰이 이미 발화되었으면 싱크를 호출하지 않습니다.
    /// 빈 배치는 싱크에 넘기지 않고 바로 `Delivered { records: 0 }`을 반환합니다.
    pub async fn deliver(&self, cancel: &CancellationToken, batch: Vec<EnrichedRecord>) -> Delivery {
        let delivery = if cancel.is_cancelled() {
            Delivery::Cancelled
        } else if batch.is_empty() {
            return Delivery::Delivered { records: 0 };
        } else {
            let records = batch.len();
            match self.sink.submit(cancel, batch).await {
                Ok(()) => {
                    metrics::counter!(m::SINK_RECORDS_DELIVERED_TOTAL).increment(records as u64);
                    Delivery::Delivered { records }
                }
                Err(SinkError::Cancelled) => Delivery::Cancelled,
                Err(e) => Delivery::Failed(e),
            }
        };

        metrics::counter!(m::SINK_BATCHES_TOTAL, m::LABEL_RESULT => delivery.label()).increment(1);
        delivery
    }
}

/// 태그 이름 → 토큰 해석 테이블
///
/// 토큰 값은 등록 순서의 인덱스입니다. 중복 이름은 처음 것만 남습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    names: Vec<String>,
}

impl TagSet {
    /// 태그 이름 목록으로 테이블을 생성합니다.
    pub fn new<I, T>(names: I) -> Result<Self, SinkError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut set = Self::default();
        for name in names {
            set.insert(name.into())?;
        }
        Ok(set)
    }

    /// 태그를 추가하고 토큰을 반환합니다. 이미 있으면 기존 토큰을 반환합니다.
    pub fn insert(&mut self, name: String) -> Result<EntryTag, SinkError> {
        if let Some(tag) = self.lookup(&name) {
            return Ok(tag);
        }
        let index = u16::try_from(self.names.len())
            .map_err(|_| SinkError::Transport(format!("too many tags (max {})", u16::MAX)))?;
        self.names.push(name);
        Ok(EntryTag::new(index))
    }

    /// 이름으로 토큰을 찾습니다.
    pub fn resolve(&self, name: &str) -> Result<EntryTag, SinkError> {
        self.lookup(name)
            .ok_or_else(|| SinkError::UnknownTag(name.to_owned()))
    }

    /// 토큰으로 이름을 찾습니다.
    pub fn name_of(&self, tag: EntryTag) -> Option<&str> {
        self.names.get(usize::from(tag.value())).map(String::as_str)
    }

    /// 등록된 태그 수
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn lookup(&self, name: &str) -> Option<EntryTag> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|i| u16::try_from(i).ok())
            .map(EntryTag::new)
    }
}
