//! 채널 싱크 -- 배치를 tokio mpsc 채널로 넘김
//!
//! 같은 프로세스 안의 소비자에게 배치를 전달할 때 사용합니다.
//! 채널이 가득 차면 `submit`은 여유가 생기거나 취소될 때까지 대기합니다.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use oslog_core::error::SinkError;
use oslog_core::sink::Sink;
use oslog_core::types::{EnrichedRecord, EntryTag};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::TagSet;

/// 채널 비움 확인 주기
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// mpsc 채널 기반 싱크
pub struct ChannelSink {
    name: String,
    tags: TagSet,
    tx: mpsc::Sender<Vec<EnrichedRecord>>,
    closed: AtomicBool,
}

impl ChannelSink {
    /// 새 채널 싱크를 생성합니다.
    pub fn new(name: impl Into<String>, tags: TagSet, tx: mpsc::Sender<Vec<EnrichedRecord>>) -> Self {
        Self {
            name: name.into(),
            tags,
            tx,
            closed: AtomicBool::new(false),
        }
    }

    /// 용량 `capacity`의 채널을 만들고 싱크와 수신단을 함께 반환합니다.
    pub fn with_capacity(
        name: impl Into<String>,
        tags: TagSet,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<Vec<EnrichedRecord>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(name, tags, tx), rx)
    }

    /// 태그 테이블
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }
}

impl Sink for ChannelSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn resolve_tag(&self, name: &str) -> Result<EntryTag, SinkError> {
        self.tags.resolve(name)
    }

    async fn submit(
        &self,
        cancel: &CancellationToken,
        batch: Vec<EnrichedRecord>,
    ) -> Result<(), SinkError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SinkError::Closed);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SinkError::Cancelled),
            sent = self.tx.send(batch) => {
                sent.map_err(|_| SinkError::Transport("channel receiver dropped".to_owned()))
            }
        }
    }

    async fn sync(&self, timeout: Duration) -> Result<(), SinkError> {
        let drained = async {
            while !self.tx.is_closed() && self.tx.capacity() < self.tx.max_capacity() {
                tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(timeout, drained)
            .await
            .map_err(|_| SinkError::SyncTimeout {
                timeout_ms: timeout.as_millis() as u64,
            })
    }

    async fn close(&self) -> Result<(), SinkError> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(sink = %self.name, "channel sink closed");
        }
        Ok(())
    }
}
