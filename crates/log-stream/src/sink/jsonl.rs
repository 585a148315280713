//! JSON Lines 싱크 -- 레코드를 한 줄씩 파일 또는 표준 출력에 기록
//!
//! 각 줄의 형식:
//!
//! ```text
//! {"ts":"2026-01-02T03:04:05.123Z","src":"10.0.0.1","tag":"macos","data":{...}}
//! ```
//!
//! `src`는 출처 주소가 없으면 `null`입니다. 배치마다 flush합니다.

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use oslog_core::error::SinkError;
use oslog_core::sink::Sink;
use oslog_core::types::{EnrichedRecord, EntryTag};
use serde::Serialize;
use serde_json::value::RawValue;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::TagSet;

/// 표준 출력을 뜻하는 출력 경로
pub const STDOUT_TARGET: &str = "-";

type BoxedWriter = BufWriter<Box<dyn AsyncWrite + Send + Unpin>>;

#[derive(Serialize)]
struct JsonLine<'a> {
    ts: &'a DateTime<Utc>,
    src: Option<IpAddr>,
    tag: &'a str,
    data: &'a RawValue,
}

/// JSON Lines 출력 싱크
pub struct JsonLinesSink {
    target: String,
    tags: TagSet,
    writer: Mutex<Option<BoxedWriter>>,
}

impl JsonLinesSink {
    /// 출력 대상을 엽니다. `-`는 표준 출력, 나머지는 추가(append) 모드 파일입니다.
    pub async fn open(target: &str, tags: TagSet) -> Result<Self, SinkError> {
        let inner: Box<dyn AsyncWrite + Send + Unpin> = if target == STDOUT_TARGET {
            Box::new(tokio::io::stdout())
        } else {
            let path = Path::new(target);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            let file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await?;
            Box::new(file)
        };

        info!(target_path = %target, tags = tags.len(), "json lines sink opened");
        Ok(Self::from_writer(target, tags, inner))
    }

    /// 임의의 writer로 싱크를 생성합니다.
    pub fn from_writer(
        target: impl Into<String>,
        tags: TagSet,
        writer: Box<dyn AsyncWrite + Send + Unpin>,
    ) -> Self {
        Self {
            target: target.into(),
            tags,
            writer: Mutex::new(Some(BufWriter::new(writer))),
        }
    }

    /// 태그 테이블
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    fn render(&self, batch: &[EnrichedRecord]) -> Result<Vec<u8>, SinkError> {
        let mut out = Vec::with_capacity(batch.iter().map(|r| r.payload.len() + 96).sum());
        for record in batch {
            let tag = self
                .tags
                .name_of(record.tag)
                .ok_or_else(|| SinkError::UnknownTag(record.tag.to_string()))?;
            let Some(data) = raw_payload(record.payload.as_bytes()) else {
                warn!(
                    target_path = %self.target,
                    record_len = record.payload.len(),
                    "skipping record that is not a JSON value"
                );
                continue;
            };

            let line = JsonLine {
                ts: &record.timestamp,
                src: record.source,
                tag,
                data: &data,
            };
            serde_json::to_writer(&mut out, &line)
                .map_err(|e| SinkError::Transport(e.to_string()))?;
            out.push(b'\n');
        }
        Ok(out)
    }
}

/// 페이로드를 `data` 필드용 원시 JSON으로 변환합니다.
///
/// 문자열 안의 잘못된 UTF-8 바이트는 U+FFFD로 바뀝니다.
fn raw_payload(bytes: &[u8]) -> Option<Box<RawValue>> {
    let text = String::from_utf8_lossy(bytes).into_owned();
    RawValue::from_string(text).ok()
}

impl Sink for JsonLinesSink {
    fn name(&self) -> &str {
        &self.target
    }

    fn resolve_tag(&self, name: &str) -> Result<EntryTag, SinkError> {
        self.tags.resolve(name)
    }

    async fn submit(
        &self,
        cancel: &CancellationToken,
        batch: Vec<EnrichedRecord>,
    ) -> Result<(), SinkError> {
        let rendered = self.render(&batch)?;

        let mut guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SinkError::Cancelled),
            guard = self.writer.lock() => guard,
        };
        let writer = guard.as_mut().ok_or(SinkError::Closed)?;

        writer.write_all(&rendered).await?;
        writer.flush().await?;
        Ok(())
    }

    async fn sync(&self, timeout: Duration) -> Result<(), SinkError> {
        let flush = async {
            let mut guard = self.writer.lock().await;
            match guard.as_mut() {
                Some(writer) => writer.flush().await.map_err(SinkError::from),
                None => Ok(()),
            }
        };

        tokio::time::timeout(timeout, flush)
            .await
            .map_err(|_| SinkError::SyncTimeout {
                timeout_ms: timeout.as_millis() as u64,
            })?
    }

    async fn close(&self) -> Result<(), SinkError> {
        let mut guard = self.writer.lock().await;
        if let Some(mut writer) = guard.take() {
            writer.flush().await?;
            writer.shutdown().await?;
            debug!(target_path = %self.target, "json lines sink closed");
        }
        Ok(())
    }
}
