//! 통합 테스트 공용 헬퍼
//!
//! - [`ChunkReader`]: 미리 정한 청크 단위로 읽히는 리더
//! - [`EndlessReader`]: 레코드를 끝없이 만들어내는 리더
//! - [`ScriptedProducer`]: 실행마다 정해진 결과를 돌려주는 프로듀서
//! - [`TestSink`]: 제출된 배치를 기록하고 실패/취소를 흉내 내는 싱크

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use oslog_core::error::SinkError;
use oslog_core::sink::Sink;
use oslog_core::types::{EnrichedRecord, EntryTag};
use oslog_stream::{Producer, ProducerRun, StreamError, TagSet};
use tokio::io::{AsyncRead, ReadBuf};
use tokio_util::sync::CancellationToken;

// =============================================================================
// 리더
// =============================================================================

/// 청크 목록을 순서대로 하나씩 돌려주고, 다 쓰면 EOF를 반환하는 리더
///
/// 요청 버퍼가 청크보다 작으면 청크를 나눠서 돌려줍니다.
pub struct ChunkReader {
    chunks: VecDeque<Vec<u8>>,
    reads: Arc<AtomicUsize>,
}

impl ChunkReader {
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks: chunks.into_iter().filter(|c| !c.is_empty()).collect(),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 입력을 주어진 위치들에서 잘라 청크 리더를 만듭니다.
    pub fn split_at(input: &[u8], cuts: &[usize]) -> Self {
        let mut points: Vec<usize> = cuts.iter().map(|&c| c.min(input.len())).collect();
        points.sort_unstable();
        points.dedup();

        let mut chunks = Vec::new();
        let mut start = 0;
        for point in points {
            chunks.push(input[start..point].to_vec());
            start = point;
        }
        chunks.push(input[start..].to_vec());
        Self::new(chunks)
    }

    /// 읽기 호출 횟수 카운터
    pub fn reads(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.reads)
    }
}

impl AsyncRead for ChunkReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let Some(mut chunk) = self.chunks.pop_front() else {
            return Poll::Ready(Ok(()));
        };

        let n = chunk.len().min(buf.remaining());
        buf.put_slice(&chunk[..n]);
        if n < chunk.len() {
            let rest = chunk.split_off(n);
            self.chunks.push_front(rest);
        }
        Poll::Ready(Ok(()))
    }
}

/// `{"seq":N}` 레코드를 끝없이 생성하는 리더
pub struct EndlessReader {
    pending: Vec<u8>,
    next_seq: u64,
}

impl EndlessReader {
    pub fn new() -> Self {
        Self {
            pending: b"[{\n".to_vec(),
            next_seq: 0,
        }
    }
}

impl AsyncRead for EndlessReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.pending.is_empty() {
            let seq = self.next_seq;
            self.next_seq += 1;
            self.pending = format!("  \"seq\": {seq}\n}},{{\n").into_bytes();
        }

        let n = self.pending.len().min(buf.remaining());
        buf.put_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Poll::Ready(Ok(()))
    }
}

/// 테스트 프로듀서 출력
pub enum TestOutput {
    Chunks(ChunkReader),
    Endless(EndlessReader),
}

impl AsyncRead for TestOutput {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Chunks(r) => Pin::new(r).poll_read(cx, buf),
            Self::Endless(r) => Pin::new(r).poll_read(cx, buf),
        }
    }
}

// =============================================================================
// 프로듀서
// =============================================================================

/// 프로듀서 실행 한 번의 결과
pub enum Script {
    /// 실행 실패
    FailLaunch,
    /// 주어진 바이트를 출력하고 EOF
    Output(Vec<u8>),
    /// 레코드를 끝없이 출력
    Endless,
}

/// 스크립트대로 동작하는 프로듀서. 스크립트가 다 떨어지면 실행에 실패합니다.
pub struct ScriptedProducer {
    scripts: VecDeque<Script>,
    launches: Arc<AtomicUsize>,
}

impl ScriptedProducer {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: scripts.into(),
            launches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 실행 시도 횟수 카운터 (실패 포함)
    pub fn launches(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.launches)
    }
}

impl Producer for ScriptedProducer {
    type Output = TestOutput;

    fn launch(&mut self) -> Result<ProducerRun<TestOutput>, StreamError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        match self.scripts.pop_front() {
            Some(Script::Output(bytes)) => {
                Ok(ProducerRun::detached(TestOutput::Chunks(ChunkReader::new(vec![bytes]))))
            }
            Some(Script::Endless) => Ok(ProducerRun::detached(TestOutput::Endless(EndlessReader::new()))),
            Some(Script::FailLaunch) | None => Err(StreamError::Launch {
                command: "scripted".to_owned(),
                reason: "script exhausted".to_owned(),
            }),
        }
    }
}

// =============================================================================
// 싱크
// =============================================================================

/// 제출된 배치를 기록하는 싱크
pub struct TestSink {
    tags: TagSet,
    batches: Mutex<Vec<Vec<EnrichedRecord>>>,
    attempts: AtomicUsize,
    /// 처음 N번의 제출을 실패시킴
    fail_first: usize,
    /// 성공한 제출이 N번이 되면 이 토큰을 취소
    cancel_after: Option<(usize, CancellationToken)>,
}

impl TestSink {
    pub fn new() -> Self {
        Self {
            tags: TagSet::new(["default", "macos"]).expect("tags"),
            batches: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            fail_first: 0,
            cancel_after: None,
        }
    }

    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    pub fn cancelling_after(mut self, n: usize, cancel: CancellationToken) -> Self {
        self.cancel_after = Some((n, cancel));
        self
    }

    /// 수락된 배치 목록
    pub fn batches(&self) -> Vec<Vec<EnrichedRecord>> {
        self.batches.lock().expect("lock").clone()
    }

    /// 수락된 레코드의 페이로드 문자열
    pub fn payloads(&self) -> Vec<String> {
        self.batches()
            .iter()
            .flatten()
            .map(|r| r.payload.to_string())
            .collect()
    }

    /// 제출 시도 횟수 (실패 포함)
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Sink for TestSink {
    fn name(&self) -> &str {
        "test"
    }

    fn resolve_tag(&self, name: &str) -> Result<EntryTag, SinkError> {
        self.tags.resolve(name)
    }

    async fn submit(
        &self,
        _cancel: &CancellationToken,
        batch: Vec<EnrichedRecord>,
    ) -> Result<(), SinkError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.fail_first {
            return Err(SinkError::Transport("simulated outage".to_owned()));
        }

        let accepted = {
            let mut batches = self.batches.lock().expect("lock");
            batches.push(batch);
            batches.len()
        };
        if let Some((n, cancel)) = &self.cancel_after {
            if accepted >= *n {
                cancel.cancel();
            }
        }
        Ok(())
    }

    async fn sync(&self, _timeout: Duration) -> Result<(), SinkError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        Ok(())
    }
}
