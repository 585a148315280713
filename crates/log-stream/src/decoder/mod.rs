//! 스트림 디코더 -- 연속 JSON 배열 출력을 개별 레코드로 분리
//!
//! 프로듀서는 하나의 거대한 JSON 배열을 출력합니다:
//!
//! ```text
//! [{
//!   "a": 1
//! },{
//!   "b": 2
//! },{
//! ...
//! ```
//!
//! 배열이 끝나기를 기다리지 않고 `\n},{\n` 구분자를 기준으로 레코드를 잘라냅니다.
//! 각 조각은 `{` ... `}`로 다시 감싸 압축됩니다.
//!
//! # 읽기 정책
//! - 읽기는 데이터가 올 때까지 블로킹됩니다.
//! - 0바이트 읽기(EOF)는 [`StreamError::EndOfStream`]입니다.
//! - `Interrupted`/`WouldBlock`는 `retry_delay` 후 재시도합니다.
//! - 구분자 없이 `max_record_bytes`를 넘으면 [`StreamError::RecordTooLarge`]입니다.
//! - 에러가 나면 누적 버퍼는 버려집니다.

mod compact;
mod state;

pub use compact::compact_fragment;
pub use state::{DecoderState, PREAMBLE_LEN, RECORD_SEPARATOR};

use std::io::ErrorKind;

use oslog_core::types::RecordPayload;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace};

use crate::config::DecoderConfig;
use crate::error::StreamError;

/// 바이트 스트림에서 레코드 배치를 꺼내는 디코더
///
/// 프로듀서 실행 하나당 디코더 하나를 사용합니다.
pub struct StreamDecoder {
    state: DecoderState,
    config: DecoderConfig,
    read_buf: Vec<u8>,
}

impl StreamDecoder {
    /// 새 디코더를 생성합니다.
    pub fn new(config: DecoderConfig) -> Self {
        let read_buf = vec![0u8; config.read_chunk_size.max(1)];
        Self {
            state: DecoderState::new(),
            config,
            read_buf,
        }
    }

    /// 현재 누적 상태
    pub fn state(&self) -> &DecoderState {
        &self.state
    }

    /// 레코드를 하나 이상 꺼낼 때까지 읽습니다.
    ///
    /// 성공하면 반환되는 목록은 비어 있지 않습니다. 에러 후에는 버퍼가 비워지므로
    /// 호출자는 이 디코더를 더 쓰지 말고 프로듀서를 재시작해야 합니다.
    pub async fn decode<R>(&mut self, reader: &mut R) -> Result<Vec<RecordPayload>, StreamError>
    where
        R: AsyncRead + Unpin,
    {
        let result = self.decode_inner(reader).await;
        if result.is_err() {
            self.state.clear();
        }
        result
    }

    async fn decode_inner<R>(&mut self, reader: &mut R) -> Result<Vec<RecordPayload>, StreamError>
    where
        R: AsyncRead + Unpin,
    {
        while !self.state.strip_preamble() {
            self.read_chunk(reader).await?;
        }

        loop {
            let records = self.state.take_records()?;
            if !records.is_empty() {
                trace!(
                    records = records.len(),
                    buffered = self.state.buffered_len(),
                    "decoded batch"
                );
                return Ok(records);
            }

            let buffered = self.state.buffered_len();
            if buffered > self.config.max_record_bytes {
                return Err(StreamError::RecordTooLarge {
                    buffered,
                    limit: self.config.max_record_bytes,
                });
            }

            self.read_chunk(reader).await?;
        }
    }

    async fn read_chunk<R>(&mut self, reader: &mut R) -> Result<usize, StreamError>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            match reader.read(&mut self.read_buf).await {
                Ok(0) => return Err(StreamError::EndOfStream),
                Ok(n) => {
                    self.state.feed(&self.read_buf[..n]);
                    return Ok(n);
                }
                Err(e) if matches!(e.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock) => {
                    debug!(
                        error = %e,
                        retry_delay_ms = self.config.retry_delay.as_millis() as u64,
                        "read made no progress, retrying"
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(e) => return Err(StreamError::Read(e)),
            }
        }
    }
}
