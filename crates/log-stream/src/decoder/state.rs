//! 디코더 누적 버퍼 상태
//!
//! I/O와 분리된 동기 상태 기계입니다. 바이트를 [`DecoderState::feed`]로 넣고,
//! 프리앰블 제거 후 [`DecoderState::take_records`]로 완성된 레코드를 꺼냅니다.

use bytes::{Buf, BytesMut};
use oslog_core::types::RecordPayload;

use super::compact::compact_fragment;
use crate::error::StreamError;

/// 스트림 시작의 프리앰블 길이 (`[{\n`)
pub const PREAMBLE_LEN: usize = 3;

/// 연속된 최상위 레코드 사이의 구분자
pub const RECORD_SEPARATOR: &[u8] = b"\n},{\n";

/// 누적 버퍼와 프리앰블 처리 여부
#[derive(Debug, Default)]
pub struct DecoderState {
    buffer: BytesMut,
    preamble_consumed: bool,
    /// 다음 구분자 검색 시작 위치 (이전에 이미 검사한 영역은 건너뜀)
    scan_from: usize,
}

impl DecoderState {
    /// 빈 상태를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 읽은 바이트를 버퍼 뒤에 붙입니다.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// 프리앰블이 이미 제거되었는지 반환합니다.
    pub fn preamble_consumed(&self) -> bool {
        self.preamble_consumed
    }

    /// 프리앰블을 제거합니다.
    ///
    /// 이미 제거되었으면 `true`, 아직 3바이트가 모이지 않았으면 `false`를 반환합니다.
    /// 프리앰블 바이트의 내용은 검사하지 않습니다.
    pub fn strip_preamble(&mut self) -> bool {
        if self.preamble_consumed {
            return true;
        }
        if self.buffer.len() < PREAMBLE_LEN {
            return false;
        }
        self.buffer.advance(PREAMBLE_LEN);
        self.preamble_consumed = true;
        self.scan_from = 0;
        true
    }

    /// 구분자 앞의 완성된 조각을 모두 꺼내 압축합니다.
    ///
    /// 마지막 구분자 뒤의 미완성 꼬리는 버퍼에 남습니다.
    /// 조각 하나라도 압축에 실패하면 아무 레코드도 반환하지 않고 버퍼도 건드리지 않습니다.
    /// 프리앰블이 제거되기 전에는 항상 빈 목록을 반환합니다.
    pub fn take_records(&mut self) -> Result<Vec<RecordPayload>, StreamError> {
        if !self.preamble_consumed {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        let mut fragment_start = 0;
        let mut search_from = self.scan_from.min(self.buffer.len());

        while let Some(pos) = find_separator(&self.buffer[search_from..]) {
            let fragment_end = search_from + pos;
            records.push(compact_fragment(
                &self.buffer[fragment_start..fragment_end],
            )?);
            fragment_start = fragment_end + RECORD_SEPARATOR.len();
            search_from = fragment_start;
        }

        if fragment_start > 0 {
            self.buffer.advance(fragment_start);
        }
        // 꼬리 끝에 걸친 구분자 일부는 다음 검색에서 다시 본다
        self.scan_from = self
            .buffer
            .len()
            .saturating_sub(RECORD_SEPARATOR.len() - 1);

        Ok(records)
    }

    /// 아직 레코드로 확정되지 않은 바이트
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    /// 버퍼 길이
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// 버퍼를 비웁니다. 프리앰블 처리 여부는 유지합니다.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scan_from = 0;
    }
}

fn find_separator(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(RECORD_SEPARATOR.len())
        .position(|window| window == RECORD_SEPARATOR)
}
