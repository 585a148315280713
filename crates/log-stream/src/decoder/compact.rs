//! 레코드 조각 압축(compact)
//!
//! 구분자로 잘린 조각을 `{` ... `}`로 다시 감싼 뒤, 하나의 JSON 객체인지 검증하고
//! 문자열 밖의 공백을 제거합니다. 키 순서와 숫자 표기는 그대로 유지합니다.

use bytes::{BufMut, BytesMut};
use oslog_core::types::RecordPayload;
use serde::de::IgnoredAny;

use crate::error::StreamError;

/// 조각을 감싸서 압축된 레코드 페이로드를 만듭니다.
///
/// 감싼 결과가 정확히 하나의 JSON 값이 아니면 [`StreamError::Compact`]를 반환합니다.
pub fn compact_fragment(fragment: &[u8]) -> Result<RecordPayload, StreamError> {
    let mut wrapped = Vec::with_capacity(fragment.len() + 2);
    wrapped.push(b'{');
    wrapped.extend_from_slice(fragment);
    wrapped.push(b'}');

    serde_json::from_slice::<IgnoredAny>(&wrapped).map_err(|e| StreamError::Compact {
        record_len: wrapped.len(),
        reason: e.to_string(),
    })?;

    Ok(RecordPayload::new(strip_insignificant_whitespace(&wrapped)))
}

/// 검증된 JSON 텍스트에서 문자열 밖의 공백을 제거합니다.
fn strip_insignificant_whitespace(json: &[u8]) -> bytes::Bytes {
    let mut out = BytesMut::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for &byte in json {
        if in_string {
            out.put_u8(byte);
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b' ' | b'\t' | b'\n' | b'\r' => {}
            b'"' => {
                in_string = true;
                out.put_u8(byte);
            }
            _ => out.put_u8(byte),
        }
    }

    out.freeze()
}
