#![no_main]

use libfuzzer_sys::fuzz_target;
use oslog_stream::decoder::compact_fragment;

fuzz_target!(|data: &[u8]| {
    if let Ok(payload) = compact_fragment(data) {
        // 압축 결과는 항상 다시 압축해도 동일해야 한다
        let again = compact_fragment(&payload.as_bytes()[1..payload.as_bytes().len() - 1]);
        assert!(again.is_ok());
    }
});
