#![no_main]

use libfuzzer_sys::fuzz_target;
use oslog_stream::DecoderState;

// 첫 바이트로 청크 크기를 정하고 나머지를 스트림으로 흘려 보낸다
fuzz_target!(|data: &[u8]| {
    let Some((&chunk, stream)) = data.split_first() else {
        return;
    };
    let chunk = usize::from(chunk).max(1);

    let mut state = DecoderState::new();
    for piece in stream.chunks(chunk) {
        state.feed(piece);
        if !state.strip_preamble() {
            continue;
        }
        if state.take_records().is_err() {
            state.clear();
        }
    }
});
