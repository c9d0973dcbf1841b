#![no_main]

use libfuzzer_sys::fuzz_target;
use ngxlog_log_pipeline::{decompose_request, parse_upstream_time};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok((method, path)) = decompose_request(s) {
        // 디코딩 후 잘라내므로 `?`는 남지 않는다
        assert!(!path.contains('?'));
        assert!(!method.contains(' '));
    }

    let _ = parse_upstream_time("upstream_response_time", s);
});
