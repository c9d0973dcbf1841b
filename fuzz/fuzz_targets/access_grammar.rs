#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ngxlog_log_pipeline::AccessLogGrammar;

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    format: &'a str,
    line: &'a str,
}

fuzz_target!(|input: Input<'_>| {
    // 임의 포맷도 컴파일 에러로 끝나야 하며 패닉은 허용하지 않는다
    let Ok(grammar) = AccessLogGrammar::compile(input.format) else {
        return;
    };

    if let Ok(fields) = grammar.parse(input.line) {
        for name in grammar.fields() {
            let _ = fields.field(name);
            let _ = fields.float_field(name);
        }
    }
});
