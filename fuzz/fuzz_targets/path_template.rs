#![no_main]

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ngxlog_log_pipeline::PathTemplate;

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    template: &'a str,
    bindings: Vec<(&'a str, &'a str)>,
}

fuzz_target!(|input: Input<'_>| {
    let Ok(template) = PathTemplate::compile(input.template) else {
        return;
    };

    let values: BTreeMap<&str, &str> = input.bindings.into_iter().collect();
    let _ = template.render(&values);
});
