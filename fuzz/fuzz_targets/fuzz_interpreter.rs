#![no_main]

use std::rc::Rc;

use ecma_eval::{NoOpConsoleProvider, Runtime, RuntimeConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Only process valid UTF-8
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };

    // Smaller limit for interpreter (more expensive per byte)
    if source.len() > 10_000 {
        return;
    }

    // There is no step budget, so skip anything that can loop forever
    if ["while", "for", "do"].iter().any(|kw| source.contains(kw)) {
        return;
    }

    let config = RuntimeConfig::default()
        .with_max_call_depth(64)
        .with_gc_threshold(16)
        .with_console(Rc::new(NoOpConsoleProvider));
    let mut runtime = Runtime::with_config(config);

    // Errors are expected, panics are not
    let _ = runtime.eval(source);
    runtime.collect_garbage();
});
