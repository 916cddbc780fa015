#![no_main]

use ecma_eval::parser::Parser;
use ecma_eval::string_dict::StringDict;
use ecma_eval::JsError;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    if source.len() > 100_000 {
        return;
    }

    let mut dict = StringDict::new();
    match Parser::new(source, &mut dict).parse_program() {
        Ok(program) => assert!(program.span.end <= source.len()),
        // The parser reports nothing but syntax errors
        Err(err) => assert!(matches!(err, JsError::SyntaxError { .. }), "unexpected error: {err}"),
    }
});
