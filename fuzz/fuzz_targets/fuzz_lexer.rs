#![no_main]

use ecma_eval::lexer::{Lexer, TokenKind};
use ecma_eval::string_dict::StringDict;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    if source.len() > 100_000 {
        return;
    }

    let mut dict = StringDict::new();
    let mut lexer = Lexer::new(source, &mut dict);

    // Tokens come out in source order and every span lands on char boundaries
    let mut previous_end = 0;
    loop {
        let token = lexer.next_token();
        assert!(token.span.start >= previous_end, "token went backwards: {:?}", token);
        assert!(token.span.end <= source.len());
        assert!(source.is_char_boundary(token.span.start) && source.is_char_boundary(token.span.end));
        previous_end = token.span.end;
        if matches!(token.kind, TokenKind::Eof) {
            break;
        }
    }
});
