//! Interning table for identifier and property-name strings.
//!
//! The lexer, the parser and the builtins setup all go through one
//! `StringDict` owned by the interpreter, so the same name always resolves to
//! the same `Rc<str>`.

use rustc_hash::FxHashMap;

use crate::value::{CheapClone, JsString};

/// Deduplicating store of `JsString` instances
pub struct StringDict {
    /// Keyed by `Box<str>` so lookups by `&str` need no `Rc` indirection
    strings: FxHashMap<Box<str>, JsString>,
}

impl StringDict {
    pub fn new() -> Self {
        Self {
            strings: FxHashMap::default(),
        }
    }

    /// Dictionary seeded with the names the builtins and the evaluator use
    pub fn with_common_strings() -> Self {
        let mut dict = Self::new();
        for s in COMMON_STRINGS {
            dict.get_or_insert(s);
        }
        dict
    }

    /// Shared instance for `s`, inserting it on first use
    pub fn get_or_insert(&mut self, s: &str) -> JsString {
        if let Some(existing) = self.strings.get(s) {
            return existing.cheap_clone();
        }
        let js_str = JsString::from(s);
        self.strings.insert(s.into(), js_str.cheap_clone());
        js_str
    }

    pub fn get(&self, s: &str) -> Option<JsString> {
        self.strings.get(s).map(|s| s.cheap_clone())
    }

    /// Adopt a string built elsewhere (concatenation results, native output)
    pub fn insert(&mut self, js_str: JsString) -> JsString {
        if let Some(existing) = self.strings.get(js_str.as_str()) {
            return existing.cheap_clone();
        }
        self.strings
            .insert(js_str.as_str().into(), js_str.cheap_clone());
        js_str
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for StringDict {
    fn default() -> Self {
        Self::new()
    }
}

const COMMON_STRINGS: &[&str] = &[
    "length",
    "prototype",
    "constructor",
    "name",
    "message",
    "cause",
    "value",
    "writable",
    "enumerable",
    "configurable",
    "get",
    "set",
    "toString",
    "valueOf",
    "toJSON",
    "next",
    "done",
    "return",
    "throw",
    "then",
    "arguments",
    "undefined",
    "default",
    "raw",
    "Object",
    "Function",
    "Array",
    "String",
    "Number",
    "Boolean",
    "BigInt",
    "Symbol",
    "Error",
    "TypeError",
    "ReferenceError",
    "SyntaxError",
    "RangeError",
];
