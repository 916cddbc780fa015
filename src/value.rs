//! JavaScript value representation
//!
//! The core JsValue type and related structures for representing JavaScript values at runtime.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use num_bigint::BigInt;
use rustc_hash::{FxBuildHasher, FxHashMap};

use crate::ast::FunctionNode;
use crate::environment::EnvId;
use crate::error::JsError;
use crate::interpreter::Interpreter;

/// Trait for types that have cheap (O(1), reference-counted) clones.
///
/// This trait makes it explicit when a clone is cheap (just incrementing a reference count)
/// vs when it might be expensive (copying data).
pub trait CheapClone: Clone {
    /// Create a cheap (reference-counted) clone of this value.
    fn cheap_clone(&self) -> Self {
        self.clone()
    }
}

// Rc<RefCell<T>> is covered by this
impl<T: ?Sized> CheapClone for Rc<T> {}

/// A JavaScript value
#[derive(Clone, Default)]
pub enum JsValue {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    BigInt(JsBigInt),
    String(JsString),
    Symbol(JsSymbol),
    Object(JsObjectRef),
}

impl CheapClone for JsValue {}

impl JsValue {
    /// Check if this value is null or undefined
    pub fn is_nullish(&self) -> bool {
        matches!(self, JsValue::Null | JsValue::Undefined)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, JsValue::Undefined)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, JsValue::Number(_))
    }

    pub fn is_bigint(&self) -> bool {
        matches!(self, JsValue::BigInt(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, JsValue::String(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, JsValue::Object(_))
    }

    /// Object handle, if this is an object
    pub fn as_object(&self) -> Option<&JsObjectRef> {
        match self {
            JsValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Check if this value is callable (a function)
    pub fn is_callable(&self) -> bool {
        match self {
            JsValue::Object(obj) => obj.borrow().is_callable(),
            _ => false,
        }
    }

    /// Check if this value has a [[Construct]] internal method
    pub fn is_constructor(&self) -> bool {
        match self {
            JsValue::Object(obj) => obj.borrow().is_constructor(),
            _ => false,
        }
    }

    /// Get the typeof result for this value
    pub fn type_of(&self) -> &'static str {
        match self {
            JsValue::Undefined => "undefined",
            JsValue::Null => "object",
            JsValue::Boolean(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::BigInt(_) => "bigint",
            JsValue::String(_) => "string",
            JsValue::Symbol(_) => "symbol",
            JsValue::Object(obj) => {
                if obj.borrow().is_callable() {
                    "function"
                } else {
                    "object"
                }
            }
        }
    }

    /// Convert to boolean (ToBoolean)
    pub fn to_boolean(&self) -> bool {
        match self {
            JsValue::Undefined | JsValue::Null => false,
            JsValue::Boolean(b) => *b,
            JsValue::Number(n) => *n != 0.0 && !n.is_nan(),
            JsValue::BigInt(b) => !b.is_zero(),
            JsValue::String(s) => !s.is_empty(),
            JsValue::Symbol(_) | JsValue::Object(_) => true,
        }
    }

    /// ToString for primitives. Objects need the interpreter (ToPrimitive), so
    /// they render as their tag here.
    pub fn to_primitive_string(&self) -> JsString {
        match self {
            JsValue::Undefined => JsString::from("undefined"),
            JsValue::Null => JsString::from("null"),
            JsValue::Boolean(true) => JsString::from("true"),
            JsValue::Boolean(false) => JsString::from("false"),
            JsValue::Number(n) => JsString::from(number_to_string(*n)),
            JsValue::BigInt(b) => JsString::from(b.to_string()),
            JsValue::String(s) => s.cheap_clone(),
            JsValue::Symbol(s) => JsString::from(s.descriptive_string()),
            JsValue::Object(_) => JsString::from("[object Object]"),
        }
    }

    /// Strict equality (===)
    pub fn strict_equals(&self, other: &JsValue) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Undefined) => true,
            (JsValue::Null, JsValue::Null) => true,
            (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
            // NaN !== NaN, +0 === -0
            (JsValue::Number(a), JsValue::Number(b)) => a == b,
            (JsValue::BigInt(a), JsValue::BigInt(b)) => a == b,
            (JsValue::String(a), JsValue::String(b)) => a == b,
            (JsValue::Symbol(a), JsValue::Symbol(b)) => a == b,
            (JsValue::Object(a), JsValue::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// SameValue: like `===` but NaN equals NaN and +0 differs from -0
    pub fn same_value(&self, other: &JsValue) -> bool {
        match (self, other) {
            (JsValue::Number(a), JsValue::Number(b)) => {
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b && a.is_sign_negative() == b.is_sign_negative()
                }
            }
            _ => self.strict_equals(other),
        }
    }

    /// SameValueZero: like SameValue but +0 equals -0
    pub fn same_value_zero(&self, other: &JsValue) -> bool {
        match (self, other) {
            (JsValue::Number(a), JsValue::Number(b)) => (a.is_nan() && b.is_nan()) || a == b,
            _ => self.strict_equals(other),
        }
    }

    /// Human readable rendering used by diagnostics and the console.
    ///
    /// Never runs script code: error objects are rendered from their `name`
    /// and `message` data properties only.
    pub fn describe(&self) -> String {
        describe_value(self, 0)
    }
}

fn describe_value(value: &JsValue, depth: usize) -> String {
    match value {
        JsValue::String(s) if depth > 0 => format!("'{}'", s),
        JsValue::BigInt(b) => format!("{}n", b),
        JsValue::Object(obj) => {
            let obj_ref = obj.borrow();
            match &obj_ref.exotic {
                ExoticObject::Function(func) => {
                    let name = obj_ref
                        .get_data_in_chain("name")
                        .map(|v| v.to_primitive_string().to_string())
                        .unwrap_or_default();
                    match func {
                        JsFunction::Interpreted(c) if c.kind.is_class_constructor() => {
                            format!("[class {}]", if name.is_empty() { "(anonymous)" } else { &name })
                        }
                        _ if name.is_empty() => "[Function (anonymous)]".to_string(),
                        _ => format!("[Function: {}]", name),
                    }
                }
                ExoticObject::Error => {
                    let name = obj_ref
                        .get_data_in_chain("name")
                        .map(|v| v.to_primitive_string().to_string())
                        .unwrap_or_else(|| "Error".to_string());
                    let message = obj_ref
                        .get_data_in_chain("message")
                        .map(|v| v.to_primitive_string().to_string())
                        .unwrap_or_default();
                    if message.is_empty() {
                        name
                    } else {
                        format!("{}: {}", name, message)
                    }
                }
                ExoticObject::Array { length, .. } => {
                    if depth > 2 {
                        return "[Array]".to_string();
                    }
                    let items: Vec<String> = (0..(*length).min(100))
                        .map(|i| match obj_ref.properties.get(&PropertyKey::Index(i)) {
                            Some(Property {
                                slot: PropertySlot::Data { value, .. },
                                ..
                            }) => describe_value(value, depth + 1),
                            Some(_) => "[Getter/Setter]".to_string(),
                            None => "<empty>".to_string(),
                        })
                        .collect();
                    if items.is_empty() {
                        "[]".to_string()
                    } else {
                        format!("[ {} ]", items.join(", "))
                    }
                }
                ExoticObject::Primitive(inner) => {
                    format!("[{}: {}]", primitive_wrapper_name(inner), describe_value(inner, 1))
                }
                _ => {
                    if depth > 2 {
                        return "[Object]".to_string();
                    }
                    let entries: Vec<String> = obj_ref
                        .properties
                        .iter()
                        .filter(|(k, p)| p.enumerable && !k.is_symbol())
                        .map(|(k, p)| match &p.slot {
                            PropertySlot::Data { value, .. } => {
                                format!("{}: {}", k, describe_value(value, depth + 1))
                            }
                            PropertySlot::Accessor { .. } => format!("{}: [Getter/Setter]", k),
                        })
                        .collect();
                    if entries.is_empty() {
                        "{}".to_string()
                    } else {
                        format!("{{ {} }}", entries.join(", "))
                    }
                }
            }
        }
        other => other.to_primitive_string().to_string(),
    }
}

fn primitive_wrapper_name(value: &JsValue) -> &'static str {
    match value {
        JsValue::Boolean(_) => "Boolean",
        JsValue::Number(_) => "Number",
        JsValue::BigInt(_) => "BigInt",
        JsValue::String(_) => "String",
        JsValue::Symbol(_) => "Symbol",
        _ => "Object",
    }
}

impl fmt::Debug for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::String(s) => write!(f, "\"{}\"", s.as_str()),
            other => write!(f, "{}", describe_value(other, 1)),
        }
    }
}

impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

// Conversions from Rust types

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        JsValue::Boolean(b)
    }
}

impl From<f64> for JsValue {
    fn from(n: f64) -> Self {
        JsValue::Number(n)
    }
}

impl From<i32> for JsValue {
    fn from(n: i32) -> Self {
        JsValue::Number(f64::from(n))
    }
}

impl From<u32> for JsValue {
    fn from(n: u32) -> Self {
        JsValue::Number(f64::from(n))
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        JsValue::String(JsString::from(s))
    }
}

impl From<String> for JsValue {
    fn from(s: String) -> Self {
        JsValue::String(JsString::from(s))
    }
}

impl From<JsString> for JsValue {
    fn from(s: JsString) -> Self {
        JsValue::String(s)
    }
}

impl From<JsObjectRef> for JsValue {
    fn from(obj: JsObjectRef) -> Self {
        JsValue::Object(obj)
    }
}

impl From<BigInt> for JsValue {
    fn from(b: BigInt) -> Self {
        JsValue::BigInt(JsBigInt::from(b))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Primitive payloads
// ═══════════════════════════════════════════════════════════════════════════════

/// Longest string, in UTF-16 code units, a script can build
pub const MAX_STRING_LENGTH: usize = (1 << 30) - 25;

/// Reference-counted string for efficient string handling
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsString(Rc<str>);

impl CheapClone for JsString {}

impl JsString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Length in UTF-16 code units, the unit JavaScript strings are measured in
    pub fn utf16_len(&self) -> usize {
        self.0.encode_utf16().count()
    }

    /// Code unit at `index` as a one-unit string
    pub fn unit_at(&self, index: usize) -> Option<JsString> {
        let unit = self.0.encode_utf16().nth(index)?;
        Some(JsString::from(String::from_utf16_lossy(&[unit])))
    }
}

impl AsRef<str> for JsString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for JsString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for JsString {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for JsString {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        JsString(Rc::from(s))
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        JsString(Rc::from(s))
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &*self.0)
    }
}

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

/// JavaScript Symbol primitive.
/// Symbols are unique identifiers, optionally with a description.
#[derive(Clone)]
pub struct JsSymbol(Rc<SymbolData>);

struct SymbolData {
    id: u64,
    description: Option<JsString>,
}

impl CheapClone for JsSymbol {}

impl JsSymbol {
    pub fn new(description: Option<JsString>) -> Self {
        let id = NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed);
        JsSymbol(Rc::new(SymbolData { id, description }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn description(&self) -> Option<&JsString> {
        self.0.description.as_ref()
    }

    /// `Symbol(desc)` as produced by `Symbol.prototype.toString`
    pub fn descriptive_string(&self) -> String {
        match &self.0.description {
            Some(desc) => format!("Symbol({})", desc),
            None => "Symbol()".to_string(),
        }
    }
}

impl PartialEq for JsSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for JsSymbol {}

impl Hash for JsSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for JsSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.descriptive_string())
    }
}

/// Arbitrary-precision integer primitive
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct JsBigInt(Rc<BigInt>);

impl CheapClone for JsBigInt {}

impl JsBigInt {
    pub fn value(&self) -> &BigInt {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        num_traits::Zero::is_zero(&*self.0)
    }
}

impl From<BigInt> for JsBigInt {
    fn from(b: BigInt) -> Self {
        JsBigInt(Rc::new(b))
    }
}

impl fmt::Display for JsBigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for JsBigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}n", self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Number <-> String
// ═══════════════════════════════════════════════════════════════════════════════

/// Number::toString(10): shortest round-trip digits laid out per the
/// ECMAScript rules (exponent form below 1e-6 and from 1e21 up)
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n < 0.0 {
        return format!("-{}", number_to_string(-n));
    }

    // `{:e}` yields the shortest round-trip digits as d.ddde±x
    let sci = format!("{:e}", n);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();
    let k = i32::try_from(digits.len()).unwrap_or(i32::MAX);
    let point = exp + 1;

    if k <= point && point <= 21 {
        let zeros = usize::try_from(point - k).unwrap_or(0);
        format!("{}{}", digits, "0".repeat(zeros))
    } else if 0 < point && point <= 21 {
        let split = usize::try_from(point).unwrap_or(0);
        let (int_part, frac_part) = digits.split_at(split.min(digits.len()));
        format!("{}.{}", int_part, frac_part)
    } else if -6 < point && point <= 0 {
        let zeros = usize::try_from(-point).unwrap_or(0);
        format!("0.{}{}", "0".repeat(zeros), digits)
    } else {
        let sign = if point - 1 < 0 { '-' } else { '+' };
        let mut chars = digits.chars();
        let first = chars.next().unwrap_or('0');
        let rest: String = chars.collect();
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, (point - 1).abs())
        } else {
            format!("{}.{}e{}{}", first, rest, sign, (point - 1).abs())
        }
    }
}

/// StringToNumber: the StringNumericLiteral grammar
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(is_js_whitespace);
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let radix_body = |prefix_lower: &str, prefix_upper: &str| {
        trimmed
            .strip_prefix(prefix_lower)
            .or_else(|| trimmed.strip_prefix(prefix_upper))
    };
    for (lower, upper, radix) in [("0x", "0X", 16), ("0o", "0O", 8), ("0b", "0B", 2)] {
        if let Some(body) = radix_body(lower, upper) {
            if body.is_empty() || !body.chars().all(|c| c.is_digit(radix)) {
                return f64::NAN;
            }
            return BigInt::parse_bytes(body.as_bytes(), radix)
                .map(|b| bigint_to_f64(&b))
                .unwrap_or(f64::NAN);
        }
    }
    // Rust accepts "inf"/"nan"; JavaScript does not
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Lossy BigInt to Number conversion
pub fn bigint_to_f64(b: &BigInt) -> f64 {
    num_traits::ToPrimitive::to_f64(b).unwrap_or(f64::NAN)
}

pub fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0009}'
            | '\u{000A}'
            | '\u{000B}'
            | '\u{000C}'
            | '\u{000D}'
            | '\u{0020}'
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// Objects
// ═══════════════════════════════════════════════════════════════════════════════

/// Reference to a heap-allocated object
pub type JsObjectRef = Rc<RefCell<JsObject>>;

/// Own property table, kept in insertion order
pub type PropertyMap = IndexMap<PropertyKey, Property, FxBuildHasher>;

/// A JavaScript object
pub struct JsObject {
    pub prototype: Option<JsObjectRef>,
    pub extensible: bool,
    pub properties: PropertyMap,
    /// Private fields, methods and accessors keyed by private name identity
    pub private_elements: FxHashMap<PrivateName, PrivateElement>,
    pub exotic: ExoticObject,
}

impl JsObject {
    /// Create an ordinary object with no prototype
    pub fn new() -> Self {
        Self {
            prototype: None,
            extensible: true,
            properties: PropertyMap::default(),
            private_elements: FxHashMap::default(),
            exotic: ExoticObject::Ordinary,
        }
    }

    pub fn with_prototype(prototype: Option<JsObjectRef>) -> Self {
        Self {
            prototype,
            ..Self::new()
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.exotic, ExoticObject::Function(_))
    }

    pub fn is_constructor(&self) -> bool {
        match &self.exotic {
            ExoticObject::Function(func) => func.is_constructor(),
            _ => false,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.exotic, ExoticObject::Array { .. })
    }

    /// Own property, with the virtual properties of exotic objects
    /// (array `length`, string wrapper indices) synthesized
    pub fn get_own_property(&self, key: &PropertyKey) -> Option<Property> {
        match &self.exotic {
            ExoticObject::Array {
                length,
                length_writable,
            } if key.is_length() => {
                return Some(Property::with_attributes(
                    JsValue::Number(f64::from(*length)),
                    *length_writable,
                    false,
                    false,
                ));
            }
            ExoticObject::Primitive(JsValue::String(s)) => {
                if key.is_length() {
                    return Some(Property::with_attributes(
                        JsValue::Number(s.utf16_len() as f64),
                        false,
                        false,
                        false,
                    ));
                }
                if let PropertyKey::Index(i) = key {
                    if let Some(unit) = s.unit_at(*i as usize) {
                        return Some(Property::with_attributes(
                            JsValue::String(unit),
                            false,
                            true,
                            false,
                        ));
                    }
                }
            }
            _ => {}
        }
        self.properties.get(key).cloned()
    }

    pub fn has_own_property(&self, key: &PropertyKey) -> bool {
        self.get_own_property(key).is_some()
    }

    /// Data property value found along the prototype chain, skipping accessors
    pub fn get_data_in_chain(&self, name: &str) -> Option<JsValue> {
        let key = PropertyKey::from(name);
        if let Some(Property {
            slot: PropertySlot::Data { value, .. },
            ..
        }) = self.properties.get(&key)
        {
            return Some(value.clone());
        }
        let mut current = self.prototype.clone();
        let mut hops = 0;
        while let Some(obj) = current {
            hops += 1;
            if hops > 64 {
                return None;
            }
            let obj_ref = obj.borrow();
            if let Some(Property {
                slot: PropertySlot::Data { value, .. },
                ..
            }) = obj_ref.properties.get(&key)
            {
                return Some(value.clone());
            }
            current = obj_ref.prototype.clone();
        }
        None
    }

    /// Create or overwrite a plain data property (writable, enumerable, configurable)
    pub fn set_property(&mut self, key: PropertyKey, value: JsValue) {
        self.define_property(key, Property::data(value));
    }

    /// Install a property without any validation. Array indices extend `length`.
    pub fn define_property(&mut self, key: PropertyKey, prop: Property) {
        if let (ExoticObject::Array { length, .. }, PropertyKey::Index(i)) = (&mut self.exotic, &key)
        {
            if *i >= *length {
                *length = i.saturating_add(1);
            }
        }
        self.properties.insert(key, prop);
    }

    /// Remove an own property, preserving the order of the remaining ones
    pub fn remove_property(&mut self, key: &PropertyKey) -> Option<Property> {
        self.properties.shift_remove(key)
    }

    /// [[OwnPropertyKeys]]: integer indices ascending, then strings in
    /// insertion order, then symbols in insertion order
    pub fn own_keys(&self) -> Vec<PropertyKey> {
        let mut indices: Vec<u32> = Vec::new();
        let mut strings = Vec::new();
        let mut symbols = Vec::new();
        if let ExoticObject::Primitive(JsValue::String(s)) = &self.exotic {
            indices.extend(0..u32::try_from(s.utf16_len()).unwrap_or(u32::MAX));
        }
        for key in self.properties.keys() {
            match key {
                PropertyKey::Index(i) => indices.push(*i),
                PropertyKey::String(_) => strings.push(key.clone()),
                PropertyKey::Symbol(_) => symbols.push(key.clone()),
            }
        }
        indices.sort_unstable();
        indices.dedup();
        let mut keys: Vec<PropertyKey> = indices.into_iter().map(PropertyKey::Index).collect();
        match &self.exotic {
            ExoticObject::Array { .. } | ExoticObject::Primitive(JsValue::String(_)) => {
                keys.push(PropertyKey::from("length"));
            }
            _ => {}
        }
        keys.extend(strings);
        keys.extend(symbols);
        keys
    }

    /// Function payload, if this object is callable
    pub fn as_function(&self) -> Option<&JsFunction> {
        match &self.exotic {
            ExoticObject::Function(func) => Some(func),
            _ => None,
        }
    }
}

impl Default for JsObject {
    fn default() -> Self {
        Self::new()
    }
}

/// Exotic object behavior
pub enum ExoticObject {
    Ordinary,
    Array { length: u32, length_writable: bool },
    Function(JsFunction),
    /// Instances created by the Error constructors
    Error,
    /// Boolean/Number/String/BigInt/Symbol wrapper objects
    Primitive(JsValue),
    ArrayIterator(ArrayIteratorState),
    /// Unmapped `arguments` objects
    Arguments,
}

/// Which part of each entry an array iterator yields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationKind {
    Keys,
    Values,
    Entries,
}

/// State of a %ArrayIteratorPrototype% instance
pub struct ArrayIteratorState {
    /// Iterated array-like; `None` once exhausted
    pub target: Option<JsValue>,
    pub index: u32,
    pub kind: IterationKind,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Property keys and descriptors
// ═══════════════════════════════════════════════════════════════════════════════

/// Property key (string, canonical array index, or symbol)
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    String(JsString),
    Index(u32),
    Symbol(JsSymbol),
}

impl PropertyKey {
    /// Canonical key for a string: array indices become `Index`
    pub fn from_js_string(s: JsString) -> Self {
        match parse_array_index(s.as_str()) {
            Some(i) => PropertyKey::Index(i),
            None => PropertyKey::String(s),
        }
    }

    /// Key for a Number that has already been converted by ToPropertyKey
    pub fn from_number(n: f64) -> Self {
        if n >= 0.0 && n < f64::from(u32::MAX) && n.fract() == 0.0 {
            // -0 also lands here and stringifies to "0"
            PropertyKey::Index(n as u32)
        } else {
            PropertyKey::String(JsString::from(number_to_string(n)))
        }
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, PropertyKey::Symbol(_))
    }

    pub fn is_length(&self) -> bool {
        matches!(self, PropertyKey::String(s) if s.as_str() == "length")
    }

    pub fn eq_str(&self, s: &str) -> bool {
        match self {
            PropertyKey::String(js) => js.as_str() == s,
            PropertyKey::Index(i) => parse_array_index(s) == Some(*i),
            PropertyKey::Symbol(_) => false,
        }
    }

    /// Key as a script value (`Index` keys become strings)
    pub fn to_value(&self) -> JsValue {
        match self {
            PropertyKey::String(s) => JsValue::String(s.cheap_clone()),
            PropertyKey::Index(i) => JsValue::String(JsString::from(i.to_string())),
            PropertyKey::Symbol(s) => JsValue::Symbol(s.cheap_clone()),
        }
    }

    /// Name used for function name inference (`[desc]` for symbols)
    pub fn to_function_name(&self) -> JsString {
        match self {
            PropertyKey::String(s) => s.cheap_clone(),
            PropertyKey::Index(i) => JsString::from(i.to_string()),
            PropertyKey::Symbol(sym) => match sym.description() {
                Some(desc) => JsString::from(format!("[{}]", desc)),
                None => JsString::from(""),
            },
        }
    }
}

/// Canonical numeric string check for array indices ("0", "17", not "017")
pub fn parse_array_index(s: &str) -> Option<u32> {
    if s.is_empty() || (s.len() > 1 && s.starts_with('0')) {
        return None;
    }
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: u32 = s.parse().ok()?;
    // 2^32 - 1 is not an array index
    if n == u32::MAX { None } else { Some(n) }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        PropertyKey::from_js_string(JsString::from(s))
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        PropertyKey::from_js_string(JsString::from(s))
    }
}

impl From<JsString> for PropertyKey {
    fn from(s: JsString) -> Self {
        PropertyKey::from_js_string(s)
    }
}

impl From<u32> for PropertyKey {
    fn from(i: u32) -> Self {
        PropertyKey::Index(i)
    }
}

impl From<JsSymbol> for PropertyKey {
    fn from(s: JsSymbol) -> Self {
        PropertyKey::Symbol(s)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{}", s),
            PropertyKey::Index(i) => write!(f, "{}", i),
            PropertyKey::Symbol(s) => write!(f, "[{}]", s.descriptive_string()),
        }
    }
}

impl fmt::Debug for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Value part of a property
#[derive(Clone)]
pub enum PropertySlot {
    Data {
        value: JsValue,
        writable: bool,
    },
    Accessor {
        getter: Option<JsObjectRef>,
        setter: Option<JsObjectRef>,
    },
}

/// Object property descriptor
#[derive(Clone)]
pub struct Property {
    pub slot: PropertySlot,
    pub enumerable: bool,
    pub configurable: bool,
}

impl Property {
    /// Writable, enumerable, configurable data property
    pub fn data(value: JsValue) -> Self {
        Self::with_attributes(value, true, true, true)
    }

    /// Writable, configurable but non-enumerable data property (builtin methods)
    pub fn hidden(value: JsValue) -> Self {
        Self::with_attributes(value, true, false, true)
    }

    pub fn with_attributes(value: JsValue, writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            slot: PropertySlot::Data { value, writable },
            enumerable,
            configurable,
        }
    }

    pub fn accessor(getter: Option<JsObjectRef>, setter: Option<JsObjectRef>, enumerable: bool) -> Self {
        Self {
            slot: PropertySlot::Accessor { getter, setter },
            enumerable,
            configurable: true,
        }
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self.slot, PropertySlot::Accessor { .. })
    }

    pub fn writable(&self) -> bool {
        matches!(self.slot, PropertySlot::Data { writable: true, .. })
    }

    /// Stored value of a data property
    pub fn value(&self) -> Option<&JsValue> {
        match &self.slot {
            PropertySlot::Data { value, .. } => Some(value),
            PropertySlot::Accessor { .. } => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Private names
// ═══════════════════════════════════════════════════════════════════════════════

/// A `#name` declared by one class evaluation. Two evaluations of the same
/// class body produce distinct private names.
#[derive(Clone)]
pub struct PrivateName(Rc<JsString>);

impl PrivateName {
    pub fn new(description: JsString) -> Self {
        PrivateName(Rc::new(description))
    }

    pub fn description(&self) -> &JsString {
        &self.0
    }
}

impl PartialEq for PrivateName {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for PrivateName {}

impl Hash for PrivateName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for PrivateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Value stored under a private name on an object
#[derive(Clone)]
pub enum PrivateElement {
    Field(JsValue),
    Method(JsObjectRef),
    Accessor {
        getter: Option<JsObjectRef>,
        setter: Option<JsObjectRef>,
    },
}

/// Private names visible in a class body, chained to enclosing class bodies
pub struct PrivateEnvironment {
    pub outer: Option<Rc<PrivateEnvironment>>,
    pub names: FxHashMap<JsString, PrivateName>,
}

impl PrivateEnvironment {
    /// Resolve `#name` through this and enclosing class bodies
    pub fn resolve(&self, name: &str) -> Option<PrivateName> {
        if let Some(found) = self.names.get(name) {
            return Some(found.clone());
        }
        self.outer.as_ref().and_then(|outer| outer.resolve(name))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Functions
// ═══════════════════════════════════════════════════════════════════════════════

/// Native function signature: `(interpreter, this, arguments)`
pub type NativeFn = fn(&mut Interpreter, JsValue, &[JsValue]) -> Result<JsValue, JsError>;

/// Native [[Construct]] signature: `(interpreter, arguments, new_target)`
pub type NativeCtorFn = fn(&mut Interpreter, &[JsValue], &JsObjectRef) -> Result<JsValue, JsError>;

/// Function representation
#[derive(Clone)]
pub enum JsFunction {
    /// Script function closing over an environment
    Interpreted(Rc<Closure>),
    Native(NativeFunction),
    Bound(Rc<BoundFunction>),
}

impl JsFunction {
    pub fn is_constructor(&self) -> bool {
        match self {
            JsFunction::Interpreted(closure) => closure.kind.is_constructor(),
            JsFunction::Native(native) => native.ctor.is_some(),
            JsFunction::Bound(bound) => bound.target.borrow().is_constructor(),
        }
    }
}

/// Native function wrapper
#[derive(Clone)]
pub struct NativeFunction {
    pub name: JsString,
    pub func: NativeFn,
    pub arity: usize,
    /// Behavior under `new`; `None` makes the function a non-constructor
    pub ctor: Option<NativeCtorFn>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Result of `Function.prototype.bind`
pub struct BoundFunction {
    pub target: JsObjectRef,
    pub this: JsValue,
    pub args: Vec<JsValue>,
}

/// How a closure binds `this` and whether it can be constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Normal,
    Arrow,
    /// Object/class methods, accessors, field initializers and static blocks
    Method,
    BaseConstructor,
    DerivedConstructor,
    Generator,
    Async,
    AsyncArrow,
    AsyncGenerator,
}

impl FunctionKind {
    pub fn is_arrow(self) -> bool {
        matches!(self, FunctionKind::Arrow | FunctionKind::AsyncArrow)
    }

    pub fn is_constructor(self) -> bool {
        matches!(
            self,
            FunctionKind::Normal | FunctionKind::BaseConstructor | FunctionKind::DerivedConstructor
        )
    }

    pub fn is_class_constructor(self) -> bool {
        matches!(self, FunctionKind::BaseConstructor | FunctionKind::DerivedConstructor)
    }

    pub fn is_async(self) -> bool {
        matches!(
            self,
            FunctionKind::Async | FunctionKind::AsyncArrow | FunctionKind::AsyncGenerator
        )
    }

    pub fn is_generator(self) -> bool {
        matches!(self, FunctionKind::Generator | FunctionKind::AsyncGenerator)
    }
}

/// A script function value: code plus the environment it was defined in
pub struct Closure {
    pub node: Rc<FunctionNode>,
    /// Captured defining environment
    pub env: EnvId,
    pub private_env: Option<Rc<PrivateEnvironment>>,
    /// Object the method was installed on, for `super` lookups
    pub home_object: Option<JsObjectRef>,
    pub kind: FunctionKind,
    pub strict: bool,
    /// Per-instance elements a class constructor installs after `super()`
    /// returns (or on entry for base classes)
    pub instance_elements: RefCell<Vec<ClassElement>>,
}

/// Instance element recorded on a class constructor
#[derive(Clone)]
pub enum ClassElement {
    Field {
        key: FieldKey,
        /// Initializer closure run with the instance as `this`
        initializer: Option<JsObjectRef>,
    },
    PrivateMethod {
        name: PrivateName,
        element: PrivateElement,
    },
}

/// Key of a class field definition
#[derive(Clone)]
pub enum FieldKey {
    Public(PropertyKey),
    Private(PrivateName),
}
