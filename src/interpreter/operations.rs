//! Abstract operations: type conversion, equality, relational comparison
//! and the binary operators

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive, Zero};

use super::Interpreter;
use crate::ast::BinaryOp;
use crate::error::JsError;
use crate::value::{
    CheapClone, ExoticObject, JsBigInt, JsFunction, JsObjectRef, JsString, JsValue, MAX_STRING_LENGTH, PropertyKey,
    is_js_whitespace, string_to_number,
};

/// Hint passed to ToPrimitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredType {
    Default,
    Number,
    String,
}

impl PreferredType {
    fn as_str(self) -> &'static str {
        match self {
            PreferredType::Default => "default",
            PreferredType::Number => "number",
            PreferredType::String => "string",
        }
    }
}

/// Result of ToNumeric
#[derive(Debug, Clone)]
pub enum Numeric {
    Number(f64),
    BigInt(JsBigInt),
}

impl Numeric {
    pub fn into_value(self) -> JsValue {
        match self {
            Numeric::Number(n) => JsValue::Number(n),
            Numeric::BigInt(b) => JsValue::BigInt(b),
        }
    }
}

/// Largest shift accepted for BigInt `<<`, in bits
const MAX_BIGINT_SHIFT: u64 = 1 << 30;

impl Interpreter {
    // ═══════════════════════════════════════════════════════════════════════
    // Conversions
    // ═══════════════════════════════════════════════════════════════════════

    /// ToPrimitive: `@@toPrimitive`, then `valueOf`/`toString` in hint order
    pub fn to_primitive(&mut self, value: &JsValue, hint: PreferredType) -> Result<JsValue, JsError> {
        let JsValue::Object(obj) = value else {
            return Ok(value.cheap_clone());
        };

        let exotic_key = PropertyKey::Symbol(self.symbols.to_primitive.cheap_clone());
        if let Some(method) = self.get_method(value, &exotic_key)? {
            let result = self.call_function(&method, value.cheap_clone(), &[JsValue::from(hint.as_str())])?;
            if result.is_object() {
                return Err(JsError::type_error("Cannot convert object to primitive value"));
            }
            return Ok(result);
        }

        let order = if hint == PreferredType::String {
            ["toString", "valueOf"]
        } else {
            ["valueOf", "toString"]
        };
        for name in order {
            let key = self.key(name);
            let method = self.get(obj, &key, value)?;
            if method.is_callable() {
                let result = self.call_function(&method, value.cheap_clone(), &[])?;
                if !result.is_object() {
                    return Ok(result);
                }
            }
        }
        Err(JsError::type_error("Cannot convert object to primitive value"))
    }

    /// ToNumber
    pub fn to_number(&mut self, value: &JsValue) -> Result<f64, JsError> {
        Ok(match value {
            JsValue::Undefined => f64::NAN,
            JsValue::Null => 0.0,
            JsValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            JsValue::Number(n) => *n,
            JsValue::String(s) => string_to_number(s.as_str()),
            JsValue::Symbol(_) => {
                return Err(JsError::type_error("Cannot convert a Symbol value to a number"));
            }
            JsValue::BigInt(_) => {
                return Err(JsError::type_error("Cannot convert a BigInt value to a number"));
            }
            JsValue::Object(_) => {
                let prim = self.to_primitive(value, PreferredType::Number)?;
                return self.to_number(&prim);
            }
        })
    }

    /// ToNumeric: a Number or a BigInt
    pub fn to_numeric(&mut self, value: &JsValue) -> Result<Numeric, JsError> {
        let prim = self.to_primitive(value, PreferredType::Number)?;
        match prim {
            JsValue::BigInt(b) => Ok(Numeric::BigInt(b)),
            other => Ok(Numeric::Number(self.to_number(&other)?)),
        }
    }

    /// ToString
    pub fn to_string(&mut self, value: &JsValue) -> Result<JsString, JsError> {
        match value {
            JsValue::String(s) => Ok(s.cheap_clone()),
            JsValue::Symbol(_) => Err(JsError::type_error("Cannot convert a Symbol value to a string")),
            JsValue::Object(_) => {
                let prim = self.to_primitive(value, PreferredType::String)?;
                self.to_string(&prim)
            }
            other => Ok(other.to_primitive_string()),
        }
    }

    /// ToPropertyKey
    pub fn to_property_key(&mut self, value: &JsValue) -> Result<PropertyKey, JsError> {
        let prim = self.to_primitive(value, PreferredType::String)?;
        Ok(match prim {
            JsValue::Symbol(sym) => PropertyKey::Symbol(sym),
            JsValue::Number(n) => PropertyKey::from_number(n),
            JsValue::String(s) => PropertyKey::from_js_string(self.string_dict.insert(s)),
            other => PropertyKey::from_js_string(other.to_primitive_string()),
        })
    }

    /// ToObject: primitives are boxed in wrapper objects
    pub fn to_object(&mut self, value: &JsValue) -> Result<JsObjectRef, JsError> {
        match value {
            JsValue::Object(obj) => Ok(obj.cheap_clone()),
            JsValue::Undefined | JsValue::Null => {
                Err(JsError::type_error("Cannot convert undefined or null to object"))
            }
            primitive => {
                let proto = self.primitive_prototype(primitive);
                let obj = self.create_object_with_proto(proto);
                obj.borrow_mut().exotic = ExoticObject::Primitive(primitive.cheap_clone());
                Ok(obj)
            }
        }
    }

    /// Prototype a primitive's properties are looked up on
    pub(crate) fn primitive_prototype(&self, value: &JsValue) -> Option<JsObjectRef> {
        let i = &self.intrinsics;
        match value {
            JsValue::Boolean(_) => Some(i.boolean_prototype.cheap_clone()),
            JsValue::Number(_) => Some(i.number_prototype.cheap_clone()),
            JsValue::BigInt(_) => Some(i.bigint_prototype.cheap_clone()),
            JsValue::String(_) => Some(i.string_prototype.cheap_clone()),
            JsValue::Symbol(_) => Some(i.symbol_prototype.cheap_clone()),
            JsValue::Object(obj) => Some(obj.cheap_clone()),
            JsValue::Undefined | JsValue::Null => None,
        }
    }

    pub fn to_int32(&mut self, value: &JsValue) -> Result<i32, JsError> {
        Ok(f64_to_int32(self.to_number(value)?))
    }

    pub fn to_uint32(&mut self, value: &JsValue) -> Result<u32, JsError> {
        Ok(f64_to_uint32(self.to_number(value)?))
    }

    /// ToIntegerOrInfinity
    pub fn to_integer_or_infinity(&mut self, value: &JsValue) -> Result<f64, JsError> {
        let n = self.to_number(value)?;
        if n.is_nan() {
            return Ok(0.0);
        }
        Ok(n.trunc() + 0.0)
    }

    /// GetMethod: `undefined`/`null` mean absent, anything else must be callable
    pub fn get_method(&mut self, value: &JsValue, key: &PropertyKey) -> Result<Option<JsValue>, JsError> {
        let func = self.get_v(value, key)?;
        if func.is_nullish() {
            return Ok(None);
        }
        if !func.is_callable() {
            return Err(JsError::type_error(format!("{} is not a function", func.describe())));
        }
        Ok(Some(func))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Equality and comparison
    // ═══════════════════════════════════════════════════════════════════════

    /// IsLooselyEqual (`==`)
    pub fn loosely_equal(&mut self, left: &JsValue, right: &JsValue) -> Result<bool, JsError> {
        use JsValue::*;
        Ok(match (left, right) {
            (Undefined | Null, Undefined | Null) => true,
            (Undefined | Null, _) | (_, Undefined | Null) => false,
            (Number(_), Number(_))
            | (String(_), String(_))
            | (Boolean(_), Boolean(_))
            | (BigInt(_), BigInt(_))
            | (Symbol(_), Symbol(_))
            | (Object(_), Object(_)) => left.strict_equals(right),
            (Number(n), String(s)) | (String(s), Number(n)) => *n == string_to_number(s.as_str()),
            (BigInt(b), String(s)) | (String(s), BigInt(b)) => {
                string_to_bigint(s.as_str()).is_some_and(|parsed| &parsed == b.value())
            }
            (Boolean(b), other) | (other, Boolean(b)) => {
                let n = Number(if *b { 1.0 } else { 0.0 });
                return self.loosely_equal(&n, other);
            }
            (Object(_), _) => {
                let prim = self.to_primitive(left, PreferredType::Default)?;
                return self.loosely_equal(&prim, right);
            }
            (_, Object(_)) => {
                let prim = self.to_primitive(right, PreferredType::Default)?;
                return self.loosely_equal(left, &prim);
            }
            (BigInt(b), Number(n)) | (Number(n), BigInt(b)) => {
                compare_bigint_number(b.value(), *n) == Some(Ordering::Equal)
            }
            (Symbol(_), _) | (_, Symbol(_)) => false,
        })
    }

    /// IsLessThan. `None` is the "undefined" outcome a NaN comparison gives.
    pub fn is_less_than(
        &mut self,
        left: &JsValue,
        right: &JsValue,
        left_first: bool,
    ) -> Result<Option<bool>, JsError> {
        let (px, py) = if left_first {
            let px = self.to_primitive(left, PreferredType::Number)?;
            let py = self.to_primitive(right, PreferredType::Number)?;
            (px, py)
        } else {
            let py = self.to_primitive(right, PreferredType::Number)?;
            let px = self.to_primitive(left, PreferredType::Number)?;
            (px, py)
        };

        match (&px, &py) {
            (JsValue::String(a), JsValue::String(b)) => {
                Ok(Some(a.as_str().encode_utf16().lt(b.as_str().encode_utf16())))
            }
            (JsValue::BigInt(a), JsValue::String(b)) => {
                Ok(string_to_bigint(b.as_str()).map(|b| a.value() < &b))
            }
            (JsValue::String(a), JsValue::BigInt(b)) => {
                Ok(string_to_bigint(a.as_str()).map(|a| &a < b.value()))
            }
            _ => {
                let nx = self.to_numeric(&px)?;
                let ny = self.to_numeric(&py)?;
                Ok(match (nx, ny) {
                    (Numeric::Number(a), Numeric::Number(b)) => {
                        if a.is_nan() || b.is_nan() {
                            None
                        } else {
                            Some(a < b)
                        }
                    }
                    (Numeric::BigInt(a), Numeric::BigInt(b)) => Some(a.value() < b.value()),
                    (Numeric::BigInt(a), Numeric::Number(b)) => {
                        compare_bigint_number(a.value(), b).map(|o| o == Ordering::Less)
                    }
                    (Numeric::Number(a), Numeric::BigInt(b)) => {
                        compare_bigint_number(b.value(), a).map(|o| o == Ordering::Greater)
                    }
                })
            }
        }
    }

    /// InstanceofOperator
    pub fn instance_of(&mut self, value: &JsValue, target: &JsValue) -> Result<bool, JsError> {
        if !target.is_object() {
            return Err(JsError::type_error(
                "Right-hand side of 'instanceof' is not an object",
            ));
        }
        let has_instance = PropertyKey::Symbol(self.symbols.has_instance.cheap_clone());
        if let Some(method) = self.get_method(target, &has_instance)? {
            let result = self.call_function(&method, target.cheap_clone(), &[value.cheap_clone()])?;
            return Ok(result.to_boolean());
        }
        if !target.is_callable() {
            return Err(JsError::type_error(
                "Right-hand side of 'instanceof' is not callable",
            ));
        }
        self.ordinary_has_instance(target, value)
    }

    /// OrdinaryHasInstance
    pub fn ordinary_has_instance(&mut self, ctor: &JsValue, value: &JsValue) -> Result<bool, JsError> {
        let JsValue::Object(ctor_obj) = ctor else {
            return Ok(false);
        };
        let bound_target = match ctor_obj.borrow().as_function() {
            None => return Ok(false),
            Some(JsFunction::Bound(bound)) => Some(bound.target.cheap_clone()),
            Some(_) => None,
        };
        if let Some(target) = bound_target {
            return self.instance_of(value, &JsValue::Object(target));
        }
        let JsValue::Object(obj) = value else {
            return Ok(false);
        };

        let key = self.key("prototype");
        let proto = self.get(ctor_obj, &key, ctor)?;
        let JsValue::Object(proto) = proto else {
            return Err(JsError::type_error(format!(
                "Function has non-object prototype '{}' in instanceof check",
                proto.describe()
            )));
        };
        let mut current = obj.borrow().prototype.clone();
        while let Some(p) = current {
            if std::rc::Rc::ptr_eq(&p, &proto) {
                return Ok(true);
            }
            current = p.borrow().prototype.clone();
        }
        Ok(false)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Binary operators
    // ═══════════════════════════════════════════════════════════════════════

    /// Apply a binary operator to two already-evaluated operands
    pub fn apply_binary_op(
        &mut self,
        op: BinaryOp,
        left: &JsValue,
        right: &JsValue,
    ) -> Result<JsValue, JsError> {
        Ok(match op {
            BinaryOp::Add => return self.add(left, right),
            BinaryOp::StrictEq => JsValue::Boolean(left.strict_equals(right)),
            BinaryOp::StrictNotEq => JsValue::Boolean(!left.strict_equals(right)),
            BinaryOp::Eq => JsValue::Boolean(self.loosely_equal(left, right)?),
            BinaryOp::NotEq => JsValue::Boolean(!self.loosely_equal(left, right)?),
            BinaryOp::Lt => JsValue::Boolean(self.is_less_than(left, right, true)? == Some(true)),
            BinaryOp::Gt => JsValue::Boolean(self.is_less_than(right, left, false)? == Some(true)),
            BinaryOp::LtEq => JsValue::Boolean(self.is_less_than(right, left, false)? == Some(false)),
            BinaryOp::GtEq => JsValue::Boolean(self.is_less_than(left, right, true)? == Some(false)),
            BinaryOp::Instanceof => JsValue::Boolean(self.instance_of(left, right)?),
            BinaryOp::In => {
                let JsValue::Object(obj) = right else {
                    return Err(JsError::type_error(format!(
                        "Cannot use 'in' operator to search for '{}' in {}",
                        left.to_primitive_string(),
                        right.describe()
                    )));
                };
                let key = self.to_property_key(left)?;
                JsValue::Boolean(self.has_property(obj, &key))
            }
            _ => {
                let l = self.to_numeric(left)?;
                let r = self.to_numeric(right)?;
                match (l, r) {
                    (Numeric::Number(a), Numeric::Number(b)) => JsValue::Number(number_op(op, a, b)),
                    (Numeric::BigInt(a), Numeric::BigInt(b)) => {
                        JsValue::BigInt(bigint_op(op, a.value(), b.value())?.into())
                    }
                    _ => return Err(mixed_bigint_error()),
                }
            }
        })
    }

    /// The `+` operator: string concatenation if either primitive is a string
    fn add(&mut self, left: &JsValue, right: &JsValue) -> Result<JsValue, JsError> {
        if let (JsValue::Number(a), JsValue::Number(b)) = (left, right) {
            return Ok(JsValue::Number(a + b));
        }
        let lprim = self.to_primitive(left, PreferredType::Default)?;
        let rprim = self.to_primitive(right, PreferredType::Default)?;
        if lprim.is_string() || rprim.is_string() {
            let ls = self.to_string(&lprim)?;
            let rs = self.to_string(&rprim)?;
            if ls.len() + rs.len() > MAX_STRING_LENGTH && ls.utf16_len() + rs.utf16_len() > MAX_STRING_LENGTH {
                return Err(JsError::invalid_string_length());
            }
            let mut out = String::with_capacity(ls.len() + rs.len());
            out.push_str(ls.as_str());
            out.push_str(rs.as_str());
            return Ok(JsValue::String(JsString::from(out)));
        }
        let l = self.to_numeric(&lprim)?;
        let r = self.to_numeric(&rprim)?;
        match (l, r) {
            (Numeric::Number(a), Numeric::Number(b)) => Ok(JsValue::Number(a + b)),
            (Numeric::BigInt(a), Numeric::BigInt(b)) => Ok(JsValue::from(a.value() + b.value())),
            _ => Err(mixed_bigint_error()),
        }
    }
}

fn mixed_bigint_error() -> JsError {
    JsError::type_error("Cannot mix BigInt and other types, use explicit conversions")
}

/// Number semantics of the arithmetic, bitwise and shift operators
fn number_op(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Mod => a % b,
        BinaryOp::Exp => number_pow(a, b),
        BinaryOp::BitAnd => f64::from(f64_to_int32(a) & f64_to_int32(b)),
        BinaryOp::BitOr => f64::from(f64_to_int32(a) | f64_to_int32(b)),
        BinaryOp::BitXor => f64::from(f64_to_int32(a) ^ f64_to_int32(b)),
        BinaryOp::LShift => f64::from(f64_to_int32(a).wrapping_shl(f64_to_uint32(b) & 31)),
        BinaryOp::RShift => f64::from(f64_to_int32(a).wrapping_shr(f64_to_uint32(b) & 31)),
        BinaryOp::URShift => f64::from(f64_to_uint32(a).wrapping_shr(f64_to_uint32(b) & 31)),
        _ => a + b,
    }
}

/// `**` on Numbers. `(±1) ** ±Infinity` and `x ** NaN` are NaN, unlike C `pow`.
pub fn number_pow(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() {
        return f64::NAN;
    }
    if exponent == 0.0 {
        return 1.0;
    }
    if base.abs() == 1.0 && exponent.is_infinite() {
        return f64::NAN;
    }
    libm::pow(base, exponent)
}

/// BigInt semantics of the arithmetic, bitwise and shift operators
fn bigint_op(op: BinaryOp, a: &BigInt, b: &BigInt) -> Result<BigInt, JsError> {
    Ok(match op {
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b.is_zero() {
                return Err(JsError::range_error("Division by zero"));
            }
            a / b
        }
        BinaryOp::Mod => {
            if b.is_zero() {
                return Err(JsError::range_error("Division by zero"));
            }
            a % b
        }
        BinaryOp::Exp => {
            if b.sign() == num_bigint::Sign::Minus {
                return Err(JsError::range_error("Exponent must be non-negative"));
            }
            let exponent = b
                .to_u32()
                .ok_or_else(|| JsError::range_error("Maximum BigInt size exceeded"))?;
            num_traits::Pow::pow(a, exponent)
        }
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::BitXor => a ^ b,
        BinaryOp::LShift => shift_bigint(a, b, false)?,
        BinaryOp::RShift => shift_bigint(a, b, true)?,
        BinaryOp::URShift => {
            return Err(JsError::type_error(
                "BigInts have no unsigned right shift, use >> instead",
            ));
        }
        _ => a + b,
    })
}

/// `a << b` (or `a >> b` when `right`); a negative count shifts the other way
fn shift_bigint(a: &BigInt, b: &BigInt, right: bool) -> Result<BigInt, JsError> {
    let negative = b.sign() == num_bigint::Sign::Minus;
    let magnitude = b.magnitude().to_u64().unwrap_or(u64::MAX);
    let shift_left = negative == right;
    if shift_left {
        if magnitude > MAX_BIGINT_SHIFT {
            return Err(JsError::range_error("Maximum BigInt size exceeded"));
        }
        Ok(a << usize::try_from(magnitude).unwrap_or(usize::MAX))
    } else if magnitude > MAX_BIGINT_SHIFT {
        // Every bit shifted out: sign extension leaves 0 or -1
        Ok(if a.sign() == num_bigint::Sign::Minus {
            BigInt::from(-1)
        } else {
            BigInt::zero()
        })
    } else {
        Ok(a >> usize::try_from(magnitude).unwrap_or(usize::MAX))
    }
}

/// ToInt32 on an already converted Number
pub fn f64_to_int32(n: f64) -> i32 {
    f64_to_uint32(n) as i32
}

/// ToUint32 on an already converted Number
pub fn f64_to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    let m = n.trunc().rem_euclid(4_294_967_296.0);
    m as u32
}

/// StringToBigInt; `None` when the text is not a valid integer literal
pub fn string_to_bigint(s: &str) -> Option<BigInt> {
    let trimmed = s.trim_matches(is_js_whitespace);
    if trimmed.is_empty() {
        return Some(BigInt::zero());
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(body) = trimmed.strip_prefix(prefix) {
            if body.is_empty() || !body.chars().all(|c| c.is_digit(radix)) {
                return None;
            }
            return BigInt::parse_bytes(body.as_bytes(), radix);
        }
    }
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value = BigInt::parse_bytes(digits.as_bytes(), 10)?;
    Some(if negative { -value } else { value })
}

/// Mathematical comparison of a BigInt and a Number; `None` for NaN
pub fn compare_bigint_number(b: &BigInt, n: f64) -> Option<Ordering> {
    if n.is_nan() {
        return None;
    }
    if n.is_infinite() {
        return Some(if n > 0.0 { Ordering::Less } else { Ordering::Greater });
    }
    let floor = n.floor();
    let floor_big = BigInt::from_f64(floor)?;
    Some(match b.cmp(&floor_big) {
        Ordering::Equal if n > floor => Ordering::Less,
        other => other,
    })
}
