//! Array built-in methods
//!
//! All methods are generic: they work on any array-like `this` through
//! `[[Get]]`/`[[Set]]`, so holes and inherited elements behave as in
//! other engines.

use std::cmp::Ordering;

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{
    ArrayIteratorState, CheapClone, ExoticObject, IterationKind, JsObjectRef, JsValue, PropertyKey,
};

/// Initialize Array.prototype with all array methods.
/// The prototype object must already exist in `interp.intrinsics.array_prototype`.
pub fn init_array_prototype(interp: &mut Interpreter) {
    let proto = interp.intrinsics.array_prototype.cheap_clone();

    // Mutating methods
    interp.register_method(&proto, "push", array_push, 1);
    interp.register_method(&proto, "pop", array_pop, 0);
    interp.register_method(&proto, "shift", array_shift, 0);
    interp.register_method(&proto, "unshift", array_unshift, 1);
    interp.register_method(&proto, "splice", array_splice, 2);
    interp.register_method(&proto, "reverse", array_reverse, 0);
    interp.register_method(&proto, "sort", array_sort, 1);
    interp.register_method(&proto, "fill", array_fill, 1);

    // Accessor methods
    interp.register_method(&proto, "at", array_at, 1);
    interp.register_method(&proto, "concat", array_concat, 1);
    interp.register_method(&proto, "slice", array_slice, 2);
    interp.register_method(&proto, "join", array_join, 1);
    interp.register_method(&proto, "toString", array_to_string, 0);
    interp.register_method(&proto, "indexOf", array_index_of, 1);
    interp.register_method(&proto, "lastIndexOf", array_last_index_of, 1);
    interp.register_method(&proto, "includes", array_includes, 1);

    // Iteration methods
    interp.register_method(&proto, "forEach", array_foreach, 1);
    interp.register_method(&proto, "map", array_map, 1);
    interp.register_method(&proto, "filter", array_filter, 1);
    interp.register_method(&proto, "reduce", array_reduce, 1);
    interp.register_method(&proto, "find", array_find, 1);
    interp.register_method(&proto, "findIndex", array_find_index, 1);
    interp.register_method(&proto, "every", array_every, 1);
    interp.register_method(&proto, "some", array_some, 1);

    // Iterator methods. `values` and @@iterator are the same function object.
    interp.register_method(&proto, "keys", array_keys, 0);
    interp.register_method(&proto, "entries", array_entries, 0);
    let values = JsValue::Object(interp.intrinsics.array_values.cheap_clone());
    interp.define_hidden(&proto, "values", values.cheap_clone());
    let iterator = PropertyKey::Symbol(interp.symbols.iterator.cheap_clone());
    proto
        .borrow_mut()
        .define_property(iterator, crate::value::Property::hidden(values));
}

/// %IteratorPrototype%[@@iterator] and %ArrayIteratorPrototype%.next
pub fn init_iterator_prototypes(interp: &mut Interpreter) {
    let iterator_proto = interp.intrinsics.iterator_prototype.cheap_clone();
    let iterator = interp.symbols.iterator.cheap_clone();
    interp.register_symbol_method(&iterator_proto, iterator, "[Symbol.iterator]", iterator_self, 0);

    let array_iterator_proto = interp.intrinsics.array_iterator_prototype.cheap_clone();
    interp.register_method(&array_iterator_proto, "next", array_iterator_next, 0);
    let tag = PropertyKey::Symbol(interp.symbols.to_string_tag.cheap_clone());
    array_iterator_proto.borrow_mut().define_property(
        tag,
        crate::value::Property::with_attributes(JsValue::from("Array Iterator"), false, false, true),
    );
}

/// Create Array constructor with static methods (isArray, of, from)
pub fn create_array_constructor(interp: &mut Interpreter) -> JsObjectRef {
    let constructor = interp.create_native_constructor("Array", array_constructor_fn, array_construct, 1);

    interp.register_method(&constructor, "isArray", array_is_array, 1);
    interp.register_method(&constructor, "of", array_of, 0);
    interp.register_method(&constructor, "from", array_from, 1);

    let proto = interp.intrinsics.array_prototype.cheap_clone();
    super::link_constructor(interp, &constructor, &proto);
    constructor
}

pub fn array_constructor_fn(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let arr = create_array_from_args(interp, args)?;
    Ok(JsValue::Object(arr))
}

pub fn array_construct(interp: &mut Interpreter, args: &[JsValue], new_target: &JsObjectRef) -> Result<JsValue, JsError> {
    let arr = create_array_from_args(interp, args)?;
    let default = interp.intrinsics.array_prototype.cheap_clone();
    let proto = interp.get_prototype_from_constructor(new_target, default)?;
    arr.borrow_mut().prototype = Some(proto);
    Ok(JsValue::Object(arr))
}

/// `Array(n)` makes a sparse array of length n; anything else lists the arguments
fn create_array_from_args(interp: &mut Interpreter, args: &[JsValue]) -> Result<JsObjectRef, JsError> {
    if let [JsValue::Number(n)] = args {
        let len = interp.to_array_length(&JsValue::Number(*n))?;
        let arr = interp.create_array(Vec::new());
        if let ExoticObject::Array { length, .. } = &mut arr.borrow_mut().exotic {
            *length = len;
        }
        return Ok(arr);
    }
    Ok(interp.create_array(args.to_vec()))
}

pub fn array_is_array(_interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let is_array = match args.first() {
        Some(JsValue::Object(obj)) => obj.borrow().is_array(),
        _ => false,
    };
    Ok(JsValue::Boolean(is_array))
}

pub fn array_of(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Object(interp.create_array(args.to_vec())))
}

/// Array.from(items, mapFn, thisArg): iterables first, then array-likes
pub fn array_from(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let items = args.first().cloned().unwrap_or_default();
    let map_fn = match args.get(1) {
        None | Some(JsValue::Undefined) => None,
        Some(f) if f.is_callable() => Some(f.cheap_clone()),
        Some(other) => return Err(JsError::type_error(format!("{} is not a function", other.describe()))),
    };
    let this_arg = args.get(2).cloned().unwrap_or_default();

    let iterator_key = PropertyKey::Symbol(interp.symbols.iterator.cheap_clone());
    let uses_iterator = !items.is_nullish() && interp.get_method(&items, &iterator_key)?.is_some();
    let values = if uses_iterator {
        interp.iterate_to_vec(&items)?
    } else {
        let obj = interp.to_object(&items)?;
        let len = interp.length_of_array_like(&obj)?;
        let mut values = Vec::new();
        for i in 0..len {
            values.push(get_index(interp, &obj, i)?);
        }
        values
    };

    let values = match map_fn {
        Some(f) => {
            let mut mapped = Vec::with_capacity(values.len());
            for (i, value) in values.into_iter().enumerate() {
                mapped.push(interp.call_function(&f, this_arg.cheap_clone(), &[value, JsValue::Number(i as f64)])?);
            }
            mapped
        }
        None => values,
    };
    Ok(JsValue::Object(interp.create_array(values)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════════════

fn index_key(i: u64) -> PropertyKey {
    PropertyKey::from_number(i as f64)
}

fn get_index(interp: &mut Interpreter, obj: &JsObjectRef, i: u64) -> Result<JsValue, JsError> {
    interp.get(obj, &index_key(i), &JsValue::Object(obj.cheap_clone()))
}

fn set_index(interp: &mut Interpreter, obj: &JsObjectRef, i: u64, value: JsValue) -> Result<(), JsError> {
    interp.set_or_throw(obj, &index_key(i), value)
}

fn has_index(interp: &Interpreter, obj: &JsObjectRef, i: u64) -> bool {
    interp.has_property(obj, &index_key(i))
}

fn delete_index(interp: &mut Interpreter, obj: &JsObjectRef, i: u64) -> Result<(), JsError> {
    if interp.delete_property(obj, &index_key(i)) {
        Ok(())
    } else {
        Err(JsError::type_error(format!("Cannot delete property '{}' of {}", i, JsValue::Object(obj.cheap_clone()).describe())))
    }
}

fn set_length(interp: &mut Interpreter, obj: &JsObjectRef, len: u64) -> Result<(), JsError> {
    let key = interp.key("length");
    interp.set_or_throw(obj, &key, JsValue::Number(len as f64))
}

/// `this` as an object plus its length
fn this_array_like(interp: &mut Interpreter, this: &JsValue) -> Result<(JsObjectRef, u64), JsError> {
    let obj = interp.to_object(this)?;
    let len = interp.length_of_array_like(&obj)?;
    Ok((obj, len))
}

/// Callback argument of the iteration methods
fn callback(args: &[JsValue]) -> Result<JsValue, JsError> {
    match args.first() {
        Some(f) if f.is_callable() => Ok(f.cheap_clone()),
        other => Err(JsError::type_error(format!(
            "{} is not a function",
            other.cloned().unwrap_or_default().describe()
        ))),
    }
}

/// Resolve a relative index argument (negative counts from the end) into `0..=len`
fn relative_index(interp: &mut Interpreter, value: Option<&JsValue>, len: u64, default: u64) -> Result<u64, JsError> {
    let Some(value) = value.filter(|v| !v.is_undefined()) else {
        return Ok(default);
    };
    let n = interp.to_integer_or_infinity(value)?;
    let len_f = len as f64;
    Ok(if n < 0.0 { (len_f + n).max(0.0) as u64 } else { n.min(len_f) as u64 })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Mutating methods
// ═══════════════════════════════════════════════════════════════════════════════

pub fn array_push(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let (obj, len) = this_array_like(interp, &this)?;
    let mut len = len;
    for arg in args {
        set_index(interp, &obj, len, arg.cheap_clone())?;
        len += 1;
    }
    set_length(interp, &obj, len)?;
    Ok(JsValue::Number(len as f64))
}

pub fn array_pop(interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let (obj, len) = this_array_like(interp, &this)?;
    if len == 0 {
        set_length(interp, &obj, 0)?;
        return Ok(JsValue::Undefined);
    }
    let last = len - 1;
    let value = get_index(interp, &obj, last)?;
    delete_index(interp, &obj, last)?;
    set_length(interp, &obj, last)?;
    Ok(value)
}

pub fn array_shift(interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let (obj, len) = this_array_like(interp, &this)?;
    if len == 0 {
        set_length(interp, &obj, 0)?;
        return Ok(JsValue::Undefined);
    }
    let first = get_index(interp, &obj, 0)?;
    for k in 1..len {
        if has_index(interp, &obj, k) {
            let value = get_index(interp, &obj, k)?;
            set_index(interp, &obj, k - 1, value)?;
        } else {
            delete_index(interp, &obj, k - 1)?;
        }
    }
    delete_index(interp, &obj, len - 1)?;
    set_length(interp, &obj, len - 1)?;
    Ok(first)
}

pub fn array_unshift(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let (obj, len) = this_array_like(interp, &this)?;
    let count = args.len() as u64;
    if count > 0 {
        for k in (0..len).rev() {
            if has_index(interp, &obj, k) {
                let value = get_index(interp, &obj, k)?;
                set_index(interp, &obj, k + count, value)?;
            } else {
                delete_index(interp, &obj, k + count)?;
            }
        }
        for (j, arg) in args.iter().enumerate() {
            set_index(interp, &obj, j as u64, arg.cheap_clone())?;
        }
    }
    set_length(interp, &obj, len + count)?;
    Ok(JsValue::Number((len + count) as f64))
}

/// Array.prototype.splice(start, deleteCount, ...items)
pub fn array_splice(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let (obj, len) = this_array_like(interp, &this)?;
    let start = relative_index(interp, args.first(), len, 0)?;
    let delete_count = match args.len() {
        0 => 0,
        1 => len - start,
        _ => {
            let n = interp.to_integer_or_infinity(args.get(1).unwrap_or(&JsValue::Undefined))?;
            n.clamp(0.0, (len - start) as f64) as u64
        }
    };
    let items = args.get(2..).unwrap_or_default();
    let item_count = items.len() as u64;

    let mut removed = Vec::new();
    for k in 0..delete_count {
        removed.push(get_index(interp, &obj, start + k)?);
    }

    if item_count < delete_count {
        for k in start..(len - delete_count) {
            let from = k + delete_count;
            let to = k + item_count;
            if has_index(interp, &obj, from) {
                let value = get_index(interp, &obj, from)?;
                set_index(interp, &obj, to, value)?;
            } else {
                delete_index(interp, &obj, to)?;
            }
        }
        for k in ((len - delete_count + item_count)..len).rev() {
            delete_index(interp, &obj, k)?;
        }
    } else if item_count > delete_count {
        for k in (start..(len - delete_count)).rev() {
            let from = k + delete_count;
            let to = k + item_count;
            if has_index(interp, &obj, from) {
                let value = get_index(interp, &obj, from)?;
                set_index(interp, &obj, to, value)?;
            } else {
                delete_index(interp, &obj, to)?;
            }
        }
    }
    for (j, item) in items.iter().enumerate() {
        set_index(interp, &obj, start + j as u64, item.cheap_clone())?;
    }
    set_length(interp, &obj, len - delete_count + item_count)?;
    Ok(JsValue::Object(interp.create_array(removed)))
}

pub fn array_reverse(interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let (obj, len) = this_array_like(interp, &this)?;
    let mut lower = 0;
    while len > 0 && lower < len / 2 {
        let upper = len - 1 - lower;
        let lower_exists = has_index(interp, &obj, lower);
        let upper_exists = has_index(interp, &obj, upper);
        let lower_value = get_index(interp, &obj, lower)?;
        let upper_value = get_index(interp, &obj, upper)?;
        match (lower_exists, upper_exists) {
            (true, true) => {
                set_index(interp, &obj, lower, upper_value)?;
                set_index(interp, &obj, upper, lower_value)?;
            }
            (false, true) => {
                set_index(interp, &obj, lower, upper_value)?;
                delete_index(interp, &obj, upper)?;
            }
            (true, false) => {
                delete_index(interp, &obj, lower)?;
                set_index(interp, &obj, upper, lower_value)?;
            }
            (false, false) => {}
        }
        lower += 1;
    }
    Ok(JsValue::Object(obj))
}

/// Array.prototype.sort(comparefn): stable merge sort; holes and
/// `undefined` move to the end
pub fn array_sort(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let compare = match args.first() {
        None | Some(JsValue::Undefined) => None,
        Some(f) if f.is_callable() => Some(f.cheap_clone()),
        Some(_) => {
            return Err(JsError::type_error(
                "The comparison function must be either a function or undefined",
            ));
        }
    };
    let (obj, len) = this_array_like(interp, &this)?;

    let mut values = Vec::new();
    let mut undefined_count = 0;
    for k in 0..len {
        if has_index(interp, &obj, k) {
            match get_index(interp, &obj, k)? {
                JsValue::Undefined => undefined_count += 1,
                value => values.push(value),
            }
        }
    }
    let sorted = merge_sort(interp, values, compare.as_ref())?;

    let mut k = 0;
    for value in sorted {
        set_index(interp, &obj, k, value)?;
        k += 1;
    }
    for _ in 0..undefined_count {
        set_index(interp, &obj, k, JsValue::Undefined)?;
        k += 1;
    }
    while k < len {
        delete_index(interp, &obj, k)?;
        k += 1;
    }
    Ok(JsValue::Object(obj))
}

fn merge_sort(interp: &mut Interpreter, mut values: Vec<JsValue>, compare: Option<&JsValue>) -> Result<Vec<JsValue>, JsError> {
    if values.len() <= 1 {
        return Ok(values);
    }
    let right = values.split_off(values.len() / 2);
    let left = merge_sort(interp, values, compare)?;
    let right = merge_sort(interp, right, compare)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(a), Some(b)) = (left.peek(), right.peek()) {
        // Take from the right only when it sorts strictly before the left
        if compare_values(interp, b, a, compare)? == Ordering::Less {
            merged.extend(right.next());
        } else {
            merged.extend(left.next());
        }
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

/// SortCompare
fn compare_values(interp: &mut Interpreter, a: &JsValue, b: &JsValue, compare: Option<&JsValue>) -> Result<Ordering, JsError> {
    if let Some(f) = compare {
        let result = interp.call_function(f, JsValue::Undefined, &[a.cheap_clone(), b.cheap_clone()])?;
        let n = interp.to_number(&result)?;
        return Ok(n.partial_cmp(&0.0).unwrap_or(Ordering::Equal));
    }
    let a = interp.to_string(a)?;
    let b = interp.to_string(b)?;
    Ok(a.as_str().encode_utf16().cmp(b.as_str().encode_utf16()))
}

pub fn array_fill(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let (obj, len) = this_array_like(interp, &this)?;
    let value = args.first().cloned().unwrap_or_default();
    let start = relative_index(interp, args.get(1), len, 0)?;
    let end = relative_index(interp, args.get(2), len, len)?;
    for k in start..end {
        set_index(interp, &obj, k, value.cheap_clone())?;
    }
    Ok(JsValue::Object(obj))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Accessor methods
// ═══════════════════════════════════════════════════════════════════════════════

pub fn array_at(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let (obj, len) = this_array_like(interp, &this)?;
    let n = interp.to_integer_or_infinity(args.first().unwrap_or(&JsValue::Undefined))?;
    let k = if n < 0.0 { len as f64 + n } else { n };
    if k < 0.0 || k >= len as f64 {
        return Ok(JsValue::Undefined);
    }
    get_index(interp, &obj, k as u64)
}

/// Array.prototype.concat(...items): arrays are spread one level
pub fn array_concat(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let first = JsValue::Object(interp.to_object(&this)?);
    let result = interp.create_array(Vec::new());
    let mut n: u64 = 0;
    for item in std::iter::once(&first).chain(args.iter()) {
        match item {
            JsValue::Object(obj) if obj.borrow().is_array() => {
                let len = interp.length_of_array_like(obj)?;
                for k in 0..len {
                    if has_index(interp, obj, k) {
                        let value = get_index(interp, obj, k)?;
                        interp.create_data_property_or_throw(&result, index_key(n), value)?;
                    }
                    n += 1;
                }
            }
            other => {
                interp.create_data_property_or_throw(&result, index_key(n), other.cheap_clone())?;
                n += 1;
            }
        }
    }
    set_length(interp, &result, n)?;
    Ok(JsValue::Object(result))
}

pub fn array_slice(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let (obj, len) = this_array_like(interp, &this)?;
    let start = relative_index(interp, args.first(), len, 0)?;
    let end = relative_index(interp, args.get(1), len, len)?;
    let result = interp.create_array(Vec::new());
    let mut n = 0;
    for k in start..end.max(start) {
        if has_index(interp, &obj, k) {
            let value = get_index(interp, &obj, k)?;
            interp.create_data_property_or_throw(&result, index_key(n), value)?;
        }
        n += 1;
    }
    set_length(interp, &result, n)?;
    Ok(JsValue::Object(result))
}

/// Array.prototype.join(separator): `undefined`/`null` elements become empty strings
pub fn array_join(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let (obj, len) = this_array_like(interp, &this)?;
    let separator = match args.first() {
        None | Some(JsValue::Undefined) => ",".to_string(),
        Some(sep) => interp.to_string(sep)?.to_string(),
    };
    let mut out = String::new();
    for k in 0..len {
        if k > 0 {
            out.push_str(&separator);
        }
        let element = get_index(interp, &obj, k)?;
        if !element.is_nullish() {
            out.push_str(interp.to_string(&element)?.as_str());
        }
    }
    Ok(JsValue::from(out))
}

pub fn array_to_string(interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let obj = JsValue::Object(interp.to_object(&this)?);
    let join = interp.get_named(&obj, "join")?;
    if join.is_callable() {
        return interp.call_function(&join, obj, &[]);
    }
    super::object_to_string(interp, obj, &[])
}

/// Array.prototype.indexOf(search, fromIndex): strict equality, skips holes
pub fn array_index_of(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let (obj, len) = this_array_like(interp, &this)?;
    let search = args.first().cloned().unwrap_or_default();
    let start = relative_index(interp, args.get(1), len, 0)?;
    for k in start..len {
        if has_index(interp, &obj, k) && get_index(interp, &obj, k)?.strict_equals(&search) {
            return Ok(JsValue::Number(k as f64));
        }
    }
    Ok(JsValue::Number(-1.0))
}

pub fn array_last_index_of(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let (obj, len) = this_array_like(interp, &this)?;
    if len == 0 {
        return Ok(JsValue::Number(-1.0));
    }
    let search = args.first().cloned().unwrap_or_default();
    let from = match args.get(1) {
        None => len as f64 - 1.0,
        Some(v) => {
            let n = interp.to_integer_or_infinity(v)?;
            if n < 0.0 { len as f64 + n } else { n.min(len as f64 - 1.0) }
        }
    };
    let mut k = from;
    while k >= 0.0 {
        let i = k as u64;
        if has_index(interp, &obj, i) && get_index(interp, &obj, i)?.strict_equals(&search) {
            return Ok(JsValue::Number(k));
        }
        k -= 1.0;
    }
    Ok(JsValue::Number(-1.0))
}

/// Array.prototype.includes(search, fromIndex): SameValueZero, holes read as undefined
pub fn array_includes(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let (obj, len) = this_array_like(interp, &this)?;
    let search = args.first().cloned().unwrap_or_default();
    let start = relative_index(interp, args.get(1), len, 0)?;
    for k in start..len {
        if get_index(interp, &obj, k)?.same_value_zero(&search) {
            return Ok(JsValue::Boolean(true));
        }
    }
    Ok(JsValue::Boolean(false))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Iteration methods
// ═══════════════════════════════════════════════════════════════════════════════

/// Call `f(element, index, array)` for each present element, in order
fn for_each_present(
    interp: &mut Interpreter,
    this: &JsValue,
    args: &[JsValue],
    mut visit: impl FnMut(&mut Interpreter, u64, JsValue, JsValue) -> Result<bool, JsError>,
) -> Result<(), JsError> {
    let (obj, len) = this_array_like(interp, this)?;
    let f = callback(args)?;
    let this_arg = args.get(1).cloned().unwrap_or_default();
    let array = JsValue::Object(obj.cheap_clone());
    for k in 0..len {
        if !has_index(interp, &obj, k) {
            continue;
        }
        let value = get_index(interp, &obj, k)?;
        let result = interp.call_function(
            &f,
            this_arg.cheap_clone(),
            &[value.cheap_clone(), JsValue::Number(k as f64), array.cheap_clone()],
        )?;
        if !visit(interp, k, value, result)? {
            break;
        }
    }
    Ok(())
}

pub fn array_foreach(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    for_each_present(interp, &this, args, |_, _, _, _| Ok(true))?;
    Ok(JsValue::Undefined)
}

/// Array.prototype.map: holes stay holes in the result
pub fn array_map(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let (_, len) = this_array_like(interp, &this)?;
    let result = interp.create_array(Vec::new());
    set_length(interp, &result, len)?;
    let target = result.cheap_clone();
    for_each_present(interp, &this, args, |interp, k, _, mapped| {
        interp.create_data_property_or_throw(&target, index_key(k), mapped)?;
        Ok(true)
    })?;
    Ok(JsValue::Object(result))
}

pub fn array_filter(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let mut kept = Vec::new();
    for_each_present(interp, &this, args, |_, _, value, selected| {
        if selected.to_boolean() {
            kept.push(value);
        }
        Ok(true)
    })?;
    Ok(JsValue::Object(interp.create_array(kept)))
}

/// Array.prototype.reduce(callback, initialValue)
pub fn array_reduce(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let (obj, len) = this_array_like(interp, &this)?;
    let f = callback(args)?;
    let array = JsValue::Object(obj.cheap_clone());
    let mut k = 0;
    let mut accumulator = match args.get(1) {
        Some(initial) => initial.cheap_clone(),
        None => {
            while k < len && !has_index(interp, &obj, k) {
                k += 1;
            }
            if k >= len {
                return Err(JsError::type_error("Reduce of empty array with no initial value"));
            }
            let first = get_index(interp, &obj, k)?;
            k += 1;
            first
        }
    };
    while k < len {
        if has_index(interp, &obj, k) {
            let value = get_index(interp, &obj, k)?;
            accumulator = interp.call_function(
                &f,
                JsValue::Undefined,
                &[accumulator, value, JsValue::Number(k as f64), array.cheap_clone()],
            )?;
        }
        k += 1;
    }
    Ok(accumulator)
}

/// Shared body of `find`/`findIndex`: holes are visited as `undefined`
fn find_element(interp: &mut Interpreter, this: &JsValue, args: &[JsValue]) -> Result<Option<(u64, JsValue)>, JsError> {
    let (obj, len) = this_array_like(interp, this)?;
    let f = callback(args)?;
    let this_arg = args.get(1).cloned().unwrap_or_default();
    let array = JsValue::Object(obj.cheap_clone());
    for k in 0..len {
        let value = get_index(interp, &obj, k)?;
        let found = interp.call_function(
            &f,
            this_arg.cheap_clone(),
            &[value.cheap_clone(), JsValue::Number(k as f64), array.cheap_clone()],
        )?;
        if found.to_boolean() {
            return Ok(Some((k, value)));
        }
    }
    Ok(None)
}

pub fn array_find(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(find_element(interp, &this, args)?.map(|(_, v)| v).unwrap_or_default())
}

pub fn array_find_index(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(
        find_element(interp, &this, args)?.map_or(-1.0, |(k, _)| k as f64),
    ))
}

pub fn array_every(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let mut all = true;
    for_each_present(interp, &this, args, |_, _, _, result| {
        all = result.to_boolean();
        Ok(all)
    })?;
    Ok(JsValue::Boolean(all))
}

pub fn array_some(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let mut any = false;
    for_each_present(interp, &this, args, |_, _, _, result| {
        any = result.to_boolean();
        Ok(!any)
    })?;
    Ok(JsValue::Boolean(any))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Iterators
// ═══════════════════════════════════════════════════════════════════════════════

/// CreateArrayIterator
pub fn create_array_iterator(interp: &mut Interpreter, target: JsValue, kind: IterationKind) -> JsObjectRef {
    let proto = interp.intrinsics.array_iterator_prototype.cheap_clone();
    let iterator = interp.create_object_with_proto(Some(proto));
    iterator.borrow_mut().exotic = ExoticObject::ArrayIterator(ArrayIteratorState {
        target: Some(target),
        index: 0,
        kind,
    });
    iterator
}

pub fn array_keys(interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let obj = interp.to_object(&this)?;
    Ok(JsValue::Object(create_array_iterator(interp, JsValue::Object(obj), IterationKind::Keys)))
}

pub fn array_values(interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let obj = interp.to_object(&this)?;
    Ok(JsValue::Object(create_array_iterator(interp, JsValue::Object(obj), IterationKind::Values)))
}

pub fn array_entries(interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let obj = interp.to_object(&this)?;
    Ok(JsValue::Object(create_array_iterator(interp, JsValue::Object(obj), IterationKind::Entries)))
}

/// %ArrayIteratorPrototype%.next(): the length is re-read on every step,
/// so elements pushed during iteration are visited
pub fn array_iterator_next(interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let JsValue::Object(iterator) = &this else {
        return Err(JsError::type_error("next method called on incompatible receiver"));
    };
    let (target, index, kind) = match &iterator.borrow().exotic {
        ExoticObject::ArrayIterator(state) => (state.target.clone(), state.index, state.kind),
        _ => return Err(JsError::type_error("next method called on incompatible receiver")),
    };
    let Some(target) = target else {
        return Ok(interp.create_iter_result(JsValue::Undefined, true));
    };
    let target_obj = interp.to_object(&target)?;
    let len = interp.length_of_array_like(&target_obj)?;

    if u64::from(index) >= len {
        if let ExoticObject::ArrayIterator(state) = &mut iterator.borrow_mut().exotic {
            state.target = None;
        }
        return Ok(interp.create_iter_result(JsValue::Undefined, true));
    }
    if let ExoticObject::ArrayIterator(state) = &mut iterator.borrow_mut().exotic {
        state.index = index.saturating_add(1);
    }

    let key = JsValue::Number(f64::from(index));
    let value = match kind {
        IterationKind::Keys => key,
        IterationKind::Values => get_index(interp, &target_obj, u64::from(index))?,
        IterationKind::Entries => {
            let value = get_index(interp, &target_obj, u64::from(index))?;
            JsValue::Object(interp.create_array(vec![key, value]))
        }
    };
    Ok(interp.create_iter_result(value, false))
}

/// %IteratorPrototype%[@@iterator]: returns `this`
pub fn iterator_self(_interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(this)
}
