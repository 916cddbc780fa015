//! Function.prototype built-in methods (call, apply, bind) and Function constructor

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{CheapClone, JsFunction, JsObjectRef, JsValue, PropertyKey};

/// Initialize Function.prototype with call, apply, bind, toString and @@hasInstance
pub fn init_function_prototype(interp: &mut Interpreter) {
    let proto = interp.intrinsics.function_prototype.cheap_clone();

    interp.register_method(&proto, "call", function_call, 1);
    interp.register_method(&proto, "apply", function_apply, 2);
    interp.register_method(&proto, "bind", function_bind, 1);
    interp.register_method(&proto, "toString", function_to_string, 0);

    // Function.prototype[@@hasInstance] is non-writable and non-configurable
    let has_instance = interp.symbols.has_instance.cheap_clone();
    let func = interp.create_native_function("[Symbol.hasInstance]", function_has_instance, 1);
    proto.borrow_mut().define_property(
        PropertyKey::Symbol(has_instance),
        crate::value::Property::with_attributes(JsValue::Object(func), false, false, false),
    );
}

/// Create the global Function constructor. Building functions from source
/// strings is not supported; the constructor exists so that
/// `f instanceof Function` and `Function.prototype` work.
pub fn create_function_constructor(interp: &mut Interpreter) -> JsObjectRef {
    let constructor = interp.create_native_constructor(
        "Function",
        function_constructor_fn,
        function_construct,
        1,
    );
    let proto = interp.intrinsics.function_prototype.cheap_clone();
    super::link_constructor(interp, &constructor, &proto);
    constructor
}

fn function_constructor_fn(_interp: &mut Interpreter, _this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Err(JsError::type_error("Code generation from strings is not supported"))
}

fn function_construct(interp: &mut Interpreter, args: &[JsValue], _new_target: &JsObjectRef) -> Result<JsValue, JsError> {
    function_constructor_fn(interp, JsValue::Undefined, args)
}

/// Function.prototype.call(thisArg, ...args)
pub fn function_call(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    if !this.is_callable() {
        return Err(JsError::type_error("Function.prototype.call called on non-function"));
    }
    let this_arg = args.first().cloned().unwrap_or_default();
    let rest = args.get(1..).unwrap_or_default();
    interp.call_function(&this, this_arg, rest)
}

/// Function.prototype.apply(thisArg, argsArray)
pub fn function_apply(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    if !this.is_callable() {
        return Err(JsError::type_error("Function.prototype.apply was called on non-function"));
    }
    let this_arg = args.first().cloned().unwrap_or_default();
    let call_args = match args.get(1) {
        None | Some(JsValue::Undefined) | Some(JsValue::Null) => Vec::new(),
        Some(JsValue::Object(list)) => create_list_from_array_like(interp, list)?,
        Some(other) => {
            return Err(JsError::type_error(format!(
                "CreateListFromArrayLike called on non-object: {}",
                other.describe()
            )));
        }
    };
    interp.call_function(&this, this_arg, &call_args)
}

/// CreateListFromArrayLike
pub fn create_list_from_array_like(interp: &mut Interpreter, list: &JsObjectRef) -> Result<Vec<JsValue>, JsError> {
    let len = interp.length_of_array_like(list)?;
    let receiver = JsValue::Object(list.cheap_clone());
    let mut values = Vec::new();
    for i in 0..len {
        let key = PropertyKey::from_number(i as f64);
        values.push(interp.get(list, &key, &receiver)?);
    }
    Ok(values)
}

/// Function.prototype.bind(thisArg, ...args)
pub fn function_bind(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let target = match &this {
        JsValue::Object(obj) if obj.borrow().is_callable() => obj.cheap_clone(),
        _ => return Err(JsError::type_error("Bind must be called on a function")),
    };
    let this_arg = args.first().cloned().unwrap_or_default();
    let bound_args = args.get(1..).unwrap_or_default().to_vec();
    let bound = interp.create_bound_function(&target, this_arg, bound_args)?;
    Ok(JsValue::Object(bound))
}

/// Function.prototype.toString: source text for script functions,
/// `[native code]` otherwise
pub fn function_to_string(_interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let JsValue::Object(obj) = &this else {
        return Err(JsError::type_error("Function.prototype.toString requires that 'this' be a Function"));
    };
    let obj_ref = obj.borrow();
    match obj_ref.as_function() {
        Some(JsFunction::Interpreted(closure)) => Ok(JsValue::String(closure.node.source.cheap_clone())),
        Some(JsFunction::Native(native)) => Ok(JsValue::from(format!(
            "function {}() {{ [native code] }}",
            native.name
        ))),
        Some(JsFunction::Bound(_)) => Ok(JsValue::from("function () { [native code] }")),
        None => Err(JsError::type_error("Function.prototype.toString requires that 'this' be a Function")),
    }
}

/// Function.prototype[@@hasInstance](value)
pub fn function_has_instance(interp: &mut Interpreter, this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    let value = args.first().cloned().unwrap_or_default();
    Ok(JsValue::Boolean(interp.ordinary_has_instance(&this, &value)?))
}
