//! Error constructors and Error.prototype

use crate::error::{ErrorKind, JsError};
use crate::interpreter::Interpreter;
use crate::value::{CheapClone, ExoticObject, JsObjectRef, JsValue, NativeCtorFn, NativeFn};

/// Initialize Error and the native error constructors and add them to globals
pub fn init_error(interp: &mut Interpreter) {
    let error_proto = interp.intrinsics.error_prototype.cheap_clone();
    let empty = interp.intern("");
    let name = interp.intern("Error");
    interp.define_hidden(&error_proto, "name", JsValue::String(name));
    interp.define_hidden(&error_proto, "message", JsValue::String(empty));
    interp.register_method(&error_proto, "toString", error_to_string, 0);

    let error_fn = interp.create_native_constructor("Error", error_call, error_construct, 1);
    super::link_constructor(interp, &error_fn, &error_proto);
    super::define_global(interp, "Error", JsValue::Object(error_fn.cheap_clone()));

    let native: [(ErrorKind, NativeFn, NativeCtorFn); 4] = [
        (ErrorKind::Type, type_error_call, type_error_construct),
        (ErrorKind::Reference, reference_error_call, reference_error_construct),
        (ErrorKind::Syntax, syntax_error_call, syntax_error_construct),
        (ErrorKind::Range, range_error_call, range_error_construct),
    ];
    for (kind, call, construct) in native {
        let ctor_name = kind.constructor_name();
        let proto = interp.intrinsics.error_prototype_for(kind);
        let name = interp.intern(ctor_name);
        let empty = interp.intern("");
        interp.define_hidden(&proto, "name", JsValue::String(name));
        interp.define_hidden(&proto, "message", JsValue::String(empty));

        let ctor = interp.create_native_constructor(ctor_name, call, construct, 1);
        // TypeError.__proto__ === Error
        ctor.borrow_mut().prototype = Some(error_fn.cheap_clone());
        super::link_constructor(interp, &ctor, &proto);
        super::define_global(interp, ctor_name, JsValue::Object(ctor));
    }
}

/// Shared body of every error constructor: allocate the instance, then
/// install `message` and `cause` when given
fn initialize_error(interp: &mut Interpreter, proto: JsObjectRef, args: &[JsValue]) -> Result<JsValue, JsError> {
    let obj = interp.create_object_with_proto(Some(proto));
    obj.borrow_mut().exotic = ExoticObject::Error;

    if let Some(message) = args.first().filter(|m| !m.is_undefined()) {
        let message = interp.to_string(message)?;
        interp.define_hidden(&obj, "message", JsValue::String(message));
    }

    if let Some(JsValue::Object(options)) = args.get(1) {
        let cause_key = interp.key("cause");
        if interp.has_property(options, &cause_key) {
            let cause = interp.get(options, &cause_key, &JsValue::Object(options.cheap_clone()))?;
            interp.define_hidden(&obj, "cause", cause);
        }
    }
    Ok(JsValue::Object(obj))
}

fn construct_kind(
    interp: &mut Interpreter,
    kind: Option<ErrorKind>,
    args: &[JsValue],
    new_target: Option<&JsObjectRef>,
) -> Result<JsValue, JsError> {
    let default = match kind {
        Some(kind) => interp.intrinsics.error_prototype_for(kind),
        None => interp.intrinsics.error_prototype.cheap_clone(),
    };
    let proto = match new_target {
        Some(target) => interp.get_prototype_from_constructor(target, default)?,
        None => default,
    };
    initialize_error(interp, proto, args)
}

// Called without `new`, error constructors behave as if constructed.

pub fn error_call(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    construct_kind(interp, None, args, None)
}

pub fn error_construct(interp: &mut Interpreter, args: &[JsValue], new_target: &JsObjectRef) -> Result<JsValue, JsError> {
    construct_kind(interp, None, args, Some(new_target))
}

pub fn type_error_call(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    construct_kind(interp, Some(ErrorKind::Type), args, None)
}

pub fn type_error_construct(interp: &mut Interpreter, args: &[JsValue], new_target: &JsObjectRef) -> Result<JsValue, JsError> {
    construct_kind(interp, Some(ErrorKind::Type), args, Some(new_target))
}

pub fn reference_error_call(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    construct_kind(interp, Some(ErrorKind::Reference), args, None)
}

pub fn reference_error_construct(
    interp: &mut Interpreter,
    args: &[JsValue],
    new_target: &JsObjectRef,
) -> Result<JsValue, JsError> {
    construct_kind(interp, Some(ErrorKind::Reference), args, Some(new_target))
}

pub fn syntax_error_call(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    construct_kind(interp, Some(ErrorKind::Syntax), args, None)
}

pub fn syntax_error_construct(
    interp: &mut Interpreter,
    args: &[JsValue],
    new_target: &JsObjectRef,
) -> Result<JsValue, JsError> {
    construct_kind(interp, Some(ErrorKind::Syntax), args, Some(new_target))
}

pub fn range_error_call(interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    construct_kind(interp, Some(ErrorKind::Range), args, None)
}

pub fn range_error_construct(interp: &mut Interpreter, args: &[JsValue], new_target: &JsObjectRef) -> Result<JsValue, JsError> {
    construct_kind(interp, Some(ErrorKind::Range), args, Some(new_target))
}

/// Error.prototype.toString()
/// Returns "name: message", or just one of them when the other is empty
pub fn error_to_string(interp: &mut Interpreter, this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let JsValue::Object(obj) = &this else {
        return Err(JsError::type_error(format!(
            "Error.prototype.toString called on {}",
            this.describe()
        )));
    };

    let name_key = interp.key("name");
    let name = match interp.get(obj, &name_key, &this)? {
        JsValue::Undefined => "Error".to_string(),
        v => interp.to_string(&v)?.to_string(),
    };
    let message_key = interp.key("message");
    let message = match interp.get(obj, &message_key, &this)? {
        JsValue::Undefined => String::new(),
        v => interp.to_string(&v)?.to_string(),
    };

    let rendered = match (name.is_empty(), message.is_empty()) {
        (_, true) => name,
        (true, false) => message,
        (false, false) => format!("{}: {}", name, message),
    };
    Ok(JsValue::from(rendered))
}
