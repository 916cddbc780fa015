//! Built-in function implementations for the JavaScript standard library
//!
//! The realm is small: just enough of the standard library for
//! scripts to observe the evaluator (errors, arrays, iteration, JSON and a
//! console).

pub mod array;
pub mod bigint;
pub mod boolean;
#[cfg(feature = "console")]
pub mod console;
pub mod error;
pub mod function;
pub mod global;
pub mod json;
pub mod math;
pub mod number;
pub mod object;
pub mod string;
pub mod symbol;

pub use array::*;
pub use bigint::*;
pub use boolean::*;
#[cfg(feature = "console")]
pub use console::*;
pub use error::*;
pub use function::*;
pub use global::*;
pub use json::*;
pub use math::*;
pub use number::*;
pub use object::*;
pub use string::*;
pub use symbol::*;

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{ErrorKind, JsError};
use crate::interpreter::Interpreter;
use crate::value::{
    CheapClone, ExoticObject, JsFunction, JsObject, JsObjectRef, JsValue, NativeFunction, Property,
};

/// Intrinsic objects of a realm, referenced directly by the evaluator
pub struct Intrinsics {
    pub object_prototype: JsObjectRef,
    pub function_prototype: JsObjectRef,
    pub array_prototype: JsObjectRef,
    pub string_prototype: JsObjectRef,
    pub number_prototype: JsObjectRef,
    pub boolean_prototype: JsObjectRef,
    pub bigint_prototype: JsObjectRef,
    pub symbol_prototype: JsObjectRef,
    pub error_prototype: JsObjectRef,
    pub type_error_prototype: JsObjectRef,
    pub reference_error_prototype: JsObjectRef,
    pub syntax_error_prototype: JsObjectRef,
    pub range_error_prototype: JsObjectRef,
    /// %IteratorPrototype%
    pub iterator_prototype: JsObjectRef,
    /// %ArrayIteratorPrototype%
    pub array_iterator_prototype: JsObjectRef,
    /// %Array.prototype.values%, shared with `arguments[@@iterator]`
    pub array_values: JsObjectRef,
}

fn new_object(prototype: Option<&JsObjectRef>) -> JsObjectRef {
    Rc::new(RefCell::new(JsObject::with_prototype(prototype.cloned())))
}

impl Intrinsics {
    /// Allocate the bare prototype objects. Their properties are installed
    /// later by [`install`], once an interpreter exists to intern keys.
    pub fn allocate() -> Self {
        let object_prototype = new_object(None);

        // %Function.prototype% is itself callable and returns undefined
        let function_prototype = new_object(Some(&object_prototype));
        function_prototype.borrow_mut().exotic = ExoticObject::Function(JsFunction::Native(NativeFunction {
            name: "".into(),
            func: function_prototype_call,
            arity: 0,
            ctor: None,
        }));

        let array_prototype = new_object(Some(&object_prototype));
        array_prototype.borrow_mut().exotic = ExoticObject::Array {
            length: 0,
            length_writable: true,
        };

        let error_prototype = new_object(Some(&object_prototype));
        let iterator_prototype = new_object(Some(&object_prototype));
        let array_iterator_prototype = new_object(Some(&iterator_prototype));

        let values_function = new_object(Some(&function_prototype));
        values_function.borrow_mut().exotic = ExoticObject::Function(JsFunction::Native(NativeFunction {
            name: "values".into(),
            func: array_values,
            arity: 0,
            ctor: None,
        }));

        Self {
            string_prototype: new_object(Some(&object_prototype)),
            number_prototype: new_object(Some(&object_prototype)),
            boolean_prototype: new_object(Some(&object_prototype)),
            bigint_prototype: new_object(Some(&object_prototype)),
            symbol_prototype: new_object(Some(&object_prototype)),
            type_error_prototype: new_object(Some(&error_prototype)),
            reference_error_prototype: new_object(Some(&error_prototype)),
            syntax_error_prototype: new_object(Some(&error_prototype)),
            range_error_prototype: new_object(Some(&error_prototype)),
            object_prototype,
            function_prototype,
            array_prototype,
            error_prototype,
            iterator_prototype,
            array_iterator_prototype,
            array_values: values_function,
        }
    }

    /// Prototype for instances of a native error kind
    pub fn error_prototype_for(&self, kind: ErrorKind) -> JsObjectRef {
        match kind {
            ErrorKind::Syntax => self.syntax_error_prototype.cheap_clone(),
            ErrorKind::Type => self.type_error_prototype.cheap_clone(),
            ErrorKind::Reference => self.reference_error_prototype.cheap_clone(),
            ErrorKind::Range => self.range_error_prototype.cheap_clone(),
        }
    }

    /// Every intrinsic object, for the collector's root set
    pub fn all(&self) -> [&JsObjectRef; 16] {
        [
            &self.object_prototype,
            &self.function_prototype,
            &self.array_prototype,
            &self.string_prototype,
            &self.number_prototype,
            &self.boolean_prototype,
            &self.bigint_prototype,
            &self.symbol_prototype,
            &self.error_prototype,
            &self.type_error_prototype,
            &self.reference_error_prototype,
            &self.syntax_error_prototype,
            &self.range_error_prototype,
            &self.iterator_prototype,
            &self.array_iterator_prototype,
            &self.array_values,
        ]
    }
}

/// Behavior of calling %Function.prototype% directly
fn function_prototype_call(
    _interp: &mut Interpreter,
    _this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Undefined)
}

/// Global property: writable, non-enumerable, configurable
pub(crate) fn define_global(interp: &mut Interpreter, name: &str, value: JsValue) {
    let global = interp.global.cheap_clone();
    interp.define_hidden(&global, name, value);
}

/// Wire `ctor.prototype` (fixed) and `prototype.constructor` (hidden)
pub(crate) fn link_constructor(interp: &mut Interpreter, ctor: &JsObjectRef, prototype: &JsObjectRef) {
    let prototype_key = interp.key("prototype");
    ctor.borrow_mut().define_property(
        prototype_key,
        Property::with_attributes(JsValue::Object(prototype.cheap_clone()), false, false, false),
    );
    interp.define_hidden(prototype, "constructor", JsValue::Object(ctor.cheap_clone()));
}

/// Populate the realm: prototypes first, then constructors and namespace
/// objects on the global object
pub fn install(interp: &mut Interpreter) {
    let empty = interp.intern("");
    let function_prototype = interp.intrinsics.function_prototype.cheap_clone();
    interp.define_function_metadata(&function_prototype, empty, 0.0);
    let values = interp.intern("values");
    let array_values = interp.intrinsics.array_values.cheap_clone();
    interp.define_function_metadata(&array_values, values, 0.0);

    init_object_prototype(interp);
    init_function_prototype(interp);
    init_array_prototype(interp);
    init_iterator_prototypes(interp);
    init_string_prototype(interp);
    init_number_prototype(interp);
    init_boolean_prototype(interp);
    init_bigint_prototype(interp);
    init_symbol_prototype(interp);

    let object_constructor = create_object_constructor(interp);
    define_global(interp, "Object", JsValue::Object(object_constructor));

    let function_constructor = create_function_constructor(interp);
    define_global(interp, "Function", JsValue::Object(function_constructor));

    let array_constructor = create_array_constructor(interp);
    define_global(interp, "Array", JsValue::Object(array_constructor));

    let string_constructor = create_string_constructor(interp);
    define_global(interp, "String", JsValue::Object(string_constructor));

    let number_constructor = create_number_constructor(interp);
    define_global(interp, "Number", JsValue::Object(number_constructor));

    let boolean_constructor = create_boolean_constructor(interp);
    define_global(interp, "Boolean", JsValue::Object(boolean_constructor));

    let bigint_constructor = create_bigint_constructor(interp);
    define_global(interp, "BigInt", JsValue::Object(bigint_constructor));

    let symbol_constructor = create_symbol_constructor(interp);
    define_global(interp, "Symbol", JsValue::Object(symbol_constructor));

    init_error(interp);

    let math = create_math_object(interp);
    define_global(interp, "Math", JsValue::Object(math));

    let json = create_json_object(interp);
    define_global(interp, "JSON", JsValue::Object(json));

    #[cfg(feature = "console")]
    {
        let console = create_console_object(interp);
        define_global(interp, "console", JsValue::Object(console));
    }

    register_global_functions(interp);
}

/// Wrapper object for `new Boolean(..)`, `new Number(..)` and `new String(..)`,
/// taking its prototype from `new_target`
pub(crate) fn create_primitive_wrapper(
    interp: &mut Interpreter,
    value: JsValue,
    new_target: &JsObjectRef,
    default_proto: JsObjectRef,
) -> Result<JsValue, JsError> {
    let proto = interp.get_prototype_from_constructor(new_target, default_proto)?;
    let obj = interp.create_object_with_proto(Some(proto));
    obj.borrow_mut().exotic = ExoticObject::Primitive(value);
    Ok(JsValue::Object(obj))
}
