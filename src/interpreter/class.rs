//! Class definition evaluation and instance element initialization

use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::{ExecutionContext, Interpreter};
use crate::ast::{ClassMember, ClassNode, MethodKind, PropertyName};
use crate::error::JsError;
use crate::value::{
    CheapClone, ClassElement, FieldKey, JsFunction, JsObjectRef, JsString, JsValue,
    PrivateElement, PrivateEnvironment, PrivateName, Property,
};

/// Static element, run in source order once the class is wired up
enum StaticElement {
    Field {
        key: FieldKey,
        initializer: Option<JsObjectRef>,
    },
    Block(JsObjectRef),
}

/// Add a private method or accessor half to `list`, pairing a getter with
/// a setter of the same name
fn push_private_method(list: &mut Vec<(PrivateName, PrivateElement)>, name: PrivateName, element: PrivateElement) {
    let existing = list.iter_mut().find(|(n, _)| *n == name);
    match (existing, element) {
        (
            Some((_, PrivateElement::Accessor { getter, setter })),
            PrivateElement::Accessor {
                getter: new_getter,
                setter: new_setter,
            },
        ) => {
            if new_getter.is_some() {
                *getter = new_getter;
            }
            if new_setter.is_some() {
                *setter = new_setter;
            }
        }
        (_, element) => list.push((name, element)),
    }
}

/// Interpreted closure behind a function object
fn closure_of(func: &JsObjectRef) -> Option<Rc<crate::value::Closure>> {
    match func.borrow().as_function() {
        Some(JsFunction::Interpreted(closure)) => Some(Rc::clone(closure)),
        _ => None,
    }
}

impl Interpreter {
    /// ClassDefinitionEvaluation. `name` is the inferred name of an
    /// anonymous class expression.
    pub(crate) fn evaluate_class(
        &mut self,
        node: &Rc<ClassNode>,
        ctx: &ExecutionContext,
        name: Option<JsString>,
    ) -> Result<JsValue, JsError> {
        let binding_name = node.name.as_ref().map(|id| id.name.cheap_clone());
        let class_name = match binding_name.clone().or(name) {
            Some(name) => name,
            None => self.intern(""),
        };

        let class_env = self.envs.alloc_declarative(ctx.env);
        if let Some(binding) = &binding_name {
            self.envs.create_immutable_binding(class_env, binding.cheap_clone())?;
        }

        let mut names: FxHashMap<JsString, PrivateName> = FxHashMap::default();
        for member in &node.members {
            if let ClassMember::Method {
                key: PropertyName::Private(n),
                ..
            }
            | ClassMember::Field {
                key: PropertyName::Private(n),
                ..
            } = member
            {
                names
                    .entry(n.cheap_clone())
                    .or_insert_with(|| PrivateName::new(n.cheap_clone()));
            }
        }
        let private_env = if names.is_empty() {
            ctx.private_env.clone()
        } else {
            Some(Rc::new(PrivateEnvironment {
                outer: ctx.private_env.clone(),
                names,
            }))
        };

        // The heritage sees the class binding (in its dead zone) but not the
        // class's own private names
        let heritage_ctx = ExecutionContext {
            env: class_env,
            strict: true,
            ..ctx.clone()
        };
        let (proto_parent, ctor_parent) = match &node.super_class {
            None => (
                Some(self.intrinsics.object_prototype.cheap_clone()),
                self.intrinsics.function_prototype.cheap_clone(),
            ),
            Some(expr) => {
                let superclass = self.evaluate(expr, &heritage_ctx)?;
                match &superclass {
                    JsValue::Null => (None, self.intrinsics.function_prototype.cheap_clone()),
                    JsValue::Object(parent) if parent.borrow().is_constructor() => {
                        match self.get_named(&superclass, "prototype")? {
                            JsValue::Object(p) => (Some(p), parent.cheap_clone()),
                            JsValue::Null => (None, parent.cheap_clone()),
                            other => {
                                return Err(JsError::type_error(format!(
                                    "Class extends value does not have valid prototype property {}",
                                    other.describe()
                                )));
                            }
                        }
                    }
                    other => {
                        return Err(JsError::type_error(format!(
                            "Class extends value {} is not a constructor or null",
                            other.describe()
                        )));
                    }
                }
            }
        };

        let class_ctx = ExecutionContext {
            private_env: private_env.clone(),
            ..heritage_ctx
        };
        let proto = self.create_object_with_proto(proto_parent);
        let ctor = self.create_function_object(
            &node.constructor,
            class_env,
            private_env.clone(),
            Some(proto.cheap_clone()),
            class_name,
        );
        ctor.borrow_mut().prototype = Some(ctor_parent);
        let prototype_key = self.key("prototype");
        ctor.borrow_mut().define_property(
            prototype_key,
            Property::with_attributes(JsValue::Object(proto.cheap_clone()), false, false, false),
        );
        self.define_hidden(&proto, "constructor", JsValue::Object(ctor.cheap_clone()));

        let mut instance_methods: Vec<(PrivateName, PrivateElement)> = Vec::new();
        let mut static_methods: Vec<(PrivateName, PrivateElement)> = Vec::new();
        let mut instance_fields: Vec<ClassElement> = Vec::new();
        let mut static_elements: Vec<StaticElement> = Vec::new();

        for member in &node.members {
            match member {
                ClassMember::Method {
                    key,
                    kind,
                    is_static,
                    function,
                    ..
                } => {
                    let home = if *is_static { &ctor } else { &proto };
                    if let PropertyName::Private(n) = key {
                        let private_name = self.resolve_private_name(n, &class_ctx)?;
                        let base = self.intern(&format!("#{}", n));
                        let fn_name = self.method_name(&base, *kind);
                        let closure = self.create_function_object(
                            function,
                            class_env,
                            private_env.clone(),
                            Some(home.cheap_clone()),
                            fn_name,
                        );
                        let element = match kind {
                            MethodKind::Method => PrivateElement::Method(closure),
                            MethodKind::Get => PrivateElement::Accessor {
                                getter: Some(closure),
                                setter: None,
                            },
                            MethodKind::Set => PrivateElement::Accessor {
                                getter: None,
                                setter: Some(closure),
                            },
                        };
                        let list = if *is_static {
                            &mut static_methods
                        } else {
                            &mut instance_methods
                        };
                        push_private_method(list, private_name, element);
                        continue;
                    }

                    let key = self.evaluate_property_name(key, &class_ctx)?;
                    let fn_name = self.method_name(&key.to_function_name(), *kind);
                    let closure = self.create_function_object(
                        function,
                        class_env,
                        private_env.clone(),
                        Some(home.cheap_clone()),
                        fn_name,
                    );
                    let target = home.cheap_clone();
                    self.define_method_property(&target, key, *kind, closure, false)?;
                }
                ClassMember::Field {
                    key,
                    is_static,
                    initializer,
                    ..
                } => {
                    let home = if *is_static { &ctor } else { &proto };
                    let (field_key, init_name) = match key {
                        PropertyName::Private(n) => {
                            let private_name = self.resolve_private_name(n, &class_ctx)?;
                            (FieldKey::Private(private_name), self.intern(&format!("#{}", n)))
                        }
                        other => {
                            let key = self.evaluate_property_name(other, &class_ctx)?;
                            let name = key.to_function_name();
                            (FieldKey::Public(key), name)
                        }
                    };
                    let initializer = initializer.as_ref().map(|init| {
                        self.create_function_object(
                            init,
                            class_env,
                            private_env.clone(),
                            Some(home.cheap_clone()),
                            init_name,
                        )
                    });
                    if *is_static {
                        static_elements.push(StaticElement::Field {
                            key: field_key,
                            initializer,
                        });
                    } else {
                        instance_fields.push(ClassElement::Field {
                            key: field_key,
                            initializer,
                        });
                    }
                }
                ClassMember::StaticBlock { body, .. } => {
                    let empty = self.intern("");
                    let block = self.create_function_object(
                        body,
                        class_env,
                        private_env.clone(),
                        Some(ctor.cheap_clone()),
                        empty,
                    );
                    static_elements.push(StaticElement::Block(block));
                }
            }
        }

        if let Some(binding) = &binding_name {
            self.envs
                .initialize_binding(class_env, binding.as_str(), JsValue::Object(ctor.cheap_clone()))?;
        }

        if let Some(closure) = closure_of(&ctor) {
            let mut elements = closure.instance_elements.borrow_mut();
            elements.extend(
                instance_methods
                    .into_iter()
                    .map(|(name, element)| ClassElement::PrivateMethod { name, element }),
            );
            elements.extend(instance_fields);
        }

        {
            let mut c = ctor.borrow_mut();
            for (name, element) in static_methods {
                c.private_elements.insert(name, element);
            }
        }

        let receiver = JsValue::Object(ctor.cheap_clone());
        for element in static_elements {
            match element {
                StaticElement::Field { key, initializer } => {
                    let value = match initializer {
                        Some(init) => self.call_function(&JsValue::Object(init), receiver.cheap_clone(), &[])?,
                        None => JsValue::Undefined,
                    };
                    self.define_field(&ctor, &key, value)?;
                }
                StaticElement::Block(block) => {
                    self.call_function(&JsValue::Object(block), receiver.cheap_clone(), &[])?;
                }
            }
        }

        Ok(JsValue::Object(ctor))
    }

    /// InitializeInstanceElements: private methods first, then fields in
    /// declaration order
    pub(crate) fn initialize_instance_elements(
        &mut self,
        instance: &JsObjectRef,
        ctor: &JsObjectRef,
    ) -> Result<(), JsError> {
        let Some(closure) = closure_of(ctor) else {
            return Ok(());
        };
        let elements = closure.instance_elements.borrow().clone();
        let receiver = JsValue::Object(instance.cheap_clone());

        for element in elements {
            match element {
                ClassElement::PrivateMethod { name, element } => {
                    if instance.borrow().private_elements.contains_key(&name) {
                        return Err(JsError::type_error(format!(
                            "Cannot initialize private methods of class twice on the same object (#{})",
                            name.description()
                        )));
                    }
                    instance.borrow_mut().private_elements.insert(name, element);
                }
                ClassElement::Field { key, initializer } => {
                    let value = match initializer {
                        Some(init) => self.call_function(&JsValue::Object(init), receiver.cheap_clone(), &[])?,
                        None => JsValue::Undefined,
                    };
                    self.define_field(instance, &key, value)?;
                }
            }
        }
        Ok(())
    }

    /// DefineField
    fn define_field(&mut self, target: &JsObjectRef, key: &FieldKey, value: JsValue) -> Result<(), JsError> {
        match key {
            FieldKey::Public(key) => self.create_data_property_or_throw(target, key.clone(), value),
            FieldKey::Private(name) => {
                if target.borrow().private_elements.contains_key(name) {
                    return Err(JsError::type_error(format!(
                        "Cannot initialize #{} twice on the same object",
                        name.description()
                    )));
                }
                target
                    .borrow_mut()
                    .private_elements
                    .insert(name.clone(), PrivateElement::Field(value));
                Ok(())
            }
        }
    }
}
