//! Mark-and-sweep reclamation of environment records.
//!
//! Objects are reference counted (`Rc<RefCell<JsObject>>`), so most garbage
//! disappears on its own. What reference counting cannot free are cycles that
//! run through the environment arena: a closure stored in a binding of the
//! environment it captured, or a function whose `prototype.constructor`
//! points back at it. The collector finds the records no longer reachable and
//! releases them, then clears the unreachable objects hanging off them so the
//! remaining `Rc` cycles fall apart.
//!
//! Roots:
//! - the global environment and every in-flight frame environment
//! - the global object, the intrinsics and the template object cache
//! - script functions the host still holds
//!
//! Host-held functions are not registered anywhere, so they are found by
//! trial deletion: every function object that is alive but unmarked is a
//! candidate, as is everything reachable from it or from an unmarked
//! environment. A candidate whose strong count exceeds the references coming
//! from other candidates is held from outside the heap.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::rc::Rc;

use crate::environment::{EnvId, Environment, EnvironmentArena, EnvironmentKind};
use crate::interpreter::Interpreter;
use crate::value::{
    ClassElement, ExoticObject, JsFunction, JsObject, JsObjectRef, JsValue, PrivateElement, PropertySlot,
};

/// Outcome of one collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GcStats {
    /// Environment records alive after the collection
    pub live: usize,
    /// Environment records released by the collection
    pub collected: usize,
}

// ============================================================================
// Edges
// ============================================================================

/// Outgoing references of a single node
#[derive(Default)]
struct Edges {
    objects: Vec<JsObjectRef>,
    envs: Vec<EnvId>,
}

impl Edges {
    fn value(&mut self, value: &JsValue) {
        if let JsValue::Object(obj) = value {
            self.objects.push(Rc::clone(obj));
        }
    }

    fn object(&mut self, obj: Option<&JsObjectRef>) {
        if let Some(obj) = obj {
            self.objects.push(Rc::clone(obj));
        }
    }

    fn private_element(&mut self, element: &PrivateElement) {
        match element {
            PrivateElement::Field(value) => self.value(value),
            PrivateElement::Method(method) => self.object(Some(method)),
            PrivateElement::Accessor { getter, setter } => {
                self.object(getter.as_ref());
                self.object(setter.as_ref());
            }
        }
    }

    fn of_object(obj: &JsObject) -> Self {
        let mut edges = Edges::default();
        edges.object(obj.prototype.as_ref());

        for prop in obj.properties.values() {
            match &prop.slot {
                PropertySlot::Data { value, .. } => edges.value(value),
                PropertySlot::Accessor { getter, setter } => {
                    edges.object(getter.as_ref());
                    edges.object(setter.as_ref());
                }
            }
        }
        for element in obj.private_elements.values() {
            edges.private_element(element);
        }

        match &obj.exotic {
            ExoticObject::Function(JsFunction::Interpreted(closure)) => {
                edges.envs.push(closure.env);
                edges.object(closure.home_object.as_ref());
                for element in closure.instance_elements.borrow().iter() {
                    match element {
                        ClassElement::Field { initializer, .. } => edges.object(initializer.as_ref()),
                        ClassElement::PrivateMethod { element, .. } => edges.private_element(element),
                    }
                }
            }
            ExoticObject::Function(JsFunction::Bound(bound)) => {
                edges.object(Some(&bound.target));
                edges.value(&bound.this);
                for arg in &bound.args {
                    edges.value(arg);
                }
            }
            ExoticObject::Primitive(value) => edges.value(value),
            ExoticObject::ArrayIterator(state) => {
                if let Some(target) = &state.target {
                    edges.value(target);
                }
            }
            ExoticObject::Function(JsFunction::Native(_))
            | ExoticObject::Ordinary
            | ExoticObject::Array { .. }
            | ExoticObject::Error
            | ExoticObject::Arguments => {}
        }
        edges
    }

    fn of_env(env: &Environment) -> Self {
        let mut edges = Edges::default();
        if let Some(outer) = env.outer {
            edges.envs.push(outer);
        }
        for binding in env.bindings.values() {
            edges.value(&binding.value);
        }
        match &env.kind {
            EnvironmentKind::Declarative => {}
            EnvironmentKind::Function(scope) => {
                if let Some(this) = &scope.this_value {
                    edges.value(this);
                }
                edges.object(Some(&scope.function));
                edges.object(scope.home_object.as_ref());
                edges.object(scope.new_target.as_ref());
            }
            EnvironmentKind::Global { object } => edges.object(Some(object)),
        }
        edges
    }
}

fn object_id(obj: &JsObjectRef) -> usize {
    Rc::as_ptr(obj) as usize
}

// ============================================================================
// Mark
// ============================================================================

struct Marker<'a> {
    arena: &'a EnvironmentArena,
    marked_envs: FxHashSet<EnvId>,
    marked_objects: FxHashSet<usize>,
    object_stack: Vec<JsObjectRef>,
    env_stack: Vec<EnvId>,
}

impl<'a> Marker<'a> {
    fn new(arena: &'a EnvironmentArena) -> Self {
        Self {
            arena,
            marked_envs: FxHashSet::default(),
            marked_objects: FxHashSet::default(),
            object_stack: Vec::new(),
            env_stack: Vec::new(),
        }
    }

    fn is_marked(&self, obj: &JsObjectRef) -> bool {
        self.marked_objects.contains(&object_id(obj))
    }

    /// Trace everything reachable from the pushed roots
    fn drain(&mut self) {
        loop {
            if let Some(obj) = self.object_stack.pop() {
                if !self.marked_objects.insert(object_id(&obj)) {
                    continue;
                }
                let edges = Edges::of_object(&obj.borrow());
                self.push(edges);
            } else if let Some(id) = self.env_stack.pop() {
                if !self.marked_envs.insert(id) {
                    continue;
                }
                // Stale ids (already released) have nothing to trace
                if let Ok(env) = self.arena.get(id) {
                    let edges = Edges::of_env(env);
                    self.push(edges);
                }
            } else {
                break;
            }
        }
    }

    fn push(&mut self, edges: Edges) {
        self.object_stack
            .extend(edges.objects.into_iter().filter(|o| !self.marked_objects.contains(&object_id(o))));
        self.env_stack
            .extend(edges.envs.into_iter().filter(|e| !self.marked_envs.contains(e)));
    }
}

/// Unmarked part of the heap reachable from unmarked script functions and
/// unmarked environments, with the number of references each object
/// receives from inside that part
struct Candidates {
    objects: FxHashMap<usize, (JsObjectRef, usize)>,
}

impl Candidates {
    fn gather(marker: &Marker<'_>, functions: Vec<JsObjectRef>) -> Self {
        let mut objects: FxHashMap<usize, (JsObjectRef, usize)> = FxHashMap::default();
        let mut seen_envs: FxHashSet<EnvId> = FxHashSet::default();
        let mut object_work: Vec<JsObjectRef> = Vec::new();
        let mut env_work: Vec<EnvId> = Vec::new();

        // Unreachable records still hold references (a finished call's
        // function binding, for one), which count as internal
        for id in marker.arena.live_ids() {
            if !marker.marked_envs.contains(&id) && seen_envs.insert(id) {
                env_work.push(id);
            }
        }

        for func in functions {
            let id = object_id(&func);
            if !marker.is_marked(&func) && !objects.contains_key(&id) {
                object_work.push(Rc::clone(&func));
                objects.insert(id, (func, 0));
            }
        }

        loop {
            let edges = if let Some(obj) = object_work.pop() {
                Edges::of_object(&obj.borrow())
            } else if let Some(id) = env_work.pop() {
                match marker.arena.get(id) {
                    Ok(env) => Edges::of_env(env),
                    Err(_) => continue,
                }
            } else {
                break;
            };

            for child in edges.objects {
                if marker.is_marked(&child) {
                    continue;
                }
                match objects.get_mut(&object_id(&child)) {
                    Some((_, internal)) => *internal += 1,
                    None => {
                        object_work.push(Rc::clone(&child));
                        objects.insert(object_id(&child), (child, 1));
                    }
                }
            }
            for env in edges.envs {
                if !marker.marked_envs.contains(&env) && seen_envs.insert(env) {
                    env_work.push(env);
                }
            }
        }

        Self { objects }
    }

    /// Candidates referenced from outside the candidate set. The map holds
    /// one strong reference to each candidate itself.
    fn externally_held(&self) -> Vec<JsObjectRef> {
        self.objects
            .values()
            .filter(|(obj, internal)| Rc::strong_count(obj) > internal + 1)
            .map(|(obj, _)| Rc::clone(obj))
            .collect()
    }
}

/// Run a full collection over the interpreter's environment arena
pub fn collect(interp: &mut Interpreter) -> GcStats {
    let before = interp.envs.live_count();

    let functions: Vec<JsObjectRef> = interp.closures.iter().filter_map(|weak| weak.upgrade()).collect();

    let (marked_envs, garbage) = {
        let mut marker = Marker::new(&interp.envs);

        // Roots
        marker.env_stack.push(interp.global_env);
        marker.env_stack.extend(interp.frame_roots.iter().copied());
        marker.object_stack.push(Rc::clone(&interp.global));
        marker
            .object_stack
            .extend(interp.intrinsics.all().into_iter().map(Rc::clone));
        marker
            .object_stack
            .extend(interp.template_cache.values().map(|(_, obj)| Rc::clone(obj)));
        marker.drain();

        // Functions still held by the host keep their environments alive
        let candidates = Candidates::gather(&marker, functions);
        marker.object_stack.extend(candidates.externally_held());
        marker.drain();

        let garbage: Vec<JsObjectRef> = candidates
            .objects
            .into_values()
            .map(|(obj, _)| obj)
            .filter(|obj| !marker.is_marked(obj))
            .collect();
        (marker.marked_envs, garbage)
    };

    // Sweep environments. Dropping a record's bindings releases whatever
    // closures it kept alive.
    let mut collected = 0;
    for id in interp.envs.live_ids() {
        if !marked_envs.contains(&id) && interp.envs.release(id).is_some() {
            collected += 1;
        }
    }

    // Break object cycles among the unreachable objects
    for obj in &garbage {
        let mut o = obj.borrow_mut();
        o.properties.clear();
        o.private_elements.clear();
        o.prototype = None;
        if let ExoticObject::Function(JsFunction::Interpreted(closure)) = &o.exotic {
            closure.instance_elements.borrow_mut().clear();
        }
    }
    drop(garbage);

    interp.closures.retain(|weak| weak.strong_count() > 0);

    let stats = GcStats {
        live: interp.envs.live_count(),
        collected,
    };
    tracing::debug!(
        before,
        live = stats.live,
        collected = stats.collected,
        "environment collection"
    );
    stats
}

// ============================================================================
// Tests
// ============================================================================
