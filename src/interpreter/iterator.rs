//! Iterator protocol: opening, stepping and closing iterators, plus the
//! key snapshot `for-in` walks

use rustc_hash::FxHashSet;

use super::Interpreter;
use crate::error::JsError;
use crate::value::{CheapClone, JsObjectRef, JsValue, PropertyKey};

/// Which protocol `get_iterator` opens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IteratorHint {
    Sync,
    Async,
}

/// An open iterator
#[derive(Clone)]
pub struct IteratorRecord {
    pub iterator: JsValue,
    pub next_method: JsValue,
    /// Set once the iterator reported completion or threw
    pub done: bool,
    /// `next`/`return` results go through the await handler
    pub is_async: bool,
    /// Async iteration over a sync iterator: each produced value is awaited
    pub from_sync: bool,
}

impl Interpreter {
    /// GetIterator
    pub fn get_iterator(&mut self, value: &JsValue, hint: IteratorHint) -> Result<IteratorRecord, JsError> {
        if hint == IteratorHint::Async {
            let key = PropertyKey::Symbol(self.symbols.async_iterator.cheap_clone());
            if let Some(method) = self.get_method(value, &key)? {
                let mut record = self.open_iterator(value, &method)?;
                record.is_async = true;
                return Ok(record);
            }
            let mut record = self.get_iterator(value, IteratorHint::Sync)?;
            record.from_sync = true;
            return Ok(record);
        }

        let key = PropertyKey::Symbol(self.symbols.iterator.cheap_clone());
        let method = if value.is_nullish() {
            None
        } else {
            self.get_method(value, &key)?
        };
        match method {
            Some(method) => self.open_iterator(value, &method),
            None => Err(JsError::type_error(format!("{} is not iterable", value.describe()))),
        }
    }

    fn open_iterator(&mut self, value: &JsValue, method: &JsValue) -> Result<IteratorRecord, JsError> {
        let iterator = self.call_function(method, value.cheap_clone(), &[])?;
        if !iterator.is_object() {
            return Err(JsError::type_error("Result of the Symbol.iterator method is not an object"));
        }
        let next_method = self.get_named(&iterator, "next")?;
        Ok(IteratorRecord {
            iterator,
            next_method,
            done: false,
            is_async: false,
            from_sync: false,
        })
    }

    /// IteratorNext: the raw result object
    fn iterator_next(&mut self, record: &IteratorRecord) -> Result<JsValue, JsError> {
        let mut result = self.call_function(&record.next_method, record.iterator.cheap_clone(), &[])?;
        if record.is_async {
            result = self.await_value(result)?;
        }
        if !result.is_object() {
            return Err(JsError::type_error(format!(
                "Iterator result {} is not an object",
                result.describe()
            )));
        }
        Ok(result)
    }

    /// IteratorStepValue: the next value, or `None` once done. Any error
    /// marks the record done so callers do not try to close it.
    pub fn iterator_step_value(&mut self, record: &mut IteratorRecord) -> Result<Option<JsValue>, JsError> {
        if record.done {
            return Ok(None);
        }
        let step = self.iterator_next(record).and_then(|result| {
            let done = self.get_named(&result, "done")?.to_boolean();
            if done {
                return Ok(None);
            }
            self.get_named(&result, "value").map(Some)
        });
        match step {
            Ok(Some(value)) => {
                if record.from_sync {
                    return self.await_value(value).map(Some);
                }
                Ok(Some(value))
            }
            Ok(None) => {
                record.done = true;
                Ok(None)
            }
            Err(error) => {
                record.done = true;
                Err(error)
            }
        }
    }

    /// IteratorClose for a normal or break/return exit: errors from
    /// `return` propagate
    pub fn iterator_close(&mut self, record: &IteratorRecord) -> Result<(), JsError> {
        let key = self.key("return");
        let Some(method) = self.get_method(&record.iterator, &key)? else {
            return Ok(());
        };
        let mut result = self.call_function(&method, record.iterator.cheap_clone(), &[])?;
        if record.is_async {
            result = self.await_value(result)?;
        }
        if !result.is_object() {
            return Err(JsError::type_error(format!(
                "Iterator result {} is not an object",
                result.describe()
            )));
        }
        Ok(())
    }

    /// IteratorClose for a throw exit: the original error wins, so
    /// anything `return` does wrong is dropped
    pub fn iterator_close_after_throw(&mut self, record: &IteratorRecord) {
        if let Err(error) = self.iterator_close(record) {
            tracing::trace!(error = %error, "iterator close error superseded by throw");
        }
    }

    /// Drain an iterable into a vector (spread, `Array.from`)
    pub fn iterate_to_vec(&mut self, value: &JsValue) -> Result<Vec<JsValue>, JsError> {
        let mut record = self.get_iterator(value, IteratorHint::Sync)?;
        let mut values = Vec::new();
        while let Some(value) = self.iterator_step_value(&mut record)? {
            values.push(value);
        }
        Ok(values)
    }

    /// Enumerable string keys of `obj` and its prototypes, each name once.
    /// A non-enumerable own property still hides the same name further up.
    pub fn for_in_keys(&self, obj: &JsObjectRef) -> Vec<PropertyKey> {
        let mut seen: FxHashSet<PropertyKey> = FxHashSet::default();
        let mut keys = Vec::new();
        let mut current = Some(obj.cheap_clone());
        while let Some(o) = current {
            let o_ref = o.borrow();
            for key in o_ref.own_keys() {
                if key.is_symbol() || !seen.insert(key.clone()) {
                    continue;
                }
                if o_ref.get_own_property(&key).is_some_and(|p| p.enumerable) {
                    keys.push(key);
                }
            }
            current = o_ref.prototype.clone();
        }
        keys
    }
}
