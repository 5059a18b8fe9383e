//! The tagged value type evaluated by the interpreter.

use std::rc::Rc;

use crate::object::Obj;

/// A Fur runtime value. Every variant is cheap to copy: `Obj` is a
/// reference-counted handle, never an owned payload.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Boolean(bool),
    Integer(i32),
    Obj(Rc<Obj>),
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Value::Integer(_))
    }

    pub fn is_obj(&self) -> bool {
        matches!(self, Value::Obj(_))
    }

    /// Truthiness for the conditions of `if`/`while`/`and`/`or`. Only
    /// booleans are permitted here; anything else is a compiler or
    /// interpreter bug surfaced as a [`crate::error::RuntimeError::TypeMismatch`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&crate::object::ObjString> {
        match self {
            Value::Obj(obj) => obj.as_string(),
            _ => None,
        }
    }

    /// Structural-ish equality matching §4.1: values of different variants
    /// are never equal; objects are pointer-equal first (a cheap shortcut
    /// for the common case of comparing a value against itself), then
    /// type-dispatched: strings compare bytewise, natives and closures
    /// compare only by identity.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Obj(a), Value::Obj(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                match (a.as_ref(), b.as_ref()) {
                    (Obj::String(x), Obj::String(y)) => x.bytes == y.bytes,
                    _ => false,
                }
            }
            _ => false,
        }
    }

    /// Canonical textual form. See [`crate::object::ObjString::print_repr`]
    /// for the string quoting rule.
    pub fn print_repr(&self) -> String {
        match self {
            Value::Nil => "nil".to_string(),
            Value::Boolean(true) => "true".to_string(),
            Value::Boolean(false) => "false".to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Obj(obj) => obj.print_repr(),
        }
    }

    /// Plain (non-repr) display used by `print`: strings are emitted
    /// without surrounding quotes.
    pub fn print_plain(&self) -> String {
        match self {
            Value::Obj(obj) => match obj.as_string() {
                Some(s) => s.as_str().to_string(),
                None => obj.print_repr(),
            },
            other => other.print_repr(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjString;

    #[test]
    fn nil_equals_nil() {
        assert!(Value::Nil.equals(&Value::Nil));
    }

    #[test]
    fn different_variants_are_never_equal() {
        assert!(!Value::Integer(0).equals(&Value::Boolean(false)));
        assert!(!Value::Nil.equals(&Value::Integer(0)));
    }

    #[test]
    fn strings_compare_bytewise() {
        let a = Value::Obj(Rc::new(Obj::String(ObjString::new(b"hi".to_vec()))));
        let b = Value::Obj(Rc::new(Obj::String(ObjString::new(b"hi".to_vec()))));
        assert!(a.equals(&b));
    }

    #[test]
    fn print_repr_of_integer_and_booleans() {
        assert_eq!(Value::Integer(-4).print_repr(), "-4");
        assert_eq!(Value::Boolean(true).print_repr(), "true");
        assert_eq!(Value::Nil.print_repr(), "nil");
    }
}
