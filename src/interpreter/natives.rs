//! The fixed table of built-in callables exposed to compiled bytecode.

use crate::error::RuntimeError;
use crate::object::{Obj, ObjString};
use crate::runtime::Runtime;
use crate::value::Value;

/// What a native call produced: a plain `Value` that needs no heap
/// bookkeeping, or a freshly allocated `Obj` the caller must link into the
/// thread heap before it is reachable from the stack.
pub enum NativeOutcome {
    Value(Value),
    Obj(Obj),
}

struct NativeEntry {
    name: &'static str,
}

/// Indexable, compile-time-known table of natives. The compiler matches
/// identifiers against [`NativeRegistry::index_of`] after its local-slot
/// lookup fails; the interpreter dispatches on the resulting index.
pub struct NativeRegistry {
    entries: [NativeEntry; 2],
}

pub const PRINT: u8 = 0;
pub const INPUT: u8 = 1;

impl NativeRegistry {
    pub fn new() -> Self {
        Self {
            entries: [NativeEntry { name: "print" }, NativeEntry { name: "input" }],
        }
    }

    pub fn index_of(&self, name: &str) -> Option<u8> {
        self.entries.iter().position(|e| e.name == name).map(|i| i as u8)
    }

    pub fn name(&self, index: u8) -> &str {
        self.entries[index as usize].name
    }
}

impl Default for NativeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes each argument's plain representation, space-separated, followed
/// by a newline, to the runtime's output sink. Always returns `Nil`.
pub fn call_print(runtime: &mut Runtime, args: &[Value]) -> Result<NativeOutcome, RuntimeError> {
    let rendered: Vec<String> = args.iter().map(Value::print_plain).collect();
    writeln!(runtime.output_mut(), "{}", rendered.join(" "))?;
    Ok(NativeOutcome::Value(Value::Nil))
}

/// Reads one line from the runtime's input sink, returning it (without its
/// trailing newline) as a heap-allocated string, or `Nil` at end of input.
/// The returned `Obj` is not yet linked into any thread's heap; the caller
/// must adopt it before exposing it on the stack.
pub fn call_input(runtime: &mut Runtime) -> Result<NativeOutcome, RuntimeError> {
    let mut line = String::new();
    let read = runtime.input_mut().read_line(&mut line)?;
    if read == 0 {
        return Ok(NativeOutcome::Value(Value::Nil));
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(NativeOutcome::Obj(Obj::String(ObjString::new(line.into_bytes()))))
}
