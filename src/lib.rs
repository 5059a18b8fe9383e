//! Bytecode compiler and stack-based interpreter core for the Fur
//! scripting language.
//!
//! This crate covers three pieces: the bytecode module ([`code`],
//! [`opcode`]), the tree-walking compiler ([`compiler`]) that lowers a
//! caller-supplied [`ast::Node`] into a [`code::Code`], and the
//! stack-based interpreter ([`interpreter`]) that executes it. Scanning,
//! parsing source text into an `ast::Node`, a REPL, and a disassembler are
//! all out of scope; a caller builds its own `ast::Node` tree and drives
//! compilation and execution through [`Runtime`].

pub mod ast;
pub mod code;
pub mod compiler;
pub mod consts;
pub mod error;
pub mod interpreter;
pub mod object;
pub mod opcode;
mod runtime;
pub mod symbol;
pub mod value;

pub use runtime::Runtime;

/// Re-exports of the crate's public surface, for `use fur_vm::prelude::*;`.
pub mod prelude {
    pub use crate::ast::Node;
    pub use crate::code::Code;
    pub use crate::compiler::Compiler;
    pub use crate::error::{CompileError, FurError, RuntimeError};
    pub use crate::interpreter::Thread;
    pub use crate::value::Value;
    pub use crate::Runtime;
}
