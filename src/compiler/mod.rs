//! The tree-walking compiler: lowers a parsed [`crate::ast::Node`] into a
//! [`Code`] module.

mod emit;

use crate::ast::Node;
use crate::code::Code;
use crate::consts::MAX_SYMBOLSTACK_DEPTH;
use crate::error::CompileError;
use crate::opcode::Opcode;
use crate::runtime::Runtime;
use crate::symbol::Symbol;

/// Compiles one syntax tree into bytecode. Holds the compile-time symbol
/// stack that mirrors the runtime value stack, so every `GET`/`SET` can be
/// resolved to an absolute slot at compile time. A fresh `Compiler` is used
/// per function body (closures have their own independent slot numbering
/// starting at zero); there are no captured upvalues to thread through.
pub struct Compiler {
    symbol_stack: Vec<Symbol>,
}

impl Compiler {
    pub fn new() -> Self {
        Self { symbol_stack: Vec::new() }
    }

    /// A compiler pre-seeded with `params` occupying slots `0..params.len()`,
    /// used to compile a function body where the arguments are already on
    /// the stack when the body starts executing.
    fn with_params(params: Vec<Symbol>) -> Self {
        Self { symbol_stack: params }
    }

    /// Emits `tree`'s instructions into `code`, appends a trailing
    /// `RETURN`, and returns the offset of the first emitted byte.
    pub fn compile(
        &mut self,
        tree: &Node,
        code: &mut Code,
        runtime: &mut Runtime,
        emit_return: bool,
    ) -> Result<usize, CompileError> {
        let start = code.current();
        emit::emit_node(self, tree, code, runtime, emit_return)?;
        code.append(Opcode::Return as u8, tree.line());
        Ok(start)
    }

    fn resolve_local(&self, symbol: &Symbol) -> Option<u8> {
        self.symbol_stack
            .iter()
            .enumerate()
            .rev()
            .find(|(_, s)| *s == symbol)
            .map(|(i, _)| i as u8)
    }

    fn declare_local(&mut self, symbol: Symbol, line: u32) -> Result<u8, CompileError> {
        if self.symbol_stack.len() >= MAX_SYMBOLSTACK_DEPTH {
            return Err(CompileError::TooManyLocals { line });
        }
        let slot = self.symbol_stack.len() as u8;
        self.symbol_stack.push(symbol);
        Ok(slot)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}
