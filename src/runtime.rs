//! The long-lived container an embedder holds: the shared symbol table,
//! the native registry, and the I/O sinks natives read and write through.

use std::io::{self, BufRead, BufReader, Write};

use crate::ast::Node;
use crate::code::Code;
use crate::compiler::Compiler;
use crate::error::FurError;
use crate::interpreter::natives::NativeRegistry;
use crate::interpreter::Thread;
use crate::symbol::{Symbol, SymbolTable};
use crate::value::Value;

/// Owns everything that outlives a single [`Thread`] run: the symbol
/// table, the fixed native registry, and the configured I/O sinks.
///
/// Input is kept behind a persistent [`BufRead`] rather than re-wrapping a
/// raw reader on every `input()` call, so bytes a prior read buffered ahead
/// of the line it returned aren't dropped on the floor.
pub struct Runtime {
    symbols: SymbolTable,
    natives: NativeRegistry,
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
}

impl Runtime {
    /// A runtime wired to process stdin/stdout.
    pub fn new() -> Self {
        Self::with_io(Box::new(io::stdin()), Box::new(io::stdout()))
    }

    /// A runtime with caller-supplied I/O sinks, for tests and embedders
    /// that don't want `print`/`input` touching process stdio.
    pub fn with_io(input: impl io::Read + 'static, output: Box<dyn Write>) -> Self {
        Self {
            symbols: SymbolTable::new(),
            natives: NativeRegistry::new(),
            input: Box::new(BufReader::new(input)),
            output,
        }
    }

    pub fn get_symbol(&mut self, name: &[u8]) -> Symbol {
        self.symbols.get_symbol(name)
    }

    pub fn natives(&self) -> &NativeRegistry {
        &self.natives
    }

    pub fn input_mut(&mut self) -> &mut dyn BufRead {
        self.input.as_mut()
    }

    pub fn output_mut(&mut self) -> &mut dyn Write {
        self.output.as_mut()
    }

    /// Creates a fresh thread borrowing this runtime's natives and I/O.
    pub fn thread(&mut self) -> Thread<'_> {
        Thread::new(self)
    }

    /// Compiles `tree` and runs it to completion in one call, the single
    /// fallible entry point an embedder that isn't managing `Code` objects
    /// itself needs.
    pub fn compile_and_run(&mut self, tree: &Node) -> Result<Value, FurError> {
        let mut code = Code::new();
        let start = Compiler::new().compile(tree, &mut code, self, true)?;
        let code = std::rc::Rc::new(code);
        Ok(self.thread().run(code, start)?)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
