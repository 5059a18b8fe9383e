//! Error taxonomy for the compiler and interpreter.
//!
//! Compile-time and run-time failures are kept as separate enums since a
//! caller almost always wants to handle "my program is malformed" and "my
//! program crashed" differently; [`FurError`] unifies them for callers that
//! just want one `Result` to propagate with `?`.

use thiserror::Error;

/// Errors raised while lowering a syntax tree into bytecode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("line {line}: unknown identifier '{name}'")]
    UnknownIdentifier { name: String, line: u32 },

    #[error("line {line}: invalid assignment target")]
    InvalidAssignmentTarget { line: u32 },

    #[error("line {line}: constant pool overflow (more than 256 interned constants)")]
    ConstantPoolOverflow { line: u32 },

    #[error("line {line}: jump target out of range for a 16-bit delta")]
    JumpTooFar { line: u32 },

    #[error("line {line}: too many locals live at once (more than 256)")]
    TooManyLocals { line: u32 },

    #[error("line {line}: unsupported syntax")]
    UnsupportedSyntax { line: u32 },
}

/// Errors raised while executing compiled bytecode.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("line {line}: type mismatch, expected {expected}")]
    TypeMismatch { expected: &'static str, line: u32 },

    #[error("line {line}: division by zero")]
    DivideByZero { line: u32 },

    #[error("evaluation stack overflow")]
    StackOverflow,

    #[error("call frame stack overflow")]
    FrameOverflow,

    #[error("unknown opcode {opcode:#04x} at offset {offset}")]
    UnknownOpcode { opcode: u8, offset: usize },

    #[error("line {line}: arity mismatch, expected {expected} arguments, got {got}")]
    ArityMismatch { expected: u8, got: u8, line: u32 },

    #[error("native call failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error type covering both compile-time and run-time failures.
#[derive(Error, Debug)]
pub enum FurError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
