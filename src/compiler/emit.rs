//! Per-node-type emission rules, including the "emit_return" contract:
//! every node accepts a flag saying whether the enclosing context consumes
//! its value. Atoms elide their push entirely when it is unwanted; calls
//! (the only source of externally visible side effects) emit a trailing
//! `DROP` instead, so their side effects still happen even when unused.

use std::rc::Rc;

use crate::ast::Node;
use crate::code::Code;
use crate::error::CompileError;
use crate::object::{Obj, ObjClosure, ObjString};
use crate::opcode::Opcode;
use crate::runtime::Runtime;

use super::Compiler;

pub(super) fn emit_node(
    c: &mut Compiler,
    node: &Node,
    code: &mut Code,
    runtime: &mut Runtime,
    emit_return: bool,
) -> Result<(), CompileError> {
    let line = node.line();
    match node {
        Node::Nil { .. } => {
            if emit_return {
                code.append(Opcode::Nil as u8, line);
            }
        }
        Node::True { .. } => {
            if emit_return {
                code.append(Opcode::True as u8, line);
            }
        }
        Node::False { .. } => {
            if emit_return {
                code.append(Opcode::False as u8, line);
            }
        }

        Node::Number { text, .. } => {
            if emit_return {
                let value: i32 = text
                    .parse()
                    .map_err(|_| CompileError::UnsupportedSyntax { line })?;
                code.append(Opcode::Integer as u8, line);
                code.append_i32(value, line);
            }
        }

        Node::String { text, .. } => {
            if emit_return {
                let bytes = decode_string_literal(text, line)?;
                let index = code.intern(Obj::String(ObjString::new(bytes)), line)?;
                code.append(Opcode::Intern as u8, line);
                code.append_u8(index, line);
            }
        }

        Node::Identifier { text, .. } => {
            // Resolved even when the value is unwanted: an unknown name is a
            // compile error regardless of whether its value would be used.
            let symbol = runtime.get_symbol(text.as_bytes());
            if let Some(slot) = c.resolve_local(&symbol) {
                if emit_return {
                    code.append(Opcode::Get as u8, line);
                    code.append_u8(slot, line);
                }
            } else if let Some(index) = runtime.natives().index_of(text) {
                if emit_return {
                    code.append(Opcode::Native as u8, line);
                    code.append_u8(index, line);
                }
            } else {
                return Err(CompileError::UnknownIdentifier { name: text.clone(), line });
            }
        }

        Node::Negate { arg, .. } => emit_unary(c, arg, code, runtime, Opcode::Negate, emit_return)?,
        Node::Not { arg, .. } => emit_unary(c, arg, code, runtime, Opcode::Not, emit_return)?,

        // PROP has no runtime semantics beyond popping its operand, so
        // there is no value it could hand back; emit_return is ignored.
        Node::Property { arg, .. } => {
            emit_node(c, arg, code, runtime, true)?;
            code.append(Opcode::Prop as u8, line);
        }

        Node::Add { lhs, rhs, .. } => emit_binary(c, lhs, rhs, code, runtime, Opcode::Add, emit_return)?,
        Node::Subtract { lhs, rhs, .. } => {
            emit_binary(c, lhs, rhs, code, runtime, Opcode::Subtract, emit_return)?
        }
        Node::Multiply { lhs, rhs, .. } => {
            emit_binary(c, lhs, rhs, code, runtime, Opcode::Multiply, emit_return)?
        }
        Node::Divide { lhs, rhs, .. } => {
            emit_binary(c, lhs, rhs, code, runtime, Opcode::Divide, emit_return)?
        }

        Node::Equals { lhs, rhs, .. } => emit_binary(c, lhs, rhs, code, runtime, Opcode::Eq, emit_return)?,
        Node::NotEquals { lhs, rhs, .. } => {
            emit_binary(c, lhs, rhs, code, runtime, Opcode::Neq, emit_return)?
        }
        Node::GreaterThan { lhs, rhs, .. } => {
            emit_binary(c, lhs, rhs, code, runtime, Opcode::Gt, emit_return)?
        }
        Node::LessThan { lhs, rhs, .. } => {
            emit_binary(c, lhs, rhs, code, runtime, Opcode::Lt, emit_return)?
        }
        Node::GreaterThanEquals { lhs, rhs, .. } => {
            emit_binary(c, lhs, rhs, code, runtime, Opcode::Geq, emit_return)?
        }
        Node::LessThanEquals { lhs, rhs, .. } => {
            emit_binary(c, lhs, rhs, code, runtime, Opcode::Leq, emit_return)?
        }

        Node::And { lhs, rhs, .. } => emit_short_circuit(c, lhs, rhs, code, runtime, Opcode::And, emit_return)?,
        Node::Or { lhs, rhs, .. } => emit_short_circuit(c, lhs, rhs, code, runtime, Opcode::Or, emit_return)?,

        Node::Assign { target, value, .. } => emit_assign(c, target, value, code, runtime, emit_return, line)?,

        Node::If { cond, then, else_, .. } => {
            emit_node(c, cond, code, runtime, true)?;
            let patch_false = reserve_jump(code, Opcode::JumpIfFalse, line);
            emit_node(c, then, code, runtime, emit_return)?;
            let patch_end = reserve_jump(code, Opcode::Jump, line);
            let else_target = code.current();
            code.patch_jump(patch_false, else_target, line)?;
            match else_ {
                Some(else_node) => emit_node(c, else_node, code, runtime, emit_return)?,
                None if emit_return => {
                    code.append(Opcode::Nil as u8, line);
                }
                None => {}
            }
            let end = code.current();
            code.patch_jump(patch_end, end, line)?;
        }

        Node::While { cond, body, .. } => {
            let start = code.current();
            emit_node(c, cond, code, runtime, true)?;
            let patch_exit = reserve_jump(code, Opcode::JumpIfFalse, line);
            emit_node(c, body, code, runtime, false)?;
            emit_jump_to(code, line, start);
            let exit = code.current();
            code.patch_jump(patch_exit, exit, line)?;
            if emit_return {
                code.append(Opcode::Nil as u8, line);
            }
        }

        Node::Call { callee, args, .. } => {
            if args.len() > u8::MAX as usize {
                return Err(CompileError::UnsupportedSyntax { line });
            }
            for arg in args {
                emit_node(c, arg, code, runtime, true)?;
            }
            emit_node(c, callee, code, runtime, true)?;
            code.append(Opcode::Call as u8, line);
            code.append_u8(args.len() as u8, line);
            if !emit_return {
                code.append(Opcode::Drop as u8, line);
            }
        }

        Node::FnDef { name, args, body, .. } => emit_fn_def(c, name, args, body, code, runtime, emit_return, line)?,

        // A parser may hand either grouping shape to the compiler; both
        // evaluate their items in order and only the last one's value
        // can escape, so they share the same emission.
        Node::CommaList { items, .. } | Node::ExpressionList { items, .. } => {
            emit_sequence(c, items, code, runtime, emit_return, line)?;
        }
    }
    Ok(())
}

fn emit_sequence(
    c: &mut Compiler,
    items: &[Node],
    code: &mut Code,
    runtime: &mut Runtime,
    emit_return: bool,
    line: u32,
) -> Result<(), CompileError> {
    let Some((last, init)) = items.split_last() else {
        if emit_return {
            code.append(Opcode::Nil as u8, line);
        }
        return Ok(());
    };
    for item in init {
        emit_node(c, item, code, runtime, false)?;
    }
    emit_node(c, last, code, runtime, emit_return)
}

fn emit_unary(
    c: &mut Compiler,
    arg: &Node,
    code: &mut Code,
    runtime: &mut Runtime,
    opcode: Opcode,
    emit_return: bool,
) -> Result<(), CompileError> {
    emit_node(c, arg, code, runtime, emit_return)?;
    if emit_return {
        code.append(opcode as u8, arg.line());
    }
    Ok(())
}

fn emit_binary(
    c: &mut Compiler,
    lhs: &Node,
    rhs: &Node,
    code: &mut Code,
    runtime: &mut Runtime,
    opcode: Opcode,
    emit_return: bool,
) -> Result<(), CompileError> {
    emit_node(c, lhs, code, runtime, emit_return)?;
    emit_node(c, rhs, code, runtime, emit_return)?;
    if emit_return {
        code.append(opcode as u8, rhs.line());
    }
    Ok(())
}

/// `and`/`or` always evaluate their left operand to a real boolean (the
/// short-circuit encoding tests it directly), regardless of whether the
/// surrounding context wants the overall result.
fn emit_short_circuit(
    c: &mut Compiler,
    lhs: &Node,
    rhs: &Node,
    code: &mut Code,
    runtime: &mut Runtime,
    opcode: Opcode,
    emit_return: bool,
) -> Result<(), CompileError> {
    let line = lhs.line();
    emit_node(c, lhs, code, runtime, true)?;
    let patch = reserve_jump(code, opcode, line);
    emit_node(c, rhs, code, runtime, true)?;
    let target = code.current();
    code.patch_jump(patch, target, line)?;
    if !emit_return {
        code.append(Opcode::Drop as u8, line);
    }
    Ok(())
}

fn emit_assign(
    c: &mut Compiler,
    target: &Node,
    value: &Node,
    code: &mut Code,
    runtime: &mut Runtime,
    emit_return: bool,
    line: u32,
) -> Result<(), CompileError> {
    let Node::Identifier { text, .. } = target else {
        return Err(CompileError::InvalidAssignmentTarget { line });
    };
    emit_node(c, value, code, runtime, true)?;
    let symbol = runtime.get_symbol(text.as_bytes());
    match c.resolve_local(&symbol) {
        Some(slot) => {
            code.append(Opcode::Set as u8, line);
            code.append_u8(slot, line);
        }
        None => {
            c.declare_local(symbol, line)?;
        }
    }
    if emit_return {
        code.append(Opcode::Nil as u8, line);
    }
    Ok(())
}

fn emit_fn_def(
    c: &mut Compiler,
    name: &str,
    args: &[String],
    body: &Node,
    code: &mut Code,
    runtime: &mut Runtime,
    emit_return: bool,
    line: u32,
) -> Result<(), CompileError> {
    if args.len() > u8::MAX as usize {
        return Err(CompileError::TooManyLocals { line });
    }
    let params: Vec<_> = args.iter().map(|a| runtime.get_symbol(a.as_bytes())).collect();
    let arity = params.len() as u8;

    let mut fn_code = Code::new();
    let mut inner = Compiler::with_params(params);
    inner.compile(body, &mut fn_code, runtime, true)?;

    let name_symbol = runtime.get_symbol(name.as_bytes());
    let closure = ObjClosure { name: name_symbol.clone(), arity, code: Rc::new(fn_code) };
    let index = code.intern(Obj::Closure(closure), line)?;
    code.append(Opcode::Intern as u8, line);
    code.append_u8(index, line);

    match c.resolve_local(&name_symbol) {
        Some(slot) => {
            code.append(Opcode::Set as u8, line);
            code.append_u8(slot, line);
        }
        None => {
            c.declare_local(name_symbol, line)?;
        }
    }
    if emit_return {
        code.append(Opcode::Nil as u8, line);
    }
    Ok(())
}

/// Emits `opcode` followed by a two-byte placeholder operand, returning the
/// placeholder's offset for a later `patch_jump`.
fn reserve_jump(code: &mut Code, opcode: Opcode, line: u32) -> usize {
    code.append(opcode as u8, line);
    code.append_i16(0, line)
}

fn emit_jump_to(code: &mut Code, line: u32, target: usize) {
    code.append(Opcode::Jump as u8, line);
    let operand_offset = code.append_i16(0, line);
    code.patch_jump(operand_offset, target, line)
        .expect("backward jumps within a single function body fit in i16");
}

/// Strips the surrounding quote characters and resolves `\' \" \\ \n \r \t`.
fn decode_string_literal(text: &str, line: u32) -> Result<Vec<u8>, CompileError> {
    let bytes = text.as_bytes();
    if bytes.len() < 2 || bytes[0] != bytes[bytes.len() - 1] || !matches!(bytes[0], b'\'' | b'"') {
        return Err(CompileError::UnsupportedSyntax { line });
    }
    let body = &bytes[1..bytes.len() - 1];
    let mut out = Vec::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        if body[i] == b'\\' && i + 1 < body.len() {
            let escaped = match body[i + 1] {
                b'\'' => b'\'',
                b'"' => b'"',
                b'\\' => b'\\',
                b'n' => b'\n',
                b'r' => b'\r',
                b't' => b'\t',
                _ => return Err(CompileError::UnsupportedSyntax { line }),
            };
            out.push(escaped);
            i += 2;
        } else {
            out.push(body[i]);
            i += 1;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_common_escapes() {
        assert_eq!(decode_string_literal("'a\\nb'", 1).unwrap(), b"a\nb");
        assert_eq!(decode_string_literal("\"it\\'s\"", 1).unwrap(), b"it's");
    }

    #[test]
    fn rejects_an_unterminated_literal() {
        assert!(decode_string_literal("'abc", 1).is_err());
    }
}
