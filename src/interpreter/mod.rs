//! The stack-based bytecode interpreter.

pub mod frame;
mod log;
pub mod natives;
pub mod ops;
pub mod stack;

use std::rc::Rc;

use crate::code::Code;
use crate::error::RuntimeError;
use crate::object::{Obj, ObjNative};
use crate::opcode::Opcode;
use crate::runtime::Runtime;
use crate::value::Value;

use frame::{Frame, FrameStack};
use stack::ValueStack;

/// Executes compiled [`Code`] against an evaluation stack and a call-frame
/// stack, owning a heap of runtime-allocated objects for the duration of
/// one [`Thread::run`]. Borrows a [`Runtime`] for symbol/native/IO access;
/// nothing here is `Send` or `Sync`, matching the single-threaded,
/// non-yielding execution model.
pub struct Thread<'a> {
    runtime: &'a mut Runtime,
    stack: ValueStack,
    frames: FrameStack,
    heap: Vec<Rc<Obj>>,
    code: Rc<Code>,
    ip: usize,
    fp: usize,
}

impl<'a> Thread<'a> {
    pub fn new(runtime: &'a mut Runtime) -> Self {
        Self {
            runtime,
            stack: ValueStack::new(),
            frames: FrameStack::new(),
            heap: Vec::new(),
            code: Rc::new(Code::new()),
            ip: 0,
            fp: 0,
        }
    }

    /// Links a runtime-allocated object into this thread's heap, then
    /// returns a value wrapping it. Per the heap membership policy, this
    /// must happen before the value is exposed anywhere else (the caller
    /// pushes the returned value onto the stack immediately).
    fn adopt(&mut self, obj: Obj) -> Value {
        let handle = Rc::new(obj);
        self.heap.push(Rc::clone(&handle));
        Value::Obj(handle)
    }

    /// Runs `code` starting at instruction offset `start` to completion,
    /// returning the value produced by the top-level `RETURN`.
    pub fn run(&mut self, code: Rc<Code>, start: usize) -> Result<Value, RuntimeError> {
        self.code = code;
        self.ip = start;
        self.fp = self.stack.len();

        loop {
            let offset = self.ip;
            let line = self.code.line_at(offset);
            let byte = self.code.read_u8(offset);
            self.ip += 1;

            let opcode =
                Opcode::try_from(byte).map_err(|opcode| RuntimeError::UnknownOpcode { opcode, offset })?;
            log::opcode_fetched(offset, byte);

            match opcode {
                Opcode::Nil => self.stack.push(Value::Nil)?,
                Opcode::True => self.stack.push(Value::Boolean(true))?,
                Opcode::False => self.stack.push(Value::Boolean(false))?,

                Opcode::Integer => {
                    let value = self.code.read_i32(self.ip);
                    self.ip += 4;
                    self.stack.push(Value::Integer(value))?;
                }

                Opcode::Intern => {
                    let index = self.code.read_u8(self.ip);
                    self.ip += 1;
                    self.stack.push(Value::Obj(self.code.get_intern(index)))?;
                }

                Opcode::Native => {
                    let index = self.code.read_u8(self.ip);
                    self.ip += 1;
                    let value = self.adopt(Obj::Native(ObjNative { index }));
                    self.stack.push(value)?;
                }

                Opcode::Get => {
                    let slot = self.code.read_u8(self.ip) as usize;
                    self.ip += 1;
                    let value = self.stack.get(self.fp + slot).clone();
                    self.stack.push(value)?;
                }

                Opcode::Set => {
                    let slot = self.code.read_u8(self.ip) as usize;
                    self.ip += 1;
                    let value = self.stack.pop();
                    self.stack.set(self.fp + slot, value);
                }

                Opcode::Drop => {
                    self.stack.pop();
                }

                Opcode::Negate => {
                    let value = self.stack.pop();
                    let int = value
                        .as_integer()
                        .ok_or(RuntimeError::TypeMismatch { expected: "integer", line })?;
                    self.stack.push(Value::Integer(-int))?;
                }

                Opcode::Not => {
                    let value = self.stack.pop();
                    let b = value
                        .as_bool()
                        .ok_or(RuntimeError::TypeMismatch { expected: "boolean", line })?;
                    self.stack.push(Value::Boolean(!b))?;
                }

                Opcode::Add => self.exec_add(line)?,
                Opcode::Subtract => self.exec_integer_binary(line, ops::subtract)?,
                Opcode::Multiply => self.exec_integer_binary(line, ops::multiply)?,
                Opcode::Divide => self.exec_divide(line)?,

                Opcode::Eq => {
                    let b = self.stack.pop();
                    let a = self.stack.pop();
                    self.stack.push(Value::Boolean(a.equals(&b)))?;
                }
                Opcode::Neq => {
                    let b = self.stack.pop();
                    let a = self.stack.pop();
                    self.stack.push(Value::Boolean(!a.equals(&b)))?;
                }

                Opcode::Lt => self.exec_comparison(line, ops::less_than)?,
                Opcode::Gt => self.exec_comparison(line, ops::greater_than)?,
                Opcode::Leq => self.exec_comparison(line, ops::less_than_or_equal)?,
                Opcode::Geq => self.exec_comparison(line, ops::greater_than_or_equal)?,

                Opcode::Jump => {
                    let delta = self.code.read_i16(self.ip);
                    self.ip = jump_target(self.ip, delta);
                }

                Opcode::JumpIfTrue => {
                    let delta = self.code.read_i16(self.ip);
                    self.ip += 2;
                    let value = self.stack.pop();
                    let cond = value
                        .as_bool()
                        .ok_or(RuntimeError::TypeMismatch { expected: "boolean", line })?;
                    if cond {
                        self.ip = jump_target(self.ip - 2, delta);
                    }
                }

                Opcode::JumpIfFalse => {
                    let delta = self.code.read_i16(self.ip);
                    self.ip += 2;
                    let value = self.stack.pop();
                    let cond = value
                        .as_bool()
                        .ok_or(RuntimeError::TypeMismatch { expected: "boolean", line })?;
                    if !cond {
                        self.ip = jump_target(self.ip - 2, delta);
                    }
                }

                Opcode::And => {
                    let delta = self.code.read_i16(self.ip);
                    let operand_offset = self.ip;
                    self.ip += 2;
                    let cond = self
                        .stack
                        .peek()
                        .as_bool()
                        .ok_or(RuntimeError::TypeMismatch { expected: "boolean", line })?;
                    if !cond {
                        self.ip = jump_target(operand_offset, delta);
                    } else {
                        self.stack.pop();
                    }
                }

                Opcode::Or => {
                    let delta = self.code.read_i16(self.ip);
                    let operand_offset = self.ip;
                    self.ip += 2;
                    let cond = self
                        .stack
                        .peek()
                        .as_bool()
                        .ok_or(RuntimeError::TypeMismatch { expected: "boolean", line })?;
                    if cond {
                        self.ip = jump_target(operand_offset, delta);
                    } else {
                        self.stack.pop();
                    }
                }

                Opcode::Call => {
                    let argc = self.code.read_u8(self.ip);
                    self.ip += 1;
                    self.exec_call(argc, line)?;
                }

                Opcode::Return => {
                    let result = self.stack.pop();
                    match self.frames.pop() {
                        Some(frame) => {
                            log::frame_popped(self.frames.len());
                            self.stack.truncate(self.fp);
                            self.stack.push(result)?;
                            self.code = frame.return_code;
                            self.ip = frame.return_ip;
                            self.fp = frame.return_fp;
                        }
                        None => return Ok(result),
                    }
                }

                Opcode::Prop => {
                    // Reserved: declared in the instruction set but never
                    // given runtime semantics.
                    self.stack.pop();
                }
            }
        }
    }

    fn exec_integer_binary(&mut self, line: u32, f: fn(i32, i32) -> i32) -> Result<(), RuntimeError> {
        let b = self.stack.pop();
        let a = self.stack.pop();
        let (a, b) = (
            a.as_integer().ok_or(RuntimeError::TypeMismatch { expected: "integer", line })?,
            b.as_integer().ok_or(RuntimeError::TypeMismatch { expected: "integer", line })?,
        );
        self.stack.push(Value::Integer(f(a, b)))
    }

    fn exec_comparison(&mut self, line: u32, f: fn(i32, i32) -> bool) -> Result<(), RuntimeError> {
        let b = self.stack.pop();
        let a = self.stack.pop();
        let (a, b) = (
            a.as_integer().ok_or(RuntimeError::TypeMismatch { expected: "integer", line })?,
            b.as_integer().ok_or(RuntimeError::TypeMismatch { expected: "integer", line })?,
        );
        self.stack.push(Value::Boolean(f(a, b)))
    }

    fn exec_divide(&mut self, line: u32) -> Result<(), RuntimeError> {
        let b = self.stack.pop();
        let a = self.stack.pop();
        let (a, b) = (
            a.as_integer().ok_or(RuntimeError::TypeMismatch { expected: "integer", line })?,
            b.as_integer().ok_or(RuntimeError::TypeMismatch { expected: "integer", line })?,
        );
        let result = ops::divide(a, b, line)?;
        self.stack.push(Value::Integer(result))
    }

    /// `ADD` is integer addition when the top of the stack is an integer,
    /// string concatenation when it is a string; anything else is a type
    /// mismatch.
    fn exec_add(&mut self, line: u32) -> Result<(), RuntimeError> {
        let b = self.stack.pop();
        let a = self.stack.pop();
        match (&a, &b) {
            (Value::Integer(x), Value::Integer(y)) => {
                self.stack.push(Value::Integer(ops::add(*x, *y)))
            }
            _ => match (a.as_string(), b.as_string()) {
                (Some(x), Some(y)) => {
                    let mut bytes = Vec::with_capacity(x.bytes.len() + y.bytes.len());
                    bytes.extend_from_slice(&x.bytes);
                    bytes.extend_from_slice(&y.bytes);
                    let value = self.adopt(Obj::String(crate::object::ObjString::new(bytes)));
                    self.stack.push(value)
                }
                _ => Err(RuntimeError::TypeMismatch { expected: "integer or string", line }),
            },
        }
    }

    /// Implements the `CALL argc` protocol described in the component
    /// design: natives run inline against the args still on the stack;
    /// closures get a fresh frame and the interpreter jumps into their code.
    fn exec_call(&mut self, argc: u8, line: u32) -> Result<(), RuntimeError> {
        let callee = self.stack.pop();
        let args_start = self.stack.len() - argc as usize;

        match &callee {
            Value::Obj(obj) => match obj.as_ref() {
                Obj::Native(native) => {
                    let args: Vec<Value> = (args_start..self.stack.len())
                        .map(|i| self.stack.get(i).clone())
                        .collect();
                    let outcome = match native.index {
                        natives::PRINT => natives::call_print(self.runtime, &args)?,
                        natives::INPUT => natives::call_input(self.runtime)?,
                        other => {
                            return Err(RuntimeError::UnknownOpcode { opcode: other, offset: self.ip })
                        }
                    };
                    let result = match outcome {
                        natives::NativeOutcome::Value(value) => value,
                        natives::NativeOutcome::Obj(obj) => self.adopt(obj),
                    };
                    self.stack.truncate(args_start);
                    self.stack.push(result)
                }
                Obj::Closure(closure) => {
                    if closure.arity != argc {
                        return Err(RuntimeError::ArityMismatch {
                            expected: closure.arity,
                            got: argc,
                            line,
                        });
                    }
                    self.frames.push(Frame {
                        return_code: Rc::clone(&self.code),
                        return_ip: self.ip,
                        return_fp: self.fp,
                    })?;
                    log::frame_pushed(self.frames.len(), closure.name.as_str());
                    self.code = Rc::clone(&closure.code);
                    self.ip = 0;
                    self.fp = args_start;
                    Ok(())
                }
                _ => Err(RuntimeError::TypeMismatch { expected: "callable", line }),
            },
            _ => Err(RuntimeError::TypeMismatch { expected: "callable", line }),
        }
    }
}

/// Jump targets are computed from the offset of the delta's own first byte,
/// matching [`Code::patch_jump`].
fn jump_target(delta_offset: usize, delta: i16) -> usize {
    (delta_offset as i64 + delta as i64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Code;
    use crate::opcode::Opcode as Op;

    fn push_code() -> (Code, usize) {
        let mut code = Code::new();
        code.append(Op::Integer as u8, 1);
        code.append_i32(2, 1);
        code.append(Op::Integer as u8, 1);
        code.append_i32(3, 1);
        code.append(Op::Add as u8, 1);
        code.append(Op::Return as u8, 1);
        (code, 0)
    }

    #[test]
    fn runs_a_trivial_addition_program() {
        let mut runtime = Runtime::with_io(std::io::empty(), Box::new(Vec::new()));
        let (code, start) = push_code();
        let mut thread = Thread::new(&mut runtime);
        let result = thread.run(Rc::new(code), start).unwrap();
        assert_eq!(result.as_integer(), Some(5));
    }

    #[test]
    fn short_circuit_and_does_not_evaluate_the_right_operand() {
        let mut code = Code::new();
        code.append(Op::False as u8, 1);
        code.append(Op::And as u8, 1);
        let delta_offset = code.append_i16(0, 1);
        code.append(Op::Integer as u8, 1);
        code.append_i32(1, 1);
        code.append(Op::Integer as u8, 1);
        code.append_i32(0, 1);
        code.append(Op::Divide as u8, 1);
        let target = code.current();
        code.patch_jump(delta_offset, target, 1).unwrap();
        code.append(Op::Return as u8, 1);

        let mut runtime = Runtime::with_io(std::io::empty(), Box::new(Vec::new()));
        let mut thread = Thread::new(&mut runtime);
        let result = thread.run(Rc::new(code), 0).unwrap();
        assert_eq!(result.as_bool(), Some(false));
    }
}
