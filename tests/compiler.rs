use std::io;
use std::rc::Rc;

use fur_vm::ast::Node;
use fur_vm::code::Code;
use fur_vm::compiler::Compiler;
use fur_vm::error::CompileError;
use fur_vm::interpreter::Thread;
use fur_vm::value::Value;
use fur_vm::Runtime;

fn num(text: &str) -> Node {
    Node::Number { text: text.to_string(), line: 1 }
}

fn ident(text: &str) -> Node {
    Node::Identifier { text: text.to_string(), line: 1 }
}

fn assign(name: &str, value: Node) -> Node {
    Node::Assign { target: Box::new(ident(name)), value: Box::new(value), line: 1 }
}

fn run(tree: &Node) -> Value {
    let mut runtime = Runtime::with_io(io::empty(), Box::new(Vec::new()));
    let mut code = Code::new();
    let mut compiler = Compiler::new();
    let start = compiler.compile(tree, &mut code, &mut runtime, true).unwrap();
    let code = Rc::new(code);
    let mut thread = Thread::new(&mut runtime);
    thread.run(code, start).unwrap()
}

#[test]
fn variables_persist_across_statements() {
    // a = 2; b = 3; a * b + a
    let tree = Node::ExpressionList {
        items: vec![
            assign("a", num("2")),
            assign("b", num("3")),
            Node::Add {
                lhs: Box::new(Node::Multiply {
                    lhs: Box::new(ident("a")),
                    rhs: Box::new(ident("b")),
                    line: 1,
                }),
                rhs: Box::new(ident("a")),
                line: 1,
            },
        ],
        line: 1,
    };
    assert_eq!(run(&tree).as_integer(), Some(8));
}

#[test]
fn if_selects_the_then_branch_when_the_condition_holds() {
    let tree = Node::If {
        cond: Box::new(Node::LessThan { lhs: Box::new(num("1")), rhs: Box::new(num("2")), line: 1 }),
        then: Box::new(num("10")),
        else_: Some(Box::new(num("20"))),
        line: 1,
    };
    assert_eq!(run(&tree).as_integer(), Some(10));
}

#[test]
fn if_selects_the_else_branch_when_the_condition_fails() {
    let tree = Node::If {
        cond: Box::new(Node::GreaterThan { lhs: Box::new(num("1")), rhs: Box::new(num("2")), line: 1 }),
        then: Box::new(num("10")),
        else_: Some(Box::new(num("20"))),
        line: 1,
    };
    assert_eq!(run(&tree).as_integer(), Some(20));
}

#[test]
fn while_loop_accumulates_a_running_sum() {
    // i = 0; s = 0; while i < 5: s = s + i; i = i + 1 end; s
    let tree = Node::ExpressionList {
        items: vec![
            assign("i", num("0")),
            assign("s", num("0")),
            Node::While {
                cond: Box::new(Node::LessThan { lhs: Box::new(ident("i")), rhs: Box::new(num("5")), line: 1 }),
                body: Box::new(Node::ExpressionList {
                    items: vec![
                        assign("s", Node::Add { lhs: Box::new(ident("s")), rhs: Box::new(ident("i")), line: 1 }),
                        assign("i", Node::Add { lhs: Box::new(ident("i")), rhs: Box::new(num("1")), line: 1 }),
                    ],
                    line: 1,
                }),
                line: 1,
            },
            ident("s"),
        ],
        line: 1,
    };
    assert_eq!(run(&tree).as_integer(), Some(10));
}

#[test]
fn a_function_called_twice_sees_independent_slots_each_time() {
    // def twice(): 42 end; twice() + twice()
    let tree = Node::ExpressionList {
        items: vec![
            Node::FnDef {
                name: "twice".to_string(),
                args: vec![],
                body: Box::new(num("42")),
                line: 1,
            },
            Node::Add {
                lhs: Box::new(Node::Call { callee: Box::new(ident("twice")), args: vec![], line: 1 }),
                rhs: Box::new(Node::Call { callee: Box::new(ident("twice")), args: vec![], line: 1 }),
                line: 1,
            },
        ],
        line: 1,
    };
    assert_eq!(run(&tree).as_integer(), Some(84));
}

#[test]
fn local_slot_255_is_addressable_but_a_257th_live_local_is_a_compile_error() {
    let mut runtime = Runtime::with_io(io::empty(), Box::new(Vec::new()));
    let mut code = Code::new();
    let mut compiler = Compiler::new();

    let mut statements: Vec<Node> = (0..256).map(|i| assign(&format!("v{i}"), num("0"))).collect();
    statements.push(ident("v255"));
    let tree = Node::ExpressionList { items: statements, line: 1 };
    assert!(compiler.compile(&tree, &mut code, &mut runtime, true).is_ok());

    let mut runtime = Runtime::with_io(io::empty(), Box::new(Vec::new()));
    let mut code = Code::new();
    let mut compiler = Compiler::new();
    let statements: Vec<Node> = (0..257).map(|i| assign(&format!("v{i}"), num("0"))).collect();
    let tree = Node::ExpressionList { items: statements, line: 1 };
    let result = compiler.compile(&tree, &mut code, &mut runtime, true);
    assert!(matches!(result, Err(CompileError::TooManyLocals { .. })));
}

#[test]
fn an_unknown_identifier_is_a_compile_error() {
    let mut runtime = Runtime::with_io(io::empty(), Box::new(Vec::new()));
    let mut code = Code::new();
    let mut compiler = Compiler::new();
    let result = compiler.compile(&ident("nonexistent"), &mut code, &mut runtime, true);
    assert!(matches!(result, Err(CompileError::UnknownIdentifier { .. })));
}
