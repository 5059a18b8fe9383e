use fur_vm::code::Code;
use fur_vm::object::{Obj, ObjString};

#[test]
fn appended_bytes_are_attributed_to_the_right_line() {
    let mut code = Code::new();
    code.append(0x00, 1);
    code.append(0x01, 1);
    code.append(0x02, 5);
    assert_eq!(code.line_at(0), 1);
    assert_eq!(code.line_at(1), 1);
    assert_eq!(code.line_at(2), 5);
}

#[test]
fn multi_byte_operands_round_trip() {
    let mut code = Code::new();
    let offset = code.append_i32(-123456, 1);
    assert_eq!(code.read_i32(offset), -123456);

    let offset = code.append_i16(30000, 2);
    assert_eq!(code.read_i16(offset), 30000);
}

#[test]
fn jump_delta_of_32767_compiles() {
    let mut code = Code::new();
    let patch = code.append_i16(0, 1);
    for _ in 0..(32767 - 2) {
        code.append(0x00, 1);
    }
    let target = code.current();
    assert!(code.patch_jump(patch, target, 1).is_ok());
}

#[test]
fn jump_delta_of_32768_is_rejected() {
    let mut code = Code::new();
    let patch = code.append_i16(0, 1);
    let target = patch + 32768;
    assert!(code.patch_jump(patch, target, 1).is_err());
}

#[test]
fn constant_pool_index_255_compiles_256_does_not() {
    let mut code = Code::new();
    for _ in 0..255 {
        code.intern(Obj::String(ObjString::new(b"x".to_vec())), 1).unwrap();
    }
    let index = code.intern(Obj::String(ObjString::new(b"x".to_vec())), 1).unwrap();
    assert_eq!(index, 255);
    assert!(code.intern(Obj::String(ObjString::new(b"x".to_vec())), 1).is_err());
}
