use fur_vm::symbol::SymbolTable;

#[test]
fn identity_matches_byte_equality() {
    let mut table = SymbolTable::new();
    let a = table.get_symbol(b"alpha");
    let b = table.get_symbol(b"alpha");
    let c = table.get_symbol(b"beta");
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn survives_growth_across_many_distinct_names() {
    let mut table = SymbolTable::new();
    let names: Vec<_> = (0..500).map(|i| format!("name{i}")).collect();
    let symbols: Vec<_> = names.iter().map(|n| table.get_symbol(n.as_bytes())).collect();
    for (name, symbol) in names.iter().zip(&symbols) {
        assert_eq!(table.get_symbol(name.as_bytes()), *symbol);
    }
}
