//! Process-level name interning.
//!
//! [`SymbolTable`] is an open-addressing hash map with linear probing,
//! hashed with FNV-1a over the name bytes and grown by doubling once the
//! load factor crosses 0.75. Two names that compare byte-equal always
//! resolve to the same [`Symbol`]; everywhere else in the crate, name
//! equality is decided by comparing `Symbol`s, never their bytes.

use std::rc::Rc;

use crate::consts::{MAX_SYMBOL_NAME_LEN, SYMBOL_TABLE_INITIAL_CAPACITY, SYMBOL_TABLE_MAX_LOAD};

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[derive(Debug)]
struct SymbolData {
    hash: u32,
    name: Box<[u8]>,
}

/// A pointer-stable handle to an interned name. Cloning a `Symbol` is cheap
/// (it bumps a reference count); two symbols are equal iff they were
/// produced by the same [`SymbolTable::get_symbol`] call site for the same
/// bytes.
#[derive(Debug, Clone)]
pub struct Symbol(Rc<SymbolData>);

impl Symbol {
    /// The interned name bytes.
    pub fn name(&self) -> &[u8] {
        &self.0.name
    }

    /// The interned name as UTF-8, for diagnostics. Fur source is expected
    /// to be UTF-8, so this should never fail in practice.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0.name).unwrap_or("<non-utf8 symbol>")
    }

    pub fn hash(&self) -> u32 {
        self.0.hash
    }

    /// Byte length of the name. Fits in a `u8` by construction.
    pub fn len(&self) -> u8 {
        self.0.name.len() as u8
    }

    pub fn is_empty(&self) -> bool {
        self.0.name.is_empty()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

/// Process-level interner. See module docs for the algorithm.
pub struct SymbolTable {
    buckets: Vec<Option<Symbol>>,
    len: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            buckets: Vec::new(),
            len: 0,
        }
    }

    /// Returns the unique `Symbol` for `name`, allocating and installing one
    /// if this is the first time these bytes have been interned.
    ///
    /// # Panics
    ///
    /// Panics if `name` is longer than [`MAX_SYMBOL_NAME_LEN`] bytes; the
    /// compiler and scanner are expected to reject identifiers that long
    /// before this is ever called.
    pub fn get_symbol(&mut self, name: &[u8]) -> Symbol {
        assert!(name.len() <= MAX_SYMBOL_NAME_LEN, "symbol name too long");

        if self.buckets.is_empty() {
            self.buckets = vec![None; SYMBOL_TABLE_INITIAL_CAPACITY];
        } else if (self.len + 1) as f64 / self.buckets.len() as f64 > SYMBOL_TABLE_MAX_LOAD {
            self.grow();
        }

        let hash = fnv1a(name);
        let capacity = self.buckets.len();
        let mut index = (hash as usize) % capacity;

        loop {
            match &self.buckets[index] {
                None => {
                    let symbol = Symbol(Rc::new(SymbolData {
                        hash,
                        name: Box::from(name),
                    }));
                    self.buckets[index] = Some(symbol.clone());
                    self.len += 1;
                    return symbol;
                }
                Some(existing) if existing.0.hash == hash && existing.0.name.as_ref() == name => {
                    return existing.clone();
                }
                Some(_) => index = (index + 1) % capacity,
            }
        }
    }

    fn grow(&mut self) {
        let new_capacity = self.buckets.len() * 2;
        let old = std::mem::replace(&mut self.buckets, vec![None; new_capacity]);

        for symbol in old.into_iter().flatten() {
            let mut index = (symbol.0.hash as usize) % new_capacity;
            while self.buckets[index].is_some() {
                index = (index + 1) % new_capacity;
            }
            self.buckets[index] = Some(symbol);
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
