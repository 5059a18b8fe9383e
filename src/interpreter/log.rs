//! Narrow, deliberately sparse tracing hooks for the interpreter loop. Kept
//! out of `mod.rs` so the fetch-decode-execute loop reads as pure dispatch
//! logic, with the observability calls out of the way in one place.

use tracing::debug;

pub(super) fn frame_pushed(depth: usize, callee_name: &str) {
    debug!(depth, callee_name, "call frame pushed");
}

pub(super) fn frame_popped(depth: usize) {
    debug!(depth, "call frame popped");
}

#[cfg(feature = "debug")]
pub(super) fn opcode_fetched(offset: usize, opcode: u8) {
    tracing::trace!(offset, opcode, "fetched opcode");
}

#[cfg(not(feature = "debug"))]
pub(super) fn opcode_fetched(_offset: usize, _opcode: u8) {}
