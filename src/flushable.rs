//! Shared `Flushable` capability, mirrored from `IFlushable` in
//! `examples/original_source/interface.go`.

/// Something that can drop all of its entries on demand and report how
/// many were discarded.
pub trait Flushable {
    /// Removes every entry and returns the number of entries removed.
    fn flush(&self) -> usize;
}
