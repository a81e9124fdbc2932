//! Small helpers shared by the storage engines.

/// Placeholder pointee for storage whose concrete type has been erased.
///
/// Erased pointers are typed as `NonNull<Erased>` (or as
/// `NonNull<HeapBlock<Erased>>`) so they cannot be mixed up with pointers to
/// real values. The private field keeps the type from ever being constructed.
#[derive(Clone, Copy, Debug)]
pub struct Erased(());
