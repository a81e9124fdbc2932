//! Process-wide registry of shared dispatch tables.
//!
//! Interfaces with [`Shared`](crate::markers::Shared) table ownership point
//! to one table per (table type, bound type) pair. The table is built and
//! leaked the first time the pair is bound; every later bind, from any
//! thread, gets the same `&'static` reference.
//!
//! Tables are keyed by [`TypeId`], so their identity does not depend on
//! where the code that binds them was compiled or linked.

use alloc::boxed::Box;
use core::any::{Any, TypeId};
#[cfg(feature = "std")]
use std::sync::{PoisonError, RwLock};

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;
#[cfg(not(feature = "std"))]
use spin::RwLock;

use crate::interface::DispatchTable;

/// Key of a shared table: the table type, then the bound type.
type TableKey = (TypeId, TypeId);

/// A leaked table, erased so tables of every type fit one map.
type TableRef = &'static (dyn Any + Send + Sync);

/// The tables created so far.
///
/// Entries are only ever added, and an entry is inserted whole or not at all,
/// so a panic while the lock is held leaves a usable map behind. Poisoning
/// is therefore ignored.
struct Registry {
    /// `None` until the first table is registered; the map cannot be built
    /// in a `static` initializer.
    tables: RwLock<Option<HashMap<TableKey, TableRef, FxBuildHasher>>>,
}

static REGISTRY: Registry = Registry {
    tables: RwLock::new(None),
};

impl Registry {
    /// Looks up the table registered under `key`.
    fn find(&self, key: &TableKey) -> Option<TableRef> {
        #[cfg(feature = "std")]
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        #[cfg(not(feature = "std"))]
        let tables = self.tables.read();

        tables.as_ref()?.get(key).copied()
    }

    /// Returns the table registered under `key`, registering the result of
    /// `build` if there is none yet.
    fn find_or_register(&self, key: TableKey, build: impl FnOnce() -> TableRef) -> TableRef {
        #[cfg(feature = "std")]
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        #[cfg(not(feature = "std"))]
        let mut tables = self.tables.write();

        *tables
            .get_or_insert_with(|| HashMap::with_hasher(FxBuildHasher))
            .entry(key)
            .or_insert_with(build)
    }
}

/// Returns the shared table of type `Tb` for the bound type `T`, building it
/// with `build` if this is the first request.
///
/// Concurrent first requests agree on a single table; `build` may run at
/// most once per pair.
pub(crate) fn shared_table<Tb: DispatchTable, T: 'static>(
    build: impl FnOnce() -> Tb,
) -> &'static Tb {
    let key = (TypeId::of::<Tb>(), TypeId::of::<T>());

    let entry = match REGISTRY.find(&key) {
        Some(entry) => entry,
        None => REGISTRY.find_or_register(key, || {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                table = core::any::type_name::<Tb>(),
                bound = core::any::type_name::<T>(),
                "Registered shared dispatch table"
            );

            let table: TableRef = Box::leak(Box::new(build()));
            table
        }),
    };

    match entry.downcast_ref::<Tb>() {
        Some(table) => table,
        None => unreachable!("shared tables are keyed by their own type"),
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;

    #[derive(Copy, Clone, Debug, PartialEq)]
    struct Table(u32);

    #[test]
    fn test_builds_once_per_pair() {
        let builds = Cell::new(0);
        let build = || {
            builds.set(builds.get() + 1);
            Table(7)
        };

        let first = shared_table::<Table, u8>(build);
        let second = shared_table::<Table, u8>(build);
        let other = shared_table::<Table, u16>(|| Table(9));

        assert!(core::ptr::eq(first, second));
        assert_eq!(*first, Table(7));
        assert_eq!(*other, Table(9));
        assert_eq!(builds.get(), 1);
    }

    #[test]
    fn test_shared_across_threads() {
        #[derive(Copy, Clone)]
        struct Remote;

        let here = core::ptr::from_ref(shared_table::<Table, Remote>(|| Table(1))).addr();
        let there = std::thread::spawn(|| {
            core::ptr::from_ref(shared_table::<Table, Remote>(|| Table(2))).addr()
        })
        .join()
        .unwrap();
        assert_eq!(here, there);
    }

    #[test]
    fn test_panicking_build_registers_nothing() {
        #[derive(Copy, Clone)]
        struct Fragile;

        let result = std::panic::catch_unwind(|| {
            shared_table::<Table, Fragile>(|| panic!("table could not be built"))
        });
        assert!(result.is_err());
        assert!(REGISTRY.find(&(TypeId::of::<Table>(), TypeId::of::<Fragile>())).is_none());

        let table = shared_table::<Table, Fragile>(|| Table(3));
        assert_eq!(*table, Table(3));
    }
}
