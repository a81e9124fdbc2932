use core::fmt;

/// Error returned by checked extraction when the requested type does not
/// match the stored value.
///
/// The container is left untouched by a failed extraction, so a later
/// extraction of the right type still succeeds.
///
/// # Examples
///
/// ```
/// use woid::{Any, BadAnyCast, markers::{Checked, Combined, Copyable, NoGuarantee}, space::S1};
///
/// let value: Any<S1, Copyable, NoGuarantee, Combined, Checked> = Any::new(3_i32);
/// let error: BadAnyCast = value.downcast_ref::<u8>().unwrap_err();
/// assert_eq!(error.requested(), "u8");
/// assert_eq!(error.found(), Some("i32"));
/// assert_eq!(*value.downcast_ref::<i32>().unwrap(), 3);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct BadAnyCast {
    /// Name of the type the caller asked for.
    requested: &'static str,
    /// Name of the type actually stored; `None` for an empty container.
    found: Option<&'static str>,
}

impl BadAnyCast {
    /// Creates the error for a request of `T` against a container holding
    /// `found`.
    #[inline]
    pub(crate) fn new<T: ?Sized>(found: Option<&'static str>) -> Self {
        Self {
            requested: core::any::type_name::<T>(),
            found,
        }
    }

    /// Name of the requested type.
    #[inline]
    pub fn requested(&self) -> &'static str {
        self.requested
    }

    /// Name of the stored type, or `None` if the container was empty.
    #[inline]
    pub fn found(&self) -> Option<&'static str> {
        self.found
    }
}

impl fmt::Display for BadAnyCast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.found {
            Some(found) => write!(
                f,
                "bad any cast: requested `{}` but the container holds `{found}`",
                self.requested
            ),
            None => write!(
                f,
                "bad any cast: requested `{}` but the container is empty",
                self.requested
            ),
        }
    }
}

impl core::error::Error for BadAnyCast {}
