//! Interrupt-safe shared state cells
//!
//! Every field that is touched from both interrupt handlers and the service
//! loop lives in a [`Shared`] cell. A cell can only be read or written while
//! holding a [`CriticalSection`] token, so a multi-byte value is never
//! observed half-written.
//!
//! Operations that must change several cells together take the token as an
//! argument and are called from inside one `critical_section::with` block.

use core::cell::Cell;

pub use critical_section::CriticalSection;
use critical_section::Mutex;

/// A `Copy` value guarded by the global critical section
pub struct Shared<T> {
    inner: Mutex<Cell<T>>,
}

impl<T> Shared<T> {
    /// Create a new cell
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(Cell::new(value)),
        }
    }
}

impl<T: Copy> Shared<T> {
    /// Read the value inside an open critical section
    #[inline]
    pub fn get(&self, cs: CriticalSection<'_>) -> T {
        self.inner.borrow(cs).get()
    }

    /// Write the value inside an open critical section
    #[inline]
    pub fn set(&self, cs: CriticalSection<'_>, value: T) {
        self.inner.borrow(cs).set(value);
    }

    /// Replace the value, returning the previous one
    #[inline]
    pub fn replace(&self, cs: CriticalSection<'_>, value: T) -> T {
        self.inner.borrow(cs).replace(value)
    }

    /// Apply `f` to the value and store the result, returning it
    #[inline]
    pub fn update(&self, cs: CriticalSection<'_>, f: impl FnOnce(T) -> T) -> T {
        let cell = self.inner.borrow(cs);
        let value = f(cell.get());
        cell.set(value);
        value
    }

    /// Read the value, entering a critical section for the access
    pub fn load(&self) -> T {
        critical_section::with(|cs| self.get(cs))
    }

    /// Write the value, entering a critical section for the access
    pub fn store(&self, value: T) {
        critical_section::with(|cs| self.set(cs, value));
    }
}

impl<T: Copy + Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
