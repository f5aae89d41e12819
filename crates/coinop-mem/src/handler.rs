//! Bound access handlers.
//!
//! A handler owns its callable behind `Rc<RefCell<..>>`, so cloning one is a
//! refcount bump and every clone dispatches to the same binding. Devices
//! typically bind a closure that captures an `Rc<RefCell<TheDevice>>` and
//! forwards to a method; plain functions bind directly. Both paths produce
//! the same value type and the call site cannot tell them apart.
//!
//! The unbound state is explicit and safe to invoke: reads yield 0, writes
//! are dropped. The address space checks [`ReadHandler::is_bound`] before
//! dispatch and substitutes its own unmapped policy, so the 0 here is only a
//! backstop for direct callers.
//!
//! Handler callables must not re-enter the address space they are installed
//! in. A device whose register write starts a bus transaction latches the
//! request and performs the memory traffic from its tick entry point, where
//! the machine hands it the space.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use coinop_types::AccessWidth;

type ReadFn = dyn FnMut(u32, AccessWidth) -> u64;
type WriteFn = dyn FnMut(u32, u64, AccessWidth);

/// Read side of a memory-mapped handler pair.
#[derive(Clone)]
pub struct ReadHandler {
    name: &'static str,
    f: Option<Rc<RefCell<ReadFn>>>,
}

impl ReadHandler {
    /// Binds `f`. `name` shows up in unmapped-access diagnostics and debug
    /// output.
    pub fn new(name: &'static str, f: impl FnMut(u32, AccessWidth) -> u64 + 'static) -> Self {
        Self {
            name,
            f: Some(Rc::new(RefCell::new(f))),
        }
    }

    /// The explicit null handler.
    #[must_use]
    pub fn unbound() -> Self {
        Self {
            name: "unmapped",
            f: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.f.is_some()
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Invokes the binding. `offset` is relative to the region the handler
    /// is installed at. Unbound handlers return 0.
    pub fn read(&self, offset: u32, width: AccessWidth) -> u64 {
        match &self.f {
            Some(f) => (&mut *f.borrow_mut())(offset, width),
            None => 0,
        }
    }
}

impl fmt::Debug for ReadHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadHandler")
            .field("name", &self.name)
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// Write side of a memory-mapped handler pair.
#[derive(Clone)]
pub struct WriteHandler {
    name: &'static str,
    f: Option<Rc<RefCell<WriteFn>>>,
}

impl WriteHandler {
    pub fn new(name: &'static str, f: impl FnMut(u32, u64, AccessWidth) + 'static) -> Self {
        Self {
            name,
            f: Some(Rc::new(RefCell::new(f))),
        }
    }

    /// The explicit null handler.
    #[must_use]
    pub fn unbound() -> Self {
        Self {
            name: "unmapped",
            f: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.f.is_some()
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Invokes the binding. Unbound handlers drop the write.
    pub fn write(&self, offset: u32, data: u64, width: AccessWidth) {
        if let Some(f) = &self.f {
            (&mut *f.borrow_mut())(offset, data, width);
        }
    }
}

impl fmt::Debug for WriteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteHandler")
            .field("name", &self.name)
            .field("bound", &self.is_bound())
            .finish()
    }
}
