use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::BufferError;

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`RuntimeBuffer`]. Every buffer gets a fresh id; ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferId(u64);

impl BufferId {
    fn next() -> Self {
        Self(NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Values that can live in a runtime buffer slot.
///
/// `PartialEq` and `Debug` let two instances' buffers be compared and inspected; `Send` lets a
/// runner (and its buffer) move to another thread.
pub trait RuntimeValue: Any + Clone + PartialEq + fmt::Debug + Send {}

impl<T> RuntimeValue for T where T: Any + Clone + PartialEq + fmt::Debug + Send {}

/// Typed token addressing one slot of the buffer that issued it.
///
/// Handles are only created by [`RuntimeBuffer::register`] and by resolving a
/// [`Local`](crate::Local) against a node's slot range, so they always carry the identity of
/// their buffer. Using one against another buffer is reported as
/// [`BufferError::ForeignHandle`].
pub struct Handle<T: 'static> {
    buffer: BufferId,
    index: u32,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: 'static> Handle<T> {
    pub(crate) fn new(buffer: BufferId, index: u32) -> Self {
        Self {
            buffer,
            index,
            _phantom: PhantomData,
        }
    }

    pub fn buffer(self) -> BufferId {
        self.buffer
    }

    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl<T: 'static> Copy for Handle<T> {}

impl<T: 'static> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.buffer == other.buffer && self.index == other.index
    }
}

impl<T: 'static> Eq for Handle<T> {}

impl<T: 'static> std::hash::Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.buffer.hash(state);
        self.index.hash(state);
    }
}

impl<T: 'static> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Handle<{}>(buffer {}, slot {})",
            type_name::<T>(),
            self.buffer,
            self.index
        )
    }
}

/// Type description of one registered slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotInfo {
    pub type_id: TypeId,
    pub type_name: &'static str,
}

impl SlotInfo {
    fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }
}

trait ErasedValue: Send {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn eq_erased(&self, other: &dyn ErasedValue) -> bool;
    fn fmt_erased(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl<T: RuntimeValue> ErasedValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn eq_erased(&self, other: &dyn ErasedValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }

    fn fmt_erased(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

struct Slot {
    info: SlotInfo,
    value: Box<dyn ErasedValue>,
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt_erased(f)
    }
}

/// Per-instance store of runtime variables.
///
/// Use is two-phase: during layout every node appends its variables with
/// [`register`](Self::register); after [`seal`](Self::seal) the set of slots is fixed and values
/// are read and written through handles. Buffers compare equal when they hold the same slots
/// with equal values, regardless of their identity.
pub struct RuntimeBuffer {
    id: BufferId,
    slots: Vec<Slot>,
    sealed: bool,
}

impl RuntimeBuffer {
    pub fn new() -> Self {
        Self {
            id: BufferId::next(),
            slots: Vec::new(),
            sealed: false,
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Ends the layout pass. Later registrations fail.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn try_register<T: RuntimeValue>(&mut self, initial: T) -> Result<Handle<T>, BufferError> {
        if self.sealed {
            return Err(BufferError::Sealed(self.id));
        }
        let index = u32::try_from(self.slots.len()).map_err(|_| BufferError::OutOfRange {
            index: self.slots.len(),
            len: u32::MAX as usize,
        })?;
        self.slots.push(Slot {
            info: SlotInfo::of::<T>(),
            value: Box::new(initial),
        });
        Ok(Handle::new(self.id, index))
    }

    /// Appends a variable seeded with `initial`.
    ///
    /// # Panics
    /// If the buffer is sealed.
    pub fn register<T: RuntimeValue>(&mut self, initial: T) -> Handle<T> {
        match self.try_register(initial) {
            Ok(handle) => handle,
            Err(err) => panic!("{err}"),
        }
    }

    /// Whether `handle` addresses a slot of this buffer holding a `T`.
    pub fn owns<T: RuntimeValue>(&self, handle: Handle<T>) -> bool {
        self.try_get(handle).is_ok()
    }

    fn slot<T: 'static>(&self, handle: Handle<T>) -> Result<&Slot, BufferError> {
        if handle.buffer != self.id {
            return Err(BufferError::ForeignHandle {
                handle: handle.buffer,
                buffer: self.id,
            });
        }
        self.slots.get(handle.index()).ok_or(BufferError::OutOfRange {
            index: handle.index(),
            len: self.slots.len(),
        })
    }

    pub fn try_get<T: RuntimeValue>(&self, handle: Handle<T>) -> Result<&T, BufferError> {
        let slot = self.slot(handle)?;
        slot.value
            .as_any()
            .downcast_ref::<T>()
            .ok_or(BufferError::TypeMismatch {
                index: handle.index(),
                expected: type_name::<T>(),
                found: slot.info.type_name,
            })
    }

    pub fn try_get_mut<T: RuntimeValue>(
        &mut self,
        handle: Handle<T>,
    ) -> Result<&mut T, BufferError> {
        self.slot(handle)?;
        let slot = &mut self.slots[handle.index()];
        let found = slot.info.type_name;
        slot.value
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or(BufferError::TypeMismatch {
                index: handle.index(),
                expected: type_name::<T>(),
                found,
            })
    }

    /// # Panics
    /// If the handle belongs to another buffer or names a slot of another type.
    pub fn get<T: RuntimeValue>(&self, handle: Handle<T>) -> &T {
        match self.try_get(handle) {
            Ok(value) => value,
            Err(err) => panic!("runtime buffer access failed: {err}"),
        }
    }

    /// # Panics
    /// If the handle belongs to another buffer or names a slot of another type.
    pub fn get_mut<T: RuntimeValue>(&mut self, handle: Handle<T>) -> &mut T {
        match self.try_get_mut(handle) {
            Ok(value) => value,
            Err(err) => panic!("runtime buffer access failed: {err}"),
        }
    }

    /// Stores `value`, returning the previous one.
    pub fn set<T: RuntimeValue>(&mut self, handle: Handle<T>, value: T) -> T {
        std::mem::replace(self.get_mut(handle), value)
    }

    /// Type of every slot, in registration order.
    pub fn shape(&self) -> Vec<SlotInfo> {
        self.slots.iter().map(|slot| slot.info).collect()
    }
}

impl Default for RuntimeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RuntimeBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeBuffer")
            .field("id", &self.id)
            .field("sealed", &self.sealed)
            .field("slots", &self.slots)
            .finish()
    }
}

impl PartialEq for RuntimeBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.slots.len() == other.slots.len()
            && self.slots.iter().zip(&other.slots).all(|(a, b)| {
                a.info == b.info && a.value.eq_erased(b.value.as_ref())
            })
    }
}

impl<T: RuntimeValue> Index<Handle<T>> for RuntimeBuffer {
    type Output = T;

    fn index(&self, handle: Handle<T>) -> &T {
        self.get(handle)
    }
}

impl<T: RuntimeValue> IndexMut<Handle<T>> for RuntimeBuffer {
    fn index_mut(&mut self, handle: Handle<T>) -> &mut T {
        self.get_mut(handle)
    }
}
