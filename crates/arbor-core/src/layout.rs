use std::fmt;
use std::marker::PhantomData;

use crate::{BufferError, BufferId, Handle, RuntimeBuffer, RuntimeValue};

/// Ordinal of a node-local variable, typed by its value.
///
/// Node kinds declare their variables as constants (`const TIME: Local<f32> = Local::new(0);`)
/// and register them in ordinal order during layout. At run time the runner resolves the ordinal
/// against the node's [`SlotRange`] in its own buffer, so the same constant works for every
/// instance of the tree.
pub struct Local<T: 'static> {
    index: u32,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: 'static> Local<T> {
    pub const fn new(index: u32) -> Self {
        Self {
            index,
            _phantom: PhantomData,
        }
    }

    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl<T: 'static> Copy for Local<T> {}

impl<T: 'static> Clone for Local<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> PartialEq for Local<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T: 'static> Eq for Local<T> {}

impl<T: 'static> fmt::Debug for Local<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Local<{}>({})", std::any::type_name::<T>(), self.index)
    }
}

/// Contiguous run of slots registered by one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRange {
    buffer: BufferId,
    first: u32,
    count: u32,
}

impl SlotRange {
    pub fn empty(buffer: BufferId) -> Self {
        Self {
            buffer,
            first: 0,
            count: 0,
        }
    }

    pub fn buffer(self) -> BufferId {
        self.buffer
    }

    pub fn first(self) -> usize {
        self.first as usize
    }

    pub fn len(self) -> usize {
        self.count as usize
    }

    pub fn is_empty(self) -> bool {
        self.count == 0
    }

    pub fn try_handle<T: 'static>(self, local: Local<T>) -> Result<Handle<T>, BufferError> {
        if local.index >= self.count {
            return Err(BufferError::LocalOutOfRange {
                local: local.index(),
                count: self.len(),
            });
        }
        Ok(Handle::new(self.buffer, self.first + local.index))
    }

    /// # Panics
    /// If the node registered fewer than `local.index() + 1` slots.
    pub fn handle<T: 'static>(self, local: Local<T>) -> Handle<T> {
        match self.try_handle(local) {
            Ok(handle) => handle,
            Err(err) => panic!("{err}"),
        }
    }
}

/// Registration scope handed to one node during the layout pass.
///
/// Slots registered through a `Layout` are contiguous in the buffer; their ordinals must follow
/// registration order so that `Local` constants resolve to the right slot.
pub struct Layout<'a> {
    buffer: &'a mut RuntimeBuffer,
    first: u32,
    count: u32,
}

impl<'a> Layout<'a> {
    pub fn new(buffer: &'a mut RuntimeBuffer) -> Self {
        let first = buffer.len() as u32;
        Self {
            buffer,
            first,
            count: 0,
        }
    }

    /// Registers the node variable `local`, seeded with `initial`.
    ///
    /// # Panics
    /// If `local` is not the next ordinal, or the buffer is sealed.
    pub fn register<T: RuntimeValue>(&mut self, local: Local<T>, initial: T) -> Handle<T> {
        assert_eq!(
            local.index, self.count,
            "node-local slots must be registered in ordinal order"
        );
        let handle = self.buffer.register(initial);
        self.count += 1;
        handle
    }

    pub fn registered(&self) -> usize {
        self.count as usize
    }

    pub fn finish(self) -> SlotRange {
        SlotRange {
            buffer: self.buffer.id(),
            first: self.first,
            count: self.count,
        }
    }
}

/// Read-only view of one node's slots.
#[derive(Debug, Clone, Copy)]
pub struct NodeData<'a> {
    buffer: &'a RuntimeBuffer,
    range: SlotRange,
}

impl<'a> NodeData<'a> {
    pub fn new(buffer: &'a RuntimeBuffer, range: SlotRange) -> Self {
        Self { buffer, range }
    }

    pub fn range(&self) -> SlotRange {
        self.range
    }

    pub fn try_get<T: RuntimeValue>(&self, local: Local<T>) -> Result<&'a T, BufferError> {
        let handle = self.range.try_handle(local)?;
        self.buffer.try_get(handle)
    }

    pub fn get<T: RuntimeValue>(&self, local: Local<T>) -> &'a T {
        self.buffer.get(self.range.handle(local))
    }
}

/// Mutable view of one node's slots.
#[derive(Debug)]
pub struct NodeDataMut<'a> {
    buffer: &'a mut RuntimeBuffer,
    range: SlotRange,
}

impl<'a> NodeDataMut<'a> {
    pub fn new(buffer: &'a mut RuntimeBuffer, range: SlotRange) -> Self {
        Self { buffer, range }
    }

    pub fn range(&self) -> SlotRange {
        self.range
    }

    pub fn as_ref(&self) -> NodeData<'_> {
        NodeData::new(self.buffer, self.range)
    }

    pub fn try_get<T: RuntimeValue>(&self, local: Local<T>) -> Result<&T, BufferError> {
        let handle = self.range.try_handle(local)?;
        self.buffer.try_get(handle)
    }

    pub fn try_get_mut<T: RuntimeValue>(&mut self, local: Local<T>) -> Result<&mut T, BufferError> {
        let handle = self.range.try_handle(local)?;
        self.buffer.try_get_mut(handle)
    }

    pub fn get<T: RuntimeValue>(&self, local: Local<T>) -> &T {
        self.buffer.get(self.range.handle(local))
    }

    pub fn get_mut<T: RuntimeValue>(&mut self, local: Local<T>) -> &mut T {
        self.buffer.get_mut(self.range.handle(local))
    }

    pub fn set<T: RuntimeValue>(&mut self, local: Local<T>, value: T) -> T {
        self.buffer.set(self.range.handle(local), value)
    }
}
