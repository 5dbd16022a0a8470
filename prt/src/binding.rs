//! Channel bindings
//!
//! A stream owns one value buffer per bound channel. Binding a channel
//! hands back a typed [`Binding`] handle; the caller reads or fills the
//! values through the stream between particle calls. Each buffer is
//! converted to or from its slice of the record with the conversion
//! function chosen at bind time.

use std::fmt;
use std::marker::PhantomData;

use prt_core::{ConvertFn, Element, PrimitiveType, PrtError};

use crate::error::{Error, Result};

/// Typed handle to a channel bound on a reader or writer
///
/// Only meaningful for the stream that created it; accessors panic when
/// given a handle from another stream whose slot does not exist.
pub struct Binding<T: Element> {
    slot: usize,
    arity: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Element> Binding<T> {
    /// Number of elements in the bound buffer
    pub fn arity(&self) -> usize {
        self.arity
    }
}

impl<T: Element> Clone for Binding<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Element> Copy for Binding<T> {}

impl<T: Element> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("slot", &self.slot)
            .field("type", &T::TYPE)
            .field("arity", &self.arity)
            .finish()
    }
}

/// One bound channel: the caller-facing values plus where they live in a
/// record
struct Slot {
    name: String,
    user_type: PrimitiveType,
    arity: usize,
    offset: usize,
    convert: ConvertFn,
    // u64 storage keeps every element type aligned
    storage: Vec<u64>,
}

impl Slot {
    fn span(&self) -> usize {
        self.user_type.size_bytes() * self.arity
    }

    fn bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<u64, u8>(&self.storage)[..self.span()]
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        let span = self.span();
        &mut bytemuck::cast_slice_mut::<u64, u8>(&mut self.storage)[..span]
    }
}

/// The bound channels of one stream
#[derive(Default)]
pub(crate) struct Bindings {
    slots: Vec<Slot>,
}

impl Bindings {
    pub fn is_bound(&self, name: &str) -> bool {
        self.slots.iter().any(|slot| slot.name == name)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Register a buffer of `arity` elements of `T` at `offset` in the record
    ///
    /// `convert` moves data between the buffer and the record in whichever
    /// direction the stream needs.
    pub fn insert<T: Element>(
        &mut self,
        name: &str,
        arity: usize,
        offset: usize,
        convert: ConvertFn,
    ) -> Result<Binding<T>> {
        if self.is_bound(name) {
            return Err(Error::named(name, PrtError::AlreadyBound));
        }

        let span = T::TYPE.span(arity).ok_or(PrtError::ValueTooLarge)?;
        let slot = self.slots.len();
        self.slots.push(Slot {
            name: name.to_owned(),
            user_type: T::TYPE,
            arity,
            offset,
            convert,
            storage: vec![0u64; span.div_ceil(8)],
        });

        Ok(Binding {
            slot,
            arity,
            _marker: PhantomData,
        })
    }

    pub fn value<T: Element>(&self, binding: &Binding<T>) -> &[T] {
        let slot = &self.slots[binding.slot];
        debug_assert_eq!(slot.user_type, T::TYPE);
        &bytemuck::cast_slice::<u64, T>(&slot.storage)[..binding.arity]
    }

    pub fn value_mut<T: Element>(&mut self, binding: &Binding<T>) -> &mut [T] {
        let slot = &mut self.slots[binding.slot];
        debug_assert_eq!(slot.user_type, T::TYPE);
        &mut bytemuck::cast_slice_mut::<u64, T>(&mut slot.storage)[..binding.arity]
    }

    /// Convert every bound channel out of `record` into its buffer
    pub fn scatter(&mut self, record: &[u8]) {
        for slot in &mut self.slots {
            let src = &record[slot.offset..];
            let arity = slot.arity;
            let convert = slot.convert;
            convert(slot.bytes_mut(), src, arity);
        }
    }

    /// Convert every bound buffer into its place in `record`
    pub fn gather(&self, record: &mut [u8]) {
        for slot in &self.slots {
            (slot.convert)(&mut record[slot.offset..], slot.bytes(), slot.arity);
        }
    }
}
