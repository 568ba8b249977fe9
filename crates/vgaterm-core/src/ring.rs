//! Fixed-capacity circular buffer over `Copy` elements.
//!
//! Both cursors are element indices into a single allocation. One slot is
//! always left empty so that a full buffer can be told apart from an empty
//! one, which gives the invariant:
//!
//! ```text
//! unread() + unwritten() == capacity() - 1
//! ```
//!
//! Two write flavours exist: [`RingBuffer::put`] never touches unread data,
//! while [`RingBuffer::force_put`] overwrites whatever is in its way. The
//! scrollback log only ever uses the latter.

use std::fmt;
use std::mem::size_of;

/// Errors raised when constructing a [`RingBuffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RingBufferError {
    /// A capacity of zero elements was requested.
    ZeroCapacity,
    /// The backing storage could not be reserved.
    Allocation {
        /// Number of elements requested.
        elements: usize,
        /// Size of one element in bytes.
        elem_size: usize,
    },
}

impl fmt::Display for RingBufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCapacity => write!(f, "ring buffer capacity must be non-zero"),
            Self::Allocation {
                elements,
                elem_size,
            } => write!(
                f,
                "failed to allocate ring buffer of {elements} elements ({elem_size} bytes each)"
            ),
        }
    }
}

impl std::error::Error for RingBufferError {}

/// Circular buffer of `capacity` fixed-size elements.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    buf: Vec<T>,
    get: usize,
    put: usize,
    total_written: u64,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Allocate a buffer holding `capacity` element slots.
    ///
    /// At most `capacity - 1` elements can be unread at once.
    pub fn new(capacity: usize) -> Result<Self, RingBufferError> {
        if capacity == 0 {
            return Err(RingBufferError::ZeroCapacity);
        }
        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity)
            .map_err(|_| RingBufferError::Allocation {
                elements: capacity,
                elem_size: size_of::<T>(),
            })?;
        buf.resize(capacity, T::default());
        Ok(Self {
            buf,
            get: 0,
            put: 0,
            total_written: 0,
        })
    }

    /// Number of element slots.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Size of one element in bytes.
    #[inline]
    #[must_use]
    pub const fn elem_size(&self) -> usize {
        size_of::<T>()
    }

    /// Element index of the write cursor.
    #[inline]
    #[must_use]
    pub fn put_index(&self) -> usize {
        self.put
    }

    /// Total elements ever written, including overwritten ones.
    #[inline]
    #[must_use]
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Elements available to read.
    #[inline]
    #[must_use]
    pub fn unread(&self) -> usize {
        let cap = self.capacity();
        (cap + self.put - self.get) % cap
    }

    /// Elements that can be written without overwriting unread data.
    #[inline]
    #[must_use]
    pub fn unwritten(&self) -> usize {
        self.capacity() - 1 - self.unread()
    }

    /// Whether there is nothing left to read.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.put == self.get
    }

    /// Drop all unread data and rewind both cursors.
    pub fn clear(&mut self) {
        self.get = 0;
        self.put = 0;
    }

    /// Consuming read into `dest`.
    ///
    /// Returns `min(unread(), dest.len())` and advances the read cursor by
    /// exactly that amount.
    pub fn get(&mut self, dest: &mut [T]) -> usize {
        let (next, count) = self.read_from(0, dest);
        self.get = next;
        count
    }

    /// Non-consuming read starting `offset` elements past the read cursor.
    ///
    /// Produces exactly what [`get`](Self::get) would after skipping `offset`
    /// elements, but leaves the read cursor where it was.
    pub fn peek(&self, offset: usize, dest: &mut [T]) -> usize {
        let (_, count) = self.read_from(offset, dest);
        count
    }

    /// Seek `offset` past the read cursor and copy out. Returns the cursor
    /// position after the read and the number of elements copied.
    fn read_from(&self, offset: usize, dest: &mut [T]) -> (usize, usize) {
        let cap = self.capacity();
        let count = self.unread().saturating_sub(offset).min(dest.len());
        if count == 0 {
            return (self.get, 0);
        }
        let start = (self.get + offset) % cap;
        let room_to_end = cap - start;
        if count > room_to_end {
            dest[..room_to_end].copy_from_slice(&self.buf[start..]);
            dest[room_to_end..count].copy_from_slice(&self.buf[..count - room_to_end]);
        } else {
            dest[..count].copy_from_slice(&self.buf[start..start + count]);
        }
        ((start + count) % cap, count)
    }

    /// Unconditional write of every element in `src`.
    ///
    /// Unread data in the way is silently overwritten. When `src` is longer
    /// than the buffer only its last `capacity()` elements survive.
    pub fn force_put(&mut self, src: &[T]) -> usize {
        let cap = self.capacity();
        let count = src.len();
        let skip = count.saturating_sub(cap);
        let tail = &src[skip..];
        let start = (self.put + skip) % cap;
        let room_to_end = cap - start;
        if tail.len() > room_to_end {
            self.buf[start..].copy_from_slice(&tail[..room_to_end]);
            self.buf[..tail.len() - room_to_end].copy_from_slice(&tail[room_to_end..]);
        } else {
            self.buf[start..start + tail.len()].copy_from_slice(tail);
        }
        self.put = (self.put + count) % cap;
        self.total_written += count as u64;
        count
    }

    /// Bounded write: stores `min(unwritten(), src.len())` elements and never
    /// overwrites unread data. Returns the number stored.
    pub fn put(&mut self, src: &[T]) -> usize {
        let count = self.unwritten().min(src.len());
        self.force_put(&src[..count])
    }

    /// Roll back the most recent `count` writes.
    ///
    /// `count` is clamped to the number of elements written so far and to
    /// `capacity() - 1`. Writes that were already read can be undone too;
    /// the read cursor then follows the write cursor back so undone data is
    /// never readable. Returns the number of elements rolled back.
    pub fn unput(&mut self, count: usize) -> usize {
        let cap = self.capacity();
        let written = usize::try_from(self.total_written).unwrap_or(usize::MAX);
        let count = count.min(written).min(cap - 1);
        let unread = self.unread();
        self.put = (self.put + cap - count) % cap;
        if count > unread {
            self.get = self.put;
        }
        self.total_written -= count as u64;
        count
    }

    /// The `n`-th most recently written element (`0` is the newest).
    ///
    /// Computed purely from the write cursor; nothing checks that the slot
    /// holds data the caller still cares about.
    #[must_use]
    pub fn peek_back(&self, n: usize) -> &T {
        let cap = self.capacity();
        let back = (n % cap) + 1;
        &self.buf[(self.put + cap - back) % cap]
    }

    /// Contiguous view of `len` elements starting at physical slot `start`,
    /// split at the physical end of the storage.
    #[must_use]
    pub fn slices_at(&self, start: usize, len: usize) -> (&[T], &[T]) {
        let cap = self.capacity();
        let start = start % cap;
        let len = len.min(cap);
        let room_to_end = cap - start;
        if len > room_to_end {
            (&self.buf[start..], &self.buf[..len - room_to_end])
        } else {
            (&self.buf[start..start + len], &[])
        }
    }
}
