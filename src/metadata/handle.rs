//! Packed metadata handles shared by AOT and interpreter images.
//!
//! A [`MetadataHandle`] is a 32-bit signed word that identifies a type, method, field or
//! generic entity together with the image it was loaded from. The layout is:
//!
//! ```text
//! bit 31..30 : kind tag
//! bit 29..0  : image index (high) | local index (low), split at 22 + extra(kind)
//!
//! kind 0 (Huge)   extra 6 -> local index 28 bits, image index 4 bits
//! kind 1 (Large)  extra 4 -> local index 26 bits, image index 6 bits
//! kind 2 (Medium) extra 2 -> local index 24 bits, image index 8 bits
//! kind 3 (Small)  extra 0 -> local index 22 bits, image index 10 bits
//! ```
//!
//! The image-index field is always read from bit 22 upward, so it contains the two kind
//! bits as its top bits and `extra(kind)` zero bits at the bottom. An image index
//! therefore decides its own kind, see [`ImageIndex::compose`].
//!
//! The value `-1` ([`INVALID_INDEX`]) is the universal "absent" sentinel and passes
//! through every decode and encode operation unchanged. Image index `0` means the entity
//! was compiled ahead of time; any other value names an interpreter image.
//!
//! # Example
//!
//! ```rust
//! use hybridmeta::metadata::handle::{ImageIndex, MetadataHandle, MetadataKind};
//!
//! let image = ImageIndex::compose(MetadataKind::Small, 5).unwrap();
//! let handle = MetadataHandle::encode(image, 42);
//!
//! assert!(handle.is_interpreter_origin());
//! assert_eq!(handle.kind(), MetadataKind::Small);
//! assert_eq!(handle.image_index(), image);
//! assert_eq!(handle.local_index(), 42);
//! ```

use std::fmt;

use strum::{EnumCount, EnumIter, FromRepr, IntoStaticStr};

use crate::{Error, Result};

/// Base width of the local index field, shared by all kinds
pub const METADATA_INDEX_BITS: u32 = 22;
/// Width of the kind tag
pub const METADATA_KIND_BITS: u32 = 2;
/// Position of the kind tag
pub const METADATA_KIND_SHIFT_BITS: u32 = 32 - METADATA_KIND_BITS;
/// Position of the image index field
pub const IMAGE_INDEX_SHIFT_BITS: u32 = METADATA_INDEX_BITS;
/// Width of the image index field including the kind tag
pub const IMAGE_INDEX_BITS: u32 = 32 - METADATA_INDEX_BITS;
/// Number of distinct image indices a handle can express
pub const MAX_IMAGE_COUNT: u32 = 1 << IMAGE_INDEX_BITS;
/// Number of distinct image indices once the kind bits are reserved
pub const MAX_IMAGE_INDEX_WITHOUT_KIND: u32 = 1 << (IMAGE_INDEX_BITS - METADATA_KIND_BITS);
/// Image index of AOT compiled entities
pub const INVALID_IMAGE_INDEX: u32 = 0;
/// The "absent" sentinel for handles and local indices
pub const INVALID_INDEX: i32 = -1;

/// Extra local index bits reserved by each kind, indexed by kind tag
const EXTRA_SHIFT_BITS: [u32; 4] = [6, 4, 2, 0];

/// Local index masks, indexed by kind tag
const LOCAL_INDEX_MASKS: [u32; 4] = [
    (1 << (METADATA_INDEX_BITS + EXTRA_SHIFT_BITS[0])) - 1,
    (1 << (METADATA_INDEX_BITS + EXTRA_SHIFT_BITS[1])) - 1,
    (1 << (METADATA_INDEX_BITS + EXTRA_SHIFT_BITS[2])) - 1,
    (1 << (METADATA_INDEX_BITS + EXTRA_SHIFT_BITS[3])) - 1,
];

/// The four handle layouts, trading image-index range for local-index range.
///
/// Big images (many rows in one table) get a wide local index and share a handful of
/// image slots; small images get the narrow 22-bit local index and one of 256 slots.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    EnumCount,
    FromRepr,
    IntoStaticStr,
)]
#[repr(u8)]
pub enum MetadataKind {
    /// 28 bit local index, 4 bit image index
    Huge = 0,
    /// 26 bit local index, 6 bit image index
    Large = 1,
    /// 24 bit local index, 8 bit image index
    Medium = 2,
    /// 22 bit local index, 10 bit image index
    Small = 3,
}

impl MetadataKind {
    /// Kind for a 2 bit tag; higher bits of `tag` are ignored
    #[must_use]
    pub fn from_tag(tag: u32) -> Self {
        match tag & 0b11 {
            0 => MetadataKind::Huge,
            1 => MetadataKind::Large,
            2 => MetadataKind::Medium,
            _ => MetadataKind::Small,
        }
    }

    /// The 2 bit tag stored in the top of a handle
    #[must_use]
    pub fn tag(self) -> u32 {
        self as u32
    }

    /// Local index bits this kind takes away from the image index
    #[must_use]
    pub fn extra_bits(self) -> u32 {
        EXTRA_SHIFT_BITS[self as usize]
    }

    /// Width of the local index field
    #[must_use]
    pub fn local_index_bits(self) -> u32 {
        METADATA_INDEX_BITS + self.extra_bits()
    }

    /// Mask selecting the local index field
    #[must_use]
    pub fn local_index_mask(self) -> u32 {
        LOCAL_INDEX_MASKS[self as usize]
    }

    /// Number of rows a single table of an image of this kind can address
    #[must_use]
    pub fn max_local_count(self) -> u32 {
        self.local_index_mask() + 1
    }

    /// Number of image indices carrying this kind (ordinal 0 of `Huge` is the AOT image)
    #[must_use]
    pub fn max_images(self) -> u32 {
        MAX_IMAGE_INDEX_WITHOUT_KIND >> self.extra_bits()
    }
}

/// Identifier of a loaded image; `0` is the AOT image.
///
/// The value is the 10-bit image-index field of a handle: the top two bits are the
/// kind tag, the lowest `extra(kind)` bits are zero.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ImageIndex(u32);

impl ImageIndex {
    /// The image holding all ahead-of-time compiled metadata
    pub const AOT: ImageIndex = ImageIndex(INVALID_IMAGE_INDEX);

    /// Wraps a raw image index
    #[must_use]
    pub const fn new(value: u32) -> Self {
        ImageIndex(value)
    }

    /// Builds the image index for the `ordinal`-th image of `kind`.
    ///
    /// Returns `None` if `kind` has no such ordinal.
    #[must_use]
    pub fn compose(kind: MetadataKind, ordinal: u32) -> Option<Self> {
        if ordinal >= kind.max_images() {
            return None;
        }

        let kind_bits = kind.tag() << (IMAGE_INDEX_BITS - METADATA_KIND_BITS);
        Some(ImageIndex(kind_bits | (ordinal << kind.extra_bits())))
    }

    /// Returns the raw image index
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// The handle layout used by every entity of this image
    #[must_use]
    pub fn kind(&self) -> MetadataKind {
        MetadataKind::from_tag(self.0 >> (IMAGE_INDEX_BITS - METADATA_KIND_BITS))
    }

    /// Position of this image among the images of the same kind
    #[must_use]
    pub fn ordinal(&self) -> u32 {
        (self.0 & (MAX_IMAGE_INDEX_WITHOUT_KIND - 1)) >> self.kind().extra_bits()
    }

    /// True for every image except the AOT one
    #[must_use]
    pub fn is_interpreter(&self) -> bool {
        self.0 != INVALID_IMAGE_INDEX
    }
}

impl From<u32> for ImageIndex {
    fn from(value: u32) -> Self {
        ImageIndex(value)
    }
}

impl fmt::Debug for ImageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ImageIndex({}, kind: {:?}, ordinal: {})",
            self.0,
            self.kind(),
            self.ordinal()
        )
    }
}

impl fmt::Display for ImageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Top two bits of a raw handle. Meaningless for [`INVALID_INDEX`].
#[must_use]
pub fn decode_kind(index: i32) -> MetadataKind {
    MetadataKind::from_tag((index as u32) >> METADATA_KIND_SHIFT_BITS)
}

/// Image index of a raw handle, `0` for [`INVALID_INDEX`]
#[must_use]
pub fn decode_image_index(index: i32) -> u32 {
    if index == INVALID_INDEX {
        return INVALID_IMAGE_INDEX;
    }

    let uindex = index as u32;
    (uindex & !decode_kind(index).local_index_mask()) >> IMAGE_INDEX_SHIFT_BITS
}

/// Local index of a raw handle, [`INVALID_INDEX`] stays [`INVALID_INDEX`]
#[must_use]
pub fn decode_local_index(index: i32) -> i32 {
    if index == INVALID_INDEX {
        return INVALID_INDEX;
    }

    ((index as u32) & decode_kind(index).local_index_mask()) as i32
}

/// Packs an image index and a local index into a raw handle.
///
/// # Errors
/// Returns [`Error::HandleOverlap`] if the image index is wider than 10 bits, if it has
/// bits set inside the local index field of its own kind, if the local index does not
/// fit that field, or if the packed value would collide with [`INVALID_INDEX`].
pub fn try_encode_image_and_local_index(image_index: u32, local_index: i32) -> Result<i32> {
    if local_index == INVALID_INDEX {
        return Ok(INVALID_INDEX);
    }

    let overlap = Error::HandleOverlap {
        image: ImageIndex(image_index),
        local: local_index,
    };

    if image_index >= MAX_IMAGE_COUNT || local_index < 0 {
        return Err(overlap);
    }

    let mask = ImageIndex(image_index).kind().local_index_mask();
    let image_bits = image_index << IMAGE_INDEX_SHIFT_BITS;
    if image_bits & mask != 0 || (local_index as u32) & !mask != 0 {
        return Err(overlap);
    }

    let packed = (image_bits | local_index as u32) as i32;
    if packed == INVALID_INDEX {
        return Err(overlap);
    }

    Ok(packed)
}

/// Packs an image index and a local index into a raw handle.
///
/// # Panics
/// Panics if the two fields would overlap (see [`try_encode_image_and_local_index`]).
/// That only happens when index-space accounting inside the runtime is broken, and a
/// handle built from it would silently point at the wrong entity.
#[must_use]
pub fn encode_image_and_local_index(image_index: u32, local_index: i32) -> i32 {
    match try_encode_image_and_local_index(image_index, local_index) {
        Ok(packed) => packed,
        Err(err) => panic!("corrupted metadata index accounting: {err}"),
    }
}

/// True if the raw handle is valid and belongs to an interpreter image
#[must_use]
pub fn is_interpreter_index(index: i32) -> bool {
    index != INVALID_INDEX && ((index as u32) & !LOCAL_INDEX_MASKS[0]) != 0
}

/// A packed reference to a metadata entity of some image.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetadataHandle(i32);

impl MetadataHandle {
    /// The "absent" handle
    pub const INVALID: MetadataHandle = MetadataHandle(INVALID_INDEX);

    /// Wraps a raw handle value as produced by an image loader
    #[must_use]
    pub const fn from_raw(value: i32) -> Self {
        MetadataHandle(value)
    }

    /// Packs `image` and `local_index` into a handle.
    ///
    /// A `local_index` of [`INVALID_INDEX`] yields [`MetadataHandle::INVALID`].
    ///
    /// # Panics
    /// Panics if the image index and local index overlap; see [`try_encode`](Self::try_encode).
    #[must_use]
    pub fn encode(image: ImageIndex, local_index: i32) -> Self {
        MetadataHandle(encode_image_and_local_index(image.value(), local_index))
    }

    /// Packs `image` and `local_index` into a handle, reporting overlaps as errors.
    ///
    /// # Errors
    /// Returns [`Error::HandleOverlap`] if the two fields can not share one handle.
    pub fn try_encode(image: ImageIndex, local_index: i32) -> Result<Self> {
        try_encode_image_and_local_index(image.value(), local_index).map(MetadataHandle)
    }

    /// Returns the raw handle value
    #[must_use]
    pub fn raw(&self) -> i32 {
        self.0
    }

    /// False for the sentinel
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.0 != INVALID_INDEX
    }

    /// The kind tag. Check [`is_valid`](Self::is_valid) first, the sentinel has no kind.
    #[must_use]
    pub fn kind(&self) -> MetadataKind {
        decode_kind(self.0)
    }

    /// The image this entity was loaded from, [`ImageIndex::AOT`] for the sentinel
    #[must_use]
    pub fn image_index(&self) -> ImageIndex {
        ImageIndex(decode_image_index(self.0))
    }

    /// Position inside the image's table, [`INVALID_INDEX`] for the sentinel
    #[must_use]
    pub fn local_index(&self) -> i32 {
        decode_local_index(self.0)
    }

    /// True if the entity lives in an interpreter image
    #[must_use]
    pub fn is_interpreter_origin(&self) -> bool {
        is_interpreter_index(self.0)
    }

    /// `None` for the sentinel, the handle otherwise
    #[must_use]
    pub fn valid(self) -> Option<Self> {
        self.is_valid().then_some(self)
    }
}

impl Default for MetadataHandle {
    fn default() -> Self {
        MetadataHandle::INVALID
    }
}

impl From<i32> for MetadataHandle {
    fn from(value: i32) -> Self {
        MetadataHandle(value)
    }
}

impl From<MetadataHandle> for i32 {
    fn from(handle: MetadataHandle) -> Self {
        handle.0
    }
}

impl fmt::Debug for MetadataHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return write!(f, "MetadataHandle(INVALID)");
        }

        write!(
            f,
            "MetadataHandle(0x{:08x}, kind: {:?}, image: {}, local: {})",
            self.0,
            self.kind(),
            self.image_index(),
            self.local_index()
        )
    }
}

impl fmt::Display for MetadataHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0 as u32)
    }
}
