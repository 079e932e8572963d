//! Image index allocation.
//!
//! Each kind has its own ordinal counter. An image asks for an index by its largest
//! table's row count; the allocator prefers the narrowest local index that fits, since
//! those kinds have the most image slots, and falls back to wider kinds once a kind's
//! ordinals are used up. Ordinal 0 of `Huge` is the AOT image and never handed out.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::{
    metadata::handle::{ImageIndex, MetadataKind},
    Error, Result,
};

/// Narrowest local index first
const ALLOCATION_ORDER: [MetadataKind; 4] = [
    MetadataKind::Small,
    MetadataKind::Medium,
    MetadataKind::Large,
    MetadataKind::Huge,
];

/// Thread-safe source of interpreter image indices
#[derive(Debug)]
pub struct ImageIndexAllocator {
    next: [AtomicU32; 4],
}

impl ImageIndexAllocator {
    /// Creates an allocator with every interpreter ordinal free
    #[must_use]
    pub fn new() -> Self {
        ImageIndexAllocator {
            next: [
                AtomicU32::new(1),
                AtomicU32::new(0),
                AtomicU32::new(0),
                AtomicU32::new(0),
            ],
        }
    }

    /// Allocates an index for an image whose largest table has `row_count` rows.
    ///
    /// # Errors
    /// Returns [`Error::ImageIndexExhausted`] with the widest kind that could address the
    /// rows if every fitting kind is out of ordinals, or with [`MetadataKind::Huge`] if
    /// no kind can address that many rows at all.
    pub fn allocate(&self, row_count: u32) -> Result<ImageIndex> {
        let mut widest_fit = MetadataKind::Huge;

        for kind in ALLOCATION_ORDER {
            // the last row of image 0x3FF would encode to the sentinel
            if row_count >= kind.max_local_count() {
                continue;
            }
            widest_fit = kind;

            let counter = &self.next[kind as usize];
            let claimed = counter.fetch_update(Ordering::AcqRel, Ordering::Acquire, |ordinal| {
                (ordinal < kind.max_images()).then_some(ordinal + 1)
            });

            if let Ok(ordinal) = claimed {
                if let Some(image) = ImageIndex::compose(kind, ordinal) {
                    tracing::debug!(%image, ?kind, ordinal, row_count, "allocated image index");
                    return Ok(image);
                }
            }
        }

        tracing::debug!(row_count, ?widest_fit, "image index space exhausted");
        Err(Error::ImageIndexExhausted(widest_fit))
    }
}

impl Default for ImageIndexAllocator {
    fn default() -> Self {
        Self::new()
    }
}
