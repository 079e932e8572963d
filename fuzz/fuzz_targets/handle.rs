#![no_main]

use hybridmeta::metadata::handle::{ImageIndex, MetadataHandle};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (u32, i32, i32)| {
    let (image, local, raw) = data;

    // a successfully packed handle must decode to its parts
    if let Ok(handle) = MetadataHandle::try_encode(ImageIndex::new(image), local) {
        if handle.is_valid() {
            assert_eq!(handle.image_index().value(), image);
            assert_eq!(handle.local_index(), local);
            assert_eq!(handle.is_interpreter_origin(), image != 0);
        }
    }

    // decoding arbitrary values never panics and re-encodes to the same bits
    let handle = MetadataHandle::from_raw(raw);
    if handle.is_valid() {
        let again = MetadataHandle::try_encode(handle.image_index(), handle.local_index());
        assert_eq!(again.ok().map(|h| h.raw()), Some(raw));
    }
});
