use thiserror::Error;

use crate::metadata::handle::{ImageIndex, MetadataHandle, MetadataKind};

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Fatal invariant violations (a handle whose image-index and local-index fields would
/// overlap) are not represented here: [`MetadataHandle::encode`] panics on those, since
/// they indicate broken index accounting inside the runtime rather than bad input.
///
/// # Error Categories
///
/// ## Metadata Errors
/// - [`Error::Malformed`] - An attribute bitfield or table entry holds an unrecognized pattern
/// - [`Error::RecursionLimit`] - Generic substitution nested deeper than allowed
///
/// ## Member Resolution Errors
/// - [`Error::MissingField`] - A required field does not exist on the target type
/// - [`Error::MissingMethod`] - A required method does not exist on the target type
///
/// ## Image Accounting Errors
/// - [`Error::HandleOverlap`] - Image index and local index can not share one handle
/// - [`Error::ImageIndexExhausted`] - No image index left for the requested size
/// - [`Error::IndexSpaceExhausted`] - An image has more rows than its kind can address
/// - [`Error::ImageAlreadyRegistered`] - An image index was registered twice
/// - [`Error::ImageNotRegistered`] - A handle points into an image that was never registered
///
/// # Examples
///
/// ```rust
/// use hybridmeta::{Error, metadata::handle::{ImageIndex, MetadataHandle}};
///
/// match MetadataHandle::try_encode(ImageIndex::new(0x040), 0x1000_0000) {
///     Ok(handle) => println!("encoded {handle}"),
///     Err(Error::HandleOverlap { image, local }) => {
///         eprintln!("image {image} can not carry local index {local}");
///     }
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The metadata is damaged or uses a pattern this runtime does not understand.
    ///
    /// Raised for attribute bitfields outside the recognized enumerations, generic
    /// variables pointing past their instantiation and table entries that refer to
    /// rows which do not exist. The error includes the source location where the
    /// malformation was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A field requested through the throwing resolution path does not exist.
    ///
    /// Hosts translate this into their reflection-style `MissingFieldException`.
    #[error("Field not found - {type_name}::{field}")]
    MissingField {
        /// Full name of the type that was searched
        type_name: String,
        /// Name of the requested field
        field: String,
    },

    /// A method requested through the throwing resolution path does not exist.
    #[error("Method not found - {type_name}::{method}")]
    MissingMethod {
        /// Full name of the type that was searched
        type_name: String,
        /// Name of the requested method
        method: String,
    },

    /// The image index and the local index would overlap inside one handle.
    ///
    /// Returned by [`MetadataHandle::try_encode`]; the non-checking
    /// [`MetadataHandle::encode`] panics instead.
    #[error("Image index {image} overlaps local index 0x{local:08x}")]
    HandleOverlap {
        /// The image index that was requested
        image: ImageIndex,
        /// The local index that was requested
        local: i32,
    },

    /// No free image index is left that can address the requested amount of rows.
    #[error("No image index left for kind {0:?}")]
    ImageIndexExhausted(MetadataKind),

    /// An image holds more rows in one table than its kind can address.
    #[error("Image {0} ran out of local index space")]
    IndexSpaceExhausted(ImageIndex),

    /// The image index was already registered.
    ///
    /// Images are append-only; re-registering would invalidate handles other threads
    /// may already have cached.
    #[error("Image {0} is already registered")]
    ImageAlreadyRegistered(ImageIndex),

    /// A handle references an image that was never registered.
    #[error("Image {0} is not registered - handle {1}")]
    ImageNotRegistered(ImageIndex, MetadataHandle),

    /// Recursion limit reached.
    ///
    /// To prevent stack overflow during generic substitution or signature comparison,
    /// a maximum recursion depth is enforced. This error indicates that limit was exceeded.
    ///
    /// The associated value shows the recursion limit that was reached.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),
}
