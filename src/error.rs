//! Error types shared by the renderers, the bundler, and the assembly service.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while rendering or bundling documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The provided logo bytes are not a supported raster image format.
    ///
    /// This is a recoverable user-input condition: the badge document has not
    /// been written at this point and the request can simply be repeated with
    /// a different file.
    #[error("unsupported logo image format: {0}")]
    UnsupportedImage(#[source] image::ImageError),

    /// The page layout engine rejected the document.
    #[error("pdf layout failed: {0}")]
    Layout(#[from] genpdf::error::Error),

    /// A source PDF could not be loaded or parsed.
    #[error("failed to read source pdf {path}: {source}")]
    SourcePdf {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    /// A source document is missing the objects needed to splice its pages.
    #[error("source pdf {path} has no usable page tree")]
    MalformedSource { path: PathBuf },

    /// Serializing the merged output document failed.
    #[error("failed to serialize merged pdf: {0}")]
    MergeWrite(#[source] lopdf::Error),

    /// Writing the archive failed.
    #[error("archive write failed: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Creating, writing, or reading back a scratch file failed.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}
