//! Font loading for the document renderers.
//!
//! The renderers embed the bundled Roboto family.  The font files are looked
//! up under `assets/fonts` next to the crate manifest, or in the directory
//! named by the `EVENT_DOCS_FONTS_DIR` environment variable when set.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::Error;
use genpdf::fonts::{self, FontData, FontFamily};

/// Name of the bundled font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

/// Environment variable that overrides the font directory.
pub const FONTS_DIR_ENV: &str = "EVENT_DOCS_FONTS_DIR";

const FONT_FILES: &[&str] = &[
    "Roboto-Regular.ttf",
    "Roboto-Bold.ttf",
    "Roboto-Italic.ttf",
    "Roboto-BoldItalic.ttf",
];

fn font_directory() -> PathBuf {
    match env::var_os(FONTS_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts"),
    }
}

fn ensure_fonts_present(directory: &Path) -> Result<(), Error> {
    let missing: Vec<_> = FONT_FILES
        .iter()
        .map(|name| directory.join(name))
        .filter(|candidate| !candidate.is_file())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    let display_list = missing
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");

    Err(Error::new(
        format!(
            "Missing font files: {}. See assets/fonts/README.md or set {}.",
            display_list, FONTS_DIR_ENV
        ),
        io::Error::new(io::ErrorKind::NotFound, "bundled fonts missing"),
    ))
}

/// Loads the bundled Roboto family as a `genpdf` font family definition.
pub fn default_font_family() -> Result<FontFamily<FontData>, Error> {
    let directory = font_directory();
    ensure_fonts_present(&directory)?;

    fonts::from_files(&directory, DEFAULT_FONT_FAMILY_NAME, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load font family '{}' from {}: {}",
                DEFAULT_FONT_FAMILY_NAME,
                directory.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

/// Indicates whether all bundled font files are present on disk.
///
/// Rendering tests use this to skip when the assets have not been fetched.
pub fn default_fonts_available() -> bool {
    let directory = font_directory();
    FONT_FILES
        .iter()
        .map(|name| directory.join(name))
        .all(|path| path.is_file())
}
