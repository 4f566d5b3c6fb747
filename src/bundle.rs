//! Bundling of per-participant source PDFs into a zip archive or one merged
//! document.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::DocumentError;

/// How the usable source documents are packaged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BundleMode {
    /// One archive entry per source document.
    Zip,
    /// All pages appended into a single PDF, in selection order.
    MergedPdf,
}

impl BundleMode {
    /// Parses a request parameter.  Unknown values yield `None`; the caller
    /// must surface that as an error instead of silently producing nothing.
    pub fn from_param(param: &str) -> Option<Self> {
        match param {
            "zip" => Some(Self::Zip),
            "pdf" => Some(Self::MergedPdf),
            _ => None,
        }
    }
}

/// One participant's contribution to a bundle.
///
/// `path` is `None` when no source document exists for the participant; such
/// entries are skipped without error.
#[derive(Clone, Debug)]
pub struct BundleSource {
    /// Display name used to label the archive entry.
    pub label: String,
    /// Location of the source document, if one was ever stored.
    pub path: Option<PathBuf>,
}

impl BundleSource {
    /// Creates a bundle source.
    pub fn new(label: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self {
            label: label.into(),
            path,
        }
    }
}

/// Packages source documents into a single downloadable payload.
#[derive(Clone, Debug, Default)]
pub struct ArtifactBundler {
    scratch_dir: Option<PathBuf>,
}

impl ArtifactBundler {
    /// Creates a bundler that places scratch files in the system temp
    /// directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Places scratch files in `dir` instead of the system temp directory.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Bundles every usable source into a payload of the requested mode.
    ///
    /// Returns `Ok(None)` when no source in the selection has a document,
    /// without creating any scratch resource.  A source whose file exists in
    /// the relation but cannot be opened or parsed is an error, not a skip;
    /// the scratch file is removed on that path as well.
    pub fn bundle(
        &self,
        mode: BundleMode,
        sources: &[BundleSource],
    ) -> Result<Option<Vec<u8>>, DocumentError> {
        let usable: Vec<(&str, &Path)> = sources
            .iter()
            .filter_map(|source| {
                source
                    .path
                    .as_deref()
                    .map(|path| (source.label.as_str(), path))
            })
            .collect();

        debug!(
            "bundling {} of {} selected sources as {:?}",
            usable.len(),
            sources.len(),
            mode
        );

        if usable.is_empty() {
            return Ok(None);
        }

        let payload = match mode {
            BundleMode::Zip => self.write_archive(&usable)?,
            BundleMode::MergedPdf => merge_documents(&usable)?,
        };
        Ok(Some(payload))
    }

    // The scratch file is owned by a `NamedTempFile`, so it is unlinked when
    // this function returns on every path, including early `?` exits.
    fn write_archive(&self, usable: &[(&str, &Path)]) -> Result<Vec<u8>, DocumentError> {
        let scratch = match &self.scratch_dir {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new()?,
        };

        let mut archive = ZipWriter::new(scratch.as_file());
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        // Entry numbers are dense over usable sources only, so two
        // participants with the same display name never collide.
        for (index, (label, path)) in usable.iter().enumerate() {
            let entry = format!("{}_{}.pdf", index + 1, entry_label(label));
            archive.start_file(entry, options)?;
            let mut source = File::open(path)?;
            io::copy(&mut source, &mut archive)?;
        }
        archive.finish()?;

        let payload = std::fs::read(scratch.path())?;
        Ok(payload)
    }
}

// Display names go straight into entry names; path separators would turn a
// flat archive into nested directories on extraction.
fn entry_label(label: &str) -> String {
    label.replace(['/', '\\'], "_")
}

// Page attributes a page may inherit from its ancestors in the page tree.
// They must be copied onto each page before re-parenting, because the merged
// document gets a fresh root that carries none of them.
const INHERITABLE_PAGE_KEYS: &[&[u8]] = &[b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Appends the pages of every source document into one output PDF,
/// preserving the given order.
fn merge_documents(usable: &[(&str, &Path)]) -> Result<Vec<u8>, DocumentError> {
    let mut max_id = 1;
    let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();
    let mut catalog: Option<(ObjectId, Dictionary)> = None;
    let mut output = Document::with_version("1.5");

    for (_, path) in usable {
        let mut document = Document::load(path).map_err(|source| DocumentError::SourcePdf {
            path: path.to_path_buf(),
            source,
        })?;

        document.renumber_objects_with(max_id);
        max_id = document.max_id + 1;

        for (_, page_id) in document.get_pages() {
            pages.push((page_id, flattened_page(&document, page_id, path)?));
        }

        for (object_id, object) in document.objects {
            match dictionary_type(&object) {
                b"Catalog" => {
                    if catalog.is_none() {
                        if let Ok(dictionary) = object.as_dict() {
                            catalog = Some((object_id, dictionary.clone()));
                        }
                    }
                }
                // Pages were flattened above; source page trees and outlines
                // would dangle in the output.
                b"Page" | b"Pages" | b"Outlines" | b"Outline" => {}
                _ => {
                    output.objects.insert(object_id, object);
                }
            }
        }
    }

    let (catalog_id, mut catalog_dictionary) = catalog.ok_or_else(|| malformed(usable))?;

    let pages_root_id: ObjectId = (max_id, 0);
    for (page_id, page) in &mut pages {
        page.set("Parent", pages_root_id);
        output
            .objects
            .insert(*page_id, Object::Dictionary(page.clone()));
    }

    // The root is built fresh: every inheritable attribute already sits on
    // the pages themselves.
    let mut pages_dictionary = Dictionary::new();
    pages_dictionary.set("Type", Object::Name("Pages".into()));
    pages_dictionary.set("Count", pages.len() as i64);
    pages_dictionary.set(
        "Kids",
        pages
            .iter()
            .map(|(page_id, _)| Object::Reference(*page_id))
            .collect::<Vec<_>>(),
    );
    output
        .objects
        .insert(pages_root_id, Object::Dictionary(pages_dictionary));

    catalog_dictionary.set("Pages", pages_root_id);
    catalog_dictionary.remove(b"Outlines");
    output
        .objects
        .insert(catalog_id, Object::Dictionary(catalog_dictionary));

    output.trailer.set("Root", catalog_id);
    output.max_id = max_id + 1;
    output.renumber_objects();
    output.compress();

    let mut bytes = Vec::new();
    output
        .save_to(&mut bytes)
        .map_err(|err| DocumentError::MergeWrite(err.into()))?;
    Ok(bytes)
}

// Clones the page dictionary and pulls every inheritable attribute the page
// does not carry itself down from its nearest ancestor.
fn flattened_page(
    document: &Document,
    page_id: ObjectId,
    path: &Path,
) -> Result<Dictionary, DocumentError> {
    let mut page = document
        .get_object(page_id)
        .map_err(|source| DocumentError::SourcePdf {
            path: path.to_path_buf(),
            source,
        })?
        .as_dict()
        .map_err(|_| DocumentError::MalformedSource {
            path: path.to_path_buf(),
        })?
        .clone();

    for key in INHERITABLE_PAGE_KEYS {
        if page.has(key) {
            continue;
        }
        if let Some(value) = inherited_attribute(document, &page, key) {
            page.set(key.to_vec(), value);
        }
    }
    Ok(page)
}

fn inherited_attribute(document: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut ancestor = parent_of(page);
    while let Some(node_id) = ancestor {
        let node = document.get_object(node_id).ok()?.as_dict().ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        ancestor = parent_of(node);
    }
    None
}

fn parent_of(node: &Dictionary) -> Option<ObjectId> {
    node.get(b"Parent").ok().and_then(|value| value.as_reference().ok())
}

fn dictionary_type(object: &Object) -> &[u8] {
    object
        .as_dict()
        .ok()
        .and_then(|dictionary| dictionary.get(b"Type").ok())
        .and_then(|value| value.as_name().ok())
        .unwrap_or(b"")
}

fn malformed(usable: &[(&str, &Path)]) -> DocumentError {
    let path = usable
        .first()
        .map(|(_, path)| path.to_path_buf())
        .unwrap_or_default();
    DocumentError::MalformedSource { path }
}
