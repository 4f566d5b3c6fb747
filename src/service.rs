//! Orchestration facade that turns an assembly request into a document.
//!
//! The service resolves the caller's raw selection against the explicit
//! eligible set, dispatches to the matching renderer or bundler, and wraps
//! every result in a uniform [`Outcome`].  All work is synchronous and does
//! blocking file I/O; callers running inside an async server should move
//! calls onto a blocking-tolerant worker.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::Local;
use log::{debug, warn};

use crate::badges::BadgeRenderer;
use crate::bundle::{ArtifactBundler, BundleMode, BundleSource};
use crate::error::DocumentError;
use crate::model::{BadgeOptions, EligibleSet, EntityId, EventRef, Participant};
use crate::table::TableDocument;

const MIME_PDF: &str = "application/pdf";
const MIME_ZIP: &str = "application/zip";
const DATE_FORMAT: &str = "%d.%m.%Y";

/// Loads participant records by identifier.
pub trait EntityStore {
    /// Returns the participants matching `ids`.  Unknown identifiers are
    /// simply absent from the result.
    fn find_all_by_id(&self, ids: &[EntityId]) -> Vec<Participant>;
}

/// Locates previously stored per-participant documents (agreement letters).
pub trait SourceArtifactProvider {
    /// Returns the path of the participant's document for `event`, or `None`
    /// when no document was ever uploaded.
    fn artifact_path_for(&self, participant: &Participant, event: &EventRef) -> Option<PathBuf>;
}

/// Which artifact the caller asked for.
#[derive(Clone, Debug)]
pub enum AssemblyMode {
    /// Badge sheet with the given display options.
    Badges(BadgeOptions),
    /// Table of applications (name, birth date, annotation).
    Applications,
    /// Participant roster including dietary information.
    RosterWithDietary,
    /// Bundle of stored agreement letters.
    AgreementLetters(BundleMode),
}

/// A single assembly request.
#[derive(Clone, Debug)]
pub struct AssemblyRequest {
    pub event: EventRef,
    /// Raw participant identifiers as submitted by the caller.
    pub selection: Vec<EntityId>,
    /// Participants allowed to appear in the artifact.  Computed by the
    /// caller; identifiers outside this set are dropped silently.
    pub eligible: EligibleSet,
    pub mode: AssemblyMode,
}

/// A complete binary payload ready to be streamed to the client.
#[derive(Clone, Debug)]
pub struct Artifact {
    pub payload: Vec<u8>,
    pub filename: String,
    pub mime_type: &'static str,
}

/// Why no document was produced, without anything having gone wrong.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmptyReason {
    /// The raw selection was empty, or nothing in it was eligible.
    NoSelection,
    /// Every selected participant lacked a stored source document.
    NoSourceArtifacts,
}

/// Why assembly failed in a way the caller can present and retry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureReason {
    /// The uploaded logo was not a supported raster image.
    UnsupportedLogoImage,
    /// A scratch file or source file could not be created, read, or written.
    Scratch,
    /// The layout engine or PDF merge rejected the documents.
    Render,
}

/// Result of [`DocumentAssemblyService::assemble`].
#[derive(Clone, Debug)]
pub enum Outcome {
    /// A complete, valid payload.
    Success(Artifact),
    /// Nothing to do; the reason distinguishes the two empty cases.
    Empty(EmptyReason),
    /// Assembly aborted; repeating the request is safe.
    RecoverableError(FailureReason),
}

/// Facade over the renderers and the bundler.
pub struct DocumentAssemblyService<S, A> {
    store: S,
    artifacts: A,
    bundler: ArtifactBundler,
}

impl<S: EntityStore, A: SourceArtifactProvider> DocumentAssemblyService<S, A> {
    /// Creates a service with a default-configured bundler.
    pub fn new(store: S, artifacts: A) -> Self {
        Self {
            store,
            artifacts,
            bundler: ArtifactBundler::new(),
        }
    }

    /// Replaces the bundler, e.g. to redirect scratch files.
    pub fn with_bundler(mut self, bundler: ArtifactBundler) -> Self {
        self.bundler = bundler;
        self
    }

    /// Assembles the requested artifact.
    ///
    /// An empty raw selection, or one that resolves to zero eligible
    /// participants, short-circuits to [`Outcome::Empty`] before any renderer
    /// or filesystem work happens.
    pub fn assemble(&self, request: &AssemblyRequest) -> Outcome {
        if request.selection.is_empty() {
            return Outcome::Empty(EmptyReason::NoSelection);
        }

        let resolved = self.resolve_selection(request);
        if resolved.is_empty() {
            return Outcome::Empty(EmptyReason::NoSelection);
        }
        debug!(
            "assembling {} for event '{}' with {} of {} selected participants",
            mode_label(&request.mode),
            request.event.name,
            resolved.len(),
            request.selection.len()
        );

        match &request.mode {
            AssemblyMode::Badges(options) => self.assemble_badges(request, &resolved, options),
            AssemblyMode::Applications => wrap(
                applications_table(&request.event, &resolved).render(),
                filename("applications", &request.event, "pdf"),
                MIME_PDF,
            ),
            AssemblyMode::RosterWithDietary => wrap(
                roster_table(&request.event, &resolved).render(),
                filename("roster_dietary", &request.event, "pdf"),
                MIME_PDF,
            ),
            AssemblyMode::AgreementLetters(mode) => {
                self.assemble_agreement_letters(request, &resolved, *mode)
            }
        }
    }

    // Preserves the raw selection order; unknown and ineligible identifiers
    // are dropped silently.
    fn resolve_selection(&self, request: &AssemblyRequest) -> Vec<Participant> {
        let loaded = self.store.find_all_by_id(&request.selection);
        let mut by_id: HashMap<EntityId, Participant> = loaded
            .into_iter()
            .map(|participant| (participant.id, participant))
            .collect();

        request
            .selection
            .iter()
            .filter(|id| request.eligible.contains(*id))
            .filter_map(|id| by_id.remove(id))
            .collect()
    }

    fn assemble_badges(
        &self,
        request: &AssemblyRequest,
        resolved: &[Participant],
        options: &BadgeOptions,
    ) -> Outcome {
        wrap(
            BadgeRenderer::render(&request.event, resolved, options),
            filename("badges", &request.event, "pdf"),
            MIME_PDF,
        )
    }

    fn assemble_agreement_letters(
        &self,
        request: &AssemblyRequest,
        resolved: &[Participant],
        mode: BundleMode,
    ) -> Outcome {
        let sources: Vec<BundleSource> = resolved
            .iter()
            .map(|participant| {
                BundleSource::new(
                    participant.display_name.clone(),
                    self.artifacts.artifact_path_for(participant, &request.event),
                )
            })
            .collect();

        let (extension, mime_type) = match mode {
            BundleMode::Zip => ("zip", MIME_ZIP),
            BundleMode::MergedPdf => ("pdf", MIME_PDF),
        };

        match self.bundler.bundle(mode, &sources) {
            Ok(Some(payload)) => Outcome::Success(Artifact {
                payload,
                filename: filename("agreement_letters", &request.event, extension),
                mime_type,
            }),
            Ok(None) => Outcome::Empty(EmptyReason::NoSourceArtifacts),
            Err(err) => failure(err),
        }
    }
}

fn mode_label(mode: &AssemblyMode) -> &'static str {
    match mode {
        AssemblyMode::Badges(_) => "badges",
        AssemblyMode::Applications => "applications",
        AssemblyMode::RosterWithDietary => "roster_dietary",
        AssemblyMode::AgreementLetters(BundleMode::Zip) => "agreement_letters/zip",
        AssemblyMode::AgreementLetters(BundleMode::MergedPdf) => "agreement_letters/pdf",
    }
}

fn applications_table(event: &EventRef, participants: &[Participant]) -> TableDocument {
    TableDocument::new(format!("Applications - {}", event.name))
        .header(["First name", "Last name", "Date of birth", "Annotation"])
        .rows(participants.iter().map(|participant| {
            vec![
                participant.first_name.clone(),
                participant.last_name.clone(),
                format_birth_date(participant),
                participant.annotation.clone(),
            ]
        }))
}

fn roster_table(event: &EventRef, participants: &[Participant]) -> TableDocument {
    TableDocument::new(format!("Participants - {}", event.name))
        .header(["First name", "Last name", "Date of birth", "Allergies"])
        .rows(participants.iter().map(|participant| {
            vec![
                participant.first_name.clone(),
                participant.last_name.clone(),
                format_birth_date(participant),
                participant.allergies.clone(),
            ]
        }))
}

// Date formatting happens here, not in the table renderer, which only ever
// sees finished strings.
fn format_birth_date(participant: &Participant) -> String {
    participant
        .birth_date
        .map(|date| date.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

fn filename(kind: &str, event: &EventRef, extension: &str) -> String {
    format!(
        "{}_{}_{}.{}",
        kind,
        event.slug(),
        Local::now().date_naive(),
        extension
    )
}

fn wrap(
    result: Result<Vec<u8>, DocumentError>,
    filename: String,
    mime_type: &'static str,
) -> Outcome {
    match result {
        Ok(payload) => Outcome::Success(Artifact {
            payload,
            filename,
            mime_type,
        }),
        Err(err) => failure(err),
    }
}

fn failure(err: DocumentError) -> Outcome {
    let reason = match &err {
        DocumentError::UnsupportedImage(_) => FailureReason::UnsupportedLogoImage,
        DocumentError::Io(_) | DocumentError::Archive(_) => FailureReason::Scratch,
        DocumentError::Layout(_)
        | DocumentError::SourcePdf { .. }
        | DocumentError::MalformedSource { .. }
        | DocumentError::MergeWrite(_) => FailureReason::Render,
    };
    warn!("document assembly failed ({reason:?}): {err}");
    Outcome::RecoverableError(reason)
}
