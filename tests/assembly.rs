mod common;

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

use event_docs::bundle::{ArtifactBundler, BundleMode};
use event_docs::model::{BadgeOptions, EntityId, EventRef, Participant};
use event_docs::service::{
    AssemblyMode, AssemblyRequest, DocumentAssemblyService, EmptyReason, EntityStore,
    FailureReason, Outcome, SourceArtifactProvider,
};
use zip::ZipArchive;

struct MemStore(Vec<Participant>);

impl EntityStore for MemStore {
    fn find_all_by_id(&self, ids: &[EntityId]) -> Vec<Participant> {
        self.0
            .iter()
            .filter(|participant| ids.contains(&participant.id))
            .cloned()
            .collect()
    }
}

struct MapArtifacts(HashMap<EntityId, PathBuf>);

impl SourceArtifactProvider for MapArtifacts {
    fn artifact_path_for(&self, participant: &Participant, _event: &EventRef) -> Option<PathBuf> {
        self.0.get(&participant.id).cloned()
    }
}

fn event() -> EventRef {
    EventRef::new(5, "Winter Camp")
}

fn eligible(ids: &[EntityId]) -> BTreeSet<EntityId> {
    ids.iter().copied().collect()
}

fn service(
    participants: Vec<Participant>,
    letters: HashMap<EntityId, PathBuf>,
) -> DocumentAssemblyService<MemStore, MapArtifacts> {
    DocumentAssemblyService::new(MemStore(participants), MapArtifacts(letters))
}

#[test]
fn empty_selection_short_circuits() {
    let scratch = tempfile::tempdir().unwrap();
    let svc = service(vec![common::participant(1, "Ada")], HashMap::new())
        .with_bundler(ArtifactBundler::new().with_scratch_dir(scratch.path()));

    let outcome = svc.assemble(&AssemblyRequest {
        event: event(),
        selection: Vec::new(),
        eligible: eligible(&[1]),
        mode: AssemblyMode::AgreementLetters(BundleMode::Zip),
    });

    assert!(matches!(outcome, Outcome::Empty(EmptyReason::NoSelection)));
    // Nothing may have been created in the scratch directory.
    assert!(fs::read_dir(scratch.path()).unwrap().next().is_none());
}

#[test]
fn fully_ineligible_selection_is_treated_as_empty() {
    let svc = service(
        vec![common::participant(1, "Ada"), common::participant(2, "Ben")],
        HashMap::new(),
    );

    let outcome = svc.assemble(&AssemblyRequest {
        event: event(),
        selection: vec![1, 2],
        eligible: eligible(&[99]),
        mode: AssemblyMode::AgreementLetters(BundleMode::Zip),
    });

    assert!(matches!(outcome, Outcome::Empty(EmptyReason::NoSelection)));
}

#[test]
fn agreement_letter_zip_skips_participants_without_letters() {
    let fixtures = tempfile::tempdir().unwrap();
    let letter_a = fixtures.path().join("a.pdf");
    let letter_c = fixtures.path().join("c.pdf");
    fs::write(&letter_a, common::tiny_pdf(1, 500)).unwrap();
    fs::write(&letter_c, common::tiny_pdf(1, 600)).unwrap();

    let svc = service(
        vec![
            common::participant(1, "Ada"),
            common::participant(2, "Ben"),
            common::participant(3, "Cleo"),
        ],
        HashMap::from([(1, letter_a), (3, letter_c)]),
    );

    let outcome = svc.assemble(&AssemblyRequest {
        event: event(),
        selection: vec![1, 2, 3],
        eligible: eligible(&[1, 2, 3]),
        mode: AssemblyMode::AgreementLetters(BundleMode::Zip),
    });

    let Outcome::Success(artifact) = outcome else {
        panic!("expected success");
    };
    assert_eq!(artifact.mime_type, "application/zip");
    assert!(artifact.filename.starts_with("agreement_letters_winter-camp_"));
    assert!(artifact.filename.ends_with(".zip"));

    let mut archive = ZipArchive::new(Cursor::new(&artifact.payload)).unwrap();
    let names: Vec<String> = (0..archive.len())
        .map(|index| archive.by_index(index).unwrap().name().to_string())
        .collect();
    assert_eq!(names, vec!["1_Ada.pdf", "2_Cleo.pdf"]);
}

#[test]
fn merged_agreement_letters_preserve_selection_order() {
    let fixtures = tempfile::tempdir().unwrap();
    let letter_a = fixtures.path().join("a.pdf");
    let letter_b = fixtures.path().join("b.pdf");
    fs::write(&letter_a, common::tiny_pdf(2, 500)).unwrap();
    fs::write(&letter_b, common::tiny_pdf(1, 600)).unwrap();

    let svc = service(
        vec![common::participant(1, "Ada"), common::participant(2, "Ben")],
        HashMap::from([(1, letter_a), (2, letter_b)]),
    );

    let outcome = svc.assemble(&AssemblyRequest {
        event: event(),
        selection: vec![1, 2],
        eligible: eligible(&[1, 2]),
        mode: AssemblyMode::AgreementLetters(BundleMode::MergedPdf),
    });

    let Outcome::Success(artifact) = outcome else {
        panic!("expected success");
    };
    assert_eq!(artifact.mime_type, "application/pdf");
    assert!(artifact.filename.ends_with(".pdf"));

    let merged = lopdf::Document::load_mem(&artifact.payload).unwrap();
    assert_eq!(merged.get_pages().len(), 3);
}

#[test]
fn missing_letters_for_everyone_is_a_distinct_empty_outcome() {
    let svc = service(
        vec![common::participant(1, "Ada"), common::participant(2, "Ben")],
        HashMap::new(),
    );

    let outcome = svc.assemble(&AssemblyRequest {
        event: event(),
        selection: vec![1, 2],
        eligible: eligible(&[1, 2]),
        mode: AssemblyMode::AgreementLetters(BundleMode::Zip),
    });

    assert!(matches!(
        outcome,
        Outcome::Empty(EmptyReason::NoSourceArtifacts)
    ));
}

#[test]
fn unsupported_badge_logo_is_a_recoverable_error() {
    let svc = service(vec![common::participant(1, "Ada")], HashMap::new());

    let outcome = svc.assemble(&AssemblyRequest {
        event: event(),
        selection: vec![1],
        eligible: eligible(&[1]),
        mode: AssemblyMode::Badges(
            BadgeOptions::new().with_logo(b"this is not an image".to_vec()),
        ),
    });

    assert!(matches!(
        outcome,
        Outcome::RecoverableError(FailureReason::UnsupportedLogoImage)
    ));
}
