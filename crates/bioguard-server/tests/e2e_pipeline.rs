//! End-to-end pipeline tests: frames in, status lines out, files on disk.
//!
//! These tests wire the real stores onto temp directories and drive the
//! router exactly as the transport does, one frame per request.

use std::path::Path;
use std::sync::Arc;

use bioguard_core::integrity;
use bioguard_server::assembly::{self, StoragePaths};
use bioguard_server::protocol::Router;

const EBOLA_SEQUENCE: &str = "GAGTATGTGAATAGATATATATTAGTAGTAGTAAAGTT";

struct TestServer {
    router: Arc<Router>,
    paths: StoragePaths,
    _root: tempfile::TempDir,
}

impl TestServer {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let paths = StoragePaths::under_root(root.path());
        let router = assembly::build_router(&paths).unwrap();
        Self {
            router,
            paths,
            _root: root,
        }
    }

    fn send(&self, frame: &str) -> String {
        self.router.dispatch(frame).message
    }

    fn register_patient(&self, document: &str) -> String {
        self.send(&format!(
            "POST patient\napplication/fasta\n>{document}|Juan|Perez|30|juan@mail.com|MASCULINO|Bogota|Colombia"
        ))
    }

    fn register_disease(&self, name: &str, level: &str, sequence: &str) -> String {
        self.send(&format!(
            "POST disease\napplication/fasta\n>{name}|{level}\n{sequence}"
        ))
    }

    fn diagnose(&self, document: &str, date: &str, sequence: &str) -> String {
        self.send(&format!(
            "POST diagnose\napplication/fasta\n>{document}|{date}\n{sequence}"
        ))
    }

    /// The single per-patient directory under the diagnostics root.
    fn patient_directory(&self) -> std::path::PathBuf {
        let mut dirs: Vec<_> = std::fs::read_dir(&self.paths.diagnostics_directory)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.is_dir())
            .collect();
        assert_eq!(dirs.len(), 1, "expected exactly one patient directory");
        dirs.remove(0)
    }
}

fn files_in(dir: &Path) -> Vec<std::path::PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

#[test]
fn patient_registration_creates_one_csv_row() {
    let server = TestServer::new();
    let response = server.register_patient("12345678");
    assert!(
        response.starts_with("[TCP][201][Created]"),
        "unexpected response: {response}"
    );

    let content = std::fs::read_to_string(&server.paths.patients_csv).unwrap();
    assert_eq!(content.lines().count(), 2);
    assert!(content.lines().nth(1).unwrap().contains("12345678"));
}

#[test]
fn duplicate_patient_maps_to_validation_error() {
    let server = TestServer::new();
    assert!(server
        .register_patient("12345678")
        .starts_with("[TCP][201][Created]"));
    let second = server.register_patient("12345678");
    assert!(
        second.starts_with("[TCP][400][ValidationError]"),
        "unexpected response: {second}"
    );
}

#[test]
fn disease_registration_writes_the_hash_named_file() {
    let server = TestServer::new();
    let response = server.register_disease("ebola", "ALTA", EBOLA_SEQUENCE);
    assert!(
        response.starts_with("[TCP][201][Created]"),
        "unexpected response: {response}"
    );
    assert!(response.contains("virus ebola registrado exitosamente"));

    let expected = integrity::hash(&format!(">ebola|ALTA\n{EBOLA_SEQUENCE}"));
    let files = files_in(&server.paths.diseases_directory);
    assert_eq!(files.len(), 1);
    assert_eq!(
        files[0].file_name().unwrap().to_string_lossy(),
        format!("{expected}.fasta")
    );
}

#[test]
fn duplicate_disease_maps_to_validation_error() {
    let server = TestServer::new();
    server.register_disease("ebola", "ALTA", EBOLA_SEQUENCE);
    let second = server.register_disease("ebola", "ALTA", EBOLA_SEQUENCE);
    assert!(second.starts_with("[TCP][400][ValidationError]"));
    assert_eq!(files_in(&server.paths.diseases_directory).len(), 1);
}

#[test]
fn diagnosis_with_a_single_match() {
    let server = TestServer::new();
    server.register_patient("12345678");
    server.register_disease("ebola", "ALTA", EBOLA_SEQUENCE);

    let response = server.diagnose("12345678", "2025-02-19", "GAGTATGTGAA");
    assert_eq!(
        response,
        "[TCP][200][Success] diagnostico generado exitosamente | enfermedades_detectadas: 1"
    );

    let patient_dir = server.patient_directory();
    assert_eq!(files_in(&patient_dir.join("samples")).len(), 1);
    assert_eq!(files_in(&patient_dir.join("generated_diagnostics")).len(), 1);
    assert!(!response.contains("criterio_alta_infecciosidad"));
    assert!(!response.contains("historial_muestras"));
}

#[test]
fn duplicate_diagnosis_is_a_conflict() {
    let server = TestServer::new();
    server.register_patient("12345678");
    server.register_disease("ebola", "ALTA", EBOLA_SEQUENCE);

    assert!(server
        .diagnose("12345678", "2025-02-19", "GAGTATGTGAA")
        .starts_with("[TCP][200][Success]"));
    let second = server.diagnose("12345678", "2025-02-19", "GAGTATGTGAA");
    assert!(
        second.starts_with("[TCP][409][Conflict]"),
        "unexpected response: {second}"
    );
}

#[test]
fn high_infectivity_report_is_emitted_at_three_alta_matches() {
    let server = TestServer::new();
    server.register_patient("99887766");
    server.register_disease("alpha", "ALTA", "ACGTACGAAAAAAAA");
    server.register_disease("beta", "ALTA", "TTACGTACGTTTTTT");
    server.register_disease("gamma", "ALTA", "GGACGTACGGGGGGG");

    let response = server.diagnose("99887766", "2025-03-01", "ACGTACG");
    assert!(
        response.contains("enfermedades_detectadas: 3"),
        "unexpected response: {response}"
    );
    assert!(response.contains("criterio_alta_infecciosidad: cumple (>= 3)"));

    let report = std::fs::read_to_string(
        server
            .paths
            .reports_directory
            .join("high_infectivity_patients_report.csv"),
    )
    .unwrap();
    let rows: Vec<_> = report.lines().collect();
    assert_eq!(rows.len(), 2);
    let row = rows[1];
    assert!(row.starts_with("99887766,3,3,"));
    for name in ["alpha", "beta", "gamma"] {
        assert!(row.contains(name), "row missing {name}: {row}");
    }
}

#[test]
fn mutation_history_is_emitted_on_the_second_sample() {
    let server = TestServer::new();
    server.register_patient("12345678");
    server.register_disease("ebola", "ALTA", EBOLA_SEQUENCE);

    assert!(server
        .diagnose("12345678", "2025-02-19", "GAGTATGTGAA")
        .starts_with("[TCP][200][Success]"));
    let response = server.diagnose("12345678", "2025-02-20", "AGAGTATGTGAA");
    assert!(
        response.contains("historial_muestras: actualizado"),
        "unexpected response: {response}"
    );

    let history_dir = server.patient_directory().join("history");
    let second_history: Vec<_> = files_in(&history_dir)
        .into_iter()
        .filter(|path| {
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("2025-02-20_")
        })
        .collect();
    assert_eq!(second_history.len(), 1);
    let content = std::fs::read_to_string(&second_history[0]).unwrap();
    let rows: Vec<_> = content.lines().collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1], "2025-02-19,0,0,agregado_izquierda");
}

#[test]
fn unknown_patient_is_not_found() {
    let server = TestServer::new();
    server.register_disease("ebola", "ALTA", EBOLA_SEQUENCE);
    let response = server.diagnose("55555555", "2025-02-19", "GAGTATGTGAA");
    assert!(response.starts_with("[TCP][404][NotFound]"));
}

#[test]
fn sequence_without_matches_is_not_found() {
    let server = TestServer::new();
    server.register_patient("12345678");
    server.register_disease("ebola", "ALTA", EBOLA_SEQUENCE);
    let response = server.diagnose("12345678", "2025-02-19", "CCCCCCC");
    assert!(
        response.starts_with("[TCP][404][NotFound]"),
        "unexpected response: {response}"
    );
}

#[test]
fn unknown_route_is_404_and_malformed_frame_is_400() {
    let server = TestServer::new();
    let unknown = server.send("PUT patient\napplication/fasta\n>x");
    assert!(unknown.starts_with("[TCP][404][RouteNotFound]"));

    let malformed = server.send("POST patient");
    assert!(malformed.starts_with("[TCP][400][MalformedRequest]"));

    let blank = server.send("   ");
    assert!(blank.starts_with("[TCP][400][MalformedRequest]"));
}

#[test]
fn unsupported_content_type_is_invalid_format() {
    let server = TestServer::new();
    let response = server.send("POST patient\napplication/json\n>x|y|z|1|a|b|c|d");
    assert!(
        response.starts_with("[TCP][400][InvalidFormat]"),
        "unexpected response: {response}"
    );
}

#[test]
fn age_and_sequence_boundaries() {
    let server = TestServer::new();
    // Ages 1 and 120 pass; 0 and 121 fail validation.
    for (document, age, accepted) in [
        ("101", 1, true),
        ("102", 120, true),
        ("103", 0, false),
        ("104", 121, false),
    ] {
        let response = server.send(&format!(
            "POST patient\napplication/fasta\n>{document}|Juan|Perez|{age}|juan@mail.com|MASCULINO|Bogota|Colombia"
        ));
        if accepted {
            assert!(response.starts_with("[TCP][201][Created]"), "{response}");
        } else {
            assert!(
                response.starts_with("[TCP][400][ValidationError]"),
                "{response}"
            );
        }
    }

    // Disease sequences: 14 bases rejected, 15 accepted.
    assert!(server
        .register_disease("corta", "BAJA", &"A".repeat(14))
        .starts_with("[TCP][400][ValidationError]"));
    assert!(server
        .register_disease("justa", "BAJA", &"A".repeat(15))
        .starts_with("[TCP][201][Created]"));

    // Diagnose sequences: 6 rejected, 7 accepted, 5001 rejected.
    server.register_patient("12345678");
    assert!(server
        .diagnose("12345678", "2025-02-19", &"A".repeat(6))
        .starts_with("[TCP][400][ValidationError]"));
    assert!(server
        .diagnose("12345678", "2025-02-19", &"A".repeat(7))
        .starts_with("[TCP][200][Success]"));
    assert!(server
        .diagnose("12345678", "2025-02-20", &"A".repeat(5001))
        .starts_with("[TCP][400][ValidationError]"));
}

#[test]
fn unspecified_gender_external_form_is_stored_normalized() {
    let server = TestServer::new();
    let response = server.send(
        "POST patient\napplication/fasta\n>321|Sam|Rojas|25|sam@mail.com|NO ESPECIFICADO|Cali|Colombia",
    );
    assert!(response.starts_with("[TCP][201][Created]"), "{response}");

    let content = std::fs::read_to_string(&server.paths.patients_csv).unwrap();
    assert!(content.contains("NO_ESPECIFICADO"));
}

#[test]
fn responses_never_leak_filesystem_paths() {
    let server = TestServer::new();
    let root = server.paths.diagnostics_directory.parent().unwrap().to_owned();
    let responses = [
        server.register_patient("12345678"),
        server.register_patient("12345678"),
        server.diagnose("99999999", "2025-01-01", "ACGTACG"),
        server.send("POST nothing\napplication/fasta\nbody"),
    ];
    for response in responses {
        assert!(response.starts_with("[TCP]["), "{response}");
        assert!(
            !response.contains(&root.display().to_string()),
            "response leaks a path: {response}"
        );
    }
}
