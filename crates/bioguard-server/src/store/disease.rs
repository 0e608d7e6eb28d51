//! Disease store: a directory of hash-named FASTA files.
//!
//! Each disease lives in one file named after the SHA-256 hash of its
//! canonical content `>name|infectiousness\nSEQUENCE`. The serialized file
//! additionally carries the opaque id in its header
//! (`>id|name|infectiousness`), so identifier assignment never invalidates
//! the content-addressed name. Reads verify every file against its name and
//! skip the ones that fail.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use bioguard_core::error::DomainError;
use bioguard_core::fasta::trim_or_empty;
use bioguard_core::integrity;
use bioguard_core::model::{Disease, InfectiousnessLevel};
use parking_lot::Mutex;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

const FASTA_EXTENSION: &str = ".fasta";
const MIN_DISEASE_SEQUENCE_LENGTH: usize = 15;

/// Letters (including accents), digits, with single space or hyphen
/// separators between blocks.
static DISEASE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[A-Za-zÁÉÍÓÚáéíóúÑñÜü0-9]+(?:[ -][A-Za-zÁÉÍÓÚáéíóúÑñÜü0-9]+)*$")
        .expect("valid regex")
});

static GENETIC_SEQUENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ACGT]+$").expect("valid regex"));

/// Persistence seam for diseases.
pub trait DiseaseStore: Send + Sync {
    /// Validates and persists a disease, assigning an identifier when
    /// absent. Returns the persisted record.
    ///
    /// # Errors
    ///
    /// [`DomainError::Validation`] for field violations,
    /// [`DomainError::Conflict`] when a disease with the same canonical
    /// content already exists, and [`DomainError::Persistence`] for I/O
    /// failures.
    fn save(&self, disease: Disease) -> Result<Disease, DomainError>;

    /// Lists every stored disease that passes integrity verification and
    /// parsing, in deterministic (file-name) order.
    ///
    /// # Errors
    ///
    /// [`DomainError::Persistence`] for I/O failures.
    fn find_all(&self) -> Result<Vec<Disease>, DomainError>;
}

/// Directory-backed [`DiseaseStore`] with hash-named FASTA files.
pub struct FastaDiseaseStore {
    directory: PathBuf,
    lock: Mutex<()>,
}

impl FastaDiseaseStore {
    /// Opens (and initializes) the disease directory.
    ///
    /// # Errors
    ///
    /// [`DomainError::Persistence`] when the directory cannot be prepared.
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let store = Self {
            directory: directory.into(),
            lock: Mutex::new(()),
        };
        let existed = store.directory.exists();
        std::fs::create_dir_all(&store.directory).map_err(|e| {
            DomainError::persistence("No fue posible preparar el directorio de enfermedades", e)
        })?;
        if existed {
            info!(path = %store.directory.display(), "disease directory ready");
        } else {
            info!(path = %store.directory.display(), "disease directory created");
        }
        let registered = store.list_fasta_files()?.len();
        if registered > 0 {
            info!(registered, "diseases already on record");
        }
        Ok(store)
    }

    /// Directory owned by this store.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Canonical content hashed into the file name (excludes the id).
    fn canonical_content(disease: &Disease) -> String {
        format!(
            ">{}|{}\n{}",
            disease.name, disease.infectiousness, disease.sequence
        )
    }

    /// Serialized file content (includes the id).
    fn fasta_content(disease: &Disease) -> String {
        let uuid = disease.uuid.map(|u| u.to_string()).unwrap_or_default();
        format!(
            ">{uuid}|{}|{}\n{}",
            disease.name, disease.infectiousness, disease.sequence
        )
    }

    /// `.fasta` files under the directory, sorted by file name so the scan
    /// order is deterministic under any enumeration permutation.
    fn list_fasta_files(&self) -> Result<Vec<PathBuf>, DomainError> {
        if !self.directory.is_dir() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&self.directory)
            .map_err(|e| DomainError::persistence("Error al listar enfermedades FASTA", e))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| DomainError::persistence("Error al listar enfermedades FASTA", e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if name.ends_with(FASTA_EXTENSION) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Maps one stored file to a disease, verifying integrity against the
    /// file name. Returns `None` (after logging) for files that cannot be
    /// parsed.
    fn map_file(path: &Path) -> Result<Option<Disease>, DomainError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => {
                warn!(path = %path.display(), "unreadable disease file skipped");
                return Ok(None);
            }
        };
        let lines = bioguard_core::fasta::lines(&content);
        let Some((header, sequence)) = lines.first().zip(lines.get(1)) else {
            warn!(path = %path.display(), "malformed disease file skipped");
            return Ok(None);
        };
        let Some(rest) = header.strip_prefix('>') else {
            warn!(path = %path.display(), "malformed disease file skipped");
            return Ok(None);
        };
        let fields: Vec<&str> = rest.split('|').map(str::trim).collect();
        if fields.len() < 3 {
            warn!(path = %path.display(), "malformed disease file skipped");
            return Ok(None);
        }
        let Ok(uuid) = Uuid::parse_str(fields[0]) else {
            warn!(path = %path.display(), "malformed disease file skipped");
            return Ok(None);
        };
        let disease = Disease {
            uuid: Some(uuid),
            name: fields[1].to_owned(),
            infectiousness: fields[2].to_owned(),
            sequence: sequence.clone(),
        };
        // The file name must be the hash of the canonical (id-less) form.
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let expected_hash = file_name
            .strip_suffix(FASTA_EXTENSION)
            .unwrap_or(file_name.as_str());
        if expected_hash != integrity::hash(&Self::canonical_content(&disease)) {
            return Err(DomainError::CorruptedData(format!(
                "Archivo FASTA corrupto o modificado: {file_name} en {}",
                path.display()
            )));
        }
        Ok(Some(disease))
    }

    /// Whether a stored disease already carries this canonical hash.
    fn exists_canonical_hash(&self, canonical_hash: &str) -> Result<bool, DomainError> {
        for path in self.list_fasta_files()? {
            let stored = match Self::map_file(&path) {
                Ok(stored) => stored,
                Err(DomainError::CorruptedData(message)) => {
                    warn!("[CorruptedData] {message}");
                    continue;
                }
                Err(other) => return Err(other),
            };
            let Some(stored) = stored else { continue };
            if integrity::hash(&Self::canonical_content(&stored)) == canonical_hash {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Validates and normalizes a disease prior to persistence.
    fn validate_for_persistence(disease: Disease) -> Result<Disease, DomainError> {
        let name = trim_or_empty(&disease.name).to_owned();
        let infectiousness_raw = trim_or_empty(&disease.infectiousness).to_owned();
        let sequence = trim_or_empty(&disease.sequence).to_owned();

        let mut invalid_fields = Vec::new();
        if name.is_empty() || !DISEASE_NAME_RE.is_match(&name) {
            invalid_fields.push("diseaseName".to_owned());
        }
        if sequence.is_empty() || !GENETIC_SEQUENCE_RE.is_match(&sequence) {
            invalid_fields.push("geneticSequence".to_owned());
        } else if sequence.len() < MIN_DISEASE_SEQUENCE_LENGTH {
            invalid_fields.push(format!(
                "geneticSequence (mínimo {MIN_DISEASE_SEQUENCE_LENGTH} nucleótidos)"
            ));
        }
        let mut level = None;
        if infectiousness_raw.is_empty() {
            invalid_fields.push("infectiousness".to_owned());
        } else {
            match InfectiousnessLevel::from_value(&infectiousness_raw) {
                Ok(parsed) => level = Some(parsed),
                Err(_) => invalid_fields.push("infectiousness".to_owned()),
            }
        }
        if !invalid_fields.is_empty() {
            return Err(DomainError::Validation(format!(
                "Campos inválidos: {}",
                invalid_fields.join(", ")
            )));
        }

        Ok(Disease {
            uuid: Some(disease.uuid.unwrap_or_else(Uuid::new_v4)),
            name,
            infectiousness: level
                .map(InfectiousnessLevel::as_str)
                .unwrap_or_default()
                .to_owned(),
            sequence,
        })
    }
}

impl DiseaseStore for FastaDiseaseStore {
    fn save(&self, disease: Disease) -> Result<Disease, DomainError> {
        let _guard = self.lock.lock();
        let disease = Self::validate_for_persistence(disease)?;
        let canonical_hash = integrity::hash(&Self::canonical_content(&disease));
        if self.exists_canonical_hash(&canonical_hash)? {
            return Err(DomainError::Conflict(
                "Ya existe una enfermedad registrada con el mismo contenido FASTA.".to_owned(),
            ));
        }
        let target = self.directory.join(format!("{canonical_hash}{FASTA_EXTENSION}"));
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .map_err(|e| {
                DomainError::persistence("Error al guardar el archivo FASTA de la enfermedad", e)
            })?;
        file.write_all(Self::fasta_content(&disease).as_bytes())
            .map_err(|e| {
                DomainError::persistence("Error al guardar el archivo FASTA de la enfermedad", e)
            })?;
        Ok(disease)
    }

    fn find_all(&self) -> Result<Vec<Disease>, DomainError> {
        let _guard = self.lock.lock();
        let mut diseases = Vec::new();
        for path in self.list_fasta_files()? {
            match Self::map_file(&path) {
                Ok(Some(disease)) => diseases.push(disease),
                Ok(None) => {}
                Err(DomainError::CorruptedData(message)) => {
                    warn!("[CorruptedData] {message}");
                }
                Err(other) => return Err(other),
            }
        }
        Ok(diseases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EBOLA_SEQUENCE: &str = "GAGTATGTGAATAGATATATATTAGTAGTAGTAAAGTT";

    fn disease(name: &str, level: &str, sequence: &str) -> Disease {
        Disease {
            uuid: None,
            name: name.to_owned(),
            infectiousness: level.to_owned(),
            sequence: sequence.to_owned(),
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> FastaDiseaseStore {
        FastaDiseaseStore::new(dir.path().join("diseases")).unwrap()
    }

    #[test]
    fn save_names_the_file_after_the_canonical_hash() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(disease("ebola", "ALTA", EBOLA_SEQUENCE)).unwrap();

        let expected = integrity::hash(&format!(">ebola|ALTA\n{EBOLA_SEQUENCE}"));
        let path = store.directory().join(format!("{expected}.fasta"));
        assert!(path.exists());
        // Serialized form carries the assigned id as the first header field.
        let content = std::fs::read_to_string(path).unwrap();
        let header = content.lines().next().unwrap();
        assert_eq!(header.split('|').count(), 3);
    }

    #[test]
    fn find_all_roundtrips_the_stored_disease() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let saved = store.save(disease("ebola", "alta", EBOLA_SEQUENCE)).unwrap();
        assert_eq!(saved.infectiousness, "ALTA");

        let all = store.find_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "ebola");
        assert_eq!(all[0].uuid, saved.uuid);
        assert_eq!(all[0].sequence, EBOLA_SEQUENCE);
    }

    #[test]
    fn same_canonical_content_is_a_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(disease("ebola", "ALTA", EBOLA_SEQUENCE)).unwrap();
        let err = store.save(disease("ebola", "ALTA", EBOLA_SEQUENCE)).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn sequence_length_boundary_is_fifteen() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let err = store
            .save(disease("corta", "ALTA", &"A".repeat(14)))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("mínimo 15")));
        store.save(disease("justa", "ALTA", &"A".repeat(15))).unwrap();
    }

    #[test]
    fn non_acgt_alphabet_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let err = store
            .save(disease("rara", "ALTA", "GAGTATGTGAAXAGA"))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("geneticSequence")));
    }

    #[test]
    fn unknown_level_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let err = store
            .save(disease("ebola", "EXTREMA", EBOLA_SEQUENCE))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("infectiousness")));
    }

    #[test]
    fn tampered_file_is_skipped_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let saved = store.save(disease("ebola", "ALTA", EBOLA_SEQUENCE)).unwrap();
        store
            .save(disease("zika", "MEDIA", "ACGTACGTACGTACGT"))
            .unwrap();

        // Corrupt the ebola file in place: content no longer hashes to the
        // file name.
        let hash = integrity::hash(&format!(">ebola|ALTA\n{EBOLA_SEQUENCE}"));
        let path = store.directory().join(format!("{hash}.fasta"));
        std::fs::write(
            &path,
            format!(">{}|ebola|ALTA\nACGTACGTACGTACG", saved.uuid.unwrap()),
        )
        .unwrap();

        let all = store.find_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "zika");
    }

    #[test]
    fn scan_order_is_deterministic_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(disease("ebola", "ALTA", EBOLA_SEQUENCE)).unwrap();
        store
            .save(disease("zika", "MEDIA", "ACGTACGTACGTACGT"))
            .unwrap();
        store
            .save(disease("rabia", "BAJA", "TTTTACGTACGTACGTTTT"))
            .unwrap();

        let first = store.find_all().unwrap();
        let second = store.find_all().unwrap();
        let names = |ds: &[Disease]| ds.iter().map(|d| d.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&first), names(&second));
    }
}
