//! Specification loading.
//!
//! Bytes come from a [`SpecSource`], the storage collaborator. The loader only
//! reacts to the conditions the source signals (missing, unreadable) and to
//! the content it returns (empty, malformed); it never probes the filesystem
//! on its own. Every failure is terminal and surfaced verbatim to the caller.

use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use openinfra_types::{SpecDocument, Specification};
use thiserror::Error;
use tracing::debug;

/// Origin label used when parsing bytes that did not come from a named source.
const INLINE_ORIGIN: &str = "<inline>";

/// Errors raised while loading a specification document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("specification source '{origin}' not found")]
    NotFound { origin: String },

    #[error("insufficient permissions to read specification source '{origin}'")]
    PermissionDenied { origin: String },

    #[error("specification source '{origin}' is empty")]
    Empty { origin: String },

    #[error("malformed specification in '{origin}': {reason}")]
    Malformed { origin: String, reason: String },

    #[error("failed to read specification source '{origin}': {error}")]
    Io {
        origin: String,
        #[source]
        error: io::Error,
    },
}

impl ParseError {
    fn from_io(origin: impl Into<String>, error: io::Error) -> Self {
        let origin = origin.into();
        match error.kind() {
            ErrorKind::NotFound => Self::NotFound { origin },
            ErrorKind::PermissionDenied => Self::PermissionDenied { origin },
            _ => Self::Io { origin, error },
        }
    }
}

/// A byte-producing source for specification documents.
pub trait SpecSource {
    /// Human-readable name used in error messages (a path, URL, or label).
    fn origin(&self) -> String;

    /// Reads the full document. Implementations signal a missing source with
    /// [`ErrorKind::NotFound`] and an unreadable one with
    /// [`ErrorKind::PermissionDenied`].
    fn read(&self) -> io::Result<Vec<u8>>;
}

/// Reads a specification from the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SpecSource for FileSource {
    fn origin(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }
}

/// An in-memory document, mostly useful for tests and embedded fixtures.
#[derive(Debug, Clone)]
pub struct InlineSource {
    origin: String,
    bytes: Vec<u8>,
}

impl InlineSource {
    pub fn new(origin: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            origin: origin.into(),
            bytes: bytes.into(),
        }
    }
}

impl SpecSource for InlineSource {
    fn origin(&self) -> String {
        self.origin.clone()
    }

    fn read(&self) -> io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// Parses a YAML (or JSON) specification document.
///
/// # Errors
///
/// - [`ParseError::Empty`] when the input has no content.
/// - [`ParseError::Malformed`] when the syntax is invalid or a required
///   top-level field (`openinfra`, `providers`) is absent.
pub fn parse(bytes: &[u8]) -> Result<Specification, ParseError> {
    parse_with_origin(INLINE_ORIGIN, bytes)
}

/// Reads and parses a specification from `source`.
pub fn load_spec(source: &impl SpecSource) -> Result<Specification, ParseError> {
    let origin = source.origin();
    let bytes = source.read().map_err(|error| ParseError::from_io(origin.clone(), error))?;
    debug!(origin = %origin, byte_count = bytes.len(), "specification source read");
    parse_with_origin(&origin, &bytes)
}

/// Convenience wrapper around [`load_spec`] for a filesystem path.
pub fn load_spec_file(path: impl AsRef<Path>) -> Result<Specification, ParseError> {
    load_spec(&FileSource::new(path.as_ref()))
}

fn parse_with_origin(origin: &str, bytes: &[u8]) -> Result<Specification, ParseError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ParseError::Empty { origin: origin.to_string() });
    }

    let document: SpecDocument = serde_yaml::from_slice(bytes).map_err(|error| ParseError::Malformed {
        origin: origin.to_string(),
        reason: error.to_string(),
    })?;

    let specification = Specification::from(document);
    debug!(
        origin = %origin,
        version = %specification.version,
        provider_count = specification.providers.len(),
        resource_count = specification.resources.len(),
        dependency_count = specification.dependencies.len(),
        "specification parsed"
    );
    Ok(specification)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSource(ErrorKind);

    impl SpecSource for FailingSource {
        fn origin(&self) -> String {
            "failing".into()
        }

        fn read(&self) -> io::Result<Vec<u8>> {
            Err(io::Error::from(self.0))
        }
    }

    #[test]
    fn reader_signals_map_to_distinct_errors() {
        assert!(matches!(
            load_spec(&FailingSource(ErrorKind::NotFound)),
            Err(ParseError::NotFound { .. })
        ));
        assert!(matches!(
            load_spec(&FailingSource(ErrorKind::PermissionDenied)),
            Err(ParseError::PermissionDenied { .. })
        ));
        assert!(matches!(
            load_spec(&FailingSource(ErrorKind::Interrupted)),
            Err(ParseError::Io { .. })
        ));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(parse(b""), Err(ParseError::Empty { .. })));
        assert!(matches!(parse(b"  \n\t\n"), Err(ParseError::Empty { .. })));
    }

    #[test]
    fn invalid_syntax_is_malformed() {
        let error = parse(b"openinfra: [1.0\nproviders: {").expect_err("invalid yaml");
        assert!(matches!(error, ParseError::Malformed { .. }), "unexpected: {error}");
    }

    #[test]
    fn missing_required_fields_are_malformed() {
        let error = parse(b"info:\n  title: no version\nproviders: []\n").expect_err("missing openinfra");
        let ParseError::Malformed { reason, .. } = error else {
            panic!("expected malformed error");
        };
        assert!(reason.contains("openinfra"), "reason: {reason}");

        let error = parse(b"openinfra: 1.0.0\n").expect_err("missing providers");
        assert!(error.to_string().contains("providers"), "unexpected: {error}");
    }

    #[test]
    fn json_documents_are_accepted() {
        let json = br#"{"openinfra": "1.0.0", "providers": [{"name": "p", "type": "aws"}]}"#;
        let specification = parse(json).expect("json is valid yaml");
        assert_eq!(specification.version, "1.0.0");
        assert!(specification.providers.contains_key("p"));
    }

    #[test]
    fn inline_source_reports_its_origin() {
        let error = load_spec(&InlineSource::new("fixture.yaml", "")).expect_err("empty");
        assert_eq!(error.to_string(), "specification source 'fixture.yaml' is empty");
    }
}
