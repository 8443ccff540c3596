//! Decides whether a generated artifact has to be (re)written

use std::path::Path;

use trellis_core::source::file_timestamp;
use trellis_core::{GenerationError, Result};

/// Why an artifact is or is not current. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The output file does not exist.
    Missing,
    /// The source was modified after the output was written.
    SourceNewer,
    /// The output's bytes differ from what would be written now.
    ContentChanged,
    /// Nothing to do.
    Current,
}

impl Freshness {
    pub fn needs_write(self) -> bool {
        self != Freshness::Current
    }
}

/// Compare an output file against its source timestamp (whole seconds)
/// and, when given, the freshly rendered content.
///
/// Binary artifacts pass `None` and are compared by timestamp only.
pub fn check_freshness(
    source_timestamp: i64,
    output: &Path,
    rendered: Option<&[u8]>,
) -> Result<Freshness> {
    let metadata = match std::fs::metadata(output) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Freshness::Missing),
        Err(e) => return Err(GenerationError::persistence(output, e)),
    };
    let written_at = metadata
        .modified()
        .map(file_timestamp)
        .map_err(|e| GenerationError::persistence(output, e))?;

    if source_timestamp > written_at {
        return Ok(Freshness::SourceNewer);
    }

    if let Some(rendered) = rendered {
        let existing = std::fs::read(output).map_err(|e| GenerationError::persistence(output, e))?;
        if existing != rendered {
            return Ok(Freshness::ContentChanged);
        }
    }

    Ok(Freshness::Current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::{Duration, SystemTime};

    fn write_at(path: &Path, content: &str, modified: SystemTime) {
        std::fs::write(path, content).unwrap();
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(modified)
            .unwrap();
    }

    fn secs(t: SystemTime) -> i64 {
        file_timestamp(t)
    }

    #[test]
    fn missing_output() {
        let dir = tempfile::tempdir().unwrap();
        let freshness = check_freshness(0, &dir.path().join("index.json"), Some(b"{}")).unwrap();
        assert_eq!(freshness, Freshness::Missing);
        assert!(freshness.needs_write());
    }

    #[test]
    fn newer_source() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("index.json");
        let written = SystemTime::now() - Duration::from_secs(60);
        write_at(&output, "{}", written);

        let freshness = check_freshness(secs(written) + 1, &output, Some(b"{}")).unwrap();
        assert_eq!(freshness, Freshness::SourceNewer);
    }

    #[test]
    fn changed_content() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("index.json");
        let written = SystemTime::now();
        write_at(&output, "{}", written);

        let freshness = check_freshness(secs(written), &output, Some(b"{\"a\":1}")).unwrap();
        assert_eq!(freshness, Freshness::ContentChanged);
    }

    #[test]
    fn current_when_nothing_changed() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("index.json");
        let written = SystemTime::now();
        write_at(&output, "{}", written);

        let freshness = check_freshness(secs(written) - 10, &output, Some(b"{}")).unwrap();
        assert_eq!(freshness, Freshness::Current);
        assert!(!freshness.needs_write());
    }

    #[test]
    fn binary_artifacts_ignore_content() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("d.svg");
        let written = SystemTime::now();
        write_at(&output, "<svg/>", written);

        assert_eq!(
            check_freshness(secs(written), &output, None).unwrap(),
            Freshness::Current
        );
    }
}
