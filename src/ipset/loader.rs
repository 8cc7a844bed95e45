use super::{parse_network, IpSet};
use crate::error::{Result, WafError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Where networks are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpSource {
    /// Networks given directly, e.g. on the command line
    Literal(Vec<String>),
    /// A file with one network per line, or a directory of such files
    Path(PathBuf),
}

/// Load every source, in order, into a single set.
///
/// Any malformed line fails the whole load; no partial set is returned.
pub fn load_sources(sources: &[IpSource]) -> Result<IpSet> {
    let mut set = IpSet::new();

    for source in sources {
        match source {
            IpSource::Literal(values) => {
                for (idx, value) in values.iter().enumerate() {
                    parse_line("<literal>", idx + 1, value, &mut set)?;
                }
            }
            IpSource::Path(path) => load_path_into(path, &mut set)?,
        }
    }

    debug!("total networks after deduplication: {}", set.len());

    Ok(set)
}

/// Load a file, or every regular file directly inside a directory.
pub fn load_path(path: &Path) -> Result<IpSet> {
    let mut set = IpSet::new();
    load_path_into(path, &mut set)?;
    Ok(set)
}

fn load_path_into(path: &Path, set: &mut IpSet) -> Result<()> {
    let metadata = fs::metadata(path).map_err(|e| WafError::io(path, e))?;

    if !metadata.is_dir() {
        let added = read_file(path, set)?;
        debug!("loaded {} networks from file {}", added, path.display());
        return Ok(());
    }

    let entries = WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in entries {
        let entry = entry.map_err(|e| WafError::io(path, e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let added = read_file(entry.path(), set)?;
        debug!("loaded {} networks from file {}", added, entry.path().display());
    }

    Ok(())
}

fn read_file(path: &Path, set: &mut IpSet) -> Result<usize> {
    let content = fs::read_to_string(path).map_err(|e| WafError::io(path, e))?;
    let source_name = path.display().to_string();

    let before = set.len();
    for (idx, line) in content.lines().enumerate() {
        parse_line(&source_name, idx + 1, line, set)?;
    }

    Ok(set.len() - before)
}

fn parse_line(source_name: &str, line_number: usize, line: &str, set: &mut IpSet) -> Result<()> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(());
    }

    let network = parse_network(trimmed).ok_or_else(|| WafError::Parse {
        source_name: source_name.to_string(),
        line_number,
        line: line.to_string(),
    })?;
    set.insert(network);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_load_file_skips_comments_and_blanks() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# blocklist").unwrap();
        writeln!(file, "1.2.3.4").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "10.0.0.0/8").unwrap();
        writeln!(file, "  # indented comment").unwrap();
        writeln!(file, "1.2.3.4/32").unwrap();

        let set = load_path(file.path()).unwrap();
        assert_eq!(set.to_strings(), vec!["1.2.3.4/32", "10.0.0.0/8"]);
    }

    #[test]
    fn test_bad_line_fails_whole_load() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "1.2.3.4").unwrap();
        writeln!(file, "1.2.3.400").unwrap();

        match load_path(file.path()) {
            Err(WafError::Parse { line_number, line, .. }) => {
                assert_eq!(line_number, 2);
                assert_eq!(line, "1.2.3.400");
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_directory_is_read_non_recursively() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "1.1.1.1\n2.2.2.2\n").unwrap();
        std::fs::write(dir.path().join("b.txt"), "2.2.2.2\n3.3.3.3\n").unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("c.txt"), "4.4.4.4\n").unwrap();

        let set = load_path(dir.path()).unwrap();
        assert_eq!(
            set.to_strings(),
            vec!["1.1.1.1/32", "2.2.2.2/32", "3.3.3.3/32"]
        );
    }

    #[test]
    fn test_missing_path_is_io_error() {
        let dir = tempdir().unwrap();
        let result = load_path(&dir.path().join("missing.txt"));
        assert!(matches!(result, Err(WafError::Io { .. })));
    }

    #[test]
    fn test_sources_combine_in_order() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "9.9.9.9").unwrap();
        writeln!(file, "8.8.8.8").unwrap();

        let set = load_sources(&[
            IpSource::Literal(vec!["8.8.8.8".to_string(), "7.7.7.0/24".to_string()]),
            IpSource::Path(file.path().to_path_buf()),
        ])
        .unwrap();

        assert_eq!(
            set.to_strings(),
            vec!["8.8.8.8/32", "7.7.7.0/24", "9.9.9.9/32"]
        );
    }

    #[test]
    fn test_bad_literal_reports_source() {
        let err = load_sources(&[IpSource::Literal(vec!["nope".to_string()])]).unwrap_err();
        assert!(err.to_string().contains("<literal>"));
        assert!(err.to_string().contains("nope"));
    }
}
