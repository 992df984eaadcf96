use crate::error::CliError;
use std::fs;
use std::path::*;

/// Extension of crunched texture files.
pub const CRN_EXTENSION: &str = "crn";

/// Recursively collects every file below `dir`.
///
/// Directories and entries that cannot be read are skipped rather than
/// failing the whole walk.
pub fn find_all_files(dir: &Path, entries: &mut Vec<fs::DirEntry>) -> std::io::Result<()> {
    let dir_entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(()),
    };

    for entry in dir_entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue, // e.g. no access
        };

        let path = entry.path();
        if path.is_dir() {
            find_all_files(&path, entries)?;
        } else {
            entries.push(entry);
        }
    }
    Ok(())
}

/// Whether `path` has the `.crn` extension, ignoring case.
pub fn is_crn_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CRN_EXTENSION))
}

/// Returns [`CliError::IgnoredByFilter`] for files without the `.crn` extension.
pub fn check_crn_extension(path: &Path) -> Result<(), CliError> {
    if is_crn_file(path) {
        Ok(())
    } else {
        Err(CliError::IgnoredByFilter)
    }
}

/// Prints errors from per-file processing to stderr.
/// Files skipped by the extension filter are ignored silently.
pub fn handle_process_entry_error(result: Result<(), CliError>) {
    if let Err(e) = result {
        match e {
            CliError::IgnoredByFilter => (),
            _ => eprintln!("{e}"),
        }
    }
}

/// Canonicalizes a CLI directory argument, creating the directory if it doesn't exist.
pub fn canonicalize_cli_path(value: &str) -> Result<PathBuf, String> {
    let path = Path::new(value);

    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| format!("Failed to create directory: {e}"))?;
    }

    fs::canonicalize(path).map_err(|e| format!("Invalid path: {e}"))
}

/// Canonicalizes a CLI argument naming a file that must already exist.
pub fn canonicalize_existing_file(value: &str) -> Result<PathBuf, String> {
    let path = fs::canonicalize(value).map_err(|e| format!("Invalid path: {e}"))?;
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("Not a file: {value}"))
    }
}

/// Maps `path` below `input_dir` to the same relative location below `output_dir`,
/// with the extension replaced by `extension`.
pub fn output_path_for(
    path: &Path,
    input_dir: &Path,
    output_dir: &Path,
    extension: &str,
) -> PathBuf {
    let relative = path.strip_prefix(input_dir).unwrap_or(path);
    output_dir.join(relative).with_extension(extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("texture.crn", true)]
    #[case("TEXTURE.CRN", true)]
    #[case("texture.dds", false)]
    #[case("crn", false)]
    fn crn_extension_filter(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_crn_file(Path::new(name)), expected);
        assert_eq!(check_crn_extension(Path::new(name)).is_ok(), expected);
    }

    #[test]
    fn output_path_keeps_relative_layout() {
        let out = output_path_for(
            Path::new("/in/a/b/wall.crn"),
            Path::new("/in"),
            Path::new("/out"),
            "dds",
        );
        assert_eq!(out, PathBuf::from("/out/a/b/wall.dds"));
    }

    #[test]
    fn finds_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("a.crn"), [0u8]).unwrap();
        fs::write(nested.join("b.crn"), [0u8]).unwrap();

        let mut entries = Vec::new();
        find_all_files(dir.path(), &mut entries).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn existing_file_argument_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert!(canonicalize_existing_file(dir.path().to_str().unwrap()).is_err());

        let file = dir.path().join("a.crn");
        fs::write(&file, [0u8]).unwrap();
        assert!(canonicalize_existing_file(file.to_str().unwrap()).is_ok());
    }
}
