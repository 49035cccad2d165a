use content_inspector::inspect;
use memmap2::MmapOptions;
use std::fs::File;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use thiserror::Error;

/// How much of a file is sniffed for binary content.
const BINARY_SAMPLE_LEN: usize = 8192;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("binary file")]
    Binary,
    #[error("not valid UTF-8")]
    Encoding,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Reads a source file as UTF-8 text, refusing binary content.
pub fn read_source(path: &Path) -> Result<String, ReadError> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(String::new());
    }

    // SAFETY: sound only while no other process truncates the file; the map
    // is dropped as soon as the text has been copied out.
    let mmap = unsafe { MmapOptions::new().map(&file)? };

    let sample_size = std::cmp::min(BINARY_SAMPLE_LEN, mmap.len());
    if inspect(&mmap[..sample_size]).is_binary() {
        return Err(ReadError::Binary);
    }

    let text = std::str::from_utf8(&mmap).map_err(|_| ReadError::Encoding)?;
    Ok(text.to_owned())
}

/// Counts lines the way a line reader yields them: a trailing line without a
/// newline still counts, an empty file has none.
pub fn count_lines(text: &str) -> usize {
    text.lines().count()
}

/// Expands a leading `~` and strips trailing path separators.
pub fn normalize_cli_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim_end_matches(MAIN_SEPARATOR);
    let raw = if trimmed.is_empty() { raw } else { trimmed };
    expand_tilde(raw)
}

pub fn expand_tilde(raw: &str) -> PathBuf {
    let rest = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(['/', MAIN_SEPARATOR]) => rest,
        _ => return PathBuf::from(raw),
    };

    match home_dir() {
        Some(home) => home.join(rest.trim_start_matches(['/', MAIN_SEPARATOR])),
        None => PathBuf::from(raw),
    }
}

fn home_dir() -> Option<PathBuf> {
    let var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    std::env::var_os(var)
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_count_lines() {
        assert_eq!(count_lines(""), 0);
        assert_eq!(count_lines("one"), 1);
        assert_eq!(count_lines("one\n"), 1);
        assert_eq!(count_lines("one\ntwo"), 2);
        assert_eq!(count_lines("one\r\ntwo\r\n"), 2);
        assert_eq!(count_lines("\n\n"), 2);
    }

    #[test]
    fn test_read_source_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("main.c");
        fs::write(&path, "int main(void) { return 0; }\n").unwrap();

        assert_eq!(
            read_source(&path).unwrap(),
            "int main(void) { return 0; }\n"
        );
    }

    #[test]
    fn test_read_source_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.c");
        fs::write(&path, "").unwrap();

        assert_eq!(read_source(&path).unwrap(), "");
    }

    #[test]
    fn test_read_source_binary() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blob.c");
        fs::write(&path, [0x00, 0x01, 0x02, 0xFF, 0xFE, 0x89, 0x50, 0x4E, 0x47]).unwrap();

        assert!(matches!(read_source(&path), Err(ReadError::Binary)));
    }

    #[test]
    fn test_read_source_invalid_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin1.c");
        fs::write(&path, b"/* caf\xe9 */\n").unwrap();

        assert!(matches!(read_source(&path), Err(ReadError::Encoding)));
    }

    #[test]
    fn test_read_source_missing() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            read_source(&dir.path().join("gone.c")),
            Err(ReadError::Io(_))
        ));
    }

    #[test]
    fn test_normalize_strips_trailing_separators() {
        let raw = format!("src{MAIN_SEPARATOR}{MAIN_SEPARATOR}");
        assert_eq!(normalize_cli_path(&raw), PathBuf::from("src"));
        let root = MAIN_SEPARATOR.to_string();
        assert_eq!(normalize_cli_path(&root), PathBuf::from(&root));
    }

    #[test]
    fn test_expand_tilde_leaves_other_paths_alone() {
        assert_eq!(expand_tilde("src/main.c"), PathBuf::from("src/main.c"));
        assert_eq!(expand_tilde("~user/x"), PathBuf::from("~user/x"));
    }

    #[test]
    fn test_expand_tilde_uses_home() {
        if let Some(home) = home_dir() {
            assert_eq!(expand_tilde("~"), home);
            assert_eq!(expand_tilde("~/notes.txt"), home.join("notes.txt"));
        }
    }
}
