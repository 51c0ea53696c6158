use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use crate::{Error, Result};

pub fn create_directory_for_file(p: &Path) -> Result {
    if let Some(parent_dir) = p.parent() {
        if parent_dir.as_os_str().is_empty() {
            return Ok(());
        }

        std::fs::create_dir_all(parent_dir).map_err(|e| {
            Error::Runtime(format!(
                "Failed to create output directory for file '{}' ({e})",
                p.to_string_lossy()
            ))
        })?;
    }

    Ok(())
}

/// Writes a file through a temporary file in the destination directory which is renamed onto `path`
/// once `write` completed successfully.
/// Readers of `path` either see the previous contents or the complete new contents, never a partial file.
/// When `write` fails the temporary file is removed and `path` is left untouched.
pub fn write_atomically<E>(path: &Path, write: impl FnOnce(&mut BufWriter<&mut File>) -> std::result::Result<(), E>) -> std::result::Result<(), E>
where
    E: From<Error>,
{
    if path.file_name().is_none() {
        return Err(Error::InvalidPath(path.to_path_buf()).into());
    }

    create_directory_for_file(path)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(Error::from)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer)?;
        writer.flush().map_err(Error::from)?;
    }

    tmp.as_file().sync_all().map_err(Error::from)?;
    tmp.persist(path).map_err(|e| Error::IOError(e.error))?;

    log::debug!("Wrote {}", path.to_string_lossy());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn write_atomically_creates_missing_directories() -> Result {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("out.bin");

        write_atomically::<Error>(&path, |w| {
            w.write_all(b"tile")?;
            Ok(())
        })?;

        assert_eq!(std::fs::read(&path)?, b"tile");
        Ok(())
    }

    #[test_log::test]
    fn failed_write_leaves_no_file() -> Result {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.bin");

        let res = write_atomically::<Error>(&path, |w| {
            w.write_all(b"partial")?;
            Err(Error::Runtime("encoder failure".to_string()))
        });

        assert!(res.is_err());
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path())?.count(), 0, "temporary file was not cleaned up");
        Ok(())
    }

    #[test_log::test]
    fn failed_write_keeps_previous_contents() -> Result {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.bin");
        std::fs::write(&path, b"previous")?;

        let res = write_atomically::<Error>(&path, |_| Err(Error::Runtime("encoder failure".to_string())));

        assert!(res.is_err());
        assert_eq!(std::fs::read(&path)?, b"previous");
        Ok(())
    }
}
