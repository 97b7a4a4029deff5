//! Guarded package extraction
//!
//! Archives are unpacked entry by entry into an empty staging directory.
//! Entries with absolute paths or `..` components, symbolic and hard links,
//! and entries that would overwrite an already extracted file are rejected.
//! These functions block; callers run them on `spawn_blocking`.

use flate2::read::GzDecoder;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use tar::Archive;
use thiserror::Error;
use tracing::debug;

/// Why a package could not be staged
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unrecognized archive format, expected zip or tar.gz")]
    UnsupportedFormat,

    #[error("entry '{0}' escapes the package directory")]
    UnsafePath(String),

    #[error("entry '{0}' is a link, links are not allowed in packages")]
    Link(String),

    #[error("entry '{0}' is written more than once")]
    Collision(String),

    #[error("package does not contain the entry module '{0}'")]
    MissingEntryModule(String),

    #[error("corrupt zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Supported package formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];
const ZIP_EMPTY_MAGIC: [u8; 4] = [0x50, 0x4b, 0x05, 0x06];
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Detect the archive format from its leading bytes
pub fn detect_format(archive: &Path) -> Result<ArchiveFormat, ExtractError> {
    let mut magic = [0u8; 4];
    let mut file = File::open(archive)?;
    let read = file.read(&mut magic)?;

    if read >= 4 && (magic == ZIP_MAGIC || magic == ZIP_EMPTY_MAGIC) {
        Ok(ArchiveFormat::Zip)
    } else if read >= 2 && magic[..2] == GZIP_MAGIC {
        Ok(ArchiveFormat::TarGz)
    } else {
        Err(ExtractError::UnsupportedFormat)
    }
}

/// Extract `archive` into `dest`, returning the number of files written
pub fn extract(archive: &Path, dest: &Path) -> Result<usize, ExtractError> {
    fs::create_dir_all(dest)?;
    let count = match detect_format(archive)? {
        ArchiveFormat::Zip => extract_zip(archive, dest)?,
        ArchiveFormat::TarGz => extract_tar_gz(archive, dest)?,
    };
    debug!("Extracted {} files into {}", count, dest.display());
    Ok(count)
}

fn extract_zip(archive: &Path, dest: &Path) -> Result<usize, ExtractError> {
    let mut zip = zip::ZipArchive::new(File::open(archive)?)?;
    let mut written = 0;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let name = entry.name().to_string();

        if entry.unix_mode().is_some_and(is_symlink_mode) {
            return Err(ExtractError::Link(name));
        }
        let Some(relative) = sanitize_entry_path(&name)? else {
            continue;
        };
        let target = dest.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            write_new_file(&target, &name, &mut entry)?;
            written += 1;
        }
    }

    Ok(written)
}

fn extract_tar_gz(archive: &Path, dest: &Path) -> Result<usize, ExtractError> {
    let mut tar = Archive::new(GzDecoder::new(File::open(archive)?));
    let mut written = 0;

    for entry in tar.entries()? {
        let mut entry = entry?;
        let name = entry.path()?.to_string_lossy().into_owned();
        let kind = entry.header().entry_type();

        if kind.is_symlink() || kind.is_hard_link() {
            return Err(ExtractError::Link(name));
        }
        if !(kind.is_dir() || kind.is_file()) {
            debug!("Skipping tar entry {} of type {:?}", name, kind);
            continue;
        }
        let Some(relative) = sanitize_entry_path(&name)? else {
            continue;
        };
        let target = dest.join(&relative);

        if kind.is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            write_new_file(&target, &name, &mut entry)?;
            written += 1;
        }
    }

    Ok(written)
}

/// Create `target` exclusively and copy `reader` into it
fn write_new_file(target: &Path, name: &str, reader: &mut dyn Read) -> Result<(), ExtractError> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = match OpenOptions::new().write(true).create_new(true).open(target) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(ExtractError::Collision(name.to_string()))
        }
        Err(e) => return Err(e.into()),
    };
    io::copy(reader, &mut file)?;
    Ok(())
}

fn is_symlink_mode(mode: u32) -> bool {
    const S_IFMT: u32 = 0o170000;
    const S_IFLNK: u32 = 0o120000;
    mode & S_IFMT == S_IFLNK
}

/// Relative path of an entry inside the package, `None` for the root itself
fn sanitize_entry_path(name: &str) -> Result<Option<PathBuf>, ExtractError> {
    let normalized = name.replace('\\', "/");
    if normalized.starts_with('/') {
        return Err(ExtractError::UnsafePath(name.to_string()));
    }

    let mut relative = PathBuf::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ExtractError::UnsafePath(name.to_string()))
            }
        }
    }

    Ok((!relative.as_os_str().is_empty()).then_some(relative))
}

/// Find the directory that becomes the plugin directory
///
/// That is the staging directory itself when it holds the entry module,
/// otherwise its single top-level directory if that one does.
pub fn locate_package_root(staging: &Path, entry_module: &str) -> Result<PathBuf, ExtractError> {
    if staging.join(entry_module).is_file() {
        return Ok(staging.to_path_buf());
    }

    let children: Vec<PathBuf> = fs::read_dir(staging)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<_>>()?;

    if let [only] = children.as_slice() {
        if only.is_dir() && only.join(entry_module).is_file() {
            return Ok(only.clone());
        }
    }

    Err(ExtractError::MissingEntryModule(entry_module.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn write_zip(path: &Path, files: &[(&str, &str)]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for (name, content) in files {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    fn tar_gz_builder(path: &Path) -> tar::Builder<GzEncoder<File>> {
        tar::Builder::new(GzEncoder::new(File::create(path).unwrap(), Compression::default()))
    }

    fn append_file(builder: &mut tar::Builder<GzEncoder<File>>, name: &str, content: &[u8]) {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        builder.append_data(&mut header, name, content).unwrap();
    }

    #[test]
    fn test_extract_zip() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("p.zip");
        write_zip(&archive, &[("init.py", "print(1)"), ("lib/util.py", "x = 1")]);

        let dest = temp.path().join("out");
        assert_eq!(extract(&archive, &dest).unwrap(), 2);
        assert_eq!(fs::read_to_string(dest.join("init.py")).unwrap(), "print(1)");
        assert!(dest.join("lib").join("util.py").is_file());
    }

    #[test]
    fn test_extract_tar_gz() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("p.tar.gz");
        let mut builder = tar_gz_builder(&archive);
        append_file(&mut builder, "repo/init.py", b"pass");
        builder.into_inner().unwrap().finish().unwrap();

        let dest = temp.path().join("out");
        assert_eq!(extract(&archive, &dest).unwrap(), 1);
        assert_eq!(
            locate_package_root(&dest, "init.py").unwrap(),
            dest.join("repo")
        );
    }

    #[test]
    fn test_zip_traversal_rejected() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("evil.zip");
        write_zip(&archive, &[("init.py", ""), ("../escaped.py", "boom")]);

        let dest = temp.path().join("out");
        let err = extract(&archive, &dest).unwrap_err();
        assert!(matches!(err, ExtractError::UnsafePath(_)));
        assert!(!temp.path().join("escaped.py").exists());
    }

    #[test]
    fn test_tar_symlink_rejected() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("link.tar.gz");
        let mut builder = tar_gz_builder(&archive);
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Symlink);
        header.set_size(0);
        header.set_link_name("/etc/passwd").unwrap();
        builder
            .append_data(&mut header, "init.py", io::empty())
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let err = extract(&archive, &temp.path().join("out")).unwrap_err();
        assert!(matches!(err, ExtractError::Link(_)));
    }

    #[test]
    fn test_tar_collision_rejected() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("dup.tar.gz");
        let mut builder = tar_gz_builder(&archive);
        append_file(&mut builder, "init.py", b"one");
        append_file(&mut builder, "./init.py", b"two");
        builder.into_inner().unwrap().finish().unwrap();

        let err = extract(&archive, &temp.path().join("out")).unwrap_err();
        assert!(matches!(err, ExtractError::Collision(_)));
    }

    #[test]
    fn test_unknown_format() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("plain.zip");
        fs::write(&archive, "this is not an archive").unwrap();
        assert!(matches!(
            extract(&archive, &temp.path().join("out")),
            Err(ExtractError::UnsupportedFormat)
        ));
    }

    #[test]
    fn test_missing_entry_module() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("other.py"), "").unwrap();
        assert!(matches!(
            locate_package_root(temp.path(), "init.py"),
            Err(ExtractError::MissingEntryModule(_))
        ));
    }

    #[test]
    fn test_sanitize_entry_path() {
        assert_eq!(
            sanitize_entry_path("./a/b.py").unwrap(),
            Some(PathBuf::from("a/b.py"))
        );
        assert_eq!(sanitize_entry_path("./").unwrap(), None);
        assert!(sanitize_entry_path("/etc/passwd").is_err());
        assert!(sanitize_entry_path("a/../../b").is_err());
        assert!(sanitize_entry_path("a\\..\\b").is_err());
    }
}
