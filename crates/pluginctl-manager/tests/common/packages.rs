//! Plugin package builders

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

/// Source of the entry module for a given version
pub fn plugin_code(version: &str) -> String {
    format!("PLUGIN_VERSION = \"{}\"\n", version)
}

/// Build a zip archive from (path, content) pairs
pub fn zip_package(files: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in files {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// The standard package: `init.py` at the archive root
pub fn plugin_zip(version: &str) -> Vec<u8> {
    zip_package(&[
        ("init.py", &plugin_code(version)),
        ("README.md", "test plugin"),
    ])
}

/// Build a gzip-compressed tar archive from (path, content) pairs
pub fn tar_gz_package(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        builder
            .append_data(&mut header, name, content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// Bytes that are neither zip nor gzip
pub fn corrupt_package() -> Vec<u8> {
    b"PK\x03\x04 this is not really a zip archive".to_vec()
}
