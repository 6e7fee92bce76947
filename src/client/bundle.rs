// Bundle packaging for artifact imports
//
// The management API accepts proxy and shared-flow bundles as zip archives.
// This module packages a source directory (the parent of "apiproxy" or
// "sharedflowbundle") into archive bytes ready for upload.

use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::error::{EdgeError, Result};

/// Package a bundle source directory into a zip archive
pub fn package_dir(src_dir: &Path) -> Result<Vec<u8>> {
    if !src_dir.is_dir() {
        return Err(EdgeError::Bundle(format!(
            "source directory {:?} does not exist or is not a directory",
            src_dir
        )));
    }

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut cursor);
        let options =
            FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for entry in WalkDir::new(src_dir).sort_by_file_name() {
            let entry = entry.map_err(|e| EdgeError::Bundle(e.to_string()))?;
            let rel = entry
                .path()
                .strip_prefix(src_dir)
                .map_err(|e| EdgeError::Bundle(e.to_string()))?;
            if rel.as_os_str().is_empty() {
                continue;
            }

            // Zip entry names use forward slashes on every platform
            let rel_name = rel.to_string_lossy().replace('\\', "/");

            if entry.file_type().is_dir() {
                zip.add_directory(rel_name, options)
                    .map_err(|e| EdgeError::Bundle(e.to_string()))?;
            } else {
                zip.start_file(rel_name, options)
                    .map_err(|e| EdgeError::Bundle(e.to_string()))?;
                let mut contents = Vec::new();
                File::open(entry.path())?.read_to_end(&mut contents)?;
                zip.write_all(&contents)?;
            }
        }

        zip.finish().map_err(|e| EdgeError::Bundle(e.to_string()))?;
    }

    tracing::debug!(
        "Packaged bundle from {:?} ({} bytes)",
        src_dir,
        cursor.get_ref().len()
    );
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_file(path: &Path, contents: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_package_dir_includes_nested_files() {
        let dir = tempfile::TempDir::new().unwrap();
        write_file(
            &dir.path().join("apiproxy/orders.xml"),
            "<APIProxy name=\"orders\"/>",
        );
        write_file(
            &dir.path().join("apiproxy/proxies/default.xml"),
            "<ProxyEndpoint/>",
        );

        let bytes = package_dir(dir.path()).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();

        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert!(names.contains(&"apiproxy/orders.xml".to_string()));
        assert!(names.contains(&"apiproxy/proxies/default.xml".to_string()));
    }

    #[test]
    fn test_package_missing_dir_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = package_dir(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, EdgeError::Bundle(_)));
    }
}
