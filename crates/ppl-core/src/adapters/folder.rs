//! # Folder Bulk I/O
//!
//! A folder holds one contact per file; the extension selects the adapter.
//! Only the top level of the folder is read.
//!
//! Import is partial-failure tolerant: a file that cannot be read or parsed
//! is reported in [`FolderImport::failures`] and the rest of the batch
//! continues. Export skips files whose content would not change.

use super::ContactFormat;
use crate::contact::{Contact, uid_to_uri};
use crate::primitives::{MAX_CONTACT_FILE_SIZE, URN_UUID_PREFIX};
use crate::types::{PplError, io_error};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Result of importing a folder.
#[derive(Debug, Default)]
pub struct FolderImport {
    /// Successfully parsed contacts, in file name order.
    pub contacts: Vec<Contact>,
    /// One `PplError::Adapter` per file that could not be imported.
    pub failures: Vec<PplError>,
    /// Number of files matching the format.
    pub files: usize,
}

/// Result of exporting to a folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub written: usize,
    pub skipped: usize,
}

/// Files in `folder` with one of `format`'s extensions, sorted by path.
///
/// Returns `PplError::FileNotFound` if the folder does not exist.
pub fn list_files(folder: &Path, format: ContactFormat) -> Result<Vec<PathBuf>, PplError> {
    if !folder.is_dir() {
        return Err(PplError::FileNotFound(folder.to_path_buf()));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(folder).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry.map_err(|e| PplError::IoError(format!("{}: {e}", folder.display())))?;
        if entry.file_type().is_file() && format.matches(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Read one contact file, enforcing [`MAX_CONTACT_FILE_SIZE`].
pub(crate) fn read_contact_file(path: &Path) -> Result<String, PplError> {
    let metadata = std::fs::metadata(path).map_err(|e| io_error(path, &e))?;
    if metadata.len() > MAX_CONTACT_FILE_SIZE {
        return Err(PplError::Adapter {
            path: path.to_path_buf(),
            message: format!("file exceeds {MAX_CONTACT_FILE_SIZE} bytes"),
        });
    }
    std::fs::read_to_string(path).map_err(|e| io_error(path, &e))
}

/// Import every contact file in `folder`.
///
/// Text-only `RELATED` references that name another contact of the batch
/// (by display name, file name or uid) are resolved to that contact's URI.
pub fn bulk_import(folder: &Path, format: ContactFormat) -> Result<FolderImport, PplError> {
    let files = list_files(folder, format)?;
    let adapter = format.adapter();
    let mut import = FolderImport {
        files: files.len(),
        ..FolderImport::default()
    };

    for path in files {
        let parsed = read_contact_file(&path).and_then(|text| adapter.import_one(&text));
        match parsed {
            Ok(contact) => import.contacts.push(contact),
            Err(err) => {
                let failure = match err {
                    PplError::Adapter { .. } => err,
                    other => PplError::Adapter {
                        path: path.clone(),
                        message: other.to_string(),
                    },
                };
                tracing::warn!(error = %failure, "skipping contact file");
                import.failures.push(failure);
            }
        }
    }

    let resolved = resolve_text_references(&mut import.contacts);
    tracing::info!(
        folder = %folder.display(),
        format = format.name(),
        contacts = import.contacts.len(),
        failures = import.failures.len(),
        resolved,
        "folder imported"
    );
    Ok(import)
}

/// Resolve text-only references against names in the batch.
///
/// A contact without a uid cannot be a target, so callers that assign uids
/// later (see the UID assignment stage) may run this again afterwards.
/// Returns the number of references resolved.
pub fn resolve_text_references(contacts: &mut [Contact]) -> usize {
    let mut index: BTreeMap<String, String> = BTreeMap::new();
    for contact in contacts.iter() {
        let Some(uid) = contact.uid() else { continue };
        let bare = uid.strip_prefix(URN_UUID_PREFIX).unwrap_or(uid);
        let stem = contact.file_stem();
        for name in [contact.fn_name.as_str(), stem.as_str(), uid, bare] {
            index.entry(name.to_string()).or_insert_with(|| uid.to_string());
        }
    }

    let mut resolved = 0;
    for contact in contacts.iter_mut() {
        for related in &mut contact.related {
            if related.uri().is_some() {
                continue;
            }
            let Some(uid) = related.text_value.as_deref().and_then(|name| index.get(name)) else {
                continue;
            };
            related.uri = Some(uid_to_uri(uid));
            resolved += 1;
        }
    }
    resolved
}

/// Export contacts to `folder`, one file each, named after the display name.
///
/// Without `force`, an existing file is rewritten only when
/// [`FormatAdapter::text_changed`](super::FormatAdapter::text_changed) says so. The folder is created if needed.
pub fn bulk_export<'c>(
    contacts: impl IntoIterator<Item = &'c Contact>,
    folder: &Path,
    format: ContactFormat,
    force: bool,
) -> Result<ExportSummary, PplError> {
    std::fs::create_dir_all(folder).map_err(|e| io_error(folder, &e))?;
    let adapter = format.adapter();
    let mut summary = ExportSummary::default();

    for contact in contacts {
        let path = folder.join(format!("{}.{}", contact.file_stem(), format.extension()));
        if !force && path.exists() {
            let unchanged = read_contact_file(&path)
                .map(|existing| !adapter.text_changed(&existing, contact))
                .unwrap_or(false);
            if unchanged {
                summary.skipped += 1;
                continue;
            }
        }
        let text = adapter.export_one(contact)?;
        std::fs::write(&path, text).map_err(|e| io_error(&path, &e))?;
        summary.written += 1;
    }

    tracing::info!(
        folder = %folder.display(),
        format = format.name(),
        written = summary.written,
        skipped = summary.skipped,
        "folder exported"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::Related;
    use crate::revision::parse_revision;
    use tempfile::TempDir;

    fn contact(name: &str, uid: &str) -> Contact {
        let mut c = Contact::new(name).expect("contact").with_uid(uid);
        c.rev = parse_revision("2024-06-01T00:00:00Z");
        c
    }

    #[test]
    fn missing_folder_is_file_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let err = bulk_import(&dir.path().join("nope"), ContactFormat::Vcard).expect_err("missing");
        assert!(matches!(err, PplError::FileNotFound(_)));
    }

    #[test]
    fn listing_filters_by_extension_and_sorts() {
        let dir = TempDir::new().expect("tempdir");
        for name in ["b.vcf", "a.VCF", "c.vcard", "notes.txt"] {
            std::fs::write(dir.path().join(name), "").expect("write");
        }
        std::fs::create_dir(dir.path().join("sub.vcf")).expect("mkdir");
        let files = list_files(dir.path(), ContactFormat::Vcard).expect("list");
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name()?.to_str())
            .collect();
        assert_eq!(names, vec!["a.VCF", "b.vcf", "c.vcard"]);
    }

    #[test]
    fn export_then_import_all_formats() {
        for format in ContactFormat::ALL {
            let dir = TempDir::new().expect("tempdir");
            let contacts = vec![contact("Alice", "a"), contact("Bob / Builder", "b")];
            let summary = bulk_export(&contacts, dir.path(), format, false).expect("export");
            assert_eq!(summary, ExportSummary { written: 2, skipped: 0 }, "{format}");
            assert!(dir.path().join(format!("Bob _ Builder.{}", format.extension())).exists());

            let import = bulk_import(dir.path(), format).expect("import");
            assert_eq!(import.files, 2);
            assert!(import.failures.is_empty(), "{format}: {:?}", import.failures);
            assert_eq!(import.contacts, contacts, "{format}");
        }
    }

    #[test]
    fn unchanged_files_are_skipped_unless_forced() {
        let dir = TempDir::new().expect("tempdir");
        let contacts = vec![contact("Alice", "a")];
        bulk_export(&contacts, dir.path(), ContactFormat::Yaml, false).expect("export");

        let again = bulk_export(&contacts, dir.path(), ContactFormat::Yaml, false).expect("export");
        assert_eq!(again, ExportSummary { written: 0, skipped: 1 });

        let forced = bulk_export(&contacts, dir.path(), ContactFormat::Yaml, true).expect("export");
        assert_eq!(forced, ExportSummary { written: 1, skipped: 0 });
    }

    #[test]
    fn bad_files_become_failures() {
        let dir = TempDir::new().expect("tempdir");
        bulk_export(&[contact("Alice", "a")], dir.path(), ContactFormat::Vcard, false)
            .expect("export");
        std::fs::write(dir.path().join("broken.vcf"), "BEGIN:VCARD\nVERSION:4.0\nEND:VCARD\n")
            .expect("write");

        let import = bulk_import(dir.path(), ContactFormat::Vcard).expect("import");
        assert_eq!(import.files, 2);
        assert_eq!(import.contacts.len(), 1);
        assert_eq!(import.failures.len(), 1);
        assert!(matches!(&import.failures[0], PplError::Adapter { path, .. } if path.ends_with("broken.vcf")));
    }

    #[test]
    fn wiki_links_resolve_within_the_batch() {
        let dir = TempDir::new().expect("tempdir");
        std::fs::write(
            dir.path().join("Jane.md"),
            "---\nFN: Jane\nUID: jane\n---\n# Jane\n\n## Related\n- friend [[Bob Smith]]\n- parent [[Nobody]]\n",
        )
        .expect("write");
        std::fs::write(dir.path().join("Bob Smith.md"), "---\nFN: Bob Smith\nUID: urn:uuid:bob\n---\n# Bob Smith\n")
            .expect("write");

        let import = bulk_import(dir.path(), ContactFormat::Markdown).expect("import");
        let jane = import
            .contacts
            .iter()
            .find(|c| c.fn_name == "Jane")
            .expect("jane");
        assert_eq!(jane.related[0].uri(), Some("urn:uuid:bob"));
        assert_eq!(jane.related[0].text_value.as_deref(), Some("Bob Smith"));
        assert_eq!(jane.related[1], Related::to_text("Nobody", &["parent"]));
    }
}
