//! Chunked upload for payloads above the hub's single-file limit.
//!
//! A payload of size `S` with chunk size `C` becomes `ceil(S/C)` parts named
//! `<repo_path>.part<index>` (0-based, read order). Parts are produced and
//! uploaded strictly in increasing index order; each part except the last is
//! exactly `C` bytes, and concatenating parts in index order reproduces the
//! payload byte for byte. Reassembly is an external concern.
//!
//! Local disk stays bounded: each window is written to one temporary part
//! file next to the payload, uploaded, and removed again before the next
//! window — on upload failure too, so at most one part is ever resident.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use skiff_core::remote::MirrorClient;

use crate::error::{io_err, SyncError};
use crate::retry::RetryPolicy;

/// Number of parts an upload of `size` bytes splits into.
pub fn part_count(size: u64, chunk_size: u64) -> u64 {
    size.div_ceil(chunk_size)
}

/// Repo-relative name of part `index`.
pub fn part_name(repo_path: &str, index: u64) -> String {
    format!("{repo_path}.part{index}")
}

/// What an upload pushed to the hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    /// Repo-relative names, in upload order: either the canonical path, or
    /// the `.part<index>` sequence.
    pub uploaded: Vec<String>,
    pub bytes: u64,
}

/// Upload `local` to `repo_path` on `revision`, splitting into parts when
/// the payload exceeds `chunk_size`. Every hub write goes through `retry`.
/// In dry-run mode the plan is computed and logged but nothing is written,
/// locally or remotely.
pub fn upload_file(
    store: &dyn MirrorClient,
    retry: &RetryPolicy,
    local: &Path,
    repo_path: &str,
    revision: &str,
    message: &str,
    chunk_size: u64,
    dry_run: bool,
) -> Result<UploadReport, SyncError> {
    let size = fs::metadata(local).map_err(|e| io_err(local, e))?.len();

    if size <= chunk_size {
        if dry_run {
            tracing::info!("[dry-run] would upload {} -> {repo_path}", local.display());
        } else {
            retry.run(&format!("upload {repo_path}"), || {
                store.write(local, repo_path, revision, message)
            })?;
            tracing::info!("uploaded {repo_path} ({size} bytes)");
        }
        return Ok(UploadReport {
            uploaded: vec![repo_path.to_string()],
            bytes: size,
        });
    }

    let parts = part_count(size, chunk_size);
    tracing::info!(
        "{repo_path}: {size} bytes exceeds the {chunk_size} byte limit; splitting into {parts} parts"
    );

    if dry_run {
        let uploaded = (0..parts).map(|i| part_name(repo_path, i)).collect();
        tracing::info!("[dry-run] would upload {parts} parts of {repo_path}");
        return Ok(UploadReport {
            uploaded,
            bytes: size,
        });
    }

    let mut reader = File::open(local).map_err(|e| io_err(local, e))?;
    let mut uploaded = Vec::with_capacity(parts as usize);
    for index in 0..parts {
        let name = part_name(repo_path, index);
        let tmp = PathBuf::from(format!("{}.part{index}", local.display()));

        write_window(&mut reader, &tmp, chunk_size)?;
        let result = retry.run(&format!("upload {name}"), || {
            store.write(&tmp, &name, revision, message)
        });
        if let Err(e) = fs::remove_file(&tmp) {
            tracing::warn!("could not remove part file {}: {e}", tmp.display());
        }
        result?;

        tracing::info!("uploaded {name}");
        uploaded.push(name);
    }

    Ok(UploadReport {
        uploaded,
        bytes: size,
    })
}

/// Copy the next `chunk_size` bytes (or whatever remains) of `reader` into a
/// fresh file at `tmp`.
fn write_window(reader: &mut File, tmp: &Path, chunk_size: u64) -> Result<(), SyncError> {
    let mut out = File::create(tmp).map_err(|e| io_err(tmp, e))?;
    let mut window = reader.take(chunk_size);
    io::copy(&mut window, &mut out).map_err(|e| io_err(tmp, e))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use skiff_core::remote::{RemoteEntry, TransportError};
    use tempfile::TempDir;

    /// In-memory hub capturing uploads in call order.
    #[derive(Default)]
    struct FakeStore {
        uploads: RefCell<Vec<(String, Vec<u8>)>>,
        fail_writes: bool,
    }

    impl MirrorClient for FakeStore {
        fn list_revision(&self, _revision: &str) -> Result<Vec<RemoteEntry>, TransportError> {
            Ok(vec![])
        }

        fn read_to(
            &self,
            _repo_path: &str,
            _revision: &str,
            _dest: &Path,
        ) -> Result<(), TransportError> {
            unimplemented!("not exercised by chunker tests")
        }

        fn write(
            &self,
            local: &Path,
            repo_path: &str,
            _revision: &str,
            _message: &str,
        ) -> Result<(), TransportError> {
            if self.fail_writes {
                return Err(TransportError::Connect("refused".into()));
            }
            let bytes = fs::read(local).expect("read upload source");
            self.uploads
                .borrow_mut()
                .push((repo_path.to_string(), bytes));
            Ok(())
        }

        fn ensure_branch(&self, _revision: &str) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn payload(dir: &TempDir, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join("dump.bin");
        fs::write(&path, bytes).unwrap();
        path
    }

    fn no_leftover_parts(dir: &TempDir) -> bool {
        fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .all(|e| !e.file_name().to_string_lossy().contains(".part"))
    }

    #[test]
    fn part_count_is_ceiling_division() {
        assert_eq!(part_count(12, 5), 3);
        assert_eq!(part_count(10, 5), 2);
        assert_eq!(part_count(1, 5), 1);
        assert_eq!(part_count(5, 5), 1);
        assert_eq!(part_count(6, 5), 2);
    }

    #[test]
    fn small_payload_uploads_once_under_canonical_path() {
        let dir = TempDir::new().unwrap();
        let local = payload(&dir, b"tiny");
        let store = FakeStore::default();

        let report = upload_file(
            &store,
            &RetryPolicy::immediate(1),
            &local,
            "dumps/dump.bin",
            "main",
            "sync",
            1024,
            false,
        )
        .unwrap();

        assert_eq!(report.uploaded, vec!["dumps/dump.bin".to_string()]);
        assert_eq!(report.bytes, 4);
        let uploads = store.uploads.borrow();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].1, b"tiny");
        assert!(no_leftover_parts(&dir));
    }

    #[test]
    fn oversized_payload_splits_in_read_order_and_reassembles() {
        let dir = TempDir::new().unwrap();
        let bytes: Vec<u8> = (0u8..=9).collect();
        let local = payload(&dir, &bytes);
        let store = FakeStore::default();

        let report = upload_file(
            &store,
            &RetryPolicy::immediate(1),
            &local,
            "dump.bin",
            "main",
            "sync",
            4,
            false,
        )
        .unwrap();

        assert_eq!(
            report.uploaded,
            vec!["dump.bin.part0", "dump.bin.part1", "dump.bin.part2"]
        );

        let uploads = store.uploads.borrow();
        assert_eq!(uploads.len(), 3);
        assert_eq!(uploads[0].0, "dump.bin.part0");
        assert_eq!(uploads[0].1.len(), 4);
        assert_eq!(uploads[1].1.len(), 4);
        assert_eq!(uploads[2].1.len(), 2, "last part carries the remainder");

        let mut reassembled = Vec::new();
        for (_, part) in uploads.iter() {
            reassembled.extend_from_slice(part);
        }
        assert_eq!(reassembled, bytes);
        assert!(no_leftover_parts(&dir));
    }

    #[test]
    fn exact_multiple_has_no_short_tail_part() {
        let dir = TempDir::new().unwrap();
        let local = payload(&dir, &[7u8; 8]);
        let store = FakeStore::default();

        let report = upload_file(
            &store,
            &RetryPolicy::immediate(1),
            &local,
            "dump.bin",
            "main",
            "sync",
            4,
            false,
        )
        .unwrap();

        assert_eq!(report.uploaded.len(), 2);
        let uploads = store.uploads.borrow();
        assert!(uploads.iter().all(|(_, part)| part.len() == 4));
    }

    #[test]
    fn failed_part_upload_still_removes_the_temporary_part() {
        let dir = TempDir::new().unwrap();
        let local = payload(&dir, &[1u8; 10]);
        let store = FakeStore {
            fail_writes: true,
            ..FakeStore::default()
        };

        let result = upload_file(
            &store,
            &RetryPolicy::immediate(2),
            &local,
            "dump.bin",
            "main",
            "sync",
            4,
            false,
        );

        assert!(result.is_err());
        assert!(no_leftover_parts(&dir), "failure left a part file behind");
        assert!(local.exists(), "the payload itself is untouched");
    }

    #[test]
    fn dry_run_plans_without_writing_anything() {
        let dir = TempDir::new().unwrap();
        let local = payload(&dir, &[1u8; 10]);
        let store = FakeStore::default();

        let report = upload_file(
            &store,
            &RetryPolicy::immediate(1),
            &local,
            "dump.bin",
            "main",
            "sync",
            4,
            true,
        )
        .unwrap();

        assert_eq!(
            report.uploaded,
            vec!["dump.bin.part0", "dump.bin.part1", "dump.bin.part2"]
        );
        assert!(store.uploads.borrow().is_empty(), "dry-run must not upload");
        assert!(no_leftover_parts(&dir));
    }

    #[test]
    fn part_names_are_zero_based_and_ordered() {
        let names: Vec<String> = (0..3).map(|i| part_name("x/y.gz", i)).collect();
        assert_eq!(names, vec!["x/y.gz.part0", "x/y.gz.part1", "x/y.gz.part2"]);
        let sorted = {
            let mut s = names.clone();
            s.sort();
            s
        };
        assert_eq!(names, sorted);
    }
}
