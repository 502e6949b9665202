//! Parallel reading of many containers.
//!
//! Each file is decoded independently on the rayon pool; a failure in one
//! file does not affect the others.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{info, warn};

use super::reader::IArchive;
use crate::core::ClassSchemaProvider;
use crate::util::Result;

/// Outcome of reading one file.
#[derive(Debug)]
pub struct BatchEntry<T> {
    pub path: PathBuf,
    pub result: Result<T>,
}

/// Decode every file in `paths`, in parallel. Results keep input order.
pub fn read_all<P>(paths: &[P], schema: &dyn ClassSchemaProvider) -> Vec<BatchEntry<IArchive>>
where
    P: AsRef<Path> + Sync,
{
    run(paths, |path| IArchive::open(path, schema))
}

/// Decode and re-encode every file, reporting whether the output is
/// byte-identical to the input.
pub fn verify_roundtrip<P>(paths: &[P], schema: &dyn ClassSchemaProvider) -> Vec<BatchEntry<bool>>
where
    P: AsRef<Path> + Sync,
{
    run(paths, |path| {
        let original = std::fs::read(path)?;
        let archive = IArchive::from_bytes(&original, schema)?;
        Ok(archive.to_bytes(schema)? == original)
    })
}

fn run<P, T, F>(paths: &[P], job: F) -> Vec<BatchEntry<T>>
where
    P: AsRef<Path> + Sync,
    T: Send,
    F: Fn(&Path) -> Result<T> + Sync,
{
    let entries: Vec<BatchEntry<T>> = paths
        .par_iter()
        .map(|p| {
            let path = p.as_ref();
            let result = job(path);
            if let Err(e) = &result {
                warn!(path = %path.display(), error = %e, "batch item failed");
            }
            BatchEntry { path: path.to_path_buf(), result }
        })
        .collect();

    let failed = entries.iter().filter(|e| e.result.is_err()).count();
    info!(files = entries.len(), failed, "batch complete");
    entries
}
