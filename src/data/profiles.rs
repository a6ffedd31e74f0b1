//! Profile-file ingest + validation.
//!
//! Upstream tooling (the depth-sampling stage that reads surface meshes and
//! statistical maps) exports per-region response arrays as JSON:
//!
//! ```json
//! {
//!   "contrasts": [0.025, 0.061, 0.163, 0.72],
//!   "regions": [
//!     { "name": "V1", "profiles": [ [ [d0, d1, ...], ... ], ... ] }
//!   ]
//! }
//! ```
//!
//! `profiles` is nested subject-major: subjects x conditions x depth levels.
//! Everything is validated here with row-level error messages so a malformed
//! export fails fast, before any bootstrap work starts.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{validate_contrasts, DepthProfile};
use crate::error::AppError;

/// On-disk schema of a profile file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileFile {
    pub contrasts: Vec<f64>,
    pub regions: Vec<RegionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionEntry {
    pub name: String,
    pub profiles: Vec<Vec<Vec<f64>>>,
}

/// Validated in-memory input for a run.
#[derive(Debug, Clone)]
pub struct LoadedProfiles {
    pub contrasts: Vec<f64>,
    pub regions: Vec<DepthProfile>,
}

/// Read and validate a profile JSON file.
pub fn read_profiles_json(path: &Path) -> Result<LoadedProfiles, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open profile file '{}': {e}", path.display())))?;
    let parsed: ProfileFile = serde_json::from_reader(file)
        .map_err(|e| AppError::io(format!("Invalid profile file '{}': {e}", path.display())))?;
    validate_profiles(parsed)
}

/// Validate a parsed profile file and flatten each region's nested arrays.
pub fn validate_profiles(file: ProfileFile) -> Result<LoadedProfiles, AppError> {
    validate_contrasts(&file.contrasts)?;
    if file.regions.is_empty() {
        return Err(AppError::config("Profile file contains no regions."));
    }

    let conditions = file.contrasts.len();
    let mut regions = Vec::with_capacity(file.regions.len());
    for entry in file.regions {
        regions.push(flatten_region(entry, conditions)?);
    }

    Ok(LoadedProfiles {
        contrasts: file.contrasts,
        regions,
    })
}

fn flatten_region(entry: RegionEntry, conditions: usize) -> Result<DepthProfile, AppError> {
    let name = entry.name;
    let subjects = entry.profiles.len();
    if subjects == 0 {
        return Err(AppError::config(format!("Region '{name}' has no subjects.")));
    }

    let depths = entry
        .profiles
        .first()
        .and_then(|subject| subject.first())
        .map(|row| row.len())
        .unwrap_or(0);

    let mut data = Vec::with_capacity(subjects * conditions * depths);
    for (s, subject) in entry.profiles.iter().enumerate() {
        if subject.len() != conditions {
            return Err(AppError::config(format!(
                "Region '{name}', subject {s}: expected {conditions} condition rows, got {}.",
                subject.len()
            )));
        }
        for (c, row) in subject.iter().enumerate() {
            if row.len() != depths {
                return Err(AppError::config(format!(
                    "Region '{name}', subject {s}, condition {c}: expected {depths} depth \
                     values, got {}.",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
    }

    DepthProfile::new(name, subjects, conditions, depths, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two(name: &str) -> RegionEntry {
        RegionEntry {
            name: name.to_string(),
            profiles: vec![
                vec![vec![1.0, 2.0], vec![3.0, 4.0]],
                vec![vec![5.0, 6.0], vec![7.0, 8.0]],
            ],
        }
    }

    #[test]
    fn valid_file_flattens_subject_major() {
        let file = ProfileFile {
            contrasts: vec![0.1, 0.7],
            regions: vec![two_by_two("v1")],
        };
        let loaded = validate_profiles(file).unwrap();
        assert_eq!(loaded.regions.len(), 1);
        let region = &loaded.regions[0];
        assert_eq!((region.subjects, region.conditions, region.depths), (2, 2, 2));
        assert_eq!(region.value(0, 1, 0), 3.0);
        assert_eq!(region.value(1, 0, 1), 6.0);
    }

    #[test]
    fn condition_row_mismatch_is_rejected() {
        let mut entry = two_by_two("v1");
        entry.profiles[1].pop();
        let file = ProfileFile {
            contrasts: vec![0.1, 0.7],
            regions: vec![entry],
        };
        let err = validate_profiles(file).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn ragged_depth_row_is_rejected() {
        let mut entry = two_by_two("v1");
        entry.profiles[0][1].push(9.0);
        let file = ProfileFile {
            contrasts: vec![0.1, 0.7],
            regions: vec![entry],
        };
        assert!(validate_profiles(file).is_err());
    }

    #[test]
    fn empty_regions_are_rejected() {
        let file = ProfileFile {
            contrasts: vec![0.1, 0.7],
            regions: vec![],
        };
        assert!(validate_profiles(file).is_err());
    }
}
