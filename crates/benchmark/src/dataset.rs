//! Packing list and bin collection files.
//!
//! Instances are stored as pretty-printed JSON packing lists, one per file,
//! named after their generation parameters:
//! `binpacking{i}_{count}count_{max}max_{center}center_{variability}variability_{Algorithm}.json`.
//! The packed result of `name.json` goes to `name_results.json`.

use binpack_core::{BinCollection, PackingList};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BenchmarkError, Result};

/// Loads a packing list from a JSON file.
pub fn load_packing_list(path: impl AsRef<Path>) -> Result<PackingList> {
    let text = fs::read_to_string(path.as_ref())?;
    let list: PackingList = serde_json::from_str(&text)?;
    Ok(list)
}

/// Saves a packing list as pretty-printed JSON.
pub fn save_packing_list(list: &PackingList, path: impl AsRef<Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(list)?;
    fs::write(path, json)?;
    Ok(())
}

/// Saves a packed bin collection as pretty-printed JSON.
pub fn save_collection(collection: &BinCollection, path: impl AsRef<Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(collection)?;
    fs::write(path, json)?;
    Ok(())
}

/// Loads a bin collection from a JSON file.
pub fn load_collection(path: impl AsRef<Path>) -> Result<BinCollection> {
    let text = fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&text)?)
}

/// File name of the `index`-th generated instance.
pub fn instance_file_name(index: usize, list: &PackingList) -> String {
    format!(
        "binpacking{}_{}count_{}max_{}center_{}variability_{}.json",
        index,
        list.count,
        list.capacity,
        list.center.unwrap_or(0),
        list.variability.unwrap_or(0),
        list.algorithm
    )
}

/// Path of the result file belonging to an instance file.
pub fn results_path(instance: &Path) -> PathBuf {
    let stem = instance
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    instance.with_file_name(format!("{stem}_results.json"))
}

/// Loads a single file, or every `*.json` instance in a directory sorted by
/// file name. Result files are skipped.
pub fn load_instances(path: impl AsRef<Path>) -> Result<Vec<(String, PackingList)>> {
    let path = path.as_ref();
    if path.is_file() {
        return Ok(vec![(instance_name(path), load_packing_list(path)?)]);
    }
    if !path.is_dir() {
        return Err(BenchmarkError::NotFound(path.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|file| is_instance_file(file))
        .collect();
    files.sort();

    let mut instances = Vec::with_capacity(files.len());
    for file in files {
        let list = load_packing_list(&file)?;
        instances.push((instance_name(&file), list));
    }
    log::info!("loaded {} instances from {}", instances.len(), path.display());
    Ok(instances)
}

/// Writes generated instances into `dir`, returning the written paths.
pub fn save_instances(lists: &[PackingList], dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(lists.len());
    for (index, list) in lists.iter().enumerate() {
        let path = dir.join(instance_file_name(index, list));
        save_packing_list(list, &path)?;
        written.push(path);
    }
    Ok(written)
}

fn instance_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn is_instance_file(path: &Path) -> bool {
    let is_json = path.extension().map_or(false, |ext| ext == "json");
    let is_result = path
        .file_stem()
        .map_or(false, |stem| stem.to_string_lossy().ends_with("_results"));
    path.is_file() && is_json && !is_result
}

#[cfg(test)]
mod tests {
    use super::*;
    use binpack_core::Algorithm;
    use tempfile::tempdir;

    fn sample() -> PackingList {
        PackingList::from_sizes(100, [60, 30, 10], Algorithm::FirstFitDecreasing)
            .with_generation(50, 3)
            .with_lower_bound(1)
    }

    #[test]
    fn test_instance_file_name() {
        assert_eq!(
            instance_file_name(4, &sample()),
            "binpacking4_3count_100max_50center_3variability_FirstFitDecreasing.json"
        );
    }

    #[test]
    fn test_results_path() {
        let path = Path::new("data/binpacking0_3count.json");
        assert_eq!(
            results_path(path),
            PathBuf::from("data/binpacking0_3count_results.json")
        );
    }

    #[test]
    fn test_packing_list_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("list.json");
        save_packing_list(&sample(), &path).unwrap();
        assert_eq!(load_packing_list(&path).unwrap(), sample());
    }

    #[test]
    fn test_packing_list_json_layout() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["capacity"], 100);
        assert_eq!(json["algorithm"], "FirstFitDecreasing");
        assert_eq!(json["items"], serde_json::json!([60, 30, 10]));
        assert_eq!(json["lower_bound"], 1);

        let bare = PackingList::from_sizes(10, [1], Algorithm::NextFit);
        let json = serde_json::to_value(bare).unwrap();
        assert!(json.get("center").is_none());
    }

    #[test]
    fn test_load_instances_skips_results() {
        let dir = tempdir().unwrap();
        let written = save_instances(&[sample(), sample()], dir.path()).unwrap();
        assert_eq!(written.len(), 2);

        let collection = binpack_core::BinPacker::default().solve(&sample()).unwrap();
        save_collection(&collection, results_path(&written[0])).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let instances = load_instances(dir.path()).unwrap();
        let names: Vec<&str> = instances.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "binpacking0_3count_100max_50center_3variability_FirstFitDecreasing",
                "binpacking1_3count_100max_50center_3variability_FirstFitDecreasing",
            ]
        );
        assert_eq!(load_collection(results_path(&written[0])).unwrap(), collection);
    }

    #[test]
    fn test_load_collection_rejects_inconsistent_file() {
        let dir = tempdir().unwrap();
        let cases = [
            (
                r#"{"capacity":10,"count":5,"bins":[{"capacity":10,"items":[3],"usage":3}],"algorithm":"BestFit"}"#,
                "count 5 but 1 bins",
            ),
            (
                r#"{"capacity":10,"count":1,"bins":[{"capacity":10,"items":[3],"usage":20}],"algorithm":"BestFit"}"#,
                "bin usage 20 but items sum to 3",
            ),
            (
                r#"{"capacity":10,"count":1,"bins":[{"capacity":10,"items":[8,7],"usage":15}],"algorithm":"BestFit"}"#,
                "bin usage 15 exceeds capacity 10",
            ),
            (
                r#"{"capacity":10,"count":1,"bins":[{"capacity":20,"items":[15],"usage":15}],"algorithm":"BestFit"}"#,
                "bin 0 has capacity 20, collection 10",
            ),
        ];

        for (index, (json, message)) in cases.iter().enumerate() {
            let path = dir.path().join(format!("corrupt{index}_results.json"));
            fs::write(&path, json).unwrap();
            match load_collection(&path) {
                Err(BenchmarkError::Json(err)) => {
                    assert!(err.to_string().contains(message), "{err}")
                }
                other => panic!("expected a JSON error for case {index}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_load_collection_accepts_consistent_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ok_results.json");
        let json = r#"{"capacity":10,"count":2,"bins":[{"capacity":10,"items":[6,4],"usage":10},{"capacity":10,"items":[3],"usage":3}],"algorithm":"BestFit"}"#;
        fs::write(&path, json).unwrap();
        let collection = load_collection(&path).unwrap();
        assert_eq!(collection.total_bins(), collection.bins().len());
        assert_eq!(collection.total_usage(), 13);
        assert_eq!(collection.solution_time_ns(), None);
    }

    #[test]
    fn test_load_missing_path() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            load_instances(&missing),
            Err(BenchmarkError::NotFound(_))
        ));
    }
}
