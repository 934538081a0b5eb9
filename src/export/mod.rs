//! Writing the extracted guide to disk.

#[cfg(feature = "icons")]
pub mod icons;

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::IResult;
use crate::guide::types::Guide;

/// Name of the dataset inside the output directory.
pub const GUIDE_FILE: &str = "guide.json";

fn write_json(path: &Path, guide: &Guide, pretty: bool) -> IResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, guide)?;
    } else {
        serde_json::to_writer(&mut writer, guide)?;
    }
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

/// Writes `guide` to `out_dir/guide.json`, minified unless `pretty`.
///
/// The dataset is written next to the target first and renamed over it once
/// complete, so an interrupted or failed write leaves the previous dataset
/// in place.
pub fn write_guide(guide: &Guide, out_dir: &Path, pretty: bool) -> IResult<PathBuf> {
    fs::create_dir_all(out_dir)?;
    let target = out_dir.join(GUIDE_FILE);
    let temp = target.with_extension("json.tmp");

    if let Err(e) = write_json(&temp, guide, pretty) {
        let _ = fs::remove_file(&temp);
        return Err(e);
    }
    fs::rename(&temp, &target)?;

    debug!(path = %target.display(), "wrote guide");
    Ok(target)
}

/// Reads a dataset written by [`write_guide`].
pub fn read_guide(path: &Path) -> IResult<Guide> {
    Guide::from_reader(BufReader::new(File::open(path)?))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::extract::test::extract_project;
    use crate::guide::types::GuideLookup;

    #[test]
    fn written_guide_reads_back_with_lookups() {
        let dir = tempfile::tempdir().unwrap();
        let guide = extract_project();
        let path = write_guide(&guide, dir.path(), false).unwrap();
        assert_eq!(path, dir.path().join(GUIDE_FILE));

        let read = read_guide(&path).unwrap();
        assert_eq!(read.counts(), guide.counts());
        assert!(read.item("iron-sword").is_some());
        read.verify_links().unwrap();
    }

    #[test]
    fn rewrite_replaces_previous_dataset_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let guide = extract_project();

        write_guide(&Guide::default(), &out, false).unwrap();
        let path = write_guide(&guide, &out, false).unwrap();
        let minified = fs::read(&path).unwrap();
        assert_eq!(minified, serde_json::to_vec(&guide).unwrap());

        let entries: Vec<_> = fs::read_dir(&out)
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![GUIDE_FILE]);
    }

    #[test]
    fn reruns_write_identical_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let first = fs::read(write_guide(&extract_project(), dir.path(), true).unwrap()).unwrap();
        let second = fs::read(write_guide(&extract_project(), dir.path(), true).unwrap()).unwrap();
        assert_eq!(first, second);
        assert!(first.contains(&b'\n'));
    }
}
