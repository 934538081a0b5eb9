//! Cuts the project's 16x16 icon sheets into one PNG per named sub-icon.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use rayon::prelude::*;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::resources::keys::{ICONS_16_DIR, ICONS_16_MANIFEST};

/// Edge length of one icon in a sheet.
pub const ICON_SIZE: u32 = 16;
/// Sheet background color, keyed to transparent.
pub const ICON_BACKGROUND: [u8; 3] = [128, 160, 128];

#[derive(Debug, Error)]
pub enum IconError {
    #[error("failed to read icon manifest {path}: {reason}")]
    Manifest { path: String, reason: String },
    #[error("failed to open icon sheet {path}: {reason}")]
    Sheet { path: String, reason: String },
    #[error("icon `{name}` at ({x}, {y}) lies outside its sheet")]
    OutOfBounds { name: String, x: u32, y: u32 },
    #[error("failed to write icon {path}: {reason}")]
    Write { path: String, reason: String },
}

#[derive(Debug, Deserialize)]
struct IconSheet {
    nid: String,
    /// Icon name to `(column, row)` in the sheet.
    #[serde(default)]
    subicon_dict: BTreeMap<String, (u32, u32)>,
}

/// Crops the icon at grid cell `(x, y)` and makes its background transparent.
pub fn crop_icon(sheet: &RgbaImage, name: &str, x: u32, y: u32) -> Result<RgbaImage, IconError> {
    let out_of_bounds = || IconError::OutOfBounds {
        name: name.to_string(),
        x,
        y,
    };
    let (left, top) = x
        .checked_mul(ICON_SIZE)
        .zip(y.checked_mul(ICON_SIZE))
        .ok_or_else(out_of_bounds)?;
    let fits = |start: u32, limit: u32| start.checked_add(ICON_SIZE).is_some_and(|end| end <= limit);
    if !fits(left, sheet.width()) || !fits(top, sheet.height()) {
        return Err(out_of_bounds());
    }

    let mut icon = image::imageops::crop_imm(sheet, left, top, ICON_SIZE, ICON_SIZE).to_image();
    for pixel in icon.pixels_mut() {
        if pixel.0[..3] == ICON_BACKGROUND {
            *pixel = Rgba([255, 255, 255, 0]);
        }
    }
    Ok(icon)
}

fn export_sheet(dir: &Path, sheet: &IconSheet, out_dir: &Path) -> Result<usize, IconError> {
    let path = dir.join(format!("{}.png", sheet.nid));
    let image = image::open(&path)
        .map_err(|e| IconError::Sheet {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?
        .to_rgba8();

    let mut written = 0;
    for (name, &(x, y)) in &sheet.subicon_dict {
        let icon = match crop_icon(&image, name, x, y) {
            Ok(icon) => icon,
            Err(e) => {
                warn!(sheet = %sheet.nid, error = %e, "skipping icon");
                continue;
            }
        };
        let target = out_dir.join(format!("{name}.png"));
        if let Err(e) = icon.save(&target) {
            let e = IconError::Write {
                path: target.display().to_string(),
                reason: e.to_string(),
            };
            warn!(sheet = %sheet.nid, error = %e, "skipping icon");
            continue;
        }
        written += 1;
    }
    debug!(sheet = %sheet.nid, written, "exported icon sheet");
    Ok(written)
}

/// Exports every icon of the `sheets` listed in the project's icon manifest
/// into `out_dir`, one sheet per thread. A sheet or icon that cannot be
/// processed is logged and skipped; only an unreadable manifest is an error.
/// Returns the number of icons written.
pub fn export_icons(
    project_root: &Path,
    sheets: &[String],
    out_dir: &Path,
) -> Result<usize, IconError> {
    let dir: PathBuf = project_root.join(ICONS_16_DIR);
    let manifest_path = dir.join(ICONS_16_MANIFEST);
    let manifest_error = |reason: String| IconError::Manifest {
        path: manifest_path.display().to_string(),
        reason,
    };

    let manifest = fs::read(&manifest_path).map_err(|e| manifest_error(e.to_string()))?;
    let manifest: Vec<IconSheet> =
        serde_json::from_slice(&manifest).map_err(|e| manifest_error(e.to_string()))?;
    fs::create_dir_all(out_dir).map_err(|e| IconError::Write {
        path: out_dir.display().to_string(),
        reason: e.to_string(),
    })?;

    let written = manifest
        .par_iter()
        .filter(|sheet| sheets.contains(&sheet.nid))
        .map(|sheet| match export_sheet(&dir, sheet, out_dir) {
            Ok(written) => written,
            Err(e) => {
                warn!(sheet = %sheet.nid, error = %e, "skipping icon sheet");
                0
            }
        })
        .sum::<usize>();
    Ok(written)
}

#[cfg(test)]
mod test {
    use super::*;

    fn sheet() -> RgbaImage {
        let mut sheet = RgbaImage::from_pixel(32, 16, Rgba([128, 160, 128, 255]));
        sheet.put_pixel(17, 3, Rgba([200, 0, 0, 255]));
        sheet
    }

    #[test]
    fn crop_keys_background_to_transparent() {
        let icon = crop_icon(&sheet(), "Sword", 1, 0).unwrap();
        assert_eq!(icon.dimensions(), (ICON_SIZE, ICON_SIZE));
        assert_eq!(icon.get_pixel(0, 0), &Rgba([255, 255, 255, 0]));
        assert_eq!(icon.get_pixel(1, 3), &Rgba([200, 0, 0, 255]));
        assert!(matches!(
            crop_icon(&sheet(), "Lance", 2, 0),
            Err(IconError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn huge_coordinates_are_out_of_bounds() {
        for (x, y) in [(0x1000_0000, 0), (0, u32::MAX), (u32::MAX / ICON_SIZE, 0)] {
            assert!(matches!(
                crop_icon(&sheet(), "Big", x, y),
                Err(IconError::OutOfBounds { .. })
            ));
        }
    }

    #[test]
    fn exports_configured_sheets_only() {
        let project = tempfile::tempdir().unwrap();
        let dir = project.path().join(ICONS_16_DIR);
        fs::create_dir_all(&dir).unwrap();
        sheet().save(dir.join("wexp_icons.png")).unwrap();
        sheet().save(dir.join("portraits.png")).unwrap();
        fs::write(
            dir.join(ICONS_16_MANIFEST),
            r#"[
                {"nid": "wexp_icons", "subicon_dict": {"Sword": [1, 0], "Broken": [5, 5]}},
                {"nid": "portraits", "subicon_dict": {"Eirika": [0, 0]}},
                {"nid": "Affinity", "subicon_dict": {"Fire": [0, 0]}}
            ]"#,
        )
        .unwrap();

        let out = tempfile::tempdir().unwrap();
        let sheets = vec!["wexp_icons".to_string(), "Affinity".to_string()];
        let written = export_icons(project.path(), &sheets, out.path()).unwrap();
        assert_eq!(written, 1);
        assert!(out.path().join("Sword.png").is_file());
        assert!(!out.path().join("Eirika.png").exists());
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let project = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        assert!(matches!(
            export_icons(project.path(), &[], out.path()),
            Err(IconError::Manifest { .. })
        ));
    }
}
