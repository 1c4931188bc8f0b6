//! Image references for per-color upload slots.
//!
//! Upload slots only accept image files.  Detection is content-based
//! (shared-mime-info magic via `tree_magic_mini`), not extension matching,
//! and the header is decoded once to record the pixel dimensions.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use serde::Serialize;

/// A picked image, ready to be handed to the (external) uploader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    pub path: PathBuf,
    pub mime: String,
    pub width: u32,
    pub height: u32,
}

impl ImageRef {
    /// Short label for the upload slot (`photo.png · 640×480`).
    pub fn label(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string());
        format!("{name} · {}×{}", self.width, self.height)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("{0} is not a readable file")]
    NotAFile(PathBuf),
    #[error("{path} is {mime}, not an image")]
    NotAnImage { path: PathBuf, mime: String },
    #[error("cannot decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Inspect `path` and accept it only if it is an image (`image/*`).
pub fn probe(path: &Path) -> Result<ImageRef, ImageError> {
    if !path.is_file() {
        return Err(ImageError::NotAFile(path.to_path_buf()));
    }
    let mime = sniff_mime(path);
    if !mime.starts_with("image/") {
        return Err(ImageError::NotAnImage {
            path: path.to_path_buf(),
            mime,
        });
    }
    let (width, height) = image::image_dimensions(path).map_err(|source| ImageError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ImageRef {
        path: path.to_path_buf(),
        mime,
        width,
        height,
    })
}

/// Content-based MIME detection.  Falls back to the decoder's own magic
/// table when the system mime database is missing or unsure.
fn sniff_mime(path: &Path) -> String {
    let detected = tree_magic_mini::from_filepath(path).unwrap_or("application/octet-stream");
    if detected.starts_with("image/") {
        return detected.to_string();
    }
    let head = read_head(path, 64);
    match image::guess_format(&head) {
        Ok(format) => format.to_mime_type().to_string(),
        Err(_) => detected.to_string(),
    }
}

fn read_head(path: &Path, len: usize) -> Vec<u8> {
    use std::io::Read;

    let mut buf = Vec::with_capacity(len);
    if let Ok(file) = std::fs::File::open(path) {
        let _ = file.take(len as u64).read_to_end(&mut buf);
    }
    buf
}

/// File extensions offered by the picker.  The picker is a convenience
/// listing; [`probe`] still makes the final content-based decision.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "tif", "tiff", "ico"];

/// List candidate image files under `root` for the picker, sorted by path.
pub fn find_candidates(root: &Path, max_depth: usize, limit: usize) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .max_depth(Some(max_depth))
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut out = Vec::new();
    for entry in walker.flatten() {
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = entry.path();
        let is_image = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()));
        if is_image {
            out.push(path.to_path_buf());
            if out.len() >= limit {
                break;
            }
        }
    }
    out
}

/// Decode `path` and downscale it to a thumbnail for the half-block preview.
pub fn load_thumbnail(path: &Path, max_side: u32) -> Result<image::RgbaImage, ImageError> {
    let img = image::open(path).map_err(|source| ImageError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.thumbnail(max_side, max_side).to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_png(path: &Path, w: u32, h: u32) {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([200, 30, 30, 255]));
        img.save_with_format(path, image::ImageFormat::Png)
            .expect("save png");
    }

    #[test]
    fn probe_accepts_png_and_records_dimensions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("red.png");
        write_png(&path, 4, 3);

        let r = probe(&path).expect("probe");
        assert_eq!(r.mime, "image/png");
        assert_eq!((r.width, r.height), (4, 3));
        assert_eq!(r.label(), "red.png · 4×3");
    }

    #[test]
    fn probe_rejects_non_images_even_with_image_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.png");
        std::fs::write(&path, "just some text\n").expect("write");

        match probe(&path) {
            Err(ImageError::NotAnImage { mime, .. }) => assert!(!mime.starts_with("image/")),
            other => panic!("expected NotAnImage, got {other:?}"),
        }
    }

    #[test]
    fn probe_rejects_missing_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            probe(&dir.path().join("gone.png")),
            Err(ImageError::NotAFile(_))
        ));
    }

    #[test]
    fn candidates_filter_by_extension_and_sort() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_png(&dir.path().join("b.png"), 1, 1);
        write_png(&dir.path().join("a.PNG"), 1, 1);
        std::fs::write(dir.path().join("readme.txt"), "x").expect("write");

        let found = find_candidates(dir.path(), 3, 10);
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PNG", "b.png"]);
    }

    #[test]
    fn thumbnail_fits_requested_box() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("wide.png");
        write_png(&path, 64, 16);
        let thumb = load_thumbnail(&path, 32).expect("thumb");
        assert_eq!((thumb.width(), thumb.height()), (32, 8));
    }
}
