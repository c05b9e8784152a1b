use crate::error::DeckError;
use crate::progress::ProgressReporter;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A raster image ready to embed: JPEG bytes carried as a data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
}

impl EmbeddedImage {
    pub fn from_jpeg(bytes: &[u8], width: u32, height: u32) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self {
            data_uri: format!("data:image/jpeg;base64,{encoded}"),
            width,
            height,
        }
    }

    /// Decodes the data URI back into JPEG bytes.
    pub fn jpeg_bytes(&self) -> Option<Vec<u8>> {
        let (header, payload) = self.data_uri.split_once(',')?;
        if !header.starts_with("data:image/jpeg") || !header.contains("base64") {
            return None;
        }
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .ok()
    }

    /// Height of this image when drawn `width` points wide.
    pub fn height_for_width(&self, width: f32) -> f32 {
        if self.width == 0 {
            return 0.0;
        }
        width * self.height as f32 / self.width as f32
    }
}

/// Resolved logical key -> embeddable image. Keys that failed are absent.
pub type AssetMap = BTreeMap<String, EmbeddedImage>;

/// Where raw asset bytes come from.
pub trait AssetSource: Sync {
    fn fetch(&self, key: &str) -> Result<Vec<u8>, DeckError>;
}

/// Resolves `key` to `<root>/photos/<key>.jpg`.
#[derive(Debug, Clone)]
pub struct DirectoryAssetSource {
    root: PathBuf,
}

impl DirectoryAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join("photos").join(format!("{key}.jpg"))
    }
}

fn is_logical_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_'))
}

impl AssetSource for DirectoryAssetSource {
    fn fetch(&self, key: &str) -> Result<Vec<u8>, DeckError> {
        if !is_logical_key(key) {
            return Err(DeckError::asset(key, "not a logical asset name"));
        }
        let path = self.path_for(key);
        std::fs::read(&path)
            .map_err(|err| DeckError::asset(key, format!("{}: {}", display(&path), err)))
    }
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Serves bytes held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetSource {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(key.into(), bytes);
    }
}

impl AssetSource for MemoryAssetSource {
    fn fetch(&self, key: &str) -> Result<Vec<u8>, DeckError> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| DeckError::asset(key, "not found"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetOptions {
    pub target_width: u32,
    /// JPEG quality, 1..=100.
    pub quality: u8,
}

impl Default for AssetOptions {
    fn default() -> Self {
        Self {
            target_width: 800,
            quality: 72,
        }
    }
}

/// `round(natural_height * target_width / natural_width)`, at least 1.
pub fn scaled_height(natural_width: u32, natural_height: u32, target_width: u32) -> u32 {
    if natural_width == 0 {
        return 1;
    }
    let num = natural_height as u64 * target_width as u64;
    let den = natural_width as u64;
    ((num + den / 2) / den).clamp(1, u32::MAX as u64) as u32
}

/// Decodes, resizes to the target width and re-encodes one image.
pub fn prepare_image(key: &str, bytes: &[u8], options: &AssetOptions) -> Result<EmbeddedImage, DeckError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|err| DeckError::asset(key, err.to_string()))?;
    let (natural_width, natural_height) = decoded.dimensions();
    if natural_width == 0 || natural_height == 0 {
        return Err(DeckError::asset(key, "image has no pixels"));
    }
    let width = options.target_width.max(1);
    let height = scaled_height(natural_width, natural_height, width);
    let resized = decoded
        .resize_exact(width, height, FilterType::Triangle)
        .to_rgb8();

    let mut jpeg = Vec::new();
    let quality = options.quality.clamp(1, 100);
    JpegEncoder::new_with_quality(&mut jpeg, quality)
        .encode_image(&resized)
        .map_err(|err| DeckError::asset(key, err.to_string()))?;
    Ok(EmbeddedImage::from_jpeg(&jpeg, width, height))
}

/// Fetches and prepares every key concurrently.
///
/// A failure only drops that key from the result; the call itself never fails.
/// Progress is reported after each key resolves, as `completed / total`,
/// mapped onto `percent_range`.
pub fn preprocess_assets(
    source: &dyn AssetSource,
    keys: &[String],
    options: &AssetOptions,
    progress: &mut ProgressReporter<'_>,
    percent_range: (u8, u8),
) -> AssetMap {
    let mut seen = BTreeSet::new();
    let unique: Vec<&str> = keys
        .iter()
        .map(String::as_str)
        .filter(|key| seen.insert(*key))
        .collect();
    let total = unique.len();
    let tracker = Mutex::new((0usize, progress));

    let outcomes: Vec<(&str, Option<EmbeddedImage>)> = unique
        .par_iter()
        .map(|key| {
            let result = source
                .fetch(key)
                .and_then(|bytes| prepare_image(key, &bytes, options));
            let prepared = match result {
                Ok(image) => {
                    log::debug!("asset '{key}' prepared at {}x{}", image.width, image.height);
                    Some(image)
                }
                Err(err) => {
                    log::warn!("{err}; falling back to a drawn placeholder");
                    None
                }
            };
            if let Ok(mut guard) = tracker.lock() {
                guard.0 += 1;
                let done = guard.0;
                guard
                    .1
                    .report_fraction("Preparing images", done, total, percent_range.0, percent_range.1);
            }
            (*key, prepared)
        })
        .collect();

    outcomes
        .into_iter()
        .filter_map(|(key, image)| image.map(|image| (key.to_string(), image)))
        .collect()
}
