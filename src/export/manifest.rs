use crate::foundation::core::{BoundingBox, SeaState};
use crate::foundation::error::{AugmentError, AugmentResult};
use crate::store::results::GenerationResult;
use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the manifest written next to the exported images.
pub const MANIFEST_FILE: &str = "annotations.json";

/// One manifest entry, describing one exported image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// Exported file name, relative to the export directory.
    pub image_file: String,
    /// Name of the source image.
    pub original_file: String,
    /// Prompt recorded for the result.
    pub prompt: String,
    /// Base seed plus the 1-based result position; also the noise seed of that result.
    pub generation_seed: u64,
    /// Box around the inserted obstacle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
    /// Classified sea state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sea_state: Option<SeaState>,
    /// Present (and `true`) only for hard examples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_hard_example: Option<bool>,
}

impl AnnotationRecord {
    /// Manifest entry for the `n`-th (1-based) result.
    pub fn for_result(result: &GenerationResult, n: u64, seed: u64) -> Self {
        Self {
            image_file: image_file_name(result, n),
            original_file: result.source.name.clone(),
            prompt: result.prompt.clone(),
            generation_seed: seed.wrapping_add(n),
            bounding_box: result.bounding_box,
            sea_state: result.sea_state,
            // Only a positive evaluation is recorded.
            is_hard_example: result.is_hard_example.filter(|hard| *hard),
        }
    }
}

fn image_file_name(result: &GenerationResult, n: u64) -> String {
    format!(
        "{}_variation_{n}.{}",
        result.source.stem(),
        result.image.file_extension()
    )
}

/// Files produced by [`export_dataset`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExportSummary {
    /// Image files written.
    pub images: usize,
    /// Video files written.
    pub animations: usize,
    /// Path of the manifest.
    pub manifest: PathBuf,
}

/// Write every result (and its animation, when present) into `out_dir` together with the
/// manifest. Existing files with the same names are overwritten.
pub fn export_dataset(
    results: &[GenerationResult],
    out_dir: &Path,
    seed: u64,
) -> AugmentResult<ExportSummary> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create export directory '{}'", out_dir.display()))?;

    let mut records = Vec::with_capacity(results.len());
    let mut summary = ExportSummary::default();
    for (n, result) in (1u64..).zip(results) {
        let record = AnnotationRecord::for_result(result, n, seed);
        let path = out_dir.join(&record.image_file);
        std::fs::write(&path, result.image.bytes.as_slice())
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        summary.images += 1;

        if let Some(video) = &result.animation {
            let path = path.with_extension(video.file_extension());
            std::fs::write(&path, video.bytes.as_slice())
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            summary.animations += 1;
        }
        records.push(record);
    }

    let manifest = out_dir.join(MANIFEST_FILE);
    let json = serde_json::to_vec_pretty(&records)
        .map_err(|e| AugmentError::serde(format!("encode manifest: {e}")))?;
    std::fs::write(&manifest, json)
        .with_context(|| format!("failed to write '{}'", manifest.display()))?;
    summary.manifest = manifest;

    tracing::info!(
        images = summary.images,
        animations = summary.animations,
        dir = %out_dir.display(),
        "dataset exported"
    );
    Ok(summary)
}

#[cfg(test)]
#[path = "../../tests/unit/export/manifest.rs"]
mod tests;
