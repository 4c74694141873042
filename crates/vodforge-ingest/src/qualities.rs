//! Rendition ladder selection.

use vodforge_models::{QualityCatalog, QualityLabel, SourceMetadata};

use crate::validate::{ValidationError, ValidationIssue};

/// Choose the default ladder for a source.
///
/// Includes every catalog rung whose height fits the source height,
/// highest first; a 1080p source gets the full ladder, a 720p source
/// starts at 720p, and sub-240p sources still get the lowest rung.
pub fn select_qualities(metadata: &SourceMetadata, catalog: &QualityCatalog) -> Vec<QualityLabel> {
    let selected: Vec<QualityLabel> = catalog
        .labels()
        .filter(|label| label.height() <= metadata.height)
        .collect();

    if selected.is_empty() {
        vec![catalog.lowest()]
    } else {
        selected
    }
}

/// Resolve the ladder for a submission.
///
/// A caller-supplied override is used verbatim after validation
/// (non-empty, duplicates removed with order preserved); otherwise the
/// default selection applies.
pub fn resolve_qualities(
    requested: Option<Vec<QualityLabel>>,
    metadata: &SourceMetadata,
    catalog: &QualityCatalog,
) -> Result<Vec<QualityLabel>, ValidationError> {
    match requested {
        None => Ok(select_qualities(metadata, catalog)),
        Some(labels) => {
            if labels.is_empty() {
                return Err(ValidationError::single(ValidationIssue::EmptyQualityList));
            }
            let mut seen = Vec::with_capacity(labels.len());
            for label in labels {
                if !seen.contains(&label) {
                    seen.push(label);
                }
            }
            Ok(seen)
        }
    }
}
