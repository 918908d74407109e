use crate::{ArchiveCategory, JobKind, TransitionEvent};

/// Archive categories a finished job of `kind` may have changed.
pub fn affected_categories(kind: JobKind) -> &'static [ArchiveCategory] {
    match kind {
        JobKind::Index => &[
            ArchiveCategory::Index,
            ArchiveCategory::Rename,
            ArchiveCategory::Error,
        ],
        JobKind::Scan => &[
            ArchiveCategory::Scan,
            ArchiveCategory::Rename,
            ArchiveCategory::Error,
        ],
        JobKind::Process => &[ArchiveCategory::Rename, ArchiveCategory::Error],
    }
}

/// Collects the categories to reset and refetch for one batch of events.
///
/// Each category appears once, in first-affected order, so a delivery with
/// several finished jobs issues a single page-1 request per category.
pub fn categories_to_refresh(events: &[TransitionEvent]) -> Vec<ArchiveCategory> {
    let mut categories = Vec::new();
    for event in events {
        if let TransitionEvent::JobFinished { kind, .. } = event {
            for category in affected_categories(*kind) {
                if !categories.contains(category) {
                    categories.push(*category);
                }
            }
        }
    }
    categories
}
