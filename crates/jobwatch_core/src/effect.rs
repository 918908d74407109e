use crate::PageRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchArchivePage(PageRequest),
    TriggerScan { newer_than: Option<String> },
    TriggerIndex { older_than: Option<String> },
    ProcessDocuments { document_ids: Vec<u64> },
    ClearErrorArchive,
    /// Cancel the progress poller; no further state is applied.
    StopSync,
}
