//! Paginated, per-category archive accumulation with in-flight de-duplication.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use jobwatch_logging::watch_debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveCategory {
    Rename,
    Index,
    Scan,
    Error,
}

impl ArchiveCategory {
    pub const ALL: [ArchiveCategory; 4] = [
        ArchiveCategory::Rename,
        ArchiveCategory::Index,
        ArchiveCategory::Scan,
        ArchiveCategory::Error,
    ];

    /// Value of the `type` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            ArchiveCategory::Rename => "rename",
            ArchiveCategory::Index => "index",
            ArchiveCategory::Scan => "scan",
            ArchiveCategory::Error => "error",
        }
    }

    fn slot(self) -> usize {
        match self {
            ArchiveCategory::Rename => 0,
            ArchiveCategory::Index => 1,
            ArchiveCategory::Scan => 2,
            ArchiveCategory::Error => 3,
        }
    }

    /// Decodes an archive response body, typing each item for this category.
    pub fn decode_page(self, body: Value) -> Result<ArchivePage, serde_json::Error> {
        let raw: RawArchivePage = serde_json::from_value(body)?;
        let items = raw
            .items
            .into_iter()
            .map(|item| self.decode_record(item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ArchivePage {
            items,
            total: raw.total,
            page: raw.page,
            page_size: raw.limit,
            has_more: raw.has_more,
        })
    }

    fn decode_record(self, item: Value) -> Result<ArchiveRecord, serde_json::Error> {
        Ok(match self {
            ArchiveCategory::Rename => ArchiveRecord::Rename(serde_json::from_value(item)?),
            ArchiveCategory::Index => ArchiveRecord::Index(serde_json::from_value(item)?),
            ArchiveCategory::Scan => ArchiveRecord::Scan(serde_json::from_value(item)?),
            ArchiveCategory::Error => ArchiveRecord::Error(serde_json::from_value(item)?),
        })
    }
}

impl fmt::Display for ArchiveCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchiveCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rename" | "renames" => Ok(ArchiveCategory::Rename),
            "index" => Ok(ArchiveCategory::Index),
            "scan" => Ok(ArchiveCategory::Scan),
            "error" | "errors" => Ok(ArchiveCategory::Error),
            other => Err(format!("unknown archive category '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRecord {
    pub id: i64,
    pub timestamp: NaiveDateTime,
    pub document_id: u64,
    pub old_title: String,
    pub new_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: i64,
    pub timestamp: NaiveDateTime,
    pub documents_indexed: u64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: i64,
    pub timestamp: NaiveDateTime,
    pub total_documents: u64,
    pub bad_title_documents: u64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub id: i64,
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub document_id: Option<u64>,
    pub error_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveRecord {
    Rename(RenameRecord),
    Index(IndexRecord),
    Scan(ScanRecord),
    Error(ErrorRecord),
}

impl ArchiveRecord {
    pub fn timestamp(&self) -> NaiveDateTime {
        match self {
            ArchiveRecord::Rename(r) => r.timestamp,
            ArchiveRecord::Index(r) => r.timestamp,
            ArchiveRecord::Scan(r) => r.timestamp,
            ArchiveRecord::Error(r) => r.timestamp,
        }
    }

    /// One-line human description used by the text renderer.
    pub fn summary(&self) -> String {
        match self {
            ArchiveRecord::Rename(r) => format!(
                "doc {}: '{}' -> '{}'",
                r.document_id, r.old_title, r.new_title
            ),
            ArchiveRecord::Index(r) => match &r.error {
                Some(error) => format!("{} documents indexed, failed: {error}", r.documents_indexed),
                None => format!("{} documents indexed", r.documents_indexed),
            },
            ArchiveRecord::Scan(r) => format!(
                "{} of {} documents had bad titles",
                r.bad_title_documents, r.total_documents
            ),
            ArchiveRecord::Error(r) => {
                let scope = r.job_type.as_deref().unwrap_or("job");
                match r.document_id {
                    Some(document_id) => format!("{scope} doc {document_id}: {}", r.error_message),
                    None => format!("{scope}: {}", r.error_message),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct RawArchivePage {
    items: Vec<Value>,
    total: u64,
    page: u32,
    limit: u32,
    has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePage {
    pub items: Vec<ArchiveRecord>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub has_more: bool,
}

/// Optional inclusive timestamp bounds applied to every archive request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// A page fetch the caller must perform and report back with the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub category: ArchiveCategory,
    pub page: u32,
    pub limit: u32,
    pub generation: u64,
    pub range: DateRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CategoryState {
    items: Vec<ArchiveRecord>,
    next_page: u32,
    has_more: bool,
    in_flight: bool,
    generation: u64,
    total: Option<u64>,
    last_error: Option<String>,
}

impl Default for CategoryState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_page: 1,
            has_more: true,
            in_flight: false,
            generation: 0,
            total: None,
            last_error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLoader {
    categories: [CategoryState; 4],
    page_size: u32,
    range: DateRange,
}

impl Default for ArchiveLoader {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ArchiveLoader {
    pub fn new(page_size: u32) -> Self {
        Self {
            categories: Default::default(),
            page_size: page_size.max(1),
            range: DateRange::default(),
        }
    }

    /// Claims the next page of `category`.
    ///
    /// Returns `None` while a fetch is outstanding or once the backend reported
    /// the end of the list; such calls are no-ops, not errors.
    pub fn fetch_next(&mut self, category: ArchiveCategory) -> Option<PageRequest> {
        let range = self.range.clone();
        let limit = self.page_size;
        let state = self.state_mut(category);
        if state.in_flight || !state.has_more {
            return None;
        }
        state.in_flight = true;
        Some(PageRequest {
            category,
            page: state.next_page,
            limit,
            generation: state.generation,
            range,
        })
    }

    /// Drops accumulated items and starts over from page 1.
    ///
    /// Any fetch still outstanding for `category` becomes stale and its result
    /// will be discarded.
    pub fn reset(&mut self, category: ArchiveCategory) {
        let state = self.state_mut(category);
        let generation = state.generation.wrapping_add(1);
        *state = CategoryState {
            generation,
            ..CategoryState::default()
        };
    }

    /// Changes the date bounds; every category starts over.
    pub fn set_range(&mut self, range: DateRange) {
        self.range = range;
        for category in ArchiveCategory::ALL {
            self.reset(category);
        }
    }

    /// Appends a fetched page. Returns the number of appended items, or `None`
    /// when the request was stale and the page was discarded.
    pub fn complete(&mut self, request: &PageRequest, page: ArchivePage) -> Option<usize> {
        let state = self.state_mut(request.category);
        if state.generation != request.generation || !state.in_flight {
            watch_debug!(
                "Discarding stale {} page {} (generation {} != {})",
                request.category,
                request.page,
                request.generation,
                state.generation
            );
            return None;
        }
        let appended = page.items.len();
        state.in_flight = false;
        state.last_error = None;
        state.items.extend(page.items);
        state.next_page = request.page.saturating_add(1);
        state.total = Some(page.total);
        // An empty page cannot make progress, so it ends the list as well.
        state.has_more = page.has_more && appended > 0;
        Some(appended)
    }

    /// Records a failed fetch, leaving the page counter so the next trigger
    /// retries the same page. Returns `false` for stale requests.
    pub fn fail(&mut self, request: &PageRequest, message: impl Into<String>) -> bool {
        let state = self.state_mut(request.category);
        if state.generation != request.generation || !state.in_flight {
            return false;
        }
        state.in_flight = false;
        state.last_error = Some(message.into());
        true
    }

    pub fn items(&self, category: ArchiveCategory) -> &[ArchiveRecord] {
        &self.state(category).items
    }

    pub fn has_more(&self, category: ArchiveCategory) -> bool {
        self.state(category).has_more
    }

    pub fn is_loading(&self, category: ArchiveCategory) -> bool {
        self.state(category).in_flight
    }

    pub fn next_page(&self, category: ArchiveCategory) -> u32 {
        self.state(category).next_page
    }

    pub fn total(&self, category: ArchiveCategory) -> Option<u64> {
        self.state(category).total
    }

    pub fn last_error(&self, category: ArchiveCategory) -> Option<&str> {
        self.state(category).last_error.as_deref()
    }

    pub fn range(&self) -> &DateRange {
        &self.range
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    fn state(&self, category: ArchiveCategory) -> &CategoryState {
        &self.categories[category.slot()]
    }

    fn state_mut(&mut self, category: ArchiveCategory) -> &mut CategoryState {
        &mut self.categories[category.slot()]
    }
}
