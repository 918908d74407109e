//! Jobwatch core: job feed model, transition diffing, display pacing, archive
//! pagination, and the pure dashboard state machine.
mod archive;
mod effect;
mod invalidate;
mod job;
mod msg;
mod stabilizer;
mod state;
mod store;
mod transitions;
mod update;
mod validate;
mod view_model;
pub mod wire;

pub use archive::{
    ArchiveCategory, ArchiveLoader, ArchivePage, ArchiveRecord, DateRange, ErrorRecord,
    IndexRecord, PageRequest, RenameRecord, ScanRecord, DEFAULT_PAGE_SIZE,
};
pub use effect::Effect;
pub use invalidate::{affected_categories, categories_to_refresh};
pub use job::{
    DocumentError, JobFilters, JobId, JobKind, JobSnapshot, JobStatus, ProgressFeed,
    INDEX_JOB_ID, PROCESS_JOB_PREFIX,
};
pub use msg::{LaunchAction, Msg};
pub use stabilizer::{Blank, DisplayStabilizer, DEFAULT_MIN_DISPLAY_TIME};
pub use state::{AppState, Notice, NoticeKind};
pub use store::{ProgressStore, Subscription};
pub use transitions::{diff, TransitionEvent};
pub use update::update;
pub use validate::{parse_document_ids, validate_date, validate_document_ids, ValidationError};
pub use view_model::{AppViewModel, ArchiveView, JobRowView};
