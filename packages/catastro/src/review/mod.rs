//! Manual review: revalidation on edit, per-file processing status, the
//! per-document-type workspace, and persistence of reviewed records.

pub mod revalidation;
pub mod sink;
pub mod status;
pub mod workspace;

pub use revalidation::{
    apply_edit, ensure_savable, revalidate, save_reviewed, FieldIssue, ReviewReport,
};
pub use sink::{DocumentSink, LoggingSink, SaveReceipt};
pub use status::FileStatus;
pub use workspace::{Lane, LaneView, Notice, NoticeKind, TrackedFile, Workspace, WorkspaceEvent};
