use serde::Serialize;

use crate::error::{ReviewError, ReviewResult};

/// Processing status of one uploaded file.
///
/// `Pending -> Processing -> Completed | Error`. Both outcomes are terminal;
/// a failed file has to be uploaded again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl FileStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, FileStatus::Completed | FileStatus::Error)
    }

    pub fn can_transition_to(self, next: FileStatus) -> bool {
        matches!(
            (self, next),
            (FileStatus::Pending, FileStatus::Processing)
                | (FileStatus::Processing, FileStatus::Completed)
                | (FileStatus::Processing, FileStatus::Error)
        )
    }

    pub fn transition(self, next: FileStatus) -> ReviewResult<FileStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ReviewError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}
