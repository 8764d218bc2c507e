use caueeg_rs::CaueegError;

pub const SUCCESS: i32 = 0;
pub const INPUT_ERROR: i32 = 1;
pub const EXECUTION_ERROR: i32 = 2;
/// Some recordings converted, some failed.
pub const PARTIAL_FAILURE: i32 = 3;

/// Exit code for a fatal library error.
pub fn for_error(err: &CaueegError) -> i32 {
    match err {
        CaueegError::SourceNotFound(_)
        | CaueegError::FileNotFound(_)
        | CaueegError::InvalidEdfHeader { .. }
        | CaueegError::UnresolvedChannel { .. }
        | CaueegError::MergeConflict { .. }
        | CaueegError::MalformedEvents { .. }
        | CaueegError::Json(_)
        | CaueegError::Csv(_) => INPUT_ERROR,
        CaueegError::ExecutionFailed(_) | CaueegError::Io(_) => EXECUTION_ERROR,
    }
}
