pub(crate) mod buffer;
mod command;
#[allow(clippy::module_inception)]
mod coordinator;
mod diagnostics;
mod status;
mod upload_pass;

pub use {
    command::CoordinatorCommand,
    coordinator::{
        Coordinator, CoordinatorSettings, DEFAULT_FLUSH_INTERVAL, DEFAULT_MAX_BUFFERED_FRAGMENTS,
    },
    diagnostics::{DIAGNOSTIC_CAPACITY, DiagnosticEntry, DiagnosticLevel, DiagnosticLog},
    status::{CoordinatorStatus, RecordingState},
    upload_pass::{PassFailure, PassReport, UploadedSegment, run_upload_pass},
};
