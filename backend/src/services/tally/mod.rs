//! Bin accounting for a single site tally.
//!
//! A site's form bins are expanded into individual [`BinInstance`]s, each
//! identified by a [`BinKey`]. A [`TallySession`] walks a worker through
//! identifying themselves, inspecting or reporting bins missing, and
//! confirming. [`reconcile`] turns a finished session into the stored
//! submission payload, where every instance lands in exactly one of three
//! states: inspected, missing, or uninspected (recorded as empty).

pub mod bin_key;
pub mod inspection;
pub mod reconcile;
pub mod session;
pub mod site;

pub use bin_key::{display_name, extract_bin_id, extract_bin_name, BinKey};
pub use inspection::{
    fullness_label, BinInspection, Fullness, InspectionInput, MissingBinReport, WorkerInfo, WorkerType,
};
pub use reconcile::{
    build_submission, confirmation, tables_from_payload, BinCounts, BinTables, ConfirmationView,
    MissingBin, SubmissionPayload, UNINSPECTED_STATUS,
};
pub use session::{Back, TallySession, TallyStep};
pub use site::{BinInstance, Site};

/// Rule violations raised by the tally state machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TallyError {
    #[error("Please enter your name")]
    MissingWorkerName,

    #[error("Enter your details before inspecting bins")]
    WorkerNotIdentified,

    #[error("Bin '{0}' is not part of this site")]
    UnknownBin(String),

    #[error("Select at least one bin to report as missing")]
    NoBinsSelected,

    #[error("Please provide a reason why the bin(s) are missing")]
    MissingComment,

    #[error("Invalid fullness level: {0}")]
    InvalidFullness(i64),

    #[error("This tally has already been submitted")]
    AlreadySubmitted,
}
