pub mod query;
pub mod scan;

pub use query::{QueryEngine, QueryOptions, ViewState};
pub use scan::{
    ReceiptWorkflow, ScanError, ScanOutcome, ScanPhase, ScanRequest, MAX_PAYLOAD_CHARS,
    RECEIPT_MAX_DIMENSION, RECOGNITION_LANGUAGE,
};
