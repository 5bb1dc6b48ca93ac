pub mod draft;
pub mod entry;
pub mod filter;
pub mod money;
pub mod summary;

pub use draft::{DraftError, EntryDraft, RecognitionResult};
pub use entry::{EntryType, LedgerEntry, PaymentMethod};
pub use filter::{EntryFilter, TypeFilter};
pub use money::Money;
pub use summary::Summary;
