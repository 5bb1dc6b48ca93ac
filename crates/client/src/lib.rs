pub mod api;
pub mod error;
pub mod session;

pub use api::{ApiClient, LedgerApi, LoginResponse, ReceiptScanner, RegisterResponse};
pub use error::ApiError;
pub use session::{Session, SessionStore, UserAccount};
