pub mod auth;
pub mod error;
pub mod sitemap;
pub mod submit;

pub use auth::{Authenticator, Credential, CredentialStore, FileCredentialStore};
pub use error::IndexError;
pub use submit::{IndexingClient, RunSummary, SubmissionResult, Submitter};
