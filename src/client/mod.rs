//! Client side of the submission flow.
//!
//! ```text
//! SelectedFile ──► SubmissionBuilder ──► Submission ──► ApiClient ──► /api/images/process
//!   (bytes,          (overlay, blur,      (data URI         (reqwest,
//!    type)            checks)              request)           bearer token)
//! ```
//!
//! The builder validates the file locally (size and type) and never makes a
//! network call; [`ApiClient`] is the only component that talks to the server.

mod api;
mod builder;

pub use api::{
    AccountUser, ApiClient, LikeResponse, ProcessResponse, SignInResponse, UploadResponse,
    DEFAULT_CLIENT_TIMEOUT,
};
pub use builder::{
    SelectedFile, Submission, SubmissionBuilder, DEFAULT_BLUR_INTENSITY, MAX_FILE_BYTES,
};
