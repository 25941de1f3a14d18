//! Domain models for the site API.

pub mod inquiry;
pub mod session;

pub use inquiry::{Inquiry, InquiryStatus, InquiryView};
pub use session::Session;
