pub mod links;
pub mod session;

pub use links::{absolute_links, matching_links};
pub use session::{FetchedResponse, HttpSession, ResponseCache};
