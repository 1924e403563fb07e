pub mod bookmark;

pub use bookmark::{Bookmark, OgpInfo};
