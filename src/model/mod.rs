mod analysis;
mod crawl;

pub use analysis::{FilesizeMessage, PDependMessage};
pub use crawl::GitwebMessage;
