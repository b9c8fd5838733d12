mod filesize;
mod pdepend;

pub use filesize::FilesizeConsumer;
pub use pdepend::PDependConsumer;
