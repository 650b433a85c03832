mod file_finder;
mod packages;

pub use file_finder::{FileFinder, SourceFile};
pub use packages::{library_uri, Package, PackageMap};
