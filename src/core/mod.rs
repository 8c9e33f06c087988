pub mod package;

pub use package::PackageId;
