//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that take
//! a Postgres executor (the pool, or a connection inside a transaction) as
//! the first argument.

pub mod cms_page_repo;
pub mod cms_page_version_repo;

pub use cms_page_repo::CmsPageRepo;
pub use cms_page_version_repo::CmsPageVersionRepo;
