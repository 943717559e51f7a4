// Adapters layer: concrete implementations of the domain ports.

pub mod github;
pub mod memory;
#[cfg(feature = "lambda")]
pub mod s3;
pub mod static_dir;
pub mod supabase;

pub use github::GitHubHosting;
pub use memory::MemoryStore;
#[cfg(feature = "lambda")]
pub use s3::S3Hosting;
pub use static_dir::StaticDirHosting;
pub use supabase::SupabaseStore;
