//! Hosted backend adapters (Supabase). Implements AuthPort, RecordStore and ObjectStore.

pub mod auth;
pub mod client;
pub mod records;
pub mod storage;

pub use auth::SupabaseAuth;
pub use client::SupabaseClient;
pub use records::SupabaseRecords;
pub use storage::SupabaseStorage;
