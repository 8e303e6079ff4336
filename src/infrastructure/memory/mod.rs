pub mod in_memory_backend;

pub use in_memory_backend::InMemoryBackend;
