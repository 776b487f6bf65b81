/// Default directory to ingest
pub const DEFAULT_ROOT_DIR: &str = "knowledgebase";

/// Default chunk size in lines
pub const DEFAULT_CHUNK_SIZE: usize = 200;

/// Default embedding model
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

/// Embedding dimension of all-MiniLM-L6-v2
pub const DEFAULT_DIM: usize = 384;

/// Pinecone control plane, used to look up an index host
pub const PINECONE_CONTROL_PLANE: &str = "https://api.pinecone.io";

/// Pinecone REST API version sent with every request
pub const PINECONE_API_VERSION: &str = "2024-07";
