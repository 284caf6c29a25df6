//! Knowledge-graph extraction from free text.
//!
//! Text is cut into fixed-size character chunks, each chunk is sent to a
//! language model together with an instruction asking for
//! `('entity', 'relation', 'entity')` lines, and the lines that parse are
//! stored per document.

pub mod chunker;
pub mod extractor;
pub mod graph;
pub mod store;
pub mod triples;

pub use chunker::{Chunk, TextChunker, DEFAULT_CHUNK_SIZE};
pub use extractor::KgExtractor;
pub use graph::{cuda_available, Device, GraphData, TripleGraph};
pub use store::{DocKey, KnowledgeStore};
pub use triples::{parse_triples, parse_triples_detailed, ParsedTriples, Triple};
