// Story classification: prompt contract, model call + taxonomy gate, batch driver.
// All model calls go through llm_client; nothing here talks HTTP directly.

pub mod batch;
pub mod classifier;
pub mod prompts;
