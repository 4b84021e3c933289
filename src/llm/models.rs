//! Model tiers for the pipeline's two workloads

/// Models available to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    /// Fast tier - cheap model for scanning file listings (map/reduce selection)
    Fast,
    /// Smart tier - best reasoning for code edits and error fixes
    Smart,
}

/// Maximum completion tokens for all tiers
const MODEL_MAX_TOKENS: u32 = 16384;

impl Model {
    pub fn id(&self) -> &'static str {
        match self {
            Model::Fast => "openai/gpt-oss-120b",
            Model::Smart => "anthropic/claude-sonnet-4.5",
        }
    }

    pub fn max_tokens(&self) -> u32 {
        MODEL_MAX_TOKENS
    }
}
