//! Model-assisted analyses that sit beside the question router.

pub mod sentiment;

pub use sentiment::{classify_sentiment, sample_profiles, Sentiment, SentimentLabel};
