//! Corpus aggregation: loaded titles in, one ordered corpus out.

use tracing::info;

use ecfr_shared::{Corpus, TitleDocument};

/// Output of [`aggregate`].
#[derive(Debug, Clone)]
pub struct AggregateResult {
    /// The combined corpus, in input order.
    pub corpus: Corpus,
    /// Number of title documents combined.
    pub count: usize,
}

/// Combine title documents into a corpus without reordering or filtering.
pub fn aggregate(documents: Vec<TitleDocument>) -> AggregateResult {
    let corpus = Corpus::from(documents);
    let count = corpus.len();
    info!(count, "combined title documents into corpus");
    AggregateResult { corpus, count }
}
