//! Mapping index hits back onto documents.

use crate::domain::Document;
use crate::embedding::Neighbor;

/// Pairs each hit with its document, keeping rank order.
///
/// Hits pointing past the end of `documents` mean the index and the
/// document list have drifted apart; they are logged and dropped.
pub(crate) fn resolve<'d>(
    documents: &'d [Document],
    neighbors: Vec<Neighbor>,
) -> impl Iterator<Item = (&'d Document, f64)> + 'd {
    neighbors.into_iter().filter_map(move |neighbor| {
        match documents.get(neighbor.index) {
            Some(document) => Some((document, neighbor.similarity())),
            None => {
                tracing::warn!(
                    index = neighbor.index,
                    documents = documents.len(),
                    "Dropping neighbor outside document range"
                );
                None
            }
        }
    })
}
