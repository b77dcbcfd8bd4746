//! Work item span helpers.

use tracing::Span;

use crate::model::work::WorkId;

/// Start a span covering one item's search.
///
/// The `item.state` field is declared empty and updated via
/// [`record_state_transition`].
pub fn start_item_span(bot: &str, id: WorkId, sequence: &str) -> Span {
    tracing::info_span!(
        "item.search",
        "item.bot" = bot,
        "item.id" = %id,
        "item.sequence" = sequence,
        "item.state" = tracing::field::Empty,
    )
}

/// Record a state transition on the span, as a field and as an event.
pub fn record_state_transition(span: &Span, from: &str, to: &str) {
    span.record("item.state", to);
    span.in_scope(|| {
        tracing::info!(from = from, to = to, "state_transition");
    });
}
