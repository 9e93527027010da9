//! Song suggestion parsing and reconciliation against the catalog.

pub mod reconciler;
pub mod suggestions;

pub use reconciler::{
    MatchPhase, ReconcileError, ReconcileProgress, Reconciliation, ResolvedTrack, exact_query,
    free_text_query, reconcile, reconcile_with_progress,
};
pub use suggestions::{SuggestedSong, SuggestionError, parse_suggestions};
