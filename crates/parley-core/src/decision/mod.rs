//! Decision routing
//!
//! Picks one of four routes for every turn from the session's state and the
//! inference service's verdicts. The interrupt check fails open; intent
//! classification does not.

mod intent;
mod router;

pub use intent::{IntentCatalog, IntentDefinition, IntentKind};
pub use router::{
    DecisionKind, DecisionResult, DecisionRouter, DEFAULT_HISTORY_WINDOW, FAQ_LABEL, FLOW_LABEL,
};

#[cfg(test)]
mod tests;
