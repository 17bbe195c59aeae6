//! The Fragility protocol: a JSON map of an agent's failure modes,
//! canonicalized, hashed, and optionally signed, plus the derived risk
//! indicators and card view external surfaces render from it.

pub mod canonical;
pub mod card;
pub mod indicators;
pub mod schema;
pub mod template;
pub mod validate;

pub use canonical::{canonical_for_hash, canonical_json};
pub use card::{Badges, Card, CardBreakpoint, CardOptions, build_card};
pub use indicators::{Indicators, compute_indicators};
pub use schema::{
    Breakpoint, Control, Dependency, Environment, FragilityDocument, Metrics,
    REQUIRED_TRIGGER_CATEGORIES,
};
pub use template::{create_template, soul_template};
pub use validate::{update_checksum, validate_fragility};
