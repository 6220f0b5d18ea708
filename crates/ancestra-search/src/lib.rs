//! # Ancestra Search
//!
//! The FCI/PAG orientation core: given a skeleton over measured variables
//! and a way of examining the data (a statistical independence test, a
//! permutation scorer, or exact graph-theoretic separation on a known
//! model), orient edge endpoints into a Partial Ancestral Graph by
//! Zhang's rules R0-R10.
//!
//! The engine ([`FciOrient`]) is a fixed-point loop over endpoint marks;
//! the decisions that need more than the graph itself — unshielded
//! colliders (R0) and discriminating paths (R4) — are delegated to an
//! [`R0R4Strategy`]. Sepset search is behind [`SepsetProducer`], with
//! greedy, min-p, max-p, conservative, and possible-m-sep variants.
//!
//! Converters ([`DagToPag`], [`MagToPag`]) run the engine against exact
//! oracles, and [`legal::is_legal_pag`] validates candidate PAGs by MAG
//! round-trip.

pub mod discriminating;
pub mod errors;
pub mod independence;
pub mod knowledge;
pub mod legal;
pub mod meek;
pub mod orient;
pub mod possible_dsep;
pub mod score;
pub mod scorer;
pub mod sepset_map;
pub mod sepsets;
pub mod strategy;
pub mod transform;
pub mod triple;

pub use discriminating::{list_discriminating_paths, DiscriminatingPath};
pub use errors::SearchError;
pub use independence::{IndependenceResult, IndependenceTest, MsepTest};
pub use knowledge::Knowledge;
pub use legal::{is_legal_mag, is_legal_pag, LegalMagResult, LegalPagResult};
pub use meek::MeekRules;
pub use orient::{is_arrowhead_allowed, FciOrient};
pub use possible_dsep::remove_by_possible_dsep;
pub use score::{GraphScore, Score};
pub use scorer::PermutationScorer;
pub use sepset_map::SepsetMap;
pub use sepsets::{
    SepsetProducer, SepsetsConservative, SepsetsGreedy, SepsetsMaxP, SepsetsMinP,
    SepsetsPossibleMsep,
};
pub use strategy::{
    OracleMode, OracleStrategy, R0R4Strategy, ScoreBasedStrategy, TestBasedStrategy,
};
pub use transform::{mag_from_pag, DagToPag, MagToPag, PagCache};
pub use triple::Triple;
