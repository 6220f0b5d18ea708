//! R0/R4 strategies: deciding colliders and discriminating paths.
//!
//! R0 (unshielded colliders) and R4 (discriminating paths) are the only
//! rules that cannot be decided from the working graph alone; they need a
//! look at the data or at a known model. Each way of looking is one
//! implementation of [`R0R4Strategy`]:
//!
//! - [`TestBasedStrategy`] — consults a [`SepsetProducer`] backed by an
//!   independence test;
//! - [`ScoreBasedStrategy`] — probes a bookmarked permutation scorer with
//!   tuck operations instead of conditioning-set search;
//! - [`OracleStrategy`] — exact graph-theoretic judgments against a known
//!   DAG (inducing paths) or MAG (definite colliders, anteriority).
//!
//! The engine owns the epoch loop; strategies only answer judgments and
//! apply the R4 orientation when asked.

use ancestra_graph::{Endpoint, MixedGraph, NodeId};
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::discriminating::DiscriminatingPath;
use crate::errors::SearchError;
use crate::knowledge::Knowledge;
use crate::orient::is_arrowhead_allowed;
use crate::score::Score;
use crate::scorer::PermutationScorer;
use crate::sepsets::SepsetProducer;

/// Decides unshielded colliders (R0) and resolves discriminating paths
/// (R4) for the orientation engine.
pub trait R0R4Strategy {
    /// Whether the unshielded triple (a, b, c) is a collider at b.
    fn is_unshielded_collider(
        &mut self,
        graph: &MixedGraph,
        a: NodeId,
        b: NodeId,
        c: NodeId,
    ) -> Result<bool, SearchError>;

    /// Resolves one discriminating path: orients v as a collider or a
    /// noncollider and returns whether anything was oriented.
    ///
    /// Callers must have re-verified the path against the current graph;
    /// passing a path whose endpoints are adjacent is an invalid-argument
    /// error.
    fn resolve_discriminating_path(
        &mut self,
        path: &DiscriminatingPath,
        graph: &mut MixedGraph,
    ) -> Result<bool, SearchError>;

    /// The background knowledge gating this strategy's orientations.
    fn knowledge(&self) -> &Knowledge;
}

fn check_resolution_preconditions(
    path: &DiscriminatingPath,
    graph: &MixedGraph,
) -> Result<(), SearchError> {
    if graph.is_adjacent_to(path.x(), path.y()) {
        return Err(SearchError::InvalidArgument(format!(
            "discriminating path endpoints {} and {} are adjacent",
            graph.name_of(path.x()),
            graph.name_of(path.y())
        )));
    }
    Ok(())
}

/// Applies the R4 orientation once the collider question at v is decided.
///
/// Noncollider: v -> y. Collider: w <-> v <-> y. Every arrowhead
/// placement is gated by knowledge; a forbidden placement skips the
/// orientation without error.
fn apply_discriminating_orientation(
    path: &DiscriminatingPath,
    noncollider: bool,
    graph: &mut MixedGraph,
    knowledge: &Knowledge,
) -> Result<bool, SearchError> {
    let (w, v, y) = (path.w(), path.v(), path.y());
    if noncollider {
        if !is_arrowhead_allowed(graph, v, y, knowledge) {
            return Ok(false);
        }
        graph.set_endpoint(y, v, Endpoint::Tail)?;
        graph.set_endpoint(v, y, Endpoint::Arrow)?;
        debug!(
            v = graph.name_of(v),
            y = graph.name_of(y),
            "R4: discriminating path -> tail"
        );
    } else {
        if !is_arrowhead_allowed(graph, w, v, knowledge)
            || !is_arrowhead_allowed(graph, v, w, knowledge)
            || !is_arrowhead_allowed(graph, y, v, knowledge)
        {
            return Ok(false);
        }
        graph.set_endpoint(w, v, Endpoint::Arrow)?;
        graph.set_endpoint(v, w, Endpoint::Arrow)?;
        graph.set_endpoint(y, v, Endpoint::Arrow)?;
        graph.set_endpoint(v, y, Endpoint::Arrow)?;
        debug!(
            w = graph.name_of(w),
            v = graph.name_of(v),
            y = graph.name_of(y),
            "R4: discriminating path -> collider"
        );
    }
    Ok(true)
}

/// Collider and discriminating-path judgments via sepset lookup against
/// an independence test.
pub struct TestBasedStrategy<P> {
    producer: P,
    knowledge: Knowledge,
}

impl<P: SepsetProducer> TestBasedStrategy<P> {
    /// Wraps a sepset producer with empty knowledge.
    pub fn new(producer: P) -> Self {
        Self::with_knowledge(producer, Knowledge::new())
    }

    /// Wraps a sepset producer with background knowledge.
    pub fn with_knowledge(producer: P, knowledge: Knowledge) -> Self {
        Self {
            producer,
            knowledge,
        }
    }
}

impl<P: SepsetProducer> R0R4Strategy for TestBasedStrategy<P> {
    fn is_unshielded_collider(
        &mut self,
        _graph: &MixedGraph,
        a: NodeId,
        b: NodeId,
        c: NodeId,
    ) -> Result<bool, SearchError> {
        self.producer.is_unshielded_collider(a, b, c)
    }

    fn resolve_discriminating_path(
        &mut self,
        path: &DiscriminatingPath,
        graph: &mut MixedGraph,
    ) -> Result<bool, SearchError> {
        check_resolution_preconditions(path, graph)?;
        let Some(sepset) = self.producer.sepset(path.x(), path.y())? else {
            // No sepset found within depth: not "dependent", just
            // undecidable here.
            return Ok(false);
        };
        let noncollider = sepset.contains(&path.v());
        apply_discriminating_orientation(path, noncollider, graph, &self.knowledge)
    }

    fn knowledge(&self) -> &Knowledge {
        &self.knowledge
    }
}

/// Collider and discriminating-path judgments by probing a bookmarked
/// permutation scorer with tucks.
///
/// Every probe runs inside the scorer's restore-guaranteed scope, so no
/// tuck sequence can leak into the next judgment.
pub struct ScoreBasedStrategy<S> {
    scorer: PermutationScorer<S>,
    knowledge: Knowledge,
}

impl<S: Score> ScoreBasedStrategy<S> {
    /// Takes a scorer whose permutation is already set; bookmarks it as
    /// the restore point for all probes.
    pub fn new(mut scorer: PermutationScorer<S>) -> Self {
        scorer.bookmark();
        Self {
            scorer,
            knowledge: Knowledge::new(),
        }
    }

    /// Sets background knowledge.
    pub fn set_knowledge(&mut self, knowledge: Knowledge) {
        self.knowledge = knowledge;
    }
}

impl<S: Score> R0R4Strategy for ScoreBasedStrategy<S> {
    fn is_unshielded_collider(
        &mut self,
        _graph: &MixedGraph,
        a: NodeId,
        b: NodeId,
        c: NodeId,
    ) -> Result<bool, SearchError> {
        // Tuck both outer nodes before b; a collider at b is one whose
        // parents survive that reordering while a and c stay nonadjacent.
        self.scorer.with_bookmark(|sc| {
            sc.tuck(b, a);
            sc.tuck(b, c);
            Ok(sc.parent_of(a, b) && sc.parent_of(c, b) && !sc.adjacent(a, c))
        })
    }

    fn resolve_discriminating_path(
        &mut self,
        path: &DiscriminatingPath,
        graph: &mut MixedGraph,
    ) -> Result<bool, SearchError> {
        check_resolution_preconditions(path, graph)?;
        let (v, y) = (path.v(), path.y());
        // v is a noncollider exactly when v -> y survives tucking v
        // before y from the bookmarked order.
        let noncollider = self.scorer.with_bookmark(|sc| {
            sc.tuck(y, v);
            Ok(sc.parent_of(v, y))
        })?;
        apply_discriminating_orientation(path, noncollider, graph, &self.knowledge)
    }

    fn knowledge(&self) -> &Knowledge {
        &self.knowledge
    }
}

/// Which kind of ground-truth model backs an [`OracleStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleMode {
    /// A DAG over measured and latent nodes; colliders judged by
    /// inducing paths into the middle node.
    Dag,
    /// A MAG over measured nodes; colliders read off directly,
    /// discriminating paths resolved by anteriority.
    Mag,
}

/// Exact graph-theoretic judgments against a known model. Used by the
/// DAG->PAG and MAG->PAG converters and as ground truth in tests.
pub struct OracleStrategy {
    truth: MixedGraph,
    mode: OracleMode,
    knowledge: Knowledge,
    selection: FxHashSet<NodeId>,
}

impl OracleStrategy {
    /// Oracle over a DAG that may contain latent nodes.
    pub fn dag_oracle(truth: MixedGraph) -> Self {
        Self {
            truth,
            mode: OracleMode::Dag,
            knowledge: Knowledge::new(),
            selection: FxHashSet::default(),
        }
    }

    /// Oracle over a MAG.
    pub fn mag_oracle(truth: MixedGraph) -> Self {
        Self {
            truth,
            mode: OracleMode::Mag,
            knowledge: Knowledge::new(),
            selection: FxHashSet::default(),
        }
    }

    /// Sets the selection variables consulted by the inducing-path tests.
    pub fn set_selection(&mut self, selection: FxHashSet<NodeId>) {
        self.selection = selection;
    }

    /// Sets background knowledge.
    pub fn set_knowledge(&mut self, knowledge: Knowledge) {
        self.knowledge = knowledge;
    }

    fn ancestor_of_endpoint_or_selection(&self, v: NodeId, x: NodeId, y: NodeId) -> bool {
        self.truth.is_ancestor_of(v, x)
            || self.truth.is_ancestor_of(v, y)
            || self
                .selection
                .iter()
                .any(|&s| self.truth.is_ancestor_of(v, s))
    }
}

impl R0R4Strategy for OracleStrategy {
    fn is_unshielded_collider(
        &mut self,
        _graph: &MixedGraph,
        a: NodeId,
        b: NodeId,
        c: NodeId,
    ) -> Result<bool, SearchError> {
        match self.mode {
            OracleMode::Dag => Ok(self
                .truth
                .exists_inducing_path_into(a, b, &self.selection)?
                && self.truth.exists_inducing_path_into(c, b, &self.selection)?),
            OracleMode::Mag => Ok(self.truth.is_def_collider(a, b, c)),
        }
    }

    fn resolve_discriminating_path(
        &mut self,
        path: &DiscriminatingPath,
        graph: &mut MixedGraph,
    ) -> Result<bool, SearchError> {
        check_resolution_preconditions(path, graph)?;
        let (x, v, y) = (path.x(), path.v(), path.y());
        let noncollider = match self.mode {
            OracleMode::Dag => self.ancestor_of_endpoint_or_selection(v, x, y),
            OracleMode::Mag => {
                self.truth.anteriority(&[x, y]).contains(&v)
                    || self.ancestor_of_endpoint_or_selection(v, x, y)
            }
        };
        apply_discriminating_orientation(path, noncollider, graph, &self.knowledge)
    }

    fn knowledge(&self) -> &Knowledge {
        &self.knowledge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::independence::MsepTest;
    use crate::score::GraphScore;
    use crate::sepsets::SepsetsGreedy;

    fn collider_truth() -> (MixedGraph, NodeId, NodeId, NodeId) {
        let mut g = MixedGraph::new();
        let a = g.add_measured_node("A").unwrap();
        let b = g.add_measured_node("B").unwrap();
        let c = g.add_measured_node("C").unwrap();
        g.add_directed_edge(a, b).unwrap();
        g.add_directed_edge(c, b).unwrap();
        (g, a, b, c)
    }

    #[test]
    fn all_three_strategies_agree_on_a_collider() {
        let (truth, a, b, c) = collider_truth();
        let mut skeleton = truth.clone();
        skeleton.reorient_all_with(Endpoint::Circle);

        let mut test_based = TestBasedStrategy::new(SepsetsGreedy::new(
            skeleton.clone(),
            MsepTest::new(truth.clone()),
            None,
        ));
        assert!(test_based
            .is_unshielded_collider(&skeleton, a, b, c)
            .unwrap());

        let mut scorer = PermutationScorer::new(GraphScore::new(truth.clone()));
        scorer.score_order(&[a, c, b]);
        let mut score_based = ScoreBasedStrategy::new(scorer);
        assert!(score_based
            .is_unshielded_collider(&skeleton, a, b, c)
            .unwrap());

        let mut oracle = OracleStrategy::dag_oracle(truth);
        assert!(oracle.is_unshielded_collider(&skeleton, a, b, c).unwrap());
    }

    #[test]
    fn strategies_agree_on_a_noncollider() {
        let mut truth = MixedGraph::new();
        let a = truth.add_measured_node("A").unwrap();
        let b = truth.add_measured_node("B").unwrap();
        let c = truth.add_measured_node("C").unwrap();
        truth.add_directed_edge(a, b).unwrap();
        truth.add_directed_edge(b, c).unwrap();
        let mut skeleton = truth.clone();
        skeleton.reorient_all_with(Endpoint::Circle);

        let mut test_based = TestBasedStrategy::new(SepsetsGreedy::new(
            skeleton.clone(),
            MsepTest::new(truth.clone()),
            None,
        ));
        assert!(!test_based
            .is_unshielded_collider(&skeleton, a, b, c)
            .unwrap());

        let mut scorer = PermutationScorer::new(GraphScore::new(truth.clone()));
        scorer.score_order(&[a, b, c]);
        let mut score_based = ScoreBasedStrategy::new(scorer);
        assert!(!score_based
            .is_unshielded_collider(&skeleton, a, b, c)
            .unwrap());

        let mut oracle = OracleStrategy::dag_oracle(truth);
        assert!(!oracle.is_unshielded_collider(&skeleton, a, b, c).unwrap());
    }
}
