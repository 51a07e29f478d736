/*
 * Copyright (c) 2021, 2022 Frank Fischer <frank-fischer@shadow-soft.de>
 *
 * This program is free software: you can redistribute it and/or
 * modify it under the terms of the GNU General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful, but
 * WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
 * General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see  <http://www.gnu.org/licenses/>
 */

//! The cost scaling push/relabel min cost flow algorithm.
//!
//! All costs are first multiplied by `alpha * N`, then a sequence of
//! refine steps maintains an `eps`-optimal pseudoflow while `eps` shrinks
//! by a factor of `alpha` per step: every residual arc keeps a reduced
//! cost of at least `-eps` under the node potentials. Once the final
//! refine at `eps = 1` is done, every residual arc has nonnegative
//! reduced cost, which for the rescaled integer costs means the flow is
//! exactly optimal.
//!
//! A refine step saturates all residual arcs with negative reduced cost
//! and then discharges active nodes (positive excess) FIFO: flow is
//! pushed over admissible arcs, and a node without admissible arcs has
//! its potential lowered by `eps` (relabel). Arcs whose reduced cost
//! grows beyond `2 * (N-1) * eps` cannot carry flow in any `eps`-optimal
//! solution anymore and are removed from the active adjacency lists until
//! the end of the run (arc fixing).
//!
//! Two optional heuristics, both disabled by default: a bucket-based
//! global potential update and a price refinement step that tries to
//! re-establish `eps`-optimality by potential changes alone, skipping the
//! refine.

use super::SolutionState;
use crate::graph::{Cost, NodeId, ResidualGraph};
use crate::maxflow::max_flow;
use log::{debug, info, trace};
use std::collections::VecDeque;

/// The cost scaling push/relabel algorithm.
///
/// This struct contains all algorithmic working data.
pub struct CostScaling<'a> {
    graph: &'a mut ResidualGraph,
    /// The node potentials, in scaled cost units while solving.
    potentials: Vec<Cost>,
    /// The factor by which `eps` shrinks per scaling step.
    alpha: Cost,
    /// The cost scale factor `alpha * N` applied on entry.
    scale: Cost,
    state: SolutionState,
    /// The number of relabel operations performed during the algorithm.
    pub cnt_relabel: usize,
    /// The number of push operations performed during the algorithm.
    pub cnt_push: usize,
    /// Whether to run the global potential update at each scale.
    pub use_global_update: bool,
    /// Whether to try price refinement before each refine.
    pub use_price_refinement: bool,
}

impl<'a> CostScaling<'a> {
    /// Return a new solver for `graph`.
    ///
    /// Panics if `alpha < 2`.
    pub fn new(graph: &'a mut ResidualGraph, alpha: Cost) -> Self {
        assert!(alpha >= 2, "the scaling factor must be at least 2");
        let n = graph.num_nodes();
        CostScaling {
            graph,
            potentials: vec![0; n],
            alpha,
            scale: 1,
            state: SolutionState::Unknown,
            cnt_relabel: 0,
            cnt_push: 0,
            use_global_update: false,
            use_price_refinement: false,
        }
    }

    /// Return the solution state of the latest computation.
    pub fn solution_state(&self) -> SolutionState {
        self.state
    }

    /// The node potentials of the latest computation (scaled cost units).
    pub fn potentials(&self) -> &[Cost] {
        &self.potentials
    }

    /// Solve the min cost flow problem.
    pub fn solve(&mut self) -> SolutionState {
        self.cnt_relabel = 0;
        self.cnt_push = 0;

        if self.graph.demand_balance() != 0 || !self.check_feasibility() {
            self.state = SolutionState::Infeasible;
            return self.state;
        }

        let n = self.graph.num_nodes() as Cost;
        self.scale = self.alpha * n;
        self.potentials = vec![0; self.graph.num_nodes()];

        let mut eps = self.scale_up_costs() / self.alpha;
        while eps >= 1 {
            debug!("cost scaling step at eps {}", eps);
            if self.use_global_update {
                self.global_potentials_update(eps);
            }
            if !(self.use_price_refinement && self.price_refinement(eps)) {
                self.refine(eps);
            }
            self.arcs_fixing(2 * (n - 1) * eps);
            eps = if eps > 1 && eps < self.alpha {
                1
            } else {
                eps / self.alpha
            };
        }

        // restore the fixed arcs and the original cost units for output
        self.arcs_unfixing(Cost::MAX);
        self.graph.divide_costs(self.scale);

        info!(
            "cost scaling: {} relabels, {} pushes",
            self.cnt_relabel, self.cnt_push
        );
        self.state = SolutionState::Optimal;
        self.state
    }

    /// Probe feasibility with a max flow over a super source and sink.
    ///
    /// The probe flow is discarded again; the scaling loop starts from
    /// the zero flow.
    fn check_feasibility(&mut self) -> bool {
        let supply = self.graph.total_supply();
        if supply == 0 {
            return true;
        }
        let (src, snk) = self.graph.add_super_nodes();
        let value = max_flow(self.graph, src, snk);
        self.graph.remove_super_nodes();
        self.graph.reset_flow();
        value == supply
    }

    /// Multiply all arc costs by `alpha * N`.
    ///
    /// Returns the smallest power of `alpha` that is >= the largest
    /// scaled arc cost, clipped to at least `alpha` so that the final
    /// refine at `eps = 1` always runs.
    fn scale_up_costs(&mut self) -> Cost {
        self.graph.scale_costs(self.scale);
        let mut max_cost = 0;
        for a in self.graph.arc_ids() {
            max_cost = max_cost.max(self.graph.arc(a).cost);
        }
        let mut eps = self.alpha;
        while eps < max_cost {
            eps *= self.alpha;
        }
        eps
    }

    /// Re-establish `eps`-optimality and a flow without excesses.
    fn refine(&mut self, eps: Cost) {
        // saturate all residual arcs with negative reduced cost
        for u in 0..self.graph.num_nodes() {
            let mut i = 0;
            while i < self.graph.outgoing_ids(u).len() {
                let a = self.graph.outgoing_ids(u)[i];
                let arc = self.graph.arc(a);
                let (cap, v) = (arc.cap, arc.dst);
                if cap > 0 && arc.cost + self.potentials[u] - self.potentials[v] < 0 {
                    self.graph.push(a, cap);
                    self.graph.demands_mut()[u] -= cap;
                    self.graph.demands_mut()[v] += cap;
                }
                i += 1;
            }
        }

        let mut active: VecDeque<NodeId> = (0..self.graph.num_nodes())
            .filter(|&u| self.graph.demand(u) > 0)
            .collect();
        while let Some(u) = active.pop_front() {
            self.discharge(u, &mut active, eps);
        }

        debug_assert!(self.is_eps_optimal(eps));
    }

    /// Push flow out of `u` until its excess is gone.
    ///
    /// A full scan of the outgoing arcs without an admissible arc lowers
    /// the potential of `u` by `eps`, making at least one arc admissible.
    fn discharge(&mut self, u: NodeId, active: &mut VecDeque<NodeId>, eps: Cost) {
        while self.graph.demand(u) > 0 {
            let mut has_admissible = false;
            let mut i = 0;
            while i < self.graph.outgoing_ids(u).len() {
                let a = self.graph.outgoing_ids(u)[i];
                let arc = self.graph.arc(a);
                let (cap, v) = (arc.cap, arc.dst);
                let rcost = arc.cost + self.potentials[u] - self.potentials[v];
                if cap > 0 && rcost < 0 {
                    has_admissible = true;
                    let f = self.graph.demand(u).min(cap);
                    self.cnt_push += 1;
                    trace!("push {} over ({}, {}), reduced cost {}", f, u, v, rcost);
                    self.graph.push(a, f);
                    // a receiver without excess becomes active now
                    if self.graph.demand(v) <= 0 {
                        active.push_back(v);
                    }
                    self.graph.demands_mut()[u] -= f;
                    self.graph.demands_mut()[v] += f;
                    if self.graph.demand(u) == 0 {
                        return;
                    }
                }
                i += 1;
            }
            if !has_admissible {
                self.cnt_relabel += 1;
                self.potentials[u] -= eps;
                trace!("relabel {} to potential {}", u, self.potentials[u]);
            }
        }
    }

    /// Remove all residual arcs whose reduced cost exceeds `threshold`
    /// from the active adjacency lists.
    ///
    /// With `threshold = 2 * (N-1) * eps` such an arc cannot carry flow
    /// in any `eps`-optimal solution; a smaller threshold risks losing
    /// feasibility.
    fn arcs_fixing(&mut self, threshold: Cost) {
        let mut to_fix = vec![];
        for u in 0..self.graph.num_nodes() {
            for (a, arc) in self.graph.outgoing(u) {
                if arc.cost + self.potentials[u] - self.potentials[arc.dst] > threshold {
                    to_fix.push(a);
                }
            }
        }
        if !to_fix.is_empty() {
            debug!("fixing {} arcs above reduced cost {}", to_fix.len(), threshold);
        }
        for a in to_fix {
            self.graph.fix_arc(a);
        }
    }

    /// Restore all fixed arcs whose reduced cost dropped below `threshold`.
    fn arcs_unfixing(&mut self, threshold: Cost) {
        let pot = &self.potentials;
        self.graph
            .unfix_arcs(|arc| arc.cost + pot[arc.src] - pot[arc.dst] < threshold);
    }

    /// Bucket-based variant of the global potential update heuristic.
    ///
    /// Computes for every node a rank approximating its distance (in
    /// units of `eps`) to the nodes with deficit, over the reverse
    /// residual arcs, and lowers the potentials accordingly. Preserves
    /// `eps`-optimality; purely a performance device.
    fn global_potentials_update(&mut self, eps: Cost) {
        let n = self.graph.num_nodes();
        let max_rank = self.alpha as usize * n;
        let infinite_rank = (max_rank + 1) as Cost;
        let mut rank: Vec<Cost> = vec![infinite_rank; n];
        let mut buckets: Vec<Vec<NodeId>> = vec![vec![]; max_rank + 1];

        let mut num_active = 0;
        for u in 0..n {
            if self.graph.demand(u) < 0 {
                rank[u] = 0;
                buckets[0].push(u);
            } else if self.graph.demand(u) > 0 {
                num_active += 1;
            }
        }
        if num_active == 0 {
            return;
        }

        let mut termination_rank = infinite_rank;
        'scan: for b in 0..=max_rank {
            while let Some(u) = buckets[b].pop() {
                if rank[u] != b as Cost {
                    // superseded by a smaller rank, ignore
                    continue;
                }
                // relax the neighbors that can reach u over a residual arc
                let mut i = 0;
                while i < self.graph.outgoing_ids(u).len() {
                    let a = self.graph.outgoing_ids(u)[i];
                    i += 1;
                    let v = self.graph.arc(a).dst;
                    let rarc = self.graph.arc(a ^ 1);
                    if rarc.cap == 0 || (b as Cost) >= rank[v] {
                        continue;
                    }
                    let rcost = rarc.cost + self.potentials[v] - self.potentials[u];
                    let k = (div_floor(rcost, eps) + 1).max(0) + b as Cost;
                    if k < rank[v] {
                        rank[v] = k;
                        if k <= max_rank as Cost {
                            buckets[k as usize].push(v);
                        }
                    }
                }
                if self.graph.demand(u) > 0 {
                    num_active -= 1;
                    if num_active == 0 {
                        termination_rank = b as Cost;
                        break 'scan;
                    }
                }
            }
        }

        for u in 0..n {
            let r = rank[u].min(termination_rank);
            if r > 0 {
                self.potentials[u] -= eps * r;
            }
        }
        debug!("global potential update at eps {} done", eps);
    }

    /// Try to re-establish `eps`-optimality by potential changes alone.
    ///
    /// Orders the nodes topologically over the admissible arcs (failure
    /// means an admissible cycle exists and a real refine is needed),
    /// relaxes distances along the order and tightens the potentials by
    /// them. Returns `true` iff the result verifies as `eps`-optimal, in
    /// which case the refine for this scale can be skipped.
    fn price_refinement(&mut self, eps: Cost) -> bool {
        // outstanding excesses can only be routed by a real refine
        if (0..self.graph.num_nodes()).any(|u| self.graph.demand(u) != 0) {
            return false;
        }

        let ordered = match self.graph.order_topologically(&self.potentials) {
            Some(ordered) => ordered,
            None => return false,
        };

        let mut distance: Vec<Cost> = vec![0; self.graph.num_nodes()];
        for &u in &ordered {
            for (_, arc) in self.graph.outgoing(u) {
                if arc.cap == 0 {
                    continue;
                }
                let rcost = arc.cost + self.potentials[u] - self.potentials[arc.dst];
                let d = distance[u] + div_ceil(rcost, eps);
                if d < distance[arc.dst] {
                    distance[arc.dst] = d;
                }
            }
        }
        for u in 0..self.graph.num_nodes() {
            self.potentials[u] += eps * distance[u];
        }

        let ok = self.is_eps_optimal(eps);
        debug!(
            "price refinement at eps {} {}",
            eps,
            if ok { "succeeded" } else { "failed" }
        );
        ok
    }

    /// Check that every active residual arc has reduced cost >= `-eps`.
    fn is_eps_optimal(&self, eps: Cost) -> bool {
        (0..self.graph.num_nodes()).all(|u| {
            self.graph.outgoing(u).all(|(_, arc)| {
                arc.cap == 0 || arc.cost + self.potentials[u] - self.potentials[arc.dst] >= -eps
            })
        })
    }
}

/// Solve the min cost flow problem with the cost scaling algorithm.
pub fn cost_scaling(graph: &mut ResidualGraph, alpha: Cost) -> SolutionState {
    CostScaling::new(graph, alpha).solve()
}

fn div_floor(a: Cost, b: Cost) -> Cost {
    a.div_euclid(b)
}

fn div_ceil(a: Cost, b: Cost) -> Cost {
    -(-a).div_euclid(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shortestpath::bellman_ford;

    fn diamond() -> ResidualGraph {
        let mut g = ResidualGraph::new(4);
        g.set_demand(0, 10);
        g.set_demand(3, -10);
        g.add_arc(0, 1, 4, 1);
        g.add_arc(1, 3, 10, 1);
        g.add_arc(0, 2, 6, 3);
        g.add_arc(2, 3, 10, 1);
        g
    }

    /// The flow is optimal iff the residual network has no negative
    /// cost cycle.
    fn assert_no_negative_cycle(g: &ResidualGraph) {
        let all: Vec<_> = (0..g.num_nodes()).collect();
        let (_, _, witness) = bellman_ford(g, &all, |a| a.cost);
        assert_eq!(witness, None);
    }

    #[test]
    fn bottleneck_diamond() {
        let mut g = diamond();
        assert_eq!(cost_scaling(&mut g, 2), SolutionState::Optimal);
        assert_eq!(g.flow_cost(), 32);
        assert!(g.demands().iter().all(|&b| b == 0));
        assert!(g.fixed_arcs().is_empty());
        assert_no_negative_cycle(&g);
    }

    #[test]
    fn costs_are_unscaled_on_exit() {
        let mut g = diamond();
        cost_scaling(&mut g, 2);
        let costs: Vec<_> = g.arc_ids().step_by(2).map(|a| g.arc(a).cost).collect();
        assert_eq!(costs, vec![1, 1, 3, 1]);
    }

    #[test]
    fn larger_alpha() {
        let mut g = diamond();
        assert_eq!(cost_scaling(&mut g, 8), SolutionState::Optimal);
        assert_eq!(g.flow_cost(), 32);
    }

    #[test]
    fn negative_costs() {
        let mut g = ResidualGraph::new(3);
        g.set_demand(0, 2);
        g.set_demand(2, -2);
        g.add_arc(0, 1, 3, -5);
        g.add_arc(1, 2, 3, 1);
        g.add_arc(1, 0, 3, 1);
        assert_eq!(cost_scaling(&mut g, 2), SolutionState::Optimal);
        assert_eq!(g.flow_cost(), -12);
        assert_no_negative_cycle(&g);
    }

    #[test]
    fn heuristics_do_not_change_the_optimum() {
        let mut g = diamond();
        let mut solver = CostScaling::new(&mut g, 2);
        solver.use_global_update = true;
        solver.use_price_refinement = true;
        assert_eq!(solver.solve(), SolutionState::Optimal);
        assert_eq!(g.flow_cost(), 32);
        assert_no_negative_cycle(&g);
    }

    #[test]
    fn infeasible_instances() {
        let mut g = ResidualGraph::new(2);
        g.set_demand(0, 5);
        g.set_demand(1, -10);
        g.add_arc(0, 1, 20, 1);
        assert_eq!(cost_scaling(&mut g, 2), SolutionState::Infeasible);

        let mut g = ResidualGraph::new(2);
        g.set_demand(0, 5);
        g.set_demand(1, -5);
        g.add_arc(0, 1, 3, 1);
        assert_eq!(cost_scaling(&mut g, 2), SolutionState::Infeasible);
    }

    #[test]
    fn zero_cost_instance_still_routes_flow() {
        let mut g = ResidualGraph::new(3);
        g.set_demand(0, 4);
        g.set_demand(2, -4);
        g.add_arc(0, 1, 4, 0);
        g.add_arc(1, 2, 4, 0);
        assert_eq!(cost_scaling(&mut g, 2), SolutionState::Optimal);
        assert_eq!(g.flow(0), 4);
        assert_eq!(g.flow(2), 4);
        assert_eq!(g.flow_cost(), 0);
    }

    #[test]
    fn counters_stay_within_the_textbook_bound() {
        let mut g = diamond();
        let mut solver = CostScaling::new(&mut g, 2);
        solver.solve();
        let n = 4f64;
        let max_cost = 3f64;
        let bound = 2.0 * n * n * (2.0 * n * max_cost).log2().ceil();
        assert!((solver.cnt_relabel as f64) <= bound);
        assert!(solver.cnt_push > 0);
    }
}
