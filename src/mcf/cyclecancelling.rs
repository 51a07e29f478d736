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

//! The cycle cancelling min cost flow algorithm.
//!
//! A feasible flow is established by a max flow computation over a super
//! source and sink; afterwards negative cost cycles in the residual
//! network are cancelled until none remains. A feasible flow is optimal
//! iff its residual network contains no negative cost cycle.

use super::SolutionState;
use crate::graph::{ArcId, Flow, NodeId, ResidualGraph};
use crate::maxflow::max_flow;
use crate::shortestpath::bellman_ford;
use log::{debug, info};

/// The cycle cancelling algorithm.
pub struct CycleCancelling<'a> {
    graph: &'a mut ResidualGraph,
    state: SolutionState,
    /// The number of cancelled cycles.
    pub cnt_cycles: usize,
}

impl<'a> CycleCancelling<'a> {
    pub fn new(graph: &'a mut ResidualGraph) -> Self {
        CycleCancelling {
            graph,
            state: SolutionState::Unknown,
            cnt_cycles: 0,
        }
    }

    /// Return the solution state of the latest computation.
    pub fn solution_state(&self) -> SolutionState {
        self.state
    }

    /// Solve the min cost flow problem.
    pub fn solve(&mut self) -> SolutionState {
        self.cnt_cycles = 0;
        self.state = if !self.establish_feasible_flow() {
            SolutionState::Infeasible
        } else {
            self.cancel_negative_cycles();
            info!("cycle cancelling: {} cycles cancelled", self.cnt_cycles);
            SolutionState::Optimal
        };
        self.state
    }

    /// Route all supply to the demand nodes, ignoring costs.
    ///
    /// Returns `false` if no feasible flow exists.
    fn establish_feasible_flow(&mut self) -> bool {
        if self.graph.demand_balance() != 0 {
            return false;
        }
        let supply = self.graph.total_supply();
        if supply == 0 {
            return true;
        }
        let (src, snk) = self.graph.add_super_nodes();
        let value = max_flow(self.graph, src, snk);
        self.graph.remove_super_nodes();
        debug_assert!(value <= supply);
        value == supply
    }

    /// Cancel negative cost cycles until the flow is optimal.
    ///
    /// The flow on the graph must be feasible. This is public so that a
    /// flow established by other means can be re-optimized; `solve` calls
    /// it after the max flow phase. Returns the number of cycles.
    pub fn cancel_negative_cycles(&mut self) -> usize {
        let all_nodes: Vec<NodeId> = (0..self.graph.num_nodes()).collect();
        let mut ncycles = 0;
        loop {
            // distance 0 at every node finds a negative cycle anywhere
            let (_, pred, witness) = bellman_ford(self.graph, &all_nodes, |a| a.cost);
            match witness {
                Some(v) => {
                    self.augment_cycle(v, &pred);
                    ncycles += 1;
                }
                None => break,
            }
        }
        self.cnt_cycles += ncycles;
        ncycles
    }

    /// Augment along the negative cycle on the predecessor chain of
    /// `witness` by its bottleneck capacity.
    fn augment_cycle(&mut self, witness: NodeId, pred: &[Option<ArcId>]) {
        // the witness need not lie on the cycle itself, but walking one
        // predecessor step per node must end up on it
        let mut v = witness;
        for _ in 0..self.graph.num_nodes() {
            v = self.graph.arc(pred[v].unwrap()).src;
        }

        let mut cycle = vec![];
        let mut bottleneck = Flow::MAX;
        let mut u = v;
        loop {
            let aid = pred[u].unwrap();
            cycle.push(aid);
            bottleneck = bottleneck.min(self.graph.arc(aid).cap);
            u = self.graph.arc(aid).src;
            if u == v {
                break;
            }
        }

        debug_assert!(bottleneck > 0);
        debug!(
            "cancelling cycle of {} arcs with bottleneck {}",
            cycle.len(),
            bottleneck
        );
        for &aid in &cycle {
            self.graph.push(aid, bottleneck);
        }
    }
}

/// Solve the min cost flow problem with the cycle cancelling algorithm.
pub fn cycle_cancelling(graph: &mut ResidualGraph) -> SolutionState {
    CycleCancelling::new(graph).solve()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infeasible_unbalanced() {
        let mut g = ResidualGraph::new(2);
        g.set_demand(0, 5);
        g.set_demand(1, -10);
        g.add_arc(0, 1, 20, 1);
        assert_eq!(cycle_cancelling(&mut g), SolutionState::Infeasible);
    }

    #[test]
    fn infeasible_capacity_cut() {
        let mut g = ResidualGraph::new(2);
        g.set_demand(0, 5);
        g.set_demand(1, -5);
        g.add_arc(0, 1, 3, 1);
        assert_eq!(cycle_cancelling(&mut g), SolutionState::Infeasible);
    }

    #[test]
    fn reroutes_expensive_flow() {
        // two parallel routes; the max flow phase may pick either, the
        // cancelling phase must end up on the cheap one
        let mut g = ResidualGraph::new(4);
        g.set_demand(0, 4);
        g.set_demand(3, -4);
        g.add_arc(0, 1, 4, 10);
        g.add_arc(1, 3, 4, 10);
        g.add_arc(0, 2, 4, 1);
        g.add_arc(2, 3, 4, 1);
        assert_eq!(cycle_cancelling(&mut g), SolutionState::Optimal);
        assert_eq!(g.flow_cost(), 8);
    }

    #[test]
    fn cancels_a_hand_made_cycle() {
        // feasible but suboptimal flow around a negative cycle
        let mut g = ResidualGraph::new(3);
        g.add_arc(0, 1, 2, -2);
        g.add_arc(1, 2, 2, -2);
        g.add_arc(2, 0, 2, 1);
        let mut solver = CycleCancelling::new(&mut g);
        assert_eq!(solver.cancel_negative_cycles(), 1);
        assert_eq!(g.flow_cost(), -6);
        assert_eq!(g.flow(0), 2);
    }
}
