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

//! The residual network all flow algorithms operate on.
//!
//! Every input arc is represented by a *pair* of residual arcs: the forward
//! arc carries the remaining capacity, the reverse arc the amount of flow
//! that could be cancelled. All arcs live in a single arena, the pair of
//! arc `a` is `a ^ 1`. Hence for each pair
//!
//! ```text
//! cap(a) + cap(a ^ 1) == initial_cap(a)
//! ```
//!
//! holds at all times and the flow over an input arc is
//! `initial_cap - cap` of its forward half. No arc is ever created or
//! destroyed while a solver runs; the arc fixing used by cost scaling only
//! moves arcs out of the active adjacency lists and back.

use log::debug;

/// Index of a node, `0..num_nodes()`.
pub type NodeId = usize;
/// Index of a residual arc in the arena.
pub type ArcId = usize;
/// The flow (capacity, excess) value type.
pub type Flow = i64;
/// The arc cost value type.
pub type Cost = i64;

/// One half of a residual arc pair.
#[derive(Clone, Debug)]
pub struct Arc {
    /// The tail node.
    pub src: NodeId,
    /// The head node.
    pub dst: NodeId,
    /// The remaining residual capacity.
    pub cap: Flow,
    /// The residual capacity at construction time (0 on reverse halves).
    pub initial_cap: Flow,
    /// The cost per unit of flow (negated on reverse halves).
    pub cost: Cost,
}

impl Arc {
    /// The flow currently routed over this arc.
    ///
    /// Meaningful on forward halves; on a reverse half this is the
    /// negated flow of its partner.
    pub fn flow(&self) -> Flow {
        self.initial_cap - self.cap
    }
}

/// A residual network with demands, built once from the input and mutated
/// in place by the solvers.
///
/// The `demands` vector doubles as the excess vector while a solver runs:
/// a positive entry is unshipped supply, a negative entry unmet demand.
#[derive(Clone, Debug)]
pub struct ResidualGraph {
    num_nodes: usize,
    arcs: Vec<Arc>,
    /// The active outgoing residual arcs of each node (fixed arcs removed).
    outgoing: Vec<Vec<ArcId>>,
    demands: Vec<Flow>,
    /// Arcs removed from the adjacency lists by `fix_arc`, identified by
    /// the half that triggered the fixing.
    fixed_arcs: Vec<ArcId>,
    source_nodes: Vec<NodeId>,
    sink_nodes: Vec<NodeId>,
    /// Arena length before the super source/sink arcs were appended.
    super_start: usize,
    has_super: bool,
}

impl ResidualGraph {
    /// Create an empty network with `num_nodes` nodes and no arcs.
    pub fn new(num_nodes: usize) -> Self {
        ResidualGraph {
            num_nodes,
            arcs: vec![],
            outgoing: vec![vec![]; num_nodes],
            demands: vec![0; num_nodes],
            fixed_arcs: vec![],
            source_nodes: vec![],
            sink_nodes: vec![],
            super_start: 0,
            has_super: false,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// The number of input arcs (residual pairs).
    pub fn num_arcs(&self) -> usize {
        self.arcs.len() / 2
    }

    /// The ids of all residual arcs, forward and reverse halves alike.
    ///
    /// Even ids are forward halves, odd ids reverse halves.
    pub fn arc_ids(&self) -> std::ops::Range<ArcId> {
        0..self.arcs.len()
    }

    /// Add an input arc and its reverse half.
    ///
    /// Returns the id of the forward half; the reverse half is at the
    /// returned id `^ 1`. Parallel arcs are allowed, loops are not.
    pub fn add_arc(&mut self, src: NodeId, dst: NodeId, cap: Flow, cost: Cost) -> ArcId {
        debug_assert_ne!(src, dst, "loops are not representable");
        debug_assert!(cap >= 0);
        let aid = self.arcs.len();
        self.arcs.push(Arc {
            src,
            dst,
            cap,
            initial_cap: cap,
            cost,
        });
        self.arcs.push(Arc {
            src: dst,
            dst: src,
            cap: 0,
            initial_cap: 0,
            cost: -cost,
        });
        self.outgoing[src].push(aid);
        self.outgoing[dst].push(aid + 1);
        aid
    }

    /// Set the balance of a node (positive: supply, negative: demand).
    ///
    /// Nodes with nonzero balance are recorded in the source/sink lists,
    /// so the balance of each node must be set at most once.
    pub fn set_demand(&mut self, u: NodeId, demand: Flow) {
        debug_assert_eq!(self.demands[u], 0, "demand of node set twice");
        self.demands[u] = demand;
        if demand > 0 {
            self.source_nodes.push(u);
        } else if demand < 0 {
            self.sink_nodes.push(u);
        }
    }

    pub fn demand(&self, u: NodeId) -> Flow {
        self.demands[u]
    }

    pub fn demands(&self) -> &[Flow] {
        &self.demands
    }

    pub fn demands_mut(&mut self) -> &mut [Flow] {
        &mut self.demands
    }

    /// Sum of all node balances (0 on a balanced instance).
    pub fn demand_balance(&self) -> Flow {
        self.demands.iter().sum()
    }

    /// Sum of all positive balances.
    pub fn total_supply(&self) -> Flow {
        self.demands.iter().filter(|&&b| b > 0).sum()
    }

    /// The supply nodes recorded from the input.
    pub fn source_nodes(&self) -> &[NodeId] {
        &self.source_nodes
    }

    /// The demand nodes recorded from the input.
    pub fn sink_nodes(&self) -> &[NodeId] {
        &self.sink_nodes
    }

    pub fn arc(&self, a: ArcId) -> &Arc {
        &self.arcs[a]
    }

    /// The id of the paired arc in the opposite direction.
    pub fn reverse(a: ArcId) -> ArcId {
        a ^ 1
    }

    /// The active outgoing residual arcs of `u`, skipping fixed arcs.
    pub fn outgoing(&self, u: NodeId) -> impl Iterator<Item = (ArcId, &Arc)> + '_ {
        self.outgoing[u].iter().map(move |&a| (a, &self.arcs[a]))
    }

    /// The ids of the active outgoing residual arcs of `u`.
    ///
    /// Useful when the arcs must be mutated while scanning.
    pub fn outgoing_ids(&self, u: NodeId) -> &[ArcId] {
        &self.outgoing[u]
    }

    /// Find an active residual arc from `u` to `v`.
    pub fn find(&self, u: NodeId, v: NodeId) -> Option<ArcId> {
        self.outgoing[u].iter().copied().find(|&a| self.arcs[a].dst == v)
    }

    /// Push `f` units of flow over arc `a`.
    pub fn push(&mut self, a: ArcId, f: Flow) {
        debug_assert!(f >= 0 && f <= self.arcs[a].cap);
        self.arcs[a].cap -= f;
        self.arcs[a ^ 1].cap += f;
        debug_assert_eq!(
            self.arcs[a].cap + self.arcs[a ^ 1].cap,
            self.arcs[a].initial_cap + self.arcs[a ^ 1].initial_cap
        );
    }

    /// Remove arc `a` and its reverse from the active adjacency lists.
    ///
    /// The pair keeps all its state and can be restored by `unfix_arcs`.
    pub fn fix_arc(&mut self, a: ArcId) {
        self.remove_outgoing(self.arcs[a].src, a);
        self.remove_outgoing(self.arcs[a ^ 1].src, a ^ 1);
        self.fixed_arcs.push(a);
    }

    /// Restore all fixed pairs whose triggering arc satisfies `unfix`.
    pub fn unfix_arcs<F>(&mut self, unfix: F)
    where
        F: Fn(&Arc) -> bool,
    {
        let mut i = 0;
        while i < self.fixed_arcs.len() {
            let a = self.fixed_arcs[i];
            if unfix(&self.arcs[a]) {
                self.fixed_arcs.swap_remove(i);
                self.outgoing[self.arcs[a].src].push(a);
                self.outgoing[self.arcs[a ^ 1].src].push(a ^ 1);
            } else {
                i += 1;
            }
        }
    }

    /// The arcs currently removed by `fix_arc`.
    pub fn fixed_arcs(&self) -> &[ArcId] {
        &self.fixed_arcs
    }

    fn remove_outgoing(&mut self, u: NodeId, a: ArcId) {
        let pos = self.outgoing[u]
            .iter()
            .position(|&b| b == a)
            .expect("fixed arc must be active");
        self.outgoing[u].swap_remove(pos);
    }

    /// Append a super source connected to all supply nodes and a super
    /// sink reachable from all demand nodes.
    ///
    /// The connecting arcs have capacity equal to the node's supply
    /// (demand) and cost 0. Returns `(source, sink)`.
    pub fn add_super_nodes(&mut self) -> (NodeId, NodeId) {
        debug_assert!(!self.has_super);
        let s = self.num_nodes;
        let t = s + 1;
        self.num_nodes += 2;
        self.outgoing.push(vec![]);
        self.outgoing.push(vec![]);
        self.demands.push(0);
        self.demands.push(0);
        self.super_start = self.arcs.len();
        self.has_super = true;
        for i in 0..self.source_nodes.len() {
            let u = self.source_nodes[i];
            let b = self.demands[u];
            self.add_arc(s, u, b, 0);
            self.demands[s] += b;
        }
        for i in 0..self.sink_nodes.len() {
            let u = self.sink_nodes[i];
            let b = self.demands[u];
            self.add_arc(u, t, -b, 0);
            self.demands[t] += b;
        }
        (s, t)
    }

    /// Remove the super source/sink again, dropping their arcs.
    ///
    /// Flow routed over the remaining arcs is kept.
    pub fn remove_super_nodes(&mut self) {
        debug_assert!(self.has_super);
        let start = self.super_start;
        self.arcs.truncate(start);
        self.num_nodes -= 2;
        self.outgoing.pop();
        self.outgoing.pop();
        self.demands.pop();
        self.demands.pop();
        for i in 0..self.source_nodes.len() {
            let u = self.source_nodes[i];
            self.outgoing[u].retain(|&a| a < start);
        }
        for i in 0..self.sink_nodes.len() {
            let u = self.sink_nodes[i];
            self.outgoing[u].retain(|&a| a < start);
        }
        self.has_super = false;
    }

    /// Restore the zero flow, i.e. `cap = initial_cap` on every arc.
    pub fn reset_flow(&mut self) {
        for arc in &mut self.arcs {
            arc.cap = arc.initial_cap;
        }
    }

    /// Multiply every arc cost (fixed arcs included) by `factor`.
    pub fn scale_costs(&mut self, factor: Cost) {
        for arc in &mut self.arcs {
            arc.cost *= factor;
        }
    }

    /// Divide every arc cost by `factor`, undoing `scale_costs`.
    pub fn divide_costs(&mut self, factor: Cost) {
        for arc in &mut self.arcs {
            debug_assert_eq!(arc.cost % factor, 0);
            arc.cost /= factor;
        }
    }

    /// The flow over input arc pair `a` (a forward half).
    pub fn flow(&self, a: ArcId) -> Flow {
        debug_assert_eq!(a & 1, 0);
        self.arcs[a].flow()
    }

    /// The total cost of the current flow in original cost units.
    pub fn flow_cost(&self) -> Cost {
        self.arc_ids()
            .step_by(2)
            .map(|a| self.flow(a) * self.arcs[a].cost)
            .sum()
    }

    /// Order the nodes topologically with respect to the admissible arcs,
    /// i.e. the active residual arcs with negative reduced cost under
    /// `potentials`.
    ///
    /// Returns `None` if the admissible subgraph contains a cycle.
    pub fn order_topologically(&self, potentials: &[Cost]) -> Option<Vec<NodeId>> {
        let admissible = |u: NodeId, arc: &Arc| {
            arc.cap > 0 && arc.cost + potentials[u] - potentials[arc.dst] < 0
        };

        let mut indegree = vec![0usize; self.num_nodes];
        for u in 0..self.num_nodes {
            for (_, arc) in self.outgoing(u) {
                if admissible(u, arc) {
                    indegree[arc.dst] += 1;
                }
            }
        }

        let mut stack: Vec<NodeId> = (0..self.num_nodes).filter(|&u| indegree[u] == 0).collect();
        let mut ordered = Vec::with_capacity(self.num_nodes);
        while let Some(u) = stack.pop() {
            ordered.push(u);
            for (_, arc) in self.outgoing(u) {
                if admissible(u, arc) {
                    indegree[arc.dst] -= 1;
                    if indegree[arc.dst] == 0 {
                        stack.push(arc.dst);
                    }
                }
            }
        }

        if ordered.len() == self.num_nodes {
            Some(ordered)
        } else {
            debug!("admissible subgraph contains a cycle");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn push_keeps_pair_invariant() {
        let mut g = diamond();
        let a = g.find(0, 1).unwrap();
        g.push(a, 3);
        assert_eq!(g.arc(a).cap, 1);
        assert_eq!(g.arc(a ^ 1).cap, 3);
        assert_eq!(g.flow(a), 3);
        // cancel one unit over the reverse arc
        g.push(a ^ 1, 1);
        assert_eq!(g.flow(a), 2);
        assert_eq!(g.flow_cost(), 2);
    }

    #[test]
    fn fix_and_unfix_restore_the_pair() {
        let mut g = diamond();
        let a = g.find(0, 2).unwrap();
        g.fix_arc(a);
        assert_eq!(g.find(0, 2), None);
        assert_eq!(g.find(2, 0), None);
        assert_eq!(g.fixed_arcs(), &[a]);
        // the pair is still there, just inactive
        assert_eq!(g.arc(a).cap, 6);
        g.unfix_arcs(|_| true);
        assert!(g.fixed_arcs().is_empty());
        assert_eq!(g.find(0, 2), Some(a));
        assert_eq!(g.find(2, 0), Some(a ^ 1));
    }

    #[test]
    fn super_nodes_come_and_go() {
        let mut g = diamond();
        let narcs = g.num_arcs();
        let (s, t) = g.add_super_nodes();
        assert_eq!(g.num_nodes(), 6);
        assert_eq!(g.demand(s), 10);
        assert_eq!(g.demand(t), -10);
        assert_eq!(g.arc(g.find(s, 0).unwrap()).cap, 10);
        assert_eq!(g.arc(g.find(3, t).unwrap()).cap, 10);
        g.remove_super_nodes();
        assert_eq!(g.num_nodes(), 4);
        assert_eq!(g.num_arcs(), narcs);
        assert!(g.outgoing(0).all(|(_, arc)| arc.dst < 4));
        assert!(g.outgoing(3).all(|(_, arc)| arc.dst < 4));
    }

    #[test]
    fn topological_order_respects_admissible_arcs() {
        let g = diamond();
        // all reduced costs nonnegative => no admissible arcs => any order
        let order = g.order_topologically(&[0; 4]).unwrap();
        assert_eq!(order.len(), 4);

        // make 0->1->3 admissible
        let pot = vec![0, 2, 0, 4];
        let order = g.order_topologically(&pot).unwrap();
        let pos: Vec<_> = (0..4).map(|u| order.iter().position(|&v| v == u).unwrap()).collect();
        assert!(pos[0] < pos[1]);
        assert!(pos[1] < pos[3]);
    }

    #[test]
    fn admissible_cycle_is_detected() {
        let mut g = ResidualGraph::new(2);
        g.add_arc(0, 1, 1, -1);
        g.add_arc(1, 0, 1, -1);
        // both forward arcs have reduced cost -1 under the zero potential
        assert_eq!(g.order_topologically(&[0, 0]), None);
    }
}
