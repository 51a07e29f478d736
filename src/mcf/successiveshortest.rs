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

//! The successive shortest path min cost flow algorithm.
//!
//! Supply is shipped one shortest path at a time until every excess is
//! zero. Both variants first saturate all negative cost arcs, which rules
//! out negative cycles in the residual network; from then on augmenting
//! along shortest paths keeps it that way, so the final flow is optimal.
//!
//! The plain variant searches with Bellman-Ford (negative arc costs occur
//! on reverse arcs). The potentials variant keeps a node potential under
//! which all reduced costs are nonnegative and searches with Dijkstra.

use super::SolutionState;
use crate::graph::{ArcId, Cost, NodeId, ResidualGraph};
use crate::shortestpath::{bellman_ford, dijkstra_heap};
use log::{debug, info};

/// The successive shortest path algorithm.
pub struct SuccessiveShortest<'a> {
    graph: &'a mut ResidualGraph,
    potentials: Vec<Cost>,
    state: SolutionState,
    /// The number of augmenting paths used.
    pub cnt_paths: usize,
}

impl<'a> SuccessiveShortest<'a> {
    pub fn new(graph: &'a mut ResidualGraph) -> Self {
        let n = graph.num_nodes();
        SuccessiveShortest {
            graph,
            potentials: vec![0; n],
            state: SolutionState::Unknown,
            cnt_paths: 0,
        }
    }

    /// Return the solution state of the latest computation.
    pub fn solution_state(&self) -> SolutionState {
        self.state
    }

    /// Solve the min cost flow problem, searching with Bellman-Ford.
    pub fn solve(&mut self) -> SolutionState {
        self.cnt_paths = 0;
        if self.graph.demand_balance() != 0 {
            self.state = SolutionState::Infeasible;
            return self.state;
        }
        self.saturate_negative_arcs();

        while let Some(src) = self.next_source() {
            let (dist, pred, _) = bellman_ford(self.graph, &[src], |a| a.cost);
            let snk = match self.nearest_deficit(&[src], &dist, &pred) {
                Some(v) => v,
                None => {
                    self.state = SolutionState::Infeasible;
                    return self.state;
                }
            };
            self.augment(src, snk, &pred);
        }

        info!("successive shortest path: {} augmentations", self.cnt_paths);
        self.state = SolutionState::Optimal;
        self.state
    }

    /// Solve the min cost flow problem, searching with Dijkstra on
    /// reduced costs.
    pub fn solve_with_potentials(&mut self) -> SolutionState {
        self.cnt_paths = 0;
        if self.graph.demand_balance() != 0 {
            self.state = SolutionState::Infeasible;
            return self.state;
        }
        self.saturate_negative_arcs();

        // initial potentials by one Bellman-Ford pass from all sources
        let sources = self.current_sources();
        if sources.is_empty() {
            self.state = SolutionState::Optimal;
            return self.state;
        }
        {
            let (dist, pred, _) = bellman_ford(self.graph, &sources, |a| a.cost);
            let mut is_source = vec![false; self.graph.num_nodes()];
            for &s in &sources {
                is_source[s] = true;
            }
            for v in 0..self.graph.num_nodes() {
                if is_source[v] || pred[v].is_some() {
                    self.potentials[v] = dist[v];
                }
            }
        }

        loop {
            let sources = self.current_sources();
            if sources.is_empty() {
                break;
            }
            let (dist, pred) = {
                let pot = &self.potentials;
                dijkstra_heap(&*self.graph, &sources, |a| {
                    a.cost + pot[a.src] - pot[a.dst]
                })
            };
            let snk = match self.nearest_deficit(&sources, &dist, &pred) {
                Some(v) => v,
                None => {
                    self.state = SolutionState::Infeasible;
                    return self.state;
                }
            };
            // the path runs from the source the search grew it from
            let mut src = snk;
            while let Some(aid) = pred[src] {
                src = self.graph.arc(aid).src;
            }
            self.augment(src, snk, &pred);

            let mut is_source = vec![false; self.graph.num_nodes()];
            for &s in &sources {
                is_source[s] = true;
            }
            for v in 0..self.graph.num_nodes() {
                if is_source[v] || pred[v].is_some() {
                    self.potentials[v] += dist[v];
                }
            }
        }

        info!(
            "successive shortest path with potentials: {} augmentations",
            self.cnt_paths
        );
        self.state = SolutionState::Optimal;
        self.state
    }

    /// Push every negative cost arc to its capacity.
    ///
    /// Afterwards all residual arcs have nonnegative cost; the displaced
    /// flow shows up as excess at the arc endpoints.
    fn saturate_negative_arcs(&mut self) {
        for aid in self.graph.arc_ids() {
            let arc = self.graph.arc(aid);
            let (f, u, v) = (arc.cap, arc.src, arc.dst);
            if arc.cost < 0 && f > 0 {
                self.graph.push(aid, f);
                self.graph.demands_mut()[u] -= f;
                self.graph.demands_mut()[v] += f;
            }
        }
    }

    /// The lowest-numbered node with positive excess.
    fn next_source(&self) -> Option<NodeId> {
        (0..self.graph.num_nodes()).find(|&u| self.graph.demand(u) > 0)
    }

    fn current_sources(&self) -> Vec<NodeId> {
        (0..self.graph.num_nodes())
            .filter(|&u| self.graph.demand(u) > 0)
            .collect()
    }

    /// The reached node with negative excess closest to the sources.
    fn nearest_deficit(
        &self,
        sources: &[NodeId],
        dist: &[Cost],
        pred: &[Option<ArcId>],
    ) -> Option<NodeId> {
        let mut best = None;
        for v in 0..self.graph.num_nodes() {
            if self.graph.demand(v) < 0
                && (pred[v].is_some() || sources.contains(&v))
                && best.map_or(true, |b: NodeId| dist[v] < dist[b])
            {
                best = Some(v);
            }
        }
        best
    }

    /// Augment along the predecessor path from `src` to `snk`.
    ///
    /// The amount is the path bottleneck, clipped to the excess of the
    /// source and the deficit of the sink.
    fn augment(&mut self, src: NodeId, snk: NodeId, pred: &[Option<ArcId>]) {
        let mut f = self.graph.demand(src).min(-self.graph.demand(snk));
        let mut v = snk;
        while v != src {
            let aid = pred[v].unwrap();
            f = f.min(self.graph.arc(aid).cap);
            v = self.graph.arc(aid).src;
        }
        debug_assert!(f > 0);

        let mut v = snk;
        while v != src {
            let aid = pred[v].unwrap();
            v = self.graph.arc(aid).src;
            self.graph.push(aid, f);
        }
        self.graph.demands_mut()[src] -= f;
        self.graph.demands_mut()[snk] += f;
        self.cnt_paths += 1;
        debug!("augmented {} units from {} to {}", f, src, snk);
    }
}

/// Solve the min cost flow problem shipping along successive shortest
/// paths found by Bellman-Ford.
pub fn successive_shortest_path(graph: &mut ResidualGraph) -> SolutionState {
    SuccessiveShortest::new(graph).solve()
}

/// Solve the min cost flow problem shipping along successive shortest
/// paths found by Dijkstra on reduced costs.
pub fn successive_shortest_path_potentials(graph: &mut ResidualGraph) -> SolutionState {
    SuccessiveShortest::new(graph).solve_with_potentials()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> ResidualGraph {
        let mut g = ResidualGraph::new(4);
        g.set_demand(0, 5);
        g.set_demand(1, 3);
        g.set_demand(2, -4);
        g.set_demand(3, -4);
        g.add_arc(0, 2, 5, 1);
        g.add_arc(0, 3, 5, 2);
        g.add_arc(1, 2, 5, 3);
        g.add_arc(1, 3, 5, 1);
        g
    }

    #[test]
    fn plain_variant() {
        let mut g = transport();
        assert_eq!(successive_shortest_path(&mut g), SolutionState::Optimal);
        assert_eq!(g.flow_cost(), 9);
        assert!(g.demands().iter().all(|&b| b == 0));
    }

    #[test]
    fn potentials_variant() {
        let mut g = transport();
        assert_eq!(
            successive_shortest_path_potentials(&mut g),
            SolutionState::Optimal
        );
        assert_eq!(g.flow_cost(), 9);
    }

    #[test]
    fn negative_costs_need_the_saturation_pass() {
        // the cheapest solution routes flow over the negative arc
        let mut g = ResidualGraph::new(3);
        g.set_demand(0, 2);
        g.set_demand(2, -2);
        g.add_arc(0, 1, 3, -5);
        g.add_arc(1, 2, 3, 1);
        g.add_arc(1, 0, 3, 1);
        assert_eq!(successive_shortest_path(&mut g), SolutionState::Optimal);
        // x(0,1) = 3, x(1,2) = 2 and one unit shipped back over (1,0)
        assert_eq!(g.flow_cost(), -12);
    }

    #[test]
    fn unbalanced_is_infeasible() {
        let mut g = ResidualGraph::new(2);
        g.set_demand(0, 5);
        g.set_demand(1, -10);
        g.add_arc(0, 1, 20, 1);
        assert_eq!(successive_shortest_path(&mut g), SolutionState::Infeasible);
        let mut g = ResidualGraph::new(2);
        g.set_demand(0, 5);
        g.set_demand(1, -10);
        g.add_arc(0, 1, 20, 1);
        assert_eq!(
            successive_shortest_path_potentials(&mut g),
            SolutionState::Infeasible
        );
    }

    #[test]
    fn unreachable_deficit_is_infeasible() {
        let mut g = ResidualGraph::new(3);
        g.set_demand(0, 1);
        g.set_demand(2, -1);
        g.add_arc(0, 1, 1, 1);
        assert_eq!(successive_shortest_path(&mut g), SolutionState::Infeasible);
    }
}
