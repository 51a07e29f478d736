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

//! A BFS augmenting path (Edmonds-Karp) max flow algorithm.
//!
//! The min cost flow solvers only use max flow to establish (or probe)
//! feasibility, so the plain O(N·M²) algorithm is good enough.

use crate::graph::{ArcId, Flow, NodeId, ResidualGraph};
use log::debug;
use std::collections::VecDeque;

/// Compute a maximum flow from `src` to `snk` on the residual network.
///
/// The flow is left on the graph; the returned value is the amount
/// shipped from `src` to `snk`.
pub fn max_flow(g: &mut ResidualGraph, src: NodeId, snk: NodeId) -> Flow {
    debug_assert_ne!(src, snk, "source and sink node must not be equal");

    let mut value = 0;
    let mut naugment = 0usize;
    let mut pred: Vec<Option<ArcId>> = vec![None; g.num_nodes()];
    let mut queue = VecDeque::with_capacity(g.num_nodes());

    loop {
        // find a shortest augmenting path by BFS
        pred.iter_mut().for_each(|p| *p = None);
        queue.clear();
        queue.push_back(src);
        let mut seen = vec![false; g.num_nodes()];
        seen[src] = true;
        'bfs: while let Some(u) = queue.pop_front() {
            for (aid, arc) in g.outgoing(u) {
                if arc.cap > 0 && !seen[arc.dst] {
                    seen[arc.dst] = true;
                    pred[arc.dst] = Some(aid);
                    if arc.dst == snk {
                        break 'bfs;
                    }
                    queue.push_back(arc.dst);
                }
            }
        }

        if pred[snk].is_none() {
            debug!("max flow: value {} after {} augmentations", value, naugment);
            return value;
        }

        // saturate the path
        let mut df = Flow::MAX;
        let mut v = snk;
        while let Some(aid) = pred[v] {
            df = df.min(g.arc(aid).cap);
            v = g.arc(aid).src;
        }
        let mut v = snk;
        while let Some(aid) = pred[v] {
            v = g.arc(aid).src;
            g.push(aid, df);
        }
        value += df;
        naugment += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::max_flow;
    use crate::graph::ResidualGraph;

    #[test]
    fn small_network() {
        let mut g = ResidualGraph::new(6);
        for &(u, v, cap) in &[
            (0, 2, 15),
            (0, 4, 10),
            (2, 3, 6),
            (2, 4, 7),
            (3, 1, 5),
            (3, 5, 2),
            (4, 3, 11),
            (4, 5, 4),
            (5, 3, 4),
            (5, 1, 20),
        ] {
            g.add_arc(u, v, cap, 0);
        }
        assert_eq!(max_flow(&mut g, 0, 1), 11);
        // flow conservation at the inner nodes
        for u in 2..6 {
            let out: i64 = g.arc_ids().step_by(2).filter(|&a| g.arc(a).src == u).map(|a| g.flow(a)).sum();
            let inc: i64 = g.arc_ids().step_by(2).filter(|&a| g.arc(a).dst == u).map(|a| g.flow(a)).sum();
            assert_eq!(out, inc);
        }
    }

    #[test]
    fn disconnected_sink() {
        let mut g = ResidualGraph::new(3);
        g.add_arc(0, 1, 5, 0);
        assert_eq!(max_flow(&mut g, 0, 2), 0);
        assert_eq!(g.flow(0), 0);
    }
}
