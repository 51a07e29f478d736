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

//! Solve a DIMACS min-cost-flow instance with a selectable algorithm.

use clap::Parser;
use log::info;
use rs_flow::dimacs;
use rs_flow::graph::ResidualGraph;
use rs_flow::mcf::{
    cycle_cancelling, successive_shortest_path, successive_shortest_path_potentials, CostScaling,
    SolutionState,
};
use rs_flow::shortestpath::{bellman_ford, dijkstra, dijkstra_heap};
use std::error::Error;
use std::time::Instant;

#[derive(Parser, Debug)]
#[clap(name = "rs-flow")]
#[clap(about = "Solve min-cost-flow problems in DIMACS format.", long_about = None)]
struct Args {
    /// File containing the input graph.
    #[clap(long = "graph_file", default_value = "graph.in")]
    graph_file: String,
    /// File the output flow will be written to.
    #[clap(long = "out_graph_file", default_value = "graph.out")]
    out_graph_file: String,
    /// Algorithm to run: bellman_ford, dijkstra, dijkstra_heap,
    /// cycle_cancelling, successive_shortest_path,
    /// successive_shortest_path_potentials or cost_scaling.
    #[clap(long = "algorithm", default_value = "cycle_cancelling")]
    algorithm: String,
    /// Value by which eps is divided in the cost scaling algorithm.
    #[clap(long = "alpha_scaling_factor", default_value_t = 2)]
    alpha_scaling_factor: i64,
}

/// Log the distance table computed by one of the plain shortest path
/// algorithms.
fn log_distances(g: &ResidualGraph, dist: &[i64], pred: &[Option<usize>]) {
    for u in 0..g.num_nodes() {
        match pred[u] {
            Some(a) => info!(
                "node {}: distance {}, reached over ({}, {})",
                u + 1,
                dist[u],
                g.arc(a).src + 1,
                u + 1
            ),
            None => info!("node {}: unreached or source", u + 1),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    if args.alpha_scaling_factor < 2 {
        return Err(format!(
            "invalid --alpha_scaling_factor {} (must be at least 2)",
            args.alpha_scaling_factor
        )
        .into());
    }

    let mut graph = dimacs::read_from_file(&args.graph_file)?;
    info!(
        "read {}: {} nodes, {} arcs",
        args.graph_file,
        graph.num_nodes(),
        graph.num_arcs()
    );

    let tstart = Instant::now();
    let state = match args.algorithm.as_str() {
        "bellman_ford" => {
            let (dist, pred, cycle) = bellman_ford(&graph, graph.source_nodes(), |a| a.cost);
            if cycle.is_some() {
                info!("the network contains a negative cost cycle");
            }
            log_distances(&graph, &dist, &pred);
            SolutionState::Optimal
        }
        "dijkstra" => {
            let (dist, pred) = dijkstra(&graph, graph.source_nodes(), |a| a.cost);
            log_distances(&graph, &dist, &pred);
            SolutionState::Optimal
        }
        "dijkstra_heap" => {
            let (dist, pred) = dijkstra_heap(&graph, graph.source_nodes(), |a| a.cost);
            log_distances(&graph, &dist, &pred);
            SolutionState::Optimal
        }
        "cycle_cancelling" => cycle_cancelling(&mut graph),
        "successive_shortest_path" => successive_shortest_path(&mut graph),
        "successive_shortest_path_potentials" => successive_shortest_path_potentials(&mut graph),
        "cost_scaling" => {
            let mut solver = CostScaling::new(&mut graph, args.alpha_scaling_factor);
            solver.solve()
        }
        name => return Err(format!("unknown algorithm: {}", name).into()),
    };
    info!(
        "{} finished in {:.3}s",
        args.algorithm,
        tstart.elapsed().as_secs_f64()
    );

    if state == SolutionState::Infeasible {
        return Err("the problem is infeasible: the supply cannot be routed to the demands".into());
    }

    dimacs::write_flow_to_file(&args.out_graph_file, &graph)?;
    info!("solution written to {}", args.out_graph_file);

    Ok(())
}
