// Copyright (c) 2021, 2022 Frank Fischer <frank-fischer@shadow-soft.de>
//
// This program is free software: you can redistribute it and/or
// modify it under the terms of the GNU General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see  <http://www.gnu.org/licenses/>
//

//! A library of minimum-cost-flow algorithms on residual networks.
//!
//! An instance is read in DIMACS min format into a [`ResidualGraph`],
//! solved in place by one of the solvers in [`mcf`], and the resulting
//! flow is read back off the graph.

// # Data structures

pub mod collections;
pub mod graph;
pub use self::graph::{Arc, ArcId, Cost, Flow, NodeId, ResidualGraph};

// # Algorithms

pub mod maxflow;
pub mod mcf;
pub mod shortestpath;
pub use self::mcf::SolutionState;

// # Input/output

pub mod dimacs;
