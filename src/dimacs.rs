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

//! DIMACS min-cost-flow input and output.
//!
//! The reader accepts the classic line-oriented format: any number of
//! `c` comment lines and blank lines, a single problem line
//! `p min <nodes> <arcs>`, balance records `n <id> <balance>` for the
//! nodes with nonzero balance, and exactly `<arcs>` arc records
//! `a <tail> <head> <low> <high> <cost>`. Node ids are 1-based in the
//! file and shifted to 0-based on load. Lower bounds must be 0 and
//! loops are rejected; parallel arcs are fine (the residual arena keeps
//! every pair separate even though the strict DIMACS definition forbids
//! them).
//!
//! The writer emits the solved flow, one `f <tail> <head> <flow>` line
//! per input arc carrying flow, followed by a single `s <cost>` line
//! with the total cost.

use crate::graph::{Cost, Flow, NodeId, ResidualGraph};
use std::error;
use std::fmt;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::str::FromStr;

/// Why an instance could not be loaded.
#[derive(Debug)]
pub enum Error {
    /// The graph file could not be read at all.
    Input(io::Error),
    /// A line does not follow the DIMACS min grammar.
    Parse { line: usize, what: String },
    /// A record is well formed but describes an unusable instance.
    Data { line: usize, what: String },
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Input(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Input(err) => write!(f, "cannot read the graph file: {}", err),
            Error::Parse { line, what } => write!(f, "line {}: malformed record ({})", line, what),
            Error::Data { line, what } => write!(f, "line {}: bad instance data ({})", line, what),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Input(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Parse one whitespace-separated field of a record.
fn field<T>(tok: &str, line: usize, what: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    tok.parse().map_err(|err| Error::Parse {
        line,
        what: format!("{} '{}': {}", what, tok, err),
    })
}

/// Parse a 1-based node id and shift it into the graph's index range.
fn node_index(tok: &str, num_nodes: usize, line: usize) -> Result<NodeId> {
    let id: usize = field(tok, line, "node id")?;
    if id < 1 || id > num_nodes {
        return Err(Error::Data {
            line,
            what: format!("node id {} outside 1..={}", id, num_nodes),
        });
    }
    Ok(id - 1)
}

/// The graph under construction, available once the problem line was seen.
fn started(graph: &mut Option<ResidualGraph>, line: usize) -> Result<&mut ResidualGraph> {
    graph.as_mut().ok_or_else(|| Error::Parse {
        line,
        what: "record before the problem line".to_string(),
    })
}

/// Read a min-cost-flow instance into a residual network.
pub fn read<R: Read>(input: R) -> Result<ResidualGraph> {
    let mut graph: Option<ResidualGraph> = None;
    let mut announced: usize = 0;
    let mut parsed = 0;
    let mut lineno = 0;

    for line in BufReader::new(input).lines() {
        let line = line?;
        lineno += 1;
        let record = line.trim_start();
        if record.is_empty() || record.starts_with('c') {
            continue;
        }

        let fields: Vec<&str> = record.split_whitespace().collect();
        match fields.as_slice() {
            ["p", "min", nodes, arcs] => {
                if graph.is_some() {
                    return Err(Error::Parse {
                        line: lineno,
                        what: "more than one problem line".to_string(),
                    });
                }
                let nodes: usize = field(nodes, lineno, "node count")?;
                announced = field(arcs, lineno, "arc count")?;
                graph = Some(ResidualGraph::new(nodes));
            }
            ["n", node, balance] => {
                let g = started(&mut graph, lineno)?;
                let node = node_index(node, g.num_nodes(), lineno)?;
                if g.demand(node) != 0 {
                    return Err(Error::Data {
                        line: lineno,
                        what: format!("node {} already has a balance", node + 1),
                    });
                }
                let balance: Flow = field(balance, lineno, "balance")?;
                g.set_demand(node, balance);
            }
            ["a", tail, head, low, high, cost] => {
                let g = started(&mut graph, lineno)?;
                if parsed == announced {
                    return Err(Error::Data {
                        line: lineno,
                        what: format!("more than the announced {} arcs", announced),
                    });
                }
                let tail = node_index(tail, g.num_nodes(), lineno)?;
                let head = node_index(head, g.num_nodes(), lineno)?;
                if tail == head {
                    return Err(Error::Data {
                        line: lineno,
                        what: format!("arc ({0},{0}) is a loop", tail + 1),
                    });
                }
                let low: Flow = field(low, lineno, "lower bound")?;
                if low != 0 {
                    return Err(Error::Data {
                        line: lineno,
                        what: format!("lower bound {} (only 0 is supported)", low),
                    });
                }
                let high: Flow = field(high, lineno, "capacity")?;
                if high < 0 {
                    return Err(Error::Data {
                        line: lineno,
                        what: format!("negative capacity {}", high),
                    });
                }
                let cost: Cost = field(cost, lineno, "cost")?;
                g.add_arc(tail, head, high, cost);
                parsed += 1;
            }
            ["p", ..] => {
                return Err(Error::Parse {
                    line: lineno,
                    what: "problem line must read 'p min <nodes> <arcs>'".to_string(),
                })
            }
            ["n", ..] => {
                return Err(Error::Parse {
                    line: lineno,
                    what: "node line must read 'n <id> <balance>'".to_string(),
                })
            }
            ["a", ..] => {
                return Err(Error::Parse {
                    line: lineno,
                    what: "arc line must read 'a <tail> <head> <low> <high> <cost>'".to_string(),
                })
            }
            [unknown, ..] => {
                return Err(Error::Parse {
                    line: lineno,
                    what: format!("unknown descriptor '{}'", unknown),
                })
            }
            [] => continue,
        }
    }

    let graph = graph.ok_or_else(|| Error::Parse {
        line: lineno,
        what: "missing problem line".to_string(),
    })?;
    if parsed != announced {
        return Err(Error::Data {
            line: lineno,
            what: format!(
                "the problem line announced {} arcs, the file contains {}",
                announced, parsed
            ),
        });
    }

    Ok(graph)
}

/// Read a min-cost-flow instance from a named file.
pub fn read_from_file(filename: &str) -> Result<ResidualGraph> {
    read(std::fs::File::open(filename)?)
}

/// Write the flow on the residual network as a solution file.
///
/// One `f` line per input arc with positive flow, the total cost on the
/// final `s` line.
pub fn write_flow<W: Write>(mut out: W, g: &ResidualGraph) -> io::Result<()> {
    for a in g.arc_ids().step_by(2) {
        let arc = g.arc(a);
        if arc.flow() > 0 {
            writeln!(out, "f {} {} {}", arc.src + 1, arc.dst + 1, arc.flow())?;
        }
    }
    writeln!(out, "s {}", g.flow_cost())?;

    Ok(())
}

/// Write the flow on the residual network to a named file.
pub fn write_flow_to_file(filename: &str, g: &ResidualGraph) -> io::Result<()> {
    write_flow(&mut std::fs::File::create(filename)?, g)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_a_full_instance() {
        let file = "c six-node shipment instance
c two plants, two customers

p min 6 8
n 1 7
n 3 5
n 5 -9
n 6 -3

a 1 2 0 6 3
a 1 5 0 4 9
a 2 5 0 8 2
a 3 2 0 3 1
a 3 4 0 5 4
a 4 6 0 5 1
a 2 6 0 2 5
a 4 5 0 4 2
";
        let g = read(Cursor::new(file)).unwrap();

        assert_eq!(g.num_nodes(), 6);
        assert_eq!(g.num_arcs(), 8);
        assert_eq!(g.demands(), &[7, 0, 5, 0, -9, -3]);
        assert_eq!(g.source_nodes(), &[0, 2]);
        assert_eq!(g.sink_nodes(), &[4, 5]);

        let arcs: Vec<_> = g
            .arc_ids()
            .step_by(2)
            .map(|a| {
                let arc = g.arc(a);
                (arc.src + 1, arc.dst + 1, arc.cap, arc.cost)
            })
            .collect();
        assert_eq!(
            arcs,
            vec![
                (1, 2, 6, 3),
                (1, 5, 4, 9),
                (2, 5, 8, 2),
                (3, 2, 3, 1),
                (3, 4, 5, 4),
                (4, 6, 5, 1),
                (2, 6, 2, 5),
                (4, 5, 4, 2),
            ]
        );

        // the reverse halves are in place
        let r = g.find(1, 0).unwrap();
        assert_eq!(g.arc(r).cap, 0);
        assert_eq!(g.arc(r).cost, -3);
    }

    #[test]
    fn rejected_inputs() {
        let cases = [
            ("p max 2 1\na 1 2 0 5 1\n", "p min"),
            ("p min 2 1\np min 2 1\n", "more than one problem line"),
            ("n 1 4\np min 2 1\na 1 2 0 5 1\n", "before the problem line"),
            ("p min 2 1\na 1 3 0 5 1\n", "outside 1..=2"),
            ("p min 2 1\na 1 1 0 5 1\n", "loop"),
            ("p min 2 1\na 1 2 1 5 1\n", "lower bound"),
            ("p min 2 1\na 1 2 0 -5 1\n", "negative capacity"),
            ("p min 2 1\nn 1 4\nn 1 4\na 1 2 0 5 1\n", "already has a balance"),
            ("p min 2 1\n", "announced 1 arcs, the file contains 0"),
            ("p min 2 1\na 1 2 0 5 1\na 2 1 0 5 1\n", "more than the announced"),
            ("p min 2 1\na 1 2 0 5\n", "arc line must read"),
            ("p min 2 1\na 1 2 0 5 1 7\n", "arc line must read"),
            ("p min 2 1\nn 1\na 1 2 0 5 1\n", "node line must read"),
            ("p min 2 1\na 1 2 0 5 x\n", "cost 'x'"),
            ("p min 2 1\nq 1 2\na 1 2 0 5 1\n", "unknown descriptor 'q'"),
        ];
        for (input, needle) in cases {
            let err = read(Cursor::new(input)).unwrap_err();
            let msg = err.to_string();
            assert!(
                msg.contains(needle),
                "input {:?}: expected {:?} in {:?}",
                input,
                needle,
                msg
            );
        }
    }

    #[test]
    fn error_messages_carry_the_line_number() {
        let err = read(Cursor::new("c intro\n\np min 2 1\na 1 1 0 5 1\n")).unwrap_err();
        assert!(err.to_string().starts_with("line 4:"));
    }

    #[test]
    fn writes_the_positive_flows() {
        let mut g = ResidualGraph::new(3);
        g.set_demand(0, 3);
        g.set_demand(2, -3);
        let a = g.add_arc(0, 1, 5, 2);
        let b = g.add_arc(1, 2, 5, 1);
        g.add_arc(0, 2, 1, 7);
        g.push(a, 3);
        g.push(b, 3);

        let mut buf = Cursor::new(Vec::new());
        write_flow(&mut buf, &g).unwrap();
        assert_eq!(
            String::from_utf8(buf.into_inner()).unwrap(),
            "f 1 2 3
f 2 3 3
s 9
"
        );
    }
}
