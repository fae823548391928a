//! Automaton to DOT (Graphviz) conversion.
//!
//! The generated DOT output follows these conventions:
//! - **States** are circles labeled with their id; final states use a double circle
//! - **Initial state** is marked by an arrow from an invisible point node
//! - **Input moves** are solid edges labeled with their guard
//! - **Epsilon moves** are dashed edges labeled with `ε`
//!
//! The library only produces the string; writing it anywhere is up to the caller.
//!
//! # Examples
//!
//! ```
//! use sfa_rs::automaton::{Sfa, Transition};
//! use sfa_rs::intervals::{CharAlgebra, CharPred};
//!
//! let alg = CharAlgebra;
//! let sfa = Sfa::new([Transition::input(0, 1, CharPred::num())], 0, [1], &alg).unwrap();
//!
//! let dot = sfa.to_dot().unwrap();
//! assert!(dot.contains("0 -> 1 [label=\"[0-9]\"];"));
//! // Write to file and render with: dot -Tpng output.dot -o output.png
//! ```

use std::fmt::Display;

use crate::automaton::Sfa;

/// Configuration options for DOT output generation.
///
/// Use `DotConfig::default()` for standard settings.
///
/// # Examples
///
/// ```
/// use sfa_rs::dot::DotConfig;
///
/// let config = DotConfig {
///     rank_dir: "TB",
///     ..DotConfig::default()
/// };
/// assert_eq!(config.final_shape, "doublecircle");
/// ```
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Layout direction (default: "LR")
    pub rank_dir: &'static str,
    /// Shape for non-final states (default: "circle")
    pub state_shape: &'static str,
    /// Shape for final states (default: "doublecircle")
    pub final_shape: &'static str,
    /// Style for input moves (default: "solid")
    pub input_edge_style: &'static str,
    /// Style for epsilon moves (default: "dashed")
    pub epsilon_edge_style: &'static str,
    /// Label of epsilon moves (default: "ε")
    pub epsilon_label: &'static str,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            rank_dir: "LR",
            state_shape: "circle",
            final_shape: "doublecircle",
            input_edge_style: "solid",
            epsilon_edge_style: "dashed",
            epsilon_label: "ε",
        }
    }
}

/// Escapes a label for use inside a double-quoted DOT string.
fn escape(label: &str) -> String {
    let mut escaped = String::with_capacity(label.len());
    for c in label.chars() {
        match c {
            '"' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

impl<P: Display> Sfa<P> {
    /// Converts the automaton to DOT (Graphviz) format.
    pub fn to_dot(&self) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(&DotConfig::default())
    }

    /// Converts the automaton to DOT format with custom configuration.
    pub fn to_dot_with_config(&self, config: &DotConfig) -> Result<String, std::fmt::Error> {
        use std::fmt::Write as _;

        let mut dot = String::new();
        writeln!(dot, "digraph {{")?;
        writeln!(dot, "rankdir={};", config.rank_dir)?;
        writeln!(dot, "node [shape={}];", config.state_shape)?;

        // Initial state marker
        writeln!(dot, "init [shape=point, style=invis];")?;

        for &state in self.states() {
            let shape = if self.is_final(state) {
                config.final_shape
            } else {
                config.state_shape
            };
            writeln!(dot, "{} [shape={}, label=\"{}\"];", state, shape, state)?;
        }

        writeln!(dot, "init -> {};", self.initial_state())?;

        for m in self.input_moves() {
            let label = escape(&m.guard.to_string());
            if config.input_edge_style == "solid" {
                writeln!(dot, "{} -> {} [label=\"{}\"];", m.from, m.to, label)?;
            } else {
                writeln!(
                    dot,
                    "{} -> {} [label=\"{}\", style={}];",
                    m.from, m.to, label, config.input_edge_style
                )?;
            }
        }

        for e in self.epsilon_moves() {
            writeln!(
                dot,
                "{} -> {} [label=\"{}\", style={}];",
                e.from,
                e.to,
                escape(config.epsilon_label),
                config.epsilon_edge_style
            )?;
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::Transition;
    use crate::bdd::Bdd;
    use crate::intervals::{CharAlgebra, CharPred};

    /// Basic test: verify DOT output is generated without errors
    #[test]
    fn test_to_dot_basic() {
        let alg = CharAlgebra;
        let sfa = Sfa::new(
            [
                Transition::input(0, 1, CharPred::lower_alpha()),
                Transition::epsilon(1, 2),
                Transition::input(2, 2, CharPred::of('"')),
            ],
            0,
            [2],
            &alg,
        )
        .unwrap();

        let dot = sfa.to_dot().unwrap();
        println!("{}", dot);

        assert!(dot.starts_with("digraph {"));
        assert!(dot.ends_with("}\n"));
        assert!(dot.contains("init -> 0;"));
        assert!(dot.contains("2 [shape=doublecircle, label=\"2\"];"));
        assert!(dot.contains("1 -> 2 [label=\"ε\", style=dashed];"));
        assert!(dot.contains("2 -> 2 [label=\"[\\\"]\"];"));
    }

    /// Test with custom configuration
    #[test]
    fn test_to_dot_with_config() {
        let alg = CharAlgebra;
        let sfa = Sfa::<CharPred>::full(&alg);
        let config = DotConfig {
            rank_dir: "TB",
            input_edge_style: "bold",
            ..DotConfig::default()
        };
        let dot = sfa.to_dot_with_config(&config).unwrap();
        assert!(dot.contains("rankdir=TB;"));
        assert!(dot.contains("0 -> 0 [label=\".\", style=bold];"));
    }

    /// BDD guards render through their node references
    #[test]
    fn test_to_dot_bdd_guards() {
        let bdd = Bdd::new(4);
        let sfa = Sfa::new([Transition::input(0, 1, bdd.mk_range(2, 9))], 0, [1], &bdd).unwrap();
        let dot = sfa.to_dot().unwrap();
        let edge = dot.lines().find(|l| l.starts_with("0 -> 1")).unwrap();
        assert!(edge.contains('@'));
    }
}
