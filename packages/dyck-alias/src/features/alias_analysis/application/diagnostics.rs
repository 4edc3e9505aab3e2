//! Human-readable dumps of a finished analysis
//!
//! Neither format is a compatibility surface.

use super::analyzer::AliasAnalysis;
use crate::errors::Result;
use crate::features::alias_analysis::domain::{ClassId, EdgeLabel};
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;
use std::io::Write;

/// Members shown per DOT node before eliding the rest
const MAX_NODE_MEMBERS: usize = 8;

impl<'m> AliasAnalysis<'m> {
    /// One line per class member: `class<TAB>function<TAB>value`
    pub fn dump_alias_sets<W: Write>(&self, out: &mut W) -> Result<()> {
        let module = self.module();
        for class in self.classes() {
            for &value in self.graph().values(class) {
                writeln!(
                    out,
                    "{}\t{}\t{}",
                    class,
                    module.owner_name(value),
                    module.display_name(value)
                )?;
            }
        }
        Ok(())
    }

    /// Class graph as a petgraph graph: node weights are member lists,
    /// edge weights are labels
    pub fn class_graph(&self) -> DiGraph<String, EdgeLabel> {
        let module = self.module();
        let graph = self.graph();
        let mut out = DiGraph::new();
        let mut nodes: FxHashMap<ClassId, NodeIndex> = FxHashMap::default();

        for class in self.classes() {
            let values = graph.values(class);
            let mut members: Vec<String> = values
                .iter()
                .take(MAX_NODE_MEMBERS)
                .map(|&v| module.display_name(v))
                .collect();
            if values.len() > MAX_NODE_MEMBERS {
                members.push(format!("+{}", values.len() - MAX_NODE_MEMBERS));
            }
            let weight = match graph.vertex(class).name.as_deref() {
                Some(name) if members.is_empty() => format!("{} {}", class, name),
                _ => format!("{} {{{}}}", class, members.join(", ")),
            };
            nodes.insert(class, out.add_node(weight));
        }

        for (src, label, dst) in graph.edges() {
            if let (Some(&a), Some(&b), Some(label)) =
                (nodes.get(&src), nodes.get(&dst), graph.labels().get(label))
            {
                out.add_edge(a, b, label);
            }
        }
        out
    }

    /// Graphviz rendering of [`Self::class_graph`]
    pub fn to_dot(&self) -> String {
        let graph = self.class_graph();
        format!(
            "digraph alias {{\n{}}}\n",
            Dot::with_config(&graph, &[Config::GraphContentOnly])
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::features::alias_analysis::application::AliasAnalysis;
    use crate::shared::models::{ModuleBuilder, Signature, Type};

    fn sample() -> crate::shared::models::Module {
        let mut mb = ModuleBuilder::new("m");
        let main = mb.declare_function("main", Signature::new(vec![], Type::Void));
        {
            let mut b = mb.body(main);
            let x = b.alloca("x");
            let p = b.alloca("p");
            b.store(x, p);
            let f = b.field("f", x, 1);
            let _ = b.load("y", f, Type::ptr());
            b.ret(None);
        }
        mb.build()
    }

    #[test]
    fn test_dump_lists_every_member() {
        let module = sample();
        let analysis = AliasAnalysis::new(&module).unwrap();
        let mut out = Vec::new();
        analysis.dump_alias_sets(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        for name in ["main", "x", "p", "f", "y"] {
            assert!(
                text.lines().any(|l| l.ends_with(&format!("\t{}", name))),
                "missing {} in\n{}",
                name,
                text
            );
        }
        assert!(text.lines().all(|l| l.split('\t').count() == 3));
    }

    #[test]
    fn test_dot_has_one_edge_per_triple() {
        let module = sample();
        let analysis = AliasAnalysis::new(&module).unwrap();
        let graph = analysis.class_graph();
        assert_eq!(graph.node_count(), analysis.stats().classes);
        assert_eq!(graph.edge_count(), analysis.stats().edges);

        let dot = analysis.to_dot();
        assert!(dot.starts_with("digraph alias {"));
        assert!(dot.contains("\"*\""));
        assert!(dot.contains("\".1\""));
    }
}
