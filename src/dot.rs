//! DOT serialization.
//!
//! Emits the labeled hierarchy as a `digraph` for external rendering
//! (e.g. piping through `dot -Tsvg`). Node labels double as DOT ids, so
//! they are quoted and escaped; an unlabeled node falls back to its
//! numeric id to keep DOT ids distinct.

use crate::graph::{NodeId, OrgGraph};

fn dot_id(g: &OrgGraph, n: NodeId) -> String {
    let label = g.node(n).map(|d| d.label()).unwrap_or_default();
    let name = if label.is_empty() {
        format!("node {}", n.index())
    } else {
        label.to_string()
    };
    let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

impl OrgGraph {
    /// Serializes the organization as DOT text.
    pub fn marshal_dot(&self) -> String {
        let mut out = String::from("digraph Organization {\n");
        for n in self.node_ids() {
            out.push_str(&format!("\t{};\n", dot_id(self, n)));
        }
        for n in self.node_ids() {
            for c in self.children(n) {
                out.push_str(&format!("\t{} -> {};\n", dot_id(self, n), dot_id(self, c)));
            }
        }
        out.push('}');
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::config::OrgConfig;
    use crate::graph::OrgGraph;

    fn unit(axis: usize) -> Vec<f32> {
        let mut v = vec![0.0; 4];
        v[axis] = 1.0;
        v
    }

    #[test]
    fn test_marshal_dot() {
        let mut g = OrgGraph::new(OrgConfig::default());
        let a = g.add_dataset_node("a", unit(0));
        let b = g.add_dataset_node("b", unit(1));
        let p = g.add_merged_node(a, b);
        g.root = Some(p);
        g.regen_levels();
        g.set_root_label("Weather \"2020\"");

        let dot = g.marshal_dot();
        assert!(dot.starts_with("digraph Organization {"));
        assert!(dot.ends_with("}\n"));
        assert!(dot.contains("\t\"a\";\n"));
        assert!(dot.contains("\"Weather \\\"2020\\\"\" -> \"a\";"));
        assert!(dot.contains("\"Weather \\\"2020\\\"\" -> \"b\";"));
    }
}
