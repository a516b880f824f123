//! Read-only diagram export of a workflow definition.
//!
//! Both renderers walk the definition without touching executors or run
//! state, so they can be called on a live workflow at any time.

use triage_core::WorkflowDefinition;

/// Render the graph as a Mermaid flowchart.
pub fn to_mermaid<T>(definition: &WorkflowDefinition<T>) -> String {
    let mut out = String::from("flowchart TD\n");

    for id in definition.executors() {
        if id == definition.start() {
            out.push_str(&format!("    {id}([\"{id}\"])\n"));
        } else if definition.is_terminal(id) {
            out.push_str(&format!("    {id}[[\"{id}\"]]\n"));
        } else {
            out.push_str(&format!("    {id}[\"{id}\"]\n"));
        }
    }

    for edge in definition.edges().edges() {
        out.push_str(&format!("    {} --> {}\n", edge.source, edge.target));
    }
    for group in definition.edges().groups() {
        for (index, case) in group.cases().iter().enumerate() {
            let label = case.label().map_or_else(
                || format!("case {index}"),
                |label| label.to_string(),
            );
            out.push_str(&format!(
                "    {} -->|\"{}\"| {}\n",
                group.source(),
                label,
                case.target()
            ));
        }
        out.push_str(&format!(
            "    {} -->|\"default\"| {}\n",
            group.source(),
            group.default_target()
        ));
    }

    out
}

/// Render the graph in GraphViz DOT format.
pub fn to_dot<T>(definition: &WorkflowDefinition<T>) -> String {
    let mut out = String::new();
    out.push_str(&format!("digraph \"{}\" {{\n", definition.id()));
    out.push_str("    rankdir=TB;\n");
    out.push_str("    node [shape=box];\n");

    for id in definition.executors() {
        if id == definition.start() {
            out.push_str(&format!("    \"{id}\" [label=\"{id}\", shape=oval];\n"));
        } else if definition.is_terminal(id) {
            out.push_str(&format!(
                "    \"{id}\" [label=\"{id}\", peripheries=2];\n"
            ));
        } else {
            out.push_str(&format!("    \"{id}\" [label=\"{id}\"];\n"));
        }
    }

    for edge in definition.edges().edges() {
        out.push_str(&format!(
            "    \"{}\" -> \"{}\";\n",
            edge.source, edge.target
        ));
    }
    for group in definition.edges().groups() {
        for (index, case) in group.cases().iter().enumerate() {
            let label = case.label().map_or_else(
                || format!("case {index}"),
                |label| label.to_string(),
            );
            out.push_str(&format!(
                "    \"{}\" -> \"{}\" [label=\"{}\", style=dashed];\n",
                group.source(),
                case.target(),
                label
            ));
        }
        out.push_str(&format!(
            "    \"{}\" -> \"{}\" [label=\"default\", style=dashed];\n",
            group.source(),
            group.default_target()
        ));
    }

    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::{SwitchCase, SwitchGroup, WorkflowBuilder};

    fn sample_definition() -> WorkflowDefinition<String> {
        WorkflowBuilder::new("sample")
            .set_start("intake")
            .add_executor_id("router")
            .add_executor_id("a")
            .add_executor_id("b")
            .add_edge("intake", "router")
            .add_switch_group(SwitchGroup::new(
                "router",
                vec![SwitchCase::new("a", |m: &String| m == "a").with_label("m == a")],
                "b",
            ))
            .build()
            .unwrap()
    }

    #[test]
    fn mermaid_lists_nodes_and_labeled_edges() {
        let mermaid = to_mermaid(&sample_definition());

        assert!(mermaid.starts_with("flowchart TD"));
        assert!(mermaid.contains("intake --> router"));
        assert!(mermaid.contains("router -->|\"m == a\"| a"));
        assert!(mermaid.contains("router -->|\"default\"| b"));
    }

    #[test]
    fn dot_is_a_digraph_with_labeled_switch_edges() {
        let dot = to_dot(&sample_definition());

        assert!(dot.starts_with("digraph \"sample\""));
        assert!(dot.contains("\"intake\" -> \"router\";"));
        assert!(dot.contains("[label=\"m == a\", style=dashed]"));
        assert!(dot.contains("[label=\"default\", style=dashed]"));
        assert!(dot.trim_end().ends_with('}'));
    }
}
