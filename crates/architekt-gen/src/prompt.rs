use architekt_core::catalog::ComponentSchema;
use architekt_core::{Catalog, ParamKind};

/// Compact one-line-per-component vocabulary with each parameter's kind and default.
pub fn serialize_catalog(catalog: &Catalog) -> String {
    let mut out = String::with_capacity(2048);
    for schema in catalog.palette() {
        serialize_component(&mut out, schema);
    }
    out
}

fn serialize_component(out: &mut String, schema: &ComponentSchema) {
    out.push_str("- ");
    out.push_str(&schema.type_tag);
    out.push_str(" \"");
    out.push_str(&schema.label);
    out.push('"');
    if schema.config.is_empty() {
        out.push_str(" (no config)\n");
        return;
    }
    out.push_str(" config:");
    for (i, param) in schema.config.iter().enumerate() {
        out.push_str(if i == 0 { " " } else { ", " });
        out.push_str(&param.id);
        out.push('=');
        match &param.kind {
            ParamKind::Text => {
                out.push('"');
                out.push_str(&param.default_value.to_string());
                out.push('"');
            }
            ParamKind::Number => out.push_str(&param.default_value.to_string()),
            ParamKind::Enum { options } => {
                out.push_str(&param.default_value.to_string());
                out.push_str(" [");
                out.push_str(&options.join("|"));
                out.push(']');
            }
        }
    }
    out.push('\n');
}

pub fn generation_system(catalog: &Catalog) -> String {
    let tags: Vec<String> = catalog.type_tags().map(|t| format!("'{t}'")).collect();
    format!(
        "You are a system architect expert. You generate a system architecture design in JSON \
format from the user's prompt. The JSON represents the nodes and edges of a directed graph.\n\n\
The available component types are: {}.\n\n\
Components and their configuration (parameter=default, [allowed values]):\n{}\n\
The JSON must have this shape:\n\
{{\n\
  \"nodes\": [\n\
    {{\"id\": \"dnd-node_1\", \"type\": \"default\", \"position\": {{\"x\": 100, \"y\": 100}},\n\
     \"data\": {{\"label\": \"Component Label\", \"type\": \"load-balancer\", \"config\": {{}}}}}}\n\
  ],\n\
  \"edges\": [\n\
    {{\"id\": \"reactflow__edge-dnd-node_1-dnd-node_2\", \"source\": \"dnd-node_1\", \"target\": \"dnd-node_2\"}}\n\
  ]\n\
}}\n\n\
- Each node must have a unique 'id' starting with 'dnd-node_'.\n\
- Each node's 'type' must be 'default'.\n\
- Lay out 'position' logically: a client device at the top, then a load balancer, then web servers, and so on.\n\
- 'data.type' must be one of the available component types.\n\
- 'data.config' may only use that component's parameters, with allowed values. Omit a parameter to take its default.\n\
- Each edge must have a unique 'id' and connect two existing nodes via 'source' and 'target'.\n\
- Always include a 'client-device' as the entry point for user traffic unless the prompt says otherwise.\n\
- Infer connections logically. For example, a client connects to a load balancer, which connects to web servers, which connect to a database.\n\n\
Output ONLY the raw JSON object, no explanations.",
        tags.join(", "),
        serialize_catalog(catalog),
    )
}

pub fn generation_user(prompt: &str) -> String {
    format!("Prompt: {}", prompt.trim())
}

pub fn validation_system() -> String {
    "You are a system design expert. You are given a system design as a JSON string and a \
schema as a JSON string. Validate the design against the schema and report whether it is \
valid and any issues you find.\n\n\
Respond using ONLY this JSON format:\n\
{\"isValid\": true or false, \"validationFeedback\": \"A detailed explanation of whether the \
design is valid, and if not, what the issues are.\"}"
        .to_string()
}

pub fn validation_user(design_json: &str, components_schema: &str) -> String {
    format!("System Design:\n{design_json}\n\nSchema:\n{components_schema}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_prompt_names_every_component() {
        let catalog = Catalog::builtin();
        let system = generation_system(catalog);
        for tag in catalog.type_tags() {
            assert!(system.contains(&format!("'{tag}'")), "missing {tag}");
        }
        assert!(system.contains("client-device"));
    }

    #[test]
    fn catalog_lines_show_defaults_and_options() {
        let text = serialize_catalog(Catalog::builtin());
        assert!(text.contains("- cache \"Cache\" config: ttl=60, policy=LRU [LRU|LFU|FIFO], size=1024"));
        assert_eq!(text.lines().count(), Catalog::builtin().len());
    }
}
