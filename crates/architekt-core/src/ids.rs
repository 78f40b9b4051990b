use crate::model::Diagram;

pub const NODE_PREFIX: &str = "dnd-node_";
pub const EDGE_PREFIX: &str = "dnd-edge_";

// Counters at or above this are treated as foreign ids and not reserved past.
const RESERVE_CEILING: u64 = 1 << 53;

/// Per-session id allocator: a fixed prefix plus one monotonic counter shared by nodes
/// and edges. Each editing session owns its own generator.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: u64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_node_id(&mut self) -> String {
        format!("{NODE_PREFIX}{}", self.bump())
    }

    pub fn next_edge_id(&mut self) -> String {
        format!("{EDGE_PREFIX}{}", self.bump())
    }

    /// Move the counter past every generator-shaped id already present in `diagram`,
    /// so ids carried in by a load or generation are never reissued.
    pub fn reserve_past(&mut self, diagram: &Diagram) {
        let max = diagram
            .nodes
            .iter()
            .map(|n| n.id.as_str())
            .chain(diagram.edges.iter().map(|e| e.id.as_str()))
            .filter_map(|id| {
                id.strip_prefix(NODE_PREFIX)
                    .or_else(|| id.strip_prefix(EDGE_PREFIX))
                    .and_then(|n| n.parse::<u64>().ok())
                    .filter(|&n| n < RESERVE_CEILING)
            })
            .max()
            .unwrap_or(0);
        self.next = self.next.max(max + 1);
    }

    fn bump(&mut self) -> u64 {
        let n = self.next;
        self.next = self.next.saturating_add(1);
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_is_shared_between_nodes_and_edges() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.next_node_id(), "dnd-node_1");
        assert_eq!(ids.next_edge_id(), "dnd-edge_2");
        assert_eq!(ids.next_node_id(), "dnd-node_3");
    }

    #[test]
    fn reserve_skips_embedded_ids() {
        let diagram: Diagram = serde_json::from_value(serde_json::json!({
            "nodes": [
                {"id": "dnd-node_7", "data": {"label": "", "type": "cache"}},
                {"id": "node-99", "data": {"label": "", "type": "cache"}}
            ],
            "edges": [{"id": "dnd-edge_12", "source": "dnd-node_7", "target": "node-99"}]
        }))
        .unwrap();
        let mut ids = IdGenerator::new();
        ids.reserve_past(&diagram);
        assert_eq!(ids.next_node_id(), "dnd-node_13");
    }

    #[test]
    fn reserve_never_moves_backwards() {
        let mut ids = IdGenerator::new();
        for _ in 0..5 {
            ids.next_node_id();
        }
        ids.reserve_past(&Diagram::default());
        assert_eq!(ids.next_node_id(), "dnd-node_6");
    }

    #[test]
    fn huge_embedded_counters_are_not_reserved() {
        let diagram: Diagram = serde_json::from_value(serde_json::json!({
            "nodes": [
                {"id": "dnd-node_18446744073709551615", "data": {"label": "", "type": "cache"}},
                {"id": "dnd-node_9007199254740992", "data": {"label": "", "type": "cache"}},
                {"id": "dnd-node_4", "data": {"label": "", "type": "cache"}}
            ],
            "edges": []
        }))
        .unwrap();
        let mut ids = IdGenerator::new();
        ids.reserve_past(&diagram);
        assert_eq!(ids.next_node_id(), "dnd-node_5");
        assert_eq!(ids.next_edge_id(), "dnd-edge_6");
    }
}
