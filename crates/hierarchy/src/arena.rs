//! Arena-held organization tree
//!
//! Nodes are stored in a flat `Vec` and addressed by index. Walks use an
//! explicit stack, so depth never touches the call stack.

use salesai_core::{Agent, AreaManager, DivisionHead};

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq)]
pub enum OrgNode {
    Division(DivisionHead),
    Area(AreaManager),
    Agent(Agent),
}

impl OrgNode {
    pub fn id(&self) -> &str {
        match self {
            Self::Division(h) => &h.id,
            Self::Area(m) => &m.id,
            Self::Agent(a) => &a.id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrgTree {
    nodes: Vec<OrgNode>,
    children: Vec<Vec<NodeId>>,
}

impl OrgTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single area with its direct agents; the area is the root
    pub fn area(manager: AreaManager, agents: Vec<Agent>) -> (Self, NodeId) {
        let mut tree = Self::new();
        let root = tree.add_root(OrgNode::Area(manager));
        for agent in agents {
            tree.add_child(root, OrgNode::Agent(agent));
        }
        (tree, root)
    }

    /// A division, its areas in the given order, and their agents
    ///
    /// Agents are attached by `area_manager_id`; agents of areas outside the
    /// division are ignored.
    pub fn division(head: DivisionHead, areas: Vec<AreaManager>, agents: Vec<Agent>) -> (Self, NodeId) {
        let mut tree = Self::new();
        let root = tree.add_root(OrgNode::Division(head));

        let area_nodes: Vec<(String, NodeId)> = areas
            .into_iter()
            .map(|area| {
                let id = area.id.clone();
                (id, tree.add_child(root, OrgNode::Area(area)))
            })
            .collect();

        for agent in agents {
            let slot = agent
                .area_manager_id
                .as_deref()
                .and_then(|m| area_nodes.iter().find(|(id, _)| id == m))
                .map(|(_, node)| *node);
            if let Some(node) = slot {
                tree.add_child(node, OrgNode::Agent(agent));
            }
        }
        (tree, root)
    }

    pub fn add_root(&mut self, node: OrgNode) -> NodeId {
        self.push(node)
    }

    /// Append `node` under `parent`; an unknown parent makes it a root
    pub fn add_child(&mut self, parent: NodeId, node: OrgNode) -> NodeId {
        if parent >= self.nodes.len() {
            return self.push(node);
        }
        let id = self.push(node);
        self.children[parent].push(id);
        id
    }

    fn push(&mut self, node: OrgNode) -> NodeId {
        self.nodes.push(node);
        self.children.push(Vec::new());
        self.nodes.len() - 1
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&OrgNode> {
        self.nodes.get(id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Subtree of `root` in pre-order, children in insertion order
    pub fn pre_order(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        if root >= self.nodes.len() {
            return order;
        }
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children[id].iter().rev());
        }
        order
    }

    /// Subtree of `root` with every node after all of its descendants
    pub fn post_order(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        if root >= self.nodes.len() {
            return order;
        }
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
            } else {
                stack.push((id, true));
                stack.extend(self.children[id].iter().rev().map(|c| (*c, false)));
            }
        }
        order
    }

    /// Agent nodes in the subtree, in pre-order
    ///
    /// Keyed by node, so an agent listed twice yields two entries.
    pub fn agents_under(&self, root: NodeId) -> Vec<(NodeId, &Agent)> {
        self.pre_order(root)
            .into_iter()
            .filter_map(|id| match &self.nodes[id] {
                OrgNode::Agent(agent) => Some((id, agent)),
                _ => None,
            })
            .collect()
    }

    /// Distinct agent ids in the subtree, first occurrence order
    pub fn agent_ids_under(&self, root: NodeId) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for (_, agent) in self.agents_under(root) {
            if !ids.contains(&agent.id) {
                ids.push(agent.id.clone());
            }
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head() -> DivisionHead {
        DivisionHead {
            id: "DH01".into(),
            name: "Robert Williams".into(),
            email: String::new(),
            division_name: "North".into(),
        }
    }

    fn manager(id: &str) -> AreaManager {
        AreaManager {
            id: id.into(),
            name: id.into(),
            email: String::new(),
            division_head_id: "DH01".into(),
            area_name: id.into(),
        }
    }

    fn agent(id: &str, manager: &str) -> Agent {
        Agent {
            id: id.into(),
            name: id.into(),
            email: String::new(),
            monthly_target: 100.0,
            area_manager_id: Some(manager.into()),
        }
    }

    fn division() -> (OrgTree, NodeId) {
        OrgTree::division(
            head(),
            vec![manager("AM01"), manager("AM02")],
            vec![
                agent("A1", "AM01"),
                agent("A2", "AM02"),
                agent("A3", "AM01"),
                agent("A9", "AM99"),
            ],
        )
    }

    #[test]
    fn test_division_groups_agents_by_area() {
        let (tree, root) = division();

        assert_eq!(tree.len(), 6);
        let areas = tree.children(root);
        assert_eq!(areas.len(), 2);
        let first: Vec<&str> = tree.children(areas[0]).iter().map(|c| tree.node(*c).unwrap().id()).collect();
        assert_eq!(first, vec!["A1", "A3"]);
        assert_eq!(tree.children(areas[1]).len(), 1);
        assert_eq!(tree.agent_ids_under(root), vec!["A1", "A3", "A2"]);
    }

    #[test]
    fn test_post_order_puts_children_first() {
        let (tree, root) = division();
        let order = tree.post_order(root);

        assert_eq!(order.len(), tree.len());
        assert_eq!(*order.last().unwrap(), root);
        for (pos, id) in order.iter().enumerate() {
            for child in tree.children(*id) {
                let child_pos = order.iter().position(|o| o == child).unwrap();
                assert!(child_pos < pos);
            }
        }
    }

    #[test]
    fn test_area_tree_and_unknown_ids() {
        let (tree, root) = OrgTree::area(manager("AM01"), vec![agent("A1", "AM01")]);
        assert_eq!(tree.agent_ids_under(root), vec!["A1"]);
        assert!(tree.post_order(42).is_empty());
        assert!(tree.children(42).is_empty());
    }

    #[test]
    fn test_duplicate_agent_keeps_both_nodes() {
        let (tree, root) = OrgTree::area(manager("AM01"), vec![agent("A1", "AM01"), agent("A1", "AM01")]);
        let nodes = tree.agents_under(root);
        assert_eq!(nodes.len(), 2);
        assert_ne!(nodes[0].0, nodes[1].0);
        assert_eq!(tree.agent_ids_under(root), vec!["A1"]);
    }
}
