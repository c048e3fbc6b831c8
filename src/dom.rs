use super::*;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag_name: String,
    pub(crate) attrs: HashMap<String, String>,
    pub(crate) value: String,
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) node_type: NodeType,
}

/// Arena-backed document tree. Ids are indexed at build time; the first
/// element carrying an id wins, matching `getElementById`.
#[derive(Debug, Clone)]
pub struct Dom {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) id_index: HashMap<String, NodeId>,
}

impl Dom {
    pub(crate) fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            node_type: NodeType::Document,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            id_index: HashMap::new(),
        }
    }

    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    fn create_node(&mut self, parent: NodeId, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            node_type,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: String,
        attrs: HashMap<String, String>,
    ) -> NodeId {
        let element_id = attrs.get("id").cloned();
        let node = self.create_node(
            parent,
            NodeType::Element(Element {
                tag_name,
                attrs,
                value: String::new(),
            }),
        );
        if let Some(element_id) = element_id {
            self.id_index.entry(element_id).or_insert(node);
        }
        node
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.create_node(parent, NodeType::Text(text))
    }

    pub(crate) fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub(crate) fn tag_name(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0].node_type {
            NodeType::Element(element) => Some(element.tag_name.as_str()),
            _ => None,
        }
    }

    pub(crate) fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.nodes[node.0].node_type {
            NodeType::Element(element) => element.attrs.get(name).cloned(),
            _ => None,
        }
    }

    pub(crate) fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).copied()
    }

    pub(crate) fn is_form_control(&self, node: NodeId) -> bool {
        self.tag_name(node)
            .is_some_and(|tag| tag == "input" || tag == "textarea")
    }

    /// Current value of an input or textarea. Anything else is a type
    /// mismatch; plain elements carry no value property here.
    pub(crate) fn control_value(&self, node: NodeId) -> Result<String> {
        if !self.is_form_control(node) {
            return Err(self.value_type_mismatch(node));
        }
        match &self.nodes[node.0].node_type {
            NodeType::Element(element) => Ok(element.value.clone()),
            _ => Err(self.value_type_mismatch(node)),
        }
    }

    /// Direct property write, not an event. Replaces the whole value
    /// (last write wins).
    pub(crate) fn set_value(&mut self, node: NodeId, value: &str) -> Result<()> {
        if !self.is_form_control(node) {
            return Err(self.value_type_mismatch(node));
        }
        if let NodeType::Element(element) = &mut self.nodes[node.0].node_type {
            element.value = value.to_string();
        }
        Ok(())
    }

    fn value_type_mismatch(&self, node: NodeId) -> Error {
        Error::TypeMismatch {
            target: self.describe_node(node),
            expected: "input or textarea".into(),
            actual: self
                .tag_name(node)
                .map(str::to_string)
                .unwrap_or_else(|| "non-element".into()),
        }
    }

    /// Label for traces and errors: `input#pw`, `div`, `#document`, `#text`.
    pub(crate) fn describe_node(&self, node: NodeId) -> String {
        match &self.nodes[node.0].node_type {
            NodeType::Document => "#document".to_string(),
            NodeType::Text(_) => "#text".to_string(),
            NodeType::Element(element) => match element.attrs.get("id") {
                Some(id) => format!("{}#{}", element.tag_name, id),
                None => element.tag_name.clone(),
            },
        }
    }

    pub(crate) fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        if let NodeType::Text(text) = &self.nodes[node.0].node_type {
            out.push_str(text);
        }
        for child in &self.nodes[node.0].children {
            self.collect_text(*child, out);
        }
    }

    /// Seed control values after parsing: inputs from their `value`
    /// attribute, textareas from their text content.
    pub(crate) fn initialize_form_control_values(&mut self) {
        for index in 0..self.nodes.len() {
            let node = NodeId(index);
            let tag = match &self.nodes[index].node_type {
                NodeType::Element(element) => element.tag_name.clone(),
                _ => continue,
            };
            let initial = if tag == "input" {
                self.attr(node, "value")
            } else if tag == "textarea" {
                Some(self.text_content(node))
            } else {
                None
            };
            if let Some(initial) = initial {
                if let NodeType::Element(element) = &mut self.nodes[index].node_type {
                    element.value = initial;
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn all_form_control_values(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (index, node) in self.nodes.iter().enumerate() {
            if let NodeType::Element(element) = &node.node_type {
                if self.is_form_control(NodeId(index)) {
                    out.push((self.describe_node(NodeId(index)), element.value.clone()));
                }
            }
        }
        out
    }
}
