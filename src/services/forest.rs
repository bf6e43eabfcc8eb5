//! In-memory view of the category forest.
//!
//! Categories are kept in an arena (`Vec<Category>`) and linked by index, so a
//! corrupted parent chain can never produce a reference cycle. Every walk
//! carries a visited set and stops with [`ForestError::Cycle`] instead of
//! looping when the acyclic invariant has been broken by bad data.

use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

use crate::database::models::{Category, CategoryNode};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ForestError {
    #[error("category {0} not found")]
    NotFound(i32),

    #[error("category {0} is part of a parent cycle")]
    Cycle(i32),
}

#[derive(Debug, Clone, Default)]
pub struct CategoryForest {
    nodes: Vec<Category>,
    index: HashMap<i32, usize>,
    children: HashMap<i32, Vec<usize>>,
}

impl CategoryForest {
    pub fn new(categories: Vec<Category>) -> Self {
        let mut nodes = categories;
        nodes.sort_by_key(|c| c.category_id);
        nodes.dedup_by_key(|c| c.category_id);

        let index: HashMap<i32, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.category_id, i))
            .collect();

        // Nodes are sorted by id, so each child list comes out ordered too.
        let mut children: HashMap<i32, Vec<usize>> = HashMap::new();
        for (i, category) in nodes.iter().enumerate() {
            if let Some(parent) = category.parent_category_id {
                children.entry(parent).or_default().push(i);
            }
        }

        Self { nodes, index, children }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: i32) -> Option<&Category> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: i32) -> bool {
        self.index.contains_key(&id)
    }

    /// Direct children of `id`, ordered by id.
    pub fn children(&self, id: i32) -> Vec<&Category> {
        self.children
            .get(&id)
            .map(|kids| kids.iter().map(|&i| &self.nodes[i]).collect())
            .unwrap_or_default()
    }

    /// Walks parent links from `id` up to its root, nearest first. The
    /// starting category is the first element. A parent id that is missing
    /// from the forest ends the chain.
    pub fn lineage(&self, id: i32) -> Result<Vec<&Category>, ForestError> {
        let mut current = self.get(id).ok_or(ForestError::NotFound(id))?;
        let mut seen = HashSet::from([id]);
        let mut chain = vec![current];

        while let Some(parent_id) = current.parent_category_id {
            let Some(parent) = self.get(parent_id) else { break };
            if !seen.insert(parent_id) {
                return Err(ForestError::Cycle(parent_id));
            }
            chain.push(parent);
            current = parent;
        }

        Ok(chain)
    }

    /// Every category below `id`, including `id` itself, in breadth-first order.
    pub fn descendants(&self, id: i32) -> Result<Vec<&Category>, ForestError> {
        let order = self.walk(id, None)?;
        Ok(order.into_iter().map(|(i, _)| &self.nodes[i]).collect())
    }

    /// Materializes the subtree rooted at `id`, `depth` levels deep. Depth 0
    /// yields the bare node.
    pub fn subtree(&self, id: i32, depth: u32) -> Result<CategoryNode, ForestError> {
        let order = self.walk(id, Some(depth))?;

        // Assemble bottom-up: by the time a node is finished, all of its
        // (visited) children have already been built.
        let mut built: HashMap<i32, CategoryNode> = HashMap::with_capacity(order.len());
        for &(i, level) in order.iter().rev() {
            let category = &self.nodes[i];
            let mut node = CategoryNode::from(category.clone());
            if level < depth {
                node.children = self
                    .children
                    .get(&category.category_id)
                    .into_iter()
                    .flatten()
                    .filter_map(|&child| built.remove(&self.nodes[child].category_id))
                    .collect();
            }
            built.insert(category.category_id, node);
        }

        built.remove(&id).ok_or(ForestError::NotFound(id))
    }

    /// Breadth-first worklist from `id`, returning `(arena index, level)`
    /// pairs. Reaching a node twice means the parent links loop.
    fn walk(&self, id: i32, max_depth: Option<u32>) -> Result<Vec<(usize, u32)>, ForestError> {
        let start = *self.index.get(&id).ok_or(ForestError::NotFound(id))?;
        let mut seen = HashSet::from([id]);
        let mut order = Vec::new();
        let mut queue = VecDeque::from([(start, 0u32)]);

        while let Some((i, level)) = queue.pop_front() {
            order.push((i, level));
            if max_depth.is_some_and(|max| level >= max) {
                continue;
            }
            for &child in self.children.get(&self.nodes[i].category_id).into_iter().flatten() {
                let child_id = self.nodes[child].category_id;
                if !seen.insert(child_id) {
                    return Err(ForestError::Cycle(child_id));
                }
                queue.push_back((child, level + 1));
            }
        }

        Ok(order)
    }
}
