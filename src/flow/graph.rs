// SPDX-License-Identifier: MIT

//! Graph definition and build-time validation
//!
//! A `GraphSpec` collects the step registry and the edge table; `build`
//! validates the combination into an immutable `Graph` that can be shared
//! (behind an `Arc`) and executed across many runs.

use std::collections::HashMap;
use std::sync::Arc;

use super::error::BuildError;
use super::state::StateRecord;
use super::step::StepBody;

/// Terminal marker. Distinct from all step ids; routing here ends the run.
pub const END: &str = "__end__";

/// Router function for conditional transitions. Must be a pure function of
/// the current state: no external calls, no mutation.
pub type RouterFn = Arc<dyn Fn(&StateRecord) -> String + Send + Sync>;

/// Outgoing transition rule for a step
#[derive(Clone)]
pub enum Transition {
    /// Fixed destination: a step id or [END]
    To(String),
    /// Computed destination, constrained to an explicit allow-list
    Conditional { select: RouterFn, allowed: Vec<String> },
}

pub(crate) struct Node {
    pub(crate) body: Arc<dyn StepBody>,
    pub(crate) transition: Transition,
}

/// Unvalidated step registry + edge table
pub struct GraphSpec {
    entry: String,
    steps: Vec<(String, Arc<dyn StepBody>)>,
    edges: HashMap<String, Transition>,
}

impl GraphSpec {
    pub fn new(entry: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
            steps: Vec::new(),
            edges: HashMap::new(),
        }
    }

    /// Register a step body under an id
    pub fn add_step(mut self, id: impl Into<String>, body: Arc<dyn StepBody>) -> Self {
        self.steps.push((id.into(), body));
        self
    }

    /// Unconditional transition from one step to another (or to [END])
    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.insert(from.into(), Transition::To(to.into()));
        self
    }

    /// Transition from a step straight to the terminal marker
    pub fn edge_to_end(self, from: impl Into<String>) -> Self {
        self.edge(from, END)
    }

    /// Conditional transition: `select` computes the destination from the
    /// state; the result must be a member of `allowed`.
    pub fn conditional_edge<F>(
        mut self,
        from: impl Into<String>,
        allowed: Vec<String>,
        select: F,
    ) -> Self
    where
        F: Fn(&StateRecord) -> String + Send + Sync + 'static,
    {
        self.edges.insert(
            from.into(),
            Transition::Conditional {
                select: Arc::new(select),
                allowed,
            },
        );
        self
    }

    /// Validate the registry + edge table into an executable graph.
    /// Side-effect-free; two graphs built from the same definition execute
    /// identically.
    pub fn build(self) -> Result<Graph, BuildError> {
        let mut nodes: HashMap<String, Node> = HashMap::new();

        for (id, body) in self.steps {
            // The terminal marker is reserved and never a valid step id
            if id == END || nodes.contains_key(&id) {
                return Err(BuildError::DuplicateStepId(id));
            }
            nodes.insert(
                id,
                Node {
                    body,
                    // Placeholder; replaced below once edges are checked
                    transition: Transition::To(END.to_string()),
                },
            );
        }

        if !nodes.contains_key(&self.entry) {
            return Err(BuildError::UnknownEntry(self.entry));
        }

        let step_ids: Vec<String> = nodes.keys().cloned().collect();
        let known = |dest: &str| dest == END || nodes.contains_key(dest);

        for id in &step_ids {
            let transition = self
                .edges
                .get(id)
                .ok_or_else(|| BuildError::DanglingStep(id.clone()))?;

            let destinations: Vec<&String> = match transition {
                Transition::To(dest) => vec![dest],
                Transition::Conditional { allowed, .. } => allowed.iter().collect(),
            };
            for dest in destinations {
                if !known(dest) {
                    return Err(BuildError::UnknownDestination {
                        step: id.clone(),
                        dest: dest.clone(),
                    });
                }
            }
        }

        for (id, transition) in self.edges {
            if let Some(node) = nodes.get_mut(&id) {
                node.transition = transition;
            }
            // Edges from unregistered ids are inert; destinations were
            // already checked against the registry above.
        }

        Ok(Graph {
            entry: self.entry,
            nodes,
        })
    }
}

/// A validated, immutable workflow graph. Cycles are allowed by design
/// (retry loops); the executor enforces the loop bound at run time.
pub struct Graph {
    pub(crate) entry: String,
    pub(crate) nodes: HashMap<String, Node>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("entry", &self.entry)
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Graph {
    /// The entry step id
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Number of registered steps
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
