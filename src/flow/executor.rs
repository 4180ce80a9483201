// SPDX-License-Identifier: MIT

//! Workflow run-loop
//!
//! Drives a built [Graph] from its entry step to the terminal marker:
//! invoke the current step, merge its update, resolve the outgoing
//! transition, repeat. Execution is strictly sequential within one run.
//! Cycles are permitted, so every run carries a step bound; each iteration
//! costs a real external-service call and an unguarded loop would retry
//! forever on a verdict that never turns compliant.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::error::RunError;
use super::graph::{Graph, Transition, END};
use super::state::StateRecord;

/// Per-run execution options
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Maximum number of step invocations before the run fails with
    /// `LoopLimitExceeded`
    pub max_steps: u32,
    /// Optional deadline, checked once per loop iteration between steps
    pub deadline: Option<Instant>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            // Two full corrective passes through a six-step graph
            max_steps: 12,
            deadline: None,
        }
    }
}

/// Progress events emitted during a run (consumed by the SSE endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunEvent {
    StepStarted { step: String },
    StepCompleted { step: String },
    Routed { from: String, to: String },
    Completed,
    Failed { message: String },
}

impl Graph {
    /// Execute the graph to termination on the given initial state.
    /// Returns the final state once the terminal marker is reached, or the
    /// first fatal outcome.
    pub async fn run(
        &self,
        initial: StateRecord,
        options: &RunOptions,
    ) -> Result<StateRecord, RunError> {
        self.run_inner(initial, options, None).await
    }

    /// Like [Graph::run], but emits [RunEvent]s on the channel as steps
    /// start, complete, and route. Send failures are ignored; a dropped
    /// receiver never aborts the run.
    pub async fn run_with_events(
        &self,
        initial: StateRecord,
        options: &RunOptions,
        events: mpsc::Sender<RunEvent>,
    ) -> Result<StateRecord, RunError> {
        self.run_inner(initial, options, Some(&events)).await
    }

    async fn run_inner(
        &self,
        initial: StateRecord,
        options: &RunOptions,
        events: Option<&mpsc::Sender<RunEvent>>,
    ) -> Result<StateRecord, RunError> {
        let run_id = Uuid::new_v4();
        let mut state = initial;
        let mut current = self.entry.clone();
        let mut steps: u32 = 0;

        log::info!(
            "[{}] starting run at '{}' (max {} steps)",
            run_id,
            current,
            options.max_steps
        );

        while current != END {
            if steps >= options.max_steps {
                log::error!(
                    "[{}] loop limit reached after {} steps at '{}'",
                    run_id,
                    steps,
                    current
                );
                let err = RunError::LoopLimitExceeded {
                    step: current,
                    steps,
                };
                emit_failure(events, &err).await;
                return Err(err);
            }

            if let Some(deadline) = options.deadline {
                if Instant::now() >= deadline {
                    log::warn!("[{}] deadline expired before '{}'", run_id, current);
                    let err = RunError::Cancelled { step: current };
                    emit_failure(events, &err).await;
                    return Err(err);
                }
            }

            // Destinations are validated at build time, so the lookup
            // cannot miss
            let node = &self.nodes[&current];

            log::info!("[{}] executing step '{}'", run_id, current);
            emit(
                events,
                RunEvent::StepStarted {
                    step: current.clone(),
                },
            )
            .await;

            let update = match node.body.invoke(&state).await {
                Ok(update) => update,
                Err(source) => {
                    log::error!("[{}] step '{}' failed: {}", run_id, current, source);
                    let err = RunError::Step {
                        step: current,
                        source,
                    };
                    emit_failure(events, &err).await;
                    return Err(err);
                }
            };
            state.merge(update);

            emit(
                events,
                RunEvent::StepCompleted {
                    step: current.clone(),
                },
            )
            .await;

            let next = match &node.transition {
                Transition::To(dest) => dest.clone(),
                Transition::Conditional { select, allowed } => {
                    let got = select(&state);
                    if !allowed.contains(&got) {
                        log::error!(
                            "[{}] router at '{}' returned '{}' outside {:?}",
                            run_id,
                            current,
                            got,
                            allowed
                        );
                        let err = RunError::InvalidRouterOutcome {
                            step: current,
                            got,
                            allowed: allowed.clone(),
                        };
                        emit_failure(events, &err).await;
                        return Err(err);
                    }
                    got
                }
            };

            log::info!("[{}] '{}' -> '{}'", run_id, current, next);
            emit(
                events,
                RunEvent::Routed {
                    from: current,
                    to: next.clone(),
                },
            )
            .await;

            current = next;
            steps += 1;
        }

        log::info!("[{}] run completed after {} steps", run_id, steps);
        emit(events, RunEvent::Completed).await;
        Ok(state)
    }
}

async fn emit(events: Option<&mpsc::Sender<RunEvent>>, event: RunEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}

async fn emit_failure(events: Option<&mpsc::Sender<RunEvent>>, err: &RunError) {
    emit(
        events,
        RunEvent::Failed {
            message: err.to_string(),
        },
    )
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::error::StepError;
    use crate::flow::graph::GraphSpec;
    use crate::flow::state::StateUpdate;
    use crate::flow::step::StepBody;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Writes a fixed (key, value) pair and counts its invocations
    struct RecordingStep {
        name: String,
        key: String,
        value: Value,
        calls: Arc<AtomicU32>,
    }

    impl RecordingStep {
        fn new(name: &str, key: &str, value: Value) -> (Arc<Self>, Arc<AtomicU32>) {
            let calls = Arc::new(AtomicU32::new(0));
            (
                Arc::new(Self {
                    name: name.to_string(),
                    key: key.to_string(),
                    value,
                    calls: calls.clone(),
                }),
                calls,
            )
        }
    }

    #[async_trait]
    impl StepBody for RecordingStep {
        fn name(&self) -> &str {
            &self.name
        }

        async fn invoke(&self, _state: &StateRecord) -> Result<StateUpdate, StepError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut update = StateUpdate::new();
            update.insert(self.key.clone(), self.value.clone());
            Ok(update)
        }
    }

    struct FailingStep;

    #[async_trait]
    impl StepBody for FailingStep {
        fn name(&self) -> &str {
            "failing"
        }

        async fn invoke(&self, _state: &StateRecord) -> Result<StateUpdate, StepError> {
            Err(StepError::service("upstream", "boom"))
        }
    }

    #[tokio::test]
    async fn test_acyclic_graph_runs_each_step_once() {
        let (a, a_calls) = RecordingStep::new("a", "out_a", json!("A"));
        let (b, b_calls) = RecordingStep::new("b", "out_b", json!("B"));
        let (c, c_calls) = RecordingStep::new("c", "out_c", json!("C"));

        let graph = GraphSpec::new("a")
            .add_step("a", a)
            .add_step("b", b)
            .add_step("c", c)
            .edge("a", "b")
            .edge("b", "c")
            .edge_to_end("c")
            .build()
            .unwrap();

        let state = graph
            .run(StateRecord::new(), &RunOptions::default())
            .await
            .unwrap();

        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
        assert_eq!(c_calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.get("out_a"), Some(&json!("A")));
        assert_eq!(state.get("out_c"), Some(&json!("C")));
    }

    #[tokio::test]
    async fn test_conditional_loop_until_flag_set() {
        // "work" counts passes; the router loops back until two passes ran
        let (work, _) = RecordingStep::new("work", "touched", json!(true));
        let passes = Arc::new(AtomicU32::new(0));
        let router_passes = passes.clone();

        let graph = GraphSpec::new("work")
            .add_step("work", work)
            .conditional_edge(
                "work",
                vec!["work".to_string(), END.to_string()],
                move |_state| {
                    if router_passes.fetch_add(1, Ordering::SeqCst) < 1 {
                        "work".to_string()
                    } else {
                        END.to_string()
                    }
                },
            )
            .build()
            .unwrap();

        let result = graph.run(StateRecord::new(), &RunOptions::default()).await;
        assert!(result.is_ok());
        assert_eq!(passes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalid_router_outcome_fails_run() {
        let (a, _) = RecordingStep::new("a", "out", json!(1));
        let (b, b_calls) = RecordingStep::new("b", "out_b", json!(2));

        let graph = GraphSpec::new("a")
            .add_step("a", a)
            .add_step("b", b)
            .conditional_edge("a", vec!["b".to_string()], |_state| "rogue".to_string())
            .edge_to_end("b")
            .build()
            .unwrap();

        let err = graph
            .run(StateRecord::new(), &RunOptions::default())
            .await
            .unwrap_err();

        match err {
            RunError::InvalidRouterOutcome { step, got, allowed } => {
                assert_eq!(step, "a");
                assert_eq!(got, "rogue");
                assert_eq!(allowed, vec!["b".to_string()]);
            }
            other => panic!("expected InvalidRouterOutcome, got {:?}", other),
        }
        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_loop_limit_exceeded() {
        let (spin, calls) = RecordingStep::new("spin", "out", json!(1));

        let graph = GraphSpec::new("spin")
            .add_step("spin", spin)
            .edge("spin", "spin")
            .build()
            .unwrap();

        let options = RunOptions {
            max_steps: 5,
            deadline: None,
        };
        let err = graph.run(StateRecord::new(), &options).await.unwrap_err();

        match err {
            RunError::LoopLimitExceeded { step, steps } => {
                assert_eq!(step, "spin");
                assert_eq!(steps, 5);
            }
            other => panic!("expected LoopLimitExceeded, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_expired_deadline_cancels_before_first_step() {
        let (a, calls) = RecordingStep::new("a", "out", json!(1));
        let graph = GraphSpec::new("a")
            .add_step("a", a)
            .edge_to_end("a")
            .build()
            .unwrap();

        let options = RunOptions {
            max_steps: 12,
            deadline: Some(Instant::now() - std::time::Duration::from_secs(1)),
        };
        let err = graph.run(StateRecord::new(), &options).await.unwrap_err();

        assert!(matches!(err, RunError::Cancelled { step } if step == "a"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_step_failure_halts_run() {
        let (after, after_calls) = RecordingStep::new("after", "out", json!(1));
        let graph = GraphSpec::new("bad")
            .add_step("bad", Arc::new(FailingStep))
            .add_step("after", after)
            .edge("bad", "after")
            .edge_to_end("after")
            .build()
            .unwrap();

        let err = graph
            .run(StateRecord::new(), &RunOptions::default())
            .await
            .unwrap_err();

        match err {
            RunError::Step { step, source } => {
                assert_eq!(step, "bad");
                assert!(matches!(source, StepError::Service { .. }));
            }
            other => panic!("expected Step, got {:?}", other),
        }
        assert_eq!(after_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_events_emitted_in_order() {
        let (a, _) = RecordingStep::new("a", "out_a", json!(1));
        let (b, _) = RecordingStep::new("b", "out_b", json!(2));
        let graph = GraphSpec::new("a")
            .add_step("a", a)
            .add_step("b", b)
            .edge("a", "b")
            .edge_to_end("b")
            .build()
            .unwrap();

        let (tx, mut rx) = mpsc::channel(32);
        graph
            .run_with_events(StateRecord::new(), &RunOptions::default(), tx)
            .await
            .unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        let completed: Vec<String> = events
            .iter()
            .filter_map(|e| match e {
                RunEvent::StepCompleted { step } => Some(step.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(completed, vec!["a".to_string(), "b".to_string()]);
        assert!(matches!(events.last(), Some(RunEvent::Completed)));
    }

    #[tokio::test]
    async fn test_later_updates_overwrite_earlier_ones() {
        let (first, _) = RecordingStep::new("first", "value", json!("old"));
        let (second, _) = RecordingStep::new("second", "value", json!("new"));
        let graph = GraphSpec::new("first")
            .add_step("first", first)
            .add_step("second", second)
            .edge("first", "second")
            .edge_to_end("second")
            .build()
            .unwrap();

        let state = graph
            .run(StateRecord::new(), &RunOptions::default())
            .await
            .unwrap();
        assert_eq!(state.get("value"), Some(&json!("new")));
    }
}
