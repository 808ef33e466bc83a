// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step-kind → executor lookup

use crate::executor::StepExecutor;
use atlas_core::StepKind;
use std::collections::HashMap;
use std::sync::Arc;

/// Pure lookup table from step kind to executor. Read-only after
/// construction; the orchestrator holds it behind an `Arc`.
#[derive(Default)]
pub struct ExecutorRegistry {
    executors: HashMap<StepKind, Arc<dyn StepExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an executor under its own kind, replacing any previous one.
    pub fn register(&mut self, executor: Arc<dyn StepExecutor>) {
        self.executors.insert(executor.kind(), executor);
    }

    pub fn get(&self, kind: StepKind) -> Option<&Arc<dyn StepExecutor>> {
        self.executors.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.executors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
