// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Indexes [`Stage`] implementations by `step_name`.

use std::collections::HashMap;
use std::sync::Arc;

use mimir_domain::MimirError;

use crate::stage::Stage;

#[derive(Default)]
pub struct StageRegistry {
    stages: HashMap<String, Arc<dyn Stage>>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, stage: Arc<dyn Stage>) {
        self.stages.insert(stage.step_name().to_string(), stage);
    }

    pub fn get(&self, step_name: &str) -> Result<Arc<dyn Stage>, MimirError> {
        self.stages.get(step_name).cloned().ok_or_else(|| MimirError::plugin_not_found(format!("stage '{step_name}'")))
    }
}
