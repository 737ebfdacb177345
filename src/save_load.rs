use crate::{component::WorkspaceComponent, error::Result, workspace::Workspace};

/// Encode a component list in the exchange layout used by the backend.
pub fn to_json(components: &[WorkspaceComponent]) -> Result<String> {
    Ok(serde_json::to_string_pretty(components)?)
}

/// Decode a component list. `value` may be missing; it is recomputed anyway.
pub fn from_json(json: &str) -> Result<Vec<WorkspaceComponent>> {
    Ok(serde_json::from_str(json)?)
}

impl Workspace {
    pub fn save_json(&self) -> Result<String> {
        to_json(&self.snapshot())
    }

    /// Replace the workspace contents with a saved circuit.
    ///
    /// On a parse error the workspace is left untouched.
    pub fn load_json(&mut self, json: &str) -> Result<()> {
        let components = from_json(json)?;
        self.load(&components);
        log::info!("Loaded circuit with {} components", components.len());
        Ok(())
    }
}
