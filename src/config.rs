#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Size of one grid cell in world pixels.
    pub grid_size: i32,
    /// Width of the tool panel on the left edge. Nothing is ever placed over it.
    pub panel_width: i32,
    /// Maximum number of snapshots kept for undo/redo.
    pub history_limit: usize,
    /// Cap on settle passes for one evaluation.
    pub max_iterations: usize,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            grid_size: 20,
            panel_width: 160,
            history_limit: 50,
            max_iterations: 1000,
            min_zoom: 0.25,
            max_zoom: 4.0,
        }
    }
}
