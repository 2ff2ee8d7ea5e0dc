use std::path::PathBuf;

/// Options for turning a source file into a [`crate::design::Design`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportOptions {
    /// Top module passed to `hierarchy -top`.
    pub top: Option<String>,
    pub flatten: bool,
    /// Extra yosys commands run after `proc`.
    pub other_steps: Vec<String>,
    /// Explicit yosys binary; looked up on `PATH` otherwise.
    pub yosys: Option<PathBuf>,
}

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_top(mut self, top: &str) -> Self {
        self.top = Some(top.to_string());
        self
    }

    pub fn with_flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    pub fn with_step(mut self, step: &str) -> Self {
        self.other_steps.push(step.to_string());
        self
    }

    pub fn with_yosys(mut self, yosys: PathBuf) -> Self {
        self.yosys = Some(yosys);
        self
    }
}
