//! Configuration for building and optimizing an organization.

/// Parameters of the navigation model and its optimization loop.
#[derive(Debug, Clone)]
pub struct OrgConfig {
    /// Branching penalty in the softmax transition. The per-child
    /// coefficient is `gamma / n` for a node with n children, so wide
    /// nodes get a softer distribution. Typical range `[1, 30]`.
    pub gamma: f64,
    /// Relative-improvement cutoff on the windowed mean of effectiveness.
    pub termination_threshold: f64,
    /// Number of recent iterations averaged by the termination test.
    pub termination_window: usize,
    /// Hard upper bound on optimization iterations.
    pub max_iters: usize,
}

impl Default for OrgConfig {
    fn default() -> Self {
        Self {
            gamma: 30.0,
            termination_threshold: 1e-9,
            termination_window: 1000,
            max_iters: 1750,
        }
    }
}

impl OrgConfig {
    /// Create a configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the branching penalty.
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Set the termination threshold.
    pub fn with_termination_threshold(mut self, threshold: f64) -> Self {
        self.termination_threshold = threshold;
        self
    }

    /// Set the termination window size.
    pub fn with_termination_window(mut self, window: usize) -> Self {
        self.termination_window = window;
        self
    }

    /// Set the iteration cap.
    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }
}
