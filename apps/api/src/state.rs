use std::sync::Arc;

use crate::compile::engine::EngineKind;
use crate::compile::validate::DenyList;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Denylist of dangerous LaTeX constructs, built once at startup.
    pub deny_list: Arc<DenyList>,
    /// TeX engine detected at startup. `None` means every compile request
    /// fails fast with `EngineUnavailable`.
    pub engine: Option<EngineKind>,
    /// Outbound HTTP client for the analysis webhook relay.
    pub http: reqwest::Client,
}
