use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::BTreeMap;

/// Decoded body returned by the flow service. Opaque and vendor-defined.
pub type FlowRunResult = serde_json::Value;

/// Per-node configuration overrides, keyed by flow node id
/// (e.g. `"ChatInput-S6UmW"`). An empty override object means "no change".
pub type Tweaks = BTreeMap<String, serde_json::Map<String, serde_json::Value>>;

/// True when at least one node carries a non-empty override.
pub fn has_overrides(tweaks: &Tweaks) -> bool {
    tweaks.values().any(|o| !o.is_empty())
}

/// Body of `POST /lf/{service_id}/api/v1/run/{flow_id}`.
///
/// `tweaks` is only serialized when it carries real overrides, so with the
/// default (all-empty) map the body is exactly `{ "input_value": ... }`.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFlowRequest {
    pub input_value: String,
    #[serde(default)]
    pub tweaks: Option<Tweaks>,
}

impl RunFlowRequest {
    pub fn new(input_value: impl Into<String>, tweaks: &Tweaks) -> Self {
        Self {
            input_value: input_value.into(),
            tweaks: has_overrides(tweaks).then(|| tweaks.clone()),
        }
    }
}
