//! Learning resources card

use crate::effects::Effect;
use crate::protocol::{Resource, ResourcesPayload};

pub const EMPTY_RESOURCES: &str = "No resources found for this query.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcesCard {
    pub query: String,
    pub resources: Vec<Resource>,
}

impl From<ResourcesPayload> for ResourcesCard {
    fn from(payload: ResourcesPayload) -> Self {
        Self {
            query: payload.query,
            resources: payload.resources,
        }
    }
}

impl ResourcesCard {
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Open the resource at `index` (zero-based) in a new browsing context
    pub fn open(&self, index: usize) -> Option<Effect> {
        self.resources
            .get(index)
            .map(|resource| Effect::OpenUrl(resource.url.clone()))
    }
}
