//! # Registration-Side Tagging
//!
//! The only wire-level contract between registration and selection is the
//! `local-instance-id` metadata key. An instance started for local debugging
//! stamps it into its registration metadata exactly once, at startup, before
//! registering with the service registry.

use std::collections::HashMap;
use tracing::info;

use crate::core::config::IsolationConfig;
use crate::core::types::LOCAL_INSTANCE_METADATA_KEY;

/// Stamp the local-instance tag into registration metadata.
///
/// No-op when isolation is disabled, so production instances never carry
/// the key. Call once, before handing the metadata to the registry client.
pub fn apply_local_tag(metadata: &mut HashMap<String, String>, config: &IsolationConfig) {
    if !config.enabled {
        return;
    }
    metadata.insert(
        LOCAL_INSTANCE_METADATA_KEY.to_string(),
        config.local_instance_id.clone(),
    );
    info!(
        local_instance_id = %config.local_instance_id,
        "tagged registration metadata as local instance"
    );
}
