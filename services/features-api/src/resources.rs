//! The profiles, default profile and allowed parameters of each resource.

use features_protocol::profiles::OAI;
use features_protocol::{MediaType, Profile};

use crate::negotiation::ResourceProfiles;

const BASE_PARAMS: &[&str] = &["_profile", "_view", "_mediatype", "_format"];
const LIST_PARAMS: &[&str] = &[
    "_profile", "_view", "_mediatype", "_format", "page", "per_page", "limit",
];
const ITEMS_PARAMS: &[&str] = &[
    "_profile", "_view", "_mediatype", "_format", "page", "per_page", "limit", "bbox",
];

/// Declarations for every negotiated resource.
#[derive(Debug, Clone)]
pub struct Resources {
    pub landing: ResourceProfiles,
    pub conformance: ResourceProfiles,
    pub collections: ResourceProfiles,
    pub collection: ResourceProfiles,
    pub items: ResourceProfiles,
    pub item: ResourceProfiles,
}

impl Resources {
    pub fn new() -> Self {
        let json = [MediaType::Html, MediaType::Json];
        let geojson = [MediaType::Html, MediaType::Json, MediaType::GeoJson];
        Self {
            landing: ResourceProfiles::new(
                "landing",
                vec![Profile::oai(&json), Profile::dcat()],
                OAI,
                BASE_PARAMS,
            ),
            conformance: ResourceProfiles::new(
                "conformance",
                vec![Profile::oai(&json)],
                OAI,
                BASE_PARAMS,
            ),
            collections: ResourceProfiles::new(
                "collections",
                vec![Profile::oai(&json)],
                OAI,
                LIST_PARAMS,
            ),
            collection: ResourceProfiles::new(
                "collection",
                vec![Profile::oai(&json), Profile::geosp()],
                OAI,
                BASE_PARAMS,
            ),
            items: ResourceProfiles::new(
                "items",
                vec![Profile::oai(&geojson), Profile::geosp()],
                OAI,
                ITEMS_PARAMS,
            ),
            item: ResourceProfiles::new(
                "item",
                vec![Profile::oai(&geojson), Profile::geosp()],
                OAI,
                BASE_PARAMS,
            ),
        }
    }

    pub fn all(&self) -> [&ResourceProfiles; 6] {
        [
            &self.landing,
            &self.conformance,
            &self.collections,
            &self.collection,
            &self.items,
            &self.item,
        ]
    }
}

impl Default for Resources {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use features_protocol::profiles::{ALT, DCAT, GEOSP};

    #[test]
    fn test_every_resource_has_alt_and_default() {
        let resources = Resources::new();
        for resource in resources.all() {
            assert!(resource.get(ALT).is_some(), "{} lacks alt", resource.name);
            assert_eq!(resource.default_profile().token, OAI);
        }
    }

    #[test]
    fn test_profile_sets() {
        let resources = Resources::new();
        assert!(resources.landing.get(DCAT).is_some());
        assert!(resources.items.get(GEOSP).is_some());
        assert!(resources.collections.get(GEOSP).is_none());
        assert!(resources
            .item
            .get(OAI)
            .map(|p| p.supports(MediaType::GeoJson))
            .unwrap_or(false));
    }

    #[test]
    fn test_only_items_accept_bbox() {
        let resources = Resources::new();
        for resource in resources.all() {
            assert_eq!(
                resource.allowed_params.contains(&"bbox"),
                resource.name == "items"
            );
        }
        assert!(resources.collections.allowed_params.contains(&"limit"));
    }
}
