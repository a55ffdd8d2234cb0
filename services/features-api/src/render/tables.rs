//! The render table of every resource.

use anyhow::{bail, Result};

use features_protocol::profiles::{DCAT, GEOSP, OAI};
use features_protocol::{
    Collection, CollectionList, ConformanceClasses, Feature, FeaturePage, LandingPage, Link,
    MediaType,
};

use crate::render::html::escape;
use crate::render::{RenderTable, Renderable};
use crate::resources::Resources;

impl Renderable for LandingPage {
    fn title(&self) -> String {
        self.title.clone()
    }

    fn links(&self) -> &[Link] {
        &self.links
    }

    fn description_html(&self) -> Option<String> {
        self.description.clone()
    }
}

impl Renderable for ConformanceClasses {
    fn title(&self) -> String {
        "Conformance".to_string()
    }

    fn links(&self) -> &[Link] {
        &self.links
    }
}

impl Renderable for CollectionList {
    fn title(&self) -> String {
        "Collections".to_string()
    }

    fn links(&self) -> &[Link] {
        &self.links
    }
}

impl Renderable for Collection {
    fn title(&self) -> String {
        self.title.clone().unwrap_or_else(|| self.id.clone())
    }

    fn links(&self) -> &[Link] {
        &self.links
    }

    fn description_html(&self) -> Option<String> {
        self.description.clone()
    }
}

impl Renderable for FeaturePage {
    fn title(&self) -> String {
        format!("{} items", self.collection.title())
    }

    fn links(&self) -> &[Link] {
        &self.links
    }
}

impl Renderable for Feature {
    fn title(&self) -> String {
        self.title.clone().unwrap_or_else(|| self.id.clone())
    }

    fn links(&self) -> &[Link] {
        &self.links
    }

    /// Feature descriptions are plain text.
    fn description_html(&self) -> Option<String> {
        self.description
            .as_deref()
            .map(|text| format!("<p>{}</p>", escape(text)))
    }
}

/// Render tables for all resources.
pub struct Renderers {
    pub landing: RenderTable<LandingPage>,
    pub conformance: RenderTable<ConformanceClasses>,
    pub collections: RenderTable<CollectionList>,
    pub collection: RenderTable<Collection>,
    pub items: RenderTable<FeaturePage>,
    pub item: RenderTable<Feature>,
}

impl Renderers {
    pub fn new() -> Self {
        Self {
            landing: RenderTable::<LandingPage>::new("landing page")
                .with_html(OAI, "landing", |l| Ok(l.to_json()))
                .with_json(OAI, MediaType::Json, |l| Ok(l.to_json()))
                .with_graph(DCAT, LandingPage::to_graph)
                .with_alt(),
            conformance: RenderTable::<ConformanceClasses>::new("conformance")
                .with_html(OAI, "conformance", |c| Ok(c.to_json()))
                .with_json(OAI, MediaType::Json, |c| Ok(c.to_json()))
                .with_alt(),
            collections: RenderTable::<CollectionList>::new("collections")
                .with_html(OAI, "collections", |c| Ok(c.to_json()))
                .with_json(OAI, MediaType::Json, |c| Ok(c.to_json()))
                .with_alt(),
            collection: RenderTable::<Collection>::new("collection")
                .with_html(OAI, "collection", |c| Ok(c.to_json()))
                .with_json(OAI, MediaType::Json, |c| Ok(c.to_json()))
                .with_graph(GEOSP, Collection::to_graph)
                .with_alt(),
            items: RenderTable::<FeaturePage>::new("items")
                .with_html(OAI, "items", |p| Ok(p.to_json()))
                .with_json(OAI, MediaType::Json, |p| Ok(p.to_json()))
                .with_json(OAI, MediaType::GeoJson, FeaturePage::to_geojson)
                .with_graph(GEOSP, FeaturePage::to_graph)
                .with_alt(),
            item: RenderTable::<Feature>::new("item")
                .with_html(OAI, "item", |f| Ok(f.to_json()))
                .with_json(OAI, MediaType::Json, |f| Ok(f.to_json()))
                .with_json(OAI, MediaType::GeoJson, Feature::to_geojson)
                .with_graph(GEOSP, Feature::to_graph)
                .with_alt(),
        }
    }

    /// Fail unless every declared (profile, media type) pair of every
    /// resource has a serializer.
    pub fn validate(&self, resources: &Resources) -> Result<()> {
        let gaps = [
            ("landing", self.landing.missing(&resources.landing)),
            ("conformance", self.conformance.missing(&resources.conformance)),
            ("collections", self.collections.missing(&resources.collections)),
            ("collection", self.collection.missing(&resources.collection)),
            ("items", self.items.missing(&resources.items)),
            ("item", self.item.missing(&resources.item)),
        ];
        let gaps: Vec<String> = gaps
            .into_iter()
            .filter(|(_, missing)| !missing.is_empty())
            .map(|(name, missing)| format!("{}: {}", name, missing.join(", ")))
            .collect();
        if !gaps.is_empty() {
            bail!("render tables are incomplete ({})", gaps.join("; "));
        }
        Ok(())
    }
}

impl Default for Renderers {
    fn default() -> Self {
        Self::new()
    }
}
