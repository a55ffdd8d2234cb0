//! The feature query engine.
//!
//! Turns route and query parameters into entities by asking the graph store,
//! then builds the entities from the returned records. Store URIs are mapped
//! to canonical API URIs here; nothing downstream sees a store URI except as
//! `source_uri`.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, error, instrument, warn};

use features_protocol::markdown::markdown_to_html;
use features_protocol::{
    ApiError, BboxFilter, Collection, CollectionList, ConformanceClass, ConformanceClasses,
    Feature, FeaturePage, LandingPage, PageWindow,
};
use graph_store::{FeatureRecord, GraphStore, QueryError, ResourceKind, ResourceRecord};

use crate::config::ServiceConfig;
use crate::negotiation::param;

/// Filter and window of an items request.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureQuery {
    pub bbox: Option<BboxFilter>,
    /// The `bbox` value as supplied, for navigation links.
    pub raw_bbox: Option<String>,
    pub window: PageWindow,
}

impl FeatureQuery {
    /// Classify `bbox` and build the page window. Both happen before any
    /// store access.
    pub fn from_params(params: &[(String, String)], max_page_size: usize) -> Result<Self, ApiError> {
        let raw_bbox = param(params, &["bbox"]).map(str::to_string);
        let bbox = raw_bbox.as_deref().map(BboxFilter::parse).transpose()?;
        Ok(Self {
            bbox,
            raw_bbox,
            window: window_from_params(params, max_page_size)?,
        })
    }
}

/// Page window from `page`, `per_page` and `limit`.
pub fn window_from_params(
    params: &[(String, String)],
    max_page_size: usize,
) -> Result<PageWindow, ApiError> {
    PageWindow::from_params(
        param(params, &["page"]),
        param(params, &["per_page"]),
        param(params, &["limit"]),
        max_page_size,
    )
}

/// Loads entities from a [`GraphStore`].
pub struct QueryEngine {
    store: Arc<dyn GraphStore>,
    base_url: String,
    api_title: String,
    api_description: Option<String>,
    max_page_size: usize,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn GraphStore>, config: &ServiceConfig) -> Self {
        Self {
            store,
            base_url: config.base_url.clone(),
            api_title: config.api_title.clone(),
            api_description: config.api_description.clone(),
            max_page_size: config.limits.max_page_size,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn max_page_size(&self) -> usize {
        self.max_page_size
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    /// Store reachability, for readiness checks.
    pub async fn ping(&self) -> Result<(), QueryError> {
        self.store.ping().await
    }

    /// The landing page, titled after the published dataset when the store
    /// declares one.
    #[instrument(skip(self))]
    pub async fn landing_page(&self) -> Result<LandingPage, ApiError> {
        let dataset = self.store.dataset().await.map_err(upstream("dataset"))?;
        let (title, description) = match dataset {
            Some(dataset) => (
                dataset.title.unwrap_or_else(|| self.api_title.clone()),
                dataset.description.or_else(|| self.api_description.clone()),
            ),
            None => (self.api_title.clone(), self.api_description.clone()),
        };
        Ok(LandingPage::new(
            &self.base_url,
            title,
            description.as_deref().map(markdown_to_html),
        ))
    }

    #[instrument(skip(self))]
    pub async fn conformance(&self) -> Result<ConformanceClasses, ApiError> {
        let targets = self
            .store
            .conformance_targets()
            .await
            .map_err(upstream("conformance"))?;
        let classes = targets
            .into_iter()
            .map(|t| ConformanceClass::new(t.uri, t.title))
            .collect();
        Ok(ConformanceClasses::new(&self.base_url, classes))
    }

    /// One page of the collections listing, each with its feature count.
    #[instrument(skip(self))]
    pub async fn collections(&self, window: PageWindow) -> Result<CollectionList, ApiError> {
        let records = self
            .store
            .collections()
            .await
            .map_err(upstream("collections"))?;
        let total = records.len();
        let page = window.slice(&records);

        let counts = try_join_all(page.iter().map(|r| self.store.count(&r.uri)))
            .await
            .map_err(upstream("count"))?;

        let collections = page
            .iter()
            .zip(counts)
            .map(|(record, count)| self.build_collection(record).with_feature_count(count))
            .collect();
        Ok(CollectionList::new(&self.base_url, collections, window, total))
    }

    #[instrument(skip(self))]
    pub async fn collection(&self, collection_id: &str) -> Result<Collection, ApiError> {
        let record = self.resolve_collection(collection_id).await?;
        let count = self
            .store
            .count(&record.uri)
            .await
            .map_err(upstream("count"))?;
        Ok(self.build_collection(&record).with_feature_count(count))
    }

    /// One page of a collection's features.
    ///
    /// The store returns the filtered candidate URIs; the window is applied to
    /// that list and only the page's URIs are described.
    #[instrument(skip(self, query), fields(bbox = query.bbox.as_ref().map(BboxFilter::kind_name)))]
    pub async fn features(
        &self,
        collection_id: &str,
        query: &FeatureQuery,
    ) -> Result<FeaturePage, ApiError> {
        let record = self.resolve_collection(collection_id).await?;
        let candidates = self
            .store
            .scan(&record.uri, query.bbox.as_ref())
            .await
            .map_err(upstream("scan"))?;
        let matched = candidates.len();
        let page = query.window.slice(&candidates);
        debug!(
            collection = collection_id,
            matched,
            returned = page.len(),
            "Scanned collection"
        );

        let described = try_join_all(page.iter().map(|uri| self.store.describe(uri)))
            .await
            .map_err(upstream("describe"))?;

        let mut features = Vec::with_capacity(described.len());
        for (uri, record) in page.iter().zip(described) {
            match record {
                Some(record) => features.push(self.build_feature(collection_id, record)),
                None => warn!(uri = %uri, "Scanned feature has no description"),
            }
        }

        let collection = self
            .build_collection(&record)
            .with_feature_count(matched)
            .with_features(features);
        Ok(FeaturePage::new(collection, query.window, query.raw_bbox.clone()))
    }

    /// One feature, which must be a member of the named collection.
    #[instrument(skip(self))]
    pub async fn feature(&self, collection_id: &str, item_id: &str) -> Result<Feature, ApiError> {
        let collection = self.resolve_collection(collection_id).await?;
        let not_found = || ApiError::FeatureNotFound {
            collection_id: collection_id.to_string(),
            item_id: item_id.to_string(),
        };

        let candidates = self
            .store
            .lookup(item_id, ResourceKind::Feature)
            .await
            .map_err(upstream("lookup"))?;
        let member = candidates
            .into_iter()
            .find(|r| r.is_member_of(&collection.uri))
            .ok_or_else(not_found)?;

        let record = self
            .store
            .describe(&member.uri)
            .await
            .map_err(upstream("describe"))?
            .ok_or_else(not_found)?;
        Ok(self.build_feature(collection_id, record))
    }

    async fn resolve_collection(&self, collection_id: &str) -> Result<ResourceRecord, ApiError> {
        self.store
            .lookup(collection_id, ResourceKind::Collection)
            .await
            .map_err(upstream("lookup"))?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::CollectionNotFound(collection_id.to_string()))
    }

    fn build_collection(&self, record: &ResourceRecord) -> Collection {
        let mut collection =
            Collection::new(&self.base_url, &record.identifier).with_source_uri(&record.uri);
        if let Some(title) = &record.title {
            collection = collection.with_title(title);
        }
        if let Some(description) = &record.description {
            collection = collection.with_description(description);
        }
        if let Some(extent) = &record.extent {
            collection = collection.with_extent(extent.clone());
        }
        collection
    }

    fn build_feature(&self, collection_id: &str, record: FeatureRecord) -> Feature {
        let mut feature = Feature::new(&self.base_url, collection_id, record.identifier)
            .with_source_uri(record.uri)
            .with_geometries(record.geometries);
        if let Some(title) = record.title {
            feature = feature.with_title(title);
        }
        if let Some(description) = record.description {
            feature = feature.with_description(description);
        }
        feature
    }
}

/// Log a store failure and hide it behind [`ApiError::Upstream`].
fn upstream(operation: &'static str) -> impl Fn(QueryError) -> ApiError {
    move |e| {
        error!(operation, error = %e, retryable = e.is_retryable(), "Graph store query failed");
        ApiError::Upstream(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{bbox, counts, shared_sample_store, BASE_URL};

    fn engine() -> QueryEngine {
        let config = ServiceConfig {
            base_url: BASE_URL.to_string(),
            ..Default::default()
        };
        QueryEngine::new(shared_sample_store(), &config)
    }

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn ids(page: &FeaturePage) -> Vec<&str> {
        page.features().iter().map(|f| f.id.as_str()).collect()
    }

    #[test]
    fn test_feature_query_classifies_before_fetch() {
        let query = FeatureQuery::from_params(&params(&[("bbox", "R1234"), ("limit", "3")]), 1000)
            .unwrap();
        assert_eq!(query.bbox.as_ref().map(BboxFilter::kind_name), Some("cell_id"));
        assert_eq!((query.window.start, query.window.end), (0, 3));

        let err = FeatureQuery::from_params(&params(&[("bbox", "not-a-bbox")]), 1000).unwrap_err();
        assert!(matches!(err, ApiError::InvalidBbox(_)));
    }

    #[test]
    fn test_window_rejects_non_numeric() {
        let err = window_from_params(&params(&[("page", "two")]), 1000).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_landing_page_uses_dataset_title() {
        let landing = engine().landing_page().await.unwrap();
        assert_eq!(landing.title, "Geofabric Sample");
        assert!(landing.description.unwrap().contains("<p>"));
    }

    #[tokio::test]
    async fn test_collections_carry_counts() {
        let list = engine().collections(PageWindow::default()).await.unwrap();
        assert_eq!(list.total, 2);
        assert_eq!(list.collections[0].id, "catch");
        assert_eq!(list.collections[0].feature_count, Some(counts::CATCH));
        assert_eq!(list.collections[0].uri, format!("{}/collections/catch", BASE_URL));
    }

    #[tokio::test]
    async fn test_first_page_of_five() {
        let query = FeatureQuery::from_params(&params(&[("per_page", "2"), ("page", "1")]), 1000)
            .unwrap();
        let page = engine().features("catch", &query).await.unwrap();
        assert_eq!(ids(&page), vec!["101", "102"]);
        assert_eq!(page.number_matched(), counts::CATCH);
    }

    #[tokio::test]
    async fn test_filtered_list_is_paged() {
        let query = FeatureQuery::from_params(
            &params(&[("bbox", bbox::ANTIMERIDIAN), ("per_page", "1"), ("page", "2")]),
            1000,
        )
        .unwrap();
        let page = engine().features("catch", &query).await.unwrap();
        assert_eq!(page.number_matched(), bbox::ANTIMERIDIAN_IDS.len());
        assert_eq!(ids(&page), vec![bbox::ANTIMERIDIAN_IDS[1]]);
    }

    #[tokio::test]
    async fn test_unknown_collection() {
        let err = engine()
            .features("nope", &FeatureQuery::from_params(&[], 1000).unwrap())
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::CollectionNotFound("nope".to_string()));
    }

    #[tokio::test]
    async fn test_feature_requires_membership() {
        let engine = engine();
        let catch = engine.feature("catch", "101").await.unwrap();
        let river = engine.feature("river", "101").await.unwrap();
        assert_ne!(catch.source_uri, river.source_uri);
        assert_eq!(catch.uri, format!("{}/collections/catch/item/101", BASE_URL));

        let err = engine.feature("catch", "201").await.unwrap_err();
        assert!(matches!(err, ApiError::FeatureNotFound { .. }));
        assert_eq!(err.status_code(), 404);
    }
}
