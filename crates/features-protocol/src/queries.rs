//! Query parameter parsing for list endpoints.
//!
//! Covers the `bbox` spatial filter, which accepts either WGS84 coordinates
//! or DGGS cell identifiers, and the `page`/`per_page`/`limit` window.

use geo::{coord, Rect};
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::media::MediaType;
use crate::types::{Link, RelType};

/// Default page number.
pub const DEFAULT_PAGE: usize = 1;
/// Default page size.
pub const DEFAULT_PER_PAGE: usize = 20;
/// Default upper bound for `per_page` and `limit`.
pub const DEFAULT_MAX_PAGE_SIZE: usize = 1000;

/// Longest digit suffix of a DGGS cell identifier.
const MAX_CELL_DIGITS: usize = 15;

/// A classified `bbox` parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum BboxFilter {
    /// `west,south,east,north` in WGS84 degrees. `west > east` crosses the antimeridian.
    Coords {
        west: f64,
        south: f64,
        east: f64,
        north: f64,
    },
    /// A single DGGS cell, e.g. `R1234`.
    CellId(String),
    /// Two DGGS cells, e.g. `R123,R456`.
    CellIds(String, String),
}

impl BboxFilter {
    /// Classify a raw `bbox` value.
    ///
    /// Shapes are tried in a fixed order: coordinates, one cell, two cells.
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        let value = raw.trim();
        let parts: Vec<&str> = value.split(',').map(str::trim).collect();

        if parts.len() == 4 && parts.iter().all(|p| is_signed_decimal(p)) {
            return Self::coords(&parts);
        }
        if parts.len() == 1 && is_cell_id(parts[0]) {
            return Ok(BboxFilter::CellId(parts[0].to_string()));
        }
        if parts.len() == 2 && parts.iter().all(|p| is_cell_id(p)) {
            return Ok(BboxFilter::CellIds(parts[0].to_string(), parts[1].to_string()));
        }

        Err(ApiError::InvalidBbox(raw.to_string()))
    }

    fn coords(parts: &[&str]) -> Result<Self, ApiError> {
        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(parts) {
            *slot = part
                .parse::<f64>()
                .map_err(|_| ApiError::InvalidBbox(parts.join(",")))?;
        }
        let [west, south, east, north] = values;

        for lon in [west, east] {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(ApiError::invalid_parameter(
                    "bbox",
                    format!("longitude {} is outside [-180, 180]", lon),
                ));
            }
        }
        for lat in [south, north] {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(ApiError::invalid_parameter(
                    "bbox",
                    format!("latitude {} is outside [-90, 90]", lat),
                ));
            }
        }
        if south > north {
            return Err(ApiError::invalid_parameter(
                "bbox",
                format!("south ({}) is greater than north ({})", south, north),
            ));
        }

        Ok(BboxFilter::Coords {
            west,
            south,
            east,
            north,
        })
    }

    /// The shape name: `coords`, `cell_id` or `cell_ids`.
    pub fn kind_name(&self) -> &'static str {
        match self {
            BboxFilter::Coords { .. } => "coords",
            BboxFilter::CellId(_) => "cell_id",
            BboxFilter::CellIds(_, _) => "cell_ids",
        }
    }

    /// Whether a coordinate box crosses the antimeridian.
    pub fn crosses_antimeridian(&self) -> bool {
        matches!(self, BboxFilter::Coords { west, east, .. } if west > east)
    }

    /// The coordinate box as one or two rectangles, split at 180 degrees.
    ///
    /// Empty for cell filters.
    pub fn rectangles(&self) -> Vec<Rect<f64>> {
        match *self {
            BboxFilter::Coords {
                west,
                south,
                east,
                north,
            } => {
                if west <= east {
                    vec![Rect::new(coord! { x: west, y: south }, coord! { x: east, y: north })]
                } else {
                    vec![
                        Rect::new(coord! { x: west, y: south }, coord! { x: 180.0, y: north }),
                        Rect::new(coord! { x: -180.0, y: south }, coord! { x: east, y: north }),
                    ]
                }
            }
            _ => Vec::new(),
        }
    }

    /// The cell tokens of a DGGS filter. Empty for coordinate boxes.
    pub fn cell_tokens(&self) -> Vec<&str> {
        match self {
            BboxFilter::CellId(cell) => vec![cell.as_str()],
            BboxFilter::CellIds(a, b) => vec![a.as_str(), b.as_str()],
            BboxFilter::Coords { .. } => Vec::new(),
        }
    }

    /// Coarse DGGS match: the serialized cell list contains any of the tokens.
    pub fn matches_cells(&self, dggs: &str) -> bool {
        self.cell_tokens().iter().any(|token| dggs.contains(token))
    }
}

fn is_signed_decimal(s: &str) -> bool {
    let digits = s.strip_prefix(|c: char| c == '-' || c == '+').unwrap_or(s);
    !digits.is_empty()
        && digits.chars().any(|c| c.is_ascii_digit())
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.matches('.').count() <= 1
}

fn is_cell_id(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            let rest = chars.as_str();
            rest.len() <= MAX_CELL_DIGITS && rest.chars().all(|c| c.is_ascii_digit())
        }
        _ => false,
    }
}

/// The slice of a result list requested by `page`/`per_page` or `limit`.
///
/// `limit` overrides paging and always yields `[0, limit)`; navigation then
/// treats the request as page 1 of `limit`-sized pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    pub page: usize,
    pub per_page: usize,
    pub limit: Option<usize>,
    pub start: usize,
    pub end: usize,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_PER_PAGE, None)
    }
}

impl PageWindow {
    /// Build a window from already-validated values.
    pub fn new(page: usize, per_page: usize, limit: Option<usize>) -> Self {
        match limit {
            Some(limit) => Self {
                page: 1,
                per_page: limit,
                limit: Some(limit),
                start: 0,
                end: limit,
            },
            None => {
                let start = page.saturating_sub(1).saturating_mul(per_page);
                Self {
                    page,
                    per_page,
                    limit: None,
                    start,
                    end: start.saturating_add(per_page),
                }
            }
        }
    }

    /// Validate raw query values and build the window.
    ///
    /// Every value must be a positive integer; `per_page` and `limit` may not
    /// exceed `max_page_size`.
    pub fn from_params(
        page: Option<&str>,
        per_page: Option<&str>,
        limit: Option<&str>,
        max_page_size: usize,
    ) -> Result<Self, ApiError> {
        let page = parse_positive("page", page, None)?.unwrap_or(DEFAULT_PAGE);
        let per_page =
            parse_positive("per_page", per_page, Some(max_page_size))?.unwrap_or(DEFAULT_PER_PAGE);
        let limit = parse_positive("limit", limit, Some(max_page_size))?;
        Ok(Self::new(page, per_page, limit))
    }

    /// Number of slots in the window.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply the window to a list. Windows past the end give an empty slice.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.start.min(items.len());
        let end = self.end.min(items.len());
        &items[start..end]
    }

    /// Last page number for `total` items; at least 1.
    pub fn last_page(&self, total: usize) -> usize {
        total.div_ceil(self.per_page.max(1)).max(1)
    }

    pub fn prev_page(&self) -> Option<usize> {
        (self.page > 1).then(|| self.page - 1)
    }

    pub fn next_page(&self, total: usize) -> Option<usize> {
        (self.page < self.last_page(total)).then(|| self.page + 1)
    }

    /// URL of another page of the same listing. `extra` parameters (such as
    /// `bbox`) are appended, encoded.
    pub fn page_href(&self, base: &str, page: usize, extra: &[(&str, &str)]) -> String {
        let mut href = format!("{}?page={}&per_page={}", base, page, self.per_page);
        for (key, value) in extra {
            let encoded: String = url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
            href.push_str(&format!("&{}={}", key, encoded));
        }
        href
    }

    /// `first`, `last` and, where they exist, `prev` and `next` links.
    pub fn nav_links(
        &self,
        base: &str,
        extra: &[(&str, &str)],
        total: usize,
        media_type: MediaType,
    ) -> Vec<Link> {
        let mut links = vec![
            Link::new(self.page_href(base, 1, extra), RelType::First)
                .with_type(media_type)
                .with_title("First page"),
            Link::new(self.page_href(base, self.last_page(total), extra), RelType::Last)
                .with_type(media_type)
                .with_title("Last page"),
        ];
        if let Some(prev) = self.prev_page() {
            links.push(
                Link::new(self.page_href(base, prev, extra), RelType::Prev)
                    .with_type(media_type)
                    .with_title("Previous page"),
            );
        }
        if let Some(next) = self.next_page(total) {
            links.push(
                Link::new(self.page_href(base, next, extra), RelType::Next)
                    .with_type(media_type)
                    .with_title("Next page"),
            );
        }
        links
    }
}

fn parse_positive(
    name: &str,
    raw: Option<&str>,
    max: Option<usize>,
) -> Result<Option<usize>, ApiError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value: usize = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::invalid_parameter(name, "it must be a positive integer"))?;
    if value == 0 {
        return Err(ApiError::invalid_parameter(name, "it must be a positive integer"));
    }
    if let Some(max) = max {
        if value > max {
            return Err(ApiError::invalid_parameter(
                name,
                format!("it must not exceed {}", max),
            ));
        }
    }
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_coords() {
        let bbox = BboxFilter::parse("160.6,-55.95,-170,-25.89").unwrap();
        assert_eq!(bbox.kind_name(), "coords");
        assert!(bbox.crosses_antimeridian());
        assert_eq!(bbox.rectangles().len(), 2);
    }

    #[test]
    fn test_classify_cells() {
        assert_eq!(BboxFilter::parse("R1234").unwrap(), BboxFilter::CellId("R1234".into()));
        assert_eq!(
            BboxFilter::parse("R123,R456").unwrap(),
            BboxFilter::CellIds("R123".into(), "R456".into())
        );
        assert_eq!(BboxFilter::parse("P").unwrap().kind_name(), "cell_id");
    }

    #[test]
    fn test_classify_rejects_other_shapes() {
        for raw in [
            "not-a-bbox",
            "r1234",
            "R1234567890123456",
            "1,2,3",
            "1,2,3,4,5",
            "R1,R2,R3",
            "1,2,x,4",
            "inf,0,1,1",
        ] {
            assert!(
                matches!(BboxFilter::parse(raw), Err(ApiError::InvalidBbox(_))),
                "{} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_coords_out_of_range() {
        let err = BboxFilter::parse("0,-95,10,10").unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter { .. }));
    }

    #[test]
    fn test_matches_cells_any_token() {
        let bbox = BboxFilter::parse("R123,S45").unwrap();
        assert!(bbox.matches_cells("R1234 R1235"));
        assert!(bbox.matches_cells("S456"));
        assert!(!bbox.matches_cells("Q1"));
    }

    #[test]
    fn test_window_from_page() {
        for (page, per_page) in [(1, 20), (2, 20), (3, 7), (10, 1)] {
            let window = PageWindow::new(page, per_page, None);
            assert_eq!(window.start, (page - 1) * per_page);
            assert_eq!(window.end, page * per_page);
        }
    }

    #[test]
    fn test_limit_overrides_paging() {
        let window = PageWindow::from_params(Some("4"), Some("50"), Some("7"), 1000).unwrap();
        assert_eq!((window.start, window.end), (0, 7));
        assert_eq!(window.page, 1);
        assert_eq!(window.per_page, 7);
    }

    #[test]
    fn test_from_params_defaults() {
        let window = PageWindow::from_params(None, None, None, 1000).unwrap();
        assert_eq!(window, PageWindow::default());
        assert_eq!((window.start, window.end), (0, 20));
    }

    #[test]
    fn test_from_params_rejects_bad_values() {
        assert!(PageWindow::from_params(Some("0"), None, None, 1000).is_err());
        assert!(PageWindow::from_params(Some("two"), None, None, 1000).is_err());
        assert!(PageWindow::from_params(None, Some("-3"), None, 1000).is_err());
        assert!(PageWindow::from_params(None, None, Some("1.5"), 1000).is_err());

        let err = PageWindow::from_params(None, Some("1001"), None, 1000).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("per_page"));
    }

    #[test]
    fn test_slice_past_end() {
        let items = [1, 2, 3, 4, 5];
        assert_eq!(PageWindow::new(1, 2, None).slice(&items), &[1, 2]);
        assert_eq!(PageWindow::new(3, 2, None).slice(&items), &[5]);
        assert!(PageWindow::new(4, 2, None).slice(&items).is_empty());
    }

    #[test]
    fn test_navigation() {
        let first = PageWindow::new(1, 2, None);
        assert_eq!(first.last_page(5), 3);
        assert_eq!(first.prev_page(), None);
        assert_eq!(first.next_page(5), Some(2));

        let last = PageWindow::new(3, 2, None);
        assert_eq!(last.prev_page(), Some(2));
        assert_eq!(last.next_page(5), None);

        assert_eq!(PageWindow::default().last_page(0), 1);
    }

    #[test]
    fn test_nav_links_keep_bbox() {
        let window = PageWindow::new(2, 2, None);
        let links = window.nav_links(
            "http://localhost:5000/collections/catch/items",
            &[("bbox", "R1,R2")],
            5,
            MediaType::Json,
        );
        let rels: Vec<RelType> = links.iter().map(|l| l.rel).collect();
        assert_eq!(rels, vec![RelType::First, RelType::Last, RelType::Prev, RelType::Next]);
        assert_eq!(
            links[3].href,
            "http://localhost:5000/collections/catch/items?page=3&per_page=2&bbox=R1%2CR2"
        );
    }
}
