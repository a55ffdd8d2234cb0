//! Profile and media type negotiation.
//!
//! Each request is resolved against the resource's declared profiles in a
//! fixed order:
//!
//! 1. every query parameter must be on the resource's allow-list
//! 2. profile: `_profile` / `_view`, then `Accept-Profile`, then the default
//! 3. media type: `_mediatype` / `_format`, then `Accept`, then the
//!    profile's default media type

use axum::http::{header, HeaderMap, HeaderName};
use features_protocol::profiles::ALT;
use features_protocol::{ApiError, Link, MediaType, Profile, RelType};
use url::form_urlencoded;

/// `Accept-Profile` (RFC draft: content negotiation by profile).
pub const ACCEPT_PROFILE: HeaderName = HeaderName::from_static("accept-profile");
/// `Content-Profile`, the URI of the profile actually served.
pub const CONTENT_PROFILE: HeaderName = HeaderName::from_static("content-profile");

const PROF_PROFILE: &str = "http://www.w3.org/ns/dx/prof/Profile";

/// Parameters that select a representation rather than content.
pub const NEGOTIATION_PARAMS: &[&str] = &["_profile", "_view", "_mediatype", "_format"];

/// The profiles a resource declares, its default and its allowed parameters.
#[derive(Debug, Clone)]
pub struct ResourceProfiles {
    /// Resource name, used in logs and metrics.
    pub name: &'static str,
    /// Declared profiles; the `alt` profile is always last.
    pub profiles: Vec<Profile>,
    pub default_token: &'static str,
    pub allowed_params: &'static [&'static str],
}

impl ResourceProfiles {
    /// Declare a resource. The `alt` profile is added implicitly.
    pub fn new(
        name: &'static str,
        profiles: Vec<Profile>,
        default_token: &'static str,
        allowed_params: &'static [&'static str],
    ) -> Self {
        let mut profiles = profiles;
        if !profiles.iter().any(|p| p.token == ALT) {
            profiles.push(Profile::alt());
        }
        Self {
            name,
            profiles,
            default_token,
            allowed_params,
        }
    }

    pub fn get(&self, token: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.token == token)
    }

    /// Find a profile by token or by URI (with or without angle brackets).
    pub fn resolve(&self, token_or_uri: &str) -> Option<&Profile> {
        let value = token_or_uri.trim();
        let value = value
            .strip_prefix('<')
            .and_then(|v| v.strip_suffix('>'))
            .unwrap_or(value);
        self.profiles
            .iter()
            .find(|p| p.token == value || p.uri.trim_end_matches('/') == value.trim_end_matches('/'))
    }

    pub fn default_profile(&self) -> &Profile {
        match self.get(self.default_token) {
            Some(profile) => profile,
            None => &self.profiles[0],
        }
    }

    fn tokens(&self) -> String {
        self.profiles
            .iter()
            .map(|p| p.token)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// The outcome of negotiation.
#[derive(Debug, Clone, PartialEq)]
pub struct Negotiated {
    pub profile: Profile,
    pub media_type: MediaType,
}

impl Negotiated {
    pub fn token(&self) -> &'static str {
        self.profile.token
    }

    pub fn key(&self) -> (&'static str, MediaType) {
        (self.profile.token, self.media_type)
    }
}

/// Resolve profile and media type for a request.
pub fn negotiate(
    resource: &ResourceProfiles,
    params: &[(String, String)],
    headers: &HeaderMap,
) -> Result<Negotiated, ApiError> {
    check_allowed(resource, params)?;
    let profile = resolve_profile(resource, params, headers)?;
    let media_type = resolve_media_type(&profile, params, headers)?;
    Ok(Negotiated {
        profile,
        media_type,
    })
}

/// Fail on the first parameter not on the resource's allow-list.
pub fn check_allowed(resource: &ResourceProfiles, params: &[(String, String)]) -> Result<(), ApiError> {
    match params
        .iter()
        .find(|(name, _)| !resource.allowed_params.contains(&name.as_str()))
    {
        Some((name, _)) => Err(ApiError::ParameterNotAllowed {
            param: name.clone(),
            allowed: resource.allowed_params.join("', '"),
        }),
        None => Ok(()),
    }
}

/// First non-empty value of the first present parameter among `names`.
pub fn param<'a>(params: &'a [(String, String)], names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|wanted| {
        params
            .iter()
            .find(|(name, value)| name == wanted && !value.trim().is_empty())
            .map(|(_, value)| value.as_str())
    })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Result<Option<&'a str>, ApiError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|v| Some(v).filter(|v| !v.trim().is_empty()))
            .map_err(|_| ApiError::MalformedHeader {
                header: name.to_string(),
                message: "value is not visible ASCII".to_string(),
            }),
    }
}

fn resolve_profile(
    resource: &ResourceProfiles,
    params: &[(String, String)],
    headers: &HeaderMap,
) -> Result<Profile, ApiError> {
    if let Some(value) = param(params, &["_profile", "_view"]) {
        let entries = parse_weighted_list(value).map_err(|message| {
            ApiError::invalid_parameter("_profile", message)
        })?;
        return entries
            .iter()
            .filter(|(_, q)| *q > 0.0)
            .find_map(|(entry, _)| resource.resolve(entry))
            .cloned()
            .ok_or_else(|| ApiError::UnknownProfile {
                requested: value.to_string(),
                available: resource.tokens(),
            });
    }

    if let Some(value) = header_str(headers, &ACCEPT_PROFILE)? {
        let entries = parse_weighted_list(value).map_err(|message| ApiError::MalformedHeader {
            header: "Accept-Profile".to_string(),
            message,
        })?;
        if let Some(profile) = entries
            .iter()
            .filter(|(_, q)| *q > 0.0)
            .find_map(|(entry, _)| resource.resolve(entry))
        {
            return Ok(profile.clone());
        }
    }

    Ok(resource.default_profile().clone())
}

fn resolve_media_type(
    profile: &Profile,
    params: &[(String, String)],
    headers: &HeaderMap,
) -> Result<MediaType, ApiError> {
    let unsupported = |requested: &str| ApiError::UnsupportedMediaType {
        requested: requested.to_string(),
        profile: profile.token.to_string(),
        available: profile
            .media_types
            .iter()
            .map(MediaType::as_str)
            .collect::<Vec<_>>()
            .join(", "),
    };

    if let Some(value) = param(params, &["_mediatype", "_format"]) {
        return match MediaType::from_query_param(value) {
            Some(media_type) if profile.supports(media_type) => Ok(media_type),
            _ => Err(unsupported(value)),
        };
    }

    if let Some(value) = header_str(headers, &header::ACCEPT)? {
        let ranges = parse_accept(value)?;
        for (range, q) in &ranges {
            if *q <= 0.0 {
                continue;
            }
            if let Some(media_type) = match_range(profile, range) {
                return Ok(media_type);
            }
        }
    }

    Ok(profile.default_media_type)
}

/// Match one media range against a profile's media types.
fn match_range(profile: &Profile, range: &str) -> Option<MediaType> {
    if range == "*/*" {
        return Some(profile.default_media_type);
    }
    if let Some(top) = range.strip_suffix("/*") {
        if profile.default_media_type.top_level() == top {
            return Some(profile.default_media_type);
        }
        return profile
            .media_types
            .iter()
            .copied()
            .find(|m| m.top_level() == top);
    }
    MediaType::from_media_type(range).filter(|m| profile.supports(*m))
}

/// Parse an `Accept` header into `(media range, q)` pairs, highest `q`
/// first, ties in request order.
pub fn parse_accept(value: &str) -> Result<Vec<(String, f32)>, ApiError> {
    let malformed = |message: String| ApiError::MalformedHeader {
        header: "Accept".to_string(),
        message,
    };

    let mut ranges = Vec::new();
    for entry in value.split(',') {
        let mut parts = entry.split(';');
        let range = parts.next().unwrap_or("").trim().to_lowercase();
        if range.is_empty() {
            continue;
        }
        let valid_range = match range.split_once('/') {
            Some((top, sub)) => !top.is_empty() && !sub.is_empty() && !(top == "*" && sub != "*"),
            None => false,
        };
        if !valid_range {
            return Err(malformed(format!("'{}' is not a media range", range)));
        }
        let mut q = 1.0f32;
        for param in parts {
            if let Some((key, raw)) = param.split_once('=') {
                if key.trim().eq_ignore_ascii_case("q") {
                    q = parse_q(raw).map_err(malformed)?;
                }
            }
        }
        ranges.push((range, q));
    }
    ranges.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    Ok(ranges)
}

/// Parse a comma-separated, optionally weighted list of profile tokens or
/// `<uri>`s, as used by `_profile` and `Accept-Profile`.
///
/// Commas inside angle brackets do not split entries. Sorted by `q`,
/// highest first, ties in request order.
pub fn parse_weighted_list(value: &str) -> Result<Vec<(String, f32)>, String> {
    let mut entries = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut raw_entries = Vec::new();
    for (i, c) in value.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            ',' if depth == 0 => {
                raw_entries.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        if !(0..=1).contains(&depth) {
            return Err(format!("unbalanced angle brackets in '{}'", value));
        }
    }
    if depth != 0 {
        return Err(format!("unbalanced angle brackets in '{}'", value));
    }
    raw_entries.push(&value[start..]);

    for raw in raw_entries {
        let (item, params) = match raw.find('>') {
            Some(end) => (&raw[..=end], &raw[end + 1..]),
            None => match raw.split_once(';') {
                Some((item, params)) => (item, params),
                None => (raw, ""),
            },
        };
        let item = item.trim();
        if item.is_empty() || item == "<>" {
            continue;
        }
        let looks_like_uri = ["http:", "https:", "urn:"].iter().any(|s| item.contains(s));
        if looks_like_uri && !item.starts_with('<') {
            return Err(format!("the URI '{}' must be enclosed in angle brackets", item));
        }
        let mut q = 1.0f32;
        for param in params.split(';') {
            if let Some((key, raw_q)) = param.split_once('=') {
                if key.trim().eq_ignore_ascii_case("q") {
                    q = parse_q(raw_q)?;
                }
            }
        }
        entries.push((item.to_string(), q));
    }
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    Ok(entries)
}

fn parse_q(raw: &str) -> Result<f32, String> {
    let raw = raw.trim().trim_matches('"');
    match raw.parse::<f32>() {
        Ok(q) if (0.0..=1.0).contains(&q) => Ok(q),
        _ => Err(format!("'{}' is not a quality value between 0 and 1", raw)),
    }
}

/// The `Link` header for a negotiated response.
///
/// Advertises the active profile, the token of every profile, this
/// representation as `self` and every other (profile, media type) pair as
/// `alternate`.
pub fn link_header(
    resource: &ResourceProfiles,
    negotiated: &Negotiated,
    self_url: &str,
    params: &[(String, String)],
) -> String {
    let with_profile =
        |link: Link, profile: &Profile| format!("{}; profile=\"{}\"", link.to_header_value(), profile.uri);

    let mut links = vec![Link::new(negotiated.profile.uri, RelType::Profile).to_header_value()];
    for profile in &resource.profiles {
        links.push(format!(
            "{}; token=\"{}\"; anchor=<{}>",
            Link::new(PROF_PROFILE, RelType::Type).to_header_value(),
            profile.token,
            profile.uri
        ));
    }
    links.push(with_profile(
        Link::new(self_url, RelType::Self_).with_type(negotiated.media_type),
        &negotiated.profile,
    ));
    for profile in &resource.profiles {
        for media_type in &profile.media_types {
            if profile.token == negotiated.token() && *media_type == negotiated.media_type {
                continue;
            }
            let href = alternate_href(self_url, params, profile.token, *media_type);
            links.push(with_profile(
                Link::new(href, RelType::Alternate).with_type(*media_type),
                profile,
            ));
        }
    }
    links.join(", ")
}

/// URL of another representation of the current resource.
///
/// Content parameters (`page`, `bbox`, ...) are kept; negotiation parameters
/// are replaced.
pub fn alternate_href(
    self_url: &str,
    params: &[(String, String)],
    token: &str,
    media_type: MediaType,
) -> String {
    let base = self_url.split('?').next().unwrap_or(self_url);
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (name, value) in params {
        if !NEGOTIATION_PARAMS.contains(&name.as_str()) {
            query.append_pair(name, value);
        }
    }
    query.append_pair("_profile", token);
    query.append_pair("_mediatype", media_type.as_str());
    format!("{}?{}", base, query.finish())
}
