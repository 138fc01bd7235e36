// src/scraper/job_id.rs
use url::Url;

pub const JOB_VIEW_BASE: &str = "https://www.linkedin.com/jobs/view/";
pub const JOB_LINK_SELECTOR: &str = "a[href*='/jobs/view/']";

/// Bare job id from a job link: the last path segment before any query
/// string, with or without a trailing slash.
///
/// `https://www.linkedin.com/jobs/view/4083475215/?refId=x` → `4083475215`
pub fn job_id_from_href(href: &str) -> Option<String> {
    let path = href.split(['?', '#']).next()?;
    let rest = path.split_once("/jobs/view/")?.1;
    let id = rest.trim_end_matches('/').rsplit('/').next()?.trim();
    if id.is_empty() {
        return None;
    }
    Some(id.to_string())
}

pub fn canonical_job_url(job_id: &str) -> String {
    format!("{}{}/", JOB_VIEW_BASE, job_id)
}

/// Keep only the `geoId` and `keywords` parameters of a search URL copied
/// from the browser.
pub fn format_job_search_url(raw_url: &str) -> anyhow::Result<String> {
    let mut url = Url::parse(raw_url)?;
    let param = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default()
    };
    let geo_id = param("geoId");
    let keywords = param("keywords");

    url.set_fragment(None);
    url.query_pairs_mut()
        .clear()
        .append_pair("geoId", &geo_id)
        .append_pair("keywords", &keywords);
    Ok(url.to_string())
}

/// The search URL with its `start` offset set to `offset`.
pub fn search_page_url(search_url: &str, offset: usize) -> anyhow::Result<String> {
    let mut url = Url::parse(search_url)?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "start")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("start", &offset.to_string());
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_from_href_variants() {
        assert_eq!(
            job_id_from_href("https://www.linkedin.com/jobs/view/4083475215/?refId=abc&trk=x"),
            Some("4083475215".to_string())
        );
        assert_eq!(
            job_id_from_href("/jobs/view/123456/"),
            Some("123456".to_string())
        );
        assert_eq!(
            job_id_from_href("https://www.linkedin.com/jobs/view/987"),
            Some("987".to_string())
        );
        assert_eq!(job_id_from_href("https://www.linkedin.com/jobs/view/"), None);
        assert_eq!(job_id_from_href("https://www.linkedin.com/feed/"), None);
    }

    #[test]
    fn test_canonical_url_roundtrip() {
        for href in [
            "https://www.linkedin.com/jobs/view/4083475215/?refId=abc",
            "https://www.linkedin.com/jobs/view/4083475215/",
            "/jobs/view/4083475215/?eBP=CwEAAAG",
        ] {
            let id = job_id_from_href(href).unwrap();
            let canonical = canonical_job_url(&id);
            assert_eq!(canonical, "https://www.linkedin.com/jobs/view/4083475215/");
            assert_eq!(job_id_from_href(&canonical).as_deref(), Some(id.as_str()));
        }
    }

    #[test]
    fn test_format_job_search_url_keeps_geo_and_keywords() {
        let raw = "https://www.linkedin.com/jobs/search/?currentJobId=4083475215&f_E=3%2C4%2C5&geoId=104738515&keywords=Senior%20Analyst&origin=JOB_SEARCH_PAGE_JOB_FILTER&refresh=true&sortBy=R";
        let formatted = format_job_search_url(raw).unwrap();
        assert_eq!(
            formatted,
            "https://www.linkedin.com/jobs/search/?geoId=104738515&keywords=Senior+Analyst"
        );
    }

    #[test]
    fn test_format_job_search_url_missing_params() {
        let formatted = format_job_search_url("https://www.linkedin.com/jobs/search/?f_JT=F").unwrap();
        assert_eq!(formatted, "https://www.linkedin.com/jobs/search/?geoId=&keywords=");
    }

    #[test]
    fn test_search_page_url_replaces_start() {
        let base = "https://www.linkedin.com/jobs/search/?geoId=1&keywords=Rust&start=25";
        assert_eq!(
            search_page_url(base, 50).unwrap(),
            "https://www.linkedin.com/jobs/search/?geoId=1&keywords=Rust&start=50"
        );
        assert_eq!(
            search_page_url("https://www.linkedin.com/jobs/search/?geoId=1", 0).unwrap(),
            "https://www.linkedin.com/jobs/search/?geoId=1&start=0"
        );
    }
}
