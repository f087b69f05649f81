//! Robot exclusion policy resolved once per crawl.
//!
//! The policy is built from the status code and body of the seed's
//! `/robots.txt` response and consulted per-URL during admission. Status
//! handling follows the de facto contract most crawlers implement: a
//! missing file means everything is allowed, an auth wall means nothing
//! is, and a server error means the answer is unknown and registration
//! fails.
//!
//! A parsed body additionally goes through group resolution: it only
//! yields a policy when some group applies to the configured user agent.
//! A group-less or non-matching file resolves to no policy at all, and
//! the caller abandons the registration without an error.

use reqwest::StatusCode;
use robotstxt::{parse_robotstxt, DefaultMatcher, RobotsParseHandler};
use url::Url;

use crate::error::{CrawlError, Result};

/// Per-crawl robots.txt policy for the configured user agent.
#[derive(Debug, Clone)]
pub(crate) enum RobotsPolicy {
    AllowAll,
    DenyAll,
    Rules { body: String, agent: String },
}

impl RobotsPolicy {
    /// Builds a policy from the `/robots.txt` response.
    ///
    /// 2xx parses the body and resolves the group for `agent`; `Ok(None)`
    /// means no group applies and the crawl must not be registered.
    /// 401/403 denies everything; any other 4xx (including 404) allows
    /// everything; 5xx fails the registration.
    pub(crate) fn from_response(
        status: StatusCode,
        body: String,
        agent: &str,
    ) -> Result<Option<Self>> {
        if status.is_success() {
            if !has_matching_group(&body, agent) {
                return Ok(None);
            }
            return Ok(Some(RobotsPolicy::Rules {
                body,
                agent: agent.to_string(),
            }));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(Some(RobotsPolicy::DenyAll));
        }
        if status.is_client_error() {
            return Ok(Some(RobotsPolicy::AllowAll));
        }
        Err(CrawlError::RobotsStatus(status))
    }

    /// Whether the policy permits fetching `url`.
    pub(crate) fn allows(&self, url: &Url) -> bool {
        match self {
            RobotsPolicy::AllowAll => true,
            RobotsPolicy::DenyAll => false,
            RobotsPolicy::Rules { body, agent } => {
                DefaultMatcher::default().one_agent_allowed_by_robots(body, agent, url.as_str())
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn allow_all() -> Self {
        RobotsPolicy::AllowAll
    }
}

/// Collects the group names a robots.txt body declares.
#[derive(Default)]
struct GroupSniffer {
    agents: Vec<String>,
}

impl RobotsParseHandler for GroupSniffer {
    fn handle_robots_start(&mut self) {}

    fn handle_robots_end(&mut self) {}

    fn handle_user_agent(&mut self, _line_num: u32, user_agent: &str) {
        self.agents.push(user_agent.trim().to_lowercase());
    }

    fn handle_allow(&mut self, _line_num: u32, _value: &str) {}

    fn handle_disallow(&mut self, _line_num: u32, _value: &str) {}

    fn handle_sitemap(&mut self, _line_num: u32, _value: &str) {}

    fn handle_unknown_action(&mut self, _line_num: u32, _action: &str, _value: &str) {}
}

/// Whether `body` declares a group applying to `agent`.
///
/// Mirrors the prefix lookup robots libraries use: a group applies when
/// its name is `*` or a case-insensitive prefix of the agent string.
fn has_matching_group(body: &str, agent: &str) -> bool {
    let mut sniffer = GroupSniffer::default();
    parse_robotstxt(body, &mut sniffer);

    let agent = agent.to_lowercase();
    sniffer
        .agents
        .iter()
        .any(|group| group == "*" || (!group.is_empty() && agent.starts_with(group.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGENT: &str = "GoCrawler/v0.1 (+https://github.com/q/gocrawler)";

    fn policy(body: &str) -> RobotsPolicy {
        RobotsPolicy::from_response(StatusCode::OK, body.to_string(), AGENT)
            .unwrap()
            .expect("body declares a matching group")
    }

    #[test]
    fn disallowed_prefix_is_rejected_for_wildcard_agent() {
        let policy = policy("User-agent: *\nDisallow: /private");
        assert!(!policy.allows(&Url::parse("https://example.com/private/page").unwrap()));
        assert!(policy.allows(&Url::parse("https://example.com/public").unwrap()));
    }

    #[test]
    fn named_group_matches_the_agent_by_prefix() {
        let policy = policy("User-agent: GoCrawler\nDisallow: /private");
        assert!(!policy.allows(&Url::parse("https://example.com/private").unwrap()));
        assert!(policy.allows(&Url::parse("https://example.com/open").unwrap()));
    }

    #[test]
    fn group_less_body_resolves_to_no_policy() {
        let resolved =
            RobotsPolicy::from_response(StatusCode::OK, String::new(), AGENT).unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn non_matching_group_resolves_to_no_policy() {
        let body = "User-agent: SomeOtherBot\nDisallow: /\n".to_string();
        let resolved = RobotsPolicy::from_response(StatusCode::OK, body, AGENT).unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn missing_file_allows_everything() {
        let policy = RobotsPolicy::from_response(StatusCode::NOT_FOUND, String::new(), AGENT)
            .unwrap()
            .expect("status outcomes skip group resolution");
        assert!(policy.allows(&Url::parse("https://example.com/anything").unwrap()));
    }

    #[test]
    fn auth_walled_file_denies_everything() {
        let policy = RobotsPolicy::from_response(StatusCode::FORBIDDEN, String::new(), AGENT)
            .unwrap()
            .expect("status outcomes skip group resolution");
        assert!(!policy.allows(&Url::parse("https://example.com/anything").unwrap()));
    }

    #[test]
    fn server_error_fails_registration() {
        let err = RobotsPolicy::from_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            String::new(),
            AGENT,
        )
        .unwrap_err();
        assert!(matches!(err, CrawlError::RobotsStatus(_)));
    }
}
