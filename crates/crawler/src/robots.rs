use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

use crate::client::FetchClient;

// Per-host robots.txt cache. Policies are fetched on first access and
// shared read-only across workers. A missing or broken robots.txt never
// blocks crawling: it degrades to allow-all with no crawl delay.
pub struct RobotsCache {
    client: Arc<FetchClient>,
    cache: RwLock<HashMap<String, CachedPolicy>>,
    user_agent: String,
    ttl: Option<Duration>,
}

struct CachedPolicy {
    policy: Arc<RobotsPolicy>,
    fetched_at: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    rules: Vec<RobotsRule>,
    crawl_delay: Option<Duration>,
}

#[derive(Debug, Clone)]
struct RobotsRule {
    pattern: String,
    allow: bool,
}

impl RobotsCache {
    pub fn new(client: Arc<FetchClient>, user_agent: String) -> Self {
        Self {
            client,
            cache: RwLock::new(HashMap::new()),
            user_agent,
            // None = cache for the lifetime of the run.
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub async fn policy_for(&self, url: &Url) -> Arc<RobotsPolicy> {
        let key = url.origin().ascii_serialization();

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&key) {
                let fresh = match self.ttl {
                    Some(ttl) => cached.fetched_at.elapsed() < ttl,
                    None => true,
                };
                if fresh {
                    debug!("robots.txt cache hit for {}", key);
                    return cached.policy.clone();
                }
            }
        }

        let policy = Arc::new(self.fetch_policy(url).await);

        let mut cache = self.cache.write().await;
        cache.insert(
            key,
            CachedPolicy {
                policy: policy.clone(),
                fetched_at: Instant::now(),
            },
        );
        policy
    }

    async fn fetch_policy(&self, url: &Url) -> RobotsPolicy {
        let mut robots_url = url.clone();
        robots_url.set_path("/robots.txt");
        robots_url.set_query(None);
        robots_url.set_fragment(None);

        debug!("fetching {}", robots_url);
        match self.client.fetch_text(&robots_url).await {
            Ok((200, body)) => RobotsPolicy::parse(&body, &self.user_agent),
            Ok((status, _)) => {
                debug!("robots.txt at {} returned {}, allowing all", robots_url, status);
                RobotsPolicy::default()
            }
            Err(e) => {
                warn!("failed to fetch {}: {}, allowing all", robots_url, e);
                RobotsPolicy::default()
            }
        }
    }
}

impl RobotsPolicy {
    // Parse the directive groups and keep the rules of the group whose
    // user-agent token best matches ours; wildcard groups apply when no
    // specific group does.
    pub fn parse(content: &str, user_agent: &str) -> Self {
        struct Group {
            agents: Vec<String>,
            rules: Vec<RobotsRule>,
            crawl_delay: Option<Duration>,
        }

        let mut groups: Vec<Group> = Vec::new();
        let mut in_agent_run = false;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let Some((directive, value)) = line.split_once(':') else {
                continue;
            };
            let directive = directive.trim().to_ascii_lowercase();
            let value = value.trim();

            match directive.as_str() {
                "user-agent" => {
                    // Consecutive user-agent lines share one group.
                    if !in_agent_run || groups.is_empty() {
                        groups.push(Group {
                            agents: Vec::new(),
                            rules: Vec::new(),
                            crawl_delay: None,
                        });
                    }
                    in_agent_run = true;
                    if let Some(group) = groups.last_mut() {
                        group.agents.push(value.to_ascii_lowercase());
                    }
                }
                "disallow" | "allow" => {
                    in_agent_run = false;
                    if value.is_empty() {
                        continue;
                    }
                    if let Some(group) = groups.last_mut() {
                        group.rules.push(RobotsRule {
                            pattern: value.to_string(),
                            allow: directive == "allow",
                        });
                    }
                }
                "crawl-delay" => {
                    in_agent_run = false;
                    if let (Some(group), Ok(secs)) = (groups.last_mut(), value.parse::<f64>()) {
                        if secs >= 0.0 {
                            group.crawl_delay = Some(Duration::from_secs_f64(secs));
                        }
                    }
                }
                _ => {
                    in_agent_run = false;
                }
            }
        }

        let ua = user_agent.to_ascii_lowercase();
        // Best match: the longest agent token contained in our UA string,
        // falling back to "*" groups.
        let mut best_len: Option<usize> = None;
        for group in &groups {
            for agent in &group.agents {
                if agent != "*" && ua.contains(agent.as_str()) {
                    let len = agent.len();
                    if best_len.map_or(true, |b| len > b) {
                        best_len = Some(len);
                    }
                }
            }
        }

        let mut policy = RobotsPolicy::default();
        for group in &groups {
            let selected = match best_len {
                Some(len) => group
                    .agents
                    .iter()
                    .any(|a| a != "*" && a.len() == len && ua.contains(a.as_str())),
                None => group.agents.iter().any(|a| a == "*"),
            };
            if selected {
                policy.rules.extend(group.rules.iter().cloned());
                if group.crawl_delay.is_some() {
                    policy.crawl_delay = group.crawl_delay;
                }
            }
        }
        policy
    }

    // Longest matching pattern wins; a tie between Allow and Disallow of
    // equal length goes to Disallow.
    pub fn is_allowed(&self, path: &str) -> bool {
        let mut verdict = true;
        let mut best_len = 0usize;
        for rule in &self.rules {
            if pattern_matches(path, &rule.pattern) {
                let len = rule.pattern.len();
                if len > best_len || (len == best_len && !rule.allow) {
                    best_len = len;
                    verdict = rule.allow;
                }
            }
        }
        verdict
    }

    pub fn crawl_delay(&self) -> Duration {
        self.crawl_delay.unwrap_or(Duration::ZERO)
    }
}

// robots.txt patterns support * (any sequence) and a trailing $ (end
// anchor); anything else is a prefix match.
fn pattern_matches(path: &str, pattern: &str) -> bool {
    if let Some(anchored) = pattern.strip_suffix('$') {
        return wildcard_match(path, anchored, true);
    }
    wildcard_match(path, pattern, false)
}

fn wildcard_match(path: &str, pattern: &str, anchored: bool) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    let mut pos = 0usize;

    for (i, part) in parts.iter().enumerate() {
        if i == 0 {
            if !path[pos..].starts_with(part) {
                return false;
            }
            pos += part.len();
        } else if i == parts.len() - 1 {
            if anchored {
                return path[pos..].ends_with(part);
            }
            if part.is_empty() {
                return true;
            }
            match path[pos..].find(part) {
                Some(found) => pos += found + part.len(),
                None => return false,
            }
        } else if !part.is_empty() {
            match path[pos..].find(part) {
                Some(found) => pos += found + part.len(),
                None => return false,
            }
        }
    }

    if anchored && parts.len() == 1 {
        return path == pattern;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specific_agent_overrides_wildcard() {
        let robots = "\
User-agent: *
Disallow: /admin/

User-agent: TestBot
Disallow: /test/
Crawl-delay: 2
";
        let policy = RobotsPolicy::parse(robots, "TestBot/1.0");
        assert!(policy.is_allowed("/admin/users"));
        assert!(!policy.is_allowed("/test/page"));
        assert_eq!(policy.crawl_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_wildcard_group_applies_when_no_specific_match() {
        let robots = "\
User-agent: OtherBot
Disallow: /

User-agent: *
Disallow: /private/
";
        let policy = RobotsPolicy::parse(robots, "TestBot/1.0");
        assert!(policy.is_allowed("/public"));
        assert!(!policy.is_allowed("/private/data"));
    }

    #[test]
    fn test_longest_prefix_wins() {
        let robots = "\
User-agent: *
Disallow: /private/
Allow: /private/public/
";
        let policy = RobotsPolicy::parse(robots, "TestBot");
        assert!(!policy.is_allowed("/private/data"));
        assert!(policy.is_allowed("/private/public/info"));
    }

    #[test]
    fn test_tie_favors_disallow() {
        let robots = "\
User-agent: *
Allow: /page
Disallow: /page
";
        let policy = RobotsPolicy::parse(robots, "TestBot");
        assert!(!policy.is_allowed("/page"));
    }

    #[test]
    fn test_wildcard_and_anchor_patterns() {
        let robots = "\
User-agent: *
Disallow: /*.json$
Disallow: /tmp*/
";
        let policy = RobotsPolicy::parse(robots, "TestBot");
        assert!(!policy.is_allowed("/data/export.json"));
        assert!(policy.is_allowed("/data/export.jsonl"));
        assert!(!policy.is_allowed("/tmp123/file"));
    }

    #[test]
    fn test_empty_robots_allows_everything() {
        let policy = RobotsPolicy::parse("", "TestBot");
        assert!(policy.is_allowed("/anything"));
        assert_eq!(policy.crawl_delay(), Duration::ZERO);
    }

    #[test]
    fn test_fractional_crawl_delay() {
        let robots = "User-agent: *\nCrawl-delay: 0.5\n";
        let policy = RobotsPolicy::parse(robots, "TestBot");
        assert_eq!(policy.crawl_delay(), Duration::from_millis(500));
    }
}
