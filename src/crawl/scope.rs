// src/crawl/scope.rs
// =============================================================================
// Decides which links belong to the site being crawled.
//
// The domain is the host of the seed URL. Two policies are supported:
// - Contains (default): the link's host contains the domain anywhere.
//   "blog.foo.com" is in scope for "foo.com", but so is "notfoo.com".
// - Subdomain: the host is the domain itself or ends with ".<domain>".
//
// Rust concepts:
// - ValueEnum: clap turns the enum into a `--scope contains|subdomain` flag
// - Option combinators: is_some_and instead of a nested match
// =============================================================================

use clap::ValueEnum;
use url::Url;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ScopePolicy {
    /// Host contains the seed domain as a substring
    #[default]
    Contains,
    /// Host equals the seed domain or is one of its subdomains
    Subdomain,
}

#[derive(Debug, Clone)]
pub struct DomainScope {
    domain: String,
    policy: ScopePolicy,
}

impl DomainScope {
    // URLs without a host (mailto:, javascript:, ...) scope as the empty string
    pub fn for_seed(seed: &Url, policy: ScopePolicy) -> Self {
        Self {
            domain: seed.host_str().unwrap_or_default().to_ascii_lowercase(),
            policy,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn contains(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        match self.policy {
            ScopePolicy::Contains => host.contains(self.domain.as_str()),
            ScopePolicy::Subdomain => {
                host == self.domain
                    || host
                        .strip_suffix(self.domain.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }
        }
    }
}
