//! Hosting platform integration.
//!
//! The [`Connector`] trait is the narrow contract commands use to work with
//! proposals (pull/merge requests). Provider differences are a data table:
//! host names, token keys, and URL shapes. The HTTP transport itself is an
//! external collaborator injected by whoever constructs a connector; the
//! tests use scripted connectors.

use serde::{Deserialize, Serialize};

use crate::config::full::FullConfig;
use crate::config::keys::Key;
use crate::config::values::HostingPlatform;
use crate::core::branch::LocalBranchName;
use crate::errors::Result;

/// A proposal (pull request / merge request) at the hosting platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub number: u64,
    pub title: String,
    pub source: LocalBranchName,
    pub target: LocalBranchName,
    pub url: String,
}

pub trait Connector {
    fn find_proposal(
        &self,
        branch: &LocalBranchName,
        target: &LocalBranchName,
    ) -> Result<Option<Proposal>>;

    fn squash_merge_proposal(&self, number: u64, commit_message: Option<&str>) -> Result<()>;

    fn update_proposal_target(&self, number: u64, new_target: &LocalBranchName) -> Result<()>;

    fn default_proposal_message(&self, proposal: &Proposal) -> String {
        format!("{} (#{})", proposal.title, proposal.number)
    }
}

/// Origin URL broken into the parts the provider table needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForgeUrl {
    pub host: String,
    /// `org/repo`, without the `.git` suffix.
    pub path: String,
}

/// Parse the common shapes of git remote URLs:
/// `git@host:org/repo.git`, `ssh://git@host/org/repo`, and
/// `https://host/org/repo.git`.
pub fn parse_forge_url(url: &str) -> Option<ForgeUrl> {
    let url = url.trim();
    let without_scheme = if let Some(rest) = url.split_once("://").map(|(_, rest)| rest) {
        rest
    } else if let Some((user_host, path)) = url.split_once(':') {
        // scp-like syntax: git@host:org/repo.git
        return build_forge_url(user_host, path);
    } else {
        return None;
    };
    let (host, path) = without_scheme.split_once('/')?;
    build_forge_url(host, path)
}

fn build_forge_url(user_host: &str, path: &str) -> Option<ForgeUrl> {
    let host = user_host
        .rsplit_once('@')
        .map(|(_, host)| host)
        .unwrap_or(user_host);
    let path = path.trim_matches('/').trim_end_matches(".git");
    if host.is_empty() || path.is_empty() {
        return None;
    }
    Some(ForgeUrl {
        host: host.to_string(),
        path: path.to_string(),
    })
}

/// Provider-specific facts. One row per supported platform.
#[derive(Debug, Clone, Copy)]
pub struct ProviderSpec {
    pub platform: HostingPlatform,
    pub default_host: &'static str,
    /// Config key holding the API token; Bitbucket ships no API support.
    pub token_key: Option<Key>,
}

pub const PROVIDERS: [ProviderSpec; 4] = [
    ProviderSpec {
        platform: HostingPlatform::Github,
        default_host: "github.com",
        token_key: Some(Key::GithubToken),
    },
    ProviderSpec {
        platform: HostingPlatform::Gitlab,
        default_host: "gitlab.com",
        token_key: Some(Key::GitlabToken),
    },
    ProviderSpec {
        platform: HostingPlatform::Gitea,
        default_host: "gitea.com",
        token_key: Some(Key::GiteaToken),
    },
    ProviderSpec {
        platform: HostingPlatform::Bitbucket,
        default_host: "bitbucket.org",
        token_key: None,
    },
];

/// The platform serving the origin remote: explicit configuration wins,
/// otherwise the host name decides.
pub fn platform_for(config: &FullConfig, origin_url: Option<&str>) -> Option<HostingPlatform> {
    if let Some(platform) = config.hosting_platform {
        return Some(platform);
    }
    let forge = parse_forge_url(origin_url?)?;
    PROVIDERS
        .iter()
        .find(|spec| forge.host == spec.default_host)
        .map(|spec| spec.platform)
}

/// Browser URL for opening a new proposal from `branch` into `parent`.
pub fn new_proposal_url(
    platform: HostingPlatform,
    forge: &ForgeUrl,
    branch: &LocalBranchName,
    parent: &LocalBranchName,
) -> String {
    let ForgeUrl { host, path } = forge;
    match platform {
        HostingPlatform::Github => {
            format!("https://{host}/{path}/compare/{parent}...{branch}?expand=1")
        }
        HostingPlatform::Gitlab => format!(
            "https://{host}/{path}/-/merge_requests/new?merge_request%5Bsource_branch%5D={branch}&merge_request%5Btarget_branch%5D={parent}"
        ),
        HostingPlatform::Gitea => format!("https://{host}/{path}/compare/{parent}...{branch}"),
        HostingPlatform::Bitbucket => format!(
            "https://{host}/{path}/pull-requests/new?source={branch}&dest={parent}"
        ),
    }
}
