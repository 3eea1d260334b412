//! URL → extraction strategy
//!
//! Classification is a pure function evaluated once per (resolved) URL.
//! Patterns are tried in a fixed priority order and the first match wins;
//! anything unmatched falls through to [`LinkSource::Generic`].

use url::Url;

/// Extraction strategy selected for a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkSource {
    /// github.com/{owner}/{repo}
    GitHub {
        /// Repository owner
        owner: String,
        /// Repository name
        repo: String,
    },
    /// gitlab.com/{namespace}/{project}
    GitLab {
        /// `namespace/project` (unencoded)
        project_path: String,
    },
    /// pypi.org/project/{package}
    PyPI {
        /// Package name
        package: String,
    },
    /// A SourceForge project page
    SourceForge,
    /// bitbucket.org/{user}/{repo}
    Bitbucket {
        /// Workspace / user
        user: String,
        /// Repository slug
        repo: String,
    },
    /// A configured organizational git host; recorded, never fetched
    OrganizationalGit,
    /// Anything else
    Generic,
}

impl LinkSource {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            LinkSource::GitHub { .. } => "github",
            LinkSource::GitLab { .. } => "gitlab",
            LinkSource::PyPI { .. } => "pypi",
            LinkSource::SourceForge => "sourceforge",
            LinkSource::Bitbucket { .. } => "bitbucket",
            LinkSource::OrganizationalGit => "organizational-git",
            LinkSource::Generic => "generic",
        }
    }
}

/// Classify `url`
///
/// `org_hosts` lists the organizational git hosts (exact host match).
pub fn classify(url: &str, org_hosts: &[String]) -> LinkSource {
    let Ok(parsed) = Url::parse(url) else {
        return LinkSource::Generic;
    };
    let Some(host) = parsed.host_str().map(|h| h.trim_start_matches("www.").to_ascii_lowercase())
    else {
        return LinkSource::Generic;
    };
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    if host == "github.com" {
        if let [owner, repo, ..] = segments.as_slice() {
            return LinkSource::GitHub {
                owner: owner.to_string(),
                repo: strip_git_suffix(repo),
            };
        }
    }

    if host == "gitlab.com" {
        if let [namespace, project, ..] = segments.as_slice() {
            return LinkSource::GitLab {
                project_path: format!("{}/{}", namespace, strip_git_suffix(project)),
            };
        }
    }

    if host == "pypi.org" {
        if let ["project", package, ..] = segments.as_slice() {
            return LinkSource::PyPI {
                package: package.to_string(),
            };
        }
    }

    if is_sourceforge(&host, &segments) {
        return LinkSource::SourceForge;
    }

    if host == "bitbucket.org" {
        if let [user, repo, ..] = segments.as_slice() {
            return LinkSource::Bitbucket {
                user: user.to_string(),
                repo: strip_git_suffix(repo),
            };
        }
    }

    if org_hosts.iter().any(|h| h.eq_ignore_ascii_case(&host)) {
        return LinkSource::OrganizationalGit;
    }

    LinkSource::Generic
}

fn is_sourceforge(host: &str, segments: &[&str]) -> bool {
    let first = segments.first().copied();
    match host {
        "sourceforge.net" => matches!(first, Some("projects") | Some("p")),
        "sf.net" => first == Some("p"),
        _ => host.ends_with(".sourceforge.net") && first == Some("projects"),
    }
}

fn strip_git_suffix(name: &str) -> String {
    name.strip_suffix(".git").unwrap_or(name).to_string()
}
