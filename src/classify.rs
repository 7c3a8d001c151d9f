//! Failure classification
//!
//! Maps an operation failure to a category and a message the user can act
//! on. Best effort: anything unrecognized falls back to the raw text.

use crate::error::Error;
use crate::messages::{Language, Message};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Broad cause of a failed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    #[default]
    None,
    Validation,
    Network,
    AuthFailure,
    NotFound,
    Unknown,
}

/// A classified failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: ErrorCategory,
    pub message: String,
}

fn http_status_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)status(?: code)?:?\s*(\d{3})").expect("valid http status regex")
    })
}

fn auth_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)authentication required|authentication replays|unauthorized")
            .expect("valid auth regex")
    })
}

fn dns_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            concat!(
                r"(?i)failed to resolve address|could not resolve host|",
                r"name or service not known|nodename nor servname|no such host|enotfound",
            ),
        )
        .expect("valid dns regex")
    })
}

/// The engine's own text for the failure, without our prefixes
fn raw_message(err: &Error) -> String {
    match err.git_source() {
        Some(source) => source.message().to_string(),
        None => err.to_string(),
    }
}

/// HTTP status behind a failure, when one can be recovered
pub fn http_status(err: &Error) -> Option<u16> {
    match err {
        Error::Http { status, .. } => Some(*status),
        Error::GitError { message, source } => {
            if source.as_ref().map(|e| e.code()) == Some(git2::ErrorCode::Auth) {
                return Some(401);
            }
            if let Some(status) = http_status_pattern()
                .captures(message)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse().ok())
            {
                return Some(status);
            }
            auth_pattern().is_match(message).then_some(401)
        }
        _ => None,
    }
}

/// Whether the failure is a host-name resolution problem
pub fn is_dns_failure(err: &Error) -> bool {
    dns_pattern().is_match(&err.to_string())
}

/// Classify a failure, checking in priority order: unreachable server,
/// rejected credentials, missing repository, unresolvable host.
pub fn classify(err: &Error, lang: Language) -> Classification {
    let text = err.to_string();

    if text.to_lowercase().contains("failed to fetch") {
        return Classification {
            category: ErrorCategory::Network,
            message: Message::NetworkUnreachable.render(lang),
        };
    }

    match http_status(err) {
        Some(401) | Some(403) => {
            return Classification {
                category: ErrorCategory::AuthFailure,
                message: Message::AuthenticationFailed.render(lang),
            };
        }
        Some(404) => {
            return Classification {
                category: ErrorCategory::NotFound,
                message: Message::RepositoryNotFound.render(lang),
            };
        }
        _ => {}
    }

    if is_dns_failure(err) {
        return Classification {
            category: ErrorCategory::Network,
            message: Message::HostNotFound.render(lang),
        };
    }

    if err.is_validation() {
        return Classification {
            category: ErrorCategory::Validation,
            message: text,
        };
    }

    Classification {
        category: ErrorCategory::Unknown,
        message: raw_message(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn git_error(message: &str) -> Error {
        git2::Error::from_str(message).into()
    }

    #[test]
    fn test_failed_to_fetch_any_case() {
        let err = Error::Other("TypeError: FAILED TO FETCH".into());
        let result = classify(&err, Language::En);
        assert_eq!(result.category, ErrorCategory::Network);
        assert!(result.message.contains("CORS"));
    }

    #[test]
    fn test_http_auth_statuses() {
        for status in [401, 403] {
            let err = Error::Http {
                status,
                message: "denied".into(),
            };
            assert_eq!(classify(&err, Language::En).category, ErrorCategory::AuthFailure);
        }
    }

    #[test]
    fn test_http_not_found() {
        let err = Error::Http {
            status: 404,
            message: "missing".into(),
        };
        assert_eq!(classify(&err, Language::En).category, ErrorCategory::NotFound);
    }

    #[test]
    fn test_libgit2_status_message() {
        let err = git_error("unexpected http status code: 404");
        assert_eq!(http_status(&err), Some(404));
        assert_eq!(classify(&err, Language::En).category, ErrorCategory::NotFound);

        let err = git_error("too many redirects or authentication replays");
        assert_eq!(classify(&err, Language::En).category, ErrorCategory::AuthFailure);
    }

    #[test]
    fn test_dns_failure() {
        let err =
            git_error("failed to resolve address for github.invalid: Name or service not known");
        let result = classify(&err, Language::En);
        assert_eq!(result.category, ErrorCategory::Network);
        assert!(result.message.contains("internet"));
    }

    #[test]
    fn test_unknown_keeps_raw_message() {
        let err = git_error("object not found - no match for id");
        let result = classify(&err, Language::En);
        assert_eq!(result.category, ErrorCategory::Unknown);
        assert_eq!(result.message, "object not found - no match for id");
    }

    #[test]
    fn test_validation_category() {
        let err = Error::MissingSetting { field: "access_token" };
        assert_eq!(classify(&err, Language::En).category, ErrorCategory::Validation);
    }

    #[test]
    fn test_localized_guidance() {
        let err = Error::Http {
            status: 404,
            message: String::new(),
        };
        assert!(classify(&err, Language::Tr).message.contains("Depo bulunamadı"));
    }
}
