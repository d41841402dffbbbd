//! Allow-list sanitization of untrusted strings before shell interpolation.
//!
//! Every variable component of a remote command passes through this module.
//! Sanitizers never fail: characters outside the allow-list are stripped or
//! replaced, so callers always receive a usable (possibly empty) string.
//!
//! | Function | Allowed | Extra rules |
//! |----------|---------|-------------|
//! | [`image_ref`] | hex after `sha256:`, else `[A-Za-z0-9_./:-]` | no leading `-`, max 128 |
//! | [`container_name`] | `[A-Za-z0-9_.-]` | `c` prefix if not alphanumeric first, max 64 |
//! | [`network_name`] | `[A-Za-z0-9_.-]` | |
//! | [`port_spec`] | `[0-9.:-]` | |
//! | [`env_key`] | `[A-Za-z0-9_]` | others replaced by `_` |
//! | [`quote_path`] | anything | canonicalized, single-quoted |
//! | [`quote_literal`] | anything | single-quoted |
//!
//! `quote_path` and `quote_literal` results are ready to embed; the others
//! yield bare text restricted to characters with no meaning to a POSIX shell.

/// Prefix of content-addressed image and container identifiers.
pub const DIGEST_PREFIX: &str = "sha256:";

/// Maximum length of a sanitized image reference.
pub const MAX_IMAGE_REF_LEN: usize = 128;

/// Maximum length of a sanitized container name.
pub const MAX_CONTAINER_NAME_LEN: usize = 64;

/// Sanitize a container or image identifier.
pub fn image_ref(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '/' | ':' | '-'))
        .collect();
    let kept = kept.trim_start_matches('-');

    // Checked after filtering so the result is a fixed point.
    if let Some(hex) = kept.strip_prefix(DIGEST_PREFIX) {
        let digits: String = hex.chars().filter(char::is_ascii_hexdigit).collect();
        return format!("{DIGEST_PREFIX}{digits}");
    }

    truncate(kept, MAX_IMAGE_REF_LEN)
}

/// Sanitize a container name so that it satisfies `[a-zA-Z0-9][a-zA-Z0-9_.-]*`.
pub fn container_name(raw: &str) -> String {
    let mut kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    if kept
        .chars()
        .next()
        .is_some_and(|first| !first.is_ascii_alphanumeric())
    {
        kept.insert(0, 'c');
    }

    truncate(&kept, MAX_CONTAINER_NAME_LEN)
}

/// Sanitize a docker network name.
pub fn network_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect()
}

/// Sanitize one side of a port mapping.
pub fn port_spec(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ':' | '-'))
        .collect()
}

/// Sanitize an environment variable key, replacing disallowed characters with `_`.
pub fn env_key(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Escape embedded single quotes so `value` can sit between single quotes.
pub fn escape_single_quotes(value: &str) -> String {
    value.replace('\'', r"'\''")
}

/// Quote an arbitrary value as one literal shell word.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", escape_single_quotes(value))
}

/// Canonicalize a path and quote it as one literal shell word.
pub fn quote_path(path: &str) -> String {
    quote_literal(&clean_path(path))
}

/// Lexically canonicalize a path.
///
/// Collapses repeated separators, removes `.` segments and resolves `..`
/// against the preceding segment. `..` cannot climb above the root of an
/// absolute path; relative paths keep leading `..` segments. An empty input
/// yields `/`.
pub fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Join an entry name onto a canonical directory path.
pub fn join_path(root: &str, name: &str) -> String {
    if root.ends_with('/') {
        format!("{root}{name}")
    } else {
        format!("{root}/{name}")
    }
}

fn truncate(value: &str, max: usize) -> String {
    // Every kept character is ASCII, so byte and char positions agree.
    value.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SHELL_METACHARACTERS: &[char] = &[
        ';', '`', '$', '(', ')', '\'', '"', '|', '&', '<', '>', '\\', ' ', '\n', '*', '?', '!',
    ];

    mod image_refs {
        use super::*;

        #[test]
        fn test_digest_keeps_prefix_and_hex() {
            assert_eq!(
                image_ref("sha256:AB12##cd"),
                "sha256:AB12cd"
            );
        }

        #[test]
        fn test_digest_drops_non_hex_letters() {
            assert_eq!(image_ref("sha256:xyz0f;rm -rf /"), "sha256:0ff");
        }

        #[test]
        fn test_repo_tag_is_kept() {
            assert_eq!(image_ref("registry.io/team/nginx:1.25-alpine"), "registry.io/team/nginx:1.25-alpine");
        }

        #[test]
        fn test_injection_is_stripped() {
            assert_eq!(image_ref("nginx; rm -rf /"), "nginxrm-rf/");
            assert_eq!(image_ref("$(reboot)"), "reboot");
        }

        #[test]
        fn test_digest_prefix_formed_by_stripping() {
            assert_eq!(image_ref("sha;256:zz12"), "sha256:12");
        }

        #[test]
        fn test_leading_dashes_are_stripped() {
            assert_eq!(image_ref("--force"), "force");
            assert_eq!(image_ref("-f nginx"), "fnginx");
        }

        #[test]
        fn test_truncated_to_128() {
            let long = "a".repeat(300);
            assert_eq!(image_ref(&long).len(), MAX_IMAGE_REF_LEN);
        }

        #[test]
        fn test_empty_stays_empty() {
            assert_eq!(image_ref(""), "");
            assert_eq!(image_ref(";;;"), "");
        }
    }

    mod container_names {
        use super::*;

        #[test]
        fn test_valid_name_unchanged() {
            assert_eq!(container_name("web-1.prod_a"), "web-1.prod_a");
        }

        #[test]
        fn test_prefix_when_first_char_not_alphanumeric() {
            assert_eq!(container_name("_web"), "c_web");
            assert_eq!(container_name("-web"), "c-web");
            assert_eq!(container_name(";.web"), "c.web");
        }

        #[test]
        fn test_strips_disallowed() {
            assert_eq!(container_name("we b/$(x)"), "webx");
        }

        #[test]
        fn test_truncated_to_64() {
            let long = format!("_{}", "n".repeat(100));
            let name = container_name(&long);
            assert_eq!(name.len(), MAX_CONTAINER_NAME_LEN);
            assert!(name.starts_with("c_"));
        }
    }

    mod env_keys {
        use super::*;

        #[test]
        fn test_replaces_with_underscore() {
            assert_eq!(env_key("MY-VAR"), "MY_VAR");
            assert_eq!(env_key("A=B;C"), "A_B_C");
            assert_eq!(env_key("PATH"), "PATH");
        }
    }

    mod ports_and_networks {
        use super::*;

        #[test]
        fn test_port_spec() {
            assert_eq!(port_spec("127.0.0.1:8080"), "127.0.0.1:8080");
            assert_eq!(port_spec("80;ls"), "80");
            assert_eq!(port_spec("8000-8010"), "8000-8010");
        }

        #[test]
        fn test_network_name() {
            assert_eq!(network_name("my_net.1-a"), "my_net.1-a");
            assert_eq!(network_name("host && reboot"), "hostreboot");
        }
    }

    mod quoting {
        use super::*;

        #[test]
        fn test_literal_is_single_quoted() {
            assert_eq!(quote_literal("daemon off;"), "'daemon off;'");
        }

        #[test]
        fn test_embedded_single_quote_escaped() {
            assert_eq!(quote_literal("it's"), r"'it'\''s'");
        }

        #[test]
        fn test_path_is_cleaned_and_quoted() {
            assert_eq!(quote_path("/var/log/../lib/./x"), "'/var/lib/x'");
            assert_eq!(quote_path(""), "'/'");
            assert_eq!(quote_path("/tmp/a'b"), r"'/tmp/a'\''b'");
        }
    }

    mod path_cleaning {
        use super::*;

        #[test]
        fn test_absolute_paths() {
            assert_eq!(clean_path("/"), "/");
            assert_eq!(clean_path("//var///log/"), "/var/log");
            assert_eq!(clean_path("/../../etc"), "/etc");
            assert_eq!(clean_path("/a/b/../../.."), "/");
        }

        #[test]
        fn test_relative_paths() {
            assert_eq!(clean_path("a/../b"), "b");
            assert_eq!(clean_path("./"), ".");
            assert_eq!(clean_path("../x"), "../x");
            assert_eq!(clean_path("a/../../x"), "../x");
        }

        #[test]
        fn test_join() {
            assert_eq!(join_path("/", "etc"), "/etc");
            assert_eq!(join_path("/var", "log"), "/var/log");
        }
    }

    proptest! {
        #[test]
        fn prop_allow_list_kinds_are_idempotent_and_safe(raw in ".{0,200}") {
            let sanitizers: [fn(&str) -> String; 5] =
                [image_ref, container_name, network_name, port_spec, env_key];
            for sanitize in sanitizers {
                let once = sanitize(&raw);
                prop_assert_eq!(&sanitize(&once), &once);
                prop_assert!(!once.contains(SHELL_METACHARACTERS));
            }
        }

        #[test]
        fn prop_metacharacter_payloads_are_neutralized(
            prefix in "[a-z0-9]{0,10}",
            payload in prop::sample::select(vec!["; rm -rf /", "`id`", "$(id)", "' || '", "\" && \""]),
        ) {
            let raw = format!("{prefix}{payload}");
            let cleaned = image_ref(&raw);
            prop_assert!(!cleaned.contains(SHELL_METACHARACTERS));
            prop_assert_eq!(image_ref(&cleaned), cleaned.clone());
        }

        #[test]
        fn prop_quoted_literal_has_balanced_quotes(raw in ".{0,100}") {
            let quoted = quote_literal(&raw);
            prop_assert!(quoted.starts_with('\'') && quoted.ends_with('\''));
            // Unescaping the '\'' sequences restores the input.
            let inner = &quoted[1..quoted.len() - 1];
            prop_assert_eq!(inner.replace(r"'\''", "'"), raw);
        }
    }
}
