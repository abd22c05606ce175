use url::Url;

/// How a user was named on the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum UserRef {
    Id(String),
    Login(String),
}

/// Parse a numeric id, a login (with or without `@`), or a channel URL.
pub fn parse_user_ref(input: &str) -> Option<UserRef> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return None;
    }

    // Raw numeric ID
    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Some(UserRef::Id(trimmed.to_owned()));
    }

    parse_channel(trimmed).map(UserRef::Login)
}

/// Normalize a channel name or `twitch.tv/<name>` URL to a lowercase login.
pub fn parse_channel(input: &str) -> Option<String> {
    let trimmed = input.trim();

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return parse_channel_url(trimmed);
    }

    let login = strip_at(trimmed.strip_prefix('#').unwrap_or(trimmed));
    is_valid_login(login).then(|| login.to_ascii_lowercase())
}

fn parse_channel_url(input: &str) -> Option<String> {
    let url = Url::parse(input).ok()?;

    let host = url.host_str()?;
    if host != "twitch.tv" && host != "www.twitch.tv" && host != "m.twitch.tv" {
        return None;
    }

    // Path: /<login>[/...]
    let login = url.path_segments()?.next()?;
    is_valid_login(login).then(|| login.to_ascii_lowercase())
}

fn is_valid_login(login: &str) -> bool {
    !login.is_empty()
        && login.len() <= 25
        && login.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn strip_at(username: &str) -> &str {
    username.strip_prefix('@').unwrap_or(username)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_ref_id() {
        assert_eq!(parse_user_ref("141981764"), Some(UserRef::Id("141981764".into())));
    }

    #[test]
    fn test_parse_user_ref_login() {
        assert_eq!(parse_user_ref("@TwitchDev"), Some(UserRef::Login("twitchdev".into())));
        assert_eq!(parse_user_ref("xqc"), Some(UserRef::Login("xqc".into())));
        assert_eq!(parse_user_ref("#xqc"), Some(UserRef::Login("xqc".into())));
    }

    #[test]
    fn test_parse_user_ref_url() {
        assert_eq!(
            parse_user_ref("https://www.twitch.tv/xqc/videos"),
            Some(UserRef::Login("xqc".into()))
        );
    }

    #[test]
    fn test_parse_user_ref_invalid() {
        assert_eq!(parse_user_ref(""), None);
        assert_eq!(parse_user_ref("not a login"), None);
        assert_eq!(parse_user_ref("https://example.com/xqc"), None);
    }

    #[test]
    fn test_parse_channel() {
        assert_eq!(parse_channel("XQC"), Some("xqc".into()));
        assert_eq!(parse_channel("https://twitch.tv/forsen"), Some("forsen".into()));
        assert_eq!(parse_channel("https://twitch.tv/"), None);
    }

    #[test]
    fn test_strip_at() {
        assert_eq!(strip_at("@alice"), "alice");
        assert_eq!(strip_at("bob"), "bob");
    }
}
