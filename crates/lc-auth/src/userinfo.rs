use serde::Deserialize;

use crate::errors::{AccountRestricted, Result};

/// Userinfo fetched once and kept in both of its forms
///
/// `raw` is forwarded verbatim to the login queue and party registration;
/// `claims` drive restriction checks and the snapshot's profile fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Userinfo {
    pub raw: String,
    pub claims: UserinfoClaims,
}

impl Userinfo {
    /// Materialize a userinfo body, which is a JWT for league scopes and
    /// plain JSON for others
    pub fn from_body(content_type: Option<&str>, body: String) -> Result<Self> {
        let is_jwt = content_type
            .map(|ct| ct.to_ascii_lowercase().starts_with("application/jwt"))
            .unwrap_or(false);

        let claims = if is_jwt {
            lc_core::decode_claims_as(body.trim())?
        } else {
            serde_json::from_str(&body).map_err(|e| lc_core::ParseError::new("userinfo", e))?
        };

        Ok(Self { raw: body, claims })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserinfoClaims {
    pub sub: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub phone_number_verified: bool,
    #[serde(default)]
    pub ban: BanStatus,
    #[serde(default)]
    pub lol_account: Option<LolAccount>,
    #[serde(default)]
    pub region: Option<RegionTag>,
    #[serde(default)]
    pub acct: Option<RiotAccount>,
}

impl UserinfoClaims {
    /// Fail on the most severe restriction present
    ///
    /// A permanent ban wins over a chat restriction, which wins over a
    /// time ban; anything else is reported as a generic restriction.
    pub fn check_restrictions(&self) -> std::result::Result<(), AccountRestricted> {
        let kinds: Vec<&RestrictionKind> = self.ban.restrictions.iter().map(|r| &r.kind).collect();
        if kinds.is_empty() {
            return Ok(());
        }
        if kinds.contains(&&RestrictionKind::PermanentBan) {
            return Err(AccountRestricted::Banned);
        }
        if kinds.contains(&&RestrictionKind::TextChatRestriction) {
            return Err(AccountRestricted::ChatRestricted);
        }
        if kinds.contains(&&RestrictionKind::TimeBan) {
            return Err(AccountRestricted::TimeBanned);
        }
        Err(AccountRestricted::Generic(
            kinds.iter().map(|k| k.as_str().to_string()).collect(),
        ))
    }

    /// Platform code from the region tag (`LAN` becomes `LA1`, ...)
    pub fn platform_code(&self) -> Option<String> {
        self.region
            .as_ref()
            .map(|r| lc_core::platform_code_for_tag(&r.tag))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BanStatus {
    #[serde(default)]
    pub restrictions: Vec<Restriction>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Restriction {
    #[serde(rename = "type")]
    pub kind: RestrictionKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum RestrictionKind {
    PermanentBan,
    TextChatRestriction,
    TimeBan,
    Other(String),
}

impl RestrictionKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::PermanentBan => "PERMANENT_BAN",
            Self::TextChatRestriction => "TEXT_CHAT_RESTRICTION",
            Self::TimeBan => "TIME_BAN",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for RestrictionKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "PERMANENT_BAN" => Self::PermanentBan,
            "TEXT_CHAT_RESTRICTION" => Self::TextChatRestriction,
            "TIME_BAN" => Self::TimeBan,
            _ => Self::Other(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LolAccount {
    pub summoner_id: u64,
    #[serde(default)]
    pub summoner_name: String,
    #[serde(default)]
    pub summoner_level: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegionTag {
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RiotAccount {
    #[serde(default)]
    pub game_name: String,
    #[serde(default)]
    pub tag_line: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims_with(restrictions: &[&str]) -> UserinfoClaims {
        let restrictions: Vec<_> = restrictions.iter().map(|t| json!({"type": t})).collect();
        serde_json::from_value(json!({
            "sub": "puuid-x",
            "ban": {"restrictions": restrictions},
        }))
        .unwrap()
    }

    #[test]
    fn test_jwt_userinfo_is_materialized_twice() {
        let token = lc_core::encode_unsigned(&json!({
            "sub": "puuid-x",
            "country": "ita",
            "region": {"tag": "lan"},
            "lol_account": {"summoner_id": 42, "summoner_name": "", "summoner_level": 30},
        }));

        let info = Userinfo::from_body(Some("application/jwt; charset=utf-8"), token.clone()).unwrap();

        assert_eq!(info.raw, token);
        assert_eq!(info.claims.country.as_deref(), Some("ita"));
        assert_eq!(info.claims.lol_account.as_ref().unwrap().summoner_id, 42);
        assert_eq!(info.claims.platform_code().as_deref(), Some("LA1"));
    }

    #[test]
    fn test_json_userinfo() {
        let body = r#"{"sub":"puuid-x","email_verified":true}"#.to_string();

        let info = Userinfo::from_body(Some("application/json"), body.clone()).unwrap();

        assert_eq!(info.raw, body);
        assert!(info.claims.email_verified);
    }

    #[test]
    fn test_restriction_precedence() {
        assert_eq!(claims_with(&[]).check_restrictions(), Ok(()));
        assert_eq!(
            claims_with(&["TIME_BAN", "PERMANENT_BAN"]).check_restrictions(),
            Err(AccountRestricted::Banned)
        );
        assert_eq!(
            claims_with(&["TIME_BAN", "TEXT_CHAT_RESTRICTION"]).check_restrictions(),
            Err(AccountRestricted::ChatRestricted)
        );
        assert_eq!(
            claims_with(&["TIME_BAN"]).check_restrictions(),
            Err(AccountRestricted::TimeBanned)
        );
        assert_eq!(
            claims_with(&["QUEUE_LOCKOUT"]).check_restrictions(),
            Err(AccountRestricted::Generic(vec!["QUEUE_LOCKOUT".to_string()]))
        );
    }

    #[test]
    fn test_garbage_userinfo_is_a_parse_error() {
        let err = Userinfo::from_body(Some("application/jwt"), "garbage".to_string()).unwrap_err();
        assert!(matches!(err, crate::errors::RsoError::Parse(_)));
    }
}
