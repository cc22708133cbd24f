//! Account discovery: the user info response and the account binding derived from it.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{discovery_error, DiscoveryErrorKind, Error};

/// Path segment that starts the versioned account path.
const API_VERSION_SEGMENT: &str = "v2";

/// REST root on account hosts reported without a path (the user info shape).
const REST_API_PATH: &str = "restapi";

/// Account id and REST base URL used for all subsequent API calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBinding {
    pub account_id: String,
    pub base_url: String,
}

/// One account entry as returned by the discovery endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginAccount {
    #[serde(alias = "accountId")]
    pub account_id: String,
    #[serde(alias = "baseUrl", alias = "base_uri")]
    pub base_url: String,
    #[serde(default, alias = "accountName", alias = "name")]
    pub account_name: Option<String>,
    #[serde(default, alias = "isDefault", deserialize_with = "flexible_bool")]
    pub is_default: Option<bool>,
}

/// Discovery endpoint body.
///
/// The identity endpoint wraps the list in an object (`accounts`), the legacy login
/// information call uses `loginAccounts`, and some proxies return the bare list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LoginInformation {
    List(Vec<LoginAccount>),
    Wrapped {
        #[serde(alias = "loginAccounts")]
        accounts: Vec<LoginAccount>,
    },
}

impl LoginInformation {
    pub fn accounts(&self) -> &[LoginAccount] {
        match self {
            LoginInformation::List(accounts) => accounts,
            LoginInformation::Wrapped { accounts } => accounts,
        }
    }

    /// Select the binding for subsequent calls.
    ///
    /// A user may belong to several accounts; the first one listed is always chosen.
    pub fn select_binding(&self) -> Result<AccountBinding, Error> {
        let account = self.accounts().first().ok_or_else(|| {
            discovery_error(DiscoveryErrorKind::NoAccounts, "account list is empty")
        })?;
        account.binding()
    }
}

impl LoginAccount {
    /// Derive the binding, stripping the versioned suffix from the base URL.
    pub fn binding(&self) -> Result<AccountBinding, Error> {
        let account_id = self.account_id.trim();
        if account_id.is_empty() {
            return Err(discovery_error(
                DiscoveryErrorKind::InvalidResponse,
                "account entry has an empty account id",
            ));
        }

        let base_url = rest_base_url(&self.base_url).ok_or_else(|| {
            discovery_error(
                DiscoveryErrorKind::InvalidResponse,
                &format!("account entry has an invalid base URL: {:?}", self.base_url),
            )
        })?;

        Ok(AccountBinding {
            account_id: account_id.to_string(),
            base_url,
        })
    }
}

/// REST root of an account: the path before the first `v2` segment, without a
/// trailing slash.
///
/// The legacy login information reports `.../restapi/v2/accounts/{id}`, while the user
/// info endpoint reports a bare host such as `https://na3.docusign.net`; a bare host gets
/// `/restapi` appended. Demo accounts all share one domain, but production accounts live
/// on per-account sub-domains, so the reported host must always be used. Returns `None`
/// unless the value is an absolute URL with a host.
pub fn rest_base_url(base_url: &str) -> Option<String> {
    let mut url = Url::parse(base_url.trim()).ok()?;
    url.host_str().filter(|host| !host.is_empty())?;

    let segments: Vec<String> = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();
    let root = match segments.iter().position(|s| s == API_VERSION_SEGMENT) {
        Some(index) => segments[..index].to_vec(),
        None if segments.is_empty() => vec![REST_API_PATH.to_string()],
        None => segments,
    };

    url.set_query(None);
    url.set_fragment(None);
    url.set_path(&root.join("/"));
    Some(url.as_str().trim_end_matches('/').to_string())
}

fn flexible_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    Ok(
        match Option::<BoolOrString>::deserialize(deserializer)? {
            Some(BoolOrString::Bool(b)) => Some(b),
            Some(BoolOrString::String(s)) => Some(s.eq_ignore_ascii_case("true")),
            None => None,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_rest_base_url_cuts_at_version_segment() {
        assert_eq!(
            rest_base_url("https://demo/v2/accounts/A1").as_deref(),
            Some("https://demo")
        );
        assert_eq!(
            rest_base_url("https://demo.docusign.net/restapi/v2/accounts/123").as_deref(),
            Some("https://demo.docusign.net/restapi")
        );
        assert_eq!(
            rest_base_url("http://127.0.0.1:8080/restapi/v2").as_deref(),
            Some("http://127.0.0.1:8080/restapi")
        );
    }

    #[test]
    fn test_rest_base_url_appends_rest_root_to_bare_host() {
        assert_eq!(
            rest_base_url("https://na3.docusign.net").as_deref(),
            Some("https://na3.docusign.net/restapi")
        );
        assert_eq!(
            rest_base_url("https://na2.docusign.net/").as_deref(),
            Some("https://na2.docusign.net/restapi")
        );
        assert_eq!(
            rest_base_url("https://eu.example.com/custom/root/").as_deref(),
            Some("https://eu.example.com/custom/root")
        );
    }

    #[test]
    fn test_rest_base_url_ignores_v2_in_host() {
        assert_eq!(
            rest_base_url("https://v2.example.com/restapi/v2/accounts/1").as_deref(),
            Some("https://v2.example.com/restapi")
        );
        assert_eq!(
            rest_base_url("https://api.example.com/v2beta/v2/accounts/1").as_deref(),
            Some("https://api.example.com/v2beta")
        );
    }

    #[test]
    fn test_rest_base_url_rejects_non_urls() {
        assert_eq!(rest_base_url("https:"), None);
        assert_eq!(rest_base_url("/restapi/v2/accounts/1"), None);
        assert_eq!(rest_base_url("mailto:someone@example.com"), None);
        assert_eq!(rest_base_url(""), None);
    }

    #[test]
    fn test_bare_list() {
        let info: LoginInformation = serde_json::from_str(
            r#"[{"account_id":"A1","base_url":"https://demo/v2/accounts/A1"}]"#,
        )
        .unwrap();

        let binding = info.select_binding().unwrap();
        assert_eq!(
            binding,
            AccountBinding {
                account_id: "A1".to_string(),
                base_url: "https://demo".to_string(),
            }
        );
    }

    #[test]
    fn test_userinfo_shape() {
        let info: LoginInformation = serde_json::from_str(
            r#"{"sub":"u","accounts":[
                {"account_id":"A1","is_default":true,"account_name":"Main","base_uri":"https://na3.docusign.net"},
                {"account_id":"A2","is_default":false,"base_uri":"https://na4.docusign.net"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(info.accounts().len(), 2);
        assert_eq!(info.accounts()[0].is_default, Some(true));
        let binding = info.select_binding().unwrap();
        assert_eq!(binding.account_id, "A1");
        assert_eq!(binding.base_url, "https://na3.docusign.net/restapi");
    }

    #[test]
    fn test_login_information_shape() {
        let info: LoginInformation = serde_json::from_str(
            r#"{"loginAccounts":[{"accountId":"123","baseUrl":"https://demo.docusign.net/restapi/v2/accounts/123","isDefault":"true","name":"Dev"}]}"#,
        )
        .unwrap();

        let account = &info.accounts()[0];
        assert_eq!(account.is_default, Some(true));
        assert_eq!(account.account_name.as_deref(), Some("Dev"));
        assert_eq!(
            info.select_binding().unwrap().base_url,
            "https://demo.docusign.net/restapi"
        );
    }

    #[test]
    fn test_empty_list_is_no_accounts() {
        let info: LoginInformation = serde_json::from_str("[]").unwrap();
        let err = info.select_binding().unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Discovery(DiscoveryErrorKind::NoAccounts)
        );
    }

    #[test]
    fn test_malformed_base_url_is_invalid() {
        let info: LoginInformation = serde_json::from_str(
            r#"[{"account_id":"A1","base_url":"https://v2.example.com"},{"account_id":"A2","base_url":"not a url"}]"#,
        )
        .unwrap();
        assert_eq!(
            info.select_binding().unwrap().base_url,
            "https://v2.example.com/restapi"
        );

        let err = info.accounts()[1].binding().unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Discovery(DiscoveryErrorKind::InvalidResponse)
        );
    }

    #[test]
    fn test_blank_account_id_is_invalid() {
        let info: LoginInformation =
            serde_json::from_str(r#"[{"account_id":" ","base_url":"https://demo"}]"#).unwrap();
        let err = info.select_binding().unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Discovery(DiscoveryErrorKind::InvalidResponse)
        );
    }
}
