use std::time::Duration;

use async_trait::async_trait;
use prep_core::model::{Credentials, RemoteSettings, StudySession, UserId, UserIdentity};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    ProgressRow, RemoteAuthGateway, RemoteProgressGateway, RemoteStudySessionGateway,
    StudySessionRecord,
};
use crate::error::RemoteError;

const PROGRESS_TABLE: &str = "rest/v1/progress";
const STUDY_SESSIONS_TABLE: &str = "rest/v1/study_sessions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for a PostgREST-style record store with a GoTrue-style auth API.
#[derive(Clone)]
pub struct PostgrestClient {
    client: Client,
    settings: RemoteSettings,
}

impl PostgrestClient {
    /// # Errors
    ///
    /// Returns `RemoteError::Http` if the HTTP client cannot be built.
    pub fn new(settings: RemoteSettings) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, settings })
    }

    #[must_use]
    pub fn settings(&self) -> &RemoteSettings {
        &self.settings
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", self.settings.api_key())
            .bearer_auth(self.settings.api_key())
    }

    pub(crate) fn fetch_progress_request(&self, user: &UserId) -> RequestBuilder {
        let user_filter = format!("eq.{user}");
        self.authorized(self.client.get(self.settings.endpoint(PROGRESS_TABLE)))
            .query(&[("select", "*"), ("user_id", user_filter.as_str())])
            .header("Accept", "application/json")
    }

    pub(crate) fn upsert_progress_request(&self, row: &ProgressRow) -> RequestBuilder {
        self.authorized(self.client.post(self.settings.endpoint(PROGRESS_TABLE)))
            .query(&[("on_conflict", "user_id,chapter_id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(row)
    }

    pub(crate) fn fetch_sessions_request(&self, user: &UserId) -> RequestBuilder {
        let user_filter = format!("eq.{user}");
        self.authorized(self.client.get(self.settings.endpoint(STUDY_SESSIONS_TABLE)))
            .query(&[
                ("select", "*"),
                ("user_id", user_filter.as_str()),
                ("order", "session_date.desc"),
            ])
            .header("Accept", "application/json")
    }

    pub(crate) fn insert_session_request(&self, record: &StudySessionRecord) -> RequestBuilder {
        self.authorized(self.client.post(self.settings.endpoint(STUDY_SESSIONS_TABLE)))
            .header("Prefer", "return=minimal")
            .json(record)
    }

    pub(crate) fn sign_in_request(&self, credentials: &Credentials) -> RequestBuilder {
        self.authorized(self.client.post(self.settings.endpoint("auth/v1/token")))
            .query(&[("grant_type", "password")])
            .json(&PasswordGrant {
                email: credentials.email(),
                password: credentials.password(),
            })
    }
}

/// Send `request`, mapping connection failures and timeouts to `Unavailable`.
async fn send(request: RequestBuilder) -> Result<Response, RemoteError> {
    let response = request.send().await.map_err(|err| {
        if err.is_connect() || err.is_timeout() {
            RemoteError::Unavailable(err.to_string())
        } else {
            RemoteError::Http(err)
        }
    })?;
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(RemoteError::HttpStatus(response.status()))
    }
}

#[async_trait]
impl RemoteProgressGateway for PostgrestClient {
    async fn fetch_by_user(&self, user: &UserId) -> Result<Vec<ProgressRow>, RemoteError> {
        debug!(user = %user, "fetching remote progress");
        let rows: Vec<ProgressRow> = send(self.fetch_progress_request(user))
            .await?
            .json()
            .await
            .map_err(|err| RemoteError::Malformed(err.to_string()))?;
        Ok(rows)
    }

    async fn upsert(&self, row: &ProgressRow) -> Result<(), RemoteError> {
        send(self.upsert_progress_request(row)).await?;
        Ok(())
    }
}

#[async_trait]
impl RemoteStudySessionGateway for PostgrestClient {
    async fn fetch_sessions(&self, user: &UserId) -> Result<Vec<StudySession>, RemoteError> {
        debug!(user = %user, "fetching remote study sessions");
        let records: Vec<StudySessionRecord> = send(self.fetch_sessions_request(user))
            .await?
            .json()
            .await
            .map_err(|err| RemoteError::Malformed(err.to_string()))?;
        records
            .into_iter()
            .map(StudySessionRecord::into_session)
            .collect()
    }

    async fn insert_session(&self, session: &StudySession) -> Result<(), RemoteError> {
        send(self.insert_session_request(&StudySessionRecord::from(session))).await?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpMetadata<'a>,
}

#[derive(Debug, Serialize)]
struct SignUpMetadata<'a> {
    name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AuthResponse {
    Session { user: AuthUser },
    User(AuthUser),
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: AuthUserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct AuthUserMetadata {
    name: Option<String>,
}

impl AuthResponse {
    fn into_identity(self, credentials: &Credentials) -> Result<UserIdentity, RemoteError> {
        let user = match self {
            AuthResponse::Session { user } | AuthResponse::User(user) => user,
        };
        let id = UserId::new(user.id).map_err(|err| RemoteError::Malformed(err.to_string()))?;
        let email = user
            .email
            .unwrap_or_else(|| credentials.email().to_owned());
        let name = user
            .user_metadata
            .name
            .or_else(|| credentials.name().map(str::to_owned))
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_owned());
        Ok(UserIdentity { id, email, name })
    }
}

#[async_trait]
impl RemoteAuthGateway for PostgrestClient {
    async fn sign_in(&self, credentials: &Credentials) -> Result<UserIdentity, RemoteError> {
        let body: AuthResponse = send(self.sign_in_request(credentials))
            .await?
            .json()
            .await
            .map_err(|err| RemoteError::Malformed(err.to_string()))?;
        body.into_identity(credentials)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<UserIdentity, RemoteError> {
        let request = self
            .authorized(self.client.post(self.settings.endpoint("auth/v1/signup")))
            .json(&SignUpRequest {
                email: credentials.email(),
                password: credentials.password(),
                data: SignUpMetadata {
                    name: credentials.name(),
                },
            });
        let body: AuthResponse = send(request)
            .await?
            .json()
            .await
            .map_err(|err| RemoteError::Malformed(err.to_string()))?;
        body.into_identity(credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::model::{CredentialsDraft, RemoteSettingsDraft};

    fn client(base: &str) -> PostgrestClient {
        let settings = RemoteSettingsDraft {
            base_url: Some(base.into()),
            api_key: Some("anon".into()),
        }
        .validate()
        .unwrap()
        .unwrap();
        PostgrestClient::new(settings).unwrap()
    }

    fn query_pairs(request: RequestBuilder) -> (String, Vec<(String, String)>) {
        let request = request.build().unwrap();
        let url = request.url();
        let pairs = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        (url.path().to_owned(), pairs)
    }

    fn pair(key: &str, value: &str) -> (String, String) {
        (key.to_owned(), value.to_owned())
    }

    #[test]
    fn progress_requests_filter_and_upsert_by_user() {
        let client = client("https://db.example.co/");
        let user = UserId::new("a b&c").unwrap();

        let (path, pairs) = query_pairs(client.fetch_progress_request(&user));
        assert_eq!(path, "/rest/v1/progress");
        assert_eq!(pairs, [pair("select", "*"), pair("user_id", "eq.a b&c")]);

        let row = ProgressRow::new(
            user,
            "Physics-11-1".parse().unwrap(),
            &prep_core::model::ChapterProgress::default(),
            prep_core::time::fixed_now(),
        );
        let request = client.upsert_progress_request(&row).build().unwrap();
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(
            request.headers()["Prefer"],
            "resolution=merge-duplicates,return=minimal"
        );
        assert_eq!(request.headers()["apikey"], "anon");
        let pairs: Vec<_> = request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(pairs, [pair("on_conflict", "user_id,chapter_id")]);
    }

    #[test]
    fn session_and_auth_requests_target_their_endpoints() {
        let client = client("https://db.example.co/");
        let (path, pairs) = query_pairs(client.fetch_sessions_request(&UserId::new("u1").unwrap()));
        assert_eq!(path, "/rest/v1/study_sessions");
        assert_eq!(
            pairs,
            [
                pair("select", "*"),
                pair("user_id", "eq.u1"),
                pair("order", "session_date.desc"),
            ]
        );

        let creds = CredentialsDraft::new("neha@example.com", "secret1")
            .validate_sign_in()
            .unwrap();
        let (path, pairs) = query_pairs(client.sign_in_request(&creds));
        assert_eq!(path, "/auth/v1/token");
        assert_eq!(pairs, [pair("grant_type", "password")]);
    }

    #[test]
    fn auth_response_accepts_session_and_bare_user() {
        let creds = CredentialsDraft::new("neha@example.com", "secret1")
            .validate_sign_in()
            .unwrap();

        let session: AuthResponse = serde_json::from_value(serde_json::json!({
            "access_token": "t",
            "user": {"id": "uuid-1", "email": "neha@example.com", "user_metadata": {"name": "Neha"}}
        }))
        .unwrap();
        let identity = session.into_identity(&creds).unwrap();
        assert_eq!(identity.id.as_str(), "uuid-1");
        assert_eq!(identity.name, "Neha");

        let bare: AuthResponse =
            serde_json::from_value(serde_json::json!({"id": "uuid-2"})).unwrap();
        let identity = bare.into_identity(&creds).unwrap();
        assert_eq!(identity.email, "neha@example.com");
        assert_eq!(identity.name, "neha");
        assert!(!identity.is_local());
    }

    #[tokio::test]
    async fn unreachable_store_is_unavailable() {
        let client = client("http://127.0.0.1:9");
        let user = UserId::new("u1").unwrap();
        let result = client.fetch_by_user(&user).await;
        assert!(matches!(result, Err(RemoteError::Unavailable(_))));
        let result = client.fetch_sessions(&user).await;
        assert!(matches!(result, Err(RemoteError::Unavailable(_))));
    }
}
