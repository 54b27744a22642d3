//! Client of the serverless functions that hold the remote copy of the user records.

use std::time::Duration;

use fitjournal_domain as domain;
use log::debug;
use reqwest::{
    Method, StatusCode, Url,
    header::{CONTENT_TYPE, HeaderValue},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::record::UserRecord;

#[allow(async_fn_in_trait)]
pub trait SendRequest {
    async fn send_request(
        &self,
        request: reqwest::Request,
    ) -> Result<reqwest::Response, domain::StorageError>;
}

pub struct ReqwestSendRequest {
    client: reqwest::Client,
}

impl ReqwestSendRequest {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }
}

impl SendRequest for ReqwestSendRequest {
    async fn send_request(
        &self,
        request: reqwest::Request,
    ) -> Result<reqwest::Response, domain::StorageError> {
        let method = request.method().clone();
        let url = request.url().clone();
        self.client.execute(request).await.map_err(|err| {
            debug!("{method} {url} failed: {err}");
            if err.is_connect() || err.is_timeout() {
                domain::StorageError::NoConnection
            } else {
                domain::StorageError::Other(Box::new(err))
            }
        })
    }
}

#[allow(clippy::upper_case_acronyms)]
pub struct REST<S: SendRequest> {
    pub base_url: String,
    pub sender: S,
}

impl REST<ReqwestSendRequest> {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            base_url: base_url.to_string(),
            sender: ReqwestSendRequest::new(timeout)?,
        })
    }
}

impl<S: SendRequest> REST<S> {
    fn url(&self, function: &str) -> Result<Url, domain::StorageError> {
        Url::parse(&format!(
            "{}/{function}",
            self.base_url.trim_end_matches('/')
        ))
        .map_err(|err| domain::StorageError::Other(Box::new(err)))
    }

    async fn get(
        &self,
        function: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, domain::StorageError> {
        let mut url = self.url(function)?;
        url.query_pairs_mut().extend_pairs(query);
        self.sender
            .send_request(reqwest::Request::new(Method::GET, url))
            .await
    }

    async fn post<T: Serialize>(
        &self,
        function: &str,
        body: &T,
    ) -> Result<reqwest::Response, domain::StorageError> {
        let mut request = reqwest::Request::new(Method::POST, self.url(function)?);
        *request.body_mut() = Some(
            serde_json::to_vec(body)
                .map_err(|err| domain::StorageError::Other(Box::new(err)))?
                .into(),
        );
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.sender.send_request(request).await
    }
}

impl<S: SendRequest> domain::RemoteRepository for REST<S> {
    async fn read_record(
        &self,
        username: &domain::Username,
    ) -> Result<Option<domain::UserRecord>, domain::StorageError> {
        let response = self
            .get("get-user", &[("username", username.as_str())])
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => json::<UserData>(response)
                .await?
                .data
                .map(into_domain)
                .transpose(),
            status => Err(unexpected_status(status)),
        }
    }

    async fn write_record(
        &self,
        username: &domain::Username,
        record: &domain::UserRecord,
    ) -> Result<(), domain::StorageError> {
        let response = self
            .post(
                "sync-user",
                &SyncUser {
                    username: username.as_str(),
                    data: UserRecord::from(record),
                },
            )
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(unexpected_status(response.status()))
        }
    }
}

impl<S: SendRequest> domain::AuthRepository for REST<S> {
    async fn verify_credentials(
        &self,
        username: &domain::Username,
        password: &str,
    ) -> Result<domain::UserRecord, domain::AuthError> {
        let response = self
            .post(
                "login",
                &Credentials {
                    username: username.as_str(),
                    password,
                },
            )
            .await?;
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => {
                Err(domain::AuthError::InvalidCredentials)
            }
            status if status.is_success() => {
                Ok(into_domain(json::<UserData>(response).await?.data.ok_or(
                    domain::AuthError::InvalidCredentials,
                )?)?)
            }
            status => Err(unexpected_status(status).into()),
        }
    }

    async fn register(
        &self,
        username: &domain::Username,
        password: &str,
    ) -> Result<domain::UserRecord, domain::AuthError> {
        let response = self
            .post(
                "register",
                &Credentials {
                    username: username.as_str(),
                    password,
                },
            )
            .await?;
        match response.status() {
            StatusCode::CONFLICT => Err(domain::AuthError::AlreadyExists),
            status if status.is_success() => {
                let data = json::<UserData>(response).await?.data.ok_or_else(|| {
                    domain::StorageError::Other("missing user data".into())
                })?;
                Ok(into_domain(data)?)
            }
            status => Err(unexpected_status(status).into()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserData {
    #[serde(default)]
    pub data: Option<UserRecord>,
}

#[derive(Serialize, Debug)]
struct SyncUser<'a> {
    username: &'a str,
    data: UserRecord,
}

#[derive(Serialize, Debug)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

async fn json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, domain::StorageError> {
    response
        .json::<T>()
        .await
        .map_err(|err| domain::StorageError::Other(Box::new(err)))
}

fn into_domain(record: UserRecord) -> Result<domain::UserRecord, domain::StorageError> {
    domain::UserRecord::try_from(record).map_err(|err| domain::StorageError::Other(Box::new(err)))
}

fn unexpected_status(status: StatusCode) -> domain::StorageError {
    domain::StorageError::Other(format!("unexpected response: {status}").into())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;

    use fitjournal_domain::{AuthRepository, RemoteRepository};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use crate::tests::data::{USER_RECORD, USERNAME};

    use super::*;

    pub struct MockSendRequest {
        pub request: RefCell<Option<reqwest::Request>>,
        pub response: RefCell<Option<(u16, String)>>,
    }

    impl SendRequest for MockSendRequest {
        async fn send_request(
            &self,
            request: reqwest::Request,
        ) -> Result<reqwest::Response, domain::StorageError> {
            *self.request.borrow_mut() = Some(request);
            let (status, body) = self
                .response
                .borrow_mut()
                .take()
                .ok_or(domain::StorageError::NoConnection)?;
            Ok(reqwest::Response::from(
                http::Response::builder()
                    .status(status)
                    .body(body)
                    .unwrap(),
            ))
        }
    }

    pub fn rest_with_response(response: Option<(u16, serde_json::Value)>) -> REST<MockSendRequest> {
        REST {
            base_url: "http://localhost:8888/.netlify/functions/".to_string(),
            sender: MockSendRequest {
                request: RefCell::new(None),
                response: RefCell::new(response.map(|(status, body)| (status, body.to_string()))),
            },
        }
    }

    fn user_data() -> serde_json::Value {
        json!({ "data": UserRecord::from(&*USER_RECORD) })
    }

    fn sent_request(rest: &REST<MockSendRequest>) -> (Method, String, Option<serde_json::Value>) {
        let request = rest.sender.request.borrow_mut().take().unwrap();
        let body = request
            .body()
            .and_then(reqwest::Body::as_bytes)
            .map(|bytes| serde_json::from_slice(bytes).unwrap());
        (request.method().clone(), request.url().to_string(), body)
    }

    #[tokio::test]
    async fn test_read_record() {
        let rest = rest_with_response(Some((200, user_data())));
        assert_eq!(
            rest.read_record(&USERNAME).await.unwrap(),
            Some(USER_RECORD.clone())
        );
        assert_eq!(
            sent_request(&rest),
            (
                Method::GET,
                "http://localhost:8888/.netlify/functions/get-user?username=alice".to_string(),
                None
            )
        );
    }

    #[rstest]
    #[case(Some((404, json!({ "data": null }))))]
    #[case(Some((200, json!({ "data": null }))))]
    #[tokio::test]
    async fn test_read_missing_record(#[case] response: Option<(u16, serde_json::Value)>) {
        assert_eq!(
            rest_with_response(response)
                .read_record(&USERNAME)
                .await
                .unwrap(),
            None
        );
    }

    #[rstest]
    #[case(None, true)]
    #[case(Some((500, json!({ "error": "foo" }))), false)]
    #[case(Some((200, json!({ "data": { "workouts": 1 } }))), false)]
    #[tokio::test]
    async fn test_read_record_failure(
        #[case] response: Option<(u16, serde_json::Value)>,
        #[case] transient: bool,
    ) {
        let result = rest_with_response(response).read_record(&USERNAME).await;
        assert_eq!(result.unwrap_err().is_transient(), transient);
    }

    #[tokio::test]
    async fn test_write_record() {
        let rest = rest_with_response(Some((200, json!({ "success": true }))));
        rest.write_record(&USERNAME, &USER_RECORD).await.unwrap();

        let (method, url, body) = sent_request(&rest);
        assert_eq!(method, Method::POST);
        assert_eq!(url, "http://localhost:8888/.netlify/functions/sync-user");
        assert_eq!(
            body,
            Some(json!({
                "username": "alice",
                "data": UserRecord::from(&*USER_RECORD),
            }))
        );

        assert!(matches!(
            rest_with_response(None)
                .write_record(&USERNAME, &USER_RECORD)
                .await,
            Err(domain::StorageError::NoConnection)
        ));
        assert!(matches!(
            rest_with_response(Some((500, json!({ "error": "Failed to sync user" }))))
                .write_record(&USERNAME, &USER_RECORD)
                .await,
            Err(domain::StorageError::Other(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_credentials() {
        let rest = rest_with_response(Some((
            200,
            json!({ "username": "alice", "data": UserRecord::from(&*USER_RECORD) }),
        )));
        assert_eq!(
            rest.verify_credentials(&USERNAME, "secret").await.unwrap(),
            USER_RECORD.clone()
        );
        assert_eq!(
            sent_request(&rest),
            (
                Method::POST,
                "http://localhost:8888/.netlify/functions/login".to_string(),
                Some(json!({ "username": "alice", "password": "secret" }))
            )
        );
    }

    #[rstest]
    #[case(Some((401, json!({ "error": "Invalid credentials" }))))]
    #[case(Some((404, json!({ "data": null }))))]
    #[tokio::test]
    async fn test_verify_invalid_credentials(#[case] response: Option<(u16, serde_json::Value)>) {
        assert!(matches!(
            rest_with_response(response)
                .verify_credentials(&USERNAME, "wrong")
                .await,
            Err(domain::AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_verify_credentials_offline() {
        assert!(matches!(
            rest_with_response(None)
                .verify_credentials(&USERNAME, "secret")
                .await,
            Err(domain::AuthError::Storage(domain::StorageError::NoConnection))
        ));
    }

    #[tokio::test]
    async fn test_register() {
        let rest = rest_with_response(Some((
            200,
            json!({ "username": "alice", "data": UserRecord::from(&*USER_RECORD) }),
        )));
        assert_eq!(
            rest.register(&USERNAME, "secret").await.unwrap(),
            USER_RECORD.clone()
        );
        let (method, url, _) = sent_request(&rest);
        assert_eq!(method, Method::POST);
        assert_eq!(url, "http://localhost:8888/.netlify/functions/register");

        assert!(matches!(
            rest_with_response(Some((409, json!({ "error": "User exists" }))))
                .register(&USERNAME, "secret")
                .await,
            Err(domain::AuthError::AlreadyExists)
        ));
    }
}
