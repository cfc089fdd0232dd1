use super::{Backend, BackendResult};
use crate::errors::BackendError;
use crate::models::{
    GoalRow, GroupRow, GroupStats, JoinResult, LogKey, MemberRow, NewGoal, NewGroup, NewMembership,
    Session,
};
use crate::status::date_key;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// Client for the hosted platform's REST gateway (PostgREST dialect).
#[derive(Clone)]
pub struct RestBackend {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestBackend {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            api_key: api_key.into(),
        }
    }

    fn request(&self, method: Method, path: &str, session: &Session) -> RequestBuilder {
        let token = session.access_token.as_deref().unwrap_or(&self.api_key);
        self.client
            .request(method, format!("{}/rest/v1/{path}", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
    }

    fn returning(builder: RequestBuilder) -> RequestBuilder {
        builder.header("Prefer", "return=representation")
    }
}

async fn check(response: Response) -> BackendResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| value.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);
    Err(BackendError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn rows<T: DeserializeOwned>(builder: RequestBuilder) -> BackendResult<Vec<T>> {
    let response = check(builder.send().await?).await?;
    Ok(response.json::<Vec<T>>().await?)
}

async fn first_row<T: DeserializeOwned>(builder: RequestBuilder) -> BackendResult<T> {
    rows(builder)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::Decode("write returned no row".to_string()))
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

#[async_trait]
impl Backend for RestBackend {
    async fn my_group_stats(&self, session: &Session) -> BackendResult<Option<GroupStats>> {
        let builder = self
            .request(Method::POST, "rpc/get_my_group_stats", session)
            .json(&json!({}));
        Ok(rows::<GroupStats>(builder).await?.into_iter().next())
    }

    async fn list_members(&self, session: &Session, group_id: &str) -> BackendResult<Vec<MemberRow>> {
        let builder = self
            .request(Method::GET, "group_members", session)
            .query(&[("select", "user_id,profiles(full_name)".to_string()), ("group_id", eq(group_id))]);
        rows(builder).await
    }

    async fn list_goals(
        &self,
        session: &Session,
        group_id: &str,
        date: NaiveDate,
    ) -> BackendResult<Vec<GoalRow>> {
        let builder = self.request(Method::GET, "goals", session).query(&[
            ("select", "*,logs(id)".to_string()),
            ("group_id", eq(group_id)),
            ("logs.date", eq(&date_key(date))),
        ]);
        rows(builder).await
    }

    async fn insert_log(&self, session: &Session, key: &LogKey) -> BackendResult<()> {
        let builder = self.request(Method::POST, "logs", session).json(&json!({
            "goal_id": key.goal_id,
            "user_id": key.user_id,
            "date": date_key(key.date),
        }));
        check(builder.send().await?).await?;
        Ok(())
    }

    async fn delete_log(&self, session: &Session, key: &LogKey) -> BackendResult<()> {
        let builder = self.request(Method::DELETE, "logs", session).query(&[
            ("goal_id", eq(&key.goal_id)),
            ("user_id", eq(&key.user_id)),
            ("date", eq(&date_key(key.date))),
        ]);
        check(builder.send().await?).await?;
        Ok(())
    }

    async fn insert_goal(&self, session: &Session, goal: &NewGoal) -> BackendResult<GoalRow> {
        let builder = Self::returning(self.request(Method::POST, "goals", session)).json(goal);
        first_row(builder).await
    }

    async fn delete_goal(&self, session: &Session, goal_id: &str, user_id: &str) -> BackendResult<usize> {
        let builder = Self::returning(self.request(Method::DELETE, "goals", session))
            .query(&[("id", eq(goal_id)), ("user_id", eq(user_id))]);
        Ok(rows::<Value>(builder).await?.len())
    }

    async fn update_goal_title(
        &self,
        session: &Session,
        goal_id: &str,
        user_id: &str,
        title: &str,
    ) -> BackendResult<usize> {
        let builder = Self::returning(self.request(Method::PATCH, "goals", session))
            .query(&[("id", eq(goal_id)), ("user_id", eq(user_id))])
            .json(&json!({ "title": title }));
        Ok(rows::<Value>(builder).await?.len())
    }

    async fn join_group_via_code(&self, session: &Session, code: &str) -> BackendResult<JoinResult> {
        let builder = self
            .request(Method::POST, "rpc/join_group_via_code", session)
            .json(&json!({ "code_input": code }));
        let response = check(builder.send().await?).await?;
        Ok(response.json::<JoinResult>().await?)
    }

    async fn insert_group(&self, session: &Session, group: &NewGroup) -> BackendResult<GroupRow> {
        let builder = Self::returning(self.request(Method::POST, "groups", session)).json(group);
        first_row(builder).await
    }

    async fn insert_membership(&self, session: &Session, membership: &NewMembership) -> BackendResult<()> {
        let builder = self.request(Method::POST, "group_members", session).json(membership);
        check(builder.send().await?).await?;
        Ok(())
    }
}
