use reqwest::{Client, Response, Url};
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use toolchat_core::tool::{Error as ToolError, Tool, ToolResult};

/// A thin client of the user service.
///
/// The service owns the user records. Responses are passed to the model
/// as they are.
#[derive(Clone, Debug)]
pub struct UserServiceClient {
    http: Client,
    base_url: String,
}

impl UserServiceClient {
    /// Creates a client for the service at `base_url`.
    pub fn new<S: Into<String>>(base_url: S) -> Result<Self, reqwest::Error> {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self {
            http: Client::builder().build()?,
            base_url,
        })
    }

    async fn search_users(&self, query: &SearchUsersParameters) -> ToolResult {
        let params = [
            ("name", &query.name),
            ("surname", &query.surname),
            ("email", &query.email),
            ("gender", &query.gender),
        ];
        let params = params
            .iter()
            .filter_map(|(key, value)| Some((*key, value.as_deref()?)));
        let url = Url::parse_with_params(
            &format!("{}/v1/users/search", self.base_url),
            params,
        )
        .map_err(|err| {
            ToolError::execution_error()
                .with_reason(format!("invalid user service URL: {err}"))
        })?;

        debug!("searching users: {url}");
        let resp = self.http.get(url).send().await.map_err(request_error)?;
        read_body(resp).await
    }

    async fn update_user(&self, id: u64, update: &UserUpdate) -> ToolResult {
        let url = format!("{}/v1/users/{id}", self.base_url);
        debug!("updating user {id}");
        let resp = self
            .http
            .put(url)
            .json(update)
            .send()
            .await
            .map_err(request_error)?;
        read_body(resp).await
    }

    async fn get_user(&self, id: u64) -> ToolResult {
        let url = format!("{}/v1/users/{id}", self.base_url);
        debug!("fetching user {id}");
        let resp = self.http.get(url).send().await.map_err(request_error)?;
        read_body(resp).await
    }

    async fn create_user(&self, user: &UserCreate) -> ToolResult {
        let url = format!("{}/v1/users", self.base_url);
        debug!("creating user");
        let resp = self
            .http
            .post(url)
            .json(user)
            .send()
            .await
            .map_err(request_error)?;
        read_body(resp).await
    }

    async fn delete_user(&self, id: u64) -> ToolResult {
        let url = format!("{}/v1/users/{id}", self.base_url);
        debug!("deleting user {id}");
        let resp = self.http.delete(url).send().await.map_err(request_error)?;
        let body = read_body(resp).await?;
        if body.trim().is_empty() {
            return Ok(format!("User {id} deleted"));
        }
        Ok(body)
    }
}

fn request_error(err: reqwest::Error) -> ToolError {
    ToolError::execution_error()
        .with_reason(format!("user service is unreachable: {err}"))
}

async fn read_body(resp: Response) -> ToolResult {
    let status = resp.status();
    let body = resp.text().await.map_err(request_error)?;
    if !status.is_success() {
        warn!("user service responded with {status}");
        let reason = format!("user service responded with {status}: {body}");
        return Err(ToolError::execution_error().with_reason(reason));
    }
    Ok(body)
}

/// Search criteria. Absent fields are not filtered on.
#[derive(Default, Deserialize, JsonSchema)]
pub struct SearchUsersParameters {
    #[schemars(description = "User name to search by")]
    name: Option<String>,
    #[schemars(description = "User surname to search by")]
    surname: Option<String>,
    #[schemars(description = "User email to search by")]
    email: Option<String>,
    #[schemars(description = "User gender to search by")]
    gender: Option<String>,
}

/// A tool for searching users in the user service.
pub struct SearchUsersTool {
    client: UserServiceClient,
    parameter_schema: Value,
}

impl SearchUsersTool {
    /// Creates a new search tool backed by `client`.
    #[inline]
    pub fn new(client: UserServiceClient) -> Self {
        Self {
            client,
            parameter_schema: schema_for!(SearchUsersParameters).to_value(),
        }
    }
}

impl Tool for SearchUsersTool {
    type Input = SearchUsersParameters;

    fn name(&self) -> &str {
        "search_users"
    }

    fn description(&self) -> &str {
        "Search users by name, surname, email, or gender"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: SearchUsersParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let client = self.client.clone();
        async move { client.search_users(&input).await }
    }
}

/// The fields of a user that can be changed. Absent fields are kept.
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema,
)]
pub struct UserUpdate {
    /// First name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Last name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Date of birth, formatted as `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    /// Gender.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Company the user works for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// A short biography.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about_me: Option<String>,
}

/// Parameters of [`UpdateUserTool`].
#[derive(Deserialize, JsonSchema)]
pub struct UpdateUserParameters {
    #[schemars(description = "User ID that should be updated")]
    id: u64,
    #[schemars(description = "New values of the fields to change")]
    new_info: UserUpdate,
}

/// A tool for updating an existing user in the user service.
pub struct UpdateUserTool {
    client: UserServiceClient,
    parameter_schema: Value,
}

impl UpdateUserTool {
    /// Creates a new update tool backed by `client`.
    #[inline]
    pub fn new(client: UserServiceClient) -> Self {
        Self {
            client,
            parameter_schema: schema_for!(UpdateUserParameters).to_value(),
        }
    }
}

impl Tool for UpdateUserTool {
    type Input = UpdateUserParameters;

    fn name(&self) -> &str {
        "update_user"
    }

    fn description(&self) -> &str {
        "Updates an existing user"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: UpdateUserParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let client = self.client.clone();
        async move { client.update_user(input.id, &input.new_info).await }
    }
}

/// Parameters of the tools that address one user.
#[derive(Deserialize, JsonSchema)]
pub struct UserIdParameters {
    #[schemars(description = "User ID")]
    id: u64,
}

/// A tool for fetching a single user by id.
pub struct GetUserByIdTool {
    client: UserServiceClient,
    parameter_schema: Value,
}

impl GetUserByIdTool {
    /// Creates a new lookup tool backed by `client`.
    #[inline]
    pub fn new(client: UserServiceClient) -> Self {
        Self {
            client,
            parameter_schema: schema_for!(UserIdParameters).to_value(),
        }
    }
}

impl Tool for GetUserByIdTool {
    type Input = UserIdParameters;

    fn name(&self) -> &str {
        "get_user_by_id"
    }

    fn description(&self) -> &str {
        "Provides full information about a user by their ID"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: UserIdParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let client = self.client.clone();
        async move { client.get_user(input.id).await }
    }
}

/// A new user record.
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema,
)]
pub struct UserCreate {
    /// First name.
    pub name: String,
    /// Last name.
    pub surname: String,
    /// Email address.
    pub email: String,
    /// A short biography.
    pub about_me: String,
    /// Phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Date of birth, formatted as `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    /// Gender.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Company the user works for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

/// A tool for adding a user to the user service.
pub struct CreateUserTool {
    client: UserServiceClient,
    parameter_schema: Value,
}

impl CreateUserTool {
    /// Creates a new creation tool backed by `client`.
    #[inline]
    pub fn new(client: UserServiceClient) -> Self {
        Self {
            client,
            parameter_schema: schema_for!(UserCreate).to_value(),
        }
    }
}

impl Tool for CreateUserTool {
    type Input = UserCreate;

    fn name(&self) -> &str {
        "add_user"
    }

    fn description(&self) -> &str {
        "Adds a new user to the system"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: UserCreate,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let client = self.client.clone();
        async move { client.create_user(&input).await }
    }
}

/// A tool for deleting a user from the user service.
pub struct DeleteUserTool {
    client: UserServiceClient,
    parameter_schema: Value,
}

impl DeleteUserTool {
    /// Creates a new deletion tool backed by `client`.
    #[inline]
    pub fn new(client: UserServiceClient) -> Self {
        Self {
            client,
            parameter_schema: schema_for!(UserIdParameters).to_value(),
        }
    }
}

impl Tool for DeleteUserTool {
    type Input = UserIdParameters;

    fn name(&self) -> &str {
        "delete_users"
    }

    fn description(&self) -> &str {
        "Deletes a user by their ID"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: UserIdParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let client = self.client.clone();
        async move { client.delete_user(input.id).await }
    }
}
