//! Admin API GraphQL client.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use metadef_core::types::RemoteId;
use metadef_core::SessionConfig;
use metadef_sync::remote::{
    DefinitionCreateInput, DefinitionPage, DefinitionUpdateInput, MutationOutcome,
    SchemaService, UserError,
};
use metadef_sync::RemoteError;

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

const LIST_DEFINITIONS: &str = r#"
query MetaobjectDefinitions($first: Int!, $after: String) {
  metaobjectDefinitions(first: $first, after: $after) {
    nodes {
      id
      type
      name
      description
      displayNameKey
      access { admin storefront }
      capabilities {
        publishable { enabled }
        translatable { enabled }
        renderable { enabled data { metaDescriptionKey metaTitleKey } }
        onlineStore { enabled data { urlHandle canCreateRedirects } }
      }
      fieldDefinitions {
        key
        name
        description
        required
        type { name }
        validations { name value }
      }
    }
    pageInfo { hasNextPage endCursor }
  }
}
"#;

const CREATE_DEFINITION: &str = r#"
mutation MetaobjectDefinitionCreate($definition: MetaobjectDefinitionCreateInput!) {
  metaobjectDefinitionCreate(definition: $definition) {
    metaobjectDefinition { id }
    userErrors { field message code }
  }
}
"#;

const UPDATE_DEFINITION: &str = r#"
mutation MetaobjectDefinitionUpdate($id: ID!, $definition: MetaobjectDefinitionUpdateInput!) {
  metaobjectDefinitionUpdate(id: $id, definition: $definition) {
    metaobjectDefinition { id }
    userErrors { field message code }
  }
}
"#;

/// Blocking client for one shop.
pub struct AdminClient {
    agent: ureq::Agent,
    endpoint: String,
    token: String,
}

impl AdminClient {
    pub fn new(session: &SessionConfig) -> Self {
        Self::with_endpoint(session, endpoint_for(&session.shop, &session.api_version))
    }

    pub fn with_endpoint(session: &SessionConfig, endpoint: String) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            endpoint,
            token: session.token.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, RemoteError> {
        let response = self
            .agent
            .post(&self.endpoint)
            .set(ACCESS_TOKEN_HEADER, &self.token)
            .send_json(json!({ "query": query, "variables": variables }));
        let body: serde_json::Value = match response {
            Ok(response) => response
                .into_json()
                .map_err(|e| RemoteError::Decode(e.to_string()))?,
            Err(ureq::Error::Status(status, response)) => {
                return Err(RemoteError::Status {
                    status,
                    body: response.into_string().unwrap_or_default(),
                })
            }
            Err(e) => return Err(RemoteError::Transport(e.to_string())),
        };
        decode_response(body)
    }
}

/// `https://<shop>.myshopify.com/admin/api/<version>/graphql.json`
pub fn endpoint_for(shop: &str, api_version: &str) -> String {
    format!("https://{shop}.myshopify.com/admin/api/{api_version}/graphql.json")
}

// ---------------------------------------------------------------------------
// Response envelopes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListData {
    metaobject_definitions: DefinitionPage,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateData {
    metaobject_definition_create: MutationPayload,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateData {
    metaobject_definition_update: MutationPayload,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MutationPayload {
    metaobject_definition: Option<IdOnly>,
    #[serde(default)]
    user_errors: Vec<UserError>,
}

#[derive(Deserialize)]
struct IdOnly {
    id: RemoteId,
}

impl From<MutationPayload> for MutationOutcome {
    fn from(payload: MutationPayload) -> Self {
        MutationOutcome {
            id: payload.metaobject_definition.map(|d| d.id),
            user_errors: payload.user_errors,
        }
    }
}

/// Unwrap a GraphQL envelope; top-level `errors` win over partial data.
fn decode_response<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, RemoteError> {
    let envelope: GraphQlResponse<T> =
        serde_json::from_value(body).map_err(|e| RemoteError::Decode(e.to_string()))?;
    if !envelope.errors.is_empty() {
        return Err(RemoteError::GraphQl(
            envelope.errors.into_iter().map(|e| e.message).collect(),
        ));
    }
    envelope
        .data
        .ok_or_else(|| RemoteError::Decode("response carried no data".to_string()))
}

// ---------------------------------------------------------------------------
// SchemaService
// ---------------------------------------------------------------------------

impl SchemaService for AdminClient {
    fn list_definitions(
        &self,
        first: u32,
        after: Option<&str>,
    ) -> Result<DefinitionPage, RemoteError> {
        let data: ListData =
            self.execute(LIST_DEFINITIONS, json!({ "first": first, "after": after }))?;
        Ok(data.metaobject_definitions)
    }

    fn create_definition(
        &self,
        input: &DefinitionCreateInput,
    ) -> Result<MutationOutcome, RemoteError> {
        let data: CreateData = self.execute(CREATE_DEFINITION, json!({ "definition": input }))?;
        Ok(data.metaobject_definition_create.into())
    }

    fn update_definition(
        &self,
        id: &RemoteId,
        input: &DefinitionUpdateInput,
    ) -> Result<MutationOutcome, RemoteError> {
        let data: UpdateData = self.execute(
            UPDATE_DEFINITION,
            json!({ "id": id, "definition": input }),
        )?;
        Ok(data.metaobject_definition_update.into())
    }
}
